use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceMetadataRequest,
    DataSourceMetadataResponse, DataSourceSchemaRequest, DataSourceSchemaResponse,
    DataSourceWithConfigure, ReadDataSourceRequest, ReadDataSourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};

use crate::api::common::{Filter, FilterSyntax, ListOptions};
use crate::resources::helpers::{api_error, get_string, not_configured, set};
use crate::JumpCloudProviderData;

#[derive(Default)]
pub struct UserGroupDataSource {
    provider_data: Option<JumpCloudProviderData>,
}

impl UserGroupDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DataSource for UserGroupDataSource {
    fn type_name(&self) -> &str {
        "jumpcloud_user_group"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Looks up a JumpCloud user group by name")
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Exact group name")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("email", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("type", AttributeType::String)
                    .computed()
                    .build(),
            )
            .build();

        DataSourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn read(&self, _ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let mut diagnostics = vec![];

        let Some(provider_data) = &self.provider_data else {
            diagnostics.push(not_configured());
            return ReadDataSourceResponse {
                state: DynamicValue::null(),
                diagnostics,
            };
        };

        let Some(name) = get_string(&request.config, "name") else {
            diagnostics.push(
                Diagnostic::error("Missing group name", "'name' must be set")
                    .with_attribute(AttributePath::new("name")),
            );
            return ReadDataSourceResponse {
                state: DynamicValue::null(),
                diagnostics,
            };
        };

        tracing::debug!("Looking up user group {}", name);

        let options = ListOptions::new(FilterSyntax::V2)
            .with_filter(Filter::eq("name", name.as_str()))
            .with_limit(2);

        let groups = match provider_data
            .client
            .directory()
            .user_groups()
            .list(&options)
            .await
        {
            Ok(page) => page.into_results(),
            Err(e) => {
                diagnostics.push(api_error("Failed to look up user group", &e));
                return ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics,
                };
            }
        };

        let group = match groups.as_slice() {
            [group] => group,
            [] => {
                diagnostics.push(Diagnostic::error(
                    "User group not found",
                    format!("No user group is named '{}'", name),
                ));
                return ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics,
                };
            }
            _ => {
                diagnostics.push(Diagnostic::error(
                    "Multiple user groups found",
                    format!("More than one user group is named '{}'", name),
                ));
                return ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics,
                };
            }
        };

        let mut state = DynamicValue::object();
        set(&mut state, "id", group.id.clone());
        set(&mut state, "name", group.name.clone());
        set(&mut state, "description", group.description.clone());
        set(&mut state, "email", group.email.clone());
        set(&mut state, "type", group.group_type.clone());

        ReadDataSourceResponse { state, diagnostics }
    }
}

#[async_trait]
impl DataSourceWithConfigure for UserGroupDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        let mut diagnostics = vec![];
        match JumpCloudProviderData::from_provider_data(request.provider_data, "data source") {
            Ok(data) => self.provider_data = Some(data),
            Err(diag) => diagnostics.push(diag),
        }
        ConfigureDataSourceResponse { diagnostics }
    }
}

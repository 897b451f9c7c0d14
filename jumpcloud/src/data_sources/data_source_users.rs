//! User list data source

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceMetadataRequest,
    DataSourceMetadataResponse, DataSourceSchemaRequest, DataSourceSchemaResponse,
    DataSourceWithConfigure, ReadDataSourceRequest, ReadDataSourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{Dynamic, DynamicValue};

use super::data_source_user::{user_fields, user_object};
use super::query::{collect_pages, list_options, query_attributes};
use crate::api::common::FilterSyntax;
use crate::resources::helpers::{not_configured, set};
use crate::JumpCloudProviderData;

#[derive(Default)]
pub struct UsersDataSource {
    provider_data: Option<JumpCloudProviderData>,
}

impl UsersDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DataSource for UsersDataSource {
    fn type_name(&self) -> &str {
        "jumpcloud_users"
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
        let builder = SchemaBuilder::new()
            .version(0)
            .description("Lists JumpCloud users matching optional filters")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Placeholder identifier for the result set")
                    .computed()
                    .build(),
            );

        let fields = user_fields();
        let schema = query_attributes(builder)
            .attribute(
                AttributeBuilder::new("users", AttributeType::list_of_objects(&fields))
                    .description("Matching users")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("total_count", AttributeType::Number)
                    .description("Total number of matches reported by JumpCloud")
                    .computed()
                    .build(),
            )
            .build();

        DataSourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn read(&self, ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let mut diagnostics = vec![];

        let Some(provider_data) = &self.provider_data else {
            diagnostics.push(not_configured());
            return ReadDataSourceResponse {
                state: DynamicValue::null(),
                diagnostics,
            };
        };

        let options = match list_options(&request.config, FilterSyntax::V1) {
            Ok(options) => options,
            Err(diag) => {
                diagnostics.push(diag);
                return ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics,
                };
            }
        };

        tracing::debug!("Listing users with {} filters", options.filters.len());

        let users = &provider_data.client.directory().users();
        let found = collect_pages(&ctx, &options, "Failed to list users", move |page| async move {
            users.list(&page).await
        })
        .await;

        let (results, total) = match found {
            Ok(found) => found,
            Err(diag) => {
                diagnostics.push(diag);
                return ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics,
                };
            }
        };

        let mut state = request.config.clone();
        set(&mut state, "id", "users");
        set(
            &mut state,
            "total_count",
            total.unwrap_or(results.len() as u64) as f64,
        );
        set(
            &mut state,
            "users",
            Dynamic::List(
                results
                    .iter()
                    .map(|user| Dynamic::Map(user_object(user)))
                    .collect(),
            ),
        );

        ReadDataSourceResponse { state, diagnostics }
    }
}

#[async_trait]
impl DataSourceWithConfigure for UsersDataSource {
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

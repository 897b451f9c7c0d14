//! User lookup data source

use std::collections::HashMap;

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceMetadataRequest,
    DataSourceMetadataResponse, DataSourceSchemaRequest, DataSourceSchemaResponse,
    DataSourceWithConfigure, ReadDataSourceRequest, ReadDataSourceResponse,
    ValidateDataSourceConfigRequest, ValidateDataSourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

use crate::api::common::{Filter, FilterSyntax, ListOptions};
use crate::api::directory::users::SystemUser;
use crate::resources::helpers::{api_error, get_string, not_configured, set};
use crate::JumpCloudProviderData;

/// Attributes describing a user, shared with the `jumpcloud_users` list
pub fn user_fields() -> Vec<(&'static str, AttributeType)> {
    vec![
        ("id", AttributeType::String),
        ("username", AttributeType::String),
        ("email", AttributeType::String),
        ("firstname", AttributeType::String),
        ("lastname", AttributeType::String),
        ("department", AttributeType::String),
        ("job_title", AttributeType::String),
        ("state", AttributeType::String),
        ("sudo", AttributeType::Bool),
        ("suspended", AttributeType::Bool),
        ("created", AttributeType::String),
    ]
}

pub fn user_object(user: &SystemUser) -> HashMap<String, Dynamic> {
    let mut object = HashMap::new();
    object.insert("id".to_string(), user.id.clone().into());
    object.insert("username".to_string(), user.username.clone().into());
    object.insert("email".to_string(), user.email.clone().into());
    object.insert("firstname".to_string(), user.firstname.clone().into());
    object.insert("lastname".to_string(), user.lastname.clone().into());
    object.insert("department".to_string(), user.department.clone().into());
    object.insert("job_title".to_string(), user.job_title.clone().into());
    object.insert("state".to_string(), user.state.clone().into());
    object.insert("sudo".to_string(), user.sudo.into());
    object.insert("suspended".to_string(), user.suspended.into());
    object.insert("created".to_string(), user.created.clone().into());
    object
}

#[derive(Default)]
pub struct UserDataSource {
    provider_data: Option<JumpCloudProviderData>,
}

impl UserDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lookup filter, or a diagnostic unless exactly one key is set
    fn lookup(config: &DynamicValue) -> Result<Filter, Diagnostic> {
        match (get_string(config, "username"), get_string(config, "email")) {
            (Some(username), None) => Ok(Filter::eq("username", username)),
            (None, Some(email)) => Ok(Filter::eq("email", email)),
            _ => Err(Diagnostic::error(
                "Invalid user lookup",
                "Exactly one of 'username' or 'email' must be set",
            )),
        }
    }
}

#[async_trait]
impl DataSource for UserDataSource {
    fn type_name(&self) -> &str {
        "jumpcloud_user"
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
        let mut builder = SchemaBuilder::new()
            .version(0)
            .description("Looks up a single JumpCloud user by username or email");

        for (name, attribute_type) in user_fields() {
            let attribute = AttributeBuilder::new(name, attribute_type);
            let attribute = match name {
                "username" | "email" => attribute
                    .description("Lookup key; set exactly one of username and email")
                    .optional()
                    .computed(),
                _ => attribute.computed(),
            };
            builder = builder.attribute(attribute.build());
        }

        DataSourceSchemaResponse {
            schema: builder.build(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        // Unknown lookup keys are resolved at apply time
        let unknown = ["username", "email"].iter().any(|name| {
            request
                .config
                .get(&AttributePath::new(name))
                .is_some_and(Dynamic::is_unknown)
        });

        let diagnostics = match Self::lookup(&request.config) {
            Err(diag) if !unknown => vec![diag],
            _ => vec![],
        };
        ValidateDataSourceConfigResponse { diagnostics }
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

        let filter = match Self::lookup(&request.config) {
            Ok(filter) => filter,
            Err(diag) => {
                diagnostics.push(diag);
                return ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics,
                };
            }
        };

        tracing::debug!("Looking up user with {}", filter.render(FilterSyntax::V1));

        // Two results are enough to tell a unique match from an ambiguous one
        let options = ListOptions::new(FilterSyntax::V1)
            .with_filter(filter.clone())
            .with_limit(2);

        let users = match provider_data.client.directory().users().list(&options).await {
            Ok(page) => page.into_results(),
            Err(e) => {
                diagnostics.push(api_error("Failed to look up user", &e));
                return ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics,
                };
            }
        };

        let user = match users.as_slice() {
            [user] => user,
            [] => {
                diagnostics.push(Diagnostic::error(
                    "User not found",
                    format!("No user matches {} = {}", filter.field, filter.value),
                ));
                return ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics,
                };
            }
            _ => {
                diagnostics.push(Diagnostic::error(
                    "Multiple users found",
                    format!("More than one user matches {} = {}", filter.field, filter.value),
                ));
                return ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics,
                };
            }
        };

        let mut state = DynamicValue::object();
        for (name, value) in user_object(user) {
            set(&mut state, &name, value);
        }

        ReadDataSourceResponse { state, diagnostics }
    }
}

#[async_trait]
impl DataSourceWithConfigure for UserDataSource {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::test_support::{configured_data_source, plan};
    use mockito::{Matcher, Server};
    use tfplug::types::ClientCapabilities;

    fn read_request(config: serde_json::Value) -> ReadDataSourceRequest {
        ReadDataSourceRequest {
            type_name: "jumpcloud_user".to_string(),
            config: plan(config),
            provider_meta: None,
            client_capabilities: ClientCapabilities::default(),
        }
    }

    #[tokio::test]
    async fn finds_user_by_email() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/systemusers")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("filter".into(), "email:$eq:jdoe@example.com".into()),
                Matcher::UrlEncoded("limit".into(), "2".into()),
            ]))
            .with_body(
                r#"{"totalCount":1,"results":[{"_id":"u1","username":"jdoe",
                    "email":"jdoe@example.com","state":"ACTIVATED","suspended":false}]}"#,
            )
            .create_async()
            .await;

        let data_source: UserDataSource = configured_data_source(&server.url()).await;
        let response = data_source
            .read(
                Context::new(),
                read_request(serde_json::json!({"username": null, "email": "jdoe@example.com"})),
            )
            .await;

        mock.assert_async().await;
        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        assert_eq!(get_string(&response.state, "id").as_deref(), Some("u1"));
        assert_eq!(get_string(&response.state, "username").as_deref(), Some("jdoe"));
    }

    #[tokio::test]
    async fn ambiguous_match_is_an_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/systemusers")
            .match_query(Matcher::Any)
            .with_body(
                r#"{"totalCount":2,"results":[{"_id":"u1","username":"a"},{"_id":"u2","username":"a"}]}"#,
            )
            .create_async()
            .await;

        let data_source: UserDataSource = configured_data_source(&server.url()).await;
        let response = data_source
            .read(Context::new(), read_request(serde_json::json!({"username": "a"})))
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].summary, "Multiple users found");
    }

    #[tokio::test]
    async fn requires_exactly_one_lookup_key() {
        let data_source = UserDataSource::new();
        let response = data_source
            .validate(
                Context::new(),
                ValidateDataSourceConfigRequest {
                    type_name: "jumpcloud_user".to_string(),
                    config: plan(serde_json::json!({"username": "a", "email": "a@example.com"})),
                },
            )
            .await;

        assert_eq!(response.diagnostics[0].summary, "Invalid user lookup");
    }
}

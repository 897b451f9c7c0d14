//! System lookup data source, by id or hostname

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
use crate::api::directory::systems::System;
use crate::resources::helpers::{api_error, get_string, not_configured, set};
use crate::JumpCloudProviderData;

pub fn system_fields() -> Vec<(&'static str, AttributeType)> {
    vec![
        ("id", AttributeType::String),
        ("display_name", AttributeType::String),
        ("hostname", AttributeType::String),
        ("os", AttributeType::String),
        ("version", AttributeType::String),
        ("agent_version", AttributeType::String),
        ("active", AttributeType::Bool),
        ("allow_ssh_password_authentication", AttributeType::Bool),
        ("allow_ssh_root_login", AttributeType::Bool),
        ("allow_multi_factor_authentication", AttributeType::Bool),
        ("allow_public_key_authentication", AttributeType::Bool),
        ("created", AttributeType::String),
    ]
}

pub fn system_object(system: &System) -> HashMap<String, Dynamic> {
    let mut object = HashMap::new();
    object.insert("id".to_string(), system.id.clone().into());
    object.insert("display_name".to_string(), system.display_name.clone().into());
    object.insert("hostname".to_string(), system.hostname.clone().into());
    object.insert("os".to_string(), system.os.clone().into());
    object.insert("version".to_string(), system.version.clone().into());
    object.insert("agent_version".to_string(), system.agent_version.clone().into());
    object.insert("active".to_string(), system.active.into());
    object.insert(
        "allow_ssh_password_authentication".to_string(),
        system.allow_ssh_password_authentication.into(),
    );
    object.insert(
        "allow_ssh_root_login".to_string(),
        system.allow_ssh_root_login.into(),
    );
    object.insert(
        "allow_multi_factor_authentication".to_string(),
        system.allow_multi_factor_authentication.into(),
    );
    object.insert(
        "allow_public_key_authentication".to_string(),
        system.allow_public_key_authentication.into(),
    );
    object.insert("created".to_string(), system.created.clone().into());
    object
}

enum Lookup {
    Id(String),
    Hostname(String),
}

#[derive(Default)]
pub struct SystemDataSource {
    provider_data: Option<JumpCloudProviderData>,
}

impl SystemDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn lookup(config: &DynamicValue) -> Result<Lookup, Diagnostic> {
        match (
            get_string(config, "system_id"),
            get_string(config, "hostname"),
        ) {
            (Some(id), None) => Ok(Lookup::Id(id)),
            (None, Some(hostname)) => Ok(Lookup::Hostname(hostname)),
            _ => Err(Diagnostic::error(
                "Invalid system lookup",
                "Exactly one of 'system_id' or 'hostname' must be set",
            )),
        }
    }

    async fn find(
        &self,
        provider_data: &JumpCloudProviderData,
        lookup: &Lookup,
    ) -> Result<System, Diagnostic> {
        let systems = provider_data.client.directory().systems();
        match lookup {
            Lookup::Id(id) => systems.get(id).await.map_err(|e| {
                if e.is_not_found() {
                    Diagnostic::error("System not found", format!("No system has id '{}'", id))
                } else {
                    api_error("Failed to read system", &e)
                }
            }),
            Lookup::Hostname(hostname) => {
                let options = ListOptions::new(FilterSyntax::V1)
                    .with_filter(Filter::eq("hostname", hostname.as_str()))
                    .with_limit(2);
                let mut found = systems
                    .list(&options)
                    .await
                    .map_err(|e| api_error("Failed to look up system", &e))?
                    .into_results();
                match found.len() {
                    1 => Ok(found.remove(0)),
                    0 => Err(Diagnostic::error(
                        "System not found",
                        format!("No system has hostname '{}'", hostname),
                    )),
                    _ => Err(Diagnostic::error(
                        "Multiple systems found",
                        format!("More than one system has hostname '{}'", hostname),
                    )),
                }
            }
        }
    }
}

#[async_trait]
impl DataSource for SystemDataSource {
    fn type_name(&self) -> &str {
        "jumpcloud_system"
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
            .description("Looks up a JumpCloud system by id or hostname")
            .attribute(
                AttributeBuilder::new("system_id", AttributeType::String)
                    .description("System id; set exactly one of system_id and hostname")
                    .optional()
                    .build(),
            );

        for (name, attribute_type) in system_fields() {
            let attribute = AttributeBuilder::new(name, attribute_type);
            let attribute = if name == "hostname" {
                attribute
                    .description("Hostname reported by the agent")
                    .optional()
                    .computed()
            } else {
                attribute.computed()
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
        let unknown = ["system_id", "hostname"].iter().any(|name| {
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

        let system = match Self::lookup(&request.config) {
            Ok(lookup) => self.find(provider_data, &lookup).await,
            Err(diag) => Err(diag),
        };
        let system = match system {
            Ok(system) => system,
            Err(diag) => {
                diagnostics.push(diag);
                return ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics,
                };
            }
        };

        tracing::debug!("Found system {}", system.id);

        let mut state = DynamicValue::object();
        set(&mut state, "system_id", system.id.clone());
        for (name, value) in system_object(&system) {
            set(&mut state, &name, value);
        }

        ReadDataSourceResponse { state, diagnostics }
    }
}

#[async_trait]
impl DataSourceWithConfigure for SystemDataSource {
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
    use crate::resources::helpers::get_bool;
    use crate::resources::test_support::{configured_data_source, plan};
    use mockito::{Matcher, Server};
    use tfplug::types::ClientCapabilities;

    fn read_request(config: serde_json::Value) -> ReadDataSourceRequest {
        ReadDataSourceRequest {
            type_name: "jumpcloud_system".to_string(),
            config: plan(config),
            provider_meta: None,
            client_capabilities: ClientCapabilities::default(),
        }
    }

    #[tokio::test]
    async fn reads_system_by_id() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/systems/s1")
            .with_body(
                r#"{"_id":"s1","displayName":"build-01","hostname":"build-01.local",
                    "os":"Ubuntu","active":true,"allowSshRootLogin":false}"#,
            )
            .create_async()
            .await;

        let data_source: SystemDataSource = configured_data_source(&server.url()).await;
        let response = data_source
            .read(Context::new(), read_request(serde_json::json!({"system_id": "s1"})))
            .await;

        mock.assert_async().await;
        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        assert_eq!(get_string(&response.state, "id").as_deref(), Some("s1"));
        assert_eq!(
            get_string(&response.state, "hostname").as_deref(),
            Some("build-01.local")
        );
        assert_eq!(get_bool(&response.state, "allow_ssh_root_login"), Some(false));
    }

    #[tokio::test]
    async fn looks_up_system_by_hostname() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/systems")
            .match_query(Matcher::UrlEncoded(
                "filter".into(),
                "hostname:$eq:build-01.local".into(),
            ))
            .with_body(r#"{"totalCount":1,"results":[{"_id":"s1","hostname":"build-01.local"}]}"#)
            .create_async()
            .await;

        let data_source: SystemDataSource = configured_data_source(&server.url()).await;
        let response = data_source
            .read(
                Context::new(),
                read_request(serde_json::json!({"hostname": "build-01.local"})),
            )
            .await;

        mock.assert_async().await;
        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        assert_eq!(get_string(&response.state, "system_id").as_deref(), Some("s1"));
    }

    #[tokio::test]
    async fn unknown_id_is_reported_as_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/systems/gone")
            .with_status(404)
            .with_body(r#"{"message":"Not Found"}"#)
            .create_async()
            .await;

        let data_source: SystemDataSource = configured_data_source(&server.url()).await;
        let response = data_source
            .read(Context::new(), read_request(serde_json::json!({"system_id": "gone"})))
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].summary, "System not found");
    }
}

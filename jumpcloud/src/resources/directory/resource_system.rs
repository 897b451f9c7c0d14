//! System resource implementation
//!
//! Systems register themselves through the JumpCloud agent. Creating this
//! resource adopts an existing system by `system_id` and applies the
//! configured settings; destroying it removes the system from JumpCloud.

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::import_state_passthrough_id;
use tfplug::plan_modifier::{RequiresReplace, UseStateForUnknown};
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceMetadataRequest, ResourceMetadataResponse,
    ResourceSchemaRequest, ResourceSchemaResponse, ResourceWithConfigure,
    ResourceWithImportState, UpdateResourceRequest, UpdateResourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::StringLengthValidator;

use crate::api::directory::systems::{System, SystemUpdate};
use crate::api::ApiError;
use crate::resources::helpers::{
    api_error, get_bool, get_string, missing_id, not_configured, set,
};
use crate::JumpCloudProviderData;

const SETTINGS: &[(&str, &str)] = &[
    (
        "allow_ssh_password_authentication",
        "Allow SSH logins with a password",
    ),
    ("allow_ssh_root_login", "Allow SSH logins as root"),
    (
        "allow_multi_factor_authentication",
        "Require MFA for logins to this system",
    ),
    (
        "allow_public_key_authentication",
        "Allow SSH logins with a public key",
    ),
];

#[derive(Default)]
pub struct SystemResource {
    provider_data: Option<JumpCloudProviderData>,
}

impl SystemResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn update_from_plan(plan: &DynamicValue) -> SystemUpdate {
        SystemUpdate {
            display_name: get_string(plan, "display_name"),
            allow_ssh_password_authentication: get_bool(plan, "allow_ssh_password_authentication"),
            allow_ssh_root_login: get_bool(plan, "allow_ssh_root_login"),
            allow_multi_factor_authentication: get_bool(plan, "allow_multi_factor_authentication"),
            allow_public_key_authentication: get_bool(plan, "allow_public_key_authentication"),
        }
    }

    fn state_from_system(system: &System) -> DynamicValue {
        let mut state = DynamicValue::object();
        set(&mut state, "id", system.id.clone());
        set(&mut state, "system_id", system.id.clone());
        set(&mut state, "display_name", system.display_name.clone());
        set(
            &mut state,
            "allow_ssh_password_authentication",
            system.allow_ssh_password_authentication,
        );
        set(&mut state, "allow_ssh_root_login", system.allow_ssh_root_login);
        set(
            &mut state,
            "allow_multi_factor_authentication",
            system.allow_multi_factor_authentication,
        );
        set(
            &mut state,
            "allow_public_key_authentication",
            system.allow_public_key_authentication,
        );
        set(&mut state, "hostname", system.hostname.clone());
        set(&mut state, "os", system.os.clone());
        set(&mut state, "agent_version", system.agent_version.clone());
        set(&mut state, "active", system.active);
        state
    }

    /// PUT the planned settings, skipping the call when nothing is set
    async fn apply(
        provider_data: &JumpCloudProviderData,
        id: &str,
        plan: &DynamicValue,
    ) -> Result<System, ApiError> {
        let update = Self::update_from_plan(plan);
        let systems = provider_data.client.directory().systems();
        if update == SystemUpdate::default() {
            return systems.get(id).await;
        }
        systems.update(id, &update).await
    }
}

#[async_trait]
impl Resource for SystemResource {
    fn type_name(&self) -> &str {
        "jumpcloud_system"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let mut builder = SchemaBuilder::new()
            .version(0)
            .description("Manages the settings of an agent-registered JumpCloud system")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("system_id", AttributeType::String)
                    .description("ID of the system to manage")
                    .required()
                    .validator(StringLengthValidator::at_least(1))
                    .plan_modifier(RequiresReplace::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("display_name", AttributeType::String)
                    .description("Name shown in the JumpCloud console")
                    .optional()
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            );

        for (name, description) in SETTINGS {
            builder = builder.attribute(
                AttributeBuilder::new(*name, AttributeType::Bool)
                    .description(*description)
                    .optional()
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            );
        }

        for name in ["hostname", "os", "agent_version"] {
            builder = builder.attribute(
                AttributeBuilder::new(name, AttributeType::String)
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            );
        }

        let schema = builder
            .attribute(
                AttributeBuilder::new("active", AttributeType::Bool)
                    .description("Whether the agent is currently connected")
                    .computed()
                    .build(),
            )
            .build();

        ResourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn create(&self, _ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let mut diagnostics = vec![];

        let Some(provider_data) = &self.provider_data else {
            diagnostics.push(not_configured());
            return CreateResourceResponse {
                new_state: request.planned_state,
                private: vec![],
                diagnostics,
            };
        };

        let Some(system_id) = get_string(&request.planned_state, "system_id") else {
            diagnostics.push(
                Diagnostic::error("Missing system_id", "The 'system_id' attribute is required")
                    .with_attribute(AttributePath::new("system_id")),
            );
            return CreateResourceResponse {
                new_state: request.planned_state,
                private: vec![],
                diagnostics,
            };
        };

        match Self::apply(provider_data, &system_id, &request.planned_state).await {
            Ok(system) => CreateResourceResponse {
                new_state: Self::state_from_system(&system),
                private: vec![],
                diagnostics,
            },
            Err(e) if e.is_not_found() => {
                diagnostics.push(
                    Diagnostic::error(
                        "System not found",
                        format!(
                            "No system with ID {} is registered; systems are created by installing the JumpCloud agent",
                            system_id
                        ),
                    )
                    .with_attribute(AttributePath::new("system_id")),
                );
                CreateResourceResponse {
                    new_state: request.planned_state,
                    private: vec![],
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("Failed to adopt system", &e));
                CreateResourceResponse {
                    new_state: request.planned_state,
                    private: vec![],
                    diagnostics,
                }
            }
        }
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let mut diagnostics = vec![];

        let Some(id) = get_string(&request.current_state, "id") else {
            return ReadResourceResponse {
                new_state: None,
                diagnostics,
                private: request.private,
            };
        };

        let Some(provider_data) = &self.provider_data else {
            diagnostics.push(not_configured());
            return ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics,
                private: request.private,
            };
        };

        match provider_data.client.directory().systems().get(&id).await {
            Ok(system) => ReadResourceResponse {
                new_state: Some(Self::state_from_system(&system)),
                diagnostics,
                private: request.private,
            },
            Err(e) if e.is_not_found() => {
                tracing::warn!("System {} no longer exists, removing from state", id);
                ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                    private: request.private,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("Failed to read system", &e));
                ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                    private: request.private,
                }
            }
        }
    }

    async fn update(&self, _ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let mut diagnostics = vec![];

        let Some(provider_data) = &self.provider_data else {
            diagnostics.push(not_configured());
            return UpdateResourceResponse {
                new_state: request.prior_state,
                private: vec![],
                diagnostics,
            };
        };

        let Some(id) = get_string(&request.prior_state, "id") else {
            diagnostics.push(missing_id());
            return UpdateResourceResponse {
                new_state: request.prior_state,
                private: vec![],
                diagnostics,
            };
        };

        match Self::apply(provider_data, &id, &request.planned_state).await {
            Ok(system) => UpdateResourceResponse {
                new_state: Self::state_from_system(&system),
                private: vec![],
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(api_error("Failed to update system", &e));
                UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                }
            }
        }
    }

    async fn delete(&self, _ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let mut diagnostics = vec![];

        let Some(provider_data) = &self.provider_data else {
            diagnostics.push(not_configured());
            return DeleteResourceResponse { diagnostics };
        };

        let Some(id) = get_string(&request.prior_state, "id") else {
            return DeleteResourceResponse { diagnostics };
        };

        match provider_data.client.directory().systems().delete(&id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!("System {} already deleted", id);
            }
            Err(e) => diagnostics.push(api_error("Failed to delete system", &e)),
        }

        DeleteResourceResponse { diagnostics }
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

#[async_trait]
impl ResourceWithConfigure for SystemResource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        let mut diagnostics = vec![];
        match JumpCloudProviderData::from_provider_data(request.provider_data, "resource") {
            Ok(data) => self.provider_data = Some(data),
            Err(diag) => diagnostics.push(diag),
        }
        ConfigureResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithImportState for SystemResource {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse {
            imported_resources: vec![],
            diagnostics: vec![],
        };
        import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        for imported in &mut response.imported_resources {
            set(&mut imported.state, "system_id", request.id.clone());
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::test_support::{configured, plan};
    use mockito::{Matcher, Server};

    const SYSTEM_BODY: &str = r#"{"_id":"s1","displayName":"build-01","hostname":"build-01.local",
        "os":"Ubuntu","agentVersion":"1.2.3","active":true,
        "allowSshPasswordAuthentication":false,"allowSshRootLogin":false,
        "allowMultiFactorAuthentication":true,"allowPublicKeyAuthentication":true}"#;

    fn create_request(planned: DynamicValue) -> CreateResourceRequest {
        CreateResourceRequest {
            type_name: "jumpcloud_system".to_string(),
            planned_state: planned.clone(),
            config: planned,
            planned_private: vec![],
            provider_meta: None,
        }
    }

    #[tokio::test]
    async fn create_adopts_system_and_applies_settings() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/api/systems/s1")
            .match_body(Matcher::Json(serde_json::json!({
                "displayName": "build-01",
                "allowMultiFactorAuthentication": true
            })))
            .with_body(SYSTEM_BODY)
            .create_async()
            .await;

        let resource: SystemResource = configured(&server.url()).await;
        let response = resource
            .create(
                Context::new(),
                create_request(plan(serde_json::json!({
                    "system_id": "s1",
                    "display_name": "build-01",
                    "allow_multi_factor_authentication": true
                }))),
            )
            .await;

        mock.assert_async().await;
        assert!(response.diagnostics.is_empty());
        let state = &response.new_state;
        assert_eq!(get_string(state, "id").as_deref(), Some("s1"));
        assert_eq!(get_string(state, "hostname").as_deref(), Some("build-01.local"));
        assert_eq!(get_bool(state, "allow_ssh_root_login"), Some(false));
        assert_eq!(get_bool(state, "active"), Some(true));
    }

    #[tokio::test]
    async fn create_without_settings_only_reads() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/systems/s1")
            .with_body(SYSTEM_BODY)
            .create_async()
            .await;

        let resource: SystemResource = configured(&server.url()).await;
        let response = resource
            .create(
                Context::new(),
                create_request(plan(serde_json::json!({"system_id": "s1"}))),
            )
            .await;

        mock.assert_async().await;
        assert!(response.diagnostics.is_empty());
        assert_eq!(
            get_string(&response.new_state, "display_name").as_deref(),
            Some("build-01")
        );
    }

    #[tokio::test]
    async fn create_reports_unknown_system() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/systems/missing")
            .with_status(404)
            .create_async()
            .await;

        let resource: SystemResource = configured(&server.url()).await;
        let response = resource
            .create(
                Context::new(),
                create_request(plan(serde_json::json!({"system_id": "missing"}))),
            )
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].summary, "System not found");
    }
}

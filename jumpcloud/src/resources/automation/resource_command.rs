//! Command resource implementation

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::defaults::StaticDefault;
use tfplug::import_state_passthrough_id;
use tfplug::plan_modifier::UseStateForUnknown;
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
use tfplug::validator::{NumberRangeValidator, OneOfValidator, StringLengthValidator};

use crate::api::automation::commands::Command;
use crate::resources::helpers::{
    api_error, get_string, get_u64, missing_id, not_configured, optional_string, set,
};
use crate::JumpCloudProviderData;

pub const COMMAND_TYPES: &[&str] = &["linux", "windows", "mac"];
pub const LAUNCH_TYPES: &[&str] = &["manual", "trigger", "repeated", "one-time"];

#[derive(Default)]
pub struct CommandResource {
    provider_data: Option<JumpCloudProviderData>,
}

impl CommandResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn required(plan: &DynamicValue, name: &str) -> Result<String, Diagnostic> {
        get_string(plan, name).ok_or_else(|| {
            Diagnostic::error(
                format!("Missing {}", name),
                format!("The '{}' attribute is required", name),
            )
            .with_attribute(AttributePath::new(name))
        })
    }

    fn command_from_plan(plan: &DynamicValue) -> Result<Command, Diagnostic> {
        Ok(Command {
            id: None,
            name: Self::required(plan, "name")?,
            command: Self::required(plan, "command")?,
            command_type: Self::required(plan, "command_type")?,
            user: get_string(plan, "user"),
            shell: get_string(plan, "shell"),
            launch_type: get_string(plan, "launch_type"),
            trigger: get_string(plan, "trigger"),
            timeout: get_u64(plan, "timeout"),
            schedule: get_string(plan, "schedule"),
        })
    }

    fn state_from_command(command: &Command, reference: &DynamicValue) -> DynamicValue {
        let mut state = DynamicValue::object();
        set(&mut state, "id", command.id.clone());
        set(&mut state, "name", command.name.clone());
        set(&mut state, "command", command.command.clone());
        set(&mut state, "command_type", command.command_type.clone());
        set(&mut state, "user", command.user.clone());
        set(
            &mut state,
            "shell",
            optional_string(command.shell.clone(), reference, "shell"),
        );
        set(&mut state, "launch_type", command.launch_type.clone());
        set(
            &mut state,
            "trigger",
            optional_string(command.trigger.clone(), reference, "trigger"),
        );
        set(&mut state, "timeout", command.timeout.map(|t| t as f64));
        set(
            &mut state,
            "schedule",
            optional_string(command.schedule.clone(), reference, "schedule"),
        );
        state
    }
}

#[async_trait]
impl Resource for CommandResource {
    fn type_name(&self) -> &str {
        "jumpcloud_command"
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
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Manages a JumpCloud command")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .required()
                    .validator(StringLengthValidator::between(1, 255))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("command", AttributeType::String)
                    .description("Script body to run")
                    .required()
                    .validator(StringLengthValidator::at_least(1))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("command_type", AttributeType::String)
                    .description("Target operating system: linux, windows or mac")
                    .required()
                    .validator(OneOfValidator::create(COMMAND_TYPES))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("user", AttributeType::String)
                    .description("ID of the user the command runs as")
                    .optional()
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("shell", AttributeType::String)
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("launch_type", AttributeType::String)
                    .optional()
                    .default(StaticDefault::string("manual"))
                    .validator(OneOfValidator::create(LAUNCH_TYPES))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("trigger", AttributeType::String)
                    .description("Trigger name when launch_type is trigger")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("timeout", AttributeType::Number)
                    .description("Timeout in seconds")
                    .optional()
                    .computed()
                    .validator(NumberRangeValidator::at_least(0.0))
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("schedule", AttributeType::String)
                    .description("Schedule expression for repeated commands")
                    .optional()
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

        let command = match Self::command_from_plan(&request.planned_state) {
            Ok(command) => command,
            Err(diag) => {
                diagnostics.push(diag);
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };

        match provider_data
            .client
            .automation()
            .commands()
            .create(&command)
            .await
        {
            Ok(created) => CreateResourceResponse {
                new_state: Self::state_from_command(&created, &request.planned_state),
                private: vec![],
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(api_error("Failed to create command", &e));
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

        match provider_data.client.automation().commands().get(&id).await {
            Ok(command) => ReadResourceResponse {
                new_state: Some(Self::state_from_command(&command, &request.current_state)),
                diagnostics,
                private: request.private,
            },
            Err(e) if e.is_not_found() => {
                tracing::warn!("Command {} no longer exists, removing from state", id);
                ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                    private: request.private,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("Failed to read command", &e));
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

        let command = match Self::command_from_plan(&request.planned_state) {
            Ok(command) => command,
            Err(diag) => {
                diagnostics.push(diag);
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };

        match provider_data
            .client
            .automation()
            .commands()
            .update(&id, &command)
            .await
        {
            Ok(updated) => UpdateResourceResponse {
                new_state: Self::state_from_command(&updated, &request.planned_state),
                private: vec![],
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(api_error("Failed to update command", &e));
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

        match provider_data.client.automation().commands().delete(&id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!("Command {} already deleted", id);
            }
            Err(e) => diagnostics.push(api_error("Failed to delete command", &e)),
        }

        DeleteResourceResponse { diagnostics }
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

#[async_trait]
impl ResourceWithConfigure for CommandResource {
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
impl ResourceWithImportState for CommandResource {
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
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::test_support::{configured, plan};
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn create_sends_timeout_as_string() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/commands")
            .match_body(Matcher::Json(serde_json::json!({
                "name": "uptime",
                "command": "uptime",
                "commandType": "linux",
                "launchType": "manual",
                "timeout": "120"
            })))
            .with_body(
                r#"{"_id":"c1","name":"uptime","command":"uptime","commandType":"linux",
                    "user":"000000000000000000000000","shell":"","launchType":"manual",
                    "trigger":"","timeout":"120","schedule":""}"#,
            )
            .create_async()
            .await;

        let resource: CommandResource = configured(&server.url()).await;
        let planned = plan(serde_json::json!({
            "id": null,
            "name": "uptime",
            "command": "uptime",
            "command_type": "linux",
            "user": null,
            "shell": null,
            "launch_type": "manual",
            "trigger": null,
            "timeout": 120,
            "schedule": null
        }));
        let response = resource
            .create(
                Context::new(),
                CreateResourceRequest {
                    type_name: "jumpcloud_command".to_string(),
                    planned_state: planned.clone(),
                    config: planned,
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;

        mock.assert_async().await;
        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        let state = &response.new_state;
        assert_eq!(get_string(state, "id").as_deref(), Some("c1"));
        assert_eq!(get_u64(state, "timeout"), Some(120));
        assert_eq!(
            get_string(state, "user").as_deref(),
            Some("000000000000000000000000")
        );
        assert!(state.get(&AttributePath::new("shell")).unwrap().is_null());
        assert!(state.get(&AttributePath::new("schedule")).unwrap().is_null());
    }

    #[tokio::test]
    async fn delete_missing_command_succeeds() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/api/commands/c1")
            .with_status(404)
            .create_async()
            .await;

        let resource: CommandResource = configured(&server.url()).await;
        let response = resource
            .delete(
                Context::new(),
                DeleteResourceRequest {
                    type_name: "jumpcloud_command".to_string(),
                    prior_state: plan(serde_json::json!({"id": "c1"})),
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
    }
}

//! System group resource implementation

use async_trait::async_trait;
use tfplug::context::Context;
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
use tfplug::validator::StringLengthValidator;

use crate::api::directory::system_groups::SystemGroup;
use crate::resources::helpers::{
    api_error, get_string, missing_id, not_configured, optional_string, set,
};
use crate::JumpCloudProviderData;

#[derive(Default)]
pub struct SystemGroupResource {
    provider_data: Option<JumpCloudProviderData>,
}

impl SystemGroupResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn group_from_plan(plan: &DynamicValue) -> Result<SystemGroup, Diagnostic> {
        let name = get_string(plan, "name").ok_or_else(|| {
            Diagnostic::error("Missing name", "The 'name' attribute is required")
                .with_attribute(AttributePath::new("name"))
        })?;

        Ok(SystemGroup {
            id: None,
            name,
            description: get_string(plan, "description"),
        })
    }

    fn state_from_group(group: &SystemGroup, reference: &DynamicValue) -> DynamicValue {
        let mut state = DynamicValue::object();
        set(&mut state, "id", group.id.clone());
        set(&mut state, "name", group.name.clone());
        set(
            &mut state,
            "description",
            optional_string(group.description.clone(), reference, "description"),
        );
        state
    }
}

#[async_trait]
impl Resource for SystemGroupResource {
    fn type_name(&self) -> &str {
        "jumpcloud_system_group"
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
            .description("Manages a JumpCloud system group")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("The group ID")
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Unique group name")
                    .required()
                    .validator(StringLengthValidator::between(1, 255))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .description("Free-form description of the group")
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

        let group = match Self::group_from_plan(&request.planned_state) {
            Ok(group) => group,
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
            .directory()
            .system_groups()
            .create(&group)
            .await
        {
            Ok(created) => CreateResourceResponse {
                new_state: Self::state_from_group(&created, &request.planned_state),
                private: vec![],
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(api_error("Failed to create system group", &e));
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

        match provider_data.client.directory().system_groups().get(&id).await {
            Ok(group) => ReadResourceResponse {
                new_state: Some(Self::state_from_group(&group, &request.current_state)),
                diagnostics,
                private: request.private,
            },
            Err(e) if e.is_not_found() => {
                tracing::warn!("System group {} no longer exists, removing from state", id);
                ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                    private: request.private,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("Failed to read system group", &e));
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

        let group = match Self::group_from_plan(&request.planned_state) {
            Ok(group) => group,
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
            .directory()
            .system_groups()
            .update(&id, &group)
            .await
        {
            Ok(updated) => UpdateResourceResponse {
                new_state: Self::state_from_group(&updated, &request.planned_state),
                private: vec![],
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(api_error("Failed to update system group", &e));
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

        match provider_data.client.directory().system_groups().delete(&id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!("System group {} already deleted", id);
            }
            Err(e) => diagnostics.push(api_error("Failed to delete system group", &e)),
        }

        DeleteResourceResponse { diagnostics }
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

#[async_trait]
impl ResourceWithConfigure for SystemGroupResource {
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
impl ResourceWithImportState for SystemGroupResource {
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
    use crate::resources::test_support::{configured, plan, state};
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn create_posts_name_and_description() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v2/systemgroups")
            .match_body(Matcher::Json(
                serde_json::json!({"name": "servers", "description": "Linux fleet"}),
            ))
            .with_status(201)
            .with_body(r#"{"id":"sg1","name":"servers","description":"Linux fleet"}"#)
            .create_async()
            .await;

        let resource: SystemGroupResource = configured(&server.url()).await;
        let planned = plan(serde_json::json!({
            "id": null,
            "name": "servers",
            "description": "Linux fleet"
        }));
        let response = resource
            .create(
                Context::new(),
                CreateResourceRequest {
                    type_name: "jumpcloud_system_group".to_string(),
                    planned_state: planned.clone(),
                    config: planned,
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;

        mock.assert_async().await;
        assert!(response.diagnostics.is_empty());
        assert_eq!(
            get_string(&response.new_state, "id").as_deref(),
            Some("sg1")
        );
    }

    #[tokio::test]
    async fn read_keeps_unset_description_null() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v2/systemgroups/sg1")
            .with_body(r#"{"id":"sg1","name":"servers","description":""}"#)
            .create_async()
            .await;

        let resource: SystemGroupResource = configured(&server.url()).await;
        let current = state(serde_json::json!({
            "id": "sg1",
            "name": "servers",
            "description": null
        }));
        let response = resource
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: "jumpcloud_system_group".to_string(),
                    current_state: current.clone(),
                    private: vec![],
                    provider_meta: None,
                    client_capabilities: Default::default(),
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        assert_eq!(response.new_state, Some(current));
    }
}

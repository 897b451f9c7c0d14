//! API key resource implementation
//!
//! The key value is returned only by the create call and is kept in state
//! from then on.

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
use tfplug::validator::{Rfc3339Validator, StringLengthValidator};

use crate::api::security::api_keys::ApiKey;
use crate::resources::helpers::{
    api_error, get_string, missing_id, not_configured, set, timestamp_string,
};
use crate::JumpCloudProviderData;

#[derive(Default)]
pub struct ApiKeyResource {
    provider_data: Option<JumpCloudProviderData>,
}

impl ApiKeyResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn key_from_plan(plan: &DynamicValue) -> Result<ApiKey, Diagnostic> {
        let name = get_string(plan, "name").ok_or_else(|| {
            Diagnostic::error("Missing name", "The 'name' attribute is required")
                .with_attribute(AttributePath::new("name"))
        })?;

        Ok(ApiKey {
            id: None,
            name,
            expires_at: get_string(plan, "expires_at"),
            key: None,
            created_at: None,
        })
    }

    fn state_from_key(key: &ApiKey, reference: &DynamicValue) -> DynamicValue {
        let mut state = DynamicValue::object();
        set(&mut state, "id", key.id.clone());
        set(&mut state, "name", key.name.clone());
        set(
            &mut state,
            "expires_at",
            timestamp_string(get_string(reference, "expires_at"), key.expires_at.clone()),
        );
        set(
            &mut state,
            "key",
            key.key.clone().or_else(|| get_string(reference, "key")),
        );
        set(&mut state, "created_at", key.created_at.clone());
        state
    }
}

#[async_trait]
impl Resource for ApiKeyResource {
    fn type_name(&self) -> &str {
        "jumpcloud_api_key"
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
            .description("Manages a JumpCloud API key")
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
                AttributeBuilder::new("expires_at", AttributeType::String)
                    .description("Expiry time in RFC 3339 format")
                    .optional()
                    .validator(Rfc3339Validator::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("key", AttributeType::String)
                    .description("The key value, only available after creation")
                    .computed()
                    .sensitive()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("created_at", AttributeType::String)
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
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

        let key = match Self::key_from_plan(&request.planned_state) {
            Ok(key) => key,
            Err(diag) => {
                diagnostics.push(diag);
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };

        match provider_data.client.security().api_keys().create(&key).await {
            Ok(created) => {
                if created.key.is_none() {
                    tracing::warn!("API key create response did not include the key value");
                }
                CreateResourceResponse {
                    new_state: Self::state_from_key(&created, &request.planned_state),
                    private: vec![],
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("Failed to create API key", &e));
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

        match provider_data.client.security().api_keys().get(&id).await {
            Ok(key) => ReadResourceResponse {
                new_state: Some(Self::state_from_key(&key, &request.current_state)),
                diagnostics,
                private: request.private,
            },
            Err(e) if e.is_not_found() => {
                tracing::warn!("API key {} no longer exists, removing from state", id);
                ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                    private: request.private,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("Failed to read API key", &e));
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

        let key = match Self::key_from_plan(&request.planned_state) {
            Ok(key) => key,
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
            .security()
            .api_keys()
            .update(&id, &key)
            .await
        {
            Ok(updated) => UpdateResourceResponse {
                new_state: Self::state_from_key(&updated, &request.planned_state),
                private: vec![],
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(api_error("Failed to update API key", &e));
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

        match provider_data.client.security().api_keys().delete(&id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!("API key {} already deleted", id);
            }
            Err(e) => diagnostics.push(api_error("Failed to delete API key", &e)),
        }

        DeleteResourceResponse { diagnostics }
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

#[async_trait]
impl ResourceWithConfigure for ApiKeyResource {
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
impl ResourceWithImportState for ApiKeyResource {
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

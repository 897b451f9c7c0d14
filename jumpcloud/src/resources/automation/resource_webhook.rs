//! Webhook resource implementation

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
use tfplug::validator::{
    ListLengthValidator, OneOfValidator, StringLengthValidator, StringPatternValidator,
};

use crate::api::automation::webhooks::Webhook;
use crate::resources::helpers::{
    api_error, get_string, get_string_list, missing_id, not_configured, optional_string, set,
    string_list,
};
use crate::JumpCloudProviderData;

pub const WEBHOOK_STATUSES: &[&str] = &["active", "inactive"];

#[derive(Default)]
pub struct WebhookResource {
    provider_data: Option<JumpCloudProviderData>,
}

impl WebhookResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn webhook_from_plan(plan: &DynamicValue) -> Result<Webhook, Diagnostic> {
        let name = get_string(plan, "name").ok_or_else(|| {
            Diagnostic::error("Missing name", "The 'name' attribute is required")
                .with_attribute(AttributePath::new("name"))
        })?;
        let url = get_string(plan, "url").ok_or_else(|| {
            Diagnostic::error("Missing url", "The 'url' attribute is required")
                .with_attribute(AttributePath::new("url"))
        })?;

        Ok(Webhook {
            id: None,
            name,
            url,
            secret: get_string(plan, "secret"),
            events: get_string_list(plan, "events")?.unwrap_or_default(),
            status: get_string(plan, "status"),
            description: get_string(plan, "description"),
            created_at: None,
            updated_at: None,
        })
    }

    /// The secret is write-only; state keeps whatever the reference holds
    fn state_from_webhook(webhook: &Webhook, reference: &DynamicValue) -> DynamicValue {
        let mut state = DynamicValue::object();
        set(&mut state, "id", webhook.id.clone());
        set(&mut state, "name", webhook.name.clone());
        set(&mut state, "url", webhook.url.clone());
        set(&mut state, "secret", get_string(reference, "secret"));
        set(&mut state, "events", string_list(&webhook.events));
        set(&mut state, "status", webhook.status.clone());
        set(
            &mut state,
            "description",
            optional_string(webhook.description.clone(), reference, "description"),
        );
        set(&mut state, "created_at", webhook.created_at.clone());
        set(&mut state, "updated_at", webhook.updated_at.clone());
        state
    }
}

#[async_trait]
impl Resource for WebhookResource {
    fn type_name(&self) -> &str {
        "jumpcloud_webhook"
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
            .description("Manages a JumpCloud webhook subscription")
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
                AttributeBuilder::new("url", AttributeType::String)
                    .description("HTTPS endpoint receiving the events")
                    .required()
                    .validator(StringPatternValidator::create(
                        r"^https?://\S+$",
                        "must be an http(s) URL",
                    ))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("secret", AttributeType::String)
                    .description("Secret used to sign deliveries")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("events", AttributeType::List(Box::new(AttributeType::String)))
                    .description("Event types delivered to the endpoint")
                    .required()
                    .validator(ListLengthValidator::at_least(1))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("status", AttributeType::String)
                    .optional()
                    .default(StaticDefault::string("active"))
                    .validator(OneOfValidator::create(WEBHOOK_STATUSES))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("created_at", AttributeType::String)
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("updated_at", AttributeType::String)
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

        let webhook = match Self::webhook_from_plan(&request.planned_state) {
            Ok(webhook) => webhook,
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
            .webhooks()
            .create(&webhook)
            .await
        {
            Ok(created) => CreateResourceResponse {
                new_state: Self::state_from_webhook(&created, &request.planned_state),
                private: vec![],
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(api_error("Failed to create webhook", &e));
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

        match provider_data.client.automation().webhooks().get(&id).await {
            Ok(webhook) => ReadResourceResponse {
                new_state: Some(Self::state_from_webhook(&webhook, &request.current_state)),
                diagnostics,
                private: request.private,
            },
            Err(e) if e.is_not_found() => {
                tracing::warn!("Webhook {} no longer exists, removing from state", id);
                ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                    private: request.private,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("Failed to read webhook", &e));
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

        let webhook = match Self::webhook_from_plan(&request.planned_state) {
            Ok(webhook) => webhook,
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
            .webhooks()
            .update(&id, &webhook)
            .await
        {
            Ok(updated) => UpdateResourceResponse {
                new_state: Self::state_from_webhook(&updated, &request.planned_state),
                private: vec![],
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(api_error("Failed to update webhook", &e));
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

        match provider_data.client.automation().webhooks().delete(&id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!("Webhook {} already deleted", id);
            }
            Err(e) => diagnostics.push(api_error("Failed to delete webhook", &e)),
        }

        DeleteResourceResponse { diagnostics }
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

#[async_trait]
impl ResourceWithConfigure for WebhookResource {
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
impl ResourceWithImportState for WebhookResource {
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
    use tfplug::types::ClientCapabilities;

    #[tokio::test]
    async fn read_keeps_write_only_secret() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v2/webhooks/w1")
            .with_body(
                r#"{"id":"w1","name":"audit","url":"https://hooks.example.com/jc",
                    "events":["user.created","user.deleted"],"status":"active",
                    "createdAt":"2024-01-01T00:00:00Z","updatedAt":"2024-02-01T00:00:00Z"}"#,
            )
            .create_async()
            .await;

        let resource: WebhookResource = configured(&server.url()).await;
        let current = state(serde_json::json!({
            "id": "w1",
            "name": "audit",
            "url": "https://hooks.example.com/jc",
            "secret": "hunter2",
            "events": ["user.created", "user.deleted"],
            "status": "active",
            "description": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-02-01T00:00:00Z"
        }));
        let response = resource
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: "jumpcloud_webhook".to_string(),
                    current_state: current.clone(),
                    private: vec![],
                    provider_meta: None,
                    client_capabilities: ClientCapabilities::default(),
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        assert_eq!(response.new_state, Some(current));
    }

    #[test]
    fn null_event_is_rejected() {
        let planned = plan(serde_json::json!({
            "name": "audit",
            "url": "https://hooks.example.com/jc",
            "events": ["user.created", null]
        }));

        let err = WebhookResource::webhook_from_plan(&planned).unwrap_err();
        assert_eq!(err.attribute, Some(AttributePath::new("events").index(1)));
    }
}

//! Policy resource implementation
//!
//! Each entry of `values` carries its value as a JSON string so any field
//! type the template declares can be expressed.

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::defaults::StaticDefault;
use tfplug::import_state_passthrough_id;
use tfplug::plan_modifier::{RequiresReplace, UseStateForUnknown};
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceMetadataRequest, ResourceMetadataResponse,
    ResourceSchemaRequest, ResourceSchemaResponse, ResourceWithConfigure,
    ResourceWithImportState, UpdateResourceRequest, UpdateResourceResponse,
    ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tfplug::validator::StringLengthValidator;

use crate::api::common::ObjectRef;
use crate::api::security::policies::{Policy, PolicyValue};
use crate::resources::helpers::{
    api_error, get_complete_objects, get_object_list, get_string, incomplete_entries, json_string,
    missing_id, not_configured, object_string, optional_string, parse_json, set,
};
use crate::JumpCloudProviderData;

const VALUE_FIELDS: &[&str] = &["config_field_id", "value"];

#[derive(Default)]
pub struct PolicyResource {
    provider_data: Option<JumpCloudProviderData>,
}

impl PolicyResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn values_from_plan(plan: &DynamicValue) -> Result<Vec<PolicyValue>, Diagnostic> {
        get_complete_objects(plan, "values", VALUE_FIELDS)?
            .iter()
            .map(|entry| {
                let config_field_id = object_string(entry, "config_field_id").unwrap_or_default();
                let text = object_string(entry, "value").unwrap_or_default();
                let value = parse_json(&text).map_err(|diag| {
                    Diagnostic::error(
                        diag.summary,
                        format!("Value for {}: {}", config_field_id, diag.detail),
                    )
                    .with_attribute(AttributePath::new("values"))
                })?;
                Ok(PolicyValue {
                    config_field_id,
                    value,
                })
            })
            .collect()
    }

    fn policy_from_plan(plan: &DynamicValue) -> Result<Policy, Diagnostic> {
        let name = get_string(plan, "name").ok_or_else(|| {
            Diagnostic::error("Missing name", "The 'name' attribute is required")
                .with_attribute(AttributePath::new("name"))
        })?;
        let template_id = get_string(plan, "template_id").ok_or_else(|| {
            Diagnostic::error("Missing template_id", "The 'template_id' attribute is required")
                .with_attribute(AttributePath::new("template_id"))
        })?;

        Ok(Policy {
            id: None,
            name,
            notes: get_string(plan, "notes"),
            template: Some(ObjectRef {
                id: template_id,
                object_type: None,
            }),
            values: Self::values_from_plan(plan)?,
        })
    }

    fn state_from_policy(policy: &Policy, reference: &DynamicValue) -> DynamicValue {
        let reference_values = get_object_list(reference, "values");
        let values = policy
            .values
            .iter()
            .map(|value| {
                let reference_text = reference_values
                    .iter()
                    .find(|entry| {
                        object_string(entry, "config_field_id").as_deref()
                            == Some(value.config_field_id.as_str())
                    })
                    .and_then(|entry| object_string(entry, "value"));
                let rendered = match json_string(reference_text, Some(&value.value)) {
                    Dynamic::Null => Dynamic::String("null".to_string()),
                    other => other,
                };
                Dynamic::Map(
                    [
                        (
                            "config_field_id".to_string(),
                            Dynamic::from(value.config_field_id.clone()),
                        ),
                        ("value".to_string(), rendered),
                    ]
                    .into_iter()
                    .collect(),
                )
            })
            .collect();

        let template_id = policy
            .template_id()
            .map(str::to_string)
            .or_else(|| get_string(reference, "template_id"));

        let mut state = DynamicValue::object();
        set(&mut state, "id", policy.id.clone());
        set(&mut state, "name", policy.name.clone());
        set(&mut state, "template_id", template_id);
        set(
            &mut state,
            "notes",
            optional_string(policy.notes.clone(), reference, "notes"),
        );
        set(&mut state, "values", Dynamic::List(values));
        state
    }
}

#[async_trait]
impl Resource for PolicyResource {
    fn type_name(&self) -> &str {
        "jumpcloud_policy"
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
            .description("Manages a JumpCloud policy instantiated from a policy template")
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
                AttributeBuilder::new("template_id", AttributeType::String)
                    .description("ID of the policy template")
                    .required()
                    .validator(StringLengthValidator::at_least(1))
                    .plan_modifier(RequiresReplace::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("notes", AttributeType::String)
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "values",
                    AttributeType::list_of_objects(&[
                        ("config_field_id", AttributeType::String),
                        ("value", AttributeType::String),
                    ]),
                )
                .description("Template field values; each value is a JSON string")
                .optional()
                .default(StaticDefault::empty_list())
                .build(),
            )
            .build();

        ResourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        ValidateResourceConfigResponse {
            diagnostics: incomplete_entries(&request.config, "values", VALUE_FIELDS, false),
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

        let policy = match Self::policy_from_plan(&request.planned_state) {
            Ok(policy) => policy,
            Err(diag) => {
                diagnostics.push(diag);
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };

        match provider_data.client.security().policies().create(&policy).await {
            Ok(created) => CreateResourceResponse {
                new_state: Self::state_from_policy(&created, &request.planned_state),
                private: vec![],
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(api_error("Failed to create policy", &e));
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

        match provider_data.client.security().policies().get(&id).await {
            Ok(policy) => ReadResourceResponse {
                new_state: Some(Self::state_from_policy(&policy, &request.current_state)),
                diagnostics,
                private: request.private,
            },
            Err(e) if e.is_not_found() => {
                tracing::warn!("Policy {} no longer exists, removing from state", id);
                ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                    private: request.private,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("Failed to read policy", &e));
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

        let policy = match Self::policy_from_plan(&request.planned_state) {
            Ok(policy) => policy,
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
            .policies()
            .update(&id, &policy)
            .await
        {
            Ok(updated) => UpdateResourceResponse {
                new_state: Self::state_from_policy(&updated, &request.planned_state),
                private: vec![],
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(api_error("Failed to update policy", &e));
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

        match provider_data.client.security().policies().delete(&id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!("Policy {} already deleted", id);
            }
            Err(e) => diagnostics.push(api_error("Failed to delete policy", &e)),
        }

        DeleteResourceResponse { diagnostics }
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

#[async_trait]
impl ResourceWithConfigure for PolicyResource {
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
impl ResourceWithImportState for PolicyResource {
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

    fn planned() -> DynamicValue {
        plan(serde_json::json!({
            "id": null,
            "name": "screen lock",
            "template_id": "t1",
            "notes": null,
            "values": [
                {"config_field_id": "f1", "value": "true"},
                {"config_field_id": "f2", "value": "{\"minutes\": 10, \"grace\": [1, 2]}"}
            ]
        }))
    }

    #[tokio::test]
    async fn values_round_trip_as_json_strings() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v2/policies")
            .match_body(Matcher::Json(serde_json::json!({
                "name": "screen lock",
                "template": {"id": "t1"},
                "values": [
                    {"configFieldID": "f1", "value": true},
                    {"configFieldID": "f2", "value": {"minutes": 10, "grace": [1, 2]}}
                ]
            })))
            .with_body(
                r#"{"id":"p1","name":"screen lock","template":{"id":"t1","type":"policy_template"},
                    "values":[{"configFieldID":"f1","value":true},
                              {"configFieldID":"f2","value":{"grace":[1,2],"minutes":10}}]}"#,
            )
            .create_async()
            .await;

        let resource: PolicyResource = configured(&server.url()).await;
        let response = resource
            .create(
                Context::new(),
                CreateResourceRequest {
                    type_name: "jumpcloud_policy".to_string(),
                    planned_state: planned(),
                    config: planned(),
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;

        mock.assert_async().await;
        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);

        let mut expected = planned();
        expected
            .set_string(&AttributePath::new("id"), "p1".to_string())
            .unwrap();
        assert_eq!(response.new_state, expected);
    }

    #[test]
    fn invalid_value_json_is_rejected() {
        let bad = plan(serde_json::json!({
            "name": "p",
            "template_id": "t1",
            "values": [{"config_field_id": "f1", "value": "{oops"}]
        }));

        let err = PolicyResource::policy_from_plan(&bad).unwrap_err();
        assert_eq!(err.summary, "Invalid JSON");
        assert!(err.detail.contains("f1"));
    }

    #[tokio::test]
    async fn value_entry_without_field_id_is_rejected() {
        let resource = PolicyResource::new();
        let config = plan(serde_json::json!({
            "name": "screen lock",
            "template_id": "t1",
            "values": [{"config_field_id": null, "value": "true"}]
        }));
        let validated = resource
            .validate(
                Context::new(),
                ValidateResourceConfigRequest {
                    type_name: "jumpcloud_policy".to_string(),
                    config: config.clone(),
                    client_capabilities: tfplug::types::ClientCapabilities::default(),
                },
            )
            .await;
        assert_eq!(validated.diagnostics.len(), 1);
        assert_eq!(
            validated.diagnostics[0].attribute,
            Some(AttributePath::new("values").index(0).attribute("config_field_id"))
        );

        let err = PolicyResource::policy_from_plan(&config).unwrap_err();
        assert_eq!(err.summary, "Incomplete list entry");
    }
}

//! Alert configuration resource implementation

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
    ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tfplug::validator::{JsonStringValidator, OneOfValidator, StringLengthValidator};

use crate::api::security::alerts::{AlertAction, AlertConfiguration};
use crate::resources::helpers::{
    api_error, get_bool, get_complete_objects, get_json, get_object_list, get_string,
    incomplete_entries, json_string, missing_id, not_configured, object_string, optional_string,
    set,
};
use crate::JumpCloudProviderData;

pub const SEVERITIES: &[&str] = &["low", "medium", "high", "critical"];
pub const ACTION_TYPES: &[&str] = &["email", "webhook", "slack"];
const ACTION_FIELDS: &[&str] = &["type", "target"];

#[derive(Default)]
pub struct AlertConfigurationResource {
    provider_data: Option<JumpCloudProviderData>,
}

impl AlertConfigurationResource {
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

    fn actions_from_plan(plan: &DynamicValue) -> Result<Vec<AlertAction>, Diagnostic> {
        Ok(get_complete_objects(plan, "actions", ACTION_FIELDS)?
            .iter()
            .map(|action| AlertAction {
                action_type: object_string(action, "type").unwrap_or_default(),
                target: object_string(action, "target").unwrap_or_default(),
            })
            .collect())
    }

    fn config_from_plan(plan: &DynamicValue) -> Result<AlertConfiguration, Diagnostic> {
        Ok(AlertConfiguration {
            id: None,
            name: Self::required(plan, "name")?,
            description: get_string(plan, "description"),
            alert_type: Self::required(plan, "type")?,
            severity: Self::required(plan, "severity")?,
            enabled: get_bool(plan, "enabled"),
            conditions: get_json(plan, "conditions")?,
            actions: Self::actions_from_plan(plan)?,
        })
    }

    fn state_from_config(config: &AlertConfiguration, reference: &DynamicValue) -> DynamicValue {
        let actions = config
            .actions
            .iter()
            .map(|action| {
                Dynamic::Map(
                    [
                        ("type".to_string(), Dynamic::from(action.action_type.clone())),
                        ("target".to_string(), Dynamic::from(action.target.clone())),
                    ]
                    .into_iter()
                    .collect(),
                )
            })
            .collect();

        let mut state = DynamicValue::object();
        set(&mut state, "id", config.id.clone());
        set(&mut state, "name", config.name.clone());
        set(
            &mut state,
            "description",
            optional_string(config.description.clone(), reference, "description"),
        );
        set(&mut state, "type", config.alert_type.clone());
        set(&mut state, "severity", config.severity.clone());
        set(&mut state, "enabled", config.enabled.unwrap_or(true));
        set(
            &mut state,
            "conditions",
            json_string(get_string(reference, "conditions"), config.conditions.as_ref()),
        );
        set(&mut state, "actions", Dynamic::List(actions));
        state
    }
}

#[async_trait]
impl Resource for AlertConfigurationResource {
    fn type_name(&self) -> &str {
        "jumpcloud_alert_configuration"
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
            .description("Manages a JumpCloud alert configuration")
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
                AttributeBuilder::new("description", AttributeType::String)
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("type", AttributeType::String)
                    .description("Event type the alert fires on")
                    .required()
                    .validator(StringLengthValidator::at_least(1))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("severity", AttributeType::String)
                    .required()
                    .validator(OneOfValidator::create(SEVERITIES))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("enabled", AttributeType::Bool)
                    .optional()
                    .default(StaticDefault::bool(true))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("conditions", AttributeType::String)
                    .description("Trigger conditions as a JSON object")
                    .optional()
                    .validator(JsonStringValidator::object())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "actions",
                    AttributeType::list_of_objects(&[
                        ("type", AttributeType::String),
                        ("target", AttributeType::String),
                    ]),
                )
                .description("Notifications sent when the alert fires")
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
        let mut diagnostics = incomplete_entries(&request.config, "actions", ACTION_FIELDS, false);
        diagnostics.extend(
            get_object_list(&request.config, "actions")
                .iter()
                .filter_map(|action| object_string(action, "type"))
                .filter(|action_type| !ACTION_TYPES.contains(&action_type.as_str()))
                .map(|action_type| {
                    Diagnostic::error(
                        "Invalid action type",
                        format!(
                            "Action type '{}' must be one of: {}",
                            action_type,
                            ACTION_TYPES.join(", ")
                        ),
                    )
                    .with_attribute(AttributePath::new("actions"))
                }),
        );

        ValidateResourceConfigResponse { diagnostics }
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

        let config = match Self::config_from_plan(&request.planned_state) {
            Ok(config) => config,
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
            .security()
            .alert_configurations()
            .create(&config)
            .await
        {
            Ok(created) => CreateResourceResponse {
                new_state: Self::state_from_config(&created, &request.planned_state),
                private: vec![],
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(api_error("Failed to create alert configuration", &e));
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

        match provider_data
            .client
            .security()
            .alert_configurations()
            .get(&id)
            .await
        {
            Ok(config) => ReadResourceResponse {
                new_state: Some(Self::state_from_config(&config, &request.current_state)),
                diagnostics,
                private: request.private,
            },
            Err(e) if e.is_not_found() => {
                tracing::warn!("Alert configuration {} no longer exists, removing from state", id);
                ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                    private: request.private,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("Failed to read alert configuration", &e));
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

        let config = match Self::config_from_plan(&request.planned_state) {
            Ok(config) => config,
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
            .alert_configurations()
            .update(&id, &config)
            .await
        {
            Ok(updated) => UpdateResourceResponse {
                new_state: Self::state_from_config(&updated, &request.planned_state),
                private: vec![],
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(api_error("Failed to update alert configuration", &e));
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

        match provider_data
            .client
            .security()
            .alert_configurations()
            .delete(&id)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!("Alert configuration {} already deleted", id);
            }
            Err(e) => diagnostics.push(api_error("Failed to delete alert configuration", &e)),
        }

        DeleteResourceResponse { diagnostics }
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

#[async_trait]
impl ResourceWithConfigure for AlertConfigurationResource {
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
impl ResourceWithImportState for AlertConfigurationResource {
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

//! Command schedule resource implementation

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
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::{JsonStringValidator, StringLengthValidator};

use crate::api::automation::command_schedules::CommandSchedule;
use crate::resources::helpers::{
    api_error, get_bool, get_json, get_string, get_string_list, json_string, missing_id,
    not_configured, optional_string, set, string_list,
};
use crate::JumpCloudProviderData;

#[derive(Default)]
pub struct CommandScheduleResource {
    provider_data: Option<JumpCloudProviderData>,
}

impl CommandScheduleResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn schedule_from_plan(plan: &DynamicValue) -> Result<CommandSchedule, Diagnostic> {
        let command_id = get_string(plan, "command_id").ok_or_else(|| {
            Diagnostic::error("Missing command_id", "The 'command_id' attribute is required")
                .with_attribute(AttributePath::new("command_id"))
        })?;

        Ok(CommandSchedule {
            id: None,
            command_id,
            target_systems: get_string_list(plan, "target_systems")?.unwrap_or_default(),
            target_groups: get_string_list(plan, "target_groups")?.unwrap_or_default(),
            schedule: get_json(plan, "schedule")?,
            timezone: get_string(plan, "timezone"),
            enabled: get_bool(plan, "enabled"),
        })
    }

    fn state_from_schedule(schedule: &CommandSchedule, reference: &DynamicValue) -> DynamicValue {
        let mut state = DynamicValue::object();
        set(&mut state, "id", schedule.id.clone());
        set(&mut state, "command_id", schedule.command_id.clone());
        set(&mut state, "target_systems", string_list(&schedule.target_systems));
        set(&mut state, "target_groups", string_list(&schedule.target_groups));
        set(
            &mut state,
            "schedule",
            json_string(get_string(reference, "schedule"), schedule.schedule.as_ref()),
        );
        set(
            &mut state,
            "timezone",
            optional_string(schedule.timezone.clone(), reference, "timezone"),
        );
        set(&mut state, "enabled", schedule.enabled.unwrap_or(true));
        state
    }
}

#[async_trait]
impl Resource for CommandScheduleResource {
    fn type_name(&self) -> &str {
        "jumpcloud_command_schedule"
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
            .description("Schedules a JumpCloud command against systems and system groups")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("command_id", AttributeType::String)
                    .description("ID of the command to run")
                    .required()
                    .validator(StringLengthValidator::at_least(1))
                    .plan_modifier(RequiresReplace::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "target_systems",
                    AttributeType::Set(Box::new(AttributeType::String)),
                )
                .description("IDs of systems the command runs on")
                .optional()
                .default(StaticDefault::empty_list())
                .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "target_groups",
                    AttributeType::Set(Box::new(AttributeType::String)),
                )
                .description("IDs of system groups the command runs on")
                .optional()
                .default(StaticDefault::empty_list())
                .build(),
            )
            .attribute(
                AttributeBuilder::new("schedule", AttributeType::String)
                    .description("Schedule document as a JSON string")
                    .optional()
                    .validator(JsonStringValidator::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("timezone", AttributeType::String)
                    .description("IANA timezone the schedule is evaluated in")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("enabled", AttributeType::Bool)
                    .optional()
                    .default(StaticDefault::bool(true))
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

        let schedule = match Self::schedule_from_plan(&request.planned_state) {
            Ok(schedule) => schedule,
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
            .command_schedules()
            .create(&schedule)
            .await
        {
            Ok(created) => CreateResourceResponse {
                new_state: Self::state_from_schedule(&created, &request.planned_state),
                private: vec![],
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(api_error("Failed to create command schedule", &e));
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
            .automation()
            .command_schedules()
            .get(&id)
            .await
        {
            Ok(schedule) => ReadResourceResponse {
                new_state: Some(Self::state_from_schedule(&schedule, &request.current_state)),
                diagnostics,
                private: request.private,
            },
            Err(e) if e.is_not_found() => {
                tracing::warn!("Command schedule {} no longer exists, removing from state", id);
                ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                    private: request.private,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("Failed to read command schedule", &e));
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

        let schedule = match Self::schedule_from_plan(&request.planned_state) {
            Ok(schedule) => schedule,
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
            .command_schedules()
            .update(&id, &schedule)
            .await
        {
            Ok(updated) => UpdateResourceResponse {
                new_state: Self::state_from_schedule(&updated, &request.planned_state),
                private: vec![],
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(api_error("Failed to update command schedule", &e));
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
            .automation()
            .command_schedules()
            .delete(&id)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!("Command schedule {} already deleted", id);
            }
            Err(e) => diagnostics.push(api_error("Failed to delete command schedule", &e)),
        }

        DeleteResourceResponse { diagnostics }
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

#[async_trait]
impl ResourceWithConfigure for CommandScheduleResource {
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
impl ResourceWithImportState for CommandScheduleResource {
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

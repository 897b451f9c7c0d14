//! Software app resource implementation
//!
//! The API models package settings as a list; the resource manages exactly
//! one settings entry and exposes its fields at the top level.

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
use tfplug::validator::{JsonStringValidator, OneOfValidator, StringLengthValidator};

use crate::api::integrations::software_apps::{SoftwareApp, SoftwareAppSettings};
use crate::resources::helpers::{
    api_error, get_bool, get_json, get_string, json_string, missing_id, not_configured, set,
};
use crate::JumpCloudProviderData;

pub const PACKAGE_MANAGERS: &[&str] = &[
    "CHOCOLATEY",
    "APPLE_VPP",
    "APPLE_CUSTOM",
    "WINDOWS_MDM",
    "GOOGLE_ANDROID",
];
pub const DESIRED_STATES: &[&str] = &["INSTALL", "UNINSTALL"];

#[derive(Default)]
pub struct SoftwareAppResource {
    provider_data: Option<JumpCloudProviderData>,
}

impl SoftwareAppResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn app_from_plan(plan: &DynamicValue) -> Result<SoftwareApp, Diagnostic> {
        let display_name = get_string(plan, "display_name").ok_or_else(|| {
            Diagnostic::error("Missing display_name", "The 'display_name' attribute is required")
                .with_attribute(AttributePath::new("display_name"))
        })?;
        let package_id = get_string(plan, "package_id").ok_or_else(|| {
            Diagnostic::error("Missing package_id", "The 'package_id' attribute is required")
                .with_attribute(AttributePath::new("package_id"))
        })?;

        Ok(SoftwareApp {
            id: None,
            display_name,
            settings: vec![SoftwareAppSettings {
                package_id,
                package_manager: get_string(plan, "package_manager"),
                desired_state: get_string(plan, "desired_state"),
                auto_update: get_bool(plan, "auto_update"),
                install_options: get_json(plan, "install_options")?,
            }],
        })
    }

    fn state_from_app(app: &SoftwareApp, reference: &DynamicValue) -> DynamicValue {
        let settings = app.settings.first().cloned().unwrap_or_default();

        let mut state = DynamicValue::object();
        set(&mut state, "id", app.id.clone());
        set(&mut state, "display_name", app.display_name.clone());
        set(&mut state, "package_id", settings.package_id);
        set(&mut state, "package_manager", settings.package_manager);
        set(&mut state, "desired_state", settings.desired_state);
        set(&mut state, "auto_update", settings.auto_update.unwrap_or(false));
        set(
            &mut state,
            "install_options",
            json_string(
                get_string(reference, "install_options"),
                settings.install_options.as_ref(),
            ),
        );
        state
    }
}

#[async_trait]
impl Resource for SoftwareAppResource {
    fn type_name(&self) -> &str {
        "jumpcloud_software_app"
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
            .description("Manages a software package JumpCloud deploys to devices")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("display_name", AttributeType::String)
                    .required()
                    .validator(StringLengthValidator::between(1, 255))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("package_id", AttributeType::String)
                    .description("Package identifier in the package manager")
                    .required()
                    .validator(StringLengthValidator::at_least(1))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("package_manager", AttributeType::String)
                    .optional()
                    .computed()
                    .validator(OneOfValidator::create(PACKAGE_MANAGERS))
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("desired_state", AttributeType::String)
                    .optional()
                    .default(StaticDefault::string("INSTALL"))
                    .validator(OneOfValidator::create(DESIRED_STATES))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("auto_update", AttributeType::Bool)
                    .optional()
                    .default(StaticDefault::bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("install_options", AttributeType::String)
                    .description("Package manager specific options as a JSON object")
                    .optional()
                    .validator(JsonStringValidator::object())
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

        let app = match Self::app_from_plan(&request.planned_state) {
            Ok(app) => app,
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
            .integrations()
            .software_apps()
            .create(&app)
            .await
        {
            Ok(created) => CreateResourceResponse {
                new_state: Self::state_from_app(&created, &request.planned_state),
                private: vec![],
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(api_error("Failed to create software app", &e));
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

        match provider_data.client.integrations().software_apps().get(&id).await {
            Ok(app) => ReadResourceResponse {
                new_state: Some(Self::state_from_app(&app, &request.current_state)),
                diagnostics,
                private: request.private,
            },
            Err(e) if e.is_not_found() => {
                tracing::warn!("Software app {} no longer exists, removing from state", id);
                ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                    private: request.private,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("Failed to read software app", &e));
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

        let app = match Self::app_from_plan(&request.planned_state) {
            Ok(app) => app,
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
            .integrations()
            .software_apps()
            .update(&id, &app)
            .await
        {
            Ok(updated) => UpdateResourceResponse {
                new_state: Self::state_from_app(&updated, &request.planned_state),
                private: vec![],
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(api_error("Failed to update software app", &e));
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
            .integrations()
            .software_apps()
            .delete(&id)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!("Software app {} already deleted", id);
            }
            Err(e) => diagnostics.push(api_error("Failed to delete software app", &e)),
        }

        DeleteResourceResponse { diagnostics }
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

#[async_trait]
impl ResourceWithConfigure for SoftwareAppResource {
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
impl ResourceWithImportState for SoftwareAppResource {
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

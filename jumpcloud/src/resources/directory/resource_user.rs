//! System user resource implementation

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
use tfplug::defaults::StaticDefault;
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::{OneOfValidator, StringLengthValidator, StringPatternValidator};

use crate::api::directory::users::SystemUser;
use crate::resources::helpers::{
    api_error, get_bool, get_string, missing_id, not_configured, optional_string, set,
};
use crate::JumpCloudProviderData;

pub const USER_STATES: &[&str] = &["ACTIVATED", "STAGED", "SUSPENDED"];
pub const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

#[derive(Default)]
pub struct UserResource {
    provider_data: Option<JumpCloudProviderData>,
}

impl UserResource {
    pub fn new() -> Self {
        Self::default()
    }

    fn user_from_plan(plan: &DynamicValue) -> Result<SystemUser, Diagnostic> {
        let username = get_string(plan, "username").ok_or_else(|| {
            Diagnostic::error("Missing username", "The 'username' attribute is required")
                .with_attribute(AttributePath::new("username"))
        })?;
        let email = get_string(plan, "email").ok_or_else(|| {
            Diagnostic::error("Missing email", "The 'email' attribute is required")
                .with_attribute(AttributePath::new("email"))
        })?;

        Ok(SystemUser {
            id: None,
            username: Some(username),
            email: Some(email),
            firstname: get_string(plan, "firstname"),
            lastname: get_string(plan, "lastname"),
            password: get_string(plan, "password"),
            department: get_string(plan, "department"),
            job_title: get_string(plan, "job_title"),
            sudo: get_bool(plan, "sudo"),
            suspended: get_bool(plan, "suspended"),
            state: get_string(plan, "state"),
            created: None,
        })
    }

    /// The API never echoes the password, so it comes from `reference`
    fn state_from_user(user: &SystemUser, reference: &DynamicValue) -> DynamicValue {
        let mut state = DynamicValue::object();
        set(&mut state, "id", user.id.clone());
        set(
            &mut state,
            "username",
            user.username
                .clone()
                .or_else(|| get_string(reference, "username")),
        );
        set(
            &mut state,
            "email",
            user.email.clone().or_else(|| get_string(reference, "email")),
        );
        for (name, value) in [
            ("firstname", &user.firstname),
            ("lastname", &user.lastname),
            ("department", &user.department),
            ("job_title", &user.job_title),
        ] {
            set(&mut state, name, optional_string(value.clone(), reference, name));
        }
        set(&mut state, "password", get_string(reference, "password"));
        set(&mut state, "sudo", user.sudo.unwrap_or(false));
        set(&mut state, "suspended", user.suspended.unwrap_or(false));
        set(&mut state, "state", user.state.clone());
        set(&mut state, "created", user.created.clone());
        state
    }
}

#[async_trait]
impl Resource for UserResource {
    fn type_name(&self) -> &str {
        "jumpcloud_user"
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
            .description("Manages a JumpCloud system user")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("The user ID")
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("username", AttributeType::String)
                    .description("Login name; changing it recreates the user")
                    .required()
                    .validator(StringLengthValidator::between(1, 1024))
                    .plan_modifier(RequiresReplace::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("email", AttributeType::String)
                    .description("Email address")
                    .required()
                    .validator(StringPatternValidator::create(
                        EMAIL_PATTERN,
                        "must be a valid email address",
                    ))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("firstname", AttributeType::String)
                    .description("First name")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("lastname", AttributeType::String)
                    .description("Last name")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("password", AttributeType::String)
                    .description("Initial password; never read back from JumpCloud")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("department", AttributeType::String)
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("job_title", AttributeType::String)
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("sudo", AttributeType::Bool)
                    .description("Grant sudo on bound systems")
                    .optional()
                    .default(StaticDefault::bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("suspended", AttributeType::Bool)
                    .optional()
                    .default(StaticDefault::bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("state", AttributeType::String)
                    .description("Account state: ACTIVATED, STAGED or SUSPENDED")
                    .optional()
                    .computed()
                    .validator(OneOfValidator::create(USER_STATES))
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("created", AttributeType::String)
                    .description("Creation timestamp")
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

        let user = match Self::user_from_plan(&request.planned_state) {
            Ok(user) => user,
            Err(diag) => {
                diagnostics.push(diag);
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };

        match provider_data.client.directory().users().create(&user).await {
            Ok(created) => {
                tracing::info!("Created JumpCloud user {:?}", created.id);
                CreateResourceResponse {
                    new_state: Self::state_from_user(&created, &request.planned_state),
                    private: vec![],
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("Failed to create user", &e));
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

        match provider_data.client.directory().users().get(&id).await {
            Ok(user) => ReadResourceResponse {
                new_state: Some(Self::state_from_user(&user, &request.current_state)),
                diagnostics,
                private: request.private,
            },
            Err(e) if e.is_not_found() => {
                tracing::warn!("User {} no longer exists, removing from state", id);
                ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                    private: request.private,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("Failed to read user", &e));
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

        let user = match Self::user_from_plan(&request.planned_state) {
            Ok(user) => user,
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
            .users()
            .update(&id, &user)
            .await
        {
            Ok(updated) => UpdateResourceResponse {
                new_state: Self::state_from_user(&updated, &request.planned_state),
                private: vec![],
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(api_error("Failed to update user", &e));
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

        match provider_data.client.directory().users().delete(&id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!("User {} already deleted", id);
            }
            Err(e) => diagnostics.push(api_error("Failed to delete user", &e)),
        }

        DeleteResourceResponse { diagnostics }
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

#[async_trait]
impl ResourceWithConfigure for UserResource {
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
impl ResourceWithImportState for UserResource {
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

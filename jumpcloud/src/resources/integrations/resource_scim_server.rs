//! SCIM server resource implementation

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
use tfplug::validator::{
    JsonStringValidator, OneOfValidator, StringLengthValidator, StringPatternValidator,
};

use crate::api::integrations::scim_servers::{ScimMapping, ScimServer};
use crate::resources::helpers::{
    api_error, get_complete_objects, get_json, get_string, incomplete_entries, json_string,
    missing_id, not_configured, object_string, optional_string, set,
};
use crate::JumpCloudProviderData;

pub const AUTH_TYPES: &[&str] = &["bearer", "basic", "oauth2"];
const MAPPING_FIELDS: &[&str] = &["source_attribute", "target_attribute"];

#[derive(Default)]
pub struct ScimServerResource {
    provider_data: Option<JumpCloudProviderData>,
}

impl ScimServerResource {
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

    fn server_from_plan(plan: &DynamicValue) -> Result<ScimServer, Diagnostic> {
        let mappings = get_complete_objects(plan, "mappings", MAPPING_FIELDS)?
            .iter()
            .map(|mapping| ScimMapping {
                source_attribute: object_string(mapping, "source_attribute").unwrap_or_default(),
                target_attribute: object_string(mapping, "target_attribute").unwrap_or_default(),
            })
            .collect();

        Ok(ScimServer {
            id: None,
            name: Self::required(plan, "name")?,
            description: get_string(plan, "description"),
            url: Self::required(plan, "url")?,
            auth_type: Self::required(plan, "auth_type")?,
            auth_config: get_json(plan, "auth_config")?,
            mappings,
            status: get_string(plan, "status"),
        })
    }

    fn state_from_server(server: &ScimServer, reference: &DynamicValue) -> DynamicValue {
        let mappings = server
            .mappings
            .iter()
            .map(|mapping| {
                Dynamic::Map(
                    [
                        (
                            "source_attribute".to_string(),
                            Dynamic::from(mapping.source_attribute.clone()),
                        ),
                        (
                            "target_attribute".to_string(),
                            Dynamic::from(mapping.target_attribute.clone()),
                        ),
                    ]
                    .into_iter()
                    .collect(),
                )
            })
            .collect();

        // Credentials are often omitted from responses
        let reference_auth = get_string(reference, "auth_config");
        let auth_config = match &server.auth_config {
            None => reference_auth.map(Dynamic::String).unwrap_or(Dynamic::Null),
            Some(value) => json_string(reference_auth, Some(value)),
        };

        let mut state = DynamicValue::object();
        set(&mut state, "id", server.id.clone());
        set(&mut state, "name", server.name.clone());
        set(
            &mut state,
            "description",
            optional_string(server.description.clone(), reference, "description"),
        );
        set(&mut state, "url", server.url.clone());
        set(&mut state, "auth_type", server.auth_type.clone());
        set(&mut state, "auth_config", auth_config);
        set(&mut state, "mappings", Dynamic::List(mappings));
        set(&mut state, "status", server.status.clone());
        state
    }
}

#[async_trait]
impl Resource for ScimServerResource {
    fn type_name(&self) -> &str {
        "jumpcloud_scim_server"
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
            .description("Manages a SCIM server JumpCloud provisions identities to")
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
                AttributeBuilder::new("url", AttributeType::String)
                    .description("SCIM base URL")
                    .required()
                    .validator(StringPatternValidator::create(
                        r"^https?://\S+$",
                        "must be an http(s) URL",
                    ))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("auth_type", AttributeType::String)
                    .required()
                    .validator(OneOfValidator::create(AUTH_TYPES))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("auth_config", AttributeType::String)
                    .description("Credentials for auth_type as a JSON object")
                    .optional()
                    .sensitive()
                    .validator(JsonStringValidator::object())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "mappings",
                    AttributeType::list_of_objects(&[
                        ("source_attribute", AttributeType::String),
                        ("target_attribute", AttributeType::String),
                    ]),
                )
                .description("Attribute mappings from JumpCloud to the SCIM schema")
                .optional()
                .default(StaticDefault::empty_list())
                .build(),
            )
            .attribute(
                AttributeBuilder::new("status", AttributeType::String)
                    .optional()
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

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        ValidateResourceConfigResponse {
            diagnostics: incomplete_entries(&request.config, "mappings", MAPPING_FIELDS, false),
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

        let server = match Self::server_from_plan(&request.planned_state) {
            Ok(server) => server,
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
            .scim_servers()
            .create(&server)
            .await
        {
            Ok(created) => CreateResourceResponse {
                new_state: Self::state_from_server(&created, &request.planned_state),
                private: vec![],
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(api_error("Failed to create SCIM server", &e));
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

        match provider_data.client.integrations().scim_servers().get(&id).await {
            Ok(server) => ReadResourceResponse {
                new_state: Some(Self::state_from_server(&server, &request.current_state)),
                diagnostics,
                private: request.private,
            },
            Err(e) if e.is_not_found() => {
                tracing::warn!("SCIM server {} no longer exists, removing from state", id);
                ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                    private: request.private,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("Failed to read SCIM server", &e));
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

        let server = match Self::server_from_plan(&request.planned_state) {
            Ok(server) => server,
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
            .scim_servers()
            .update(&id, &server)
            .await
        {
            Ok(updated) => UpdateResourceResponse {
                new_state: Self::state_from_server(&updated, &request.planned_state),
                private: vec![],
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(api_error("Failed to update SCIM server", &e));
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
            .scim_servers()
            .delete(&id)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!("SCIM server {} already deleted", id);
            }
            Err(e) => diagnostics.push(api_error("Failed to delete SCIM server", &e)),
        }

        DeleteResourceResponse { diagnostics }
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

#[async_trait]
impl ResourceWithConfigure for ScimServerResource {
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
impl ResourceWithImportState for ScimServerResource {
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
    use tfplug::types::ClientCapabilities;

    fn planned() -> DynamicValue {
        plan(serde_json::json!({
            "id": null,
            "name": "hr-sync",
            "description": "HR system",
            "url": "https://scim.example.com/v2",
            "auth_type": "bearer",
            "auth_config": "{\"token\": \"abc123\"}",
            "mappings": [
                {"source_attribute": "email", "target_attribute": "userName"},
                {"source_attribute": "firstname", "target_attribute": "name.givenName"}
            ],
            "status": null
        }))
    }

    #[tokio::test]
    async fn mappings_and_auth_config_round_trip() {
        let mut server = Server::new_async().await;
        let create = server
            .mock("POST", "/api/v2/scim/servers")
            .match_body(Matcher::Json(serde_json::json!({
                "name": "hr-sync",
                "description": "HR system",
                "url": "https://scim.example.com/v2",
                "authType": "bearer",
                "authConfig": {"token": "abc123"},
                "mappings": [
                    {"sourceAttribute": "email", "targetAttribute": "userName"},
                    {"sourceAttribute": "firstname", "targetAttribute": "name.givenName"}
                ]
            })))
            .with_body(
                r#"{"id":"sc1","name":"hr-sync","description":"HR system",
                    "url":"https://scim.example.com/v2","authType":"bearer",
                    "authConfig":{"token":"abc123"},
                    "mappings":[{"sourceAttribute":"email","targetAttribute":"userName"},
                                {"sourceAttribute":"firstname","targetAttribute":"name.givenName"}],
                    "status":"active"}"#,
            )
            .create_async()
            .await;
        let read = server
            .mock("GET", "/api/v2/scim/servers/sc1")
            .with_body(
                r#"{"id":"sc1","name":"hr-sync","description":"HR system",
                    "url":"https://scim.example.com/v2","authType":"bearer",
                    "mappings":[{"sourceAttribute":"email","targetAttribute":"userName"},
                                {"sourceAttribute":"firstname","targetAttribute":"name.givenName"}],
                    "status":"active"}"#,
            )
            .create_async()
            .await;

        let resource: ScimServerResource = configured(&server.url()).await;
        let created = resource
            .create(
                Context::new(),
                CreateResourceRequest {
                    type_name: "jumpcloud_scim_server".to_string(),
                    planned_state: planned(),
                    config: planned(),
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;
        assert!(created.diagnostics.is_empty(), "{:?}", created.diagnostics);

        let mut expected = planned();
        expected
            .set_string(&AttributePath::new("id"), "sc1".to_string())
            .unwrap();
        expected
            .set_string(&AttributePath::new("status"), "active".to_string())
            .unwrap();
        assert_eq!(created.new_state, expected);

        // The read response omits authConfig; state keeps the configured value
        let refreshed = resource
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: "jumpcloud_scim_server".to_string(),
                    current_state: created.new_state.clone(),
                    private: vec![],
                    provider_meta: None,
                    client_capabilities: ClientCapabilities::default(),
                },
            )
            .await;
        assert_eq!(refreshed.new_state, Some(expected));

        create.assert_async().await;
        read.assert_async().await;
    }

    #[tokio::test]
    async fn mapping_without_target_is_rejected() {
        let resource = ScimServerResource::new();
        let config = plan(serde_json::json!({
            "name": "okta",
            "mappings": [
                {"source_attribute": "email", "target_attribute": "emails[0].value"},
                {"source_attribute": "department", "target_attribute": null}
            ]
        }));
        let validated = resource
            .validate(
                Context::new(),
                ValidateResourceConfigRequest {
                    type_name: "jumpcloud_scim_server".to_string(),
                    config: config.clone(),
                    client_capabilities: ClientCapabilities::default(),
                },
            )
            .await;
        assert_eq!(validated.diagnostics.len(), 1);
        assert_eq!(
            validated.diagnostics[0].attribute,
            Some(AttributePath::new("mappings").index(1).attribute("target_attribute"))
        );

        let err = ScimServerResource::server_from_plan(&config).unwrap_err();
        assert_eq!(err.summary, "Incomplete list entry");
    }
}

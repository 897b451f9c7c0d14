//! Group membership resources
//!
//! One implementation backs both `jumpcloud_user_group_membership` and
//! `jumpcloud_system_group_membership`. A membership is an association, so
//! every attribute forces replacement and update is never planned. The
//! Terraform id is `{group_id}/{member_id}`.

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::plan_modifier::{RequiresReplace, UseStateForUnknown};
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ImportedResource,
    ReadResourceRequest, ReadResourceResponse, Resource, ResourceMetadataRequest,
    ResourceMetadataResponse, ResourceSchemaRequest, ResourceSchemaResponse,
    ResourceWithConfigure, ResourceWithImportState, UpdateResourceRequest,
    UpdateResourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::StringLengthValidator;

use crate::api::directory::membership::GroupKind;
use crate::resources::helpers::{api_error, get_string, not_configured, set};
use crate::JumpCloudProviderData;

pub struct GroupMembershipResource {
    kind: GroupKind,
    provider_data: Option<JumpCloudProviderData>,
}

impl Default for GroupMembershipResource {
    fn default() -> Self {
        Self::user()
    }
}

impl GroupMembershipResource {
    pub fn user() -> Self {
        Self {
            kind: GroupKind::User,
            provider_data: None,
        }
    }

    pub fn system() -> Self {
        Self {
            kind: GroupKind::System,
            provider_data: None,
        }
    }

    fn member_attribute(&self) -> &'static str {
        match self.kind {
            GroupKind::User => "user_id",
            GroupKind::System => "system_id",
        }
    }

    fn ids(&self, value: &DynamicValue) -> Result<(String, String), Diagnostic> {
        let group_id = get_string(value, "group_id").ok_or_else(|| {
            Diagnostic::error("Missing group_id", "The 'group_id' attribute is required")
                .with_attribute(AttributePath::new("group_id"))
        })?;
        let member = self.member_attribute();
        let member_id = get_string(value, member).ok_or_else(|| {
            Diagnostic::error(
                format!("Missing {}", member),
                format!("The '{}' attribute is required", member),
            )
            .with_attribute(AttributePath::new(member))
        })?;
        Ok((group_id, member_id))
    }

    fn state(&self, group_id: &str, member_id: &str) -> DynamicValue {
        let mut state = DynamicValue::object();
        set(&mut state, "id", format!("{}/{}", group_id, member_id));
        set(&mut state, "group_id", group_id);
        set(&mut state, self.member_attribute(), member_id);
        state
    }
}

/// Split an import id of the form `group_id/member_id`
pub fn parse_membership_id(id: &str) -> Option<(&str, &str)> {
    let (group_id, member_id) = id.split_once('/')?;
    if group_id.is_empty() || member_id.is_empty() || member_id.contains('/') {
        return None;
    }
    Some((group_id, member_id))
}

#[async_trait]
impl Resource for GroupMembershipResource {
    fn type_name(&self) -> &str {
        match self.kind {
            GroupKind::User => "jumpcloud_user_group_membership",
            GroupKind::System => "jumpcloud_system_group_membership",
        }
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
        let (description, member_description) = match self.kind {
            GroupKind::User => (
                "Manages the membership of a user in a JumpCloud user group",
                "ID of the member user",
            ),
            GroupKind::System => (
                "Manages the membership of a system in a JumpCloud system group",
                "ID of the member system",
            ),
        };

        let schema = SchemaBuilder::new()
            .version(0)
            .description(description)
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Composite ID in the form group_id/member_id")
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("group_id", AttributeType::String)
                    .description("ID of the group")
                    .required()
                    .validator(StringLengthValidator::at_least(1))
                    .plan_modifier(RequiresReplace::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(self.member_attribute(), AttributeType::String)
                    .description(member_description)
                    .required()
                    .validator(StringLengthValidator::at_least(1))
                    .plan_modifier(RequiresReplace::create())
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

        let (group_id, member_id) = match self.ids(&request.planned_state) {
            Ok(ids) => ids,
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
            .membership(self.kind)
            .add(&group_id, &member_id)
            .await
        {
            Ok(()) => CreateResourceResponse {
                new_state: self.state(&group_id, &member_id),
                private: vec![],
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(api_error("Failed to add group member", &e));
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

        let Ok((group_id, member_id)) = self.ids(&request.current_state) else {
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
            .directory()
            .membership(self.kind)
            .contains(&group_id, &member_id)
            .await
        {
            Ok(true) => ReadResourceResponse {
                new_state: Some(self.state(&group_id, &member_id)),
                diagnostics,
                private: request.private,
            },
            Ok(false) => {
                tracing::warn!(
                    "{} is no longer a member of group {}, removing from state",
                    member_id,
                    group_id
                );
                ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                    private: request.private,
                }
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!("Group {} no longer exists, removing membership", group_id);
                ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                    private: request.private,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("Failed to read group membership", &e));
                ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                    private: request.private,
                }
            }
        }
    }

    async fn update(&self, _ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        UpdateResourceResponse {
            new_state: request.prior_state,
            private: vec![],
            diagnostics: vec![Diagnostic::error(
                "Update not supported",
                "Group memberships cannot be updated in place; changing any attribute replaces the membership",
            )],
        }
    }

    async fn delete(&self, _ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let mut diagnostics = vec![];

        let Some(provider_data) = &self.provider_data else {
            diagnostics.push(not_configured());
            return DeleteResourceResponse { diagnostics };
        };

        let Ok((group_id, member_id)) = self.ids(&request.prior_state) else {
            return DeleteResourceResponse { diagnostics };
        };

        match provider_data
            .client
            .directory()
            .membership(self.kind)
            .remove(&group_id, &member_id)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!("Membership {}/{} already removed", group_id, member_id);
            }
            Err(e) => diagnostics.push(api_error("Failed to remove group member", &e)),
        }

        DeleteResourceResponse { diagnostics }
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

#[async_trait]
impl ResourceWithConfigure for GroupMembershipResource {
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
impl ResourceWithImportState for GroupMembershipResource {
    async fn import_state(
        &self,
        _ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let Some((group_id, member_id)) = parse_membership_id(&request.id) else {
            return ImportResourceStateResponse {
                imported_resources: vec![],
                diagnostics: vec![Diagnostic::error(
                    "Invalid import ID",
                    format!(
                        "Expected an ID of the form group_id/{}, got '{}'",
                        self.member_attribute(),
                        request.id
                    ),
                )],
            };
        };

        ImportResourceStateResponse {
            imported_resources: vec![ImportedResource {
                type_name: request.type_name,
                state: self.state(group_id, member_id),
                private: vec![],
            }],
            diagnostics: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::test_support::{provider_data, state};
    use mockito::{Matcher, Server};
    use tfplug::types::ClientCapabilities;

    async fn configured(kind: GroupKind, url: &str) -> GroupMembershipResource {
        let mut resource = match kind {
            GroupKind::User => GroupMembershipResource::user(),
            GroupKind::System => GroupMembershipResource::system(),
        };
        let response = resource
            .configure(
                Context::new(),
                ConfigureResourceRequest {
                    provider_data: Some(provider_data(url)),
                },
            )
            .await;
        assert!(response.diagnostics.is_empty());
        resource
    }

    #[test]
    fn membership_id_parsing() {
        assert_eq!(parse_membership_id("g1/u1"), Some(("g1", "u1")));
        assert_eq!(parse_membership_id("g1"), None);
        assert_eq!(parse_membership_id("/u1"), None);
        assert_eq!(parse_membership_id("g1/"), None);
        assert_eq!(parse_membership_id("g1/u1/x"), None);
    }

    #[tokio::test]
    async fn create_adds_member_and_builds_composite_id() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v2/systemgroups/g1/members")
            .match_body(Matcher::Json(
                serde_json::json!({"op": "add", "type": "system", "id": "s1"}),
            ))
            .with_status(204)
            .create_async()
            .await;

        let resource = configured(GroupKind::System, &server.url()).await;
        let planned = state(serde_json::json!({"id": null, "group_id": "g1", "system_id": "s1"}));
        let response = resource
            .create(
                Context::new(),
                CreateResourceRequest {
                    type_name: "jumpcloud_system_group_membership".to_string(),
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
            Some("g1/s1")
        );
    }

    #[tokio::test]
    async fn read_drops_state_when_member_is_gone() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v2/usergroups/g1/members")
            .match_query(Matcher::Any)
            .with_body(r#"[{"to":{"id":"u2","type":"user"}}]"#)
            .create_async()
            .await;

        let resource = configured(GroupKind::User, &server.url()).await;
        let response = resource
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: "jumpcloud_user_group_membership".to_string(),
                    current_state: state(
                        serde_json::json!({"id": "g1/u1", "group_id": "g1", "user_id": "u1"}),
                    ),
                    private: vec![],
                    provider_meta: None,
                    client_capabilities: ClientCapabilities::default(),
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        assert!(response.new_state.is_none());
    }

    #[tokio::test]
    async fn import_splits_composite_id() {
        let resource = GroupMembershipResource::user();
        let response = resource
            .import_state(
                Context::new(),
                ImportResourceStateRequest {
                    type_name: "jumpcloud_user_group_membership".to_string(),
                    id: "g1/u1".to_string(),
                    client_capabilities: ClientCapabilities::default(),
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        let imported = &response.imported_resources[0].state;
        assert_eq!(get_string(imported, "group_id").as_deref(), Some("g1"));
        assert_eq!(get_string(imported, "user_id").as_deref(), Some("u1"));

        let bad = resource
            .import_state(
                Context::new(),
                ImportResourceStateRequest {
                    type_name: "jumpcloud_user_group_membership".to_string(),
                    id: "g1".to_string(),
                    client_capabilities: ClientCapabilities::default(),
                },
            )
            .await;
        assert_eq!(bad.diagnostics[0].summary, "Invalid import ID");
    }
}

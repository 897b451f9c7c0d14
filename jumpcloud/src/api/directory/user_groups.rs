//! User group API (v2 `/api/v2/usergroups`)

use crate::api::common::{JumpCloudApiResource, ListOptions, PagedResponse};
use crate::api::{ApiError, Client};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserGroup {
    #[serde(skip_serializing, default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub email: Option<String>,
    #[serde(rename = "type", skip_serializing, default)]
    pub group_type: Option<String>,
}

impl JumpCloudApiResource for UserGroup {
    fn api_path() -> &'static str {
        "/api/v2/usergroups"
    }
}

pub struct UserGroupsApi<'a> {
    client: &'a Client,
}

impl<'a> UserGroupsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /api/v2/usergroups
    pub async fn list(&self, options: &ListOptions) -> Result<PagedResponse<UserGroup>, ApiError> {
        self.client.get_page(UserGroup::api_path(), options).await
    }

    /// GET /api/v2/usergroups/{id}
    pub async fn get(&self, id: &str) -> Result<UserGroup, ApiError> {
        self.client.get(&UserGroup::resource_path(id)).await
    }

    /// POST /api/v2/usergroups
    pub async fn create(&self, group: &UserGroup) -> Result<UserGroup, ApiError> {
        self.client.post(UserGroup::api_path(), group).await
    }

    /// PUT /api/v2/usergroups/{id}
    pub async fn update(&self, id: &str, group: &UserGroup) -> Result<UserGroup, ApiError> {
        self.client.put(&UserGroup::resource_path(id), group).await
    }

    /// DELETE /api/v2/usergroups/{id}
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&UserGroup::resource_path(id)).await
    }
}

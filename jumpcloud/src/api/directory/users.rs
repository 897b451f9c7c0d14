//! System user API (v1 `/api/systemusers`)

use crate::api::common::{JumpCloudApiResource, ListOptions, PagedResponse};
use crate::api::{ApiError, Client};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SystemUser {
    #[serde(rename = "_id", skip_serializing, default)]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub firstname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub lastname: Option<String>,
    /// Write-only; JumpCloud never returns it
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub job_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sudo: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub suspended: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub state: Option<String>,
    #[serde(skip_serializing, default)]
    pub created: Option<String>,
}

impl JumpCloudApiResource for SystemUser {
    fn api_path() -> &'static str {
        "/api/systemusers"
    }
}

pub struct UsersApi<'a> {
    client: &'a Client,
}

impl<'a> UsersApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /api/systemusers
    pub async fn list(&self, options: &ListOptions) -> Result<PagedResponse<SystemUser>, ApiError> {
        self.client.get_page(SystemUser::api_path(), options).await
    }

    /// GET /api/systemusers/{id}
    pub async fn get(&self, id: &str) -> Result<SystemUser, ApiError> {
        self.client.get(&SystemUser::resource_path(id)).await
    }

    /// POST /api/systemusers
    pub async fn create(&self, user: &SystemUser) -> Result<SystemUser, ApiError> {
        self.client.post(SystemUser::api_path(), user).await
    }

    /// PUT /api/systemusers/{id}
    pub async fn update(&self, id: &str, user: &SystemUser) -> Result<SystemUser, ApiError> {
        self.client.put(&SystemUser::resource_path(id), user).await
    }

    /// DELETE /api/systemusers/{id}
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&SystemUser::resource_path(id)).await
    }
}

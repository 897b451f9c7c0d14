//! System API (v1 `/api/systems`)
//!
//! Systems are registered by the JumpCloud agent, so there is no create
//! endpoint; Terraform adopts an existing system and manages its settings.

use crate::api::common::{JumpCloudApiResource, ListOptions, PagedResponse};
use crate::api::{ApiError, Client};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct System {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub agent_version: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub allow_ssh_password_authentication: Option<bool>,
    #[serde(default)]
    pub allow_ssh_root_login: Option<bool>,
    #[serde(default)]
    pub allow_multi_factor_authentication: Option<bool>,
    #[serde(default)]
    pub allow_public_key_authentication: Option<bool>,
    #[serde(default)]
    pub created: Option<String>,
}

/// Settable subset of a system
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SystemUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_ssh_password_authentication: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_ssh_root_login: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_multi_factor_authentication: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_public_key_authentication: Option<bool>,
}

impl JumpCloudApiResource for System {
    fn api_path() -> &'static str {
        "/api/systems"
    }
}

pub struct SystemsApi<'a> {
    client: &'a Client,
}

impl<'a> SystemsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /api/systems
    pub async fn list(&self, options: &ListOptions) -> Result<PagedResponse<System>, ApiError> {
        self.client.get_page(System::api_path(), options).await
    }

    /// GET /api/systems/{id}
    pub async fn get(&self, id: &str) -> Result<System, ApiError> {
        self.client.get(&System::resource_path(id)).await
    }

    /// PUT /api/systems/{id}
    pub async fn update(&self, id: &str, update: &SystemUpdate) -> Result<System, ApiError> {
        self.client.put(&System::resource_path(id), update).await
    }

    /// DELETE /api/systems/{id}
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&System::resource_path(id)).await
    }
}

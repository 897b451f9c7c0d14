//! SCIM server API (v2 `/api/v2/scim/servers`)

use crate::api::common::JumpCloudApiResource;
use crate::api::{ApiError, Client};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScimMapping {
    pub source_attribute: String,
    pub target_attribute: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScimServer {
    #[serde(skip_serializing, default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    pub url: String,
    pub auth_type: String,
    /// Credentials document; the API may redact it on read
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub auth_config: Option<serde_json::Value>,
    #[serde(default)]
    pub mappings: Vec<ScimMapping>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status: Option<String>,
}

impl JumpCloudApiResource for ScimServer {
    fn api_path() -> &'static str {
        "/api/v2/scim/servers"
    }
}

pub struct ScimServersApi<'a> {
    client: &'a Client,
}

impl<'a> ScimServersApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /api/v2/scim/servers/{id}
    pub async fn get(&self, id: &str) -> Result<ScimServer, ApiError> {
        self.client.get(&ScimServer::resource_path(id)).await
    }

    /// POST /api/v2/scim/servers
    pub async fn create(&self, server: &ScimServer) -> Result<ScimServer, ApiError> {
        self.client.post(ScimServer::api_path(), server).await
    }

    /// PUT /api/v2/scim/servers/{id}
    pub async fn update(&self, id: &str, server: &ScimServer) -> Result<ScimServer, ApiError> {
        self.client.put(&ScimServer::resource_path(id), server).await
    }

    /// DELETE /api/v2/scim/servers/{id}
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&ScimServer::resource_path(id)).await
    }
}

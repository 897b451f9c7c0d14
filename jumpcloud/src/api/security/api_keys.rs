//! API key API (v2 `/api/v2/apikeys`)

use crate::api::common::JumpCloudApiResource;
use crate::api::{ApiError, Client};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiKey {
    #[serde(skip_serializing, default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub expires_at: Option<String>,
    /// Only present in the create response
    #[serde(skip_serializing, default)]
    pub key: Option<String>,
    #[serde(skip_serializing, default)]
    pub created_at: Option<String>,
}

impl JumpCloudApiResource for ApiKey {
    fn api_path() -> &'static str {
        "/api/v2/apikeys"
    }
}

pub struct ApiKeysApi<'a> {
    client: &'a Client,
}

impl<'a> ApiKeysApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /api/v2/apikeys/{id}
    pub async fn get(&self, id: &str) -> Result<ApiKey, ApiError> {
        self.client.get(&ApiKey::resource_path(id)).await
    }

    /// POST /api/v2/apikeys
    pub async fn create(&self, key: &ApiKey) -> Result<ApiKey, ApiError> {
        self.client.post(ApiKey::api_path(), key).await
    }

    /// PUT /api/v2/apikeys/{id}
    pub async fn update(&self, id: &str, key: &ApiKey) -> Result<ApiKey, ApiError> {
        self.client.put(&ApiKey::resource_path(id), key).await
    }

    /// DELETE /api/v2/apikeys/{id}
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&ApiKey::resource_path(id)).await
    }
}

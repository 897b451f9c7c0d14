//! Webhook API (v2 `/api/v2/webhooks`)

use crate::api::common::JumpCloudApiResource;
use crate::api::{ApiError, Client};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    #[serde(skip_serializing, default)]
    pub id: Option<String>,
    pub name: String,
    pub url: String,
    /// Write-only signing secret
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub secret: Option<String>,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    #[serde(skip_serializing, default)]
    pub created_at: Option<String>,
    #[serde(skip_serializing, default)]
    pub updated_at: Option<String>,
}

impl JumpCloudApiResource for Webhook {
    fn api_path() -> &'static str {
        "/api/v2/webhooks"
    }
}

pub struct WebhooksApi<'a> {
    client: &'a Client,
}

impl<'a> WebhooksApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /api/v2/webhooks/{id}
    pub async fn get(&self, id: &str) -> Result<Webhook, ApiError> {
        self.client.get(&Webhook::resource_path(id)).await
    }

    /// POST /api/v2/webhooks
    pub async fn create(&self, webhook: &Webhook) -> Result<Webhook, ApiError> {
        self.client.post(Webhook::api_path(), webhook).await
    }

    /// PUT /api/v2/webhooks/{id}
    pub async fn update(&self, id: &str, webhook: &Webhook) -> Result<Webhook, ApiError> {
        self.client.put(&Webhook::resource_path(id), webhook).await
    }

    /// DELETE /api/v2/webhooks/{id}
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&Webhook::resource_path(id)).await
    }
}

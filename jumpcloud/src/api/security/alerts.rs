//! Alert configuration API (`/api/v2/alerts/configurations`) and the
//! read-only alert feed (`/api/v2/alerts`)

use crate::api::common::{JumpCloudApiResource, ListOptions, PagedResponse};
use crate::api::{ApiError, Client};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertAction {
    #[serde(rename = "type")]
    pub action_type: String,
    pub target: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AlertConfiguration {
    #[serde(skip_serializing, default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub alert_type: String,
    pub severity: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub conditions: Option<serde_json::Value>,
    #[serde(default)]
    pub actions: Vec<AlertAction>,
}

impl JumpCloudApiResource for AlertConfiguration {
    fn api_path() -> &'static str {
        "/api/v2/alerts/configurations"
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "type", default)]
    pub alert_type: Option<String>,
    #[serde(default)]
    pub configuration_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl JumpCloudApiResource for Alert {
    fn api_path() -> &'static str {
        "/api/v2/alerts"
    }
}

pub struct AlertConfigurationsApi<'a> {
    client: &'a Client,
}

impl<'a> AlertConfigurationsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /api/v2/alerts/configurations/{id}
    pub async fn get(&self, id: &str) -> Result<AlertConfiguration, ApiError> {
        self.client.get(&AlertConfiguration::resource_path(id)).await
    }

    /// POST /api/v2/alerts/configurations
    pub async fn create(&self, config: &AlertConfiguration) -> Result<AlertConfiguration, ApiError> {
        self.client.post(AlertConfiguration::api_path(), config).await
    }

    /// PUT /api/v2/alerts/configurations/{id}
    pub async fn update(
        &self,
        id: &str,
        config: &AlertConfiguration,
    ) -> Result<AlertConfiguration, ApiError> {
        self.client
            .put(&AlertConfiguration::resource_path(id), config)
            .await
    }

    /// DELETE /api/v2/alerts/configurations/{id}
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&AlertConfiguration::resource_path(id))
            .await
    }
}

pub struct AlertsApi<'a> {
    client: &'a Client,
}

impl<'a> AlertsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /api/v2/alerts
    pub async fn list(&self, options: &ListOptions) -> Result<PagedResponse<Alert>, ApiError> {
        self.client.get_page(Alert::api_path(), options).await
    }
}

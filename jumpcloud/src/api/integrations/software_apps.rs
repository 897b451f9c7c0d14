//! Software app API (v2 `/api/v2/softwareapps`)

use crate::api::common::JumpCloudApiResource;
use crate::api::{ApiError, Client};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SoftwareAppSettings {
    pub package_id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub package_manager: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub desired_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub auto_update: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub install_options: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SoftwareApp {
    #[serde(skip_serializing, default)]
    pub id: Option<String>,
    pub display_name: String,
    #[serde(default)]
    pub settings: Vec<SoftwareAppSettings>,
}

impl JumpCloudApiResource for SoftwareApp {
    fn api_path() -> &'static str {
        "/api/v2/softwareapps"
    }
}

pub struct SoftwareAppsApi<'a> {
    client: &'a Client,
}

impl<'a> SoftwareAppsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /api/v2/softwareapps/{id}
    pub async fn get(&self, id: &str) -> Result<SoftwareApp, ApiError> {
        self.client.get(&SoftwareApp::resource_path(id)).await
    }

    /// POST /api/v2/softwareapps
    pub async fn create(&self, app: &SoftwareApp) -> Result<SoftwareApp, ApiError> {
        self.client.post(SoftwareApp::api_path(), app).await
    }

    /// PUT /api/v2/softwareapps/{id}
    pub async fn update(&self, id: &str, app: &SoftwareApp) -> Result<SoftwareApp, ApiError> {
        self.client.put(&SoftwareApp::resource_path(id), app).await
    }

    /// DELETE /api/v2/softwareapps/{id}
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&SoftwareApp::resource_path(id)).await
    }
}

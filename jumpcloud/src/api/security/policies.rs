//! Policy API (v2 `/api/v2/policies`)

use crate::api::common::{JumpCloudApiResource, ObjectRef};
use crate::api::{ApiError, Client};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyValue {
    #[serde(rename = "configFieldID")]
    pub config_field_id: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Policy {
    #[serde(skip_serializing, default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub template: Option<ObjectRef>,
    #[serde(default)]
    pub values: Vec<PolicyValue>,
}

impl Policy {
    pub fn template_id(&self) -> Option<&str> {
        self.template.as_ref().map(|t| t.id.as_str())
    }
}

impl JumpCloudApiResource for Policy {
    fn api_path() -> &'static str {
        "/api/v2/policies"
    }
}

pub struct PoliciesApi<'a> {
    client: &'a Client,
}

impl<'a> PoliciesApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /api/v2/policies/{id}
    pub async fn get(&self, id: &str) -> Result<Policy, ApiError> {
        self.client.get(&Policy::resource_path(id)).await
    }

    /// POST /api/v2/policies
    pub async fn create(&self, policy: &Policy) -> Result<Policy, ApiError> {
        self.client.post(Policy::api_path(), policy).await
    }

    /// PUT /api/v2/policies/{id}
    pub async fn update(&self, id: &str, policy: &Policy) -> Result<Policy, ApiError> {
        self.client.put(&Policy::resource_path(id), policy).await
    }

    /// DELETE /api/v2/policies/{id}
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&Policy::resource_path(id)).await
    }
}

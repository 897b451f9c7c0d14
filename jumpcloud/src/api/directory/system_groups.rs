//! System group API (v2 `/api/v2/systemgroups`)

use crate::api::common::{JumpCloudApiResource, ListOptions, PagedResponse};
use crate::api::{ApiError, Client};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SystemGroup {
    #[serde(skip_serializing, default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
}

impl JumpCloudApiResource for SystemGroup {
    fn api_path() -> &'static str {
        "/api/v2/systemgroups"
    }
}

pub struct SystemGroupsApi<'a> {
    client: &'a Client,
}

impl<'a> SystemGroupsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /api/v2/systemgroups
    pub async fn list(
        &self,
        options: &ListOptions,
    ) -> Result<PagedResponse<SystemGroup>, ApiError> {
        self.client.get_page(SystemGroup::api_path(), options).await
    }

    /// GET /api/v2/systemgroups/{id}
    pub async fn get(&self, id: &str) -> Result<SystemGroup, ApiError> {
        self.client.get(&SystemGroup::resource_path(id)).await
    }

    /// POST /api/v2/systemgroups
    pub async fn create(&self, group: &SystemGroup) -> Result<SystemGroup, ApiError> {
        self.client.post(SystemGroup::api_path(), group).await
    }

    /// PUT /api/v2/systemgroups/{id}
    pub async fn update(&self, id: &str, group: &SystemGroup) -> Result<SystemGroup, ApiError> {
        self.client.put(&SystemGroup::resource_path(id), group).await
    }

    /// DELETE /api/v2/systemgroups/{id}
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&SystemGroup::resource_path(id)).await
    }
}

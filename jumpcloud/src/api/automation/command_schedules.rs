//! Command schedule API (v2 `/api/v2/commandschedules`)

use crate::api::common::JumpCloudApiResource;
use crate::api::{ApiError, Client};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommandSchedule {
    #[serde(skip_serializing, default)]
    pub id: Option<String>,
    pub command_id: String,
    #[serde(default)]
    pub target_systems: Vec<String>,
    #[serde(default)]
    pub target_groups: Vec<String>,
    /// Provider specific schedule document, kept as raw JSON
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub schedule: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub enabled: Option<bool>,
}

impl JumpCloudApiResource for CommandSchedule {
    fn api_path() -> &'static str {
        "/api/v2/commandschedules"
    }
}

pub struct CommandSchedulesApi<'a> {
    client: &'a Client,
}

impl<'a> CommandSchedulesApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /api/v2/commandschedules/{id}
    pub async fn get(&self, id: &str) -> Result<CommandSchedule, ApiError> {
        self.client.get(&CommandSchedule::resource_path(id)).await
    }

    /// POST /api/v2/commandschedules
    pub async fn create(&self, schedule: &CommandSchedule) -> Result<CommandSchedule, ApiError> {
        self.client.post(CommandSchedule::api_path(), schedule).await
    }

    /// PUT /api/v2/commandschedules/{id}
    pub async fn update(
        &self,
        id: &str,
        schedule: &CommandSchedule,
    ) -> Result<CommandSchedule, ApiError> {
        self.client
            .put(&CommandSchedule::resource_path(id), schedule)
            .await
    }

    /// DELETE /api/v2/commandschedules/{id}
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&CommandSchedule::resource_path(id))
            .await
    }
}

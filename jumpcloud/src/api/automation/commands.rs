//! Command API (v1 `/api/commands`)

use crate::api::common::{string_or_u64, JumpCloudApiResource};
use crate::api::{ApiError, Client};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    #[serde(rename = "_id", skip_serializing, default)]
    pub id: Option<String>,
    pub name: String,
    pub command: String,
    pub command_type: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub shell: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub launch_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub trigger: Option<String>,
    /// Seconds, sent as a string
    #[serde(
        with = "string_or_u64",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub schedule: Option<String>,
}

impl JumpCloudApiResource for Command {
    fn api_path() -> &'static str {
        "/api/commands"
    }
}

pub struct CommandsApi<'a> {
    client: &'a Client,
}

impl<'a> CommandsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /api/commands/{id}
    pub async fn get(&self, id: &str) -> Result<Command, ApiError> {
        self.client.get(&Command::resource_path(id)).await
    }

    /// POST /api/commands
    pub async fn create(&self, command: &Command) -> Result<Command, ApiError> {
        self.client.post(Command::api_path(), command).await
    }

    /// PUT /api/commands/{id}
    pub async fn update(&self, id: &str, command: &Command) -> Result<Command, ApiError> {
        self.client.put(&Command::resource_path(id), command).await
    }

    /// DELETE /api/commands/{id}
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&Command::resource_path(id)).await
    }
}

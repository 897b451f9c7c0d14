pub mod command_schedules;
pub mod commands;
pub mod webhooks;

use crate::api::Client;

/// Automation API: commands, their schedules and outbound webhooks
pub struct AutomationApi<'a> {
    client: &'a Client,
}

impl<'a> AutomationApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub fn commands(&self) -> commands::CommandsApi<'a> {
        commands::CommandsApi::new(self.client)
    }

    pub fn command_schedules(&self) -> command_schedules::CommandSchedulesApi<'a> {
        command_schedules::CommandSchedulesApi::new(self.client)
    }

    pub fn webhooks(&self) -> webhooks::WebhooksApi<'a> {
        webhooks::WebhooksApi::new(self.client)
    }
}

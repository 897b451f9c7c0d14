pub mod resource_command;
pub mod resource_command_schedule;
pub mod resource_webhook;

pub use resource_command::CommandResource;
pub use resource_command_schedule::CommandScheduleResource;
pub use resource_webhook::WebhookResource;

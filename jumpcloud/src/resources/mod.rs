pub mod automation;
pub mod directory;
pub mod helpers;
pub mod integrations;
pub mod security;

#[cfg(test)]
pub mod test_support;

pub use automation::{CommandResource, CommandScheduleResource, WebhookResource};
pub use directory::{
    GroupMembershipResource, SystemGroupResource, SystemResource, UserGroupResource, UserResource,
};
pub use integrations::{ScimServerResource, SoftwareAppResource};
pub use security::{AlertConfigurationResource, ApiKeyResource, PolicyResource};

pub mod resource_alert_configuration;
pub mod resource_api_key;
pub mod resource_policy;

pub use resource_alert_configuration::AlertConfigurationResource;
pub use resource_api_key::ApiKeyResource;
pub use resource_policy::PolicyResource;

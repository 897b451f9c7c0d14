pub mod resource_scim_server;
pub mod resource_software_app;

pub use resource_scim_server::ScimServerResource;
pub use resource_software_app::SoftwareAppResource;

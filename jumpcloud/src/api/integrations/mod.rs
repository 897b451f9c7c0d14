pub mod scim_servers;
pub mod software_apps;

use crate::api::Client;

/// Integration API: SCIM provisioning targets and managed software
pub struct IntegrationsApi<'a> {
    client: &'a Client,
}

impl<'a> IntegrationsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub fn scim_servers(&self) -> scim_servers::ScimServersApi<'a> {
        scim_servers::ScimServersApi::new(self.client)
    }

    pub fn software_apps(&self) -> software_apps::SoftwareAppsApi<'a> {
        software_apps::SoftwareAppsApi::new(self.client)
    }
}

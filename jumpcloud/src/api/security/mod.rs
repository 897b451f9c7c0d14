pub mod alerts;
pub mod api_keys;
pub mod policies;

use crate::api::Client;

/// Security API: API keys, alerting and device policies
pub struct SecurityApi<'a> {
    client: &'a Client,
}

impl<'a> SecurityApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub fn api_keys(&self) -> api_keys::ApiKeysApi<'a> {
        api_keys::ApiKeysApi::new(self.client)
    }

    pub fn alert_configurations(&self) -> alerts::AlertConfigurationsApi<'a> {
        alerts::AlertConfigurationsApi::new(self.client)
    }

    pub fn alerts(&self) -> alerts::AlertsApi<'a> {
        alerts::AlertsApi::new(self.client)
    }

    pub fn policies(&self) -> policies::PoliciesApi<'a> {
        policies::PoliciesApi::new(self.client)
    }
}

//! Provider data structure passed to resources and data sources

use crate::api::Client;
use std::any::Any;
use std::sync::Arc;
use tfplug::types::Diagnostic;

#[derive(Clone, Debug)]
pub struct JumpCloudProviderData {
    pub client: Arc<Client>,
}

impl JumpCloudProviderData {
    pub fn new(client: Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Recover the provider data handed out by `configure`
    pub fn from_provider_data(
        data: Option<Arc<dyn Any + Send + Sync>>,
        kind: &str,
    ) -> Result<Self, Diagnostic> {
        let Some(data) = data else {
            tracing::warn!("No provider data provided to {}", kind);
            return Err(Diagnostic::error(
                "No provider data",
                format!("No provider data was provided to the {}", kind),
            ));
        };

        match data.downcast_ref::<JumpCloudProviderData>() {
            Some(provider_data) => Ok(provider_data.clone()),
            None => {
                tracing::error!("Failed to downcast provider data to JumpCloudProviderData");
                Err(Diagnostic::error(
                    "Invalid provider data",
                    "Failed to extract JumpCloudProviderData from provider data",
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_provider_data() {
        let client = Client::new(crate::api::DEFAULT_API_URL, "key", None).unwrap();
        let data: Arc<dyn Any + Send + Sync> = Arc::new(JumpCloudProviderData::new(client));

        let recovered = JumpCloudProviderData::from_provider_data(Some(data), "resource").unwrap();
        assert_eq!(recovered.client.base_url(), crate::api::DEFAULT_API_URL);
    }

    #[test]
    fn rejects_missing_or_foreign_data() {
        let err = JumpCloudProviderData::from_provider_data(None, "data source").unwrap_err();
        assert_eq!(err.summary, "No provider data");
        assert!(err.detail.contains("data source"));

        let foreign: Arc<dyn Any + Send + Sync> = Arc::new(42_u32);
        let err = JumpCloudProviderData::from_provider_data(Some(foreign), "resource").unwrap_err();
        assert_eq!(err.summary, "Invalid provider data");
    }
}

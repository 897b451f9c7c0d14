pub mod api;
pub mod data_sources;
pub mod provider_data;
pub mod resources;

pub use provider_data::JumpCloudProviderData;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::data_source::DataSourceWithConfigure;
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, DataSourceFactory, Provider,
    ProviderMetadataRequest, ProviderMetadataResponse, ProviderSchemaRequest,
    ProviderSchemaResponse, ResourceFactory, ValidateProviderConfigRequest,
    ValidateProviderConfigResponse,
};
use tfplug::resource::ResourceWithConfigure;
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue, ServerCapabilities};
use tfplug::validator::{NumberRangeValidator, StringLengthValidator};

use api::{Client, RetryConfig, DEFAULT_API_URL};
use resources::helpers::{get_string, get_u64};

pub const API_KEY_ENV: &str = "JUMPCLOUD_API_KEY";
pub const ORG_ID_ENV: &str = "JUMPCLOUD_ORG_ID";
pub const API_URL_ENV: &str = "JUMPCLOUD_URL";

/// Settings resolved from the provider block and the environment
#[derive(Debug, Clone)]
struct ClientSettings {
    api_key: String,
    org_id: Option<String>,
    api_url: String,
    retry: RetryConfig,
}

/// Config value first, then the environment; blank values count as unset
fn setting(config: &DynamicValue, name: &str, env: &str) -> Option<String> {
    get_string(config, name)
        .or_else(|| std::env::var(env).ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_api_url(value: &str) -> Result<(), Diagnostic> {
    let invalid = |detail: String| {
        Diagnostic::error("Invalid API URL", detail).with_attribute(AttributePath::new("api_url"))
    };
    let parsed = url::Url::parse(value).map_err(|e| invalid(format!("'{}': {}", value, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(invalid(format!(
            "'{}' uses scheme '{}'; expected http or https",
            value, scheme
        ))),
    }
}

fn client_settings(config: &DynamicValue) -> Result<ClientSettings, Vec<Diagnostic>> {
    let mut diagnostics = vec![];

    let api_key = setting(config, "api_key", API_KEY_ENV);
    if api_key.is_none() {
        diagnostics.push(
            Diagnostic::error(
                "Missing API key",
                format!(
                    "Set api_key in the provider block or the {} environment variable",
                    API_KEY_ENV
                ),
            )
            .with_attribute(AttributePath::new("api_key")),
        );
    }

    let api_url =
        setting(config, "api_url", API_URL_ENV).unwrap_or_else(|| DEFAULT_API_URL.to_string());
    if let Err(diag) = check_api_url(&api_url) {
        diagnostics.push(diag);
    }

    let mut retry = RetryConfig::default();
    if let Some(max_retries) = get_u64(config, "max_retries") {
        retry.max_retries = max_retries.min(u32::MAX as u64) as u32;
    }
    if let Some(timeout) = get_u64(config, "timeout_seconds") {
        retry.timeout_seconds = timeout;
    }

    match api_key {
        Some(api_key) if diagnostics.is_empty() => Ok(ClientSettings {
            api_key,
            org_id: setting(config, "org_id", ORG_ID_ENV),
            api_url,
            retry,
        }),
        _ => Err(diagnostics),
    }
}

#[derive(Default)]
pub struct JumpCloudProvider {
    provider_data: Option<JumpCloudProviderData>,
}

impl JumpCloudProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Provider for JumpCloudProvider {
    fn type_name(&self) -> &str {
        "jumpcloud"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: self.type_name().to_string(),
            server_capabilities: ServerCapabilities::default(),
        }
    }

    async fn schema(&self, _ctx: Context, _request: ProviderSchemaRequest) -> ProviderSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Manage JumpCloud directory, automation and security objects")
            .attribute(
                AttributeBuilder::new("api_key", AttributeType::String)
                    .description("JumpCloud API key; defaults to JUMPCLOUD_API_KEY")
                    .optional()
                    .sensitive()
                    .validator(StringLengthValidator::at_least(1))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("org_id", AttributeType::String)
                    .description("Organization id for multi-tenant admins; defaults to JUMPCLOUD_ORG_ID")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("api_url", AttributeType::String)
                    .description("API base URL; defaults to JUMPCLOUD_URL or https://console.jumpcloud.com")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("max_retries", AttributeType::Number)
                    .description("Retries for rate limited and 5xx responses (default 3)")
                    .optional()
                    .validator(NumberRangeValidator::between(0.0, 10.0))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("timeout_seconds", AttributeType::Number)
                    .description("Per-request timeout in seconds (default 30)")
                    .optional()
                    .validator(NumberRangeValidator::at_least(1.0))
                    .build(),
            )
            .build();

        ProviderSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateProviderConfigRequest,
    ) -> ValidateProviderConfigResponse {
        // Only values written in the block; the environment is read at configure time
        let diagnostics = match get_string(&request.config, "api_url") {
            Some(url) => check_api_url(&url).err().into_iter().collect(),
            None => vec![],
        };
        ValidateProviderConfigResponse { diagnostics }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        let settings = match client_settings(&request.config) {
            Ok(settings) => settings,
            Err(diagnostics) => {
                return ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                }
            }
        };

        tracing::debug!(
            "Configuring JumpCloud client for {} (org: {:?}, max_retries: {})",
            settings.api_url,
            settings.org_id,
            settings.retry.max_retries
        );

        let client = match Client::with_config(
            &settings.api_url,
            &settings.api_key,
            settings.org_id,
            settings.retry,
        ) {
            Ok(client) => client,
            Err(e) => {
                tracing::error!("Failed to create JumpCloud client: {}", e);
                return ConfigureProviderResponse {
                    diagnostics: vec![Diagnostic::error(
                        "Failed to create API client",
                        e.to_string(),
                    )],
                    provider_data: None,
                };
            }
        };

        let provider_data = JumpCloudProviderData::new(client);
        self.provider_data = Some(provider_data.clone());

        ConfigureProviderResponse {
            diagnostics: vec![],
            provider_data: Some(Arc::new(provider_data)),
        }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let mut resources: HashMap<String, ResourceFactory> = HashMap::new();

        resources.insert(
            "jumpcloud_user".to_string(),
            Box::new(|| -> Box<dyn ResourceWithConfigure> {
                Box::new(crate::resources::UserResource::new())
            }),
        );
        resources.insert(
            "jumpcloud_user_group".to_string(),
            Box::new(|| -> Box<dyn ResourceWithConfigure> {
                Box::new(crate::resources::UserGroupResource::new())
            }),
        );
        resources.insert(
            "jumpcloud_system_group".to_string(),
            Box::new(|| -> Box<dyn ResourceWithConfigure> {
                Box::new(crate::resources::SystemGroupResource::new())
            }),
        );
        resources.insert(
            "jumpcloud_user_group_membership".to_string(),
            Box::new(|| -> Box<dyn ResourceWithConfigure> {
                Box::new(crate::resources::GroupMembershipResource::user())
            }),
        );
        resources.insert(
            "jumpcloud_system_group_membership".to_string(),
            Box::new(|| -> Box<dyn ResourceWithConfigure> {
                Box::new(crate::resources::GroupMembershipResource::system())
            }),
        );
        resources.insert(
            "jumpcloud_system".to_string(),
            Box::new(|| -> Box<dyn ResourceWithConfigure> {
                Box::new(crate::resources::SystemResource::new())
            }),
        );
        resources.insert(
            "jumpcloud_command".to_string(),
            Box::new(|| -> Box<dyn ResourceWithConfigure> {
                Box::new(crate::resources::CommandResource::new())
            }),
        );
        resources.insert(
            "jumpcloud_command_schedule".to_string(),
            Box::new(|| -> Box<dyn ResourceWithConfigure> {
                Box::new(crate::resources::CommandScheduleResource::new())
            }),
        );
        resources.insert(
            "jumpcloud_webhook".to_string(),
            Box::new(|| -> Box<dyn ResourceWithConfigure> {
                Box::new(crate::resources::WebhookResource::new())
            }),
        );
        resources.insert(
            "jumpcloud_api_key".to_string(),
            Box::new(|| -> Box<dyn ResourceWithConfigure> {
                Box::new(crate::resources::ApiKeyResource::new())
            }),
        );
        resources.insert(
            "jumpcloud_alert_configuration".to_string(),
            Box::new(|| -> Box<dyn ResourceWithConfigure> {
                Box::new(crate::resources::AlertConfigurationResource::new())
            }),
        );
        resources.insert(
            "jumpcloud_policy".to_string(),
            Box::new(|| -> Box<dyn ResourceWithConfigure> {
                Box::new(crate::resources::PolicyResource::new())
            }),
        );
        resources.insert(
            "jumpcloud_scim_server".to_string(),
            Box::new(|| -> Box<dyn ResourceWithConfigure> {
                Box::new(crate::resources::ScimServerResource::new())
            }),
        );
        resources.insert(
            "jumpcloud_software_app".to_string(),
            Box::new(|| -> Box<dyn ResourceWithConfigure> {
                Box::new(crate::resources::SoftwareAppResource::new())
            }),
        );

        resources
    }

    fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
        let mut data_sources: HashMap<String, DataSourceFactory> = HashMap::new();

        data_sources.insert(
            "jumpcloud_user".to_string(),
            Box::new(|| -> Box<dyn DataSourceWithConfigure> {
                Box::new(crate::data_sources::UserDataSource::new())
            }),
        );
        data_sources.insert(
            "jumpcloud_users".to_string(),
            Box::new(|| -> Box<dyn DataSourceWithConfigure> {
                Box::new(crate::data_sources::UsersDataSource::new())
            }),
        );
        data_sources.insert(
            "jumpcloud_user_group".to_string(),
            Box::new(|| -> Box<dyn DataSourceWithConfigure> {
                Box::new(crate::data_sources::UserGroupDataSource::new())
            }),
        );
        data_sources.insert(
            "jumpcloud_system".to_string(),
            Box::new(|| -> Box<dyn DataSourceWithConfigure> {
                Box::new(crate::data_sources::SystemDataSource::new())
            }),
        );
        data_sources.insert(
            "jumpcloud_systems".to_string(),
            Box::new(|| -> Box<dyn DataSourceWithConfigure> {
                Box::new(crate::data_sources::SystemsDataSource::new())
            }),
        );
        data_sources.insert(
            "jumpcloud_alerts".to_string(),
            Box::new(|| -> Box<dyn DataSourceWithConfigure> {
                Box::new(crate::data_sources::AlertsDataSource::new())
            }),
        );

        data_sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tfplug::types::{ClientCapabilities, Dynamic};

    fn configure_request(config: serde_json::Value) -> ConfigureProviderRequest {
        ConfigureProviderRequest {
            terraform_version: "1.9.0".to_string(),
            config: DynamicValue::new(Dynamic::from(config)),
            client_capabilities: ClientCapabilities::default(),
        }
    }

    fn clear_env() {
        std::env::remove_var(API_KEY_ENV);
        std::env::remove_var(ORG_ID_ENV);
        std::env::remove_var(API_URL_ENV);
    }

    #[tokio::test]
    #[serial]
    async fn configures_from_env_vars() {
        clear_env();
        std::env::set_var(API_KEY_ENV, "env-key");
        std::env::set_var(ORG_ID_ENV, "org-1");
        std::env::set_var(API_URL_ENV, "http://localhost:8080");

        let mut provider = JumpCloudProvider::new();
        let response = provider
            .configure(Context::new(), configure_request(serde_json::json!({})))
            .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        assert!(response.provider_data.is_some());
        let data = provider.provider_data.as_ref().unwrap();
        assert_eq!(data.client.base_url(), "http://localhost:8080");

        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn config_block_wins_over_env() {
        clear_env();
        std::env::set_var(API_URL_ENV, "http://env.invalid");

        let settings = client_settings(&DynamicValue::new(Dynamic::from(serde_json::json!({
            "api_key": "block-key",
            "api_url": "https://console.eu.jumpcloud.com",
            "max_retries": 5,
            "timeout_seconds": 10
        }))))
        .unwrap();

        assert_eq!(settings.api_key, "block-key");
        assert_eq!(settings.api_url, "https://console.eu.jumpcloud.com");
        assert_eq!(settings.org_id, None);
        assert_eq!(settings.retry.max_retries, 5);
        assert_eq!(settings.retry.timeout_seconds, 10);

        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn missing_api_key_is_an_error() {
        clear_env();

        let mut provider = JumpCloudProvider::new();
        let response = provider
            .configure(
                Context::new(),
                configure_request(serde_json::json!({"api_key": "  "})),
            )
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].summary, "Missing API key");
        assert!(response.provider_data.is_none());
        assert!(provider.provider_data.is_none());
    }

    #[tokio::test]
    async fn validate_rejects_non_http_url() {
        let provider = JumpCloudProvider::new();
        let response = provider
            .validate(
                Context::new(),
                ValidateProviderConfigRequest {
                    config: DynamicValue::new(Dynamic::from(
                        serde_json::json!({"api_url": "ftp://console.jumpcloud.com"}),
                    )),
                },
            )
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].summary, "Invalid API URL");
    }

    #[test]
    fn serves_every_resource_and_data_source() {
        let provider = JumpCloudProvider::new();
        let resources = provider.resources();
        assert_eq!(resources.len(), 14);
        for (name, factory) in &resources {
            assert_eq!(factory().type_name(), name);
        }

        let data_sources = provider.data_sources();
        assert_eq!(data_sources.len(), 6);
        for (name, factory) in &data_sources {
            assert_eq!(factory().type_name(), name);
        }
    }
}

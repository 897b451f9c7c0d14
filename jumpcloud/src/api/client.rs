use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use super::common::{ApiErrorResponse, ApiQueryParams, ListOptions, PagedResponse};
use super::error::ApiError;
use super::pool::{ConnectionPoolConfig, ConnectionPoolManager, ConnectionStats};

pub const DEFAULT_API_URL: &str = "https://console.jumpcloud.com";

const API_KEY_HEADER: &str = "x-api-key";
const ORG_ID_HEADER: &str = "x-org-id";
const USER_AGENT: &str = concat!("terraform-provider-jumpcloud/", env!("CARGO_PKG_VERSION"));

/// JumpCloud API client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    org_id: Option<String>,
    retry_config: RetryConfig,
    pool_manager: ConnectionPoolManager,
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub timeout_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 10000,
            timeout_seconds: 30,
        }
    }
}

impl RetryConfig {
    fn backoff_ms(&self, attempt: u32) -> u64 {
        let factor = 2_u64.saturating_pow(attempt.saturating_sub(1));
        std::cmp::min(
            self.initial_backoff_ms.saturating_mul(factor),
            self.max_backoff_ms,
        )
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.inner.base_url)
            .field("api_key", &"<redacted>")
            .field("org_id", &self.inner.org_id)
            .field("retry_config", &self.inner.retry_config)
            .finish()
    }
}

impl Client {
    /// Create a new API client with default configuration
    pub fn new(base_url: &str, api_key: &str, org_id: Option<String>) -> Result<Self, ApiError> {
        Self::with_config(base_url, api_key, org_id, RetryConfig::default())
    }

    /// Create a new API client with custom retry configuration
    pub fn with_config(
        base_url: &str,
        api_key: &str,
        org_id: Option<String>,
        retry_config: RetryConfig,
    ) -> Result<Self, ApiError> {
        if api_key.trim().is_empty() {
            return Err(ApiError::InvalidConfig("api_key must not be empty".to_string()));
        }

        let parsed = url::Url::parse(base_url)
            .map_err(|e| ApiError::InvalidConfig(format!("invalid api_url '{}': {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidConfig(format!(
                "api_url must use http or https, got '{}'",
                parsed.scheme()
            )));
        }

        let pool_config = ConnectionPoolConfig {
            request_timeout: std::time::Duration::from_secs(retry_config.timeout_seconds),
            ..Default::default()
        };

        let pool_manager = ConnectionPoolManager::new(pool_config);
        let http_client = pool_manager.build_client(USER_AGENT)?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url: base_url.trim_end_matches('/').to_string(),
                api_key: api_key.to_string(),
                org_id: org_id.filter(|id| !id.trim().is_empty()),
                retry_config,
                pool_manager,
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn org_id(&self) -> Option<&str> {
        self.inner.org_id.as_deref()
    }

    /// Directory API operations (users, groups, systems)
    pub fn directory(&self) -> crate::api::directory::DirectoryApi<'_> {
        crate::api::directory::DirectoryApi::new(self)
    }

    /// Automation API operations (commands, schedules, webhooks)
    pub fn automation(&self) -> crate::api::automation::AutomationApi<'_> {
        crate::api::automation::AutomationApi::new(self)
    }

    /// Security API operations (API keys, alerts, policies)
    pub fn security(&self) -> crate::api::security::SecurityApi<'_> {
        crate::api::security::SecurityApi::new(self)
    }

    /// Integration API operations (SCIM, software)
    pub fn integrations(&self) -> crate::api::integrations::IntegrationsApi<'_> {
        crate::api::integrations::IntegrationsApi::new(self)
    }

    /// Get request statistics
    pub async fn get_connection_stats(&self) -> ConnectionStats {
        self.inner.pool_manager.get_stats().await
    }

    /// Send one request and return the raw response body. Every typed
    /// helper goes through here.
    pub async fn do_request(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, ApiError> {
        let url = format!("{}{}", self.inner.base_url, path);
        let retry = &self.inner.retry_config;
        let mut attempt = 0;
        let mut last_error = None;

        while attempt <= retry.max_retries {
            if attempt > 0 {
                let backoff = retry.backoff_ms(attempt);
                tracing::warn!(
                    "Retrying {} {} after {}ms (attempt {})",
                    method,
                    path,
                    backoff,
                    attempt
                );
                self.inner.pool_manager.record_retry().await;
                tokio::time::sleep(tokio::time::Duration::from_millis(backoff)).await;
            }

            tracing::debug!("{} request to: {}", method, url);

            let mut request = self
                .inner
                .http_client
                .request(method.clone(), &url)
                .header(API_KEY_HEADER, &self.inner.api_key)
                .header(ACCEPT, "application/json");
            if let Some(org_id) = &self.inner.org_id {
                request = request.header(ORG_ID_HEADER, org_id);
            }
            if let Some(body) = &body {
                request = request
                    .header(CONTENT_TYPE, "application/json")
                    .body(body.clone());
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        self.inner.pool_manager.record_request(true).await;
                        let bytes = response.bytes().await?;
                        tracing::debug!(
                            "API response ({}): {}",
                            status,
                            String::from_utf8_lossy(&bytes)
                        );
                        return Ok(bytes.to_vec());
                    }

                    self.inner.pool_manager.record_request(false).await;

                    if status == StatusCode::UNAUTHORIZED {
                        return Err(ApiError::AuthError);
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(ApiError::RateLimited);
                    } else if status.is_server_error() {
                        last_error = Some(Self::error_from_response(response).await);
                    } else {
                        return Err(Self::error_from_response(response).await);
                    }
                }
                Err(e) => {
                    self.inner.pool_manager.record_request(false).await;

                    if e.is_timeout() {
                        last_error = Some(ApiError::Timeout(retry.timeout_seconds));
                    } else if e.is_connect() {
                        tracing::debug!("Connection to {} failed: {}", url, e);
                        last_error = Some(ApiError::ServiceUnavailable);
                    } else {
                        return Err(ApiError::RequestError(e));
                    }
                }
            }

            attempt += 1;
        }

        Err(last_error.unwrap_or(ApiError::ServiceUnavailable))
    }

    /// Execute a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let body = self.do_request(Method::GET, path, None).await?;
        Self::decode(&body)
    }

    /// Execute a GET request with query parameters
    pub async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &ApiQueryParams,
    ) -> Result<T, ApiError> {
        let full_path = format!("{}{}", path, params.to_query_string());
        self.get(&full_path).await
    }

    /// Fetch one page of a list endpoint
    pub async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        options: &ListOptions,
    ) -> Result<PagedResponse<T>, ApiError> {
        self.get_with_params(path, &options.to_query_params()).await
    }

    /// Execute a POST request
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = self
            .do_request(Method::POST, path, Some(Self::encode(body)?))
            .await?;
        Self::decode(&body)
    }

    /// Execute a PUT request
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = self
            .do_request(Method::PUT, path, Some(Self::encode(body)?))
            .await?;
        Self::decode(&body)
    }

    /// Execute a DELETE request, ignoring whatever the API echoes back
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.do_request(Method::DELETE, path, None).await.map(|_| ())
    }

    fn encode<B: Serialize + ?Sized>(body: &B) -> Result<Vec<u8>, ApiError> {
        serde_json::to_vec(body).map_err(|e| ApiError::EncodeError(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
        let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            body
        };

        serde_json::from_slice(body).map_err(|e| {
            tracing::error!(
                "Failed to deserialize response: {}, body: {}",
                e,
                String::from_utf8_lossy(body)
            );
            ApiError::ParseError(format!("Failed to parse response: {}", e))
        })
    }

    async fn error_from_response(response: reqwest::Response) -> ApiError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        let message = serde_json::from_str::<ApiErrorResponse>(&text)
            .ok()
            .and_then(|body| body.text())
            .unwrap_or_else(|| {
                if text.trim().is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("Unknown error")
                        .to_string()
                } else {
                    text
                }
            });

        ApiError::ApiError {
            status: status.as_u16(),
            message,
        }
    }
}

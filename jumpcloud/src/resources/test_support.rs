//! Fixtures for resource and data source unit tests

use crate::api::{Client, RetryConfig};
use crate::JumpCloudProviderData;
use std::any::Any;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::data_source::{ConfigureDataSourceRequest, DataSourceWithConfigure};
use tfplug::resource::{ConfigureResourceRequest, ResourceWithConfigure};
use tfplug::types::{Dynamic, DynamicValue};

pub fn provider_data(url: &str) -> Arc<dyn Any + Send + Sync> {
    let client = Client::with_config(
        url,
        "test-api-key",
        None,
        RetryConfig {
            max_retries: 0,
            initial_backoff_ms: 1,
            max_backoff_ms: 1,
            timeout_seconds: 5,
        },
    )
    .unwrap();
    Arc::new(JumpCloudProviderData::new(client))
}

pub async fn configured<R: ResourceWithConfigure + Default>(url: &str) -> R {
    let mut resource = R::default();
    let response = resource
        .configure(
            Context::new(),
            ConfigureResourceRequest {
                provider_data: Some(provider_data(url)),
            },
        )
        .await;
    assert!(response.diagnostics.is_empty());
    resource
}

pub async fn configured_data_source<D: DataSourceWithConfigure + Default>(url: &str) -> D {
    let mut data_source = D::default();
    let response = data_source
        .configure(
            Context::new(),
            ConfigureDataSourceRequest {
                provider_data: Some(provider_data(url)),
            },
        )
        .await;
    assert!(response.diagnostics.is_empty());
    data_source
}

pub fn plan(json: serde_json::Value) -> DynamicValue {
    DynamicValue::new(Dynamic::from(json))
}

pub fn state(json: serde_json::Value) -> DynamicValue {
    DynamicValue::new(Dynamic::from(json))
}

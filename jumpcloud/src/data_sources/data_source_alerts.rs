//! Alert feed data source
//!
//! Accepts the generic query inputs plus `severity` and `status` shortcuts,
//! which are added as equality filters.

use std::collections::HashMap;

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceMetadataRequest,
    DataSourceMetadataResponse, DataSourceSchemaRequest, DataSourceSchemaResponse,
    DataSourceWithConfigure, ReadDataSourceRequest, ReadDataSourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{Dynamic, DynamicValue};
use tfplug::validator::OneOfValidator;

use super::query::{collect_pages, list_options, query_attributes};
use crate::api::common::{Filter, FilterSyntax};
use crate::api::security::alerts::Alert;
use crate::resources::helpers::{get_string, not_configured, set};
use crate::resources::security::resource_alert_configuration::SEVERITIES;
use crate::JumpCloudProviderData;

const ALERT_STATUSES: &[&str] = &["open", "acknowledged", "resolved"];

fn alert_object(alert: &Alert) -> HashMap<String, Dynamic> {
    let mut object = HashMap::new();
    object.insert("id".to_string(), alert.id.clone().into());
    object.insert("title".to_string(), alert.title.clone().into());
    object.insert("description".to_string(), alert.description.clone().into());
    object.insert("severity".to_string(), alert.severity.clone().into());
    object.insert("status".to_string(), alert.status.clone().into());
    object.insert("type".to_string(), alert.alert_type.clone().into());
    object.insert(
        "configuration_id".to_string(),
        alert.configuration_id.clone().into(),
    );
    object.insert("created_at".to_string(), alert.created_at.clone().into());
    object.insert("updated_at".to_string(), alert.updated_at.clone().into());
    object
}

#[derive(Default)]
pub struct AlertsDataSource {
    provider_data: Option<JumpCloudProviderData>,
}

impl AlertsDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DataSource for AlertsDataSource {
    fn type_name(&self) -> &str {
        "jumpcloud_alerts"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let builder = SchemaBuilder::new()
            .version(0)
            .description("Lists alerts raised by JumpCloud alert configurations")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("severity", AttributeType::String)
                    .description("Only alerts with this severity")
                    .optional()
                    .validator(OneOfValidator::create(SEVERITIES))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("status", AttributeType::String)
                    .description("Only alerts with this status")
                    .optional()
                    .validator(OneOfValidator::create(ALERT_STATUSES))
                    .build(),
            );

        let schema = query_attributes(builder)
            .attribute(
                AttributeBuilder::new(
                    "alerts",
                    AttributeType::list_of_objects(&[
                        ("id", AttributeType::String),
                        ("title", AttributeType::String),
                        ("description", AttributeType::String),
                        ("severity", AttributeType::String),
                        ("status", AttributeType::String),
                        ("type", AttributeType::String),
                        ("configuration_id", AttributeType::String),
                        ("created_at", AttributeType::String),
                        ("updated_at", AttributeType::String),
                    ]),
                )
                .computed()
                .build(),
            )
            .attribute(
                AttributeBuilder::new("total_count", AttributeType::Number)
                    .computed()
                    .build(),
            )
            .build();

        DataSourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn read(&self, ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let mut diagnostics = vec![];

        let Some(provider_data) = &self.provider_data else {
            diagnostics.push(not_configured());
            return ReadDataSourceResponse {
                state: DynamicValue::null(),
                diagnostics,
            };
        };

        let mut options = match list_options(&request.config, FilterSyntax::V2) {
            Ok(options) => options,
            Err(diag) => {
                diagnostics.push(diag);
                return ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics,
                };
            }
        };
        for shortcut in ["severity", "status"] {
            if let Some(value) = get_string(&request.config, shortcut) {
                options = options.with_filter(Filter::eq(shortcut, value));
            }
        }

        tracing::debug!("Listing alerts with {} filters", options.filters.len());

        let alerts = &provider_data.client.security().alerts();
        let found = collect_pages(&ctx, &options, "Failed to list alerts", move |page| async move {
            alerts.list(&page).await
        })
        .await;

        let (results, total) = match found {
            Ok(found) => found,
            Err(diag) => {
                diagnostics.push(diag);
                return ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics,
                };
            }
        };

        let mut state = request.config.clone();
        set(&mut state, "id", "alerts");
        set(
            &mut state,
            "total_count",
            total.unwrap_or(results.len() as u64) as f64,
        );
        set(
            &mut state,
            "alerts",
            Dynamic::List(
                results
                    .iter()
                    .map(|alert| Dynamic::Map(alert_object(alert)))
                    .collect(),
            ),
        );

        ReadDataSourceResponse { state, diagnostics }
    }
}

#[async_trait]
impl DataSourceWithConfigure for AlertsDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        let mut diagnostics = vec![];
        match JumpCloudProviderData::from_provider_data(request.provider_data, "data source") {
            Ok(data) => self.provider_data = Some(data),
            Err(diag) => diagnostics.push(diag),
        }
        ConfigureDataSourceResponse { diagnostics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::helpers::get_number;
    use crate::resources::test_support::{configured_data_source, plan};
    use mockito::{Matcher, Server};
    use tfplug::types::{AttributePath, ClientCapabilities};

    fn read_request(config: serde_json::Value) -> ReadDataSourceRequest {
        ReadDataSourceRequest {
            type_name: "jumpcloud_alerts".to_string(),
            config: plan(config),
            provider_meta: None,
            client_capabilities: ClientCapabilities::default(),
        }
    }

    #[tokio::test]
    async fn shortcuts_become_filters() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v2/alerts")
            .match_query(Matcher::AllOf(vec![
                Matcher::Regex("filter=severity(:|%3A)eq(:|%3A)high".into()),
                Matcher::Regex("filter=status(:|%3A)eq(:|%3A)open".into()),
            ]))
            .with_body(
                r#"[{"id":"al1","title":"Failed logins","severity":"high","status":"open",
                     "type":"auth","configurationId":"c1","createdAt":"2024-05-01T10:00:00Z"}]"#,
            )
            .create_async()
            .await;

        let data_source: AlertsDataSource = configured_data_source(&server.url()).await;
        let response = data_source
            .read(
                Context::new(),
                read_request(serde_json::json!({"severity": "high", "status": "open"})),
            )
            .await;

        mock.assert_async().await;
        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        assert_eq!(get_number(&response.state, "total_count"), Some(1.0));

        let Some(Dynamic::List(alerts)) = response.state.get(&AttributePath::new("alerts")) else {
            panic!("alerts missing from state");
        };
        let Dynamic::Map(alert) = &alerts[0] else {
            panic!("expected object, got {:?}", alerts[0]);
        };
        assert_eq!(
            alert.get("configuration_id"),
            Some(&Dynamic::String("c1".into()))
        );
        assert_eq!(alert.get("updated_at"), Some(&Dynamic::Null));
    }

    #[tokio::test]
    async fn api_failure_is_reported() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v2/alerts")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body(r#"{"message":"Forbidden"}"#)
            .create_async()
            .await;

        let data_source: AlertsDataSource = configured_data_source(&server.url()).await;
        let response = data_source
            .read(Context::new(), read_request(serde_json::json!({})))
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].summary, "Failed to list alerts");
        assert!(response.state.is_null());
    }
}

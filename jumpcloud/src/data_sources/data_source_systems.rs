use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceMetadataRequest,
    DataSourceMetadataResponse, DataSourceSchemaRequest, DataSourceSchemaResponse,
    DataSourceWithConfigure, ReadDataSourceRequest, ReadDataSourceResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{Dynamic, DynamicValue};

use super::data_source_system::{system_fields, system_object};
use super::query::{collect_pages, list_options, query_attributes};
use crate::api::common::FilterSyntax;
use crate::resources::helpers::{not_configured, set};
use crate::JumpCloudProviderData;

#[derive(Default)]
pub struct SystemsDataSource {
    provider_data: Option<JumpCloudProviderData>,
}

impl SystemsDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DataSource for SystemsDataSource {
    fn type_name(&self) -> &str {
        "jumpcloud_systems"
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
            .description("Lists JumpCloud systems matching optional filters")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .build(),
            );

        let fields = system_fields();
        let schema = query_attributes(builder)
            .attribute(
                AttributeBuilder::new("systems", AttributeType::list_of_objects(&fields))
                    .description("Matching systems")
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

        let options = match list_options(&request.config, FilterSyntax::V1) {
            Ok(options) => options,
            Err(diag) => {
                diagnostics.push(diag);
                return ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics,
                };
            }
        };

        tracing::debug!("Listing systems with {} filters", options.filters.len());

        let systems = &provider_data.client.directory().systems();
        let found = collect_pages(&ctx, &options, "Failed to list systems", move |page| async move {
            systems.list(&page).await
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
        set(&mut state, "id", "systems");
        set(
            &mut state,
            "total_count",
            total.unwrap_or(results.len() as u64) as f64,
        );
        set(
            &mut state,
            "systems",
            Dynamic::List(
                results
                    .iter()
                    .map(|system| Dynamic::Map(system_object(system)))
                    .collect(),
            ),
        );

        ReadDataSourceResponse { state, diagnostics }
    }
}

#[async_trait]
impl DataSourceWithConfigure for SystemsDataSource {
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

    #[tokio::test]
    async fn pages_through_all_systems() {
        let mut server = Server::new_async().await;
        let first: Vec<serde_json::Value> = (0..100)
            .map(|i| serde_json::json!({"_id": format!("s{}", i), "os": "Mac OS X"}))
            .collect();
        let first_page = server
            .mock("GET", "/api/systems")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("filter".into(), "os:$eq:Mac OS X".into()),
                Matcher::UrlEncoded("skip".into(), "0".into()),
            ]))
            .with_body(serde_json::json!({"totalCount": 101, "results": first}).to_string())
            .create_async()
            .await;
        let second_page = server
            .mock("GET", "/api/systems")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("filter".into(), "os:$eq:Mac OS X".into()),
                Matcher::UrlEncoded("skip".into(), "100".into()),
            ]))
            .with_body(r#"{"totalCount":101,"results":[{"_id":"s100","os":"Mac OS X"}]}"#)
            .create_async()
            .await;

        let data_source: SystemsDataSource = configured_data_source(&server.url()).await;
        let response = data_source
            .read(
                Context::new(),
                ReadDataSourceRequest {
                    type_name: "jumpcloud_systems".to_string(),
                    config: plan(serde_json::json!({
                        "filter": [{"field": "os", "operator": "eq", "value": "Mac OS X"}]
                    })),
                    provider_meta: None,
                    client_capabilities: ClientCapabilities::default(),
                },
            )
            .await;

        first_page.assert_async().await;
        second_page.assert_async().await;
        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        assert_eq!(get_number(&response.state, "total_count"), Some(101.0));
        match response.state.get(&AttributePath::new("systems")) {
            Some(Dynamic::List(systems)) => assert_eq!(systems.len(), 101),
            other => panic!("expected list of systems, got {:?}", other),
        }
    }
}

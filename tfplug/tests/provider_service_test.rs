#![allow(clippy::disallowed_methods)] // Allow unwrap() in tests for clarity

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource,
    DataSourceMetadataRequest, DataSourceMetadataResponse, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse,
};
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::proto::{self, ProviderService};
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, DataSourceFactory, Provider,
    ProviderMetadataRequest, ProviderMetadataResponse, ProviderSchemaRequest,
    ProviderSchemaResponse, ResourceFactory,
};
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceMetadataRequest, ResourceMetadataResponse,
    ResourceSchemaRequest, ResourceSchemaResponse, ResourceWithConfigure,
    ResourceWithImportState, UpdateResourceRequest, UpdateResourceResponse,
};
use tfplug::types::{Diagnostic, ServerCapabilities};
use tfplug::{
    import_state_passthrough_id, AttributeBuilder, AttributePath, AttributeType, Dynamic,
    DynamicValue, GrpcProviderServer, Schema, SchemaBuilder,
};
use tonic::Request;

type Store = Arc<Mutex<HashMap<String, String>>>;

struct TestProvider {
    store: Store,
}

#[async_trait]
impl Provider for TestProvider {
    fn type_name(&self) -> &str {
        "test"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: "test".to_string(),
            server_capabilities: ServerCapabilities::default(),
        }
    }

    async fn schema(&self, _ctx: Context, _request: ProviderSchemaRequest) -> ProviderSchemaResponse {
        ProviderSchemaResponse {
            schema: SchemaBuilder::new()
                .attribute(
                    AttributeBuilder::new("endpoint", AttributeType::String)
                        .optional()
                        .build(),
                )
                .build(),
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        _request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        ConfigureProviderResponse {
            diagnostics: vec![],
            provider_data: Some(Arc::new(self.store.clone())),
        }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let mut resources: HashMap<String, ResourceFactory> = HashMap::new();
        resources.insert(
            "test_widget".to_string(),
            Box::new(|| -> Box<dyn ResourceWithConfigure> {
                Box::new(WidgetResource { store: None })
            }),
        );
        resources
    }

    fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
        let mut data_sources: HashMap<String, DataSourceFactory> = HashMap::new();
        data_sources.insert(
            "test_widgets".to_string(),
            Box::new(|| -> Box<dyn DataSourceWithConfigure> {
                Box::new(WidgetsDataSource { store: None })
            }),
        );
        data_sources
    }
}

fn widget_schema() -> Schema {
    SchemaBuilder::new()
        .attribute(
            AttributeBuilder::new("id", AttributeType::String)
                .computed()
                .plan_modifier(UseStateForUnknown::create())
                .build(),
        )
        .attribute(
            AttributeBuilder::new("name", AttributeType::String)
                .required()
                .build(),
        )
        .build()
}

fn store_from(provider_data: Option<Arc<dyn std::any::Any + Send + Sync>>) -> Option<Store> {
    provider_data.and_then(|data| data.downcast_ref::<Store>().cloned())
}

struct WidgetResource {
    store: Option<Store>,
}

impl WidgetResource {
    fn store(&self) -> &Store {
        self.store.as_ref().unwrap()
    }
}

#[async_trait]
impl Resource for WidgetResource {
    fn type_name(&self) -> &str {
        "test_widget"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: "test_widget".to_string(),
        }
    }

    async fn schema(&self, _ctx: Context, _request: ResourceSchemaRequest) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: widget_schema(),
            diagnostics: vec![],
        }
    }

    async fn create(&self, _ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let name = request
            .planned_state
            .get_string(&AttributePath::new("name"))
            .unwrap();
        let mut store = self.store().lock().unwrap();
        let id = format!("w-{}", store.len() + 1);
        store.insert(id.clone(), name);

        let mut new_state = request.planned_state;
        new_state.set_string(&AttributePath::new("id"), id).unwrap();
        CreateResourceResponse {
            new_state,
            private: vec![],
            diagnostics: vec![],
        }
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let id = request
            .current_state
            .get_string(&AttributePath::new("id"))
            .unwrap();
        let new_state = self.store().lock().unwrap().get(&id).map(|name| {
            let mut state = DynamicValue::object();
            state.set_string(&AttributePath::new("id"), id.clone()).unwrap();
            state
                .set_string(&AttributePath::new("name"), name.clone())
                .unwrap();
            state
        });
        ReadResourceResponse {
            new_state,
            diagnostics: vec![],
            private: request.private,
        }
    }

    async fn update(&self, _ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let id = request
            .prior_state
            .get_string(&AttributePath::new("id"))
            .unwrap();
        let name = request
            .planned_state
            .get_string(&AttributePath::new("name"))
            .unwrap();
        self.store().lock().unwrap().insert(id, name);
        UpdateResourceResponse {
            new_state: request.planned_state,
            private: vec![],
            diagnostics: vec![],
        }
    }

    async fn delete(&self, _ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let id = request
            .prior_state
            .get_string(&AttributePath::new("id"))
            .unwrap();
        self.store().lock().unwrap().remove(&id);
        DeleteResourceResponse {
            diagnostics: vec![],
        }
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

#[async_trait]
impl ResourceWithConfigure for WidgetResource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        self.store = store_from(request.provider_data);
        let diagnostics = if self.store.is_none() {
            vec![Diagnostic::error("Provider not configured", "no store")]
        } else {
            vec![]
        };
        ConfigureResourceResponse { diagnostics }
    }
}

#[async_trait]
impl ResourceWithImportState for WidgetResource {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse {
            imported_resources: vec![],
            diagnostics: vec![],
        };
        import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }
}

struct WidgetsDataSource {
    store: Option<Store>,
}

#[async_trait]
impl DataSource for WidgetsDataSource {
    fn type_name(&self) -> &str {
        "test_widgets"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: "test_widgets".to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        DataSourceSchemaResponse {
            schema: SchemaBuilder::new()
                .attribute(
                    AttributeBuilder::new("names", AttributeType::List(Box::new(AttributeType::String)))
                        .computed()
                        .build(),
                )
                .build(),
            diagnostics: vec![],
        }
    }

    async fn read(&self, _ctx: Context, _request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let mut names: Vec<String> = self
            .store
            .as_ref()
            .unwrap()
            .lock()
            .unwrap()
            .values()
            .cloned()
            .collect();
        names.sort();

        let mut state = DynamicValue::object();
        state
            .set_list(
                &AttributePath::new("names"),
                names.into_iter().map(Dynamic::from).collect(),
            )
            .unwrap();
        ReadDataSourceResponse {
            state,
            diagnostics: vec![],
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for WidgetsDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        self.store = store_from(request.provider_data);
        ConfigureDataSourceResponse {
            diagnostics: vec![],
        }
    }
}

fn encode(value: &DynamicValue) -> Option<proto::DynamicValue> {
    Some(proto::DynamicValue {
        msgpack: value.encode_msgpack().unwrap(),
        json: vec![],
    })
}

fn decode(value: Option<proto::DynamicValue>) -> DynamicValue {
    DynamicValue::decode_msgpack(&value.unwrap().msgpack).unwrap()
}

fn widget(id: Dynamic, name: &str) -> DynamicValue {
    DynamicValue::new(Dynamic::Map(HashMap::from([
        ("id".to_string(), id),
        ("name".to_string(), Dynamic::from(name)),
    ])))
}

async fn configured_server() -> (GrpcProviderServer<TestProvider>, Store) {
    let store: Store = Arc::new(Mutex::new(HashMap::new()));
    let server = GrpcProviderServer::new(TestProvider {
        store: store.clone(),
    });

    let config = DynamicValue::new(Dynamic::Map(HashMap::from([(
        "endpoint".to_string(),
        Dynamic::Null,
    )])));
    let response = server
        .configure_provider(Request::new(proto::configure_provider::Request {
            terraform_version: "1.9.0".to_string(),
            config: encode(&config),
            client_capabilities: None,
        }))
        .await
        .unwrap()
        .into_inner();
    assert!(response.diagnostics.is_empty());

    (server, store)
}

#[tokio::test]
async fn schema_lists_resources_and_data_sources() {
    let (server, _) = configured_server().await;

    let response = server
        .get_provider_schema(Request::new(proto::get_provider_schema::Request {}))
        .await
        .unwrap()
        .into_inner();

    assert!(response.provider.is_some());
    assert!(response.resource_schemas.contains_key("test_widget"));
    assert!(response.data_source_schemas.contains_key("test_widgets"));

    let metadata = server
        .get_metadata(Request::new(proto::get_metadata::Request {}))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(metadata.resources[0].type_name, "test_widget");
    assert_eq!(metadata.data_sources[0].type_name, "test_widgets");
}

#[tokio::test]
async fn create_read_and_delete_lifecycle() {
    let (server, store) = configured_server().await;
    let config = widget(Dynamic::Null, "alpha");

    let plan = server
        .plan_resource_change(Request::new(proto::plan_resource_change::Request {
            type_name: "test_widget".to_string(),
            prior_state: encode(&DynamicValue::null()),
            proposed_new_state: encode(&config),
            config: encode(&config),
            prior_private: vec![],
            provider_meta: None,
            client_capabilities: None,
        }))
        .await
        .unwrap()
        .into_inner();
    let planned = decode(plan.planned_state);
    assert!(planned.get(&AttributePath::new("id")).unwrap().is_unknown());

    let applied = server
        .apply_resource_change(Request::new(proto::apply_resource_change::Request {
            type_name: "test_widget".to_string(),
            prior_state: encode(&DynamicValue::null()),
            planned_state: encode(&planned),
            config: encode(&config),
            planned_private: vec![],
            provider_meta: None,
        }))
        .await
        .unwrap()
        .into_inner();
    assert!(applied.diagnostics.is_empty());
    let state = decode(applied.new_state);
    assert_eq!(state.get_string(&AttributePath::new("id")).unwrap(), "w-1");
    assert_eq!(store.lock().unwrap().get("w-1").unwrap(), "alpha");

    let read = server
        .read_resource(Request::new(proto::read_resource::Request {
            type_name: "test_widget".to_string(),
            current_state: encode(&state),
            private: vec![],
            provider_meta: None,
            client_capabilities: None,
        }))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(decode(read.new_state), state);

    let destroy = server
        .apply_resource_change(Request::new(proto::apply_resource_change::Request {
            type_name: "test_widget".to_string(),
            prior_state: encode(&state),
            planned_state: encode(&DynamicValue::null()),
            config: encode(&DynamicValue::null()),
            planned_private: vec![],
            provider_meta: None,
        }))
        .await
        .unwrap()
        .into_inner();
    assert!(decode(destroy.new_state).is_null());
    assert!(store.lock().unwrap().is_empty());
}

#[tokio::test]
async fn read_of_missing_resource_returns_null_state() {
    let (server, _) = configured_server().await;
    let state = widget(Dynamic::from("w-404"), "gone");

    let read = server
        .read_resource(Request::new(proto::read_resource::Request {
            type_name: "test_widget".to_string(),
            current_state: encode(&state),
            private: vec![],
            provider_meta: None,
            client_capabilities: None,
        }))
        .await
        .unwrap()
        .into_inner();

    assert!(read.diagnostics.is_empty());
    assert!(decode(read.new_state).is_null());
}

#[tokio::test]
async fn update_keeps_id_stable() {
    let (server, store) = configured_server().await;
    store
        .lock()
        .unwrap()
        .insert("w-1".to_string(), "alpha".to_string());
    let prior = widget(Dynamic::from("w-1"), "alpha");
    let proposed = widget(Dynamic::from("w-1"), "beta");
    let config = widget(Dynamic::Null, "beta");

    let plan = server
        .plan_resource_change(Request::new(proto::plan_resource_change::Request {
            type_name: "test_widget".to_string(),
            prior_state: encode(&prior),
            proposed_new_state: encode(&proposed),
            config: encode(&config),
            prior_private: vec![],
            provider_meta: None,
            client_capabilities: None,
        }))
        .await
        .unwrap()
        .into_inner();
    let planned = decode(plan.planned_state);
    assert_eq!(planned, proposed);

    let applied = server
        .apply_resource_change(Request::new(proto::apply_resource_change::Request {
            type_name: "test_widget".to_string(),
            prior_state: encode(&prior),
            planned_state: encode(&planned),
            config: encode(&config),
            planned_private: vec![],
            provider_meta: None,
        }))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(decode(applied.new_state), proposed);
    assert_eq!(store.lock().unwrap().get("w-1").unwrap(), "beta");
}

#[tokio::test]
async fn import_passes_id_through() {
    let (server, _) = configured_server().await;

    let response = server
        .import_resource_state(Request::new(proto::import_resource_state::Request {
            type_name: "test_widget".to_string(),
            id: "w-7".to_string(),
            client_capabilities: None,
        }))
        .await
        .unwrap()
        .into_inner();

    assert!(response.diagnostics.is_empty());
    let state = decode(response.imported_resources[0].state.clone());
    assert_eq!(state.get_string(&AttributePath::new("id")).unwrap(), "w-7");
    assert!(state.get(&AttributePath::new("name")).unwrap().is_null());
}

#[tokio::test]
async fn data_source_reads_through_provider_data() {
    let (server, store) = configured_server().await;
    store
        .lock()
        .unwrap()
        .insert("w-1".to_string(), "alpha".to_string());

    let config = DynamicValue::new(Dynamic::Map(HashMap::from([(
        "names".to_string(),
        Dynamic::Null,
    )])));
    let response = server
        .read_data_source(Request::new(proto::read_data_source::Request {
            type_name: "test_widgets".to_string(),
            config: encode(&config),
            provider_meta: None,
            client_capabilities: None,
        }))
        .await
        .unwrap()
        .into_inner();

    let state = decode(response.state);
    assert_eq!(
        state.get_list(&AttributePath::new("names")).unwrap(),
        vec![Dynamic::from("alpha")]
    );
}

#[tokio::test]
async fn unknown_resource_type_is_not_found() {
    let (server, _) = configured_server().await;

    let status = server
        .read_resource(Request::new(proto::read_resource::Request {
            type_name: "test_missing".to_string(),
            current_state: encode(&DynamicValue::object()),
            private: vec![],
            provider_meta: None,
            client_capabilities: None,
        }))
        .await
        .unwrap_err();

    assert_eq!(status.code(), tonic::Code::NotFound);
}

#[tokio::test]
async fn validation_reports_missing_required_attribute() {
    let server = GrpcProviderServer::new(TestProvider {
        store: Arc::new(Mutex::new(HashMap::new())),
    });
    let config = DynamicValue::new(Dynamic::Map(HashMap::from([
        ("id".to_string(), Dynamic::Null),
        ("name".to_string(), Dynamic::Null),
    ])));

    let response = server
        .validate_resource_config(Request::new(proto::validate_resource_config::Request {
            type_name: "test_widget".to_string(),
            config: encode(&config),
            client_capabilities: None,
        }))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(response.diagnostics.len(), 1);
    assert_eq!(response.diagnostics[0].summary, "Missing required argument");
}

#[tokio::test]
async fn resources_report_unconfigured_provider() {
    let server = GrpcProviderServer::new(TestProvider {
        store: Arc::new(Mutex::new(HashMap::new())),
    });
    let state = widget(Dynamic::from("w-1"), "alpha");

    let response = server
        .read_resource(Request::new(proto::read_resource::Request {
            type_name: "test_widget".to_string(),
            current_state: encode(&state),
            private: vec![],
            provider_meta: None,
            client_capabilities: None,
        }))
        .await
        .unwrap()
        .into_inner();

    assert_eq!(response.diagnostics.len(), 1);
    assert_eq!(decode(response.new_state), state);
}

#[tokio::test]
async fn stop_provider_cancels_root_context() {
    let (server, _) = configured_server().await;
    assert!(!server.context().is_cancelled());

    let response = server
        .stop_provider(Request::new(proto::stop_provider::Request {}))
        .await
        .unwrap()
        .into_inner();

    assert!(response.error.is_empty());
    assert!(server.context().is_cancelled());
}

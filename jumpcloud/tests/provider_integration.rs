use jumpcloud::JumpCloudProvider;
use mockito::{Matcher, Server};
use serial_test::serial;
use std::any::Any;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::data_source::{ConfigureDataSourceRequest, ReadDataSourceRequest};
use tfplug::provider::{ConfigureProviderRequest, Provider};
use tfplug::resource::{
    ConfigureResourceRequest, CreateResourceRequest, DeleteResourceRequest,
    ImportResourceStateRequest, ReadResourceRequest, ResourceWithConfigure,
};
use tfplug::types::{AttributePath, ClientCapabilities, Dynamic, DynamicValue};

fn value(json: serde_json::Value) -> DynamicValue {
    DynamicValue::new(Dynamic::from(json))
}

fn string_at(state: &DynamicValue, name: &str) -> Option<String> {
    state
        .get(&AttributePath::new(name))
        .and_then(Dynamic::as_str)
        .map(str::to_string)
}

async fn configure_provider(url: &str) -> (JumpCloudProvider, Arc<dyn Any + Send + Sync>) {
    let mut provider = JumpCloudProvider::new();
    let response = provider
        .configure(
            Context::new(),
            ConfigureProviderRequest {
                terraform_version: "1.9.0".to_string(),
                config: value(serde_json::json!({
                    "api_key": "test-key",
                    "org_id": null,
                    "api_url": url,
                    "max_retries": 0,
                    "timeout_seconds": 5
                })),
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let data = response.provider_data.expect("provider data");
    (provider, data)
}

async fn resource(
    provider: &JumpCloudProvider,
    data: &Arc<dyn Any + Send + Sync>,
    type_name: &str,
) -> Box<dyn ResourceWithConfigure> {
    let factories = provider.resources();
    let mut resource = factories.get(type_name).expect("resource factory")();
    let response = resource
        .configure(
            Context::new(),
            ConfigureResourceRequest {
                provider_data: Some(data.clone()),
            },
        )
        .await;
    assert!(response.diagnostics.is_empty());
    resource
}

#[tokio::test]
#[serial]
async fn user_group_lifecycle() {
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/api/v2/usergroups")
        .match_header("x-api-key", "test-key")
        .match_body(Matcher::Json(serde_json::json!({"name": "Engineering"})))
        .with_status(201)
        .with_body(r#"{"id":"g1","name":"Engineering","type":"user_group"}"#)
        .create_async()
        .await;
    let read = server
        .mock("GET", "/api/v2/usergroups/g1")
        .with_body(r#"{"id":"g1","name":"Engineering","description":"Builders"}"#)
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", "/api/v2/usergroups/g1")
        .with_status(204)
        .create_async()
        .await;

    let (provider, data) = configure_provider(&server.url()).await;
    let group = resource(&provider, &data, "jumpcloud_user_group").await;

    let planned = value(serde_json::json!({
        "id": null, "name": "Engineering", "description": null, "email": null
    }));
    let created = group
        .create(
            Context::new(),
            CreateResourceRequest {
                type_name: "jumpcloud_user_group".to_string(),
                planned_state: planned.clone(),
                config: planned,
                planned_private: vec![],
                provider_meta: None,
            },
        )
        .await;
    create.assert_async().await;
    assert!(created.diagnostics.is_empty(), "{:?}", created.diagnostics);
    assert_eq!(string_at(&created.new_state, "id").as_deref(), Some("g1"));

    let refreshed = group
        .read(
            Context::new(),
            ReadResourceRequest {
                type_name: "jumpcloud_user_group".to_string(),
                current_state: created.new_state.clone(),
                private: vec![],
                provider_meta: None,
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;
    read.assert_async().await;
    let refreshed = refreshed.new_state.expect("group still exists");
    assert_eq!(
        string_at(&refreshed, "description").as_deref(),
        Some("Builders")
    );

    let deleted = group
        .delete(
            Context::new(),
            DeleteResourceRequest {
                type_name: "jumpcloud_user_group".to_string(),
                prior_state: refreshed,
                planned_private: vec![],
                provider_meta: None,
            },
        )
        .await;
    delete.assert_async().await;
    assert!(deleted.diagnostics.is_empty());
}

#[tokio::test]
#[serial]
async fn deleted_user_drops_out_of_state() {
    let mut server = Server::new_async().await;
    let _gone = server
        .mock("GET", "/api/systemusers/u1")
        .with_status(404)
        .with_body(r#"{"message":"User not found"}"#)
        .create_async()
        .await;
    let _delete = server
        .mock("DELETE", "/api/systemusers/u1")
        .with_status(404)
        .with_body(r#"{"message":"User not found"}"#)
        .create_async()
        .await;

    let (provider, data) = configure_provider(&server.url()).await;
    let user = resource(&provider, &data, "jumpcloud_user").await;
    let prior = value(serde_json::json!({"id": "u1", "username": "jdoe"}));

    let read = user
        .read(
            Context::new(),
            ReadResourceRequest {
                type_name: "jumpcloud_user".to_string(),
                current_state: prior.clone(),
                private: vec![],
                provider_meta: None,
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;
    assert!(read.new_state.is_none());
    assert!(read.diagnostics.is_empty());

    let deleted = user
        .delete(
            Context::new(),
            DeleteResourceRequest {
                type_name: "jumpcloud_user".to_string(),
                prior_state: prior,
                planned_private: vec![],
                provider_meta: None,
            },
        )
        .await;
    assert!(deleted.diagnostics.is_empty());
}

#[tokio::test]
#[serial]
async fn membership_import_splits_composite_id() {
    let server = Server::new_async().await;
    let (provider, data) = configure_provider(&server.url()).await;
    let membership = resource(&provider, &data, "jumpcloud_user_group_membership").await;

    let importer = membership.as_import_state().expect("membership supports import");
    let response = importer
        .import_state(
            Context::new(),
            ImportResourceStateRequest {
                type_name: "jumpcloud_user_group_membership".to_string(),
                id: "g1/u1".to_string(),
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state = &response.imported_resources[0].state;
    assert_eq!(string_at(state, "group_id").as_deref(), Some("g1"));
    assert_eq!(string_at(state, "user_id").as_deref(), Some("u1"));
}

#[tokio::test]
#[serial]
async fn user_data_source_reads_through_provider() {
    let mut server = Server::new_async().await;
    let _lookup = server
        .mock("GET", "/api/systemusers")
        .match_query(Matcher::UrlEncoded(
            "filter".into(),
            "username:$eq:jdoe".into(),
        ))
        .with_body(r#"{"totalCount":1,"results":[{"_id":"u1","username":"jdoe","sudo":true}]}"#)
        .create_async()
        .await;

    let (provider, data) = configure_provider(&server.url()).await;
    let factories = provider.data_sources();
    let mut data_source = factories.get("jumpcloud_user").expect("data source factory")();
    let configured = data_source
        .configure(
            Context::new(),
            ConfigureDataSourceRequest {
                provider_data: Some(data),
            },
        )
        .await;
    assert!(configured.diagnostics.is_empty());

    let response = data_source
        .read(
            Context::new(),
            ReadDataSourceRequest {
                type_name: "jumpcloud_user".to_string(),
                config: value(serde_json::json!({"username": "jdoe", "email": null})),
                provider_meta: None,
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(string_at(&response.state, "id").as_deref(), Some("u1"));
    assert_eq!(
        response.state.get(&AttributePath::new("sudo")),
        Some(&Dynamic::Bool(true))
    );
}

//! gRPC service implementation of the Terraform Plugin Protocol v6
//!
//! GrpcProviderServer owns the provider, its resource/data source factories
//! and the data returned from ConfigureProvider. A fresh resource or data
//! source instance is created and configured for every request; all the
//! planning logic shared by resources lives here.

use crate::context::Context;
use crate::data_source::{
    ConfigureDataSourceRequest, DataSourceSchemaRequest, DataSourceWithConfigure,
    ReadDataSourceRequest, ValidateDataSourceConfigRequest,
};
use crate::error::TfplugError;
use crate::proto;
use crate::provider::{
    ConfigureProviderRequest, DataSourceFactory, Provider, ProviderMetadataRequest,
    ProviderSchemaRequest, ResourceFactory, StopProviderRequest, ValidateProviderConfigRequest,
};
use crate::resource::{
    ConfigureResourceRequest, CreateResourceRequest, DeleteResourceRequest,
    ImportResourceStateRequest, ReadResourceRequest, ResourceSchemaRequest, ResourceWithConfigure,
    UpdateResourceRequest, ValidateResourceConfigRequest,
};
use crate::schema::{
    Attribute, Block, DefaultRequest, NestedBlock, NestingMode, PlanModifierRequest, Schema,
    StringKind, ValidatorRequest,
};
use crate::types::{
    has_errors, AttributePath, AttributePathStep, ClientCapabilities, Diagnostic,
    DiagnosticSeverity, Dynamic, DynamicValue, ServerCapabilities,
};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};
use tonic::{Request, Response, Status};

type ProviderData = Arc<dyn Any + Send + Sync>;

struct SchemaCache {
    provider: Schema,
    resources: HashMap<String, Schema>,
    data_sources: HashMap<String, Schema>,
    diagnostics: Vec<Diagnostic>,
}

pub struct GrpcProviderServer<P: Provider> {
    provider: Arc<RwLock<P>>,
    resource_factories: HashMap<String, ResourceFactory>,
    data_source_factories: HashMap<String, DataSourceFactory>,
    provider_data: RwLock<Option<ProviderData>>,
    schemas: OnceCell<SchemaCache>,
    root: Context,
}

impl<P: Provider + 'static> GrpcProviderServer<P> {
    pub fn new(provider: P) -> Self {
        let resource_factories = provider.resources();
        let data_source_factories = provider.data_sources();

        Self {
            provider: Arc::new(RwLock::new(provider)),
            resource_factories,
            data_source_factories,
            provider_data: RwLock::new(None),
            schemas: OnceCell::new(),
            root: Context::new(),
        }
    }

    /// Root context; cancelled by StopProvider
    pub fn context(&self) -> &Context {
        &self.root
    }

    async fn schemas(&self) -> &SchemaCache {
        self.schemas
            .get_or_init(|| async {
                let mut diagnostics = Vec::new();

                let provider_schema = {
                    let provider = self.provider.read().await;
                    let response = provider
                        .schema(self.root.child(), ProviderSchemaRequest)
                        .await;
                    diagnostics.extend(response.diagnostics);
                    response.schema
                };

                let mut resources = HashMap::new();
                for (name, factory) in &self.resource_factories {
                    let response = factory()
                        .schema(self.root.child(), ResourceSchemaRequest)
                        .await;
                    diagnostics.extend(response.diagnostics);
                    resources.insert(name.clone(), response.schema);
                }

                let mut data_sources = HashMap::new();
                for (name, factory) in &self.data_source_factories {
                    let response = factory()
                        .schema(self.root.child(), DataSourceSchemaRequest)
                        .await;
                    diagnostics.extend(response.diagnostics);
                    data_sources.insert(name.clone(), response.schema);
                }

                tracing::debug!(
                    resources = resources.len(),
                    data_sources = data_sources.len(),
                    "cached provider schemas"
                );

                SchemaCache {
                    provider: provider_schema,
                    resources,
                    data_sources,
                    diagnostics,
                }
            })
            .await
    }

    async fn resource_schema(&self, type_name: &str) -> Result<&Schema, Status> {
        self.schemas()
            .await
            .resources
            .get(type_name)
            .ok_or_else(|| TfplugError::ResourceNotFound(type_name.to_string()).into())
    }

    async fn data_source_schema(&self, type_name: &str) -> Result<&Schema, Status> {
        self.schemas()
            .await
            .data_sources
            .get(type_name)
            .ok_or_else(|| TfplugError::DataSourceNotFound(type_name.to_string()).into())
    }

    fn new_resource(&self, type_name: &str) -> Result<Box<dyn ResourceWithConfigure>, Status> {
        self.resource_factories
            .get(type_name)
            .map(|factory| factory())
            .ok_or_else(|| TfplugError::ResourceNotFound(type_name.to_string()).into())
    }

    fn new_data_source(&self, type_name: &str) -> Result<Box<dyn DataSourceWithConfigure>, Status> {
        self.data_source_factories
            .get(type_name)
            .map(|factory| factory())
            .ok_or_else(|| TfplugError::DataSourceNotFound(type_name.to_string()).into())
    }

    async fn configured_resource(
        &self,
        ctx: &Context,
        type_name: &str,
    ) -> Result<(Box<dyn ResourceWithConfigure>, Vec<Diagnostic>), Status> {
        let mut resource = self.new_resource(type_name)?;
        let provider_data = self.provider_data.read().await.clone();
        let response = resource
            .configure(ctx.clone(), ConfigureResourceRequest { provider_data })
            .await;
        Ok((resource, response.diagnostics))
    }

    async fn configured_data_source(
        &self,
        ctx: &Context,
        type_name: &str,
    ) -> Result<(Box<dyn DataSourceWithConfigure>, Vec<Diagnostic>), Status> {
        let mut data_source = self.new_data_source(type_name)?;
        let provider_data = self.provider_data.read().await.clone();
        let response = data_source
            .configure(ctx.clone(), ConfigureDataSourceRequest { provider_data })
            .await;
        Ok((data_source, response.diagnostics))
    }

    async fn server_capabilities(&self) -> ServerCapabilities {
        let provider = self.provider.read().await;
        provider
            .metadata(self.root.child(), ProviderMetadataRequest)
            .await
            .server_capabilities
    }
}

#[tonic::async_trait]
impl<P: Provider + 'static> proto::ProviderService for GrpcProviderServer<P> {
    async fn get_metadata(
        &self,
        _request: Request<proto::get_metadata::Request>,
    ) -> Result<Response<proto::get_metadata::Response>, Status> {
        let mut resources: Vec<_> = self.resource_factories.keys().cloned().collect();
        resources.sort();
        let mut data_sources: Vec<_> = self.data_source_factories.keys().cloned().collect();
        data_sources.sort();

        Ok(Response::new(proto::get_metadata::Response {
            server_capabilities: Some(server_capabilities_to_proto(
                &self.server_capabilities().await,
            )),
            diagnostics: vec![],
            data_sources: data_sources
                .into_iter()
                .map(|type_name| proto::get_metadata::DataSourceMetadata { type_name })
                .collect(),
            resources: resources
                .into_iter()
                .map(|type_name| proto::get_metadata::ResourceMetadata { type_name })
                .collect(),
        }))
    }

    async fn get_provider_schema(
        &self,
        _request: Request<proto::get_provider_schema::Request>,
    ) -> Result<Response<proto::get_provider_schema::Response>, Status> {
        let schemas = self.schemas().await;

        Ok(Response::new(proto::get_provider_schema::Response {
            provider: Some(schema_to_proto(&schemas.provider)),
            resource_schemas: schemas
                .resources
                .iter()
                .map(|(name, schema)| (name.clone(), schema_to_proto(schema)))
                .collect(),
            data_source_schemas: schemas
                .data_sources
                .iter()
                .map(|(name, schema)| (name.clone(), schema_to_proto(schema)))
                .collect(),
            diagnostics: diagnostics_to_proto(&schemas.diagnostics),
            provider_meta: None,
            server_capabilities: Some(server_capabilities_to_proto(
                &self.server_capabilities().await,
            )),
        }))
    }

    async fn validate_provider_config(
        &self,
        request: Request<proto::validate_provider_config::Request>,
    ) -> Result<Response<proto::validate_provider_config::Response>, Status> {
        let request = request.into_inner();
        let config = decode_dynamic(request.config.as_ref())?;

        let mut diagnostics = validate_config(&self.schemas().await.provider, &config);
        if !has_errors(&diagnostics) {
            let provider = self.provider.read().await;
            let response = provider
                .validate(self.root.child(), ValidateProviderConfigRequest { config })
                .await;
            diagnostics.extend(response.diagnostics);
        }

        Ok(Response::new(proto::validate_provider_config::Response {
            diagnostics: diagnostics_to_proto(&diagnostics),
        }))
    }

    async fn validate_resource_config(
        &self,
        request: Request<proto::validate_resource_config::Request>,
    ) -> Result<Response<proto::validate_resource_config::Response>, Status> {
        let request = request.into_inner();
        let schema = self.resource_schema(&request.type_name).await?;
        let config = decode_dynamic(request.config.as_ref())?;

        let mut diagnostics = validate_config(schema, &config);
        if !has_errors(&diagnostics) {
            let resource = self.new_resource(&request.type_name)?;
            let response = resource
                .validate(
                    self.root.child(),
                    ValidateResourceConfigRequest {
                        type_name: request.type_name,
                        config,
                        client_capabilities: client_capabilities_from_proto(
                            request.client_capabilities,
                        ),
                    },
                )
                .await;
            diagnostics.extend(response.diagnostics);
        }

        Ok(Response::new(proto::validate_resource_config::Response {
            diagnostics: diagnostics_to_proto(&diagnostics),
        }))
    }

    async fn validate_data_resource_config(
        &self,
        request: Request<proto::validate_data_resource_config::Request>,
    ) -> Result<Response<proto::validate_data_resource_config::Response>, Status> {
        let request = request.into_inner();
        let schema = self.data_source_schema(&request.type_name).await?;
        let config = decode_dynamic(request.config.as_ref())?;

        let mut diagnostics = validate_config(schema, &config);
        if !has_errors(&diagnostics) {
            let data_source = self.new_data_source(&request.type_name)?;
            let response = data_source
                .validate(
                    self.root.child(),
                    ValidateDataSourceConfigRequest {
                        type_name: request.type_name,
                        config,
                    },
                )
                .await;
            diagnostics.extend(response.diagnostics);
        }

        Ok(Response::new(proto::validate_data_resource_config::Response {
            diagnostics: diagnostics_to_proto(&diagnostics),
        }))
    }

    async fn upgrade_resource_state(
        &self,
        request: Request<proto::upgrade_resource_state::Request>,
    ) -> Result<Response<proto::upgrade_resource_state::Response>, Status> {
        let request = request.into_inner();
        let schema = self.resource_schema(&request.type_name).await?;
        let mut diagnostics = Vec::new();

        if request.version > schema.version {
            diagnostics.push(Diagnostic::error(
                "Unsupported state version",
                format!(
                    "State for {} was written by a newer provider (schema version {}, this provider supports {})",
                    request.type_name, request.version, schema.version
                ),
            ));
        }

        let raw = request.raw_state.unwrap_or_default();
        let upgraded = if !raw.json.is_empty() {
            schema.conform(DynamicValue::decode_json(&raw.json)?)
        } else {
            if !raw.flatmap.is_empty() {
                diagnostics.push(Diagnostic::error(
                    "Unsupported state format",
                    "Flatmap state from Terraform 0.11 and earlier cannot be upgraded",
                ));
            }
            DynamicValue::null()
        };

        Ok(Response::new(proto::upgrade_resource_state::Response {
            upgraded_state: Some(encode_dynamic(&upgraded)?),
            diagnostics: diagnostics_to_proto(&diagnostics),
        }))
    }

    async fn configure_provider(
        &self,
        request: Request<proto::configure_provider::Request>,
    ) -> Result<Response<proto::configure_provider::Response>, Status> {
        let request = request.into_inner();
        let config = decode_dynamic(request.config.as_ref())?;

        tracing::info!(terraform_version = %request.terraform_version, "configuring provider");

        let response = {
            let mut provider = self.provider.write().await;
            provider
                .configure(
                    self.root.child(),
                    ConfigureProviderRequest {
                        terraform_version: request.terraform_version,
                        config,
                        client_capabilities: client_capabilities_from_proto(
                            request.client_capabilities,
                        ),
                    },
                )
                .await
        };

        if !has_errors(&response.diagnostics) {
            *self.provider_data.write().await = response.provider_data;
        }

        Ok(Response::new(proto::configure_provider::Response {
            diagnostics: diagnostics_to_proto(&response.diagnostics),
        }))
    }

    async fn read_resource(
        &self,
        request: Request<proto::read_resource::Request>,
    ) -> Result<Response<proto::read_resource::Response>, Status> {
        let request = request.into_inner();
        let schema = self.resource_schema(&request.type_name).await?;
        let current_state = decode_dynamic(request.current_state.as_ref())?;

        if current_state.is_null() {
            return Ok(Response::new(proto::read_resource::Response {
                new_state: Some(encode_dynamic(&current_state)?),
                diagnostics: vec![],
                private: request.private,
            }));
        }

        let ctx = self.root.child();
        let (resource, mut diagnostics) = self.configured_resource(&ctx, &request.type_name).await?;
        if has_errors(&diagnostics) {
            return Ok(Response::new(proto::read_resource::Response {
                new_state: Some(encode_dynamic(&current_state)?),
                diagnostics: diagnostics_to_proto(&diagnostics),
                private: request.private,
            }));
        }

        tracing::debug!(type_name = %request.type_name, "reading resource");

        let response = resource
            .read(
                ctx,
                ReadResourceRequest {
                    type_name: request.type_name.clone(),
                    current_state: current_state.clone(),
                    private: request.private,
                    provider_meta: decode_optional(request.provider_meta.as_ref())?,
                    client_capabilities: client_capabilities_from_proto(
                        request.client_capabilities,
                    ),
                },
            )
            .await;
        diagnostics.extend(response.diagnostics);

        let new_state = match response.new_state {
            Some(state) => finalize_state(schema, state),
            None => {
                tracing::info!(type_name = %request.type_name, "resource no longer exists, removing from state");
                DynamicValue::null()
            }
        };

        Ok(Response::new(proto::read_resource::Response {
            new_state: Some(encode_dynamic(&new_state)?),
            diagnostics: diagnostics_to_proto(&diagnostics),
            private: response.private,
        }))
    }

    async fn plan_resource_change(
        &self,
        request: Request<proto::plan_resource_change::Request>,
    ) -> Result<Response<proto::plan_resource_change::Response>, Status> {
        let request = request.into_inner();
        let schema = self.resource_schema(&request.type_name).await?;
        let prior_state = decode_dynamic(request.prior_state.as_ref())?;
        let proposed = decode_dynamic(request.proposed_new_state.as_ref())?;
        let config = decode_dynamic(request.config.as_ref())?;

        let plan = plan_change(schema, &prior_state, proposed, &config);

        Ok(Response::new(proto::plan_resource_change::Response {
            planned_state: Some(encode_dynamic(&plan.planned_state)?),
            requires_replace: plan.requires_replace.iter().map(path_to_proto).collect(),
            planned_private: request.prior_private,
            diagnostics: diagnostics_to_proto(&plan.diagnostics),
            legacy_type_system: false,
        }))
    }

    async fn apply_resource_change(
        &self,
        request: Request<proto::apply_resource_change::Request>,
    ) -> Result<Response<proto::apply_resource_change::Response>, Status> {
        let request = request.into_inner();
        let schema = self.resource_schema(&request.type_name).await?;
        let prior_state = decode_dynamic(request.prior_state.as_ref())?;
        let planned_state = decode_dynamic(request.planned_state.as_ref())?;
        let config = decode_dynamic(request.config.as_ref())?;
        let provider_meta = decode_optional(request.provider_meta.as_ref())?;

        let ctx = self.root.child();
        let (resource, mut diagnostics) = self.configured_resource(&ctx, &request.type_name).await?;
        if has_errors(&diagnostics) {
            return Ok(Response::new(proto::apply_resource_change::Response {
                new_state: Some(encode_dynamic(&prior_state)?),
                private: request.planned_private,
                diagnostics: diagnostics_to_proto(&diagnostics),
                legacy_type_system: false,
            }));
        }

        let (new_state, private) = if planned_state.is_null() {
            tracing::info!(type_name = %request.type_name, "deleting resource");
            let response = resource
                .delete(
                    ctx,
                    DeleteResourceRequest {
                        type_name: request.type_name,
                        prior_state: prior_state.clone(),
                        planned_private: request.planned_private.clone(),
                        provider_meta,
                    },
                )
                .await;
            diagnostics.extend(response.diagnostics);
            if has_errors(&diagnostics) {
                (prior_state, request.planned_private)
            } else {
                (DynamicValue::null(), Vec::new())
            }
        } else if prior_state.is_null() {
            tracing::info!(type_name = %request.type_name, "creating resource");
            let response = resource
                .create(
                    ctx,
                    CreateResourceRequest {
                        type_name: request.type_name,
                        planned_state,
                        config,
                        planned_private: request.planned_private,
                        provider_meta,
                    },
                )
                .await;
            diagnostics.extend(response.diagnostics);
            if has_errors(&diagnostics) {
                (DynamicValue::null(), response.private)
            } else {
                (finalize_state(schema, response.new_state), response.private)
            }
        } else {
            tracing::info!(type_name = %request.type_name, "updating resource");
            let response = resource
                .update(
                    ctx,
                    UpdateResourceRequest {
                        type_name: request.type_name,
                        prior_state: prior_state.clone(),
                        planned_state,
                        config,
                        planned_private: request.planned_private,
                        provider_meta,
                    },
                )
                .await;
            diagnostics.extend(response.diagnostics);
            if has_errors(&diagnostics) {
                (prior_state, response.private)
            } else {
                (finalize_state(schema, response.new_state), response.private)
            }
        };

        Ok(Response::new(proto::apply_resource_change::Response {
            new_state: Some(encode_dynamic(&new_state)?),
            private,
            diagnostics: diagnostics_to_proto(&diagnostics),
            legacy_type_system: false,
        }))
    }

    async fn import_resource_state(
        &self,
        request: Request<proto::import_resource_state::Request>,
    ) -> Result<Response<proto::import_resource_state::Response>, Status> {
        let request = request.into_inner();
        let schema = self.resource_schema(&request.type_name).await?;

        let ctx = self.root.child();
        let (resource, mut diagnostics) = self.configured_resource(&ctx, &request.type_name).await?;

        let mut imported_resources = Vec::new();
        if !has_errors(&diagnostics) {
            match resource.as_import_state() {
                Some(importer) => {
                    let response = importer
                        .import_state(
                            ctx,
                            ImportResourceStateRequest {
                                type_name: request.type_name.clone(),
                                id: request.id,
                                client_capabilities: client_capabilities_from_proto(
                                    request.client_capabilities,
                                ),
                            },
                        )
                        .await;
                    diagnostics.extend(response.diagnostics);
                    for imported in response.imported_resources {
                        imported_resources.push(proto::import_resource_state::ImportedResource {
                            type_name: imported.type_name,
                            state: Some(encode_dynamic(&finalize_state(schema, imported.state))?),
                            private: imported.private,
                        });
                    }
                }
                None => diagnostics.push(Diagnostic::error(
                    "Resource Import Not Implemented",
                    format!("{} does not support import", request.type_name),
                )),
            }
        }

        Ok(Response::new(proto::import_resource_state::Response {
            imported_resources,
            diagnostics: diagnostics_to_proto(&diagnostics),
        }))
    }

    async fn read_data_source(
        &self,
        request: Request<proto::read_data_source::Request>,
    ) -> Result<Response<proto::read_data_source::Response>, Status> {
        let request = request.into_inner();
        let schema = self.data_source_schema(&request.type_name).await?;
        let config = decode_dynamic(request.config.as_ref())?;

        let ctx = self.root.child();
        let (data_source, mut diagnostics) =
            self.configured_data_source(&ctx, &request.type_name).await?;
        if has_errors(&diagnostics) {
            return Ok(Response::new(proto::read_data_source::Response {
                state: Some(encode_dynamic(&config)?),
                diagnostics: diagnostics_to_proto(&diagnostics),
            }));
        }

        tracing::debug!(type_name = %request.type_name, "reading data source");

        let response = data_source
            .read(
                ctx,
                ReadDataSourceRequest {
                    type_name: request.type_name,
                    config: config.clone(),
                    provider_meta: decode_optional(request.provider_meta.as_ref())?,
                    client_capabilities: client_capabilities_from_proto(
                        request.client_capabilities,
                    ),
                },
            )
            .await;
        diagnostics.extend(response.diagnostics);

        let state = if has_errors(&diagnostics) {
            config
        } else {
            finalize_state(schema, response.state)
        };

        Ok(Response::new(proto::read_data_source::Response {
            state: Some(encode_dynamic(&state)?),
            diagnostics: diagnostics_to_proto(&diagnostics),
        }))
    }

    async fn get_functions(
        &self,
        _request: Request<proto::get_functions::Request>,
    ) -> Result<Response<proto::get_functions::Response>, Status> {
        Ok(Response::new(proto::get_functions::Response {
            diagnostics: vec![],
        }))
    }

    async fn stop_provider(
        &self,
        _request: Request<proto::stop_provider::Request>,
    ) -> Result<Response<proto::stop_provider::Response>, Status> {
        tracing::info!("stop requested, cancelling in-flight requests");

        let response = {
            let provider = self.provider.read().await;
            provider.stop(self.root.child(), StopProviderRequest).await
        };
        self.root.cancel();

        Ok(Response::new(proto::stop_provider::Response {
            error: response.error.unwrap_or_default(),
        }))
    }
}

/// Result of planning a single resource change
pub struct PlannedChange {
    pub planned_state: DynamicValue,
    pub requires_replace: Vec<AttributePath>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Compute the planned state from Terraform's proposed new state
///
/// A null proposal plans a destroy. Otherwise defaults fill null optional
/// attributes, computed attributes without configuration become unknown on
/// create or when any configurable value changed, and plan modifiers run last.
pub fn plan_change(
    schema: &Schema,
    prior_state: &DynamicValue,
    proposed: DynamicValue,
    config: &DynamicValue,
) -> PlannedChange {
    let mut diagnostics = Vec::new();
    let mut requires_replace = Vec::new();

    if proposed.is_null() {
        return PlannedChange {
            planned_state: DynamicValue::null(),
            requires_replace,
            diagnostics,
        };
    }

    let creating = prior_state.is_null();
    let changed = creating || configurable_values_changed(&schema.block, prior_state, &proposed);
    let mut planned = proposed;

    for attr in &schema.block.attributes {
        let path = AttributePath::new(&attr.name);
        let config_value = value_at(config, &path);
        if !config_value.is_null() || !attr.computed {
            continue;
        }

        let result = if let Some(default) = &attr.default {
            let response = default.default_value(DefaultRequest { path: path.clone() });
            planned.set_value(&path, response.value.value)
        } else if changed {
            planned.mark_unknown(&path)
        } else {
            Ok(())
        };

        if let Err(e) = result {
            diagnostics.push(
                Diagnostic::error("Failed to plan attribute", e.to_string()).with_attribute(path),
            );
        }
    }

    for attr in &schema.block.attributes {
        if attr.plan_modifiers.is_empty() {
            continue;
        }
        let path = AttributePath::new(&attr.name);

        for modifier in &attr.plan_modifiers {
            let response = modifier.modify(PlanModifierRequest {
                config_value: DynamicValue::new(value_at(config, &path)),
                state_value: DynamicValue::new(value_at(prior_state, &path)),
                plan_value: DynamicValue::new(value_at(&planned, &path)),
                path: path.clone(),
            });
            diagnostics.extend(response.diagnostics);

            if let Err(e) = planned.set_value(&path, response.plan_value.value) {
                diagnostics.push(
                    Diagnostic::error("Failed to apply plan modifier", e.to_string())
                        .with_attribute(path.clone()),
                );
            }
            if response.requires_replace && !creating && !requires_replace.contains(&path) {
                requires_replace.push(path.clone());
            }
        }
    }

    PlannedChange {
        planned_state: planned,
        requires_replace,
        diagnostics,
    }
}

/// Check required attributes are present, then run attribute validators
pub fn validate_config(schema: &Schema, config: &DynamicValue) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    if config.is_null() || config.is_unknown() {
        return diagnostics;
    }

    for attr in &schema.block.attributes {
        let path = AttributePath::new(&attr.name);
        let value = value_at(config, &path);

        if value.is_null() {
            if attr.required {
                diagnostics.push(
                    Diagnostic::error(
                        "Missing required argument",
                        format!("The argument \"{}\" is required, but no definition was found.", attr.name),
                    )
                    .with_attribute(path),
                );
            }
            continue;
        }
        if !value.is_known() {
            continue;
        }

        for validator in &attr.validators {
            let response = validator.validate(ValidatorRequest {
                config_value: DynamicValue::new(value.clone()),
                path: path.clone(),
            });
            diagnostics.extend(response.diagnostics);
        }
    }

    diagnostics
}

fn configurable_values_changed(block: &Block, prior: &DynamicValue, proposed: &DynamicValue) -> bool {
    let attributes_changed = block
        .attributes
        .iter()
        .filter(|attr| attr.required || attr.optional)
        .any(|attr| {
            let path = AttributePath::new(&attr.name);
            prior.get(&path) != proposed.get(&path)
        });

    attributes_changed
        || block.block_types.iter().any(|nested| {
            let path = AttributePath::new(&nested.type_name);
            prior.get(&path) != proposed.get(&path)
        })
}

fn value_at(value: &DynamicValue, path: &AttributePath) -> Dynamic {
    value.get(path).cloned().unwrap_or(Dynamic::Null)
}

/// Shape provider output to the schema; unknowns cannot survive an apply
fn finalize_state(schema: &Schema, state: DynamicValue) -> DynamicValue {
    let state = schema.conform(state);
    DynamicValue::new(state.value.unknowns_to_null())
}

fn decode_dynamic(value: Option<&proto::DynamicValue>) -> Result<DynamicValue, Status> {
    let Some(value) = value else {
        return Ok(DynamicValue::null());
    };
    let decoded = if !value.msgpack.is_empty() {
        DynamicValue::decode_msgpack(&value.msgpack)?
    } else {
        DynamicValue::decode_json(&value.json)?
    };
    Ok(decoded)
}

fn decode_optional(value: Option<&proto::DynamicValue>) -> Result<Option<DynamicValue>, Status> {
    match value {
        Some(_) => decode_dynamic(value).map(|v| Some(v).filter(|v| !v.is_null())),
        None => Ok(None),
    }
}

fn encode_dynamic(value: &DynamicValue) -> Result<proto::DynamicValue, Status> {
    Ok(proto::DynamicValue {
        msgpack: value.encode_msgpack()?,
        json: Vec::new(),
    })
}

fn client_capabilities_from_proto(caps: Option<proto::ClientCapabilities>) -> ClientCapabilities {
    caps.map(|c| ClientCapabilities {
        deferral_allowed: c.deferral_allowed,
        write_only_attributes_allowed: c.write_only_attributes_allowed,
    })
    .unwrap_or_default()
}

fn server_capabilities_to_proto(caps: &ServerCapabilities) -> proto::ServerCapabilities {
    proto::ServerCapabilities {
        plan_destroy: caps.plan_destroy,
        get_provider_schema_optional: caps.get_provider_schema_optional,
        move_resource_state: caps.move_resource_state,
    }
}

fn diagnostics_to_proto(diagnostics: &[Diagnostic]) -> Vec<proto::Diagnostic> {
    diagnostics.iter().map(diagnostic_to_proto).collect()
}

fn diagnostic_to_proto(diagnostic: &Diagnostic) -> proto::Diagnostic {
    let severity = match diagnostic.severity {
        DiagnosticSeverity::Invalid => proto::diagnostic::Severity::Invalid,
        DiagnosticSeverity::Error => proto::diagnostic::Severity::Error,
        DiagnosticSeverity::Warning => proto::diagnostic::Severity::Warning,
    };

    proto::Diagnostic {
        severity: severity as i32,
        summary: diagnostic.summary.clone(),
        detail: diagnostic.detail.clone(),
        attribute: diagnostic.attribute.as_ref().map(path_to_proto),
    }
}

fn path_to_proto(path: &AttributePath) -> proto::AttributePath {
    use proto::attribute_path::{step::Selector, Step};

    proto::AttributePath {
        steps: path
            .steps
            .iter()
            .map(|step| Step {
                selector: Some(match step {
                    AttributePathStep::AttributeName(name) => Selector::AttributeName(name.clone()),
                    AttributePathStep::ElementKeyString(key) => {
                        Selector::ElementKeyString(key.clone())
                    }
                    AttributePathStep::ElementKeyInt(idx) => Selector::ElementKeyInt(*idx),
                }),
            })
            .collect(),
    }
}

fn string_kind_to_proto(kind: StringKind) -> i32 {
    match kind {
        StringKind::Plain => proto::StringKind::Plain as i32,
        StringKind::Markdown => proto::StringKind::Markdown as i32,
    }
}

fn schema_to_proto(schema: &Schema) -> proto::Schema {
    proto::Schema {
        version: schema.version,
        block: Some(block_to_proto(&schema.block)),
    }
}

fn block_to_proto(block: &Block) -> proto::schema::Block {
    proto::schema::Block {
        version: block.version,
        attributes: block.attributes.iter().map(attribute_to_proto).collect(),
        block_types: block.block_types.iter().map(nested_block_to_proto).collect(),
        description: block.description.clone(),
        description_kind: string_kind_to_proto(block.description_kind),
        deprecated: block.deprecated,
    }
}

fn attribute_to_proto(attr: &Attribute) -> proto::schema::Attribute {
    proto::schema::Attribute {
        name: attr.name.clone(),
        r#type: attr.r#type.to_bytes(),
        description: attr.description.clone(),
        required: attr.required,
        optional: attr.optional,
        computed: attr.computed,
        sensitive: attr.sensitive,
        description_kind: proto::StringKind::Plain as i32,
        deprecated: attr.deprecated,
    }
}

fn nested_block_to_proto(nested: &NestedBlock) -> proto::schema::NestedBlock {
    use proto::schema::nested_block::NestingMode as ProtoNesting;

    let nesting = match nested.nesting {
        NestingMode::Invalid => ProtoNesting::Invalid,
        NestingMode::Single => ProtoNesting::Single,
        NestingMode::List => ProtoNesting::List,
        NestingMode::Set => ProtoNesting::Set,
        NestingMode::Map => ProtoNesting::Map,
        NestingMode::Group => ProtoNesting::Group,
    };

    proto::schema::NestedBlock {
        type_name: nested.type_name.clone(),
        block: Some(block_to_proto(&nested.block)),
        nesting: nesting as i32,
        min_items: nested.min_items,
        max_items: nested.max_items,
    }
}

//! Protocol buffer types for Terraform Plugin Protocol v6
//!
//! Generated at build time by tonic-build from `proto/tfplugin6.proto`.
//! Several generated types share names with framework types (`DynamicValue`,
//! `Diagnostic`, `Schema`), so refer to them through the `proto::` prefix.
//!
//! RPC messages live in snake_case modules, e.g. `read_resource::Request`.

include!(concat!(env!("OUT_DIR"), "/tfplugin6.rs"));

pub use provider_server::{Provider as ProviderService, ProviderServer};

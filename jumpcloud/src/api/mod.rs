//! JumpCloud REST API client
//!
//! `Client::do_request` is the only place HTTP happens. The area modules
//! below wrap it with typed request/response structs for each endpoint.

pub mod automation;
pub mod client;
pub mod common;
pub mod directory;
pub mod error;
pub mod integrations;
pub mod pool;
pub mod security;

pub use client::{Client, RetryConfig, DEFAULT_API_URL};
pub use common::{
    ApiQueryParams, Filter, FilterOperator, FilterSyntax, JumpCloudApiResource, ListOptions,
    PagedResponse, SortField,
};
pub use error::{ApiError, ErrorClass};

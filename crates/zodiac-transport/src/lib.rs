//! Zodiac Transport Layer
//!
//! Network access to the Zodiac OS provisioning service.
//!
//! This crate provides:
//! - [`http`]: request/response model and the [`Transport`] trait
//! - [`agent`]: the default blocking transport on a `ureq` agent
//! - [`api`]: the endpoint client and its wire types
//! - [`error`]: request and API errors, including error-envelope decoding
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use zodiac_transport::{ApiClient, UreqTransport, DEFAULT_BASE_URL};
//!
//! let client = ApiClient::new(DEFAULT_BASE_URL, "my-workspace", "sk-…", Arc::new(UreqTransport::new()));
//! let vaults = client.list_vaults()?;
//! ```

pub mod agent;
pub mod api;
pub mod error;
pub mod http;

pub use agent::UreqTransport;
pub use api::{
    ApiClient, ApplyResponse, ConstellationPayload, DerivedAddress, ResolveResponse, Vault,
    DEFAULT_BASE_URL,
};
pub use error::{ApiError, RequestError};
pub use http::{HttpRequest, HttpResponse, Method, Transport, TransportError};

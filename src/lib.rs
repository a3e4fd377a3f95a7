//! Zodiac OS constellation SDK
//!
//! Describe a constellation of Safe, Roles and Delay accounts, resolve it
//! against what is already deployed, and submit it for provisioning:
//!
//! - **Account model**: authored entries and resolved accounts, see [`zodiac_types`]
//! - **Resolution**: refs, merge and normalization, see [`zodiac_resolver`]
//! - **Transport**: the provisioning service API, see [`zodiac_transport`]
//! - **Client**: [`Client`] ties the three together
//!
//! # Example
//!
//! ```ignore
//! use zodiac_sdk::{AccountSpec, Client, ClientOptions};
//!
//! let client = Client::new(ClientOptions::new().workspace("acme").api_key("sk-…"))?;
//! let specs: Vec<AccountSpec> = serde_json::from_str(&std::fs::read_to_string("constellation.json")?)?;
//! let applied = client.apply_constellation(&specs)?;
//! println!("review at {}", applied.url);
//! ```

pub mod client;
pub mod config;
pub mod error;

pub use client::{ApplyResult, Client, ResolvedResult};
pub use config::{ClientConfig, ClientOptions, ConfigError, DEFAULT_SOURCE};
pub use error::{ClientError, Result};

pub use zodiac_transport::{
    HttpRequest, HttpResponse, Method, RequestError, Transport, TransportError, UreqTransport,
    Vault, DEFAULT_BASE_URL,
};
pub use zodiac_types::{Account, AccountKind, AccountSpec, Address, Chain};

pub use zodiac_resolver;
pub use zodiac_transport;
pub use zodiac_types;

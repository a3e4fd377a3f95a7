//! The constellation client.
//!
//! [`Client::resolve_constellation`] runs the full pipeline:
//! 1. validate the authored batch locally
//! 2. `POST …/constellation/resolve` for derived addresses and current state
//! 3. resolve refs, merge onto the current state, normalize
//!
//! [`Client::apply_constellation`] does the same and then submits the
//! resolved accounts to `POST …/constellation/apply`.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use zodiac_resolver::resolve_batch;
use zodiac_transport::{ApiClient, Vault};
use zodiac_types::{validate_batch, Account, AccountSpec};

use crate::config::{ClientConfig, ClientOptions, ConfigError};
use crate::error::Result;

/// Fully addressed, fully populated accounts in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedResult {
    pub accounts: Vec<Account>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplyResult {
    /// Where the submitted transactions can be reviewed and signed.
    pub url: Url,
    pub transactions: Vec<Value>,
    /// The accounts that were submitted.
    pub accounts: Vec<Account>,
}

#[derive(Debug)]
pub struct Client {
    api: ApiClient,
    source: String,
}

impl Client {
    /// Build a client, filling unset options from the environment.
    pub fn new(options: ClientOptions) -> std::result::Result<Self, ConfigError> {
        let config = ClientConfig::resolve(options)?;
        Ok(Self::from_config(config))
    }

    /// Build a client purely from `ZODIAC_OS_*` environment variables.
    pub fn from_env() -> std::result::Result<Self, ConfigError> {
        Self::new(ClientOptions::default())
    }

    pub fn from_config(config: ClientConfig) -> Self {
        debug!(
            base_url = %config.base_url,
            workspace = %config.workspace,
            source = %config.source,
            "zodiac client configured"
        );
        let api = ApiClient::new(
            &config.base_url,
            &config.workspace,
            &config.api_key,
            config.transport,
        )
        .with_headers(config.headers);
        Self {
            api,
            source: config.source,
        }
    }

    pub fn workspace(&self) -> &str {
        self.api.workspace()
    }

    pub fn base_url(&self) -> &str {
        self.api.base_url()
    }

    /// Resolve `specs` into the accounts `apply_constellation` would submit.
    pub fn resolve_constellation(&self, specs: &[AccountSpec]) -> Result<ResolvedResult> {
        let batch = validate_batch(specs)?;
        debug!(entries = batch.len(), refs = batch.refs.len(), "validated constellation");

        let response = self.api.resolve(specs, Some(self.source.as_str()))?;
        debug!(
            derived = response.derived.len(),
            current = response.current.len(),
            "received resolve response"
        );

        let accounts = resolve_batch(&batch, &response.derived_addresses(), &response.current)?;
        Ok(ResolvedResult { accounts })
    }

    /// Resolve `specs` and submit the result for provisioning.
    pub fn apply_constellation(&self, specs: &[AccountSpec]) -> Result<ApplyResult> {
        let ResolvedResult { accounts } = self.resolve_constellation(specs)?;
        let response = self.api.apply(&accounts, Some(self.source.as_str()))?;
        info!(
            accounts = accounts.len(),
            transactions = response.transactions.len(),
            url = %response.url,
            "constellation submitted"
        );
        Ok(ApplyResult {
            url: response.url,
            transactions: response.transactions,
            accounts,
        })
    }

    pub fn list_vaults(&self) -> Result<Vec<Vault>> {
        Ok(self.api.list_vaults()?)
    }
}

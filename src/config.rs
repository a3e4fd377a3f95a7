//! Client configuration.
//!
//! Every setting is taken from the explicit [`ClientOptions`] first, then from
//! the environment:
//!
//! | Setting   | Environment variable  | Default                  |
//! |-----------|-----------------------|--------------------------|
//! | workspace | `ZODIAC_OS_WORKSPACE` | none, required           |
//! | API key   | `ZODIAC_OS_API_KEY`   | none, required           |
//! | base URL  | `ZODIAC_OS_BASE_URL`  | [`DEFAULT_BASE_URL`]     |
//!
//! Empty or whitespace-only values count as missing.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use url::Url;

use zodiac_transport::{Transport, UreqTransport, DEFAULT_BASE_URL};

pub const WORKSPACE_ENV: &str = "ZODIAC_OS_WORKSPACE";
pub const API_KEY_ENV: &str = "ZODIAC_OS_API_KEY";
pub const BASE_URL_ENV: &str = "ZODIAC_OS_BASE_URL";

/// Source tag sent with every constellation request unless overridden.
pub const DEFAULT_SOURCE: &str = "sdk";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing workspace: pass one explicitly or set {WORKSPACE_ENV}")]
    MissingWorkspace,

    #[error("missing API key: pass one explicitly or set {API_KEY_ENV}")]
    MissingApiKey,

    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: &'static str },

    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Caller-supplied settings. Anything left `None` falls back to the
/// environment or the default.
#[derive(Clone, Default)]
pub struct ClientOptions {
    pub workspace: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub transport: Option<Arc<dyn Transport>>,
    /// Extra headers sent with every request.
    pub headers: Vec<(String, String)>,
    pub source: Option<String>,
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("workspace", &self.workspace)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("transport", &self.transport.as_ref().map(|_| "<custom>"))
            .field("headers", &self.headers)
            .field("source", &self.source)
            .finish()
    }
}

impl ClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn workspace(mut self, workspace: impl Into<String>) -> Self {
        self.workspace = Some(workspace.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Settings after explicit values, environment and defaults are combined.
#[derive(Clone)]
pub struct ClientConfig {
    pub workspace: String,
    pub api_key: String,
    /// Without a trailing `/`.
    pub base_url: String,
    pub transport: Arc<dyn Transport>,
    pub headers: Vec<(String, String)>,
    pub source: String,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("workspace", &self.workspace)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("headers", &self.headers)
            .field("source", &self.source)
            .finish()
    }
}

impl ClientConfig {
    /// Combine `options` with the process environment.
    pub fn resolve(options: ClientOptions) -> Result<Self, ConfigError> {
        Self::resolve_with(options, |key| std::env::var(key).ok())
    }

    /// Combine `options` with values from `lookup` instead of the process
    /// environment.
    pub fn resolve_with(
        options: ClientOptions,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let setting = |explicit: Option<String>, key: &str| {
            non_blank(explicit).or_else(|| non_blank(lookup(key)))
        };

        let workspace =
            setting(options.workspace, WORKSPACE_ENV).ok_or(ConfigError::MissingWorkspace)?;
        let api_key = setting(options.api_key, API_KEY_ENV).ok_or(ConfigError::MissingApiKey)?;
        let base_url = setting(options.base_url, BASE_URL_ENV)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = check_base_url(&base_url)?;

        for (name, value) in &options.headers {
            check_header(name, value)?;
        }

        let transport = options
            .transport
            .unwrap_or_else(|| Arc::new(UreqTransport::new()));
        let source = non_blank(options.source).unwrap_or_else(|| DEFAULT_SOURCE.to_string());

        Ok(Self {
            workspace,
            api_key,
            base_url,
            transport,
            headers: options.headers,
            source,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim_end_matches('/');
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(trimmed).map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }
    Ok(trimmed.to_string())
}

fn check_header(name: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = |reason| ConfigError::InvalidHeader {
        name: name.to_string(),
        reason,
    };
    if name.is_empty() {
        return Err(invalid("empty name"));
    }
    // RFC 7230 token characters.
    let token = |c: char| c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c);
    if !name.chars().all(token) {
        return Err(invalid("name is not a valid token"));
    }
    if value.chars().any(|c| c == '\r' || c == '\n' || c == '\0') {
        return Err(invalid("value contains a control character"));
    }
    if name.eq_ignore_ascii_case("authorization") {
        return Err(invalid("authorization is set from the API key"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_explicit_values_win_over_environment() {
        let options = ClientOptions::new().workspace("explicit").api_key("sk-explicit");
        let config = ClientConfig::resolve_with(
            options,
            env(&[(WORKSPACE_ENV, "from-env"), (API_KEY_ENV, "sk-env")]),
        )
        .unwrap();
        assert_eq!(config.workspace, "explicit");
        assert_eq!(config.api_key, "sk-explicit");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.source, DEFAULT_SOURCE);
    }

    #[test]
    fn test_environment_fallback() {
        let config = ClientConfig::resolve_with(
            ClientOptions::new(),
            env(&[
                (WORKSPACE_ENV, "acme"),
                (API_KEY_ENV, "sk-env"),
                (BASE_URL_ENV, "http://localhost:3000/api/v1/"),
            ]),
        )
        .unwrap();
        assert_eq!(config.workspace, "acme");
        assert_eq!(config.api_key, "sk-env");
        assert_eq!(config.base_url, "http://localhost:3000/api/v1");
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let options = ClientOptions::new().workspace("   ").api_key("sk");
        let err = ClientConfig::resolve_with(options, env(&[(WORKSPACE_ENV, "")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingWorkspace);

        let options = ClientOptions::new().workspace("acme").api_key("");
        let err = ClientConfig::resolve_with(options, env(&[(API_KEY_ENV, " \t")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingApiKey);
    }

    #[test]
    fn test_invalid_base_url() {
        let options = ClientOptions::new()
            .workspace("acme")
            .api_key("sk")
            .base_url("ftp://example.com");
        let err = ClientConfig::resolve_with(options, env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }));

        let options = ClientOptions::new()
            .workspace("acme")
            .api_key("sk")
            .base_url("not a url");
        assert!(ClientConfig::resolve_with(options, env(&[])).is_err());
    }

    #[test]
    fn test_invalid_headers() {
        let base = ClientOptions::new().workspace("acme").api_key("sk");

        let err = ClientConfig::resolve_with(base.clone().header("x trace", "1"), env(&[]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHeader { .. }));

        let err = ClientConfig::resolve_with(base.clone().header("x-trace", "a\r\nb"), env(&[]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHeader { .. }));

        let err = ClientConfig::resolve_with(base.clone().header("Authorization", "x"), env(&[]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHeader { .. }));

        let config = ClientConfig::resolve_with(base.header("x-trace", "abc"), env(&[])).unwrap();
        assert_eq!(config.headers, vec![("x-trace".to_string(), "abc".to_string())]);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let options = ClientOptions::new().workspace("acme").api_key("sk-secret");
        assert!(!format!("{options:?}").contains("sk-secret"));
        let config = ClientConfig::resolve_with(options, env(&[])).unwrap();
        assert!(!format!("{config:?}").contains("sk-secret"));
    }
}

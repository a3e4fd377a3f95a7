//! Client for the provisioning service endpoints.
//!
//! ## Endpoints
//! - `POST {base}/workspace/{workspace}/constellation/resolve`
//! - `POST {base}/workspace/{workspace}/constellation/apply`
//! - `GET  {base}/workspace/{workspace}/vaults`
//!
//! Every request carries `Authorization: Bearer <key>` and the caller's extra
//! headers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use zodiac_types::{Account, AccountSpec, Address};

use crate::error::{ApiError, RequestError, Result};
use crate::http::{HttpRequest, Method, Transport};

pub const DEFAULT_BASE_URL: &str = "https://app.pilot.gnosisguild.org/api/v1";

/// Request body of both constellation endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ConstellationPayload<'a, T> {
    pub accounts: &'a [T],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<&'a str>,
}

/// Address the service derived for the new entry at `index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedAddress {
    pub index: usize,
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveResponse {
    #[serde(default)]
    pub derived: Vec<DerivedAddress>,
    /// Current state of every already deployed account the batch touches.
    #[serde(default)]
    pub current: Vec<Account>,
}

impl ResolveResponse {
    pub fn derived_addresses(&self) -> HashMap<usize, Address> {
        self.derived
            .iter()
            .map(|d| (d.index, d.address.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyResponse {
    /// Where the submitted transactions can be reviewed and signed.
    pub url: Url,
    #[serde(default)]
    pub transactions: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    pub id: String,
    pub label: String,
}

pub struct ApiClient {
    base_url: String,
    workspace: String,
    api_key: String,
    headers: Vec<(String, String)>,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("workspace", &self.workspace)
            .field("api_key", &"<redacted>")
            .field("headers", &self.headers.len())
            .finish()
    }
}

impl ApiClient {
    /// Create a client. A trailing `/` on `base_url` is dropped.
    pub fn new(
        base_url: &str,
        workspace: &str,
        api_key: &str,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            workspace: workspace.to_string(),
            api_key: api_key.to_string(),
            headers: Vec::new(),
            transport,
        }
    }

    /// Extra headers sent with every request.
    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/workspace/{}/{}", self.base_url, self.workspace, path)
    }

    fn request(&self, method: Method, url: String) -> HttpRequest {
        let mut request = HttpRequest::new(method, url);
        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if method == Method::Post {
            request = request.header("content-type", "application/json");
        }
        request.header("Authorization", format!("Bearer {}", self.api_key))
    }

    fn execute<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T> {
        let url = request.url.clone();
        debug!(method = request.method.as_str(), url = %url, "api request");

        let response = self.transport.send(request).map_err(|err| {
            warn!(url = %url, error = %err, "api transport failure");
            ApiError::from(err)
        })?;

        if !response.is_success() {
            let err = RequestError::from_response(&response);
            warn!(
                url = %url,
                status = err.status,
                code = err.code.as_deref().unwrap_or("-"),
                "api request rejected: {}",
                err.message
            );
            return Err(err.into());
        }

        response
            .json()
            .map_err(|source| ApiError::Decode { url, source })
    }

    fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.endpoint(path);
        let body = serde_json::to_vec(body).map_err(|source| ApiError::Encode {
            url: url.clone(),
            source,
        })?;
        self.execute(self.request(Method::Post, url).body(body))
    }

    /// Ask the service for derived addresses and current state.
    pub fn resolve(
        &self,
        accounts: &[AccountSpec],
        source: Option<&str>,
    ) -> Result<ResolveResponse> {
        self.post("constellation/resolve", &ConstellationPayload { accounts, source })
    }

    /// Submit resolved accounts for provisioning.
    pub fn apply(&self, accounts: &[Account], source: Option<&str>) -> Result<ApplyResponse> {
        self.post("constellation/apply", &ConstellationPayload { accounts, source })
    }

    pub fn list_vaults(&self) -> Result<Vec<Vault>> {
        let url = self.endpoint("vaults");
        self.execute(self.request(Method::Get, url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use serde_json::json;

    use crate::http::{HttpResponse, TransportError};

    type Log = Arc<Mutex<Vec<HttpRequest>>>;

    fn client(response: HttpResponse) -> (ApiClient, Log) {
        let log: Log = Arc::default();
        let seen = log.clone();
        let transport =
            move |request: HttpRequest| -> std::result::Result<HttpResponse, TransportError> {
                seen.lock().unwrap().push(request);
                Ok(response.clone())
            };
        let base_url = "https://api.example.com/v1/";
        let client = ApiClient::new(base_url, "acme", "sk-test", Arc::new(transport))
            .with_headers(vec![("x-trace".to_string(), "abc".to_string())]);
        (client, log)
    }

    #[test]
    fn test_resolve_request_shape() {
        let (client, log) = client(HttpResponse::json_body(
            200,
            "OK",
            &json!({
                "derived": [{ "index": 0, "address": "0x1111111111111111111111111111111111111111" }]
            }),
        ));
        let specs: Vec<AccountSpec> = serde_json::from_value(json!([
            { "type": "SAFE", "chain": "eth", "nonce": "1", "threshold": 1, "owners": ["$me"], "modules": [] }
        ]))
        .unwrap();

        let response = client.resolve(&specs, Some("sdk")).unwrap();
        assert_eq!(response.derived_addresses().len(), 1);
        assert!(response.current.is_empty());

        let requests = log.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, "https://api.example.com/v1/workspace/acme/constellation/resolve");
        assert_eq!(request.header_value("authorization"), Some("Bearer sk-test"));
        assert_eq!(request.header_value("Content-Type"), Some("application/json"));
        assert_eq!(request.header_value("x-trace"), Some("abc"));

        let body: Value = serde_json::from_slice(request.body.as_ref().unwrap()).unwrap();
        assert_eq!(body["source"], "sdk");
        assert_eq!(body["accounts"][0]["owners"][0], "$me");
        assert_eq!(body["accounts"][0]["nonce"], "1");
    }

    #[test]
    fn test_error_envelope_surfaces_as_request_error() {
        let (client, _) = client(HttpResponse::json_body(
            401,
            "Unauthorized",
            &json!({ "error": { "code": "UNAUTHORIZED", "message": "invalid api key" } }),
        ));
        let err = client.list_vaults().unwrap_err();
        assert_eq!(err.status(), Some(401));
        let ApiError::Request(request) = err else {
            panic!("expected request error");
        };
        assert_eq!(request.code.as_deref(), Some("UNAUTHORIZED"));
    }

    #[test]
    fn test_list_vaults_is_a_get_without_body() {
        let (client, log) = client(HttpResponse::json_body(
            200,
            "OK",
            &json!([{ "id": "v_1", "label": "Main Treasury" }]),
        ));
        let vaults = client.list_vaults().unwrap();
        assert_eq!(vaults[0].label, "Main Treasury");

        let requests = log.lock().unwrap();
        assert_eq!(requests[0].method, Method::Get);
        assert!(requests[0].body.is_none());
        assert_eq!(requests[0].header_value("content-type"), None);
    }

    #[test]
    fn test_malformed_success_body_is_a_decode_error() {
        let body = json!({ "url": "not a url" });
        let (client, _) = client(HttpResponse::json_body(200, "OK", &body));
        let err = client.apply(&[], None).unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_transport_failure_passes_through() {
        let failing = |request: HttpRequest| -> std::result::Result<HttpResponse, TransportError> {
            Err(TransportError::Connection {
                url: request.url,
                message: "connection refused".to_string(),
            })
        };
        let client = ApiClient::new(DEFAULT_BASE_URL, "acme", "sk", Arc::new(failing));
        let err = client.list_vaults().unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert!(err.to_string().contains("connection refused"));
    }
}

//! Blocking [`Transport`] backed by a `ureq` agent.

use std::io::Read;
use std::time::Duration;

use tracing::debug;

use crate::http::{HttpRequest, HttpResponse, Transport, TransportError};

pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// Default request timeout in seconds (can be overridden by env).
    const DEFAULT_TIMEOUT_SECS: u64 = 30;
    /// Default connect timeout in seconds (can be overridden by env).
    const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

    fn default_timeouts() -> (Duration, Duration) {
        let timeout_secs = std::env::var("ZODIAC_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(Self::DEFAULT_TIMEOUT_SECS);
        let connect_secs = std::env::var("ZODIAC_HTTP_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(Self::DEFAULT_CONNECT_TIMEOUT_SECS);
        (
            Duration::from_secs(timeout_secs),
            Duration::from_secs(connect_secs),
        )
    }

    fn build_agent(timeout: Duration, connect_timeout: Duration) -> ureq::Agent {
        ureq::AgentBuilder::new()
            .timeout(timeout)
            .timeout_connect(connect_timeout)
            .build()
    }

    /// Create a transport with timeouts from the environment.
    pub fn new() -> Self {
        let (timeout, connect_timeout) = Self::default_timeouts();
        Self::with_timeouts(timeout, connect_timeout)
    }

    /// Create a transport with explicit timeouts.
    pub fn with_timeouts(timeout: Duration, connect_timeout: Duration) -> Self {
        Self {
            agent: Self::build_agent(timeout, connect_timeout),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut call = self.agent.request(request.method.as_str(), &request.url);
        for (name, value) in &request.headers {
            call = call.set(name, value);
        }

        let result = match &request.body {
            Some(body) => call.send_bytes(body),
            None => call.call(),
        };
        // ureq reports 4xx/5xx as errors; callers want them as responses.
        let response = match result {
            Ok(response) | Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(err)) => {
                return Err(TransportError::Connection {
                    url: request.url,
                    message: err.to_string(),
                })
            }
        };

        let status = response.status();
        let status_text = response.status_text().to_string();
        let headers = response
            .headers_names()
            .into_iter()
            .filter_map(|name| {
                let value = response.header(&name)?.to_string();
                Some((name, value))
            })
            .collect();

        let mut body = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|source| TransportError::Body {
                url: request.url.clone(),
                source,
            })?;

        debug!(
            method = request.method.as_str(),
            url = %request.url,
            status,
            bytes = body.len(),
            "http response"
        );
        Ok(HttpResponse {
            status,
            status_text,
            headers,
            body,
        })
    }
}

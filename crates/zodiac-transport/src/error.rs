//! Error types for the API client.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::http::{HttpResponse, TransportError};

/// A non-2xx response from the provisioning service.
///
/// Built by probing the response in order:
/// 1. JSON content type with an `{ "error": { code, message, details } }`
///    envelope: the server's own code, message and details
/// 2. a readable, non-empty text body: `Unexpected error: <text>`
/// 3. otherwise: `Unexpected error: <status> <status text>`
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} (HTTP {status})")]
pub struct RequestError {
    pub status: u16,
    pub status_text: String,
    pub code: Option<String>,
    pub message: String,
    pub details: Option<Value>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    message: String,
    #[serde(default)]
    details: Option<Value>,
}

impl RequestError {
    pub fn from_response(response: &HttpResponse) -> Self {
        let envelope = if response.is_json() {
            response.json::<ErrorEnvelope>().ok()
        } else {
            None
        };

        let (code, message, details) = match envelope {
            Some(ErrorEnvelope { error }) => (error.code, error.message, error.details),
            None => {
                let message = match response.text().map(str::trim) {
                    Ok(text) if !text.is_empty() => format!("Unexpected error: {text}"),
                    _ => format!(
                        "Unexpected error: {} {}",
                        response.status, response.status_text
                    ),
                };
                (None, message, None)
            }
        };

        Self {
            status: response.status,
            status_text: response.status_text.clone(),
            code,
            message,
            details,
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("failed to encode request body for {url}: {source}")]
    Encode {
        url: String,
        source: serde_json::Error,
    },

    #[error("unexpected response body from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },
}

impl ApiError {
    /// HTTP status, when the service answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Request(err) => Some(err.status),
            _ => None,
        }
    }
}

/// Result type for API operations
pub type Result<T> = std::result::Result<T, ApiError>;

use thiserror::Error;

use zodiac_resolver::{EngineError, MergeError, ResolveError};
use zodiac_transport::{ApiError, RequestError};
use zodiac_types::ValidationError;

use crate::config::ConfigError;

/// Everything a [`Client`](crate::Client) call can fail with.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid constellation: {0}")]
    Validation(#[from] ValidationError),

    #[error("cannot resolve constellation: {0}")]
    Resolve(#[from] ResolveError),

    #[error("cannot merge constellation: {0}")]
    Merge(#[from] MergeError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl From<EngineError> for ClientError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Resolve(err) => ClientError::Resolve(err),
            EngineError::Merge(err) => ClientError::Merge(err),
        }
    }
}

impl ClientError {
    /// HTTP status, when the service rejected the request.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api(err) => err.status(),
            _ => None,
        }
    }

    /// The service's error details, when it rejected the request.
    pub fn request(&self) -> Option<&RequestError> {
        match self {
            ClientError::Api(ApiError::Request(err)) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

//! Error types for the biometric service.
//!
//! Every workflow returns [`BiometricError`]; the HTTP layer maps variants to
//! status codes and a `{error, code}` JSON body.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::ckks::CkksError;

#[derive(Error, Debug)]
pub enum BiometricError {
    #[error("Failed to load encryption context: {0}")]
    ContextLoad(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Corrupt template: {0}")]
    Codec(String),

    #[error("Template store unavailable: {0}")]
    StoreIo(String),

    #[error("Encryption engine error: {0}")]
    Engine(#[from] CkksError),

    #[error("Msgpack decode error: {0}")]
    MsgpackDecode(#[from] rmp_serde::decode::Error),

    #[error("Msgpack encode error: {0}")]
    MsgpackEncode(#[from] rmp_serde::encode::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Hint sent with retryable failures.
const RETRY_AFTER_SECS: &str = "1";

pub type BiometricResult<T> = Result<T, BiometricError>;

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

impl BiometricError {
    fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::ContextLoad(_) => Some("CONTEXT_LOAD_ERROR"),
            Self::InvalidInput(_) => Some("INVALID_INPUT"),
            Self::Codec(_) => Some("CODEC_ERROR"),
            Self::StoreIo(_) => Some("STORE_IO_ERROR"),
            Self::Engine(err) if err.is_caller_error() => Some("INVALID_VECTOR"),
            Self::Engine(_) => Some("ENGINE_ERROR"),
            Self::MsgpackDecode(_) | Self::Io(_) => Some("INVALID_PAYLOAD"),
            Self::MsgpackEncode(_) | Self::Internal(_) => None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) | Self::MsgpackDecode(_) | Self::Io(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Engine(err) if err.is_caller_error() => StatusCode::BAD_REQUEST,
            Self::StoreIo(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::ContextLoad(_)
            | Self::Codec(_)
            | Self::Engine(_)
            | Self::MsgpackEncode(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Transient failures a caller may retry unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreIo(_))
    }
}

impl IntoResponse for BiometricError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: self.error_code(),
        });

        if self.is_retryable() {
            return (status, [(header::RETRY_AFTER, RETRY_AFTER_SECS)], body).into_response();
        }
        (status, body).into_response()
    }
}

impl From<redb::Error> for BiometricError {
    fn from(err: redb::Error) -> Self {
        Self::StoreIo(err.to_string())
    }
}

impl From<redb::DatabaseError> for BiometricError {
    fn from(err: redb::DatabaseError) -> Self {
        Self::StoreIo(err.to_string())
    }
}

impl From<redb::TableError> for BiometricError {
    fn from(err: redb::TableError) -> Self {
        Self::StoreIo(err.to_string())
    }
}

impl From<redb::TransactionError> for BiometricError {
    fn from(err: redb::TransactionError) -> Self {
        Self::StoreIo(err.to_string())
    }
}

impl From<redb::CommitError> for BiometricError {
    fn from(err: redb::CommitError) -> Self {
        Self::StoreIo(err.to_string())
    }
}

impl From<redb::StorageError> for BiometricError {
    fn from(err: redb::StorageError) -> Self {
        Self::StoreIo(err.to_string())
    }
}

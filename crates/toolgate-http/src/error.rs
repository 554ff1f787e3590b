//! HTTP error mapping
//!
//! Only transport-level failures become non-2xx responses. Tool errors are
//! ordinary `200 OK` results with `isError: true`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for server lifecycle operations
pub type HttpResult<T> = Result<T, HttpError>;

/// Machine-readable error codes carried in [`ErrorResponse::error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Body was not valid JSON or did not have the expected shape
    MalformedRequest,
    /// Body exceeded the configured size limit
    PayloadTooLarge,
    /// Wrong or missing content type
    UnsupportedMediaType,
    /// Unexpected server-side failure
    InternalError,
}

/// JSON body of every non-2xx response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorCode,
    pub message: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorResponse {
    pub fn new(error: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error,
            message: message.into(),
            timestamp: chrono::Utc::now(),
        }
    }
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("{message}")]
    Rejected {
        status: StatusCode,
        code: ErrorCode,
        message: String,
    },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

impl HttpError {
    pub fn malformed(message: impl Into<String>) -> Self {
        HttpError::Rejected {
            status: StatusCode::BAD_REQUEST,
            code: ErrorCode::MalformedRequest,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            HttpError::Rejected { status, .. } => *status,
            HttpError::Bind { .. } | HttpError::Serve(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> ErrorCode {
        match self {
            HttpError::Rejected { code, .. } => *code,
            HttpError::Bind { .. } | HttpError::Serve(_) => ErrorCode::InternalError,
        }
    }
}

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        let status = rejection.status();
        let code = match rejection {
            JsonRejection::MissingJsonContentType(_) => ErrorCode::UnsupportedMediaType,
            _ if status == StatusCode::PAYLOAD_TOO_LARGE => ErrorCode::PayloadTooLarge,
            _ => ErrorCode::MalformedRequest,
        };
        // Syntax and shape errors both count as malformed input.
        let status = match code {
            ErrorCode::MalformedRequest => StatusCode::BAD_REQUEST,
            _ => status,
        };
        HttpError::Rejected {
            status,
            code,
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        tracing::warn!(
            status_code = %status,
            error_code = ?code,
            error_message = %self,
            "Rejecting HTTP request"
        );

        (status, Json(ErrorResponse::new(code, self.to_string()))).into_response()
    }
}

//! # Gateway Errors
//!
//! Failure translation for every route, plus server lifecycle errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::sessions::{SessionError, SessionErrorKind};
use crate::store::StoreError;

/// Result type for route handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Error returned by a route handler.
///
/// Converting it into a response logs the full error and sends the caller
/// a plain-text message with a status derived from the error kind.
#[derive(Debug)]
pub struct ApiError(pub SessionError);

impl ApiError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self.0.kind() {
            SessionErrorKind::InvalidSession => StatusCode::BAD_REQUEST,
            SessionErrorKind::NotFound => StatusCode::NOT_FOUND,
            SessionErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        error!(code = self.0.kind().code(), status = status.as_u16(), "{}", self.0);
        (status, self.0.to_string()).into_response()
    }
}

/// Errors that stop the server
#[derive(Debug, Error)]
pub enum ServerError {
    /// The store never answered during startup
    #[error("Could not connect to store on start: {0}")]
    StoreUnavailable(#[source] StoreError),

    /// The configured address does not parse
    #[error("Invalid listen address {0}")]
    InvalidAddress(String),

    /// The listener could not be bound
    #[error("Could not bind listener: {0}")]
    Bind(#[source] std::io::Error),

    /// The accept loop failed
    #[error("Error starting server: {0}")]
    Serve(#[source] std::io::Error),
}

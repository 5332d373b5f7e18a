//! Session error types
//!
//! Every failure carries a [`SessionErrorKind`] plus the context lines added
//! by each layer it crossed. The kind never changes while context is added,
//! so callers can still tell a missing session from a broken store.

use std::fmt;

use crate::store::StoreError;

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// What went wrong, independent of where
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionErrorKind {
    /// The request or record is malformed
    InvalidSession,
    /// No session is stored under the id
    NotFound,
    /// The store failed or returned undecodable data
    Storage,
}

impl SessionErrorKind {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidSession => "INVALID_SESSION",
            Self::NotFound => "SESSION_NOT_FOUND",
            Self::Storage => "STORAGE_ERROR",
        }
    }
}

/// Session error with a kind and a context chain
#[derive(Debug, Clone)]
pub struct SessionError {
    kind: SessionErrorKind,
    message: String,
    /// Innermost first
    context: Vec<String>,
}

impl SessionError {
    /// Create a new session error
    pub fn new(kind: SessionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: Vec::new(),
        }
    }

    /// Malformed request or record
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::new(SessionErrorKind::InvalidSession, msg)
    }

    /// Session does not exist
    pub fn not_found() -> Self {
        Self::new(
            SessionErrorKind::NotFound,
            "Could not find the requested session",
        )
    }

    /// Store failure
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::new(SessionErrorKind::Storage, msg)
    }

    /// Wrap with one more line of context
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> SessionErrorKind {
        self.kind
    }

    /// The innermost message, without context
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Context lines, outermost first
    pub fn context_chain(&self) -> impl Iterator<Item = &str> {
        self.context.iter().rev().map(String::as_str)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == SessionErrorKind::NotFound
    }

    pub fn is_storage(&self) -> bool {
        self.kind == SessionErrorKind::Storage
    }

    pub fn is_invalid(&self) -> bool {
        self.kind == SessionErrorKind::InvalidSession
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for context in self.context_chain() {
            write!(f, "{}: ", context)?;
        }
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SessionError {}

impl From<StoreError> for SessionError {
    fn from(e: StoreError) -> Self {
        Self::storage(e.to_string())
    }
}

/// Attach context to any result whose error converts into [`SessionError`]
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> SessionResult<T>;

    fn with_context<C, F>(self, f: F) -> SessionResult<T>
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<T, E: Into<SessionError>> ResultExt<T> for Result<T, E> {
    fn context(self, context: impl Into<String>) -> SessionResult<T> {
        self.map_err(|e| e.into().context(context))
    }

    fn with_context<C, F>(self, f: F) -> SessionResult<T>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|e| e.into().context(f()))
    }
}

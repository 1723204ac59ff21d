//! Error types for tokengate.
//!
//! This module provides a unified error type with explicit variants for
//! transport, authentication, protocol, input validation and storage errors.

use std::fmt;
use thiserror::Error;

/// The unified error type for tokengate operations.
///
/// Every failure a caller of the request pipeline can observe surfaces as
/// one of these variants. Only [`AuthError::CredentialExpired`] is ever
/// intercepted by the pipeline itself; everything else is returned as-is.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (DNS, TLS, connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Authentication errors (expired or refused credentials, terminated session).
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Non-success responses that are not credential failures.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Input validation errors (API URL, headers, JSON bodies).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// Credential persistence errors.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl Error {
    /// Returns the authentication error, if this is one.
    pub fn as_auth(&self) -> Option<&AuthError> {
        match self {
            Error::Auth(err) => Some(err),
            _ => None,
        }
    }
}

/// Transport-level errors.
///
/// These are transient from the point of view of the pipeline: they are
/// handed back to the caller untouched and never retried.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Authentication-related errors.
///
/// `Clone` so a single refresh outcome can be delivered to every request
/// queued behind it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The server rejected the access token (HTTP 401).
    #[error("credentials expired")]
    CredentialExpired,

    /// The refresh token is invalid or expired; the session was terminated.
    #[error("credential refresh failed: {reason}")]
    RefreshFailed { reason: String },

    /// The request was rejected again after it had already been replayed
    /// with refreshed credentials.
    #[error("credentials rejected after refresh")]
    DoubleFailure,

    /// No credentials are stored.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Login was refused.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A queued request gave up waiting for the in-flight refresh.
    #[error("timed out after {waited_ms}ms waiting for credential refresh")]
    RefreshTimedOut { waited_ms: u64 },

    /// The task driving the refresh went away before it settled.
    #[error("credential refresh was abandoned")]
    RefreshAbandoned,
}

/// Protocol-level errors from non-success responses.
#[derive(Debug, Clone)]
pub struct ProtocolError {
    /// HTTP status code.
    pub status: u16,
    /// Machine-readable error code (if present).
    pub error: Option<String>,
    /// Error message from the server.
    pub message: Option<String>,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref error) = self.error {
            write!(f, " [{}]", error)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(status: u16, error: Option<String>, message: Option<String>) -> Self {
        Self {
            status,
            error,
            message,
        }
    }

    /// Human-readable summary, preferring the server's message.
    pub fn reason(&self) -> String {
        self.message
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| format!("HTTP {}", self.status))
    }
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid API base URL.
    #[error("invalid API URL '{value}': {reason}")]
    ApiUrl { value: String, reason: String },

    /// Header name or value that cannot be sent.
    #[error("invalid header '{name}': {reason}")]
    Header { name: String, reason: String },

    /// Body that could not be encoded or decoded as JSON.
    #[error("invalid JSON: {reason}")]
    Json { reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidInput(InvalidInputError::Json {
            reason: err.to_string(),
        })
    }
}

/// Credential persistence errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing medium failed.
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    /// The persisted document could not be parsed.
    #[error("corrupt credential file {path}: {reason}")]
    Corrupt { path: String, reason: String },
}

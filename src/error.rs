//! Error types for Parley
//!
//! This module defines all error types used throughout the client,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Parley operations
///
/// Covers configuration loading, credential storage, the request gateway,
/// and the backend responses it classifies.
#[derive(Error, Debug)]
pub enum ParleyError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network-level failure before any HTTP status was received
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend rejected the bearer credential (HTTP 401)
    #[error("Unauthorized: session expired")]
    Unauthorized,

    /// The backend answered with a non-success status other than 401
    #[error("Request failed with status {status}: {body}")]
    Status {
        /// HTTP status code returned by the backend
        status: u16,
        /// Raw response body, possibly empty
        body: String,
    },

    /// The response body did not have the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Credential store read/write failures
    #[error("Credential store error: {0}")]
    Credentials(String),

    /// Login or registration rejected or incomplete
    #[error("Authentication error: {0}")]
    Auth(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

impl ParleyError {
    /// Returns `true` when `err` wraps [`ParleyError::Unauthorized`].
    pub fn is_unauthorized(err: &anyhow::Error) -> bool {
        matches!(
            err.downcast_ref::<ParleyError>(),
            Some(ParleyError::Unauthorized)
        )
    }
}

/// Result type alias for Parley operations
///
/// Uses `anyhow::Error` so callers can attach context while still being able
/// to downcast to [`ParleyError`].
pub type Result<T> = anyhow::Result<T>;

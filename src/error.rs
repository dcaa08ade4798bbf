//! Error type shared by the GitHub, CircleCI, and artifact layers.

use thiserror::Error;

/// Errors surfaced while talking to GitHub or the CI provider.
///
/// Expected reconciliation outcomes (missing artifacts, failed builds, label
/// mismatches) are never reported through this type; they become check
/// conclusions instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DigError {
    /// The authentication token was missing.
    #[error("personal access token is required")]
    MissingToken,

    /// A URL could not be parsed.
    #[error("URL is invalid: {0}")]
    InvalidUrl(String),

    /// The token was rejected by the remote API.
    #[error("token rejected: {message}")]
    Authentication {
        /// Error message returned with the 401/403 response.
        message: String,
    },

    /// The remote API returned a non-success status.
    #[error("API error: {message}")]
    Api {
        /// HTTP status code when one was received.
        status: Option<u16>,
        /// Response detail describing the failure.
        message: String,
    },

    /// Networking failed while calling the remote API.
    #[error("network error: {message}")]
    Network {
        /// Transport-level error detail.
        message: String,
    },

    /// Local I/O operation failed.
    #[error("I/O error: {message}")]
    Io {
        /// Error detail from the underlying I/O operation.
        message: String,
    },

    /// A downloaded artifact archive could not be unpacked.
    #[error("artifact archive error: {message}")]
    Archive {
        /// Error detail from the archive reader.
        message: String,
    },

    /// A webhook delivery could not be decoded.
    #[error("invalid webhook payload: {message}")]
    InvalidPayload {
        /// Decoder error detail.
        message: String,
    },

    /// Configuration could not be loaded or is inconsistent.
    #[error("configuration error: {message}")]
    Configuration {
        /// Details about the configuration failure.
        message: String,
    },

    /// The provider does not support the requested operation.
    #[error("{operation} is not supported by {provider}")]
    Unsupported {
        /// Name of the provider.
        provider: &'static str,
        /// Operation that was attempted.
        operation: &'static str,
    },
}

impl DigError {
    /// Builds a [`DigError::Io`] from a standard I/O error and an operation
    /// label.
    #[must_use]
    pub fn io(operation: &str, error: &std::io::Error) -> Self {
        Self::Io {
            message: format!("{operation}: {error}"),
        }
    }
}

//! Copilot client errors.

use std::time::Duration;

use copilotchat_core::{AuthState, CoreError};
use copilotchat_fetch::{HttpError, KeychainError};
use thiserror::Error;

/// Copilot client errors.
#[derive(Debug, Error)]
pub enum CopilotError {
    /// Transport failure (DNS, connect, TLS, body read).
    #[error("{context}: {source}")]
    Http {
        /// Which step failed, e.g. "failed to get device code".
        context: &'static str,
        /// Underlying error.
        #[source]
        source: HttpError,
    },

    /// Malformed JSON in a response body.
    #[error("{context}: {source}")]
    Decode {
        /// Which step failed.
        context: &'static str,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// Non-success HTTP status. The body is kept verbatim.
    #[error("{context} (HTTP {status}): {body}")]
    Api {
        /// Which step failed.
        context: &'static str,
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// Error object inside an otherwise successful completion response.
    #[error("Copilot API error: {0}")]
    ApiError(String),

    /// HTTP 200 completion response without any choice.
    #[error("no choices in response")]
    EmptyChoices,

    /// Response decoded but lacks a required field.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The token endpoint refused to issue an API token.
    #[error("API token request rejected: {0}")]
    TokenRejected(String),

    /// The device flow did not complete within the allowed time.
    #[error("authentication timed out after {}", format_duration(.0))]
    AuthTimedOut(Duration),

    /// A completion was requested without a valid API token.
    #[error("not authenticated: {0}")]
    NotAuthenticated(AuthState),

    /// Keychain access failed.
    #[error("Keychain error: {0}")]
    Keychain(#[from] KeychainError),

    /// The cached credential record could not be encoded or decoded.
    #[error("Invalid credential cache: {0}")]
    Cache(#[source] CoreError),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error while reading configuration.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CopilotError {
    /// Wraps a transport error with the step that failed.
    pub(crate) fn http(context: &'static str, err: impl Into<HttpError>) -> Self {
        CopilotError::Http {
            context,
            source: err.into(),
        }
    }

    /// Wraps a JSON error with the step that failed.
    pub(crate) fn decode(context: &'static str, source: serde_json::Error) -> Self {
        CopilotError::Decode { context, source }
    }

    /// Returns true if the device flow ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, CopilotError::AuthTimedOut(_))
    }

    /// Returns true if an HTTP request ran past its timeout.
    pub fn is_request_timeout(&self) -> bool {
        matches!(self, CopilotError::Http { source, .. } if source.is_timeout())
    }

    /// Returns true for transport-level failures.
    pub fn is_transport(&self) -> bool {
        matches!(self, CopilotError::Http { .. })
    }
}

/// Formats a duration as whole minutes when possible.
fn format_duration(duration: &Duration) -> String {
    let secs = duration.as_secs();
    match secs {
        0 => format!("{}ms", duration.as_millis()),
        60 => "1 minute".to_string(),
        s if s % 60 == 0 => format!("{} minutes", s / 60),
        s => format!("{s} seconds"),
    }
}

//! Error types for the Frost MCP server.
//!
//! This module defines `FrostError`, the unified error type returned by the
//! credential provider, the parameter resolver and the HTTP client.
//!
//! # Security
//!
//! Error messages may be built from transport errors or response bodies that
//! echo credentials back. Use `sanitize_message()` (or `sanitized_display()`)
//! before an error leaves the process.

use std::time::Duration;
use thiserror::Error;

/// Maximum length for HTTP error response bodies embedded in errors.
pub const MAX_ERROR_BODY_LEN: usize = 500;

/// Coarse classification of a `FrostError`.
///
/// Callers branch on this instead of matching message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Static configuration is malformed or missing.
    Configuration,
    /// The token endpoint was unreachable, rejected us, or returned no token.
    Authentication,
    /// Parameters were not a mapping and could not be turned into one.
    InvalidInput,
    /// An operation-level required parameter was absent.
    MissingField,
    /// Parameters failed type or enum validation.
    Validation,
    /// Any failure talking to the remote platform outside token acquisition.
    Transport,
}

/// Unified error type for all Frost operations.
#[derive(Error, Debug)]
pub enum FrostError {
    /// Configuration error - missing or invalid static configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// OAuth token acquisition failed.
    #[error("authentication failed: {message}")]
    Authentication {
        /// What went wrong, already free of secrets.
        message: String,
        /// The underlying transport error, if there was one.
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Parameters were neither a mapping nor convertible to one.
    #[error("invalid parameters format: expected an object, got {type_name}")]
    InvalidInput {
        /// Name of the type that was observed instead.
        type_name: String,
    },

    /// A parameter the operation requires was not supplied.
    #[error("missing required parameter '{field}'")]
    MissingField {
        /// The absent parameter name.
        field: String,
    },

    /// Parameters did not match the operation's schema.
    #[error("error validating parameters: {source}")]
    Validation {
        /// The decoding failure reported by serde.
        #[source]
        source: serde_json::Error,
    },

    /// HTTP request failed during transmission.
    #[error("HTTP request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// Request timed out.
    #[error("request timed out after {duration:?} ({operation})")]
    Timeout {
        /// How long we waited before timing out.
        duration: Duration,
        /// The operation that timed out.
        operation: String,
    },

    /// HTTP response returned a non-success status code.
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// The HTTP status code returned.
        status: reqwest::StatusCode,
        /// The (truncated) response body.
        body: String,
    },

    /// JSON serialization or deserialization of a platform payload failed.
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A record looked up by number or id does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Human-readable entity name (e.g. "incident").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },
}

impl FrostError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        FrostError::Configuration(message.into())
    }

    /// Creates a configuration error for a missing environment variable.
    pub fn missing_env(var_name: &str) -> Self {
        FrostError::Configuration(format!(
            "missing required environment variable: {}",
            var_name
        ))
    }

    /// Creates an authentication error without an underlying transport cause.
    pub fn authentication(message: impl Into<String>) -> Self {
        FrostError::Authentication {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an authentication error wrapping a transport failure.
    pub fn authentication_with(message: impl Into<String>, source: reqwest::Error) -> Self {
        FrostError::Authentication {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Creates an invalid-input error for the observed type.
    pub fn invalid_input(type_name: impl Into<String>) -> Self {
        FrostError::InvalidInput {
            type_name: type_name.into(),
        }
    }

    /// Creates a missing-field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        FrostError::MissingField {
            field: field.into(),
        }
    }

    /// Creates a validation error from a serde decoding failure.
    pub fn validation(source: serde_json::Error) -> Self {
        FrostError::Validation { source }
    }

    /// Creates a validation error for a single field value.
    pub fn invalid_value(field: &str, reason: &str) -> Self {
        Self::validation(<serde_json::Error as serde::de::Error>::custom(format!(
            "{}: {}",
            field, reason
        )))
    }

    /// Creates a not-found error.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        FrostError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates an HTTP status error, truncating the body.
    pub fn http_status(status: reqwest::StatusCode, body: &str) -> Self {
        FrostError::HttpStatus {
            status,
            body: truncate_body(body),
        }
    }

    /// Returns the coarse classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            FrostError::Configuration(_) => ErrorKind::Configuration,
            FrostError::Authentication { .. } => ErrorKind::Authentication,
            FrostError::InvalidInput { .. } => ErrorKind::InvalidInput,
            FrostError::MissingField { .. } => ErrorKind::MissingField,
            FrostError::Validation { .. } => ErrorKind::Validation,
            FrostError::Transport(_)
            | FrostError::Timeout { .. }
            | FrostError::HttpStatus { .. }
            | FrostError::Serialization(_)
            | FrostError::NotFound { .. } => ErrorKind::Transport,
        }
    }

    /// Returns true if the caller supplied bad parameters.
    ///
    /// These failures are never worth retrying.
    #[must_use]
    pub fn is_caller_fault(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidInput | ErrorKind::MissingField | ErrorKind::Validation
        )
    }

    /// Replaces every occurrence of each secret with `[REDACTED]`.
    ///
    /// Empty secrets are skipped.
    #[must_use]
    pub fn sanitize_message(message: &str, secrets: &[&str]) -> String {
        secrets
            .iter()
            .filter(|secret| !secret.is_empty())
            .fold(message.to_string(), |acc, secret| {
                acc.replace(secret, "[REDACTED]")
            })
    }

    /// Creates a sanitized version of this error's display message.
    #[must_use]
    pub fn sanitized_display(&self, secrets: &[&str]) -> String {
        Self::sanitize_message(&self.to_string(), secrets)
    }
}

/// Truncates an HTTP body to `MAX_ERROR_BODY_LEN` characters.
fn truncate_body(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY_LEN {
        body.to_string()
    } else {
        let truncated: String = body.chars().take(MAX_ERROR_BODY_LEN).collect();
        format!("{}... [truncated]", truncated)
    }
}

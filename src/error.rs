//! Error types for FemtoAgent
//!
//! This module defines all error types used throughout the crate.
//! Uses `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.

use std::fmt;
use thiserror::Error;

// ============================================================================
// Provider Error Classification
// ============================================================================

/// HTTP status codes that indicate a transient provider failure.
const RETRYABLE_STATUS_CODES: &[u16] = &[429, 500, 502, 503, 504];

/// Structured provider error classification.
///
/// Every provider adapter must translate its failures into one of these
/// variants. Retry decisions are made exclusively from this taxonomy, never
/// from provider SDK types or error-message string matching.
#[derive(Debug)]
pub enum ProviderError {
    /// Network-level failure (DNS, TLS, socket, request timeout). Retryable.
    Connection(String),
    /// Non-success HTTP status returned by the provider API.
    Status { code: u16, message: String },
    /// Response body that could not be decoded into the expected shape.
    MalformedResponse(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Connection(msg) => write!(f, "Connection error: {}", msg),
            ProviderError::Status { code, message } => {
                write!(f, "Status {}: {}", code, message)
            }
            ProviderError::MalformedResponse(msg) => write!(f, "Malformed response: {}", msg),
        }
    }
}

impl ProviderError {
    /// Returns `true` if this error is transient and the request should be
    /// retried.
    ///
    /// Retryable: connection failures and status codes 429/500/502/503/504.
    /// Everything else (other statuses, malformed responses) is permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Connection(_) => true,
            ProviderError::Status { code, .. } => RETRYABLE_STATUS_CODES.contains(code),
            ProviderError::MalformedResponse(_) => false,
        }
    }

    /// Returns the HTTP status code associated with this error, if applicable.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ProviderError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<ProviderError> for AgentError {
    fn from(err: ProviderError) -> Self {
        AgentError::Provider(err)
    }
}

// ============================================================================
// Primary Error Type
// ============================================================================

/// The primary error type for FemtoAgent operations.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Configuration-related errors (missing memory store for a requested
    /// scope, unknown provider name, invalid builder inputs, etc.). Raised
    /// before any provider call is made.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Template rendering failure (unresolved variables in strict mode).
    /// A configuration-class error: raised before any provider call.
    #[error("Template error: {0}")]
    Template(String),

    /// Classified provider error. Retried by the retry wrapper when the
    /// inner classification says so; otherwise surfaced to the caller.
    #[error("Provider error: {0}")]
    Provider(ProviderError),

    /// Tool definition or registry errors. Failures during a tool's
    /// execution inside a run are folded into tool outcomes instead and
    /// never surface through this variant.
    #[error("Tool error: {0}")]
    Tool(String),

    /// Structured-output arguments failing schema validation. Terminal for
    /// the run: the contract the caller asked for could not be honored.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Memory store errors outside the non-fatal post-run update path.
    #[error("Memory error: {0}")]
    Memory(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized `Result` type for FemtoAgent operations.
pub type Result<T> = std::result::Result<T, AgentError>;

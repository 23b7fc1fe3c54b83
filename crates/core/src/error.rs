//! Error types for the DataLens domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] is what the
//! pipelines hand back to their callers.

use thiserror::Error;

/// The top-level error type for chat turns and chart generation.
#[derive(Debug, Error)]
pub enum Error {
    // --- Caller errors (detected before any external call) ---
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Invalid data point at index {index}: field '{field}' {reason}")]
    InvalidDataPoint {
        index: usize,
        field: String,
        reason: String,
    },

    #[error("Dataset is empty: chart data must be a non-empty array")]
    EmptyDataset,

    // --- Provider errors ---
    #[error("Provider failure: {0}")]
    ProviderFailure(#[from] ProviderError),

    // --- Storage errors ---
    #[error("Failed to persist: {0}")]
    StoragePersistFailure(StorageError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the caller caused this error (bad request rather than a
    /// backend or storage problem).
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_)
                | Error::UnknownProvider(_)
                | Error::InvalidDataPoint { .. }
                | Error::EmptyDataset
        )
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Normalized failure from any language-model backend.
///
/// Adapters translate transport errors, HTTP status codes and malformed
/// payloads into one of these; nothing backend-specific escapes.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Key not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("I/O error on '{key}': {reason}")]
    Io { key: String, reason: String },

    #[error("Corrupted blob at '{key}': {reason}")]
    Corrupted { key: String, reason: String },
}

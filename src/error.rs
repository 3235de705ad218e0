//! Error types for vault operations.

use thiserror::Error;

/// Result type alias for vault operations
pub type Result<T> = std::result::Result<T, VaultError>;

/// Errors surfaced by [`crate::UserVault`]. Validation errors are raised
/// before the backend is touched, backend failures pass through unchanged.
#[derive(Debug, Error)]
pub enum VaultError
{
    #[error("{param} must be a {accepted}, got {found}")]
    InvalidType {
        param: &'static str,
        accepted: &'static str,
        found: &'static str,
    },

    // The id contains, or runs into, the separator.
    #[error("namespace id {namespace:?} clashes with separator {separator:?}")]
    InvalidNamespace {
        namespace: String,
        separator: String,
    },

    /// Raised by `delete_value` under the `raise` policy.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("missing policy must be either \"ignore\" or \"raise\", got {0:?}")]
    InvalidPolicy(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("backend error: {0}")]
    Backend(#[from] std::io::Error),
}

//! Error types for dbxfs

use thiserror::Error;

/// Result type alias
pub type DbxResult<T> = Result<T, DbxError>;

/// Main error type
#[derive(Error, Debug)]
pub enum DbxError {
    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A caller broke the contract of an operation (e.g. folder copy without
    /// the recursive flag). Never subject to the copy error policy.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Invalid open mode: {0}")]
    InvalidMode(String),

    #[error("Invalid seek: {0}")]
    InvalidSeek(String),

    #[error("File handle is closed: {0}")]
    Closed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication required: {0}")]
    AuthRequired(String),

    #[error("Provider API error ({provider}): {message}")]
    ProviderApi { provider: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl DbxError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DbxError::NotFound(_))
    }

    /// Contract violations raised before any remote call is made.
    pub fn is_precondition(&self) -> bool {
        matches!(self, DbxError::Precondition(_))
    }
}

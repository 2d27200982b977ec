//! Error types for Mneme operations

/// Result type for Mneme operations
pub type Result<T> = std::result::Result<T, MnemeError>;

/// Error types for the Mneme library
#[derive(Debug, thiserror::Error)]
pub enum MnemeError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Snapshot rejected on import
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

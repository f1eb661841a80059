//! Error types for Gauntlet

/// Main error type for Gauntlet operations
#[derive(Debug, thiserror::Error)]
pub enum GauntletError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

// Implement From conversions for common error types

impl From<mongodb::error::Error> for GauntletError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<bson::ser::Error> for GauntletError {
    fn from(err: bson::ser::Error) -> Self {
        Self::Internal(format!("BSON encode error: {}", err))
    }
}

impl From<serde_json::Error> for GauntletError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidInput(format!("JSON error: {}", err))
    }
}

/// Result type alias for Gauntlet operations
pub type Result<T> = std::result::Result<T, GauntletError>;

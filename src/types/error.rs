use thiserror::Error;

/// retroshelf error types
#[derive(Error, Debug)]
pub enum ShelfError {
    /// Failed to parse the playtime JSON document
    #[error("parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A playtime record was malformed or failed validation
    #[error("invalid record for '{key}': {reason}")]
    Record { key: String, reason: String },

    /// Configuration error (platform map, CLI paths)
    #[error("config error: {0}")]
    Config(String),

    /// Publishing the rendered page failed
    #[error("publish error: {0}")]
    Publish(String),
}

/// Result type alias for retroshelf
pub type Result<T> = std::result::Result<T, ShelfError>;

use thiserror::Error;

/// Error types surfaced by the inventory and address-space operations
#[derive(Error, Debug)]
pub enum IpamError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Record Store Error: {0}")]
    Store(String),

    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization Error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, IpamError>;

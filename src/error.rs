use thiserror::Error;
use std::io;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Resource limit exceeded: {0}")]
    ResourceExhaustion(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Operation cancelled")]
    Cancelled,
}

// Type alias for Result
pub type Result<T> = std::result::Result<T, Error>;

// Helper functions for common error constructions
impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn integrity<S: Into<String>>(msg: S) -> Self {
        Error::DataIntegrity(msg.into())
    }

    pub fn exhausted<S: Into<String>>(msg: S) -> Self {
        Error::ResourceExhaustion(msg.into())
    }
}
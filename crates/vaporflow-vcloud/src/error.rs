//! vCloud resource layer error types

use thiserror::Error;

/// Errors surfaced by resource models, the query runner and the transport seam
#[derive(Error, Debug)]
pub enum VcloudError {
    #[error("Malformed identifier: {0}")]
    Format(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Ambiguous result: {0}")]
    Ambiguous(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Unexpected attribute shape: {0}")]
    Attributes(String),

    #[error("Post-processor failed: {0}")]
    PostProcessor(String),

    #[error("Config error: {0}")]
    Core(#[from] vaporflow_core::CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, VcloudError>;

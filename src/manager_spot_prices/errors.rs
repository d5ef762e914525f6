use thiserror::Error;

/// Error depicting errors that occur while loading a spot price series
///
#[derive(Debug, Error)]
pub enum SpotPriceError {
    #[error("IoError: {0}")]
    IoError(#[from] std::io::Error),
    #[error("DocumentError: {0}")]
    DocumentError(#[from] serde_json::Error),
}

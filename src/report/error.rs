//! Report engine error types

use std::time::Duration;

use thiserror::Error;

/// Fatal errors: generation fails and nothing is returned to the caller
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Invalid report input: {0}")]
    InvalidInput(String),

    #[error("Invalid page geometry: {0}")]
    InvalidGeometry(String),

    #[error("PDF serialization failed: {0}")]
    Pdf(String),

    #[error("Report configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ReportResult<T> = Result<T, ReportError>;

/// Recoverable image acquisition failures.
///
/// These never escape the engine: sections log them and draw a placeholder.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("rasterization timed out after {0:?}")]
    Timeout(Duration),

    #[error("rasterization failed: {0}")]
    Render(String),

    #[error("chart is not mounted")]
    Unavailable,

    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("malformed data URI")]
    MalformedUri,
}

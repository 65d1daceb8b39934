pub mod client;

use async_trait::async_trait;
use shared::{DetectorKind, DetectorPayload};
use std::time::Duration;

use crate::upload::UploadedImage;

pub use client::DetectorClient;

/// Failures of a single detector call. Callers only ever display the message.
#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    #[error("Request failed: {0}")]
    Network(String),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("Invalid JSON response: {0}")]
    Parse(String),
}

/// A remote image-forensics classifier.
#[async_trait]
pub trait Detector: Send + Sync {
    fn kind(&self) -> DetectorKind;

    async fn detect(&self, image: &UploadedImage) -> Result<DetectorPayload, DetectorError>;
}

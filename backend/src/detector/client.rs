use async_trait::async_trait;
use log::{info, warn};
use reqwest::multipart::{Form, Part};
use reqwest::Client as HttpClient;
use shared::{DetectorKind, DetectorPayload};
use std::time::{Duration, Instant};

use super::{Detector, DetectorError};
use crate::config::DetectorEndpoint;
use crate::upload::{UploadedImage, FILE_FIELD};

const MAX_ERROR_BODY: usize = 200;

/// HTTP client for one detector endpoint. Sends the image as a multipart `file` part.
#[derive(Clone)]
pub struct DetectorClient {
    http_client: HttpClient,
    endpoint: DetectorEndpoint,
    timeout: Duration,
}

impl DetectorClient {
    pub fn new(http_client: HttpClient, endpoint: DetectorEndpoint, timeout: Duration) -> Self {
        Self {
            http_client,
            endpoint,
            timeout,
        }
    }

    async fn send(&self, image: &UploadedImage) -> Result<DetectorPayload, DetectorError> {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.mime_type)
            .map_err(|e| self.request_error(e))?;
        let form = Form::new().part(FILE_FIELD, part);

        let response = self
            .http_client
            .post(self.endpoint.url.clone())
            .multipart(form)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DetectorError::HttpStatus {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        let body = response.bytes().await.map_err(|e| self.request_error(e))?;
        serde_json::from_slice::<DetectorPayload>(&body).map_err(|e| DetectorError::Parse(e.to_string()))
    }

    fn request_error(&self, e: reqwest::Error) -> DetectorError {
        if e.is_timeout() {
            DetectorError::Timeout(self.timeout)
        } else {
            DetectorError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl Detector for DetectorClient {
    fn kind(&self) -> DetectorKind {
        self.endpoint.kind
    }

    async fn detect(&self, image: &UploadedImage) -> Result<DetectorPayload, DetectorError> {
        let started = Instant::now();
        let result = self.send(image).await;
        let elapsed = started.elapsed().as_millis();

        match &result {
            Ok(_) => info!(
                "{} detector answered for {} in {} ms",
                self.endpoint.kind, image.file_name, elapsed
            ),
            Err(e) => warn!(
                "{} detector failed for {} after {} ms: {}",
                self.endpoint.kind, image.file_name, elapsed, e
            ),
        }
        result
    }
}

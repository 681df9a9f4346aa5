//! CLOVA OCR client and text flattening.
//!
//! One synchronous recognition call per run against the APIGW invoke URL.
//! The image travels inlined as base64 inside the JSON envelope rather than
//! as a multipart file part; both encodings satisfy the same provider
//! contract. Any failure here is fatal to the run.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Settings;

/// Errors that can occur during the recognition call.
#[derive(Debug, Error)]
pub enum OcrError {
    /// Failed to reach the OCR service.
    #[error("connection error: {0}")]
    Connection(String),

    /// Service answered with a non-success status.
    #[error("API error: HTTP {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Response body did not decode as the expected JSON shape.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Request envelope for the recognition call.
#[derive(Debug, Serialize)]
struct OcrRequest {
    images: Vec<OcrRequestImage>,
    #[serde(rename = "requestId")]
    request_id: String,
    version: &'static str,
    timestamp: i64,
}

#[derive(Debug, Serialize)]
struct OcrRequestImage {
    format: String,
    name: &'static str,
    data: String,
}

/// Recognition response. Only the text fields are consumed; geometry and
/// confidence data the provider includes are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OcrResponse {
    #[serde(default)]
    pub images: Vec<OcrImage>,
}

/// One recognized image block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OcrImage {
    #[serde(default)]
    pub fields: Vec<OcrField>,
}

/// One recognized text field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OcrField {
    #[serde(rename = "inferText", default)]
    pub infer_text: String,
}

/// CLOVA OCR client bound to one invoke URL and secret key.
pub struct ClovaOcrClient {
    client: Client,
    invoke_url: String,
    secret_key: String,
}

impl ClovaOcrClient {
    /// Create a client from resolved settings.
    pub fn new(settings: &Settings) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            invoke_url: settings.ocr_invoke_url.clone(),
            secret_key: settings.ocr_secret_key.clone(),
        }
    }

    /// Recognize text in one image.
    ///
    /// `format` is the provider-facing format name (`jpg`, `jpeg`, `png`);
    /// the envelope carries a fresh request id and millisecond timestamp.
    pub async fn recognize(&self, image: &[u8], format: &str) -> Result<OcrResponse, OcrError> {
        let request = OcrRequest {
            images: vec![OcrRequestImage {
                format: format.to_string(),
                name: "receipt",
                data: BASE64.encode(image),
            }],
            request_id: Uuid::new_v4().to_string(),
            version: "V2",
            timestamp: chrono::Utc::now().timestamp_millis(),
        };

        debug!(
            "submitting {} byte {} image to CLOVA OCR",
            image.len(),
            format
        );
        let resp = self
            .client
            .post(&self.invoke_url)
            .header("X-OCR-SECRET", &self.secret_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| OcrError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(OcrError::Api { status, body });
        }

        let parsed: OcrResponse = resp
            .json()
            .await
            .map_err(|e| OcrError::Parse(e.to_string()))?;

        info!("OCR returned {} image block(s)", parsed.images.len());
        Ok(parsed)
    }
}

/// Flatten a recognition response into one newline-joined text blob.
///
/// Fields keep provider order across images; blank or whitespace-only
/// fields are dropped. Returns an empty string when nothing was recognized.
pub fn flatten_text(response: &OcrResponse) -> String {
    response
        .images
        .iter()
        .flat_map(|image| image.fields.iter())
        .map(|field| field.infer_text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

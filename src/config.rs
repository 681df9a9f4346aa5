//! Runtime configuration for receiptron.
//!
//! Credentials come from the process environment (optionally seeded from a
//! `.env` file loaded in main). Settings are resolved once at command entry
//! and passed by reference into the OCR and model clients; no component
//! reads ambient environment state on its own.

use std::path::PathBuf;

use thiserror::Error;

/// Environment variable holding the CLOVA OCR secret key.
pub const ENV_OCR_SECRET: &str = "CLOVA_OCR_SECRET_KEY";
/// Environment variable holding the CLOVA OCR APIGW invoke URL.
pub const ENV_OCR_INVOKE_URL: &str = "CLOVA_OCR_APIGW_INVOKE_URL";
/// Environment variable holding the Google Gemini API key.
pub const ENV_GEMINI_KEY: &str = "GOOGLE_API_KEY";

/// Resolved runtime settings for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    /// CLOVA OCR secret key, sent as the X-OCR-SECRET header.
    pub ocr_secret_key: String,
    /// CLOVA OCR APIGW invoke URL.
    pub ocr_invoke_url: String,
    /// Google Gemini API key.
    pub gemini_api_key: String,
    /// Directory scanned for the receipt image.
    pub input_dir: PathBuf,
    /// Directory receiving the result JSON.
    pub output_dir: PathBuf,
    /// Gemini model identifier.
    pub model: String,
}

/// Error produced when required environment variables are absent or blank.
#[derive(Debug, Error)]
#[error("missing required environment variables: {} (set them in the environment or a .env file)", .missing.join(", "))]
pub struct MissingConfig {
    /// Names of the variables that were not set.
    pub missing: Vec<String>,
}

impl Settings {
    /// Build settings from the process environment.
    pub fn from_env(
        input_dir: PathBuf,
        output_dir: PathBuf,
        model: String,
    ) -> Result<Self, MissingConfig> {
        Self::from_source(
            |name| std::env::var(name).ok(),
            input_dir,
            output_dir,
            model,
        )
    }

    /// Build settings from an arbitrary variable source.
    ///
    /// Blank values count as missing. Every absent name is collected before
    /// failing so a broken .env file surfaces in a single diagnostic.
    pub fn from_source(
        source: impl Fn(&str) -> Option<String>,
        input_dir: PathBuf,
        output_dir: PathBuf,
        model: String,
    ) -> Result<Self, MissingConfig> {
        let mut missing = Vec::new();
        let mut require = |name: &'static str| match source(name) {
            Some(value) if !value.trim().is_empty() => value,
            _ => {
                missing.push(name.to_string());
                String::new()
            }
        };

        let ocr_secret_key = require(ENV_OCR_SECRET);
        let ocr_invoke_url = require(ENV_OCR_INVOKE_URL);
        let gemini_api_key = require(ENV_GEMINI_KEY);

        if !missing.is_empty() {
            return Err(MissingConfig { missing });
        }

        Ok(Self {
            ocr_secret_key,
            ocr_invoke_url,
            gemini_api_key,
            input_dir,
            output_dir,
            model,
        })
    }
}

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::TranslationBackend;
use crate::config::TranslateConfig;
use crate::error::{PipelineError, Result};

/// Environment variable consulted when the config carries no API key
pub const API_KEY_ENV: &str = "MMT_API_KEY";

#[derive(Debug, Clone, Serialize)]
pub struct ModernMtRequest<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub q: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModernMtResponse {
    pub status: u16,
    pub data: Option<ModernMtTranslation>,
    pub error: Option<ModernMtError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModernMtTranslation {
    pub translation: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModernMtError {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub message: String,
}

impl ModernMtResponse {
    /// Extract the translation or turn the service error into ours
    pub fn into_translation(self) -> Result<String> {
        match (self.data, self.error) {
            (Some(data), _) if self.status == 200 => Ok(data.translation),
            (_, Some(error)) => Err(PipelineError::Translation(format!(
                "ModernMT error {} ({}): {}",
                self.status, error.kind, error.message
            ))),
            _ => Err(PipelineError::Translation(format!(
                "ModernMT returned status {} without a translation",
                self.status
            ))),
        }
    }
}

/// ModernMT REST client
pub struct ModernMtBackend {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl ModernMtBackend {
    pub fn new(config: &TranslateConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                PipelineError::Config(format!(
                    "ModernMT requires translate.api_key or the {} environment variable",
                    API_KEY_ENV
                ))
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl TranslationBackend for ModernMtBackend {
    async fn translate(&self, source_code: &str, target_code: &str, text: &str) -> Result<String> {
        let url = format!("{}/translate", self.endpoint);
        let request = ModernMtRequest {
            source: source_code,
            target: target_code,
            q: text,
        };

        debug!("Sending translation request to: {}", url);

        let response = self
            .client
            .post(&url)
            .header("MMT-ApiKey", &self.api_key)
            .header("MMT-Platform", "vidsub")
            .header("X-HTTP-Method-Override", "GET")
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::Translation(format!("HTTP request failed: {}", e)))?;

        let body: ModernMtResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Translation(format!("Failed to parse response: {}", e)))?;

        body.into_translation()
    }
}

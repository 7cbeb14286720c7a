use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use super::TranslationBackend;
use crate::config::TranslateConfig;
use crate::error::{PipelineError, Result};
use crate::language::Language;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
    pub done: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    pub text: String,
}

/// Translation through a local Ollama model
pub struct OllamaBackend {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaBackend {
    pub fn new(config: &TranslateConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

/// Prompt asking for a JSON `{"text": ...}` reply
fn build_prompt(text: &str, source_code: &str, target_code: &str) -> String {
    let source_name = language_name(source_code);
    let target_name = language_name(target_code);

    format!(
        "You are a professional subtitle translator.\n\
         \n\
         Translate the following {} subtitle line to {} ONLY.\n\
         Return ONLY the translation in JSON format as {{\"text\":\"your {} translation here\"}}.\n\
         Do not include any explanations, alternatives, or text in other languages.\n\
         \n\
         Text to translate: \"{}\"\n",
        source_name, target_name, target_name, text
    )
}

fn language_name(code: &str) -> String {
    code.parse::<Language>()
        .map(|lang| lang.name().to_string())
        .unwrap_or_else(|_| code.to_string())
}

/// Pull the translation out of a free-form reply when the model ignored the JSON format
fn clean_response(response: &str) -> String {
    response
        .lines()
        .map(str::trim)
        .find(|line| {
            !line.is_empty()
                && !line.starts_with("Here ")
                && !line.starts_with("Translation:")
                && !(line.starts_with("**") && line.ends_with("**"))
        })
        .unwrap_or_else(|| response.trim())
        .trim_matches('"')
        .to_string()
}

/// Parse a raw `response` field from /api/generate
pub fn parse_reply(raw: &str) -> Result<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(PipelineError::Translation("Empty translation received".to_string()));
    }

    if let Ok(result) = serde_json::from_str::<TranslationResult>(raw) {
        return Ok(result.text.trim().to_string());
    }

    Ok(clean_response(raw))
}

#[async_trait]
impl TranslationBackend for OllamaBackend {
    async fn translate(&self, source_code: &str, target_code: &str, text: &str) -> Result<String> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: build_prompt(text, source_code, target_code),
            stream: false,
            format: "json".to_string(),
        };

        let url = format!("{}/api/generate", self.endpoint);
        debug!("Sending translation request to: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(PipelineError::Translation(format!(
                "Ollama API error {}: {}",
                status, error_text
            )));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Translation(format!("Failed to parse response: {}", e)))?;

        debug!("Raw Ollama response: {}", generated.response);
        parse_reply(&generated.response)
    }

    /// Ollama is reachable and the model is pulled
    async fn check_availability(&self) -> Result<()> {
        let url = format!("{}/api/show", self.endpoint);

        let response = self
            .client
            .post(&url)
            .json(&json!({ "name": self.model }))
            .send()
            .await
            .map_err(|e| PipelineError::Translation(format!("Failed to connect to Ollama: {}", e)))?;

        if response.status().is_success() {
            info!("Ollama model '{}' is available", self.model);
            Ok(())
        } else {
            Err(PipelineError::Translation(format!(
                "Ollama model '{}' not found. Please pull the model first: ollama pull {}",
                self.model, self.model
            )))
        }
    }
}

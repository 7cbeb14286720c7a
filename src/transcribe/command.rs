use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

use super::{Chunk, Granularity, TranscriptionBackend};
use crate::error::{PipelineError, Result};
use crate::language::Language;

/// JSON written by the ASR command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsrOutput {
    #[serde(default)]
    pub text: String,
    pub chunks: Vec<AsrChunk>,
}

/// One chunk as emitted by the ASR command; the final chunk may have no end
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsrChunk {
    pub timestamp: (f64, Option<f64>),
    pub text: String,
}

impl From<AsrChunk> for Chunk {
    fn from(chunk: AsrChunk) -> Self {
        let (start, end) = chunk.timestamp;
        Chunk {
            start,
            end: end.unwrap_or(start),
            text: chunk.text.trim().to_string(),
        }
    }
}

/// Convert ASR command output into chunks, preserving order
pub fn chunks_from_output(output: AsrOutput) -> Vec<Chunk> {
    output.chunks.into_iter().map(Chunk::from).collect()
}

/// Runs an external speech-recognition command for one model
pub struct CommandTranscriber {
    binary_path: String,
    model: String,
    granularity: Granularity,
}

impl CommandTranscriber {
    pub fn new<S1: Into<String>, S2: Into<String>>(
        binary_path: S1,
        model: S2,
        granularity: Granularity,
    ) -> Self {
        Self {
            binary_path: binary_path.into(),
            model: model.into(),
            granularity,
        }
    }
}

#[async_trait]
impl TranscriptionBackend for CommandTranscriber {
    async fn transcribe(&self, audio_path: &Path, language: Language) -> Result<Vec<Chunk>> {
        debug!(
            "Running {} with model {} ({} timestamps)",
            self.binary_path,
            self.model,
            self.granularity.as_arg()
        );

        let temp_dir = tempfile::tempdir().map_err(|e| {
            PipelineError::Transcription(format!("Failed to create temp directory: {}", e))
        })?;
        let output_dir = temp_dir.path();

        let output = Command::new(&self.binary_path)
            .arg(audio_path)
            .arg("--model").arg(&self.model)
            .arg("--return-timestamps").arg(self.granularity.as_arg())
            .arg("--language").arg(language.code())
            .arg("--output_dir").arg(output_dir)
            .output()
            .await
            .map_err(|e| {
                PipelineError::Transcription(format!("Failed to execute {}: {}", self.binary_path, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::Transcription(format!(
                "{} failed: {}",
                self.binary_path, stderr
            )));
        }

        let audio_stem = audio_path
            .file_stem()
            .ok_or_else(|| PipelineError::Transcription("Invalid audio filename".to_string()))?;
        let json_file = output_dir.join(format!("{}.json", audio_stem.to_string_lossy()));

        let json_content = tokio::fs::read_to_string(&json_file).await.map_err(|e| {
            PipelineError::Transcription(format!("Failed to read {}: {}", json_file.display(), e))
        })?;

        let asr_output: AsrOutput = serde_json::from_str(&json_content).map_err(|e| {
            PipelineError::Transcription(format!("Failed to parse transcription JSON: {}", e))
        })?;

        Ok(chunks_from_output(asr_output))
    }

    /// The ASR command answers `--help`
    async fn check_availability(&self) -> Result<()> {
        let output = Command::new(&self.binary_path)
            .arg("--help")
            .output()
            .await
            .map_err(|e| {
                PipelineError::Transcription(format!("{} not found: {}", self.binary_path, e))
            })?;

        if output.status.success() {
            info!("Transcription command {} is available", self.binary_path);
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(PipelineError::Transcription(format!(
                "{} is not usable: {}",
                self.binary_path, stderr
            )))
        }
    }
}

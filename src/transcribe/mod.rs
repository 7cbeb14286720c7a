// Transcription adapter
//
// Backends turn an audio file into timestamped chunks. Two variants exist:
// - Phrase: one chunk per spoken phrase (whisper-style models)
// - Word: one chunk per word, merged into cues downstream (Fon model)
//
// TranscriptProvider owns one backend of each variant and dispatches on the
// granularity recorded for the spoken language in the LanguageTable.

pub mod command;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub use command::*;
use crate::config::TranscriberConfig;
use crate::error::{PipelineError, Result};
use crate::language::Language;

/// Raw timestamped text segment from a transcription backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl Chunk {
    pub fn new<S: Into<String>>(start: f64, end: f64, text: S) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// Timestamp granularity produced by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Granularity {
    Phrase,
    Word,
}

impl Granularity {
    /// Value passed to the ASR command's `--return-timestamps`
    pub fn as_arg(&self) -> &'static str {
        match self {
            Self::Phrase => "chunk",
            Self::Word => "word",
        }
    }
}

/// Chunks plus the granularity they were produced at
#[derive(Debug, Clone)]
pub struct Transcript {
    pub chunks: Vec<Chunk>,
    pub granularity: Granularity,
}

/// Speech recognition backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptionBackend: Send + Sync {
    /// Transcribe an audio file into ordered chunks
    async fn transcribe(&self, audio_path: &Path, language: Language) -> Result<Vec<Chunk>>;

    /// Verify the backend can run at all
    async fn check_availability(&self) -> Result<()> {
        Ok(())
    }
}

/// Selects the backend for a language and enforces the adapter contract
pub struct TranscriptProvider {
    phrase: Arc<dyn TranscriptionBackend>,
    word: Arc<dyn TranscriptionBackend>,
}

impl TranscriptProvider {
    pub fn new(phrase: Arc<dyn TranscriptionBackend>, word: Arc<dyn TranscriptionBackend>) -> Self {
        Self { phrase, word }
    }

    /// Build command-line backends for both granularities
    pub fn from_config(config: &TranscriberConfig) -> Self {
        Self::new(
            Arc::new(CommandTranscriber::new(
                &config.binary_path,
                &config.phrase_model,
                Granularity::Phrase,
            )),
            Arc::new(CommandTranscriber::new(
                &config.binary_path,
                &config.word_model,
                Granularity::Word,
            )),
        )
    }

    pub async fn check_availability(&self) -> Result<()> {
        self.phrase.check_availability().await?;
        self.word.check_availability().await
    }

    /// Transcribe `audio_path` with the backend matching `granularity`.
    ///
    /// Any failure surfaces as `PipelineError::Transcription`; nothing is retried.
    pub async fn transcribe(
        &self,
        audio_path: &Path,
        language: Language,
        granularity: Granularity,
    ) -> Result<Transcript> {
        if !audio_path.exists() {
            return Err(PipelineError::Transcription(format!(
                "Audio file does not exist: {}",
                audio_path.display()
            )));
        }

        let backend = match granularity {
            Granularity::Phrase => &self.phrase,
            Granularity::Word => &self.word,
        };

        info!(
            "Transcribing {} ({}, {:?} timestamps)",
            audio_path.display(),
            language,
            granularity
        );

        let chunks = backend
            .transcribe(audio_path, language)
            .await
            .map_err(|e| match e {
                PipelineError::Transcription(_) => e,
                other => PipelineError::Transcription(other.to_string()),
            })?;

        info!("Transcription produced {} chunks", chunks.len());
        Ok(Transcript { chunks, granularity })
    }
}

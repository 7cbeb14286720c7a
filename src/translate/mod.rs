// Subtitle translation
//
// SubtitleTranslator walks a SubRip document line by line and only sends
// text lines to a TranslationBackend. Backends:
// - ModernMt: ModernMT REST API
// - Ollama: local LLM prompted for a JSON reply

pub mod modernmt;
pub mod ollama;

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

pub use modernmt::ModernMtBackend;
pub use ollama::OllamaBackend;
use crate::config::{TranslateConfig, TranslationProvider};
use crate::error::{PipelineError, Result};
use crate::language::Language;
use crate::subtitle::{read_srt, write_srt, TIME_RANGE_ARROW};

/// Machine translation service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Translate one line of text between language codes
    async fn translate(&self, source_code: &str, target_code: &str, text: &str) -> Result<String>;

    /// Verify the service can be reached before any run starts
    async fn check_availability(&self) -> Result<()> {
        Ok(())
    }
}

/// Build the configured backend; done once per process and shared
pub fn create_backend(config: &TranslateConfig) -> Result<Arc<dyn TranslationBackend>> {
    Ok(match config.provider {
        TranslationProvider::ModernMt => Arc::new(ModernMtBackend::new(config)?),
        TranslationProvider::Ollama => Arc::new(OllamaBackend::new(config)?),
    })
}

/// Role of one physical line in a SubRip document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Index,
    TimeRange,
    Blank,
    Text,
}

impl LineKind {
    pub fn classify(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            Self::Blank
        } else if trimmed.chars().all(|c| c.is_ascii_digit()) {
            Self::Index
        } else if trimmed.contains(TIME_RANGE_ARROW) {
            Self::TimeRange
        } else {
            Self::Text
        }
    }
}

/// Translates subtitle documents while keeping their structure intact
#[derive(Clone)]
pub struct SubtitleTranslator {
    backend: Arc<dyn TranslationBackend>,
}

impl SubtitleTranslator {
    pub fn new(backend: Arc<dyn TranslationBackend>) -> Self {
        Self { backend }
    }

    pub async fn check_availability(&self) -> Result<()> {
        self.backend.check_availability().await
    }

    /// Translate every text line of `document`. Index, time-range and blank
    /// lines are copied through so cue numbering and timing stay in sync.
    ///
    /// The first failing line aborts the whole document.
    pub async fn translate_document(
        &self,
        document: &str,
        source: Language,
        target: Language,
    ) -> Result<String> {
        if source == target {
            info!("Source and target are both {}, keeping subtitles as-is", source);
            return Ok(document.to_string());
        }

        info!("Translating subtitles from {} to {}", source, target);

        let mut translated = String::with_capacity(document.len());
        let mut text_lines = 0usize;

        for line in document.split_inclusive('\n') {
            let body = line.trim_end_matches(['\n', '\r']);
            let line_ending = &line[body.len()..];

            match LineKind::classify(body) {
                LineKind::Index | LineKind::TimeRange => translated.push_str(line),
                LineKind::Blank => translated.push_str(line_ending),
                LineKind::Text => {
                    let source_text = body.trim();
                    let target_text = self
                        .backend
                        .translate(source.code(), target.code(), source_text)
                        .await
                        .map_err(|e| match e {
                            PipelineError::Translation(_) => e,
                            other => PipelineError::Translation(other.to_string()),
                        })?;

                    debug!("{} => {}", source_text, target_text);

                    // A multi-line reply would shift every following cue
                    let single_line = target_text.lines().map(str::trim).collect::<Vec<_>>().join(" ");
                    translated.push_str(single_line.trim());
                    translated.push_str(line_ending);
                    text_lines += 1;
                }
            }
        }

        info!("Translated {} subtitle lines", text_lines);
        Ok(translated)
    }

    /// Translate a subtitle file; nothing is written unless every line succeeds
    pub async fn translate_file(
        &self,
        input_path: &Path,
        output_path: &Path,
        source: Language,
        target: Language,
    ) -> Result<()> {
        let document = read_srt(input_path).await?;
        let translated = self.translate_document(&document, source, target).await?;
        write_srt(&translated, output_path).await
    }
}

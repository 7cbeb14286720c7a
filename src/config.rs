use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{PipelineError, Result};
use crate::language::{Language, DEFAULT_INPUT_LANGUAGES};
use crate::subtitle::ResetDetection;

fn default_merge_threshold() -> f64 {
    1.0
}

fn default_settle_delay_secs() -> f64 {
    5.0
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_output_languages() -> Vec<String> {
    Language::ALL.iter().map(|lang| lang.name().to_string()).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub transcriber: TranscriberConfig,
    pub translate: TranslateConfig,
    pub media: MediaConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub languages: LanguageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriberConfig {
    /// ASR command that writes `<audio stem>.json` with timestamped chunks
    pub binary_path: String,
    /// Model producing phrase-level chunks
    pub phrase_model: String,
    /// Model producing word-level chunks (Fon)
    pub word_model: String,
    /// Maximum gap (seconds) between words merged into one cue
    #[serde(default = "default_merge_threshold")]
    pub merge_threshold: f64,
    /// How timestamp resets are detected
    #[serde(default)]
    pub reset_detection: ResetDetection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    /// ModernMT REST API
    ModernMt,
    /// Local Ollama model
    Ollama,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    pub provider: TranslationProvider,
    /// Service base URL
    pub endpoint: String,
    /// ModernMT API key; falls back to MMT_API_KEY
    #[serde(default)]
    pub api_key: Option<String>,
    /// LLM model (Ollama only)
    pub model: String,
    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Encoding options for subtitle burn-in
    /// - crf: quality (0-51, lower = better quality)
    /// - preset: encoding speed (ultrafast, fast, medium, slow, veryslow)
    pub subtitle_options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pause between audio extraction and transcription
    #[serde(default = "default_settle_delay_secs")]
    pub settle_delay_secs: f64,
    /// Directory for intermediate and output files; defaults to the video's directory
    #[serde(default)]
    pub work_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// Spoken languages accepted as pipeline input
    pub input: Vec<String>,
    /// Languages subtitles may be produced in
    #[serde(default = "default_output_languages")]
    pub output: Vec<String>,
}

impl PipelineConfig {
    /// Negative values mean no delay; infinite or overflowing values are rejected
    pub fn settle_delay(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.settle_delay_secs.max(0.0)).map_err(|e| {
            PipelineError::Config(format!(
                "Invalid pipeline.settle_delay_secs {}: {}",
                self.settle_delay_secs, e
            ))
        })
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            settle_delay_secs: default_settle_delay_secs(),
            work_dir: None,
        }
    }
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            input: DEFAULT_INPUT_LANGUAGES
                .iter()
                .map(|lang| lang.name().to_string())
                .collect(),
            output: default_output_languages(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transcriber: TranscriberConfig {
                binary_path: "transcribe-chunks".to_string(),
                phrase_model: "neoform-ai/whisper-medium-yoruba".to_string(),
                word_model: "chrisjay/fonxlsr".to_string(),
                merge_threshold: default_merge_threshold(),
                reset_detection: ResetDetection::default(),
            },
            translate: TranslateConfig {
                provider: TranslationProvider::ModernMt,
                endpoint: "https://api.modernmt.com".to_string(),
                api_key: None,
                model: "llama3.2:3b".to_string(),
                timeout_secs: default_timeout_secs(),
            },
            media: MediaConfig {
                binary_path: "ffmpeg".to_string(),
                subtitle_options: vec![
                    "-crf".to_string(), "22".to_string(),
                    "-preset".to_string(), "fast".to_string(),
                ],
            },
            pipeline: PipelineConfig::default(),
            languages: LanguageConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| PipelineError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would only fail once a run is underway
    pub fn validate(&self) -> Result<()> {
        self.pipeline.settle_delay()?;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| PipelineError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| PipelineError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}

// Media encoder adapter
//
// - Commands: ffmpeg invocation builder
// - Processor: MediaProcessorTrait implementation on top of the builder

pub mod commands;
pub mod processor;

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

pub use commands::*;
pub use processor::*;

use crate::config::MediaConfig;
use crate::error::Result;

/// Main trait for media processing operations
#[async_trait]
pub trait MediaProcessorTrait: Send + Sync {
    /// Burn a subtitle file into a video; failures are `PipelineError::Mux`
    async fn embed_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
    ) -> Result<()>;

    /// Extract speech-model audio; failures are `PipelineError::Extraction`
    async fn extract_audio(&self, video_path: &Path, audio_path: &Path) -> Result<()>;

    /// Check if media processor is available
    async fn check_availability(&self) -> Result<()>;

    /// Get media processor version information
    async fn get_version_info(&self) -> Result<String>;
}

/// Factory for creating media processor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default media processor implementation (FFmpeg-based)
    pub fn create_processor(config: MediaConfig) -> Arc<dyn MediaProcessorTrait> {
        Arc::new(processor::MediaProcessorImpl::new(config))
    }
}

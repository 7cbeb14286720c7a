use async_trait::async_trait;
use std::path::Path;
use tracing::info;

use super::{MediaCommandBuilder, MediaProcessorTrait};
use crate::config::MediaConfig;
use crate::error::{PipelineError, Result};

/// Concrete implementation of media processor (FFmpeg-based)
pub struct MediaProcessorImpl {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
}

impl MediaProcessorImpl {
    /// Create a new media processor implementation
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.binary_path);

        Self {
            config,
            command_builder,
        }
    }
}

#[async_trait]
impl MediaProcessorTrait for MediaProcessorImpl {
    async fn embed_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
    ) -> Result<()> {
        info!(
            "Embedding subtitles from {} into {} -> {}",
            subtitle_path.display(),
            video_path.display(),
            output_path.display()
        );

        let command = self.command_builder.embed_subtitles(
            video_path,
            subtitle_path,
            output_path,
            &self.config.subtitle_options,
        );

        command
            .execute()
            .await
            .map_err(|e| PipelineError::Mux(e.to_string()))?;

        info!("Subtitle embedding completed successfully");
        Ok(())
    }

    async fn extract_audio(&self, video_path: &Path, audio_path: &Path) -> Result<()> {
        info!("Extracting audio from {} to {}", video_path.display(), audio_path.display());

        let command = self.command_builder.extract_audio(video_path, audio_path);
        command
            .execute()
            .await
            .map_err(|e| PipelineError::Extraction(e.to_string()))?;

        info!("Audio extraction completed");
        Ok(())
    }

    async fn check_availability(&self) -> Result<()> {
        self.get_version_info().await.map(|version| {
            info!("Media processor is available: {}", version);
        })
    }

    async fn get_version_info(&self) -> Result<String> {
        let stdout = self.command_builder.version_check().execute().await?;

        // First line carries the version
        Ok(stdout.lines().next().unwrap_or("Unknown version").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn processor_with_binary(binary: &str) -> MediaProcessorImpl {
        let mut config = Config::default().media;
        config.binary_path = binary.to_string();
        MediaProcessorImpl::new(config)
    }

    #[tokio::test]
    async fn test_extraction_failure_is_extraction_error() {
        let processor = processor_with_binary("/nonexistent/ffmpeg");

        let result = processor
            .extract_audio(Path::new("in.mp4"), Path::new("in.wav"))
            .await;

        assert!(matches!(result, Err(PipelineError::Extraction(_))));
    }

    #[tokio::test]
    async fn test_mux_failure_is_mux_error() {
        let processor = processor_with_binary("/nonexistent/ffmpeg");

        let result = processor
            .embed_subtitles(Path::new("in.mp4"), Path::new("in.srt"), Path::new("out.mp4"))
            .await;

        assert!(matches!(result, Err(PipelineError::Mux(_))));
        assert!(processor.check_availability().await.is_err());
    }
}

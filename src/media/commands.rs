use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::error::{PipelineError, Result};

/// Sample rate expected by the speech models
pub const AUDIO_SAMPLE_RATE: u32 = 16_000;

/// Abstract media processing command representation
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Set video codec
    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-acodec").arg(codec)
    }

    /// Copy audio stream
    pub fn copy_audio(self) -> Self {
        self.arg("-c:a").arg("copy")
    }

    /// Disable video
    pub fn no_video(self) -> Self {
        self.arg("-vn")
    }

    /// Set audio sample rate
    pub fn audio_sample_rate(self, rate: u32) -> Self {
        self.arg("-ar").arg(rate.to_string())
    }

    /// Set audio channels
    pub fn audio_channels(self, channels: u32) -> Self {
        self.arg("-ac").arg(channels.to_string())
    }

    /// Add video filter
    pub fn video_filter<S: Into<String>>(self, filter: S) -> Self {
        self.arg("-vf").arg(filter)
    }

    /// Execute the command, returning stdout on success
    pub async fn execute(&self) -> Result<String> {
        debug!("Executing media processing command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .output()
            .await
            .map_err(|e| PipelineError::Media(format!("Failed to execute media processor: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::Media(format!(
                "{} failed ({}): {}",
                self.description,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// `subtitles=` filter argument with the path quoted for ffmpeg's filter parser
pub fn subtitles_filter<P: AsRef<Path>>(subtitle_path: P) -> String {
    let path = subtitle_path.as_ref().to_string_lossy().replace('\'', r"'\''");
    format!("subtitles='{}'", path)
}

/// Builder for the encoder invocations the pipeline needs
pub struct MediaCommandBuilder {
    binary_path: String,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new<S: Into<String>>(binary_path: S) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    /// Build subtitle burn-in command: video re-encoded, audio copied
    pub fn embed_subtitles<P: AsRef<Path>>(
        &self,
        video_path: P,
        subtitle_path: P,
        output_path: P,
        encoding_options: &[String],
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Subtitle embedding")
            .overwrite()
            .input(&video_path)
            .video_filter(subtitles_filter(&subtitle_path))
            .video_codec("libx264")
            .copy_audio()
            .args(encoding_options.iter().cloned())
            .output(output_path)
    }

    /// Build audio extraction command: 16-bit PCM, 16 kHz, mono
    pub fn extract_audio<P: AsRef<Path>>(&self, video_path: P, audio_path: P) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Audio extraction")
            .overwrite()
            .input(video_path)
            .no_video()
            .audio_codec("pcm_s16le")
            .audio_sample_rate(AUDIO_SAMPLE_RATE)
            .audio_channels(1)
            .output(audio_path)
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Version check").arg("-version")
    }
}

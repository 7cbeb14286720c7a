// Pipeline orchestrator
//
// One run goes through a fixed sequence of stages, each awaiting the
// previous one:
//   ExtractingAudio -> Transcribing -> Translating -> Muxing -> Cleanup -> Done
// Any stage may end the run as Failed(stage). Intermediate files are only
// removed after a fully successful run so failed runs can be inspected.

pub mod run;

use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tracing::{error, info, info_span, warn, Instrument};
use walkdir::WalkDir;

pub use run::*;
use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::language::{Capabilities, LanguageTable};
use crate::media::{MediaProcessorFactory, MediaProcessorTrait};
use crate::subtitle::{write_srt, ResetDetection, SubtitleDocument};
use crate::transcribe::TranscriptProvider;
use crate::translate::{SubtitleTranslator, TranslationBackend};

/// Video extensions picked up by directory processing
pub const VIDEO_EXTENSIONS: [&str; 7] = ["mp4", "avi", "mov", "mkv", "wmv", "flv", "webm"];

/// Position of a run in the stage sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    ExtractingAudio,
    Transcribing,
    Translating,
    Muxing,
    Cleanup,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validating => "VALIDATING",
            Self::ExtractingAudio => "EXTRACTING_AUDIO",
            Self::Transcribing => "TRANSCRIBING",
            Self::Translating => "TRANSLATING",
            Self::Muxing => "MUXING",
            Self::Cleanup => "CLEANUP",
            Self::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// Terminal failure of a run, tagged with the stage it happened in
#[derive(Error, Debug)]
#[error("{stage} failed: {error}")]
pub struct RunFailure {
    pub stage: Stage,
    #[source]
    pub error: PipelineError,
}

impl RunFailure {
    fn at(stage: Stage) -> impl FnOnce(PipelineError) -> Self {
        move |error| Self { stage, error }
    }
}

/// Tunables shared by every run
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub settle_delay: Duration,
    pub work_dir: Option<PathBuf>,
    pub merge_threshold: f64,
    pub reset_detection: ResetDetection,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            settle_delay: config.pipeline.settle_delay()?,
            work_dir: config.pipeline.work_dir.clone(),
            merge_threshold: config.transcriber.merge_threshold,
            reset_detection: config.transcriber.reset_detection,
        })
    }
}

/// Video → subtitled video orchestrator.
///
/// Holds only immutable settings and shared backend handles, so one instance
/// can drive several runs concurrently.
pub struct Pipeline {
    media: Arc<dyn MediaProcessorTrait>,
    transcripts: TranscriptProvider,
    translator: SubtitleTranslator,
    languages: LanguageTable,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        media: Arc<dyn MediaProcessorTrait>,
        transcripts: TranscriptProvider,
        translator: SubtitleTranslator,
        languages: LanguageTable,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            media,
            transcripts,
            translator,
            languages,
            settings,
        }
    }

    /// Wire the ffmpeg and command-line ASR adapters around an injected translation backend
    pub fn from_config(config: &Config, translation: Arc<dyn TranslationBackend>) -> Result<Self> {
        Ok(Self::new(
            MediaProcessorFactory::create_processor(config.media.clone()),
            TranscriptProvider::from_config(&config.transcriber),
            SubtitleTranslator::new(translation),
            LanguageTable::from_config(&config.languages)?,
            PipelineSettings::from_config(config)?,
        ))
    }

    /// Fail early when the encoder or a backend cannot be used
    pub async fn check_dependencies(&self) -> Result<()> {
        self.media.check_availability().await?;
        self.transcripts.check_availability().await?;
        self.translator.check_availability().await
    }

    pub fn languages(&self) -> &LanguageTable {
        &self.languages
    }

    /// Run the pipeline and return the subtitled video, or `None` on failure.
    /// Failures are logged with their stage and never propagate to the caller.
    pub async fn process<P: AsRef<Path>>(
        &self,
        video_path: P,
        input_lang: &str,
        output_lang: &str,
        dub: bool,
    ) -> Option<PathBuf> {
        let video_path = video_path.as_ref();
        match self.try_process(video_path, input_lang, output_lang, dub).await {
            Ok(output) => {
                info!("Processed video with subtitles is available at {}", output.display());
                Some(output)
            }
            Err(failure) => {
                error!("Processing {} failed during {}: {}", video_path.display(), failure.stage, failure.error);
                None
            }
        }
    }

    /// Same as [`Pipeline::process`] but reports the failing stage and error
    pub async fn try_process<P: AsRef<Path>>(
        &self,
        video_path: P,
        input_lang: &str,
        output_lang: &str,
        dub: bool,
    ) -> std::result::Result<PathBuf, RunFailure> {
        let validating = RunFailure::at(Stage::Validating);

        let (run, paths, capabilities) = self
            .prepare(video_path.as_ref(), input_lang, output_lang, dub)
            .map_err(validating)?;

        let span = info_span!("run", run_id = %run.run_id);
        self.execute(&run, &paths, capabilities).instrument(span).await
    }

    /// Validate the request and derive run paths; no side effects
    fn prepare(
        &self,
        video_path: &Path,
        input_lang: &str,
        output_lang: &str,
        dub: bool,
    ) -> Result<(PipelineRun, RunPaths, Capabilities)> {
        let input = self.languages.resolve_input(input_lang)?;
        let output = self.languages.resolve_output(output_lang)?;

        if !video_path.is_file() {
            return Err(PipelineError::FileNotFound(video_path.display().to_string()));
        }
        let video_path = std::path::absolute(video_path)?;

        if let Some(work_dir) = &self.settings.work_dir {
            if !work_dir.is_dir() {
                return Err(PipelineError::Config(format!(
                    "Work directory does not exist: {}",
                    work_dir.display()
                )));
            }
        }

        let run = PipelineRun::new(video_path, input, output, dub);
        let paths = run.paths(self.settings.work_dir.as_deref())?;

        Ok((run, paths, self.languages.capabilities(input)))
    }

    async fn execute(
        &self,
        run: &PipelineRun,
        paths: &RunPaths,
        capabilities: Capabilities,
    ) -> std::result::Result<PathBuf, RunFailure> {
        info!(
            "Starting run for {} ({} -> {})",
            run.video_path.display(),
            run.input_lang,
            run.output_lang
        );

        info!("[{}] {}", Stage::ExtractingAudio, paths.audio.display());
        self.media
            .extract_audio(&run.video_path, &paths.audio)
            .await
            .map_err(RunFailure::at(Stage::ExtractingAudio))?;

        if !self.settings.settle_delay.is_zero() {
            tokio::time::sleep(self.settings.settle_delay).await;
        }

        info!("[{}] {}", Stage::Transcribing, paths.source_subtitle.display());
        self.transcribe_to_srt(run, paths, capabilities)
            .await
            .map_err(RunFailure::at(Stage::Transcribing))?;

        info!("[{}] {}", Stage::Translating, paths.translated_subtitle.display());
        self.translator
            .translate_file(
                &paths.source_subtitle,
                &paths.translated_subtitle,
                run.input_lang,
                run.output_lang,
            )
            .await
            .map_err(RunFailure::at(Stage::Translating))?;

        info!("[{}] {}", Stage::Muxing, paths.output_video.display());
        self.media
            .embed_subtitles(&run.video_path, &paths.translated_subtitle, &paths.output_video)
            .await
            .map_err(RunFailure::at(Stage::Muxing))?;

        if run.dub {
            if self.languages.dub_supported(run.input_lang, run.output_lang) {
                warn!("Dubbing feature is not implemented yet");
            } else {
                warn!(
                    "Dubbing is not available for {} -> {} (and is not implemented yet)",
                    run.input_lang, run.output_lang
                );
            }
        }

        info!("[{}] removing intermediate files", Stage::Cleanup);
        remove_intermediates(paths).await;

        let elapsed = chrono::Utc::now() - run.started_at;
        info!("[{}] finished in {}s", Stage::Done, elapsed.num_seconds());
        Ok(paths.output_video.clone())
    }

    async fn transcribe_to_srt(
        &self,
        run: &PipelineRun,
        paths: &RunPaths,
        capabilities: Capabilities,
    ) -> Result<()> {
        let transcript = self
            .transcripts
            .transcribe(&paths.audio, run.input_lang, capabilities.granularity)
            .await?;

        let document = SubtitleDocument::from_chunks(
            transcript.chunks,
            transcript.granularity,
            self.settings.reset_detection,
            self.settings.merge_threshold,
        );
        info!("Generated {} subtitle cues", document.len());

        write_srt(&document.to_srt(), &paths.source_subtitle).await
    }

    /// Process every video below `input_dir` one at a time. A failing video is
    /// logged and skipped; the produced outputs are returned.
    pub async fn process_directory<P: AsRef<Path>>(
        &self,
        input_dir: P,
        input_lang: &str,
        output_lang: &str,
        dub: bool,
    ) -> Result<Vec<PathBuf>> {
        let input_dir = input_dir.as_ref();
        info!("Processing directory: {}", input_dir.display());

        if !input_dir.is_dir() {
            return Err(PipelineError::Config(format!(
                "Input path is not a directory: {}",
                input_dir.display()
            )));
        }

        let videos = find_videos(input_dir);
        info!("Found {} video files to process", videos.len());

        let progress = ProgressBar::new(videos.len() as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .map_err(|e| PipelineError::Config(format!("Invalid progress template: {}", e)))?
                .progress_chars("#>-"),
        );

        let mut outputs = Vec::new();
        for video in videos {
            progress.set_message(video.file_name().unwrap_or_default().to_string_lossy().into_owned());

            match self.process(&video, input_lang, output_lang, dub).await {
                Some(output) => outputs.push(output),
                None => warn!("Failed to process {}", video.display()),
            }
            progress.inc(1);
        }

        progress.finish_with_message("done");
        info!("Produced {} subtitled videos", outputs.len());
        Ok(outputs)
    }
}

/// Videos below `dir`, skipping outputs of earlier runs
fn find_videos(dir: &Path) -> Vec<PathBuf> {
    let mut videos: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| {
            let is_video = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                .unwrap_or(false);
            let is_output = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().contains("_subtitled_"))
                .unwrap_or(false);
            is_video && !is_output
        })
        .collect();

    videos.sort();
    videos
}

async fn remove_intermediates(paths: &RunPaths) {
    for path in paths.intermediates() {
        if let Err(e) = fs::remove_file(path).await {
            warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}

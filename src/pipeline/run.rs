use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{PipelineError, Result};
use crate::language::Language;

/// Extension used when the source video has none
const DEFAULT_VIDEO_EXTENSION: &str = "mp4";

/// One end-to-end execution for a single source video
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub video_path: PathBuf,
    pub input_lang: Language,
    pub output_lang: Language,
    pub dub: bool,
    /// Unique token embedded in every file this run writes
    pub run_id: String,
    pub started_at: DateTime<Utc>,
}

impl PipelineRun {
    pub fn new<P: Into<PathBuf>>(video_path: P, input_lang: Language, output_lang: Language, dub: bool) -> Self {
        Self {
            video_path: video_path.into(),
            input_lang,
            output_lang,
            dub,
            run_id: Uuid::new_v4().simple().to_string(),
            started_at: Utc::now(),
        }
    }

    /// Derive every artifact path for this run
    pub fn paths(&self, work_dir: Option<&Path>) -> Result<RunPaths> {
        RunPaths::derive(self, work_dir)
    }
}

/// Files produced by a run; everything but `output_video` is intermediate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    pub audio: PathBuf,
    pub source_subtitle: PathBuf,
    pub translated_subtitle: PathBuf,
    pub output_video: PathBuf,
}

impl RunPaths {
    /// Names are built from `{stem}_{...parts}.{ext}` in `work_dir`, or next
    /// to the video when no work dir is configured.
    pub fn derive(run: &PipelineRun, work_dir: Option<&Path>) -> Result<Self> {
        let stem = run
            .video_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                PipelineError::Config(format!("Invalid video filename: {}", run.video_path.display()))
            })?;

        let extension = run
            .video_path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_VIDEO_EXTENSION.to_string());

        let dir = match work_dir {
            Some(dir) => dir.to_path_buf(),
            None => run
                .video_path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        };

        let artifact = |parts: &[&str], ext: &str| dir.join(format!("{}.{}", parts.join("_"), ext));

        let id = run.run_id.as_str();
        let target = run.output_lang.name();

        Ok(Self {
            audio: artifact(&[stem.as_str(), id], "wav"),
            source_subtitle: artifact(&[stem.as_str(), id], "srt"),
            translated_subtitle: artifact(&[stem.as_str(), id, target], "srt"),
            output_video: artifact(&[stem.as_str(), "subtitled", target, id], &extension),
        })
    }

    /// Files deleted once the run succeeds
    pub fn intermediates(&self) -> [&Path; 3] {
        [
            self.audio.as_path(),
            self.source_subtitle.as_path(),
            self.translated_subtitle.as_path(),
        ]
    }
}

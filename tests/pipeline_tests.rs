use assert_fs::prelude::*;
use assert_fs::TempDir;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::assert_ok;

use vidsub::error::{PipelineError, Result};
use vidsub::language::{Language, LanguageTable};
use vidsub::media::MediaProcessorTrait;
use vidsub::pipeline::{Pipeline, PipelineSettings, Stage};
use vidsub::subtitle::{parse_srt, ResetDetection};
use vidsub::transcribe::{Chunk, Granularity, TranscriptProvider, TranscriptionBackend};
use vidsub::translate::{SubtitleTranslator, TranslationBackend};

/// Writes placeholder audio and "muxes" by copying the subtitle text into the output
#[derive(Default)]
struct FakeMedia {
    fail_mux: bool,
}

#[async_trait]
impl MediaProcessorTrait for FakeMedia {
    async fn embed_subtitles(&self, _video: &Path, subtitle_path: &Path, output_path: &Path) -> Result<()> {
        if self.fail_mux {
            return Err(PipelineError::Mux("encoder exited with status 1".to_string()));
        }
        let subtitles = tokio::fs::read_to_string(subtitle_path).await?;
        tokio::fs::write(output_path, subtitles).await?;
        Ok(())
    }

    async fn extract_audio(&self, video_path: &Path, audio_path: &Path) -> Result<()> {
        let video = tokio::fs::read_to_string(video_path).await?;
        if video == "corrupt" {
            return Err(PipelineError::Extraction("invalid data found when processing input".to_string()));
        }
        tokio::fs::write(audio_path, b"RIFF").await?;
        Ok(())
    }

    async fn check_availability(&self) -> Result<()> {
        Ok(())
    }

    async fn get_version_info(&self) -> Result<String> {
        Ok("fake".to_string())
    }
}

struct StubTranscriber {
    chunks: Vec<Chunk>,
    fail: bool,
    calls: AtomicUsize,
}

impl StubTranscriber {
    fn returning(chunks: Vec<Chunk>) -> Arc<Self> {
        Arc::new(Self { chunks, fail: false, calls: AtomicUsize::new(0) })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self { chunks: Vec::new(), fail: true, calls: AtomicUsize::new(0) })
    }
}

#[async_trait]
impl TranscriptionBackend for StubTranscriber {
    async fn transcribe(&self, audio_path: &Path, _language: Language) -> Result<Vec<Chunk>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(audio_path.exists(), "audio must be extracted before transcription");
        if self.fail {
            return Err(PipelineError::Transcription("model not found".to_string()));
        }
        Ok(self.chunks.clone())
    }
}

/// Prefixes each line with the target code
struct StubTranslator {
    fail: bool,
    calls: AtomicUsize,
}

impl StubTranslator {
    fn new() -> Arc<Self> {
        Arc::new(Self { fail: false, calls: AtomicUsize::new(0) })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self { fail: true, calls: AtomicUsize::new(0) })
    }
}

#[async_trait]
impl TranslationBackend for StubTranslator {
    async fn translate(&self, _source_code: &str, target_code: &str, text: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(PipelineError::Translation("service unavailable".to_string()));
        }
        Ok(format!("[{}] {}", target_code, text))
    }
}

fn yoruba_chunks() -> Vec<Chunk> {
    vec![
        Chunk::new(0.0, 1.5, "Bawo ni"),
        Chunk::new(1.5, 3.0, "E kaabo"),
    ]
}

fn settings() -> PipelineSettings {
    PipelineSettings {
        settle_delay: Duration::ZERO,
        work_dir: None,
        merge_threshold: 1.0,
        reset_detection: ResetDetection::Overlap,
    }
}

struct Harness {
    pipeline: Pipeline,
    phrase: Arc<StubTranscriber>,
    word: Arc<StubTranscriber>,
    translator: Arc<StubTranslator>,
}

fn harness(media: FakeMedia, phrase: Arc<StubTranscriber>, translator: Arc<StubTranslator>) -> Harness {
    let word = StubTranscriber::returning(vec![
        Chunk::new(0.0, 0.4, "Mi"),
        Chunk::new(0.5, 0.9, "kúdo"),
        Chunk::new(3.0, 3.5, "àbɔ̀"),
    ]);

    let pipeline = Pipeline::new(
        Arc::new(media),
        TranscriptProvider::new(phrase.clone(), word.clone()),
        SubtitleTranslator::new(translator.clone()),
        LanguageTable::default(),
        settings(),
    );

    Harness { pipeline, phrase, word, translator }
}

fn default_harness() -> Harness {
    harness(FakeMedia::default(), StubTranscriber::returning(yoruba_chunks()), StubTranslator::new())
}

fn video_fixture(dir: &TempDir, name: &str) -> PathBuf {
    let video = dir.child(name);
    video.write_str("video").unwrap();
    video.path().to_path_buf()
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn count_with_suffix(dir: &Path, suffix: &str) -> usize {
    files_in(dir).iter().filter(|name| name.ends_with(suffix)).count()
}

#[tokio::test]
async fn test_successful_run_removes_intermediates() {
    let temp = TempDir::new().unwrap();
    let video = video_fixture(&temp, "talk.mp4");
    let h = default_harness();

    let output = assert_ok!(h.pipeline.try_process(&video, "Yoruba", "English", false).await);

    assert!(output.exists());
    let name = output.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("talk_subtitled_English_"));
    assert!(name.ends_with(".mp4"));

    let subtitles = std::fs::read_to_string(&output).unwrap();
    assert_eq!(
        subtitles,
        "1\n00:00:00,000 --> 00:00:01,500\n[en] Bawo ni\n\n2\n00:00:01,500 --> 00:00:03,000\n[en] E kaabo\n\n"
    );

    // Only the source video and the final output remain
    assert_eq!(files_in(temp.path()).len(), 2);
    assert_eq!(h.phrase.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.word.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.translator.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_unsupported_input_language_fails_before_side_effects() {
    let temp = TempDir::new().unwrap();
    let video = video_fixture(&temp, "talk.mp4");
    let h = default_harness();

    let failure = h.pipeline.try_process(&video, "Spanish", "English", false).await.unwrap_err();

    assert_eq!(failure.stage, Stage::Validating);
    assert!(matches!(failure.error, PipelineError::UnsupportedLanguage(_)));
    assert_eq!(count_with_suffix(temp.path(), ".wav"), 0);
    assert_eq!(h.phrase.calls.load(Ordering::SeqCst), 0);

    assert!(h.pipeline.process(&video, "Klingon", "English", false).await.is_none());
}

#[tokio::test]
async fn test_missing_video_is_reported() {
    let temp = TempDir::new().unwrap();
    let h = default_harness();

    let failure = h
        .pipeline
        .try_process(temp.path().join("absent.mp4"), "Yoruba", "English", false)
        .await
        .unwrap_err();

    assert_eq!(failure.stage, Stage::Validating);
    assert!(matches!(failure.error, PipelineError::FileNotFound(_)));
}

#[tokio::test]
async fn test_concurrent_runs_on_same_video_do_not_collide() {
    let temp = TempDir::new().unwrap();
    let video = video_fixture(&temp, "talk.mp4");
    let h = default_harness();

    let (english, french) = tokio::join!(
        h.pipeline.process(&video, "Yoruba", "English", false),
        h.pipeline.process(&video, "Yoruba", "French", false),
    );

    let english = english.expect("english run should succeed");
    let french = french.expect("french run should succeed");
    assert_ne!(english, french);

    let english_srt = std::fs::read_to_string(&english).unwrap();
    let french_srt = std::fs::read_to_string(&french).unwrap();
    assert!(english_srt.contains("[en] Bawo ni"));
    assert!(!english_srt.contains("[fr]"));
    assert!(french_srt.contains("[fr] E kaabo"));
    assert!(!french_srt.contains("[en]"));

    assert_eq!(files_in(temp.path()).len(), 3);
}

#[tokio::test]
async fn test_word_level_language_merges_words() {
    let temp = TempDir::new().unwrap();
    let video = video_fixture(&temp, "fon.mp4");
    let h = default_harness();

    let output = assert_ok!(h.pipeline.try_process(&video, "Fon", "French", false).await);

    let subtitles = std::fs::read_to_string(output).unwrap();
    assert_eq!(
        subtitles,
        "1\n00:00:00,000 --> 00:00:00,900\n[fr] Mi kúdo\n\n2\n00:00:03,000 --> 00:00:03,500\n[fr] àbɔ̀\n\n"
    );
    assert_eq!(h.word.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.phrase.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_same_language_skips_translation() {
    let temp = TempDir::new().unwrap();
    let video = video_fixture(&temp, "talk.mp4");
    let h = default_harness();

    let output = assert_ok!(h.pipeline.try_process(&video, "yo", "Yoruba", false).await);

    let subtitles = std::fs::read_to_string(output).unwrap();
    assert!(subtitles.contains("\nBawo ni\n"));
    assert_eq!(h.translator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_extraction_failure() {
    let temp = TempDir::new().unwrap();
    let video = temp.child("broken.mp4");
    video.write_str("corrupt").unwrap();
    let h = default_harness();

    let failure = h.pipeline.try_process(video.path(), "Yoruba", "English", false).await.unwrap_err();

    assert_eq!(failure.stage, Stage::ExtractingAudio);
    assert!(matches!(failure.error, PipelineError::Extraction(_)));
    assert_eq!(h.phrase.calls.load(Ordering::SeqCst), 0);
    assert!(h.pipeline.process(video.path(), "Yoruba", "English", false).await.is_none());
}

#[tokio::test]
async fn test_transcription_failure_keeps_audio() {
    let temp = TempDir::new().unwrap();
    let video = video_fixture(&temp, "talk.mp4");
    let h = harness(FakeMedia::default(), StubTranscriber::failing(), StubTranslator::new());

    let failure = h.pipeline.try_process(&video, "Yoruba", "English", false).await.unwrap_err();

    assert_eq!(failure.stage, Stage::Transcribing);
    assert!(matches!(failure.error, PipelineError::Transcription(_)));
    assert_eq!(count_with_suffix(temp.path(), ".wav"), 1);
    assert_eq!(count_with_suffix(temp.path(), ".srt"), 0);
    assert_eq!(h.translator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_translation_failure_writes_no_translated_file() {
    let temp = TempDir::new().unwrap();
    let video = video_fixture(&temp, "talk.mp4");
    let h = harness(
        FakeMedia::default(),
        StubTranscriber::returning(yoruba_chunks()),
        StubTranslator::failing(),
    );

    let output = h.pipeline.process(&video, "Yoruba", "English", false).await;

    assert!(output.is_none());
    assert_eq!(count_with_suffix(temp.path(), ".wav"), 1);
    assert_eq!(count_with_suffix(temp.path(), ".srt"), 1);
    assert_eq!(count_with_suffix(temp.path(), "_English.srt"), 0);
    // Aborted on the first text line
    assert_eq!(h.translator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_mux_failure_keeps_intermediates() {
    let temp = TempDir::new().unwrap();
    let video = video_fixture(&temp, "talk.mp4");
    let h = harness(
        FakeMedia { fail_mux: true },
        StubTranscriber::returning(yoruba_chunks()),
        StubTranslator::new(),
    );

    let failure = h.pipeline.try_process(&video, "Yoruba", "English", false).await.unwrap_err();

    assert_eq!(failure.stage, Stage::Muxing);
    assert!(matches!(failure.error, PipelineError::Mux(_)));
    assert_eq!(count_with_suffix(temp.path(), ".wav"), 1);
    assert_eq!(count_with_suffix(temp.path(), ".srt"), 2);
    assert_eq!(files_in(temp.path()).iter().filter(|n| n.contains("_subtitled_")).count(), 0);
}

#[tokio::test]
async fn test_dub_flag_does_not_change_output() {
    let temp = TempDir::new().unwrap();
    let video = video_fixture(&temp, "talk.mp4");
    let h = default_harness();

    let plain = assert_ok!(h.pipeline.try_process(&video, "Yoruba", "English", false).await);
    let dubbed = assert_ok!(h.pipeline.try_process(&video, "Yoruba", "English", true).await);

    assert_eq!(
        std::fs::read_to_string(plain).unwrap(),
        std::fs::read_to_string(dubbed).unwrap()
    );
}

#[tokio::test]
async fn test_work_dir_holds_all_artifacts() {
    let videos = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let video = video_fixture(&videos, "talk.mp4");

    let mut settings = settings();
    settings.work_dir = Some(work.path().to_path_buf());
    let pipeline = Pipeline::new(
        Arc::new(FakeMedia::default()),
        TranscriptProvider::new(
            StubTranscriber::returning(yoruba_chunks()),
            StubTranscriber::returning(Vec::new()),
        ),
        SubtitleTranslator::new(StubTranslator::new()),
        LanguageTable::default(),
        settings,
    );

    let output = assert_ok!(pipeline.try_process(&video, "Yoruba", "English", false).await);

    assert_eq!(output.parent().unwrap(), work.path());
    assert_eq!(files_in(videos.path()), vec!["talk.mp4"]);
    assert_eq!(files_in(work.path()).len(), 1);
}

#[tokio::test]
async fn test_missing_work_dir_fails_validation() {
    let temp = TempDir::new().unwrap();
    let video = video_fixture(&temp, "talk.mp4");

    let mut settings = settings();
    settings.work_dir = Some(temp.path().join("not-created"));
    let pipeline = Pipeline::new(
        Arc::new(FakeMedia::default()),
        TranscriptProvider::new(
            StubTranscriber::returning(yoruba_chunks()),
            StubTranscriber::returning(Vec::new()),
        ),
        SubtitleTranslator::new(StubTranslator::new()),
        LanguageTable::default(),
        settings,
    );

    let failure = pipeline.try_process(&video, "Yoruba", "English", false).await.unwrap_err();

    assert_eq!(failure.stage, Stage::Validating);
    assert!(matches!(failure.error, PipelineError::Config(_)));
    assert_eq!(files_in(temp.path()), vec!["talk.mp4"]);
}

#[tokio::test]
async fn test_multiline_transcript_text_keeps_srt_layout() {
    let temp = TempDir::new().unwrap();
    let video = video_fixture(&temp, "talk.mp4");
    let h = harness(
        FakeMedia::default(),
        StubTranscriber::returning(vec![Chunk::new(0.0, 1.0, "Hello\n\nworld")]),
        StubTranslator::new(),
    );

    let output = assert_ok!(h.pipeline.try_process(&video, "English", "English", false).await);

    let subtitles = std::fs::read_to_string(output).unwrap();
    assert_eq!(subtitles, "1\n00:00:00,000 --> 00:00:01,000\nHello world\n\n");
    assert_eq!(assert_ok!(parse_srt(&subtitles)).len(), 1);
}

#[tokio::test]
async fn test_process_directory_skips_failures() {
    let temp = TempDir::new().unwrap();
    temp.child("a.mp4").write_str("video").unwrap();
    temp.child("nested/b.mkv").write_str("video").unwrap();
    temp.child("broken.mp4").write_str("corrupt").unwrap();
    temp.child("readme.txt").write_str("not a video").unwrap();
    let h = default_harness();

    let outputs = assert_ok!(h.pipeline.process_directory(temp.path(), "Yoruba", "English", false).await);

    assert_eq!(outputs.len(), 2);
    assert!(outputs.iter().all(|p| p.exists()));
    assert!(outputs.iter().any(|p| p.extension().unwrap() == "mkv"));
}

#[tokio::test]
async fn test_process_directory_rejects_file() {
    let temp = TempDir::new().unwrap();
    let video = video_fixture(&temp, "talk.mp4");
    let h = default_harness();

    let result = h.pipeline.process_directory(&video, "Yoruba", "English", false).await;

    assert!(matches!(result, Err(PipelineError::Config(_))));
}

#[tokio::test]
async fn test_dependency_check_and_language_table() {
    let h = default_harness();

    assert_ok!(h.pipeline.check_dependencies().await);

    let languages = h.pipeline.languages();
    assert_eq!(languages.capabilities(Language::Fon).granularity, Granularity::Word);
    assert!(!languages.capabilities(Language::Spanish).input);
    assert!(!languages.dub_supported(Language::Fon, Language::English));
}

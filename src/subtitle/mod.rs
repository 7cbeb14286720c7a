// Transcript-to-subtitle conversion
//
// Raw chunks from a transcription backend flow through three steps:
// - timing: repair timestamps that reset mid-stream
// - cues: turn chunks into indexed cues (1:1 for phrases, gap-merged for words)
// - srt: render cues into the SubRip document consumed by ffmpeg

pub mod cues;
pub mod srt;
pub mod timing;

pub use cues::*;
pub use srt::*;
pub use timing::*;

use crate::transcribe::{Chunk, Granularity};

/// A finalized, indexed subtitle entry
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    /// One-based position in the document
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Ordered cues rendered as one SubRip document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubtitleDocument {
    pub cues: Vec<Cue>,
}

impl SubtitleDocument {
    /// Normalize and merge backend chunks according to their granularity
    pub fn from_chunks(
        chunks: Vec<Chunk>,
        granularity: Granularity,
        detection: ResetDetection,
        merge_threshold: f64,
    ) -> Self {
        let normalized = normalize_timestamps(chunks, detection);
        let cues = match granularity {
            Granularity::Phrase => phrase_cues(normalized),
            Granularity::Word => merge_word_cues(normalized, merge_threshold),
        };
        Self { cues }
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn to_srt(&self) -> String {
        format_srt(&self.cues)
    }
}

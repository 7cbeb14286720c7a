use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::transcribe::Chunk;

/// Trigger used to decide that a chunk's timestamps have reset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetDetection {
    /// A chunk starting before the previous chunk ended is a reset
    #[default]
    Overlap,
    /// Trust backend timestamps as-is
    Disabled,
}

/// Repair chunks whose timestamps jump backwards mid-stream.
///
/// A reset chunk is moved to start where the previous one ended and keeps its
/// original duration. Single forward pass; emitted chunks are never revisited.
pub fn normalize_timestamps(chunks: Vec<Chunk>, detection: ResetDetection) -> Vec<Chunk> {
    let mut last_end = 0.0_f64;

    chunks
        .into_iter()
        .map(|mut chunk| {
            if chunk.end < chunk.start {
                chunk.end = chunk.start;
            }

            if detection == ResetDetection::Overlap && chunk.start < last_end {
                let duration = chunk.end - chunk.start;
                debug!(
                    "Timestamp reset at {:.3}s (previous end {:.3}s), shifting chunk",
                    chunk.start, last_end
                );
                chunk.start = last_end;
                chunk.end = last_end + duration;
            }

            last_end = chunk.end;
            chunk
        })
        .collect()
}

use super::Cue;
use crate::transcribe::Chunk;

/// Cue text must stay on one line or the SRT block layout breaks
fn single_line(text: &str) -> String {
    text.split(['\r', '\n'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Phrase mode: every chunk becomes one cue
pub fn phrase_cues(chunks: Vec<Chunk>) -> Vec<Cue> {
    chunks
        .into_iter()
        .enumerate()
        .map(|(idx, chunk)| Cue {
            index: idx + 1,
            start: chunk.start,
            end: chunk.end,
            text: single_line(&chunk.text),
        })
        .collect()
}

/// Running cue being accumulated from word chunks
struct PendingCue {
    start: f64,
    end: f64,
    words: Vec<String>,
}

impl PendingCue {
    fn open(chunk: Chunk) -> Self {
        let mut pending = Self {
            start: chunk.start,
            end: chunk.end,
            words: Vec::new(),
        };
        pending.push_text(&chunk.text);
        pending
    }

    fn push_text(&mut self, text: &str) {
        let word = single_line(text);
        if !word.is_empty() {
            self.words.push(word);
        }
    }

    fn seal(self, index: usize) -> Cue {
        Cue {
            index,
            start: self.start,
            end: self.end,
            text: self.words.join(" "),
        }
    }
}

/// Word mode: merge consecutive chunks while the silence between them is at
/// most `merge_threshold` seconds. The last cue is always flushed.
pub fn merge_word_cues(chunks: Vec<Chunk>, merge_threshold: f64) -> Vec<Cue> {
    let mut cues = Vec::new();
    let mut current: Option<PendingCue> = None;

    for chunk in chunks {
        current = Some(match current.take() {
            None => PendingCue::open(chunk),
            Some(mut pending) if chunk.start - pending.end <= merge_threshold => {
                pending.end = chunk.end;
                pending.push_text(&chunk.text);
                pending
            }
            Some(pending) => {
                cues.push(pending.seal(cues.len() + 1));
                PendingCue::open(chunk)
            }
        });
    }

    if let Some(pending) = current {
        cues.push(pending.seal(cues.len() + 1));
    }

    cues
}

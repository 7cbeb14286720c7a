use std::path::Path;
use tokio::fs;
use tracing::info;

use super::Cue;
use crate::error::{PipelineError, Result};

/// Separator between the start and end timestamps of a cue
pub const TIME_RANGE_ARROW: &str = "-->";

/// Render cues as a SubRip document: `index\nHH:MM:SS,mmm --> HH:MM:SS,mmm\ntext\n\n`
pub fn format_srt(cues: &[Cue]) -> String {
    let mut srt_content = String::new();

    for cue in cues {
        srt_content.push_str(&format!(
            "{}\n{} {} {}\n{}\n\n",
            cue.index,
            format_srt_time(cue.start),
            TIME_RANGE_ARROW,
            format_srt_time(cue.end),
            cue.text
        ));
    }

    srt_content
}

/// Format time in seconds to SRT time format (HH:MM:SS,mmm).
///
/// Whole seconds are floored and milliseconds truncated. The value is first
/// rounded to whole microseconds so float noise such as `1.001` stored as
/// `1.000999...` still renders as `,001`.
pub fn format_srt_time(seconds: f64) -> String {
    let total_micros = (seconds.max(0.0) * 1_000_000.0).round() as u64;
    let total_seconds = total_micros / 1_000_000;
    let millis = (total_micros % 1_000_000) / 1_000;

    let hours = total_seconds / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let secs = total_seconds % 60;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Parse an `HH:MM:SS,mmm` timestamp back into seconds
pub fn parse_srt_time(value: &str) -> Result<f64> {
    let invalid = || PipelineError::Subtitle(format!("Invalid timestamp: {}", value));

    let mut parts = value.trim().split(':');
    let (Some(h), Some(m), Some(rest), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };
    let (s, ms) = rest.split_once([',', '.']).ok_or_else(invalid)?;

    let hours: u64 = h.parse().map_err(|_| invalid())?;
    let minutes: u64 = m.parse().map_err(|_| invalid())?;
    let secs: u64 = s.parse().map_err(|_| invalid())?;
    let millis: u64 = ms.parse().map_err(|_| invalid())?;

    let whole = (hours * 3_600 + minutes * 60 + secs) as f64;
    Ok(whole + millis as f64 / 1_000.0)
}

/// Parse a SubRip document into cues
pub fn parse_srt(content: &str) -> Result<Vec<Cue>> {
    let mut cues = Vec::new();
    let mut lines = content.lines().enumerate().peekable();

    while let Some((line_no, line)) = lines.next() {
        if line.trim().is_empty() {
            continue;
        }

        let index: usize = line.trim().parse().map_err(|_| {
            PipelineError::Subtitle(format!("Line {}: expected cue index, got {:?}", line_no + 1, line))
        })?;

        let (time_no, time_line) = lines.next().ok_or_else(|| {
            PipelineError::Subtitle(format!("Cue {} has no time range", index))
        })?;
        let (start, end) = time_line.split_once(TIME_RANGE_ARROW).ok_or_else(|| {
            PipelineError::Subtitle(format!(
                "Line {}: expected time range, got {:?}",
                time_no + 1,
                time_line
            ))
        })?;

        let mut text_lines = Vec::new();
        while let Some((_, text)) = lines.next_if(|(_, l)| !l.trim().is_empty()) {
            text_lines.push(text);
        }

        cues.push(Cue {
            index,
            start: parse_srt_time(start)?,
            end: parse_srt_time(end)?,
            text: text_lines.join("\n"),
        });
    }

    Ok(cues)
}

/// Write a subtitle document to disk
pub async fn write_srt<P: AsRef<Path>>(content: &str, output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    info!("Writing SRT file: {}", output_path.display());

    fs::write(output_path, content).await?;
    Ok(())
}

/// Read a subtitle document from disk
pub async fn read_srt<P: AsRef<Path>>(input_path: P) -> Result<String> {
    let input_path = input_path.as_ref();
    if !input_path.exists() {
        return Err(PipelineError::FileNotFound(input_path.display().to_string()));
    }

    Ok(fs::read_to_string(input_path).await?)
}

//! vidsub - subtitle pipeline for spoken-language video
//!
//! Audio is extracted with ffmpeg, transcribed by a speech model, cleaned up
//! into SRT cues, translated line by line and burned back into the video.

pub mod cli;
pub mod config;
pub mod error;
pub mod language;
pub mod media;
pub mod pipeline;
pub mod subtitle;
pub mod transcribe;
pub mod translate;

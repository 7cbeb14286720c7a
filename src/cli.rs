use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Transcribe, translate and burn subtitles into a single video
    Process {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Spoken language of the video (name or code)
        #[arg(long)]
        input_lang: String,

        /// Subtitle language (name or code)
        #[arg(long)]
        output_lang: String,

        /// Request dubbing (not implemented, logged only)
        #[arg(long)]
        dub: bool,
    },

    /// Process all video files in a directory
    Batch {
        /// Input directory containing video files
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Spoken language of the videos (name or code)
        #[arg(long)]
        input_lang: String,

        /// Subtitle language (name or code)
        #[arg(long)]
        output_lang: String,

        /// Request dubbing (not implemented, logged only)
        #[arg(long)]
        dub: bool,
    },

    /// Extract 16 kHz mono audio from a video file
    Extract {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Output audio file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Transcribe audio into an SRT file
    Transcribe {
        /// Input audio file
        #[arg(short, long)]
        input: PathBuf,

        /// Output subtitle file
        #[arg(short, long)]
        output: PathBuf,

        /// Spoken language (name or code)
        #[arg(short, long)]
        language: String,
    },

    /// Translate the text lines of an SRT file
    Translate {
        /// Input subtitle file
        #[arg(short, long)]
        input: PathBuf,

        /// Output translated file
        #[arg(short, long)]
        output: PathBuf,

        /// Language of the input subtitles
        #[arg(short, long)]
        source: String,

        /// Language to translate into
        #[arg(short, long)]
        target: String,
    },

    /// Embed subtitles into video file
    Embed {
        /// Input video file
        #[arg(short, long)]
        video: PathBuf,

        /// Subtitle file
        #[arg(short, long)]
        subtitles: PathBuf,

        /// Output video file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show supported languages and what each one can do
    Languages,

    /// Write the default configuration to a file
    InitConfig {
        /// Destination path
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,
    },
}

//! vidsub - subtitle pipeline for spoken-language video
//!
//! Extracts audio with ffmpeg, transcribes it with a speech model, translates
//! the resulting SRT and burns the translated subtitles back into the video.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing::{info, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vidsub::cli::{Args, Commands};
use vidsub::config::Config;
use vidsub::language::{Language, LanguageTable};
use vidsub::media::MediaProcessorFactory;
use vidsub::pipeline::Pipeline;
use vidsub::subtitle::{parse_srt, read_srt, write_srt, SubtitleDocument};
use vidsub::transcribe::TranscriptProvider;
use vidsub::translate::{create_backend, SubtitleTranslator};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose)?;

    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Process { input, input_lang, output_lang, dub } => {
            let pipeline = Pipeline::from_config(&config, create_backend(&config.translate)?)?;
            pipeline.check_dependencies().await?;

            match pipeline.process(&input, &input_lang, &output_lang, dub).await {
                Some(output) => println!("{}", output.display()),
                None => anyhow::bail!("Processing failed for {}, see log for details", input.display()),
            }
        }
        Commands::Batch { input_dir, input_lang, output_lang, dub } => {
            let pipeline = Pipeline::from_config(&config, create_backend(&config.translate)?)?;
            pipeline.check_dependencies().await?;

            let outputs = pipeline
                .process_directory(&input_dir, &input_lang, &output_lang, dub)
                .await?;
            for output in outputs {
                println!("{}", output.display());
            }
        }
        Commands::Extract { input, output } => {
            let media = MediaProcessorFactory::create_processor(config.media.clone());
            media.extract_audio(&input, &output).await?;
        }
        Commands::Transcribe { input, output, language } => {
            let languages = LanguageTable::from_config(&config.languages)?;
            let language = languages.resolve_input(&language)?;
            let granularity = languages.capabilities(language).granularity;

            let provider = TranscriptProvider::from_config(&config.transcriber);
            let transcript = provider.transcribe(&input, language, granularity).await?;

            let document = SubtitleDocument::from_chunks(
                transcript.chunks,
                transcript.granularity,
                config.transcriber.reset_detection,
                config.transcriber.merge_threshold,
            );
            write_srt(&document.to_srt(), &output).await?;
            info!("Wrote {} cues to {}", document.len(), output.display());
        }
        Commands::Translate { input, output, source, target } => {
            let languages = LanguageTable::from_config(&config.languages)?;
            let source = source.parse::<Language>()?;
            let target = languages.resolve_output(&target)?;

            let translator = SubtitleTranslator::new(create_backend(&config.translate)?);
            translator.translate_file(&input, &output, source, target).await?;

            let cues = parse_srt(&read_srt(&output).await?)?;
            info!("Translated {} cues written to {}", cues.len(), output.display());
        }
        Commands::Embed { video, subtitles, output } => {
            let media = MediaProcessorFactory::create_processor(config.media.clone());
            media.embed_subtitles(&video, &subtitles, &output).await?;
        }
        Commands::Languages => {
            let languages = LanguageTable::from_config(&config.languages)?;

            println!("{:<10} {:<6} {:<12} {:<7} {:<7} {:<5}", "Language", "Code", "Timestamps", "Input", "Output", "Dub");
            println!("{}", "-".repeat(52));
            for (language, caps) in languages.rows() {
                println!(
                    "{:<10} {:<6} {:<12} {:<7} {:<7} {:<5}",
                    language.name(),
                    language.code(),
                    caps.granularity.as_arg(),
                    yes_no(caps.input),
                    yes_no(caps.output),
                    yes_no(caps.dub)
                );
            }
        }
        Commands::InitConfig { output } => {
            config.save_to_file(&output)?;
            println!("Configuration written to {}", output.display());
        }
    }

    Ok(())
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".vidsub").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Daily rotation; the guard must outlive every log call
    let file_appender = rolling::daily(&log_dir, "vidsub.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}", log_level, log_dir.join("vidsub.log").display());

    Ok(())
}

// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use dualsub::app_config::{self, Config, PipelineMode, WhisperModel};
use dualsub::merger::CaptionLayout;
use dualsub::Pipeline;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for PipelineMode
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMode {
    Subs,
    Dub,
}

impl From<CliMode> for PipelineMode {
    fn from(mode: CliMode) -> Self {
        match mode {
            CliMode::Subs => PipelineMode::Subs,
            CliMode::Dub => PipelineMode::Dub,
        }
    }
}

/// CLI Wrapper for WhisperModel
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliWhisperModel {
    Tiny,
    Base,
    Small,
    Medium,
    Large,
}

impl From<CliWhisperModel> for WhisperModel {
    fn from(model: CliWhisperModel) -> Self {
        match model {
            CliWhisperModel::Tiny => WhisperModel::Tiny,
            CliWhisperModel::Base => WhisperModel::Base,
            CliWhisperModel::Small => WhisperModel::Small,
            CliWhisperModel::Medium => WhisperModel::Medium,
            CliWhisperModel::Large => WhisperModel::Large,
        }
    }
}

/// Options shared by the processing commands
#[derive(Args, Debug, Clone, Default)]
struct RunArgs {
    /// Output mode: burned-in subtitles, or subtitles plus dubbed audio
    #[arg(long, value_enum)]
    mode: Option<CliMode>,

    /// Whisper model size
    #[arg(short, long, value_enum)]
    model: Option<CliWhisperModel>,

    /// Spoken language of the videos (e.g., 'en')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Language to translate into (e.g., 'zh')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Show only the translated line in captions
    #[arg(long)]
    target_only: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the videos waiting in the input folder
    List,

    /// Process every video in the input folder
    TranslateAll(RunArgs),

    /// Process one video from the input folder
    Translate {
        /// File name inside the input folder
        #[arg(value_name = "FILE")]
        file: String,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Generate shell completions for dualsub
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// dualsub - bilingual subtitles and dubbing for videos
#[derive(Parser, Debug)]
#[command(name = "dualsub")]
#[command(version)]
#[command(about = "Bilingual subtitles and dubbing for videos")]
#[command(long_about = "dualsub transcribes the speech in a video, translates it, and writes
bilingual subtitles burned into the picture. In dub mode it also synthesizes
the translation and mixes it over the quietened original audio.

EXAMPLES:
    dualsub list                                # Show videos in the input folder
    dualsub translate-all                       # Process every input video
    dualsub translate talk.mp4 --mode dub       # Subtitle and dub one video
    dualsub translate talk.mp4 -m small -t ja   # Use a larger model, Japanese output
    dualsub completions bash > dualsub.bash     # Generate bash completions

WORKSPACE:
    Videos are read from video_input/, subtitles are written to srt_output/
    and finished videos to video_output/, all under the configured root.

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "conf.json")]
    config: PathBuf,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                Self::get_emoji_for_level(record.level()),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Info until the config is loaded
    if CustomLogger::init(LevelFilter::Info).is_err() {
        eprintln!("Failed to initialize logger");
    }

    let cli = CommandLineOptions::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: CommandLineOptions) -> Result<ExitCode> {
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "dualsub", &mut std::io::stdout());
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(level) = cli.log_level {
        log::set_max_level(app_config::LogLevel::from(level).to_level_filter());
    }

    let run_args = match &cli.command {
        Commands::TranslateAll(run) | Commands::Translate { run, .. } => run.clone(),
        _ => RunArgs::default(),
    };
    let config = load_config(&cli, &run_args)?;

    let pipeline = Pipeline::from_config(config);

    match cli.command {
        Commands::List => {
            let listing = pipeline.list_input_videos()?;
            println!("Input folder: {}", listing.input_dir.display());
            if listing.videos.is_empty() {
                println!("No videos found.");
            }
            for video in listing.videos {
                println!("  {}", video);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::TranslateAll(_) => {
            pipeline.check_backend().await;
            let report = pipeline.translate_all().await?;
            for failure in &report.failed {
                error!("{}: {}", failure.name, failure.error);
            }
            println!("{}", report.message);
            Ok(if report.has_failures() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Commands::Translate { file, .. } => {
            pipeline.check_backend().await;
            let outcome = pipeline.translate_one(&file).await?;
            info!("Subtitles: {}", outcome.subtitle_path.display());
            if let Some(dub) = &outcome.dub_track_path {
                info!("Dub track: {}", dub.display());
            }
            println!("{}", outcome.video_path.display());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Completions { .. } => Ok(ExitCode::SUCCESS),
    }
}

/// Load or create the configuration, apply CLI overrides, then validate
fn load_config(cli: &CommandLineOptions, run: &RunArgs) -> Result<Config> {
    let mut config = Config::load_or_create(&cli.config)?;

    if let Some(mode) = run.mode {
        config.pipeline.mode = mode.into();
    }
    if let Some(model) = run.model {
        config.pipeline.whisper_model = model.into();
    }
    if let Some(source) = &run.source_language {
        config.source_language = source.clone();
    }
    if let Some(target) = &run.target_language {
        config.target_language = target.clone();
    }
    if run.target_only {
        config.pipeline.layout = CaptionLayout::TargetOnly;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level.into();
    }

    config.validate().context("Configuration validation failed")?;

    // Config level applies only when not set on the command line
    if cli.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    Ok(config)
}

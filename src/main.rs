use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use file_rotate::compression::Compression;
use file_rotate::suffix::AppendCount;
use file_rotate::{ContentLimit, FileRotate};
use indicatif::{ProgressBar, ProgressStyle};
use photo_reconciler::describe::DEFAULT_MODEL;
use photo_reconciler::{
    BatchSummary, CommandConverter, ContentTagger, ExifToolStore, OpenAiProvider, Progress,
    Reconciler, files,
};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const LOG_FILE_MAX_BYTES: usize = 10 * 1024 * 1024;
const LOG_FILES_KEPT: usize = 5;

/// Reconcile photo metadata with filename timestamps and AI-generated descriptions.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log every decision, including tags, headline and abstract
    #[arg(long, global = true)]
    verbose: bool,

    /// Append logs to this file instead of printing them. Rotated at 10 MB, 5 old files are kept
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Decide and log, but do not write any metadata
    #[arg(long, global = true)]
    dry_run: bool,

    /// Path to the exiftool executable (default: search PATH)
    #[arg(long, global = true)]
    exiftool: Option<PathBuf>,

    /// Also descend into hidden files and directories
    #[arg(long, global = true)]
    include_hidden: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Correct Exif capture dates from timestamps in the filenames
    Dates {
        /// Directory to scan for images
        directory: PathBuf,
    },
    /// Add tags, a headline and an abstract to images that have no tags yet
    Tag(TagArgs),
}

#[derive(Args, Debug)]
struct TagArgs {
    /// Directory to scan for images
    directory: PathBuf,

    /// Model identifier sent to the AI server
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Describe images again even if they already have tags
    #[arg(long)]
    overwrite: bool,

    /// Base URL of the OpenAI-compatible AI server, e.g. http://localhost:11434/v1
    #[arg(long)]
    ai_server: String,

    /// API key for the AI server
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Program converting HEIC to JPEG, called as `<program> <input> <output>`
    #[arg(long, default_value = CommandConverter::DEFAULT_PROGRAM)]
    heic_converter: String,

    /// Timeout for one AI request, in seconds
    #[arg(long, default_value_t = 120)]
    timeout_secs: u64,
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,photo_reconciler={default_level}"))
    });
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match log_file {
        Some(path) => {
            // FileRotate swallows open errors, so check the path up front.
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Cannot open log file {}", path.display()))?;
            let file = FileRotate::new(
                path,
                AppendCount::new(LOG_FILES_KEPT),
                ContentLimit::Bytes(LOG_FILE_MAX_BYTES),
                Compression::None,
                #[cfg(unix)]
                None,
            );
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn progress_bar(total: usize) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner} Processing images... [{bar:40}] {pos}/{len} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    bar
}

fn advance(bar: &ProgressBar, progress: Progress<'_>) {
    bar.set_position(progress.index as u64);
    bar.set_message(
        progress
            .path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned(),
    );
}

fn report(summary: &BatchSummary) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(summary)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let directory = match &cli.command {
        Command::Dates { directory } => directory,
        Command::Tag(args) => &args.directory,
    };
    // Fatal problems surface here, before any file is touched.
    let media_files = files::enumerate(directory, cli.include_hidden)?;
    let store = ExifToolStore::new(cli.exiftool.as_deref()).context("Cannot start exiftool")?;
    let mut reconciler = Reconciler::builder()
        .store(store)
        .dry_run(cli.dry_run)
        .build();

    let bar = if cli.log_file.is_some() {
        progress_bar(media_files.len())
    } else {
        // Log lines go to stderr, a bar would garble them.
        ProgressBar::hidden()
    };

    let summary = match cli.command {
        Command::Dates { .. } => reconciler.correct_dates(&media_files, |p| advance(&bar, p)),
        Command::Tag(args) => {
            let provider = OpenAiProvider::builder()
                .base_url(args.ai_server)
                .api_key(args.api_key)
                .model(args.model)
                .timeout(Duration::from_secs(args.timeout_secs))
                .build()?;
            let tagger = ContentTagger::builder()
                .provider(provider)
                .converter(CommandConverter::new(args.heic_converter))
                .overwrite(args.overwrite)
                .build();
            reconciler
                .tag_images(&media_files, &tagger, |p| advance(&bar, p))
                .await
        }
    };
    bar.finish_and_clear();

    report(&summary)
}

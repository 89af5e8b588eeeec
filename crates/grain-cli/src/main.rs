//! grain - AV1 film grain synthesis CLI
//!
//! Applies AOM film grain to raw planar video and dumps grain and HDR10+
//! payloads.

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "grain")]
#[command(author, version, about = "AV1 film grain synthesis CLI")]
#[command(long_about = "
Film grain synthesis for raw planar video (ffmpeg -f rawvideo layout).

Examples:
  grain template > grain.yaml                      # Start from a template
  grain apply in.yuv -o out.yuv -W 1920 -H 1080 -f yuv420p10 --params grain.yaml
  grain apply in.yuv -o out.yuv -W 1920 -H 1080 --afgs1 sets.bin
  grain parse sets.bin                             # Dump AFGS1 sets as YAML
  grain parse t35.bin --t35 --json                 # ... wrapped in T.35, as JSON
  grain hdr10plus meta.bin --t35                   # Dump HDR10+ metadata
  RUST_LOG=debug grain -v apply ...                # Trace synthesis decisions
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v, -vv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply film grain to raw frames
    #[command(visible_alias = "a")]
    Apply(ApplyArgs),

    /// Dump an AFGS1 film grain payload
    #[command(visible_alias = "p")]
    Parse(ParseArgs),

    /// Dump HDR10+ (ST 2094-40) metadata
    #[command(name = "hdr10plus", visible_alias = "hdr")]
    Hdr10Plus(Hdr10PlusArgs),

    /// Print a grain parameter template
    Template(TemplateArgs),
}

#[derive(Args)]
struct ApplyArgs {
    /// Input raw video
    input: PathBuf,

    /// Output raw video
    #[arg(short, long)]
    output: PathBuf,

    /// Frame width
    #[arg(short = 'W', long)]
    width: u32,

    /// Frame height
    #[arg(short = 'H', long)]
    height: u32,

    /// Pixel format: gray, gray10, yuv420p, yuv420p10, yuv444p12, ...
    #[arg(short, long, default_value = "yuv420p")]
    format: String,

    /// Grain parameters (YAML, one set or a list)
    #[arg(long, conflicts_with = "afgs1", required_unless_present = "afgs1")]
    params: Option<PathBuf>,

    /// Grain parameters as an AFGS1 payload
    #[arg(long)]
    afgs1: Option<PathBuf>,

    /// The AFGS1 payload starts with a T.35 header
    #[arg(long, requires = "afgs1")]
    t35: bool,

    /// Samples are RGB (identity matrix)
    #[arg(long)]
    rgb: bool,

    /// Samples are full range
    #[arg(long)]
    full_range: bool,

    /// Stop after this many frames
    #[arg(short = 'n', long)]
    frames: Option<usize>,

    /// Advance the seed by one per frame
    #[arg(long)]
    animate: bool,

    /// Process block rows on one thread
    #[arg(long)]
    no_parallel: bool,

    /// Fail on frames grain cannot be applied to instead of copying them
    #[arg(long)]
    strict: bool,
}

#[derive(Args)]
struct ParseArgs {
    /// Payload file
    input: PathBuf,

    /// The payload starts with a T.35 header
    #[arg(long)]
    t35: bool,

    /// Output JSON instead of YAML
    #[arg(long)]
    json: bool,

    /// Include disabled sets
    #[arg(short, long)]
    all: bool,
}

#[derive(Args)]
struct Hdr10PlusArgs {
    /// Payload file (starting at application_version unless --t35)
    input: PathBuf,

    /// The payload starts with a T.35 header
    #[arg(long)]
    t35: bool,

    /// Output JSON instead of YAML
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct TemplateArgs {
    /// Output JSON instead of YAML
    #[arg(long)]
    json: bool,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Installs the console subscriber and the optional file layer.
///
/// The returned guard flushes the file writer on drop.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let console_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create log file: {}", path.display()))?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer().with_ansi(false).with_writer(non_blocking);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(env_filter)
        .try_init()
        .context("Failed to install logger")?;
    Ok(guard)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // need guard to live for lifetime of program
    let _guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    // Configure thread pool
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    match cli.command {
        Commands::Apply(args) => commands::apply::run(args, cli.verbose),
        Commands::Parse(args) => commands::parse::run(args, cli.verbose),
        Commands::Hdr10Plus(args) => commands::hdr10plus::run(args, cli.verbose),
        Commands::Template(args) => commands::template::run(args),
    }
}

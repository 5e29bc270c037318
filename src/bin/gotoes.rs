//! CLI binary for gotoes-timestamp.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `WorkflowConfig` / `WorkflowParameters` and prints the result.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use gotoes_timestamp::config::DEFAULT_BASE_URL;
use gotoes_timestamp::{
    add_timestamps, ProgressCallback, Stage, StageProgressCallback,
    TimestampOutput, WorkflowConfig, WorkflowParameters,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner: one line per finished stage, spinner on the current one.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("GOTOES");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl StageProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_message(format!("{stage}…"));
    }

    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        self.bar.println(format!(
            "  {} {:<20} {}",
            green("✓"),
            stage.to_string(),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
    }

    fn on_stage_error(&self, stage: Stage, error: &str) {
        // Keep the line short; the full chain is printed on exit.
        let first = error.lines().next().unwrap_or(error);
        self.bar
            .println(format!("  {} {:<20} {}", red("✗"), stage.to_string(), red(first)));
        self.bar.finish_and_clear();
    }

    fn on_workflow_complete(&self, _output: &TimestampOutput) {
        self.bar.finish_and_clear();
    }
}

// ── CLI definition ───────────────────────────────────────────────────────────

const AFTER_HELP: &str = r#"EXAMPLES:
  # Timestamp a route at 25 km/h starting now
  gotoes timestamp ride.gpx --speed 25

  # Fixed start time, explicit output file
  gotoes ts ride.gpx -s 18 -t 2024-05-01T08:00:00+02:00 -o ride_timed.gpx

  # Machine-readable summary
  gotoes ts ride.gpx -s 25 --json

OUTPUT:
  Without --output the file is written to downloaded/GOTOES_<file id>.gpx.

ENVIRONMENT VARIABLES:
  GOTOES_SPEED       Desired speed
  GOTOES_START_TIME  Start time (RFC 3339)
  GOTOES_OUTPUT      Output file
  GOTOES_BASE_URL    Service address (default https://gotoes.org)
  GOTOES_TIMEOUT     Per-request timeout in seconds
  RUST_LOG           Log filter, e.g. RUST_LOG=gotoes_timestamp=debug
"#;

/// Add timestamps to GPX tracks through the GOTOES web tool.
#[derive(Parser, Debug)]
#[command(
    name = "gotoes",
    version,
    about = "Add timestamps to GPX tracks through the GOTOES web tool",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Service base URL.
    #[arg(long, global = true, env = "GOTOES_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Per-request timeout in seconds.
    #[arg(long, global = true, env = "GOTOES_TIMEOUT", default_value_t = 10,
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Time zone of the start time, as GOTOES names it.
    #[arg(long, global = true, env = "GOTOES_TIME_ZONE", default_value = "Europe/Paris")]
    time_zone: String,

    /// Activity sport label of the output.
    #[arg(long, global = true, env = "GOTOES_SPORT", default_value = "Biking")]
    sport: String,

    /// Print the result as JSON (TimestampOutput).
    #[arg(long, global = true, env = "GOTOES_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, global = true, env = "GOTOES_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "GOTOES_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "GOTOES_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Change the timestamps of a GPX file.
    #[command(visible_alias = "ts")]
    Timestamp(TimestampArgs),
}

#[derive(Args, Debug)]
struct TimestampArgs {
    /// GPX file to timestamp.
    gpx_file: PathBuf,

    /// Desired average speed (km/h).
    #[arg(short, long, env = "GOTOES_SPEED",
          value_parser = clap::value_parser!(u32).range(1..))]
    speed: u32,

    /// Start time in RFC 3339 format. Default: now.
    #[arg(short = 't', long, env = "GOTOES_START_TIME")]
    start_time: Option<String>,

    /// Output file. Default: downloaded/GOTOES_<file id>.gpx.
    #[arg(short, long, env = "GOTOES_OUTPUT")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives the feedback that matters; keep INFO logs out of its way.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Timestamp(ref args) => run_timestamp(&cli, args, show_progress).await,
    }
}

async fn run_timestamp(cli: &Cli, args: &TimestampArgs, show_progress: bool) -> Result<()> {
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as ProgressCallback)
    } else {
        None
    };

    let config = build_config(cli, progress_cb)?;
    let params = build_params(args)?;

    let output = add_timestamps(&params, &config)
        .await
        .context("failed to add timestamps to GPX")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        println!("Downloaded file: {}", output.output_path.display());
        if !cli.quiet {
            eprintln!(
                "{} {} bytes  file id {}  {}ms",
                green("✔"),
                bold(&output.bytes_written.to_string()),
                output.file_id,
                output.stats.total_ms,
            );
        }
    }

    Ok(())
}

/// Map global CLI flags to `WorkflowConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<WorkflowConfig> {
    let mut builder = WorkflowConfig::builder()
        .base_url(&cli.base_url)
        .timeout_secs(cli.timeout)
        .time_zone(&cli.time_zone)
        .activity_sport(&cli.sport);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Map subcommand args to `WorkflowParameters`.
fn build_params(args: &TimestampArgs) -> Result<WorkflowParameters> {
    let mut builder = WorkflowParameters::builder(&args.gpx_file).desired_speed(args.speed);

    if let Some(ref s) = args.start_time {
        builder = builder.start_time_str(s)?;
    }
    if let Some(ref out) = args.output {
        builder = builder.output_file(out);
    }

    builder.build().context("Invalid parameters")
}

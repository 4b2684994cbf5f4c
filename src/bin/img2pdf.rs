//! CLI binary for img2pdf.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, drives the progress bars, and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use img2pdf::{CanvasProfile, ConversionConfig, Converter, ProgressMonitor, RunOutcome};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a folder; output lands next to it as photos.pdf
  img2pdf scans/photos

  # A4 pages instead of the CSAT answer-sheet format
  img2pdf --profile a4 scans/photos

  # Explicit output path and worker count
  img2pdf -o archive/batch01.pdf --workers 4 scans/batch01

  # Machine-readable result
  img2pdf --json scans/photos

CANVAS PROFILES:
  Profile  Page size      Layout rule
  ───────  ─────────────  ──────────────────────────────
  csat     272 x 394 mm   fixed 235 mm image width (default)
  a4       210 x 297 mm   fit image inside the page

SUPPORTED INPUT FORMATS:
  .tiff .tif .jpg .jpeg .png   (matched case-insensitively; other
  files in the folder are ignored)

The images become pages in file-name order. Any unreadable or corrupt
image aborts the whole conversion — no partial PDF is written.
"#;

/// Convert a folder of images into one compressed, page-ordered PDF.
#[derive(Parser, Debug)]
#[command(
    name = "img2pdf",
    version,
    about = "Convert a folder of images into one compressed, page-ordered PDF",
    long_about = "Convert a folder of scans or photos into a single PDF: one fixed-size page per \
image, pages in file-name order, output compressed and written next to the input folder.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Folder containing the images to convert.
    input: PathBuf,

    /// Write the PDF here instead of `<input-parent>/<input-basename>.pdf`.
    #[arg(short, long, env = "IMG2PDF_OUTPUT")]
    output: Option<PathBuf>,

    /// Canvas profile: csat or a4.
    #[arg(long, env = "IMG2PDF_PROFILE", value_enum, default_value = "csat")]
    profile: ProfileArg,

    /// Number of parallel render workers. Defaults to the CPU core count.
    #[arg(short, long, env = "IMG2PDF_WORKERS")]
    workers: Option<usize>,

    /// Directory for intermediate artifacts. Defaults to the system temp dir.
    #[arg(long, env = "IMG2PDF_SCRATCH")]
    scratch: Option<PathBuf>,

    /// Output the run result as JSON instead of human-readable text.
    #[arg(long, env = "IMG2PDF_JSON")]
    json: bool,

    /// Disable progress bars.
    #[arg(long, env = "IMG2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "IMG2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "IMG2PDF_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum ProfileArg {
    Csat,
    A4,
}

impl From<ProfileArg> for CanvasProfile {
    fn from(v: ProfileArg) -> Self {
        match v {
            ProfileArg::Csat => CanvasProfile::Csat,
            ProfileArg::A4 => CanvasProfile::A4,
        }
    }
}

/// The three stage bars, mirroring the stages the library reports.
#[derive(Clone)]
struct StageBars {
    load: ProgressBar,
    render: ProgressBar,
    compress: ProgressBar,
}

fn make_bars() -> (MultiProgress, StageBars) {
    let multi = MultiProgress::new();
    let style = ProgressStyle::with_template(
        "{prefix:>9.bold}  [{bar:42.green/238}] {pos:>3}%  {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("█▉▊▋▌▍▎▏  ");

    let bar = |prefix: &str| {
        let b = multi.add(ProgressBar::new(100));
        b.set_style(style.clone());
        b.set_prefix(prefix.to_string());
        b
    };

    let bars = StageBars {
        load: bar("Load"),
        render: bar("Render"),
        compress: bar("Compress"),
    };
    (multi, bars)
}

/// Forward progress snapshots onto the bars until the channel closes or
/// the task is aborted after the run finishes.
async fn drive_bars(mut monitor: ProgressMonitor, bars: StageBars) {
    while let Some(snap) = monitor.changed().await {
        bars.load.set_position(snap.load as u64);
        bars.render.set_position(snap.render as u64);
        bars.compress.set_position(snap.compress as u64);
        bars.render.set_message(snap.status);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bars are active;
    // the bars provide all the feedback that matters to the user.
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

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = ConversionConfig::builder().profile(cli.profile.clone().into());
    if let Some(workers) = cli.workers {
        builder = builder.workers(workers);
    }
    if let Some(ref output) = cli.output {
        builder = builder.output(output);
    }
    if let Some(ref scratch) = cli.scratch {
        builder = builder.scratch_root(scratch);
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Run ──────────────────────────────────────────────────────────────
    let converter = Converter::new(config);
    let monitor = converter.monitor();

    let run = converter
        .start(&cli.input)
        .context("Failed to start conversion")?;

    let progress_ui = if show_progress {
        let (multi, bars) = make_bars();
        let updater = tokio::spawn(drive_bars(monitor.clone(), bars.clone()));
        Some((multi, bars, updater))
    } else {
        None
    };

    let result = run.join().await;
    if let Some((_multi, bars, updater)) = progress_ui {
        updater.abort();
        // Draw the final snapshot before clearing so a fast run still shows
        // completed bars for an instant.
        let snap = monitor.snapshot();
        bars.load.set_position(snap.load as u64);
        bars.render.set_position(snap.render as u64);
        bars.compress.set_position(snap.compress as u64);
        bars.load.finish_and_clear();
        bars.render.finish_and_clear();
        bars.compress.finish_and_clear();
    }

    match result {
        Ok(RunOutcome::Converted(out)) => {
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&RunOutcome::Converted(out))
                        .context("Failed to serialise output")?
                );
            } else if !cli.quiet {
                eprintln!(
                    "{} {} images combined into {}  {}",
                    green("✔"),
                    bold(&out.image_count.to_string()),
                    bold(&out.output_path.display().to_string()),
                    dim(&format!(
                        "{} KiB, {}ms",
                        out.stats.output_bytes / 1024,
                        out.stats.total_duration_ms
                    )),
                );
            }
            Ok(())
        }
        Ok(RunOutcome::NoImages) => {
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&RunOutcome::NoImages)
                        .context("Failed to serialise output")?
                );
            } else if !cli.quiet {
                eprintln!(
                    "{} No supported images in {}",
                    cyan("ℹ"),
                    cli.input.display()
                );
            }
            Ok(())
        }
        Err(e) => {
            if !cli.quiet {
                eprintln!("{} {} failed: {}", red("✘"), e.stage(), e);
            }
            Err(e).context("Conversion failed")
        }
    }
}

//! # Gallery Replay
//!
//! Replays a gesture scenario and prints one line (or one JSON object) per
//! frame.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gallery_replay::{Scenario, DEFAULT_FRAME_MS};

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Aligned text, one frame per line.
    Text,
    /// The whole report as JSON.
    Json,
}

/// Replay a gesture scenario against the gallery engine.
#[derive(Debug, Parser)]
#[command(name = "gallery-replay", version, about)]
struct Cli {
    /// Scenario file.
    #[arg(short, long, env = "GALLERY_SCENARIO")]
    scenario: PathBuf,

    /// Frame interval in milliseconds.
    #[arg(long, default_value_t = DEFAULT_FRAME_MS)]
    frame_ms: f64,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

/// Initialize structured tracing with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: info,gallery_core=debug,gallery_replay=debug).
/// Set `RUST_LOG_FORMAT=json` for JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,gallery_core=debug,gallery_replay=debug"));

    // Logs go to stderr so stdout carries only the report
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let scenario = Scenario::load(&cli.scenario)
        .with_context(|| format!("loading {}", cli.scenario.display()))?;
    let report = gallery_replay::run(&scenario, cli.frame_ms)
        .await
        .with_context(|| format!("replaying {}", scenario.name))?;

    match cli.format {
        Format::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Format::Text => {
            println!("scenario: {}", report.scenario);
            for frame in &report.frames {
                println!("{frame}");
            }
            for release in &report.releases {
                println!(
                    "swipe release: {:?} to {:.1} at {:.1}/s",
                    release.outcome, release.target, release.velocity
                );
            }
            if !report.index_changes.is_empty() {
                println!("index changes: {:?}", report.index_changes);
            }
            if report.closed {
                println!("lightbox closed");
            }
        }
    }
    Ok(())
}

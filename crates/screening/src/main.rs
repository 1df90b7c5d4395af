//! Biosignal Screening - command-line driver

use anyhow::{bail, Context, Result};
use clap::Parser;
use screening::{init_logging, load_capture, Capture, ScreeningConfig, ScreeningSession};
use std::path::PathBuf;
use tracing::info;

/// Score tapping, tremor and voice captures with the screening classifier
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// ONNX classifier model, overrides the configured one
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Tapping capture (JSON)
    #[arg(long)]
    tapping: Option<PathBuf>,

    /// Tremor capture (JSON)
    #[arg(long)]
    tremor: Option<PathBuf>,

    /// Voice capture (JSON or WAV)
    #[arg(long)]
    voice: Option<PathBuf>,

    /// Score all given captures together instead of one by one
    #[arg(long)]
    combined: bool,

    /// SQLite URL for results, overrides the configured one
    #[arg(long)]
    database: Option<String>,

    /// Print the N most recent stored results after scoring
    #[arg(long)]
    history: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ScreeningConfig::load(args.config.as_deref())
        .context("failed to load configuration")?;
    if let Some(model) = args.model {
        config.model_path = Some(model);
    }
    if let Some(database) = args.database {
        config.database_url = Some(database);
    }
    if args.verbose {
        config.log_level = "debug".to_string();
    }

    init_logging(&config.log_level, config.log_json)?;
    info!("=== Biosignal Screening v{} ===", env!("CARGO_PKG_VERSION"));

    let mut captures: Vec<Capture> = Vec::new();
    for path in [&args.tapping, &args.tremor, &args.voice].into_iter().flatten() {
        let capture =
            load_capture(path).with_context(|| format!("failed to load {}", path.display()))?;
        captures.push(capture);
    }
    if captures.is_empty() && args.history.is_none() {
        bail!("nothing to do: pass --tapping, --tremor, --voice or --history");
    }

    let mut session = ScreeningSession::from_config(config).await?;

    if args.combined && !captures.is_empty() {
        let outcome = session.run_combined(&captures).await?;
        println!("{}", serde_json::to_string_pretty(&outcome.to_report())?);
    } else {
        for capture in &captures {
            let outcome = session.run(capture).await?;
            println!("{}", serde_json::to_string_pretty(&outcome.to_report())?);
        }
    }

    if let Some(limit) = args.history {
        let records = session.store().recent(None, limit).await?;
        println!("{}", serde_json::to_string_pretty(&records)?);
    }

    Ok(())
}

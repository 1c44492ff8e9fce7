//! `layer-harvest`: pulls a whole feature layer into a local destination store.
mod config;

use std::num::{NonZeroU32, NonZeroUsize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use engine_logging::{engine_error, engine_info, LogDestination};
use layer_harvest_engine::Harvester;
use log::LevelFilter;

use crate::config::HarvestFile;

#[derive(Debug, Parser)]
#[command(name = "layer-harvest", version, about)]
struct Cli {
    /// RON configuration file.
    #[arg(short, long, default_value = "harvest.ron")]
    config: PathBuf,
    /// Also write log lines to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Chunk size, overriding the server's advertised maximum.
    #[arg(long)]
    page_size: Option<NonZeroUsize>,
    /// Seconds to wait after each successful chunk.
    #[arg(long)]
    pause_secs: Option<u64>,
    /// Give up on a chunk after this many attempts instead of retrying forever.
    #[arg(long)]
    max_attempts: Option<NonZeroU32>,
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let result = run(&cli);
    if let Err(err) = &result {
        engine_error!("Harvest failed: {:#}", err);
    }
    result
}

fn run(cli: &Cli) -> Result<()> {
    let file = HarvestFile::load(&cli.config)?;
    let base = cli
        .config
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut config = file.into_config(base)?;

    if let Some(size) = cli.page_size {
        config.page_size_override = Some(size);
    }
    if let Some(secs) = cli.pause_secs {
        config.extraction.request_pause = Duration::from_secs(secs);
    }
    if let Some(max) = cli.max_attempts {
        config.extraction.retry.max_attempts = Some(max);
    }

    let harvester = Harvester::new(config).context("setting up harvester")?;
    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    let summary = runtime.block_on(harvester.run())?;

    engine_info!(
        "Wrote {} records to {} from {} chunks ({} requests)",
        summary.merge.records,
        summary.merge.collection,
        summary.chunks,
        summary.requests
    );
    Ok(())
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let destination = if cli.log_file.is_some() {
        LogDestination::Both
    } else {
        LogDestination::Terminal
    };
    engine_logging::initialize(destination, cli.log_file.as_deref(), level);
}

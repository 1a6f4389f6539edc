use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Parser;

use transfer_odds::chart::PngBarChart;
use transfer_odds::config::ScraperConfig;
use transfer_odds::fetch::HttpMarketSource;
use transfer_odds::logging::{self, LogMode};
use transfer_odds::pipeline::{self, RunOptions};
use transfer_odds::storage::open_storage;

/// Scrape transfer-rumour odds, convert them to probabilities and store the
/// dataset plus charts.
#[derive(Parser)]
#[command(name = "transfer_odds")]
struct Cli {
    /// Unattended run: skip the end-of-run summary on stdout
    #[arg(long)]
    headless: bool,

    /// Where log lines go
    #[arg(long, value_enum, default_value = "stdout")]
    log: LogMode,

    /// Log file used with `--log file`
    #[arg(long, default_value = "app.log")]
    log_path: PathBuf,

    /// Capture date (YYYY-MM-DD), defaults to today in UTC
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Only write the dataset
    #[arg(long)]
    no_charts: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log, &cli.log_path)?;

    let cfg = ScraperConfig::from_env()?;
    let source = HttpMarketSource::from_config(&cfg)?;
    let storage = open_storage(&cfg.storage, cfg.request_timeout)?;
    let opts = RunOptions {
        date: cli.date.unwrap_or_else(|| Utc::now().date_naive()),
        charts: !cli.no_charts,
    };

    let summary = pipeline::run(&cfg, &opts, &source, storage.as_ref(), &PngBarChart, |p| {
        tracing::debug!("{}/{} {}", p.current, p.total, p.message);
    })
    .context("scrape run failed")?;

    if cli.headless {
        return Ok(());
    }

    println!("Transfer odds scrape complete");
    println!("Date: {}", summary.date);
    println!(
        "Markets: {}/{}",
        summary.links_total - summary.failures.len(),
        summary.links_total
    );
    println!("Rows: {}", summary.rows);
    println!("Objects written: {}", summary.keys_written.len());
    if let Some(n) = summary.history_rows {
        println!("History rows upserted: {n}");
    }
    if !summary.failures.is_empty() {
        println!("Failures: {}", summary.failures.len());
        for failure in summary.failures.iter().take(8) {
            println!(" - {}: {}", failure.url, failure.reason);
        }
    }

    Ok(())
}

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::aggregate::{AggregateProgress, LinkFailure, MarketSource, TransferAggregator};
use crate::chart::ChartRenderer;
use crate::config::ScraperConfig;
use crate::dataset::TransferDataset;
use crate::links::LinkSelector;
use crate::report::ReportBuilder;
use crate::storage::{
    CSV_CONTENT_TYPE, DESTINATIONS_PREFIX, JSON_CONTENT_TYPE, PLAYERS_PREFIX, Storage, dataset_key,
    failures_key,
};

pub struct RunOptions {
    pub date: NaiveDate,
    pub charts: bool,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub date: NaiveDate,
    pub links_total: usize,
    pub rows: usize,
    pub failures: Vec<LinkFailure>,
    pub keys_written: Vec<String>,
    pub history_rows: Option<usize>,
}

/// One scrape: discover markets, aggregate odds, persist the dataset, then charts.
///
/// An empty link set or a storage failure aborts; per-market failures only end
/// up in the summary. Charts are written last; a failed chart upload leaves
/// the dataset in place.
pub fn run(
    cfg: &ScraperConfig,
    opts: &RunOptions,
    source: &dyn MarketSource,
    storage: &dyn Storage,
    renderer: &dyn ChartRenderer,
    on_progress: impl FnMut(AggregateProgress),
) -> Result<RunSummary> {
    let listing_url = cfg.listing_url();
    tracing::info!(url = %listing_url, "scraping links");
    let all_links = source
        .fetch_listing(&listing_url)
        .with_context(|| format!("fetch listing {listing_url}"))?;
    let links = LinkSelector::new(cfg.link_patterns.clone()).select(&all_links)?;
    tracing::info!(found = links.len(), scanned = all_links.len(), "market links selected");

    let outcome = TransferAggregator::new(opts.date).run_with_progress(&links, source, on_progress);
    let dataset = outcome.dataset;
    tracing::info!(
        rows = dataset.len(),
        failed = outcome.failures.len(),
        "aggregation finished"
    );
    for failure in &outcome.failures {
        tracing::warn!(url = %failure.url, reason = %failure.reason, "market skipped");
    }

    let mut keys_written = Vec::new();

    let key = dataset_key(opts.date);
    storage
        .put(&key, dataset.to_csv().as_bytes(), CSV_CONTENT_TYPE)
        .with_context(|| format!("store dataset {key}"))?;
    keys_written.push(key);

    if !outcome.failures.is_empty() {
        let key = failures_key(opts.date);
        let json = serde_json::to_vec_pretty(&outcome.failures).context("serialize failures")?;
        storage
            .put(&key, &json, JSON_CONTENT_TYPE)
            .with_context(|| format!("store failure report {key}"))?;
        keys_written.push(key);
    }

    let history_rows = match cfg.history_db.as_deref() {
        Some(path) => {
            let mut conn = crate::history::open_db(path)?;
            Some(crate::history::record_dataset(&mut conn, &dataset)?)
        }
        None => None,
    };

    if opts.charts {
        tracing::info!("making charts");
        keys_written.extend(write_charts(cfg, &dataset, storage, renderer)?);
    }

    tracing::info!("finished");
    Ok(RunSummary {
        date: opts.date,
        links_total: links.len(),
        rows: dataset.len(),
        failures: outcome.failures,
        keys_written,
        history_rows,
    })
}

fn write_charts(
    cfg: &ScraperConfig,
    dataset: &TransferDataset,
    storage: &dyn Storage,
    renderer: &dyn ChartRenderer,
) -> Result<Vec<String>> {
    storage.clear_prefix(PLAYERS_PREFIX)?;
    storage.clear_prefix(DESTINATIONS_PREFIX)?;

    let builder = ReportBuilder::new(cfg.sentinels.clone(), cfg.top_n);
    let mut keys = Vec::new();
    for chart in builder.build(dataset) {
        let bytes = renderer.render(&chart)?;
        storage
            .put(&chart.key, &bytes, renderer.content_type())
            .with_context(|| format!("store chart {}", chart.key))?;
        keys.push(chart.key);
    }
    tracing::info!(charts = keys.len(), "charts stored");
    Ok(keys)
}

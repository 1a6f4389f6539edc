use std::cmp::Ordering;

use crate::dataset::{OutcomeRow, TransferDataset};
use crate::storage::{destination_chart_key, overall_chart_key, player_chart_key};

/// Outcomes that are not a move to a named club.
pub const DEFAULT_SENTINELS: &[&str] = &["To Stay", "To Leave", "Any", "Not to sign"];

const MIN_BARS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub key: String,
    pub title: String,
    pub bars: Vec<Bar>,
}

pub struct ReportBuilder {
    sentinels: Vec<String>,
    top_n: usize,
}

impl ReportBuilder {
    pub fn new(sentinels: Vec<String>, top_n: usize) -> Self {
        Self { sentinels, top_n }
    }

    /// Case-sensitive substring match: "Any" matches "Any other club", not "Germany".
    pub fn is_sentinel(&self, destination: &str) -> bool {
        self.sentinels.iter().any(|s| destination.contains(s.as_str()))
    }

    pub fn build(&self, dataset: &TransferDataset) -> Vec<ChartSpec> {
        let mut charts = Vec::new();
        for destination in dataset.destinations() {
            if self.is_sentinel(destination) {
                continue;
            }
            if let Some(chart) = self.destination_chart(dataset, destination) {
                charts.push(chart);
            }
        }
        for player in dataset.players() {
            if let Some(chart) = self.player_chart(dataset, player) {
                charts.push(chart);
            }
        }
        charts.push(self.most_likely(dataset));
        charts
    }

    pub fn destination_chart(&self, dataset: &TransferDataset, destination: &str) -> Option<ChartSpec> {
        let bars = ranked(
            dataset.rows().iter().filter(|r| r.destination == destination),
            |r| r.player.clone(),
        );
        (bars.len() > MIN_BARS).then(|| ChartSpec {
            key: destination_chart_key(destination),
            title: format!("{destination} Transfer Targets"),
            bars,
        })
    }

    pub fn player_chart(&self, dataset: &TransferDataset, player: &str) -> Option<ChartSpec> {
        let bars = ranked(
            dataset.rows().iter().filter(|r| r.player == player),
            |r| r.destination.clone(),
        );
        (bars.len() > MIN_BARS).then(|| ChartSpec {
            key: player_chart_key(player),
            title: format!("{player} Destinations"),
            bars,
        })
    }

    pub fn most_likely(&self, dataset: &TransferDataset) -> ChartSpec {
        let mut bars = ranked(
            dataset
                .rows()
                .iter()
                .filter(|r| !self.is_sentinel(&r.destination)),
            |r| format!("{} - {}", r.player, r.destination),
        );
        bars.truncate(self.top_n);
        ChartSpec {
            key: overall_chart_key(self.top_n),
            title: format!("{} most likely Transfers", self.top_n),
            bars,
        }
    }
}

fn ranked<'a>(
    rows: impl Iterator<Item = &'a OutcomeRow>,
    label: impl Fn(&OutcomeRow) -> String,
) -> Vec<Bar> {
    let mut bars: Vec<Bar> = rows
        .filter(|r| r.has_positive_probability())
        .map(|r| Bar {
            label: label(r),
            probability: r.probability.unwrap_or_default(),
        })
        .collect();
    bars.sort_by(|a, b| {
        b.probability
            .partial_cmp(&a.probability)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.label.cmp(&b.label))
    });
    bars
}

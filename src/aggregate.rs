use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;

use crate::dataset::{OutcomeRow, TransferDataset};
use crate::error::TransferError;
use crate::links::MarketLink;
use crate::table::{RawTable, normalize};

/// Where pages come from. The HTTP implementation lives in `fetch`; tests plug
/// in canned tables.
pub trait MarketSource {
    fn fetch_listing(&self, url: &str) -> Result<Vec<(String, String)>>;

    fn fetch_table(&self, link: &MarketLink) -> Result<RawTable>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkFailure {
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct AggregateOutcome {
    pub dataset: TransferDataset,
    pub failures: Vec<LinkFailure>,
}

pub struct AggregateProgress {
    pub current: usize,
    pub total: usize,
    pub message: String,
}

pub struct TransferAggregator {
    date: NaiveDate,
}

impl TransferAggregator {
    pub fn new(date: NaiveDate) -> Self {
        Self { date }
    }

    pub fn run(&self, links: &[MarketLink], source: &dyn MarketSource) -> AggregateOutcome {
        self.run_with_progress(links, source, |_| {})
    }

    /// A failing link is recorded and skipped; it never stops the run.
    pub fn run_with_progress(
        &self,
        links: &[MarketLink],
        source: &dyn MarketSource,
        mut on_progress: impl FnMut(AggregateProgress),
    ) -> AggregateOutcome {
        let total = links.len();
        let mut dataset = TransferDataset::new();
        let mut failures = Vec::new();

        for (idx, link) in links.iter().enumerate() {
            tracing::info!(url = link.url(), "market {}/{}", idx + 1, total);

            let message = match self.process_link(link, source) {
                Ok(rows) => {
                    let n = rows.len();
                    dataset.extend(rows);
                    format!("{}: {n} outcomes", link.player_name())
                }
                Err(err) => {
                    let reason = format!("{err:#}");
                    tracing::warn!(url = link.url(), %reason, "market parsing failed");
                    failures.push(LinkFailure {
                        url: link.url().to_string(),
                        reason,
                    });
                    format!("{}: failed", link.player_name())
                }
            };

            on_progress(AggregateProgress {
                current: idx + 1,
                total,
                message,
            });
        }

        AggregateOutcome { dataset, failures }
    }

    fn process_link(
        &self,
        link: &MarketLink,
        source: &dyn MarketSource,
    ) -> Result<Vec<OutcomeRow>> {
        let table = source.fetch_table(link)?;
        let rows = normalize(&table, &link.player_name(), self.date);
        if rows.is_empty() {
            return Err(TransferError::EmptyTable {
                url: link.url().to_string(),
            }
            .into());
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use anyhow::{Result, anyhow};
    use chrono::NaiveDate;

    use super::{MarketSource, TransferAggregator};
    use crate::links::{LinkSelector, MarketLink};
    use crate::table::{RawTable, TableLayout};

    struct CannedSource {
        tables: HashMap<String, RawTable>,
    }

    impl MarketSource for CannedSource {
        fn fetch_listing(&self, _url: &str) -> Result<Vec<(String, String)>> {
            Ok(Vec::new())
        }

        fn fetch_table(&self, link: &MarketLink) -> Result<RawTable> {
            self.tables
                .get(link.url())
                .cloned()
                .ok_or_else(|| anyhow!("timed out waiting for odds table"))
        }
    }

    fn link(url: &str) -> MarketLink {
        MarketLink::new(url, LinkSelector::default().patterns())
    }

    fn table(outcomes: &[(&str, &str)]) -> RawTable {
        let mut rows = vec![vec![String::new(), "Bet365".to_string()]];
        for (label, quote) in outcomes {
            rows.push(vec![label.to_string(), quote.to_string()]);
        }
        RawTable::new(rows, TableLayout::OutcomeRows)
    }

    #[test]
    fn one_failing_link_does_not_sink_the_run() {
        let links = vec![
            link("https://x.com/a/harry-kane/to-sign-for"),
            link("https://x.com/a/broken-page/to-sign-for"),
            link("https://x.com/a/declan-rice/to-sign-for"),
        ];
        let source = CannedSource {
            tables: HashMap::from([
                (
                    links[0].url().to_string(),
                    table(&[("Bayern", "1/2"), ("To Stay", "6/4")]),
                ),
                (links[2].url().to_string(), table(&[("Arsenal", "1/10")])),
            ]),
        };

        let date = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        let mut seen = Vec::new();
        let out = TransferAggregator::new(date).run_with_progress(&links, &source, |p| {
            seen.push((p.current, p.total))
        });

        assert_eq!(out.dataset.len(), 3);
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].url, links[1].url());
        assert!(out.failures[0].reason.contains("timed out"));
        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);

        let players: Vec<&str> = out.dataset.rows().iter().map(|r| r.player.as_str()).collect();
        assert_eq!(players, vec!["Harry Kane", "Harry Kane", "Declan Rice"]);
        assert!(out.dataset.rows().iter().all(|r| r.date == date));
    }

    #[test]
    fn empty_table_counts_as_failure() {
        let links = vec![link("https://x.com/a/nobody/to-sign-for")];
        let source = CannedSource {
            tables: HashMap::from([(links[0].url().to_string(), table(&[]))]),
        };
        let out = TransferAggregator::new(NaiveDate::from_ymd_opt(2026, 8, 1).unwrap())
            .run(&links, &source);
        assert!(out.dataset.is_empty());
        assert_eq!(out.failures.len(), 1);
        assert!(out.failures[0].reason.contains("no outcome rows"));
    }
}

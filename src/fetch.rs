use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::aggregate::MarketSource;
use crate::config::ScraperConfig;
use crate::error::TransferError;
use crate::http_client::http_client;
use crate::links::MarketLink;
use crate::table::{RawTable, TableLayout};

/// Odds cells carry the canonical fractional quote here; the visible text may
/// be reformatted (decimal, "EVS", promo badges).
const ODDS_ATTR: &str = "data-o";

/// Fetches listing and market pages over plain HTTP.
///
/// Pages are re-requested until a readiness selector shows up, bounded by
/// `page_wait`. Running out of time is an ordinary error for the caller.
pub struct HttpMarketSource {
    client: &'static Client,
    base_url: String,
    table_marker: String,
    listing_marker: Option<String>,
    page_wait: Duration,
    page_poll: Duration,
}

impl HttpMarketSource {
    pub fn from_config(cfg: &ScraperConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(cfg.request_timeout)?,
            base_url: cfg.base_url.clone(),
            table_marker: cfg.table_marker.clone(),
            listing_marker: cfg.listing_marker.clone(),
            page_wait: cfg.page_wait,
            page_poll: cfg.page_poll,
        })
    }

    fn get(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .header(ACCEPT, "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header(ACCEPT_LANGUAGE, "en-GB,en;q=0.5")
            .send()
            .with_context(|| format!("request failed: {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TransferError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }
        resp.text().context("failed reading page body")
    }

    fn get_when_ready(&self, url: &str, marker: Option<&str>) -> Result<String> {
        let started = Instant::now();
        loop {
            let html = self.get(url)?;
            let Some(marker) = marker else {
                return Ok(html);
            };
            if has_marker(&html, marker)? {
                return Ok(html);
            }
            if started.elapsed() + self.page_poll > self.page_wait {
                return Err(TransferError::NotReady {
                    url: url.to_string(),
                    marker: marker.to_string(),
                    waited_secs: started.elapsed().as_secs(),
                }
                .into());
            }
            tracing::debug!(url, marker, "page not ready, polling again");
            thread::sleep(self.page_poll);
        }
    }
}

impl MarketSource for HttpMarketSource {
    fn fetch_listing(&self, url: &str) -> Result<Vec<(String, String)>> {
        let html = self.get_when_ready(url, self.listing_marker.as_deref())?;
        extract_links(&html, &self.base_url)
    }

    fn fetch_table(&self, link: &MarketLink) -> Result<RawTable> {
        let html = self.get_when_ready(link.url(), Some(&self.table_marker))?;
        extract_last_table(&html)?.ok_or_else(|| {
            TransferError::NoTable {
                url: link.url().to_string(),
            }
            .into()
        })
    }
}

fn selector(raw: &str) -> Result<Selector> {
    Selector::parse(raw).map_err(|e| anyhow!("invalid selector `{raw}`: {e}"))
}

pub fn has_marker(html: &str, marker: &str) -> Result<bool> {
    let sel = selector(marker)?;
    Ok(Html::parse_document(html).select(&sel).next().is_some())
}

/// Every `<a href>` on the page as `(label, absolute url)`, in document order.
///
/// Relative links resolve against `base_url`; non-http targets are dropped.
pub fn extract_links(html: &str, base_url: &str) -> Result<Vec<(String, String)>> {
    let base = Url::parse(base_url).with_context(|| format!("invalid base url {base_url}"))?;
    let anchors = selector("a[href]")?;
    let document = Html::parse_document(html);

    let mut out = Vec::new();
    for a in document.select(&anchors) {
        let Some(href) = a.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = base.join(href.trim()) else {
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }
        out.push((cell_text(&a), resolved.to_string()));
    }
    Ok(out)
}

/// The last `<table>` on the page as a grid, one row per `<tr>`.
///
/// Market pages render one outcome per row with bookmakers across the top. When
/// the first row has no `<th>` cells a blank header row is inserted so that
/// row 0 is always the bookmaker header.
pub fn extract_last_table(html: &str) -> Result<Option<RawTable>> {
    let tables = selector("table")?;
    let rows_sel = selector("tr")?;
    let cells_sel = selector("th, td")?;
    let header_sel = selector("th")?;
    let document = Html::parse_document(html);

    let Some(table) = document.select(&tables).last() else {
        return Ok(None);
    };

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut first_is_header = false;
    for (idx, tr) in table.select(&rows_sel).enumerate() {
        if idx == 0 {
            first_is_header = tr.select(&header_sel).next().is_some();
        }
        let row: Vec<String> = tr
            .select(&cells_sel)
            .map(|cell| match cell.value().attr(ODDS_ATTR) {
                Some(quote) if !quote.trim().is_empty() => quote.trim().to_string(),
                _ => cell_text(&cell),
            })
            .collect();
        rows.push(row);
    }
    if rows.is_empty() {
        return Ok(None);
    }
    if !first_is_header {
        rows.insert(0, Vec::new());
    }
    Ok(Some(RawTable::new(rows, TableLayout::OutcomeRows)))
}

fn cell_text(el: &ElementRef) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::{extract_last_table, extract_links, has_marker};

    #[test]
    fn links_resolve_against_base() {
        let html = r#"
<ul>
  <li><a href="/football/player-specials/harry-kane/to-sign-for"> Harry
      Kane </a></li>
  <li><a href="https://other.example/x">Other</a></li>
  <li><a href="mailto:someone@example.com">Mail</a></li>
  <li><a>No href</a></li>
</ul>"#;
        let links = extract_links(html, "https://www.oddschecker.com").expect("parse");
        assert_eq!(
            links,
            vec![
                (
                    "Harry Kane".to_string(),
                    "https://www.oddschecker.com/football/player-specials/harry-kane/to-sign-for"
                        .to_string()
                ),
                ("Other".to_string(), "https://other.example/x".to_string()),
            ]
        );
    }

    #[test]
    fn last_table_wins_and_prefers_odds_attribute() {
        let html = r#"
<table><tr><th>Ignore</th></tr><tr><td>me</td></tr></table>
<table id="t1">
  <thead><tr><th></th><th>Bet365</th><th>SkyBet</th></tr></thead>
  <tbody>
    <tr><td>Arsenal</td><td data-o="5/2">3.5</td><td>11/4</td></tr>
    <tr><td>To Stay</td><td data-o="">EVS</td><td></td></tr>
  </tbody>
</table>"#;
        let table = extract_last_table(html).expect("parse").expect("table");
        assert_eq!(table.height(), 3);
        assert_eq!(table.rows()[0], vec!["", "Bet365", "SkyBet"]);
        assert_eq!(table.rows()[1], vec!["Arsenal", "5/2", "11/4"]);
        assert_eq!(table.rows()[2], vec!["To Stay", "EVS", ""]);
    }

    #[test]
    fn headerless_table_gets_blank_header() {
        let html = "<table><tr><td>PSG</td><td>4/1</td></tr></table>";
        let table = extract_last_table(html).expect("parse").expect("table");
        assert_eq!(table.height(), 2);
        assert_eq!(table.rows()[0], vec!["", ""]);
        assert_eq!(table.rows()[1], vec!["PSG", "4/1"]);
    }

    #[test]
    fn missing_table_and_marker() {
        assert!(extract_last_table("<p>nothing</p>").expect("parse").is_none());
        assert!(has_marker(r#"<div id="t1"></div>"#, "#t1").expect("selector"));
        assert!(!has_marker("<div></div>", "#t1").expect("selector"));
        assert!(has_marker("<div></div>", "###").is_err());
    }
}

use serde::Serialize;

use crate::error::TransferError;

pub const DEFAULT_LINK_PATTERNS: &[&str] = &["club-after-summer-transfer-window", "to-sign-for"];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MarketLink {
    url: String,
    player_slug: String,
}

impl MarketLink {
    /// The player slug is the last path segment, cut at the first market
    /// pattern it contains: `.../jack-grealish-to-sign-for-man-city` gives
    /// `jack-grealish`. A segment that starts with a pattern, as in
    /// `.../harry-kane/club-after-summer-transfer-window`, defers to the
    /// segment before it.
    pub fn new(url: impl Into<String>, market_patterns: &[String]) -> Self {
        let url = url.into();
        let player_slug = player_slug(&url, market_patterns);
        Self { url, player_slug }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn player_slug(&self) -> &str {
        &self.player_slug
    }

    pub fn player_name(&self) -> String {
        title_case(&self.player_slug.replace('-', " "))
    }
}

fn player_slug(url: &str, market_patterns: &[String]) -> String {
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let path = path
        .split_once("://")
        .map(|(_, rest)| rest.split_once('/').map(|(_, p)| p).unwrap_or(""))
        .unwrap_or(path);

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let Some((last, rest)) = segments.split_last() else {
        return String::new();
    };
    let Some(at) = market_patterns
        .iter()
        .filter_map(|p| last.find(p.as_str()))
        .min()
    else {
        return last.to_string();
    };
    let prefix = last[..at].trim_end_matches('-');
    match (prefix.is_empty(), rest.last()) {
        (false, _) => prefix.to_string(),
        (true, Some(prev)) => prev.to_string(),
        (true, None) => last.to_string(),
    }
}

/// Uppercase the first letter of every alphabetic run, lowercase the rest.
fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut at_word_start = true;
    for ch in raw.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct LinkSelector {
    patterns: Vec<String>,
}

impl Default for LinkSelector {
    fn default() -> Self {
        Self::new(DEFAULT_LINK_PATTERNS.iter().map(|p| p.to_string()).collect())
    }
}

impl LinkSelector {
    pub fn new(patterns: Vec<String>) -> Self {
        let patterns = patterns
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        Self { patterns }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Listing order is kept; a repeated URL keeps its first occurrence.
    pub fn select(&self, links: &[(String, String)]) -> Result<Vec<MarketLink>, TransferError> {
        let mut selected: Vec<MarketLink> = Vec::new();
        for (_, url) in links {
            if !self.patterns.iter().any(|p| url.contains(p.as_str())) {
                continue;
            }
            if selected.iter().any(|l| l.url() == url) {
                continue;
            }
            selected.push(MarketLink::new(url.clone(), &self.patterns));
        }

        if selected.is_empty() {
            return Err(TransferError::EmptyLinkSet {
                patterns: self.patterns.clone(),
            });
        }
        Ok(selected)
    }
}

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::TransferError;
use crate::links::DEFAULT_LINK_PATTERNS;
use crate::report::DEFAULT_SENTINELS;

const DEFAULT_BASE_URL: &str = "https://www.oddschecker.com";
const DEFAULT_LISTING_PATH: &str = "/football/player-specials";
const DEFAULT_TABLE_MARKER: &str = "#t1";
const DEFAULT_BUCKET: &str = "transfer-scraper";
const DEFAULT_PAGE_WAIT_SECS: u64 = 60;
const DEFAULT_PAGE_POLL_MS: u64 = 1000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_TOP_N: usize = 30;

#[derive(Debug, Clone, PartialEq)]
pub enum StorageConfig {
    Local {
        root: PathBuf,
    },
    Object {
        endpoint: String,
        bucket: String,
        token: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub base_url: String,
    pub listing_path: String,
    pub link_patterns: Vec<String>,
    pub table_marker: String,
    pub listing_marker: Option<String>,
    pub page_wait: Duration,
    pub page_poll: Duration,
    pub request_timeout: Duration,
    pub storage: StorageConfig,
    pub sentinels: Vec<String>,
    pub top_n: usize,
    pub history_db: Option<PathBuf>,
}

impl ScraperConfig {
    /// Reads `.env.local` / `.env` if present, then the process environment.
    pub fn from_env() -> Result<Self, TransferError> {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, TransferError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let base_url = get("ODDS_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(TransferError::Config {
                key: "ODDS_BASE_URL",
                reason: format!("expected an http(s) url, got {base_url}"),
            });
        }

        let listing_path = get("ODDS_LISTING_PATH").unwrap_or_else(|| DEFAULT_LISTING_PATH.to_string());
        let link_patterns = get("TRANSFER_LINK_PATTERNS")
            .map(|v| split_list(&v))
            .unwrap_or_else(|| DEFAULT_LINK_PATTERNS.iter().map(|p| p.to_string()).collect());
        if link_patterns.is_empty() {
            return Err(TransferError::Config {
                key: "TRANSFER_LINK_PATTERNS",
                reason: "no patterns given".to_string(),
            });
        }

        let sentinels = get("SENTINEL_DESTINATIONS")
            .map(|v| split_list(&v))
            .unwrap_or_else(|| DEFAULT_SENTINELS.iter().map(|s| s.to_string()).collect());

        let page_wait_secs = parse_or(get("PAGE_WAIT_SECS"), DEFAULT_PAGE_WAIT_SECS).clamp(1, 600);
        let page_poll_ms = parse_or(get("PAGE_POLL_MS"), DEFAULT_PAGE_POLL_MS).clamp(100, 60_000);
        let request_timeout_secs =
            parse_or(get("REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS).clamp(1, 300);
        let top_n = parse_or(get("TOP_N"), DEFAULT_TOP_N).max(1);

        let storage = match get("STORAGE_BACKEND")
            .unwrap_or_else(|| "local".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "local" => StorageConfig::Local {
                root: PathBuf::from(get("OUTPUT_ROOT").unwrap_or_else(|| ".".to_string())),
            },
            "object" | "s3" => {
                let Some(endpoint) = get("OBJECT_ENDPOINT") else {
                    return Err(TransferError::Config {
                        key: "OBJECT_ENDPOINT",
                        reason: "required when STORAGE_BACKEND=object".to_string(),
                    });
                };
                StorageConfig::Object {
                    endpoint: endpoint.trim_end_matches('/').to_string(),
                    bucket: get("OBJECT_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
                    token: get("OBJECT_TOKEN"),
                }
            }
            other => {
                return Err(TransferError::Config {
                    key: "STORAGE_BACKEND",
                    reason: format!("unsupported backend {other}, expected local or object"),
                });
            }
        };

        Ok(Self {
            base_url,
            listing_path,
            link_patterns,
            table_marker: get("ODDS_TABLE_MARKER").unwrap_or_else(|| DEFAULT_TABLE_MARKER.to_string()),
            listing_marker: get("LISTING_MARKER"),
            page_wait: Duration::from_secs(page_wait_secs),
            page_poll: Duration::from_millis(page_poll_ms),
            request_timeout: Duration::from_secs(request_timeout_secs),
            storage,
            sentinels,
            top_n,
            history_db: get("HISTORY_DB").map(PathBuf::from),
        })
    }

    pub fn listing_url(&self) -> String {
        if self.listing_path.starts_with("http") {
            return self.listing_path.clone();
        }
        let path = self.listing_path.trim_start_matches('/');
        format!("{}/{path}", self.base_url)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.parse::<T>().ok()).unwrap_or(default)
}

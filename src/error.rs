use thiserror::Error;

/// Failures the scrape pipeline distinguishes between.
///
/// Unparseable odds cells never show up here: the odds parser maps them to a
/// missing probability instead.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Link discovery matched nothing. Usually the listing page layout moved.
    #[error("no market links matched any of {patterns:?}")]
    EmptyLinkSet { patterns: Vec<String> },

    #[error("page {url} not ready: `{marker}` missing after {waited_secs}s")]
    NotReady {
        url: String,
        marker: String,
        waited_secs: u64,
    },

    #[error("no odds table found on {url}")]
    NoTable { url: String },

    #[error("odds table on {url} has no outcome rows")]
    EmptyTable { url: String },

    #[error("http {status} for {url}")]
    Http { url: String, status: u16 },

    #[error("failed to store {key}: {reason}")]
    Storage { key: String, reason: String },

    #[error("invalid config {key}: {reason}")]
    Config { key: &'static str, reason: String },
}

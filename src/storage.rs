use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

use crate::config::StorageConfig;
use crate::error::TransferError;
use crate::http_client::http_client;

pub const CSV_CONTENT_TYPE: &str = "text/csv";
pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const PNG_CONTENT_TYPE: &str = "image/png";

pub const PLAYERS_PREFIX: &str = "output/players";
pub const DESTINATIONS_PREFIX: &str = "output/destinations";

pub fn dataset_key(date: NaiveDate) -> String {
    format!("data/{}.csv", date.format("%Y-%m-%d"))
}

pub fn failures_key(date: NaiveDate) -> String {
    format!("data/{}.failures.json", date.format("%Y-%m-%d"))
}

pub fn destination_chart_key(name: &str) -> String {
    format!("{DESTINATIONS_PREFIX}/{}.png", sanitize_key_segment(name))
}

pub fn player_chart_key(name: &str) -> String {
    format!("{PLAYERS_PREFIX}/{}.png", sanitize_key_segment(name))
}

pub fn overall_chart_key(n: usize) -> String {
    format!("output/{n} most likely overall.png")
}

/// Names come from scraped text; keep them to one path segment.
pub fn sanitize_key_segment(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim().trim_matches('.');
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}

pub trait Storage {
    fn put(&self, key: &str, body: &[u8], content_type: &str) -> Result<()>;

    /// Drop previous objects under `prefix` before a fresh batch is written.
    /// Backends that cannot list keep the old objects and get overwritten.
    fn clear_prefix(&self, _prefix: &str) -> Result<()> {
        Ok(())
    }
}

pub fn open_storage(cfg: &StorageConfig, client_timeout: std::time::Duration) -> Result<Box<dyn Storage>> {
    Ok(match cfg {
        StorageConfig::Local { root } => Box::new(LocalStorage::new(root.clone())),
        StorageConfig::Object {
            endpoint,
            bucket,
            token,
        } => Box::new(ObjectStorage {
            client: http_client(client_timeout)?,
            endpoint: endpoint.clone(),
            bucket: bucket.clone(),
            token: token.clone(),
        }),
    })
}

pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let rel = Path::new(key);
        if rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(TransferError::Storage {
                key: key.to_string(),
                reason: "key must be a relative path without `..`".to_string(),
            }
            .into());
        }
        Ok(self.root.join(rel))
    }
}

impl Storage for LocalStorage {
    fn put(&self, key: &str, body: &[u8], _content_type: &str) -> Result<()> {
        let path = self.path_for(key)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, body).with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, &path).with_context(|| format!("swap {}", path.display()))?;
        Ok(())
    }

    fn clear_prefix(&self, prefix: &str) -> Result<()> {
        let dir = self.path_for(prefix)?;
        match fs::remove_dir_all(&dir) {
            Ok(()) => {
                tracing::info!(dir = %dir.display(), "previous output removed");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(dir = %dir.display(), "no previous output directory");
                Ok(())
            }
            Err(err) => Err(err).with_context(|| format!("remove {}", dir.display())),
        }
    }
}

pub struct ObjectStorage {
    client: &'static Client,
    endpoint: String,
    bucket: String,
    token: Option<String>,
}

impl ObjectStorage {
    fn object_url(&self, key: &str) -> String {
        let encoded: Vec<String> = key
            .split('/')
            .map(|seg| url::form_urlencoded::byte_serialize(seg.as_bytes()).collect::<String>())
            .collect();
        format!("{}/{}/{}", self.endpoint, self.bucket, encoded.join("/").replace('+', "%20"))
    }
}

impl Storage for ObjectStorage {
    fn put(&self, key: &str, body: &[u8], content_type: &str) -> Result<()> {
        let url = self.object_url(key);
        let mut req = self
            .client
            .put(&url)
            .header(CONTENT_TYPE, content_type)
            .body(body.to_vec());
        if let Some(token) = self.token.as_ref() {
            req = req.bearer_auth(token);
        }
        let resp = req.send().map_err(|e| TransferError::Storage {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TransferError::Storage {
                key: key.to_string(),
                reason: format!("http {status}"),
            }
            .into());
        }
        Ok(())
    }
}

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogMode {
    Stdout,
    File,
}

/// `RUST_LOG` wins over the default `info` level. File mode truncates the log
/// on every run.
pub fn init(mode: LogMode, path: &Path) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    match mode {
        LogMode::Stdout => builder
            .try_init()
            .map_err(|e| anyhow::anyhow!("init logging: {e}")),
        LogMode::File => {
            let file = File::create(path).with_context(|| format!("create log {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|e| anyhow::anyhow!("init logging: {e}"))
        }
    }
}

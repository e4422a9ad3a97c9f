//! Unified log stream of builder and deployer events.
//!
//! Every fetch is an independent read of the provider. Tailing repeats
//! [`LogAggregator::fetch_new`] on an interval and delivers only unseen entries.

use crate::config::{BuilderSource, Config};
use crate::error::Result;
use crate::observability::metrics;
use crate::provider::CloudProvider;
use crate::types::{LogEntry, LogFilter, Process};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

pub mod builder;
pub mod cursor;
pub mod deployer;

pub use cursor::{last_n, merge, new_since};

/// Parameters of a tail session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailOptions {
    /// Delay between two fetches
    pub interval: Duration,
    /// Size of the initial batch
    pub lines: usize,
}

impl Default for TailOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for TailOptions {
    fn from(config: &Config) -> Self {
        Self { interval: Duration::from_secs(config.tail_interval_secs), lines: config.log_lines }
    }
}

/// Fetches and merges application logs.
#[derive(Clone)]
pub struct LogAggregator {
    provider: Arc<dyn CloudProvider>,
    builder_source: BuilderSource,
}

impl LogAggregator {
    pub fn new(provider: Arc<dyn CloudProvider>, builder_source: BuilderSource) -> Self {
        Self { provider, builder_source }
    }

    /// All current entries matching `filter`, ordered by timestamp.
    #[instrument(skip(self), fields(provider = %self.provider.name()))]
    pub async fn fetch(&self, app: &str, filter: &LogFilter) -> Result<Vec<LogEntry>> {
        let builder = if filter.wants(Process::Builder) {
            builder::fetch(self.provider.as_ref(), app, self.builder_source).await?
        } else {
            Vec::new()
        };
        let deployer = if filter.wants(Process::Deployer) {
            deployer::fetch(self.provider.as_ref(), app).await?
        } else {
            Vec::new()
        };

        metrics::record_log_entries(Process::Builder.as_str(), builder.len());
        metrics::record_log_entries(Process::Deployer.as_str(), deployer.len());
        debug!(builder = builder.len(), deployer = deployer.len(), "Fetched log entries");

        Ok(merge(builder, deployer))
    }

    /// Entries produced after `last_seen`; everything on a cold start.
    pub async fn fetch_new(
        &self,
        app: &str,
        filter: &LogFilter,
        last_seen: Option<&LogEntry>,
    ) -> Result<Vec<LogEntry>> {
        let entries = self.fetch(app, filter).await?;
        Ok(new_since(entries, last_seen))
    }

    /// Stream the last `lines` entries, then new entries every `interval`, until
    /// `cancel` fires or the receiver is dropped.
    #[instrument(skip(self, tx, cancel))]
    pub async fn tail(
        &self,
        app: &str,
        filter: &LogFilter,
        options: TailOptions,
        tx: mpsc::Sender<LogEntry>,
        cancel: CancellationToken,
    ) -> Result<()> {
        let initial = last_n(self.fetch(app, filter).await?, options.lines);
        let mut last_seen = initial.last().cloned();
        if !deliver(&tx, initial).await {
            return Ok(());
        }

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(app = %app, "Tail cancelled");
                    return Ok(());
                }
                _ = tokio::time::sleep(options.interval) => {}
            }

            let entries = self.fetch_new(app, filter, last_seen.as_ref()).await?;
            if let Some(last) = entries.last() {
                last_seen = Some(last.clone());
            }
            if !deliver(&tx, entries).await {
                debug!(app = %app, "Tail receiver dropped");
                return Ok(());
            }
        }
    }
}

/// Send entries in order. Returns `false` once the receiver is gone.
async fn deliver(tx: &mpsc::Sender<LogEntry>, entries: Vec<LogEntry>) -> bool {
    for entry in entries {
        if tx.send(entry).await.is_err() {
            return false;
        }
    }
    true
}

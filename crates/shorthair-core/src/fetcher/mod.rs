//! Top-level download orchestration.
//!
//! A [`Fetcher`] discovers the resource size once, then on [`Fetcher::start`]
//! creates the output file, splits it into ranges, and runs one
//! [`RangeWorker`] per range under a single supervisor while a polling task
//! sums progress and ends the run once every byte is on disk.

mod options;
mod progress;

pub use options::{
    FetchOptions, DEFAULT_BUFFER_BYTES, DEFAULT_CONNECTIONS, DEFAULT_POLL_INTERVAL,
    DEFAULT_WRITERS_PER_RANGE,
};
pub use progress::ProgressStats;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::downloader::{FetchContext, RangeWorker};
use crate::error::FetchError;
use crate::segmenter::plan_ranges;
use crate::logging;
use crate::source::{HttpSource, RangeSource};
use crate::storage::{OutputFile, OutputFileBuilder};
use crate::url_model;
use crate::worker::{Query, Reply, Worker, WorkerManager};

pub struct Fetcher {
    url: String,
    options: FetchOptions,
    source: Arc<dyn RangeSource>,
    total: u64,
    written: Arc<AtomicU64>,
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("url", &self.url)
            .field("options", &self.options)
            .field("total", &self.total)
            .field("written", &self.current_length())
            .finish_non_exhaustive()
    }
}

impl Fetcher {
    /// Discovers `url` over HTTP. Fails, without touching the filesystem, when
    /// the server cannot serve byte ranges.
    pub async fn new(url: impl Into<String>, options: FetchOptions) -> Result<Self, FetchError> {
        let source = Arc::new(HttpSource::new(options.http.clone()));
        Self::with_source(url, options, source).await
    }

    pub async fn with_source(
        url: impl Into<String>,
        options: FetchOptions,
        source: Arc<dyn RangeSource>,
    ) -> Result<Self, FetchError> {
        let url = url.into();
        url::Url::parse(&url).map_err(|e| FetchError::InvalidUrl {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        let options = options.resolved();
        let total = source.discover(&url).await?;
        tracing::info!(url = %url, total, connections = options.connections, "discovered");

        Ok(Self {
            url,
            options,
            source,
            total,
            written: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    pub fn total_length(&self) -> u64 {
        self.total
    }

    /// Bytes on disk as of the last progress poll.
    pub fn current_length(&self) -> u64 {
        self.written.load(Ordering::Acquire)
    }

    pub fn snapshot(&self, elapsed: Duration) -> ProgressStats {
        ProgressStats {
            bytes_done: self.current_length(),
            total_bytes: self.total,
            elapsed_secs: elapsed.as_secs_f64(),
        }
    }

    /// Downloads the whole resource and returns the path written.
    pub async fn start(&self) -> Result<PathBuf, FetchError> {
        self.download()
            .instrument(logging::download_span(&self.url, self.total))
            .await
    }

    async fn download(&self) -> Result<PathBuf, FetchError> {
        let path = self.output_path()?;
        let mut builder = OutputFileBuilder::create(&path)?;
        builder.preallocate(self.total)?;
        let file = builder.build();

        let manager = self.range_manager(file.clone())?;
        tracing::info!(path = %path.display(), ranges = manager.count(), "download started");
        self.run(manager).await?;

        file.sync()?;
        tracing::info!(path = %path.display(), bytes = self.total, "download complete");
        Ok(path)
    }

    /// One `RangeWorker` per planned range, all writing into `file`.
    fn range_manager(&self, file: OutputFile) -> Result<WorkerManager, FetchError> {
        let ctx = Arc::new(FetchContext {
            url: self.url.clone(),
            source: Arc::clone(&self.source),
            file,
            writers_per_range: self.options.writers_per_range,
            buffer_bytes: self.options.buffer_bytes,
            poll_interval: self.options.poll_interval(),
        });
        let ranges = plan_ranges(self.total, self.options.connections);
        WorkerManager::with_factory("ranges", ranges.len(), |i| {
            let worker: Arc<dyn Worker> =
                Arc::new(RangeWorker::new(i, ranges[i], Arc::clone(&ctx)));
            Ok(worker)
        })
    }

    /// Runs `manager` alongside the progress poller; the first error wins.
    async fn run(&self, manager: WorkerManager) -> Result<(), FetchError> {
        let manager = Arc::new(manager);
        let cancel = CancellationToken::new();

        let poller = tokio::spawn(poll_progress(
            Arc::clone(&manager),
            Arc::clone(&self.written),
            self.total,
            self.options.poll_interval(),
            cancel.clone(),
        ));
        let outcome = manager.run(cancel.clone(), None).await;
        cancel.cancel();
        poller.await?;
        outcome?;

        let written = bytes_written(&manager);
        self.written.store(written, Ordering::Release);
        if written != self.total {
            return Err(FetchError::Incomplete {
                written,
                total: self.total,
            });
        }
        Ok(())
    }

    fn output_path(&self) -> Result<PathBuf, FetchError> {
        let path = match &self.options.output {
            Some(p) => p.clone(),
            None => PathBuf::from(url_model::derive_filename(&self.url)?),
        };
        if !self.options.timestamp_suffix {
            return Ok(path);
        }
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let mut name = path.into_os_string();
        name.push(format!("_{}", nanos));
        Ok(PathBuf::from(name))
    }
}

/// Sum of `BytesWritten` over every range.
fn bytes_written(manager: &WorkerManager) -> u64 {
    (0..manager.count())
        .filter_map(|i| manager.get(i).ok())
        .filter_map(|w| w.query(Query::BytesWritten).ok())
        .filter_map(Reply::bytes)
        .sum()
}

/// Publishes progress every `interval` and cancels the run once `total` bytes
/// are on disk.
async fn poll_progress(
    manager: Arc<WorkerManager>,
    written: Arc<AtomicU64>,
    total: u64,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }
        let sum = bytes_written(&manager);
        written.store(sum, Ordering::Release);
        tracing::trace!(written = sum, total, "progress");
        if sum >= total {
            tracing::debug!(total, "all bytes written");
            cancel.cancel();
            return;
        }
    }
}

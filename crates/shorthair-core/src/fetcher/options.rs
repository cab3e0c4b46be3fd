//! Knobs for one download.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::ShorthairConfig;
use crate::source::HttpOptions;

pub const DEFAULT_CONNECTIONS: usize = 2;
pub const DEFAULT_WRITERS_PER_RANGE: usize = 2;
pub const DEFAULT_BUFFER_BYTES: usize = 4 * 1024 * 1024;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Options for [`Fetcher`](super::Fetcher). Zero counts and sizes mean "use the
/// default".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Number of ranges, each with its own connection.
    pub connections: usize,
    pub writers_per_range: usize,
    /// Capacity of each transfer buffer.
    pub buffer_bytes: usize,
    /// Destination; derived from the URL when `None`.
    pub output: Option<PathBuf>,
    /// Append `_<unix nanos>` to the output file name.
    pub timestamp_suffix: bool,
    /// Progress and drain polling period.
    pub poll_interval: Option<Duration>,
    pub http: HttpOptions,
}

impl FetchOptions {
    /// Options seeded from the config file; the CLI overrides fields on top.
    pub fn from_config(cfg: &ShorthairConfig) -> Self {
        Self {
            connections: cfg.connections,
            writers_per_range: cfg.writers_per_range,
            buffer_bytes: cfg.buffer_bytes,
            output: None,
            timestamp_suffix: cfg.timestamp_suffix,
            poll_interval: (cfg.poll_interval_ms > 0)
                .then(|| Duration::from_millis(cfg.poll_interval_ms)),
            http: cfg.http.clone().unwrap_or_default().into(),
        }
    }

    /// Replaces zero values with defaults.
    pub(crate) fn resolved(mut self) -> Self {
        if self.connections == 0 {
            self.connections = DEFAULT_CONNECTIONS;
        }
        if self.writers_per_range == 0 {
            self.writers_per_range = DEFAULT_WRITERS_PER_RANGE;
        }
        if self.buffer_bytes == 0 {
            self.buffer_bytes = DEFAULT_BUFFER_BYTES;
        }
        if self.poll_interval.map_or(true, |d| d.is_zero()) {
            self.poll_interval = Some(DEFAULT_POLL_INTERVAL);
        }
        self
    }

    pub(crate) fn poll_interval(&self) -> Duration {
        self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL)
    }
}

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::fetcher::{
    DEFAULT_BUFFER_BYTES, DEFAULT_CONNECTIONS, DEFAULT_POLL_INTERVAL, DEFAULT_WRITERS_PER_RANGE,
};
use crate::source::HttpOptions;

/// Transport limits (optional `[http]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    /// Abort a range transfer slower than this many bytes per second...
    pub low_speed_limit: u32,
    /// ...sustained for this many seconds.
    pub low_speed_time_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        let d = HttpOptions::default();
        Self {
            connect_timeout_secs: d.connect_timeout.as_secs(),
            low_speed_limit: d.low_speed_limit,
            low_speed_time_secs: d.low_speed_time.as_secs(),
        }
    }
}

impl From<HttpConfig> for HttpOptions {
    fn from(c: HttpConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(c.connect_timeout_secs),
            low_speed_limit: c.low_speed_limit,
            low_speed_time: Duration::from_secs(c.low_speed_time_secs),
            ..HttpOptions::default()
        }
    }
}

/// Global configuration loaded from `~/.config/shorthair/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShorthairConfig {
    /// Ranges (and connections) per download.
    pub connections: usize,
    /// Disk writers per range.
    pub writers_per_range: usize,
    /// Capacity of each transfer buffer in bytes.
    pub buffer_bytes: usize,
    /// Progress and drain polling period in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Append `_<unix nanos>` to output file names.
    #[serde(default)]
    pub timestamp_suffix: bool,
    /// Optional transport limits; if missing, built-in defaults are used.
    #[serde(default)]
    pub http: Option<HttpConfig>,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

impl Default for ShorthairConfig {
    fn default() -> Self {
        Self {
            connections: DEFAULT_CONNECTIONS,
            writers_per_range: DEFAULT_WRITERS_PER_RANGE,
            buffer_bytes: DEFAULT_BUFFER_BYTES,
            poll_interval_ms: default_poll_interval_ms(),
            timestamp_suffix: false,
            http: None,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("shorthair")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ShorthairConfig> {
    load_or_init_at(&config_path()?)
}

pub(crate) fn load_or_init_at(path: &Path) -> Result<ShorthairConfig> {
    if !path.exists() {
        let default_cfg = ShorthairConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)?;
    let cfg: ShorthairConfig = toml::from_str(&data)?;
    Ok(cfg)
}

//! libcurl-backed [`RangeSource`].

use std::time::Duration;

use async_trait::async_trait;

use super::{stream, RangeBody, RangeSource};
use crate::error::FetchError;
use crate::fetch_head;
use crate::segmenter::ByteRange;

/// Transport limits applied to every curl handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpOptions {
    pub connect_timeout: Duration,
    /// Abort a range transfer that stays below this many bytes per second...
    pub low_speed_limit: u32,
    /// ...for this long.
    pub low_speed_time: Duration,
    /// Hard limit on the HEAD probe.
    pub probe_timeout: Duration,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            low_speed_limit: 1024,
            low_speed_time: Duration::from_secs(60),
            probe_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HttpSource {
    options: HttpOptions,
}

impl HttpSource {
    pub fn new(options: HttpOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &HttpOptions {
        &self.options
    }
}

#[async_trait]
impl RangeSource for HttpSource {
    async fn discover(&self, url: &str) -> Result<u64, FetchError> {
        let url = url.to_string();
        let options = self.options.clone();
        let head = tokio::task::spawn_blocking(move || fetch_head::probe(&url, &options)).await??;
        head.segmentable_length()
    }

    async fn fetch_range(&self, url: &str, range: ByteRange) -> Result<RangeBody, FetchError> {
        stream::open_range(url, range, &self.options).await
    }
}

//! Error type shared by the engine and its collaborators.
//!
//! `FetchError` is `Clone` so a supervisor can both return a worker's error
//! and forward it on a notification channel.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

/// Any failure that ends a download. There is no retry: the first error to
/// reach the top of the supervision tree is what `Fetcher::start` returns.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// Discovery saw no `Accept-Ranges: bytes` header.
    #[error("server does not support byte ranges (no `Accept-Ranges: bytes`)")]
    RangesUnsupported,

    /// Discovery saw no usable `Content-Length`.
    #[error("server did not report Content-Length")]
    MissingLength,

    /// Non-2xx response to a probe.
    #[error("{url} returned HTTP {status}")]
    Http { url: String, status: u32 },

    /// The server answered a range request with something other than 206.
    #[error("server ignored range {start}-{end} (HTTP {status})")]
    RangeIgnored { start: u64, end: u64, status: u32 },

    #[error("curl: {0}")]
    Curl(#[from] curl::Error),

    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Creating or sizing the output file failed.
    #[error("output file {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },

    /// Stream read or positioned write failed.
    #[error("i/o: {0}")]
    Io(#[source] Arc<io::Error>),

    #[error("short write at offset {offset}: wrote {written} of {expected} bytes")]
    ShortWrite {
        offset: u64,
        expected: usize,
        written: usize,
    },

    /// A range reply declared a body length other than the range it answers.
    #[error("range {start}-{end} answered with {declared} bytes declared")]
    RangeLengthMismatch { start: u64, end: u64, declared: u64 },

    /// The range stream ended before (or after) its declared length.
    #[error("range {start}-{end} ended after {received} of {expected} bytes")]
    RangeTruncated {
        start: u64,
        end: u64,
        expected: u64,
        received: u64,
    },

    #[error("worker index {index} out of range (count {count})")]
    WorkerIndex { index: usize, count: usize },

    #[error("worker {worker} does not answer {query:?}")]
    UnsupportedQuery {
        worker: String,
        query: crate::worker::Query,
    },

    #[error("buffer pool closed")]
    PoolClosed,

    #[error("writer queue closed")]
    QueueClosed,

    /// A spawned task panicked or was aborted.
    #[error("task failed: {0}")]
    Task(String),

    #[error("download incomplete: {written} of {total} bytes written")]
    Incomplete { written: u64, total: u64 },
}

impl FetchError {
    pub(crate) fn output(path: impl Into<PathBuf>, source: io::Error) -> Self {
        FetchError::Output {
            path: path.into(),
            source: Arc::new(source),
        }
    }
}

impl From<io::Error> for FetchError {
    fn from(e: io::Error) -> Self {
        FetchError::Io(Arc::new(e))
    }
}

impl From<tokio::task::JoinError> for FetchError {
    fn from(e: tokio::task::JoinError) -> Self {
        FetchError::Task(e.to_string())
    }
}

//! Multi-connection segmented downloader.
//!
//! [`Fetcher`] splits a remote resource into byte ranges, streams each range
//! over its own connection, and writes the bytes into a preallocated file at
//! their offsets. Ranges and their disk writers are [`worker::Worker`]s run by
//! the same [`worker::WorkerManager`], so one failure anywhere cancels the
//! whole download.

pub mod config;
pub mod logging;

pub mod buffer;
pub mod downloader;
pub mod error;
pub mod fetch_head;
pub mod fetcher;
pub mod segmenter;
pub mod source;
pub mod storage;
pub mod url_model;
pub mod worker;

pub use error::FetchError;
pub use fetcher::{FetchOptions, Fetcher, ProgressStats};
pub use source::{HttpOptions, HttpSource, RangeBody, RangeSource};

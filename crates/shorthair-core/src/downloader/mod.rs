//! Core segmented download engine.
//!
//! One [`RangeWorker`] per byte range reads its stream into recycled buffers
//! and hands them to a small pool of [`Writer`]s, which put them on disk with
//! positioned writes. Both are [`Worker`](crate::worker::Worker)s so the same
//! supervisor runs ranges at the top level and writers under each range.

mod handoff;
mod range_worker;
mod writer;

pub use range_worker::RangeWorker;
pub use writer::Writer;

use std::sync::Arc;
use std::time::Duration;

use crate::source::RangeSource;
use crate::storage::OutputFile;

/// Everything a range needs that is the same for every range of a download.
pub struct FetchContext {
    pub url: String,
    pub source: Arc<dyn RangeSource>,
    pub file: OutputFile,
    pub writers_per_range: usize,
    pub buffer_bytes: usize,
    /// How often a draining range checks whether its writers caught up.
    pub poll_interval: Duration,
}

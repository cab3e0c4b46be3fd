//! Supervised workers.
//!
//! A [`Worker`] is anything the [`WorkerManager`] can run as one member of a
//! homogeneous group: range readers at the top level, disk writers under each
//! range. Workers are shared (`Arc<dyn Worker>`) so the supervisor can run them
//! while other tasks poll their status and counters through [`Worker::query`].

mod manager;

pub use manager::WorkerManager;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;

/// Load-balancing hint. It may lag reality briefly; nothing relies on it for
/// correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    Idle,
    Busy,
}

/// Request for [`Worker::query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    /// Bytes this worker (or its writers) has put on disk.
    BytesWritten,
    /// Bytes this worker has pulled off its stream.
    BytesRead,
    Status,
}

/// Answer to a [`Query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Bytes(u64),
    Status(WorkerStatus),
}

impl Reply {
    pub fn bytes(self) -> Option<u64> {
        match self {
            Reply::Bytes(n) => Some(n),
            Reply::Status(_) => None,
        }
    }
}

#[async_trait]
pub trait Worker: Send + Sync {
    fn identity(&self) -> &str;

    fn status(&self) -> WorkerStatus;

    /// Runs until done, failed, or `cancel` fires. Cancellation is not an
    /// error: a cancelled worker returns `Ok(())`.
    async fn run(&self, cancel: CancellationToken) -> Result<(), FetchError>;

    /// Reads internal state without disturbing `run`.
    fn query(&self, query: Query) -> Result<Reply, FetchError>;
}

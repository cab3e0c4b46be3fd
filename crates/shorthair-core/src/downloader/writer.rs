//! Disk writer: drains one queue of filled buffers into the output file.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::buffer::{Buffer, Recycler};
use crate::error::FetchError;
use crate::storage::OutputFile;
use crate::worker::{Query, Reply, Worker, WorkerStatus};

/// One of a range's writers. Buffers arrive on its own queue in FIFO order;
/// each already carries its absolute offset, so writers of the same range may
/// finish out of order relative to each other.
pub struct Writer {
    name: String,
    file: OutputFile,
    // Only `run` locks this; the lock is how `&self` gets at the receiver.
    queue: Mutex<mpsc::Receiver<Buffer>>,
    recycler: Recycler,
    /// The owning range's bytes-on-disk counter.
    range_written: Arc<AtomicU64>,
    written: AtomicU64,
    busy: AtomicBool,
}

impl Writer {
    pub fn new(
        name: impl Into<String>,
        file: OutputFile,
        queue: mpsc::Receiver<Buffer>,
        recycler: Recycler,
        range_written: Arc<AtomicU64>,
    ) -> Self {
        Self {
            name: name.into(),
            file,
            queue: Mutex::new(queue),
            recycler,
            range_written,
            written: AtomicU64::new(0),
            busy: AtomicBool::new(false),
        }
    }

    async fn flush(&self, buf: Buffer) -> Result<(), FetchError> {
        let _ = self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire);
        let result = self.write_and_recycle(buf).await;
        self.busy.store(false, Ordering::Release);
        result
    }

    async fn write_and_recycle(&self, buf: Buffer) -> Result<(), FetchError> {
        let file = self.file.clone();
        let (buf, result) = tokio::task::spawn_blocking(move || {
            let result = buf.write_to(&file);
            (buf, result)
        })
        .await?;
        let n = result? as u64;

        // Count before recycling: a returned buffer implies its bytes are tallied.
        self.written.fetch_add(n, Ordering::AcqRel);
        self.range_written.fetch_add(n, Ordering::AcqRel);
        self.recycler.give_back(buf).await
    }
}

#[async_trait]
impl Worker for Writer {
    fn identity(&self) -> &str {
        &self.name
    }

    fn status(&self) -> WorkerStatus {
        if self.busy.load(Ordering::Acquire) {
            WorkerStatus::Busy
        } else {
            WorkerStatus::Idle
        }
    }

    async fn run(&self, cancel: CancellationToken) -> Result<(), FetchError> {
        let mut queue = self.queue.lock().await;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(()),
                next = queue.recv() => match next {
                    Some(buf) => {
                        if let Err(e) = self.flush(buf).await {
                            tracing::warn!(writer = %self.name, error = %e, "write failed");
                            return Err(e);
                        }
                    }
                    // The range dropped its end of the queue.
                    None => return Ok(()),
                },
            }
        }
    }

    fn query(&self, query: Query) -> Result<Reply, FetchError> {
        match query {
            Query::BytesWritten => Ok(Reply::Bytes(self.written.load(Ordering::Acquire))),
            Query::Status => Ok(Reply::Status(self.status())),
            Query::BytesRead => Err(FetchError::UnsupportedQuery {
                worker: self.name.clone(),
                query,
            }),
        }
    }
}

//! One byte range: open its stream, fill buffers, hand them to writers.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::handoff::Handoff;
use super::{FetchContext, Writer};
use crate::buffer::BufferPool;
use crate::error::FetchError;
use crate::logging;
use crate::segmenter::ByteRange;
use crate::worker::{Query, Reply, Worker, WorkerManager, WorkerStatus};

/// Reads one inclusive range and keeps `writers_per_range` writers fed.
///
/// Lifecycle: fetching (stream open, dispatching buffers), then draining
/// (stream ended, waiting for writers to catch up), then done. Any error is
/// terminal and returned as-is; buffers still queued at that point are lost.
///
/// The reply must declare exactly `range.len()` bytes, and no byte is written
/// outside the range.
pub struct RangeWorker {
    index: usize,
    name: String,
    range: ByteRange,
    ctx: Arc<FetchContext>,
    read: AtomicU64,
    /// Shared with this range's writers.
    written: Arc<AtomicU64>,
    busy: AtomicBool,
}

impl RangeWorker {
    pub fn new(index: usize, range: ByteRange, ctx: Arc<FetchContext>) -> Self {
        Self {
            index,
            name: format!("range {}", index),
            range,
            ctx,
            read: AtomicU64::new(0),
            written: Arc::new(AtomicU64::new(0)),
            busy: AtomicBool::new(false),
        }
    }

    pub fn range(&self) -> ByteRange {
        self.range
    }

    async fn fetch(&self, cancel: &CancellationToken) -> Result<(), FetchError> {
        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            body = self.ctx.source.fetch_range(&self.ctx.url, self.range) => body?,
        };
        if body.declared_len != self.range.len() {
            return Err(FetchError::RangeLengthMismatch {
                start: self.range.start,
                end: self.range.end,
                declared: body.declared_len,
            });
        }
        tracing::debug!(declared = body.declared_len, "range stream open");

        let n = self.ctx.writers_per_range.max(1);
        let mut pool = BufferPool::new(n * n, self.ctx.buffer_bytes);
        let mut handoff = Handoff::new();
        let mut writers = WorkerManager::new(format!("{} writers", self.name));
        for i in 0..n {
            let (tx, rx) = mpsc::channel(n + 1);
            let writer: Arc<dyn Worker> = Arc::new(Writer::new(
                format!("{} writer {}", self.name, i),
                self.ctx.file.clone(),
                rx,
                pool.recycler(),
                Arc::clone(&self.written),
            ));
            handoff.push(tx, Arc::clone(&writer));
            writers.add(writer);
        }

        let scope = cancel.child_token();
        let mut writers_task = tokio::spawn({
            let scope = scope.clone();
            async move { writers.run(scope, None).await }
        });
        let mut writers_joined = false;

        let mut reader = body.reader;
        let mut ticker = tokio::time::interval(self.ctx.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut draining = false;

        let outcome = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break Ok(()),
                joined = &mut writers_task, if !writers_joined => {
                    writers_joined = true;
                    // Writers only stop on their own when one of them fails.
                    break match joined {
                        Ok(Ok(())) => Err(FetchError::QueueClosed),
                        Ok(Err(e)) => Err(e),
                        Err(e) => Err(e.into()),
                    };
                }
                step = self.dispatch_next(&mut pool, &mut reader, &mut handoff),
                    if !draining =>
                match step {
                    Ok(true) => {}
                    Ok(false) => {
                        if let Err(e) = self.check_read_complete() {
                            break Err(e);
                        }
                        tracing::debug!("stream drained, waiting for writers");
                        draining = true;
                        if self.writers_caught_up() {
                            break Ok(());
                        }
                    }
                    Err(e) => break Err(e),
                },
                _ = ticker.tick(), if draining => {
                    if self.writers_caught_up() {
                        break Ok(());
                    }
                }
            }
        };

        scope.cancel();
        drop(handoff);
        let writers_outcome = if writers_joined {
            Ok(())
        } else {
            match writers_task.await {
                Ok(result) => result,
                Err(e) => Err(e.into()),
            }
        };
        outcome.and(writers_outcome)
    }

    /// Fills one buffer and hands it off. `Ok(false)` means end of stream.
    async fn dispatch_next<R>(
        &self,
        pool: &mut BufferPool,
        reader: &mut R,
        handoff: &mut Handoff,
    ) -> Result<bool, FetchError>
    where
        R: AsyncRead + Send + Unpin + ?Sized,
    {
        let mut buf = pool.acquire().await?;
        let n = buf.fill_from(reader).await?;
        if n == 0 {
            pool.release(buf);
            return Ok(false);
        }

        let n = n as u64;
        let before = self.read.fetch_add(n, Ordering::AcqRel);
        if before + n > self.range.len() {
            return Err(self.truncated(before + n));
        }
        buf.set_offset(self.range.start + before);
        handoff.send(buf).await?;
        Ok(true)
    }

    fn check_read_complete(&self) -> Result<(), FetchError> {
        let read = self.read.load(Ordering::Acquire);
        if read != self.range.len() {
            return Err(self.truncated(read));
        }
        Ok(())
    }

    fn truncated(&self, received: u64) -> FetchError {
        FetchError::RangeTruncated {
            start: self.range.start,
            end: self.range.end,
            expected: self.range.len(),
            received,
        }
    }

    fn writers_caught_up(&self) -> bool {
        self.written.load(Ordering::Acquire) >= self.range.len()
    }
}

#[async_trait]
impl Worker for RangeWorker {
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
        let span = logging::range_span(self.index, self.range);
        async {
            self.busy.store(true, Ordering::Release);
            let result = self.fetch(&cancel).await;
            self.busy.store(false, Ordering::Release);

            match &result {
                Ok(()) => tracing::debug!(
                    read = self.read.load(Ordering::Acquire),
                    written = self.written.load(Ordering::Acquire),
                    "range finished"
                ),
                Err(e) => tracing::warn!(error = %e, "range failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    fn query(&self, query: Query) -> Result<Reply, FetchError> {
        Ok(match query {
            Query::BytesWritten => Reply::Bytes(self.written.load(Ordering::Acquire)),
            Query::BytesRead => Reply::Bytes(self.read.load(Ordering::Acquire)),
            Query::Status => Reply::Status(self.status()),
        })
    }
}

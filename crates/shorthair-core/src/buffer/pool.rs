//! Per-range buffer recycling.
//!
//! Every buffer a range will ever use is allocated up front and parked in one
//! bounded queue. The range's read loop takes buffers out; writers give them
//! back after flushing. The queue can hold every buffer at once, so giving one
//! back never waits, and an empty queue is the backpressure that stops the
//! reader from outrunning the disk.

use tokio::sync::mpsc;

use super::Buffer;
use crate::error::FetchError;

/// Empty buffers awaiting reuse. Owned by the range's read loop.
pub struct BufferPool {
    free: mpsc::Receiver<Buffer>,
    recycle: mpsc::Sender<Buffer>,
    total: usize,
}

impl BufferPool {
    /// Preloads `count` buffers of `capacity` bytes each.
    pub fn new(count: usize, capacity: usize) -> Self {
        let count = count.max(1);
        let (recycle, free) = mpsc::channel(count);
        for _ in 0..count {
            // The channel was sized for exactly `count` buffers.
            if recycle.try_send(Buffer::with_capacity(capacity)).is_err() {
                break;
            }
        }
        Self {
            free,
            recycle,
            total: count,
        }
    }

    /// Number of buffers this pool owns, parked or in flight.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Handle a writer uses to give buffers back.
    pub fn recycler(&self) -> Recycler {
        Recycler {
            tx: self.recycle.clone(),
        }
    }

    /// Takes an empty buffer, waiting while every buffer is in flight.
    pub async fn acquire(&mut self) -> Result<Buffer, FetchError> {
        self.free.recv().await.ok_or(FetchError::PoolClosed)
    }

    /// Takes an empty buffer if one is parked right now.
    pub fn try_acquire(&mut self) -> Option<Buffer> {
        self.free.try_recv().ok()
    }

    /// Parks a buffer the read loop took but did not dispatch.
    pub fn release(&self, buf: Buffer) {
        // Cannot be full: the pool never holds more buffers than it created.
        let _ = self.recycle.try_send(buf);
    }
}

/// Writer-side handle for returning flushed buffers to their pool.
#[derive(Clone)]
pub struct Recycler {
    tx: mpsc::Sender<Buffer>,
}

impl Recycler {
    pub async fn give_back(&self, buf: Buffer) -> Result<(), FetchError> {
        self.tx.send(buf).await.map_err(|_| FetchError::PoolClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn preloads_every_buffer() {
        let mut pool = BufferPool::new(4, 32);
        assert_eq!(pool.total(), 4);
        let mut taken = Vec::new();
        for _ in 0..4 {
            let buf = pool.acquire().await.unwrap();
            assert_eq!(buf.capacity(), 32);
            assert!(buf.is_empty());
            taken.push(buf);
        }
        assert!(pool.try_acquire().is_none());
    }

    #[tokio::test]
    async fn acquire_waits_for_recycled_buffer() {
        let mut pool = BufferPool::new(1, 8);
        let buf = pool.acquire().await.unwrap();

        let blocked = tokio::time::timeout(Duration::from_millis(50), pool.acquire()).await;
        assert!(blocked.is_err(), "acquire should wait while the only buffer is out");

        let recycler = pool.recycler();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            recycler.give_back(buf).await.unwrap();
        });
        let again = tokio::time::timeout(Duration::from_secs(2), pool.acquire())
            .await
            .expect("recycled buffer should arrive")
            .unwrap();
        assert_eq!(again.capacity(), 8);
    }

    #[tokio::test]
    async fn release_parks_undispatched_buffer() {
        let mut pool = BufferPool::new(2, 8);
        let a = pool.acquire().await.unwrap();
        let b = pool.acquire().await.unwrap();
        pool.release(a);
        assert!(pool.try_acquire().is_some());
        pool.release(b);
        assert!(pool.try_acquire().is_some());
        assert!(pool.try_acquire().is_none());
    }
}

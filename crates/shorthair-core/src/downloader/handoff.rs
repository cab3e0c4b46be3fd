//! Round-robin handoff of filled buffers to a range's writers.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::buffer::Buffer;
use crate::error::FetchError;
use crate::worker::{Worker, WorkerStatus};

struct Slot {
    queue: mpsc::Sender<Buffer>,
    writer: Arc<dyn Worker>,
}

/// Sending ends of every writer queue of one range.
pub(crate) struct Handoff {
    slots: Vec<Slot>,
    last: usize,
}

impl Handoff {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            last: 0,
        }
    }

    pub(crate) fn push(&mut self, queue: mpsc::Sender<Buffer>, writer: Arc<dyn Worker>) {
        self.slots.push(Slot { queue, writer });
        // Start the rotation at slot 0.
        self.last = self.slots.len() - 1;
    }

    /// First idle writer after the last one used; if all are busy, the next
    /// one in rotation anyway.
    fn pick(&mut self) -> usize {
        let n = self.slots.len();
        let next = (self.last + 1) % n;
        let chosen = (0..n)
            .map(|k| (next + k) % n)
            .find(|&i| self.slots[i].writer.status() == WorkerStatus::Idle)
            .unwrap_or(next);
        self.last = chosen;
        chosen
    }

    /// Queues `buf` on the chosen writer. Waits while that queue is full.
    pub(crate) async fn send(&mut self, buf: Buffer) -> Result<(), FetchError> {
        if self.slots.is_empty() {
            return Err(FetchError::QueueClosed);
        }
        let i = self.pick();
        self.slots[i]
            .queue
            .send(buf)
            .await
            .map_err(|_| FetchError::QueueClosed)
    }
}

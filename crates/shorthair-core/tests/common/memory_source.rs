//! In-memory `RangeSource` with per-range fault injection.

use std::collections::HashMap;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use shorthair_core::segmenter::ByteRange;
use shorthair_core::{FetchError, RangeBody, RangeSource};
use tokio_stream::{Stream, StreamExt};
use tokio_util::io::StreamReader;

type ChunkStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

#[derive(Debug, Clone, Copy)]
pub enum Fault {
    /// Fail with a connection reset after this many bytes of the range.
    ErrorAfter(usize),
    /// Deliver this many bytes, then never produce anything again.
    StallAfter(usize),
    /// Append this many `X` bytes to the range and declare the longer length.
    Oversized(usize),
}

/// Increments its counter when dropped.
struct DropCounter(Arc<AtomicUsize>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct MemorySource {
    data: Bytes,
    chunk: usize,
    ranges_supported: bool,
    /// Keyed by range start.
    faults: HashMap<u64, Fault>,
    opened: AtomicUsize,
    dropped: Arc<AtomicUsize>,
}

impl MemorySource {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data: Bytes::from(data),
            chunk: 7,
            ranges_supported: true,
            faults: HashMap::new(),
            opened: AtomicUsize::new(0),
            dropped: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Size of each chunk the stream yields.
    pub fn chunked(mut self, chunk: usize) -> Self {
        self.chunk = chunk.max(1);
        self
    }

    pub fn without_ranges(mut self) -> Self {
        self.ranges_supported = false;
        self
    }

    pub fn with_fault(mut self, range_start: u64, fault: Fault) -> Self {
        self.faults.insert(range_start, fault);
        self
    }

    /// Range streams opened so far.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Range streams dropped so far.
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }

    fn chunks(&self, bytes: Bytes) -> Vec<io::Result<Bytes>> {
        let mut out = Vec::new();
        let mut at = 0;
        while at < bytes.len() {
            let end = (at + self.chunk).min(bytes.len());
            out.push(Ok(bytes.slice(at..end)));
            at = end;
        }
        out
    }
}

#[async_trait]
impl RangeSource for MemorySource {
    async fn discover(&self, _url: &str) -> Result<u64, FetchError> {
        if !self.ranges_supported {
            return Err(FetchError::RangesUnsupported);
        }
        Ok(self.data.len() as u64)
    }

    async fn fetch_range(&self, _url: &str, range: ByteRange) -> Result<RangeBody, FetchError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let body = self.data.slice(range.start as usize..=range.end as usize);

        let mut declared = range.len();
        let stream: ChunkStream = match self.faults.get(&range.start) {
            None => Box::pin(tokio_stream::iter(self.chunks(body))),
            Some(Fault::Oversized(extra)) => {
                declared += *extra as u64;
                let mut padded = body.to_vec();
                padded.resize(body.len() + extra, b'X');
                Box::pin(tokio_stream::iter(self.chunks(Bytes::from(padded))))
            }
            Some(Fault::ErrorAfter(n)) => {
                let head = body.slice(..(*n).min(body.len()));
                let reset = io::Error::new(io::ErrorKind::ConnectionReset, "injected reset");
                Box::pin(
                    tokio_stream::iter(self.chunks(head)).chain(tokio_stream::once(Err(reset))),
                )
            }
            Some(Fault::StallAfter(n)) => {
                let head = body.slice(..(*n).min(body.len()));
                Box::pin(tokio_stream::iter(self.chunks(head)).chain(tokio_stream::pending()))
            }
        };

        let guard = DropCounter(Arc::clone(&self.dropped));
        let stream: ChunkStream = Box::pin(stream.map(move |item| {
            let _keep = &guard;
            item
        }));
        Ok(RangeBody::new(Box::new(StreamReader::new(stream)), declared))
    }
}

//! Where range bytes come from.
//!
//! The engine only needs two things from a remote resource: its total size
//! (after confirming it serves byte ranges) and a readable stream for one
//! inclusive range. [`HttpSource`] does both over libcurl; tests plug in
//! in-memory sources through the same trait.

mod http;
mod stream;

pub use http::{HttpOptions, HttpSource};

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::error::FetchError;
use crate::segmenter::ByteRange;

/// Byte stream of one range body.
pub type BodyReader = Box<dyn AsyncRead + Send + Unpin>;

/// An open range: the stream plus how many bytes the server said it will send.
pub struct RangeBody {
    pub reader: BodyReader,
    pub declared_len: u64,
}

impl RangeBody {
    pub fn new(reader: BodyReader, declared_len: u64) -> Self {
        Self {
            reader,
            declared_len,
        }
    }
}

impl std::fmt::Debug for RangeBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RangeBody")
            .field("declared_len", &self.declared_len)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait RangeSource: Send + Sync {
    /// Total size in bytes. Fails with [`FetchError::RangesUnsupported`] or
    /// [`FetchError::MissingLength`] when the resource cannot be segmented.
    async fn discover(&self, url: &str) -> Result<u64, FetchError>;

    /// Opens `range` (inclusive on both ends).
    async fn fetch_range(&self, url: &str, range: ByteRange) -> Result<RangeBody, FetchError>;
}

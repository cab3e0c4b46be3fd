//! Transfer buffers and their recycling pool.
//!
//! A [`Buffer`] is the unit moved from a range's read loop to a writer. It is
//! owned by exactly one party at a time and travels by channel handoff:
//! pool → reader (fill) → writer queue → writer (write) → pool.

mod pool;

pub use pool::{BufferPool, Recycler};

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::FetchError;
use crate::storage::OutputFile;

/// Fixed-capacity bytes plus the logical length filled and the absolute file
/// offset they belong at.
#[derive(Debug)]
pub struct Buffer {
    data: Box<[u8]>,
    len: usize,
    offset: u64,
}

impl Buffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            len: 0,
            offset: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: u64) {
        self.offset = offset;
    }

    /// The filled prefix.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Reads from `reader` until the buffer is full or the stream ends, and
    /// records how much was read. A short fill is valid; 0 means end of stream.
    pub async fn fill_from<R>(&mut self, reader: &mut R) -> std::io::Result<usize>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let mut filled = 0;
        while filled < self.data.len() {
            let n = reader.read(&mut self.data[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        self.len = filled;
        Ok(filled)
    }

    /// Positioned write of exactly `len()` bytes at `offset()`. Anything less
    /// is a [`FetchError::ShortWrite`].
    pub fn write_to(&self, file: &OutputFile) -> Result<usize, FetchError> {
        let written = file.write_at(self.offset, self.as_slice())?;
        if written != self.len {
            return Err(FetchError::ShortWrite {
                offset: self.offset,
                expected: self.len,
                written,
            });
        }
        Ok(written)
    }
}

//! Byte range type and range planning.

use std::fmt;

/// One connection's share of the file: bytes `start..=end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte (inclusive).
    pub start: u64,
    /// Last byte (inclusive).
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered. Never zero.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Formats as `start-end`, the form curl's `range` option takes.
impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Splits `[0, total_size)` into `count` contiguous ranges.
///
/// Every range gets `total_size / count` bytes and the last one also takes the
/// remainder. When `total_size < count` only `total_size` one-byte ranges are
/// produced, so no range is ever empty. Returns an empty vec if either
/// argument is 0.
pub fn plan_ranges(total_size: u64, count: usize) -> Vec<ByteRange> {
    if total_size == 0 || count == 0 {
        return Vec::new();
    }

    let count = (count as u64).min(total_size);
    let base = total_size / count;

    let mut out = Vec::with_capacity(count as usize);
    let mut start = 0u64;
    for i in 0..count {
        let end = if i == count - 1 {
            total_size
        } else {
            start + base
        };
        out.push(ByteRange { start, end: end - 1 });
        start = end;
    }

    out
}

//! Range math: splits a download into one contiguous byte range per connection.

mod range;

pub use range::{plan_ranges, ByteRange};

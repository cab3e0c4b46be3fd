//! Output file lifecycle.
//!
//! Creates (or truncates) the destination once, preallocates it to the full
//! size (fallocate on Linux when available, else set_len), and hands out a
//! cloneable handle for concurrent positioned writes (pwrite).

mod builder;
mod writer;

pub use builder::OutputFileBuilder;
pub use writer::OutputFile;

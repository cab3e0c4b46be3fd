//! Logging init: file under XDG state dir, or graceful fallback to stderr.
//!
//! Engine events are emitted inside two spans so a log line can be traced
//! back to its download and byte range without repeating that context in
//! every event:
//!
//! - `download{url, total}` around [`crate::Fetcher::start`]
//! - `range{index, start, end}` around each range worker's run
//!
//! Writer events carry a `writer` field naming the range they belong to,
//! since writers run on their own tasks outside the range span.

use anyhow::Result;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::Span;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use crate::segmenter::ByteRange;

const DEFAULT_FILTER: &str = "info,shorthair=debug,shorthair_core=debug";

/// Writer that is either a file or stderr (used when file clone fails).
enum FileOrStderr {
    File(std::fs::File),
    Stderr,
}

impl io::Write for FileOrStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            FileOrStderr::File(f) => f.write(buf),
            FileOrStderr::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            FileOrStderr::File(f) => f.flush(),
            FileOrStderr::Stderr => io::stderr().lock().flush(),
        }
    }
}

/// Initialize structured logging to `~/.local/state/shorthair/shorthair.log`.
/// On failure (e.g. log dir unwritable), returns Err so the caller can fall back to stderr.
pub fn init_logging() -> Result<()> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("shorthair")?;
    let log_dir = xdg_dirs.get_state_home().join("shorthair");

    fs::create_dir_all(&log_dir)?;
    let log_file_path: PathBuf = log_dir.join("shorthair.log");

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;

    struct FileMakeWriter(std::fs::File);

    impl<'a> MakeWriter<'a> for FileMakeWriter {
        type Writer = FileOrStderr;

        fn make_writer(&'a self) -> Self::Writer {
            self.0
                .try_clone()
                .map(FileOrStderr::File)
                .unwrap_or(FileOrStderr::Stderr)
        }
    }

    let writer: BoxMakeWriter = BoxMakeWriter::new(FileMakeWriter(file));

    let env_filter = default_filter();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    tracing::info!("shorthair logging initialized at {}", log_file_path.display());

    Ok(())
}

/// `RUST_LOG` if set, else info everywhere and debug for our own crates.
fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize logging to stderr only (no file). Use when init_logging() fails
/// so the CLI doesn't crash.
pub fn init_logging_stderr() {
    let env_filter = default_filter();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

/// Span for one whole download.
pub fn download_span(url: &str, total: u64) -> Span {
    tracing::info_span!("download", url = %url, total)
}

/// Span for one range worker.
pub fn range_span(index: usize, range: ByteRange) -> Span {
    tracing::debug_span!("range", index, start = range.start, end = range.end)
}

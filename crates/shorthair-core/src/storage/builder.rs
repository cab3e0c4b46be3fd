//! Builder for creating and preallocating the output file.

use std::fs::File;
use std::path::{Path, PathBuf};

use super::writer::OutputFile;
use crate::error::FetchError;
#[cfg(unix)]
use std::os::unix::io::AsRawFd;

/// Builder for a new output file. Call `preallocate` then `build` to get an
/// `OutputFile` that supports concurrent `write_at` from many writers.
pub struct OutputFileBuilder {
    file: File,
    path: PathBuf,
}

impl OutputFileBuilder {
    /// Create the file at `path` for read/write. Truncates if it already exists.
    pub fn create(path: &Path) -> Result<Self, FetchError> {
        let file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| FetchError::output(path, e))?;
        Ok(OutputFileBuilder {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Preallocate `size` bytes. On Unix tries `posix_fallocate` for real block
    /// allocation; falls back to `set_len` on failure or non-Unix.
    pub fn preallocate(&mut self, size: u64) -> Result<(), FetchError> {
        if size == 0 {
            return Ok(());
        }
        #[cfg(unix)]
        {
            let fd = self.file.as_raw_fd();
            let r = unsafe { libc::posix_fallocate(fd, 0, size as libc::off_t) };
            if r == 0 {
                return Ok(());
            }
            tracing::debug!(errno = r, "posix_fallocate failed, falling back to set_len");
        }
        self.file
            .set_len(size)
            .map_err(|e| FetchError::output(&self.path, e))
    }

    pub fn build(self) -> OutputFile {
        OutputFile::from_file_and_path(self.file, self.path)
    }
}

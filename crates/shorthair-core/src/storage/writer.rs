//! Shared handle for positioned writes into the output file.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::FetchError;

/// The one open output file. Cloning shares the descriptor; every `write_at`
/// is an independent positioned write, so writers targeting disjoint regions
/// need no coordination.
#[derive(Clone, Debug)]
pub struct OutputFile {
    file: Arc<File>,
    path: PathBuf,
}

impl OutputFile {
    pub(crate) fn from_file_and_path(file: File, path: PathBuf) -> Self {
        Self {
            file: Arc::new(file),
            path,
        }
    }

    /// Opens an existing file without write access, so every write fails.
    #[cfg(test)]
    pub(crate) fn open_read_only(path: &Path) -> Result<Self, FetchError> {
        let file = File::open(path).map_err(|e| FetchError::output(path, e))?;
        Ok(Self::from_file_and_path(file, path.to_path_buf()))
    }

    /// Single positioned write of `data` at `offset`. Returns the byte count the
    /// OS accepted, which may be short; callers decide whether that is fatal.
    #[cfg(unix)]
    pub fn write_at(&self, offset: u64, data: &[u8]) -> io::Result<usize> {
        use std::os::unix::fs::FileExt;
        self.file.write_at(data, offset)
    }

    #[cfg(windows)]
    pub fn write_at(&self, offset: u64, data: &[u8]) -> io::Result<usize> {
        use std::os::windows::fs::FileExt;
        self.file.seek_write(data, offset)
    }

    /// Sync file data and metadata to disk.
    pub fn sync(&self) -> Result<(), FetchError> {
        self.file
            .sync_all()
            .map_err(|e| FetchError::output(&self.path, e))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

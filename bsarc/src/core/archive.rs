//! The reader trait every container format implements.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::core::error::Result;

/// One file record inside a container, in the archive's enumeration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Path inside the archive, separators as stored (usually `\`).
    pub full_path: String,
    pub unpacked_size: u64,
    pub packed_size: u64,
}

/// An opened container. Entries are parsed once at open time and never reordered.
pub trait ArchiveReader: Send {
    fn path(&self) -> &Path;

    fn entries(&self) -> &[ArchiveEntry];

    /// Modification time of the container file itself.
    fn last_write_time(&self) -> SystemTime;

    /// Stream the decoded bytes of entry `index` into `writer`, returning the byte count.
    fn extract_to(&mut self, index: usize, writer: &mut dyn Write) -> Result<u64>;

    /// Write entry `index` to `dir/file_name`, creating `dir` and replacing any existing file.
    fn extract(&mut self, index: usize, dir: &Path, file_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let target = dir.join(file_name);

        let mut out = BufWriter::new(File::create(&target)?);
        self.extract_to(index, &mut out)?;
        out.flush()?;

        Ok(target)
    }

    /// Release the underlying file handle. Further extraction fails with `ArchiveError::Closed`.
    fn close(&mut self);
}

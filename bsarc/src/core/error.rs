//! Error type for archive parsing and extraction.

use thiserror::Error;

use crate::core::format::FormatKind;

/// Failures raised while opening or reading a Bethesda archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid {format} signature {found:02X?}")]
    InvalidMagic { format: FormatKind, found: [u8; 4] },

    #[error("unsupported {format} version {version}")]
    UnsupportedVersion { format: FormatKind, version: u32 },

    #[error("unsupported archive layout: {0}")]
    UnsupportedLayout(String),

    #[error("corrupt archive: {0}")]
    Corrupt(String),

    #[error("entry index {index} out of range ({count} entries)")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("decompression failed: {0}")]
    Decompress(String),

    #[error("archive has been closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, ArchiveError>;

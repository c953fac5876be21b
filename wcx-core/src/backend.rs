//! Seam between sessions and the archive readers.

use std::path::Path;

use bsarc::{ArchiveReader, FormatKind};

/// Recognizes and opens containers for a session.
pub trait ArchiveOpener: Send + Sync {
    /// Format for `path`, or `None` when this plugin does not handle it.
    fn probe(&self, path: &Path) -> Option<FormatKind>;

    fn open(&self, kind: FormatKind, path: &Path) -> bsarc::Result<Box<dyn ArchiveReader>>;
}

/// The `.ba2` / `.bsa` readers from `bsarc`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BethesdaOpener;

impl ArchiveOpener for BethesdaOpener {
    fn probe(&self, path: &Path) -> Option<FormatKind> {
        bsarc::probe(path)
    }

    fn open(&self, kind: FormatKind, path: &Path) -> bsarc::Result<Box<dyn ArchiveReader>> {
        bsarc::open(kind, path)
    }
}

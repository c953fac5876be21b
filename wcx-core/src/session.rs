//! One open archive and its header cursor.

use std::path::Path;

use bsarc::ArchiveReader;
use chrono::NaiveDateTime;
use log::{debug, trace};

use crate::backend::ArchiveOpener;
use crate::codec::{encode_timestamp, local_time};
use crate::error::{Result, WcxError};
use crate::wcxhead::PK_OM_EXTRACT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    List,
    Extract,
}

impl OpenMode {
    /// `PK_OM_EXTRACT` opens for extraction; every other value lists.
    pub fn from_raw(raw: i32) -> Self {
        if raw == PK_OM_EXTRACT {
            OpenMode::Extract
        } else {
            OpenMode::List
        }
    }
}

/// What one `ReadHeader` call reports about an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRecord {
    pub full_path: String,
    /// Modification time of the container, in local time. Entries carry none of their own.
    pub last_write: NaiveDateTime,
    pub unpacked_size: u64,
    pub packed_size: u64,
}

impl HeaderRecord {
    pub fn packed_time(&self) -> u32 {
        encode_timestamp(&self.last_write)
    }
}

pub struct ArchiveSession {
    reader: Box<dyn ArchiveReader>,
    last_write: NaiveDateTime,
    /// Entry the next `read_header` returns.
    next_index: usize,
    extracting: bool,
}

impl ArchiveSession {
    pub fn open(opener: &dyn ArchiveOpener, path: &Path, mode: OpenMode) -> Result<Self> {
        let kind = opener
            .probe(path)
            .ok_or_else(|| WcxError::Unsupported(format!("unrecognized archive {}", path.display())))?;

        let reader = opener
            .open(kind, path)
            .map_err(|e| WcxError::BadData(format!("cannot open {} as {}: {}", path.display(), kind, e)))?;

        debug!(
            "Opened {} ({}, {} entries, {:?})",
            path.display(),
            kind,
            reader.entries().len(),
            mode
        );

        Ok(ArchiveSession {
            last_write: local_time(reader.last_write_time()),
            reader,
            next_index: 0,
            extracting: mode == OpenMode::Extract,
        })
    }

    pub fn entry_count(&self) -> usize {
        self.reader.entries().len()
    }

    pub fn is_extracting(&self) -> bool {
        self.extracting
    }

    /// Report the entry under the cursor and step past it.
    pub fn read_header(&mut self) -> Result<HeaderRecord> {
        let Some(entry) = self.reader.entries().get(self.next_index) else {
            trace!("End of archive after {} entries", self.next_index);
            return Err(WcxError::EndOfArchive);
        };

        let record = HeaderRecord {
            full_path: entry.full_path.clone(),
            last_write: self.last_write,
            unpacked_size: entry.unpacked_size,
            packed_size: entry.packed_size,
        };
        self.next_index += 1;
        Ok(record)
    }

    /// Index of the entry most recently returned by `read_header`.
    pub fn current_index(&self) -> Option<usize> {
        self.next_index.checked_sub(1)
    }

    pub fn reader_mut(&mut self) -> &mut dyn ArchiveReader {
        self.reader.as_mut()
    }

    pub fn close(&mut self) {
        self.reader.close();
        debug!("Released {}", self.reader.path().display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeOpener;

    #[test]
    fn open_rejects_unknown_extensions() {
        let opener = FakeOpener::with_entries(&[("a.txt", 1, 1)]);
        let result = ArchiveSession::open(&opener, Path::new("unknown.zip"), OpenMode::List);
        assert!(matches!(result, Err(WcxError::Unsupported(_))));
        assert_eq!(opener.open_count(), 0);
    }

    #[test]
    fn backend_failures_are_bad_data() {
        let opener = FakeOpener::failing();
        let result = ArchiveSession::open(&opener, Path::new("broken.bsa"), OpenMode::List);
        assert!(matches!(result, Err(WcxError::BadData(_))));
    }

    #[test]
    fn headers_come_in_order_then_end_repeatedly() {
        let opener = FakeOpener::with_entries(&[("a", 10, 5), ("b\\c", 20, 20), ("d", 0, 0)]);
        let mut session = ArchiveSession::open(&opener, Path::new("x.ba2"), OpenMode::List).unwrap();
        assert_eq!(session.entry_count(), 3);
        assert!(!session.is_extracting());
        assert_eq!(session.current_index(), None);

        let names: Vec<_> = (0..3).map(|_| session.read_header().unwrap().full_path).collect();
        assert_eq!(names, ["a", "b\\c", "d"]);
        assert_eq!(session.current_index(), Some(2));

        for _ in 0..3 {
            assert!(matches!(session.read_header(), Err(WcxError::EndOfArchive)));
        }
        assert_eq!(session.current_index(), Some(2));
    }

    #[test]
    fn records_carry_sizes_and_container_time() {
        let opener = FakeOpener::with_entries(&[("textures/a.dds", 100, 40)]);
        let mut session = ArchiveSession::open(&opener, Path::new("archive.ba2"), OpenMode::Extract).unwrap();
        assert!(session.is_extracting());

        let record = session.read_header().unwrap();
        assert_eq!(record.unpacked_size, 100);
        assert_eq!(record.packed_size, 40);
        assert_eq!(record.last_write, local_time(FakeOpener::modified()));
    }

    #[test]
    fn raw_open_modes() {
        assert_eq!(OpenMode::from_raw(0), OpenMode::List);
        assert_eq!(OpenMode::from_raw(1), OpenMode::Extract);
        assert_eq!(OpenMode::from_raw(7), OpenMode::List);
    }
}

//! In-memory backend for unit tests.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use bsarc::{ArchiveEntry, ArchiveError, ArchiveReader, FormatKind};
use parking_lot::Mutex;

use crate::backend::ArchiveOpener;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub index: usize,
    pub dir: PathBuf,
    pub file_name: String,
}

#[derive(Default)]
struct Shared {
    extractions: Mutex<Vec<Extraction>>,
    opens: AtomicUsize,
    closes: AtomicUsize,
}

pub struct FakeReader {
    path: PathBuf,
    entries: Vec<ArchiveEntry>,
    shared: Arc<Shared>,
    closed: bool,
}

impl ArchiveReader for FakeReader {
    fn path(&self) -> &Path {
        &self.path
    }

    fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    fn last_write_time(&self) -> SystemTime {
        FakeOpener::modified()
    }

    fn extract_to(&mut self, index: usize, writer: &mut dyn Write) -> bsarc::Result<u64> {
        if self.closed {
            return Err(ArchiveError::Closed);
        }
        let entry = self.entries.get(index).ok_or(ArchiveError::IndexOutOfRange {
            index,
            count: self.entries.len(),
        })?;
        writer.write_all(entry.full_path.as_bytes())?;
        Ok(entry.full_path.len() as u64)
    }

    fn extract(&mut self, index: usize, dir: &Path, file_name: &str) -> bsarc::Result<PathBuf> {
        if index >= self.entries.len() {
            return Err(ArchiveError::IndexOutOfRange {
                index,
                count: self.entries.len(),
            });
        }
        self.shared.extractions.lock().push(Extraction {
            index,
            dir: dir.to_path_buf(),
            file_name: file_name.to_string(),
        });
        Ok(dir.join(file_name))
    }

    fn close(&mut self) {
        self.closed = true;
        self.shared.closes.fetch_add(1, Ordering::Relaxed);
    }
}

/// Opens every recognized path as the same fixed entry list and records extraction calls.
pub struct FakeOpener {
    entries: Vec<ArchiveEntry>,
    fail: bool,
    shared: Arc<Shared>,
}

impl FakeOpener {
    pub fn modified() -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)
    }

    pub fn with_entries(entries: &[(&str, u64, u64)]) -> Self {
        FakeOpener {
            entries: entries
                .iter()
                .map(|&(path, unpacked_size, packed_size)| ArchiveEntry {
                    full_path: path.to_string(),
                    unpacked_size,
                    packed_size,
                })
                .collect(),
            fail: false,
            shared: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        FakeOpener {
            fail: true,
            ..Self::with_entries(&[])
        }
    }

    pub fn extractions(&self) -> Vec<Extraction> {
        self.shared.extractions.lock().clone()
    }

    pub fn open_count(&self) -> usize {
        self.shared.opens.load(Ordering::Relaxed)
    }

    pub fn close_count(&self) -> usize {
        self.shared.closes.load(Ordering::Relaxed)
    }

    pub fn share(&self) -> Self {
        FakeOpener {
            entries: self.entries.clone(),
            fail: self.fail,
            shared: Arc::clone(&self.shared),
        }
    }
}

impl ArchiveOpener for FakeOpener {
    fn probe(&self, path: &Path) -> Option<FormatKind> {
        bsarc::probe(path)
    }

    fn open(&self, _kind: FormatKind, path: &Path) -> bsarc::Result<Box<dyn ArchiveReader>> {
        if self.fail {
            return Err(ArchiveError::Corrupt("fake failure".to_string()));
        }
        self.shared.opens.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(FakeReader {
            path: path.to_path_buf(),
            entries: self.entries.clone(),
            shared: Arc::clone(&self.shared),
            closed: false,
        }))
    }
}

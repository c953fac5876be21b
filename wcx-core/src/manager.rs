//! Handle-level protocol: what each plugin entry point does once its
//! arguments are decoded.

use std::path::Path;

use bsarc::FormatKind;
use log::debug;

use crate::backend::{ArchiveOpener, BethesdaOpener};
use crate::dispatch::{dispatch, Operation};
use crate::error::Result;
use crate::registry::{Handle, HandleRegistry};
use crate::session::{ArchiveSession, HeaderRecord, OpenMode};

pub struct ArchiveManager {
    opener: Box<dyn ArchiveOpener>,
    sessions: HandleRegistry<ArchiveSession>,
}

impl ArchiveManager {
    pub fn new() -> Self {
        Self::with_opener(BethesdaOpener)
    }

    pub fn with_opener(opener: impl ArchiveOpener + 'static) -> Self {
        ArchiveManager {
            opener: Box::new(opener),
            sessions: HandleRegistry::new(),
        }
    }

    pub fn probe(&self, path: &Path) -> Option<FormatKind> {
        self.opener.probe(path)
    }

    pub fn open(&self, path: &Path, mode: OpenMode) -> Result<Handle> {
        let session = ArchiveSession::open(self.opener.as_ref(), path, mode)?;
        let handle = self.sessions.allocate(session);
        debug!("Handle {:#x} -> {}", handle, path.display());
        Ok(handle)
    }

    /// Number of entries in the archive behind `handle`.
    pub fn entry_count(&self, handle: Handle) -> Result<usize> {
        Ok(self.sessions.resolve(handle)?.lock().entry_count())
    }

    pub fn read_header(&self, handle: Handle) -> Result<HeaderRecord> {
        let session = self.sessions.resolve(handle)?;
        let mut session = session.lock();
        session.read_header()
    }

    pub fn process_file(
        &self,
        handle: Handle,
        operation: Operation,
        dest_path: Option<&str>,
        dest_name: Option<&str>,
    ) -> Result<()> {
        let session = self.sessions.resolve(handle)?;
        let mut session = session.lock();
        dispatch(&mut session, operation, dest_path, dest_name)
    }

    /// Invalidate the handle, then release the backend's file.
    pub fn close(&self, handle: Handle) -> Result<()> {
        let session = self.sessions.release(handle)?;
        session.lock().close();
        debug!("Closed handle {:#x}, {} still open", handle, self.open_sessions());
        Ok(())
    }

    pub fn open_sessions(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for ArchiveManager {
    fn default() -> Self {
        Self::new()
    }
}

//! `ProcessFile` operations against the entry most recently read.

use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::{Result, WcxError};
use crate::session::ArchiveSession;
use crate::wcxhead::{PK_EXTRACT, PK_SKIP, PK_TEST};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Skip,
    Test,
    Extract,
    Other(i32),
}

impl From<i32> for Operation {
    fn from(raw: i32) -> Self {
        match raw {
            PK_SKIP => Operation::Skip,
            PK_TEST => Operation::Test,
            PK_EXTRACT => Operation::Extract,
            other => Operation::Other(other),
        }
    }
}

/// Target of one extraction, split the way the backend takes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub dir: PathBuf,
    pub file_name: String,
}

impl Destination {
    /// `dest_name` alone when `dest_path` is missing or empty, otherwise the two joined.
    pub fn resolve(dest_path: Option<&str>, dest_name: &str) -> Result<Self> {
        let full = match dest_path {
            Some(dir) if !dir.is_empty() => Path::new(dir).join(dest_name),
            _ => PathBuf::from(dest_name),
        };

        let file_name = full
            .file_name()
            .ok_or_else(|| WcxError::BadData(format!("destination {} has no file name", full.display())))?
            .to_string_lossy()
            .into_owned();
        let dir = full.parent().map(Path::to_path_buf).unwrap_or_default();

        Ok(Destination { dir, file_name })
    }
}

pub fn dispatch(
    session: &mut ArchiveSession,
    operation: Operation,
    dest_path: Option<&str>,
    dest_name: Option<&str>,
) -> Result<()> {
    match operation {
        Operation::Skip => Ok(()),
        Operation::Test => Err(WcxError::Unsupported("archive testing".to_string())),
        Operation::Extract => {
            let dest_name =
                dest_name.ok_or_else(|| WcxError::Unsupported("extraction without a destination name".to_string()))?;
            let destination = Destination::resolve(dest_path, dest_name)?;

            let index = session
                .current_index()
                .ok_or_else(|| WcxError::BadData("extract requested before any header was read".to_string()))?;
            if !session.is_extracting() {
                debug!("Extracting entry {} from an archive opened for listing", index);
            }

            let written = session
                .reader_mut()
                .extract(index, &destination.dir, &destination.file_name)?;
            info!("Extracted entry {} to {}", index, written.display());
            Ok(())
        }
        Operation::Other(raw) => Err(WcxError::Unsupported(format!("operation {}", raw))),
    }
}

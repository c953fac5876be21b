//! Protocol errors and the host return code each one maps to.

use std::io;

use log::Level;
use thiserror::Error;

use crate::wcxhead::{E_BAD_DATA, E_END_ARCHIVE, E_NOT_SUPPORTED};

/// Everything a protocol call can fail with. Each variant collapses to one host code.
#[derive(Debug, Error)]
pub enum WcxError {
    #[error("not supported: {0}")]
    Unsupported(String),

    #[error("end of archive")]
    EndOfArchive,

    #[error("bad data: {0}")]
    BadData(String),

    #[error("invalid handle {0:#x}")]
    InvalidHandle(usize),

    #[error(transparent)]
    Archive(#[from] bsarc::ArchiveError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl WcxError {
    /// Host error code returned across the plugin boundary.
    pub fn code(&self) -> i32 {
        match self {
            WcxError::Unsupported(_) => E_NOT_SUPPORTED,
            WcxError::EndOfArchive => E_END_ARCHIVE,
            _ => E_BAD_DATA,
        }
    }

    /// Level at which the boundary reports this failure.
    pub fn severity(&self) -> Level {
        match self {
            WcxError::EndOfArchive => Level::Trace,
            WcxError::Unsupported(_) => Level::Warn,
            _ => Level::Error,
        }
    }
}

pub type Result<T> = std::result::Result<T, WcxError>;

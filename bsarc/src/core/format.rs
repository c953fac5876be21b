//! Container detection and reader construction.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::debug;

use crate::core::archive::ArchiveReader;
use crate::core::error::Result;
use crate::formats::ba2::{Ba2Reader, BA2_MAGIC};
use crate::formats::bsa::{BsaReader, BSA_MAGIC};

/// Container formats this crate can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    /// Fallout 4 / Starfield `BTDX` archives.
    Ba2,
    /// Oblivion through Skyrim SE `BSA\0` archives.
    Bsa,
}

impl FormatKind {
    pub const ALL: [FormatKind; 2] = [FormatKind::Ba2, FormatKind::Bsa];

    pub fn extension(self) -> &'static str {
        match self {
            FormatKind::Ba2 => "ba2",
            FormatKind::Bsa => "bsa",
        }
    }

    pub fn magic(self) -> [u8; 4] {
        match self {
            FormatKind::Ba2 => BA2_MAGIC,
            FormatKind::Bsa => BSA_MAGIC,
        }
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatKind::Ba2 => f.write_str("BA2"),
            FormatKind::Bsa => f.write_str("BSA"),
        }
    }
}

/// Recognize a container by its file extension, ignoring case.
pub fn probe(path: &Path) -> Option<FormatKind> {
    let ext = path.extension()?.to_str()?;
    FormatKind::ALL
        .into_iter()
        .find(|kind| ext.eq_ignore_ascii_case(kind.extension()))
}

/// Recognize a container by its leading signature bytes.
pub fn sniff(path: &Path) -> Result<Option<FormatKind>> {
    let mut file = File::open(path)?;
    let mut header = [0u8; 4];

    let mut filled = 0;
    while filled < header.len() {
        let n = file.read(&mut header[filled..])?;
        if n == 0 {
            return Ok(None);
        }
        filled += n;
    }

    Ok(FormatKind::ALL.into_iter().find(|kind| kind.magic() == header))
}

/// Open `path` with the reader for `kind`.
pub fn open(kind: FormatKind, path: &Path) -> Result<Box<dyn ArchiveReader>> {
    debug!("Opening {} archive {}", kind, path.display());

    let modified = std::fs::metadata(path)?.modified()?;
    let reader = BufReader::new(File::open(path)?);

    match kind {
        FormatKind::Ba2 => Ok(Box::new(Ba2Reader::new(reader, path, modified)?)),
        FormatKind::Bsa => Ok(Box::new(BsaReader::new(reader, path, modified)?)),
    }
}

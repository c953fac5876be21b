//! Read-only access to Bethesda `.ba2` and `.bsa` containers.
//!
//! Both formats are parsed into an ordered entry list at open time; payloads
//! are decoded on demand by [`ArchiveReader::extract_to`].

pub mod codecs;
pub mod core;
pub mod formats;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use crate::core::archive::{ArchiveEntry, ArchiveReader};
pub use crate::core::error::{ArchiveError, Result};
pub use crate::core::format::{open, probe, sniff, FormatKind};

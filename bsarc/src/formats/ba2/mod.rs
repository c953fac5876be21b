//! Fallout 4 / Starfield `BTDX` archives.

pub mod dds;
pub mod header;
pub mod reader;

pub use header::{Ba2Compression, Ba2Header, Ba2Kind};
pub use reader::Ba2Reader;

pub const BA2_MAGIC: [u8; 4] = *b"BTDX";
pub const GENERAL_TAG: [u8; 4] = *b"GNRL";
pub const TEXTURE_TAG: [u8; 4] = *b"DX10";
pub const GNM_TAG: [u8; 4] = *b"GNMF";

/// Bytes per general file record.
pub const GENERAL_RECORD_LEN: u64 = 36;
/// Bytes per texture record before its chunk table.
pub const TEXTURE_RECORD_MIN_LEN: u64 = 24;

/// Trailer written after every general record and texture chunk.
pub const RECORD_SENTINEL: u32 = 0xBAAD_F00D;

pub const SUPPORTED_VERSIONS: [u32; 5] = [1, 2, 3, 7, 8];

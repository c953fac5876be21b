//! Oblivion, Fallout 3/NV and Skyrim `BSA\0` archives.

pub mod header;
pub mod reader;

pub use header::{ArchiveFlags, BsaHeader};
pub use reader::BsaReader;

pub const BSA_MAGIC: [u8; 4] = *b"BSA\0";

pub const VERSION_OBLIVION: u32 = 103;
pub const VERSION_FALLOUT3: u32 = 104;
pub const VERSION_SKYRIM_SE: u32 = 105;

/// Hash, size and offset of one file.
pub const FILE_RECORD_LEN: u64 = 16;

/// File size bit that inverts the archive-wide compression default.
pub const SIZE_COMPRESSION_TOGGLE: u32 = 0x4000_0000;
pub const SIZE_MASK: u32 = 0x3FFF_FFFF;

use std::io::Read;

use crate::core::binary::{read_array, read_u32};
use crate::core::error::{ArchiveError, Result};
use crate::core::format::FormatKind;
use crate::formats::bsa::{BSA_MAGIC, VERSION_FALLOUT3, VERSION_OBLIVION, VERSION_SKYRIM_SE};

/// Archive-wide flags word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveFlags(pub u32);

impl ArchiveFlags {
    pub const DIRECTORY_NAMES: u32 = 0x1;
    pub const FILE_NAMES: u32 = 0x2;
    pub const COMPRESSED: u32 = 0x4;
    pub const EMBEDDED_NAMES: u32 = 0x100;

    pub fn has_directory_names(self) -> bool {
        self.0 & Self::DIRECTORY_NAMES != 0
    }

    pub fn has_file_names(self) -> bool {
        self.0 & Self::FILE_NAMES != 0
    }

    pub fn compressed_by_default(self) -> bool {
        self.0 & Self::COMPRESSED != 0
    }

    pub fn raw_embedded_names(self) -> bool {
        self.0 & Self::EMBEDDED_NAMES != 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BsaHeader {
    pub version: u32,
    pub folder_record_offset: u32,
    pub flags: ArchiveFlags,
    pub folder_count: u32,
    pub file_count: u32,
    pub total_folder_name_length: u32,
    pub total_file_name_length: u32,
    pub content_flags: u32,
}

impl BsaHeader {
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let magic: [u8; 4] = read_array(reader)?;
        if magic != BSA_MAGIC {
            return Err(ArchiveError::InvalidMagic { format: FormatKind::Bsa, found: magic });
        }

        let version = read_u32(reader)?;
        if !matches!(version, VERSION_OBLIVION | VERSION_FALLOUT3 | VERSION_SKYRIM_SE) {
            return Err(ArchiveError::UnsupportedVersion { format: FormatKind::Bsa, version });
        }

        Ok(BsaHeader {
            version,
            folder_record_offset: read_u32(reader)?,
            flags: ArchiveFlags(read_u32(reader)?),
            folder_count: read_u32(reader)?,
            file_count: read_u32(reader)?,
            total_folder_name_length: read_u32(reader)?,
            total_file_name_length: read_u32(reader)?,
            content_flags: read_u32(reader)?,
        })
    }

    /// Bit 0x100 means "names embedded in file data" only from v104 on.
    pub fn embeds_names(&self) -> bool {
        self.version != VERSION_OBLIVION && self.flags.raw_embedded_names()
    }

    pub fn uses_lz4(&self) -> bool {
        self.version == VERSION_SKYRIM_SE
    }

    pub fn folder_record_size(&self) -> u64 {
        if self.version == VERSION_SKYRIM_SE {
            24
        } else {
            16
        }
    }
}

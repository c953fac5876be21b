use std::io::Read;

use crate::core::binary::{read_array, read_u32, read_u64};
use crate::core::error::{ArchiveError, Result};
use crate::core::format::FormatKind;
use crate::formats::ba2::{BA2_MAGIC, GENERAL_TAG, GNM_TAG, SUPPORTED_VERSIONS, TEXTURE_TAG};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ba2Kind {
    General,
    Texture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ba2Compression {
    Zlib,
    Lz4Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ba2Header {
    pub version: u32,
    pub kind: Ba2Kind,
    pub file_count: u32,
    pub name_table_offset: u64,
    pub compression: Ba2Compression,
}

impl Ba2Header {
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let magic: [u8; 4] = read_array(reader)?;
        if magic != BA2_MAGIC {
            return Err(ArchiveError::InvalidMagic { format: FormatKind::Ba2, found: magic });
        }

        let version = read_u32(reader)?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(ArchiveError::UnsupportedVersion { format: FormatKind::Ba2, version });
        }

        let tag: [u8; 4] = read_array(reader)?;
        let kind = match tag {
            GENERAL_TAG => Ba2Kind::General,
            TEXTURE_TAG => Ba2Kind::Texture,
            GNM_TAG => {
                return Err(ArchiveError::UnsupportedLayout("GNMF (console texture) archives".to_string()))
            }
            other => {
                return Err(ArchiveError::UnsupportedLayout(format!(
                    "unknown BA2 type {:?}",
                    String::from_utf8_lossy(&other)
                )))
            }
        };

        let file_count = read_u32(reader)?;
        let name_table_offset = read_u64(reader)?;

        // Starfield headers carry two extra words, v3 also a compression method.
        let mut compression = Ba2Compression::Zlib;
        if version == 2 || version == 3 {
            let _unknown = read_u64(reader)?;
        }
        if version == 3 && read_u32(reader)? == 3 {
            compression = Ba2Compression::Lz4Block;
        }

        Ok(Ba2Header {
            version,
            kind,
            file_count,
            name_table_offset,
            compression,
        })
    }
}

use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::{debug, trace};

use crate::codecs::{lz4_block_decompress, zlib_decompress};
use crate::core::archive::{ArchiveEntry, ArchiveReader};
use crate::core::binary::{
    ensure_records_fit, read_array, read_bytes, read_u16, read_u32, read_u64, read_u8, read_wstring,
};
use crate::core::error::{ArchiveError, Result};
use crate::formats::ba2::dds::{self, TextureInfo, DDS_FILE_HEADER_LEN};
use crate::formats::ba2::header::{Ba2Compression, Ba2Header, Ba2Kind};
use crate::formats::ba2::{GENERAL_RECORD_LEN, RECORD_SENTINEL, TEXTURE_RECORD_MIN_LEN};

/// Location of one compressed or stored payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ba2Chunk {
    pub offset: u64,
    /// Zero when the payload is stored uncompressed.
    pub packed_size: u32,
    pub unpacked_size: u32,
}

impl Ba2Chunk {
    fn stored_size(&self) -> u64 {
        if self.packed_size == 0 {
            u64::from(self.unpacked_size)
        } else {
            u64::from(self.packed_size)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ba2Record {
    General(Ba2Chunk),
    Texture { info: TextureInfo, chunks: Vec<Ba2Chunk> },
}

pub struct Ba2Reader<R: Read + Seek> {
    reader: Option<R>,
    path: PathBuf,
    modified: SystemTime,
    pub header: Ba2Header,
    pub records: Vec<Ba2Record>,
    entries: Vec<ArchiveEntry>,
}

impl<R: Read + Seek> Ba2Reader<R> {
    pub fn new(mut reader: R, path: &Path, modified: SystemTime) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let header = Ba2Header::read(&mut reader)?;
        debug!(
            "BA2 v{} {:?}: {} files, names at {:#x}",
            header.version, header.kind, header.file_count, header.name_table_offset
        );

        let record_len = match header.kind {
            Ba2Kind::General => GENERAL_RECORD_LEN,
            Ba2Kind::Texture => TEXTURE_RECORD_MIN_LEN,
        };
        ensure_records_fit(&mut reader, u64::from(header.file_count), record_len, "file records")?;

        let mut records = Vec::new();
        for _ in 0..header.file_count {
            let record = match header.kind {
                Ba2Kind::General => Self::read_general_record(&mut reader)?,
                Ba2Kind::Texture => Self::read_texture_record(&mut reader)?,
            };
            records.push(record);
        }

        let names = Self::read_name_table(&mut reader, &header)?;

        let entries = records
            .iter()
            .zip(names)
            .map(|(record, full_path)| {
                let (unpacked_size, packed_size) = match record {
                    Ba2Record::General(chunk) => (u64::from(chunk.unpacked_size), chunk.stored_size()),
                    Ba2Record::Texture { chunks, .. } => (
                        DDS_FILE_HEADER_LEN + chunks.iter().map(|c| u64::from(c.unpacked_size)).sum::<u64>(),
                        chunks.iter().map(Ba2Chunk::stored_size).sum(),
                    ),
                };
                ArchiveEntry {
                    full_path,
                    unpacked_size,
                    packed_size,
                }
            })
            .collect();

        Ok(Ba2Reader {
            reader: Some(reader),
            path: path.to_path_buf(),
            modified,
            header,
            records,
            entries,
        })
    }

    fn read_general_record(reader: &mut R) -> Result<Ba2Record> {
        let _name_hash = read_u32(reader)?;
        let _extension: [u8; 4] = read_array(reader)?;
        let _dir_hash = read_u32(reader)?;
        let _flags = read_u32(reader)?;
        let offset = read_u64(reader)?;
        let packed_size = read_u32(reader)?;
        let unpacked_size = read_u32(reader)?;
        let sentinel = read_u32(reader)?;
        if sentinel != RECORD_SENTINEL {
            return Err(ArchiveError::Corrupt(format!(
                "general record sentinel {:#010x} at offset {:#x}",
                sentinel, offset
            )));
        }

        Ok(Ba2Record::General(Ba2Chunk {
            offset,
            packed_size,
            unpacked_size,
        }))
    }

    fn read_texture_record(reader: &mut R) -> Result<Ba2Record> {
        let _name_hash = read_u32(reader)?;
        let _extension: [u8; 4] = read_array(reader)?;
        let _dir_hash = read_u32(reader)?;
        let _unknown = read_u8(reader)?;
        let chunk_count = read_u8(reader)?;
        let _chunk_header_size = read_u16(reader)?;
        let height = read_u16(reader)?;
        let width = read_u16(reader)?;
        let mip_count = read_u8(reader)?;
        let dxgi_format = read_u8(reader)?;
        let flags = read_u8(reader)?;
        let _tile_mode = read_u8(reader)?;

        let mut chunks = Vec::new();
        for _ in 0..chunk_count {
            let offset = read_u64(reader)?;
            let packed_size = read_u32(reader)?;
            let unpacked_size = read_u32(reader)?;
            let _start_mip = read_u16(reader)?;
            let _end_mip = read_u16(reader)?;
            let sentinel = read_u32(reader)?;
            if sentinel != RECORD_SENTINEL {
                return Err(ArchiveError::Corrupt(format!(
                    "texture chunk sentinel {:#010x} at offset {:#x}",
                    sentinel, offset
                )));
            }
            chunks.push(Ba2Chunk {
                offset,
                packed_size,
                unpacked_size,
            });
        }

        Ok(Ba2Record::Texture {
            info: TextureInfo {
                width,
                height,
                mip_count,
                dxgi_format,
                cubemap: flags & 1 != 0,
            },
            chunks,
        })
    }

    fn read_name_table(reader: &mut R, header: &Ba2Header) -> Result<Vec<String>> {
        if header.name_table_offset == 0 {
            // Archives written without names still list, under their index.
            return Ok((0..header.file_count).map(|i| format!("{:08}", i)).collect());
        }

        reader.seek(SeekFrom::Start(header.name_table_offset))?;
        let mut names = Vec::new();
        for _ in 0..header.file_count {
            names.push(read_wstring(reader)?);
        }
        Ok(names)
    }

    fn read_chunk(reader: &mut R, chunk: &Ba2Chunk, compression: Ba2Compression) -> Result<Vec<u8>> {
        reader.seek(SeekFrom::Start(chunk.offset))?;

        if chunk.packed_size == 0 {
            return read_bytes(reader, u64::from(chunk.unpacked_size));
        }

        let packed = read_bytes(reader, u64::from(chunk.packed_size))?;
        match compression {
            Ba2Compression::Zlib => zlib_decompress(&packed, chunk.unpacked_size as usize),
            Ba2Compression::Lz4Block => lz4_block_decompress(&packed, chunk.unpacked_size as usize),
        }
    }
}

impl<R: Read + Seek + Send> ArchiveReader for Ba2Reader<R> {
    fn path(&self) -> &Path {
        &self.path
    }

    fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    fn last_write_time(&self) -> SystemTime {
        self.modified
    }

    fn extract_to(&mut self, index: usize, writer: &mut dyn Write) -> Result<u64> {
        let record = self.records.get(index).ok_or(ArchiveError::IndexOutOfRange {
            index,
            count: self.records.len(),
        })?;
        let reader = self.reader.as_mut().ok_or(ArchiveError::Closed)?;
        let compression = self.header.compression;

        trace!("Extracting BA2 entry {} ({})", index, self.entries[index].full_path);

        match record {
            Ba2Record::General(chunk) => {
                let data = Self::read_chunk(reader, chunk, compression)?;
                writer.write_all(&data)?;
                Ok(data.len() as u64)
            }
            Ba2Record::Texture { info, chunks } => {
                let header = dds::build_header(info);
                writer.write_all(&header)?;
                let mut written = header.len() as u64;

                for chunk in chunks {
                    let data = Self::read_chunk(reader, chunk, compression)?;
                    writer.write_all(&data)?;
                    written += data.len() as u64;
                }
                Ok(written)
            }
        }
    }

    fn close(&mut self) {
        if self.reader.take().is_some() {
            debug!("Closed BA2 archive {}", self.path.display());
        }
    }
}

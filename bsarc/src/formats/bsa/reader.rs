use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::{debug, trace};

use crate::codecs::{lz4_frame_decompress, zlib_decompress};
use crate::core::archive::{ArchiveEntry, ArchiveReader};
use crate::core::binary::{decode_name, ensure_records_fit, read_bytes, read_bzstring, read_u32, read_u64, read_u8};
use crate::core::error::{ArchiveError, Result};
use crate::formats::bsa::header::BsaHeader;
use crate::formats::bsa::{FILE_RECORD_LEN, SIZE_COMPRESSION_TOGGLE, SIZE_MASK};

/// Where an entry's payload lives once embedded names and size prefixes are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BsaFile {
    pub data_offset: u64,
    pub data_len: u64,
    pub compressed: bool,
    pub original_size: u64,
}

pub struct BsaReader<R: Read + Seek> {
    reader: Option<R>,
    path: PathBuf,
    modified: SystemTime,
    pub header: BsaHeader,
    pub files: Vec<BsaFile>,
    entries: Vec<ArchiveEntry>,
}

struct RawFileRecord {
    hash: u64,
    size: u32,
    offset: u32,
}

impl<R: Read + Seek> BsaReader<R> {
    pub fn new(mut reader: R, path: &Path, modified: SystemTime) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let header = BsaHeader::read(&mut reader)?;
        debug!(
            "BSA v{}: {} folders, {} files, flags {:#x}",
            header.version, header.folder_count, header.file_count, header.flags.0
        );

        reader.seek(SeekFrom::Start(u64::from(header.folder_record_offset)))?;
        let folder_record_size = header.folder_record_size();
        let folder_table_len = u64::from(header.folder_count) * folder_record_size;
        ensure_records_fit(
            &mut reader,
            u64::from(header.folder_count),
            folder_record_size,
            "folder records",
        )?;

        let mut folder_sizes = Vec::new();
        let mut declared_files = 0u64;
        for _ in 0..header.folder_count {
            let _hash = read_u64(&mut reader)?;
            let count = read_u32(&mut reader)?;
            // Skyrim SE pads the record and widens the offset.
            reader.seek(SeekFrom::Current(folder_record_size as i64 - 12))?;
            declared_files += u64::from(count);
            folder_sizes.push(count);
        }

        if declared_files != u64::from(header.file_count) {
            return Err(ArchiveError::Corrupt(format!(
                "folder records list {} files, header declares {}",
                declared_files, header.file_count
            )));
        }
        let folder_blocks_start = u64::from(header.folder_record_offset) + folder_table_len;
        reader.seek(SeekFrom::Start(folder_blocks_start))?;
        ensure_records_fit(&mut reader, declared_files, FILE_RECORD_LEN, "file records")?;

        // Folder blocks follow the folder records in the same order.
        let mut raw = Vec::new();
        for count in folder_sizes {
            let folder = if header.flags.has_directory_names() {
                read_bzstring(&mut reader)?
            } else {
                String::new()
            };

            for _ in 0..count {
                let record = RawFileRecord {
                    hash: read_u64(&mut reader)?,
                    size: read_u32(&mut reader)?,
                    offset: read_u32(&mut reader)?,
                };
                raw.push((folder.clone(), record));
            }
        }

        let names = if header.flags.has_file_names() {
            let block = read_bytes(&mut reader, u64::from(header.total_file_name_length))?;
            block
                .split(|&b| b == 0)
                .take(raw.len())
                .map(decode_name)
                .collect::<Vec<_>>()
        } else {
            Vec::new()
        };

        let mut files = Vec::new();
        let mut entries = Vec::new();
        for (index, (folder, record)) in raw.into_iter().enumerate() {
            let name = names
                .get(index)
                .cloned()
                .unwrap_or_else(|| format!("{:016x}", record.hash));
            let full_path = if folder.is_empty() {
                name
            } else {
                format!("{}\\{}", folder, name)
            };

            let file = Self::locate_payload(&mut reader, &header, &record)?;
            entries.push(ArchiveEntry {
                full_path,
                unpacked_size: if file.compressed { file.original_size } else { file.data_len },
                packed_size: u64::from(record.size & SIZE_MASK),
            });
            files.push(file);
        }

        Ok(BsaReader {
            reader: Some(reader),
            path: path.to_path_buf(),
            modified,
            header,
            files,
            entries,
        })
    }

    fn locate_payload(reader: &mut R, header: &BsaHeader, record: &RawFileRecord) -> Result<BsaFile> {
        let toggled = record.size & SIZE_COMPRESSION_TOGGLE != 0;
        let compressed = header.flags.compressed_by_default() != toggled;

        let mut data_offset = u64::from(record.offset);
        let mut data_len = u64::from(record.size & SIZE_MASK);
        let corrupt = || ArchiveError::Corrupt(format!("file record at {:#x} is shorter than its prefix", record.offset));

        if header.embeds_names() {
            reader.seek(SeekFrom::Start(data_offset))?;
            let prefix = 1 + u64::from(read_u8(reader)?);
            data_offset += prefix;
            data_len = data_len.checked_sub(prefix).ok_or_else(corrupt)?;
        }

        let mut original_size = data_len;
        if compressed {
            reader.seek(SeekFrom::Start(data_offset))?;
            original_size = u64::from(read_u32(reader)?);
            data_offset += 4;
            data_len = data_len.checked_sub(4).ok_or_else(corrupt)?;
        }

        Ok(BsaFile {
            data_offset,
            data_len,
            compressed,
            original_size,
        })
    }
}

impl<R: Read + Seek + Send> ArchiveReader for BsaReader<R> {
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
        let file = *self.files.get(index).ok_or(ArchiveError::IndexOutOfRange {
            index,
            count: self.files.len(),
        })?;
        let reader = self.reader.as_mut().ok_or(ArchiveError::Closed)?;

        trace!("Extracting BSA entry {} ({})", index, self.entries[index].full_path);

        reader.seek(SeekFrom::Start(file.data_offset))?;
        let stored = read_bytes(reader, file.data_len)?;

        let data = if !file.compressed {
            stored
        } else if self.header.uses_lz4() {
            lz4_frame_decompress(&stored, file.original_size as usize)?
        } else {
            zlib_decompress(&stored, file.original_size as usize)?
        };

        writer.write_all(&data)?;
        Ok(data.len() as u64)
    }

    fn close(&mut self) {
        if self.reader.take().is_some() {
            debug!("Closed BSA archive {}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::bsa::{BSA_MAGIC, VERSION_FALLOUT3, VERSION_OBLIVION, VERSION_SKYRIM_SE};
    use crate::testing::BsaBuilder;
    use std::io::Cursor;

    fn open(bytes: Vec<u8>) -> BsaReader<Cursor<Vec<u8>>> {
        BsaReader::new(Cursor::new(bytes), Path::new("test.bsa"), SystemTime::UNIX_EPOCH).unwrap()
    }

    fn extract(reader: &mut BsaReader<Cursor<Vec<u8>>>, index: usize) -> Vec<u8> {
        let mut out = Vec::new();
        reader.extract_to(index, &mut out).unwrap();
        out
    }

    #[test]
    fn lists_folders_and_files_in_order() {
        let bytes = BsaBuilder::new(VERSION_FALLOUT3)
            .file("meshes\\armor\\helmet.nif", b"helmet".to_vec())
            .file("meshes\\armor\\boots.nif", b"boots!".to_vec())
            .file("sound\\fx\\hit.wav", b"wave data".to_vec())
            .build();
        let reader = open(bytes);

        let paths: Vec<_> = reader.entries().iter().map(|e| e.full_path.as_str()).collect();
        assert_eq!(
            paths,
            ["meshes\\armor\\helmet.nif", "meshes\\armor\\boots.nif", "sound\\fx\\hit.wav"]
        );
        assert_eq!(reader.entries()[2].unpacked_size, 9);
        assert_eq!(reader.entries()[2].packed_size, 9);
    }

    #[test]
    fn zlib_compressed_v104_round_trips() {
        let payload = b"skyrim legendary edition ".repeat(20);
        let bytes = BsaBuilder::new(VERSION_FALLOUT3)
            .compressed(true)
            .file("textures\\a.dds", payload.clone())
            .build();
        let mut reader = open(bytes);

        assert_eq!(reader.entries()[0].unpacked_size, payload.len() as u64);
        assert!(reader.entries()[0].packed_size < payload.len() as u64);
        assert_eq!(extract(&mut reader, 0), payload);
    }

    #[test]
    fn lz4_compressed_v105_with_embedded_names() {
        let payload = b"special edition payload ".repeat(16);
        let bytes = BsaBuilder::new(VERSION_SKYRIM_SE)
            .compressed(true)
            .embed_names(true)
            .file("interface\\menu.swf", payload.clone())
            .file("interface\\hud.swf", b"tiny".to_vec())
            .build();
        let mut reader = open(bytes);

        assert_eq!(reader.entries()[0].unpacked_size, payload.len() as u64);
        assert_eq!(extract(&mut reader, 0), payload);
        assert_eq!(extract(&mut reader, 1), b"tiny");
    }

    #[test]
    fn oblivion_stored_entries() {
        let bytes = BsaBuilder::new(VERSION_OBLIVION)
            .file("meshes\\x.nif", b"oblivion".to_vec())
            .build();
        let mut reader = open(bytes);
        assert_eq!(extract(&mut reader, 0), b"oblivion");
    }

    fn truncated_header(file_count: u32, folder_count: u32) -> Vec<u8> {
        let mut bytes = BSA_MAGIC.to_vec();
        for word in [VERSION_FALLOUT3, 36, 0x3, folder_count, file_count, 0, 0, 0] {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        bytes
    }

    fn open_err(bytes: Vec<u8>) -> ArchiveError {
        match BsaReader::new(Cursor::new(bytes), Path::new("truncated.bsa"), SystemTime::UNIX_EPOCH) {
            Ok(_) => panic!("damaged archive opened"),
            Err(e) => e,
        }
    }

    #[test]
    fn truncated_header_with_huge_counts_is_corrupt() {
        let bytes = truncated_header(u32::MAX, 0);
        assert_eq!(bytes.len(), 36);
        assert!(matches!(open_err(bytes), ArchiveError::Corrupt(_)));

        assert!(matches!(open_err(truncated_header(u32::MAX, u32::MAX)), ArchiveError::Corrupt(_)));
    }

    #[test]
    fn folder_counts_must_match_header() {
        // One folder claiming u32::MAX files, header claiming one.
        let mut bytes = truncated_header(1, 1);
        bytes.extend_from_slice(&0u64.to_le_bytes());
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        assert!(matches!(open_err(bytes), ArchiveError::Corrupt(_)));
    }

    #[test]
    fn closed_reader_refuses_extraction() {
        let mut reader = open(BsaBuilder::new(VERSION_FALLOUT3).file("a\\b", b"c".to_vec()).build());
        reader.close();
        assert!(matches!(reader.extract_to(0, &mut Vec::new()), Err(ArchiveError::Closed)));
    }
}

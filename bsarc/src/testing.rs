//! Builders for small synthetic archives, shared with dependent crates' tests.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::formats::ba2::{BA2_MAGIC, GENERAL_TAG, RECORD_SENTINEL, TEXTURE_TAG};
use crate::formats::bsa::header::ArchiveFlags;
use crate::formats::bsa::{BSA_MAGIC, VERSION_OBLIVION, VERSION_SKYRIM_SE};

fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("zlib into memory");
    encoder.finish().expect("zlib into memory")
}

fn lz4_frame(data: &[u8]) -> Vec<u8> {
    let mut encoder = ::lz4::EncoderBuilder::new()
        .build(Vec::new())
        .expect("lz4 encoder");
    encoder.write_all(data).expect("lz4 into memory");
    let (out, result) = encoder.finish();
    result.expect("lz4 into memory");
    out
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_le_bytes());
}

enum Ba2Item {
    General { data: Vec<u8>, compress: bool },
    Texture { width: u16, height: u16, format: u8, chunks: Vec<Vec<u8>> },
}

/// Writes a version 1 `BTDX` archive with a name table.
pub struct Ba2Builder {
    texture: bool,
    items: Vec<(String, Ba2Item)>,
}

impl Ba2Builder {
    const HEADER_LEN: usize = 24;
    const GENERAL_RECORD_LEN: usize = 36;
    const TEXTURE_RECORD_LEN: usize = 24;
    const CHUNK_RECORD_LEN: usize = 24;

    pub fn general() -> Self {
        Ba2Builder { texture: false, items: Vec::new() }
    }

    pub fn textures() -> Self {
        Ba2Builder { texture: true, items: Vec::new() }
    }

    pub fn file(mut self, name: &str, data: Vec<u8>, compress: bool) -> Self {
        assert!(!self.texture, "general entries need Ba2Builder::general()");
        self.items.push((name.to_string(), Ba2Item::General { data, compress }));
        self
    }

    /// Adds a texture whose chunks are stored uncompressed.
    pub fn texture(mut self, name: &str, width: u16, height: u16, format: u8, chunks: Vec<Vec<u8>>) -> Self {
        assert!(self.texture, "texture entries need Ba2Builder::textures()");
        self.items.push((name.to_string(), Ba2Item::Texture { width, height, format, chunks }));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let records_len: usize = self
            .items
            .iter()
            .map(|(_, item)| match item {
                Ba2Item::General { .. } => Self::GENERAL_RECORD_LEN,
                Ba2Item::Texture { chunks, .. } => Self::TEXTURE_RECORD_LEN + chunks.len() * Self::CHUNK_RECORD_LEN,
            })
            .sum();

        let mut records = Vec::with_capacity(records_len);
        let mut data = Vec::new();
        let data_start = (Self::HEADER_LEN + records_len) as u64;

        for (index, (_, item)) in self.items.iter().enumerate() {
            put_u32(&mut records, index as u32);
            records.extend_from_slice(b"dds\0");
            put_u32(&mut records, 0);

            match item {
                Ba2Item::General { data: payload, compress } => {
                    let offset = data_start + data.len() as u64;
                    let packed_size = if *compress {
                        let packed = zlib(payload);
                        data.extend_from_slice(&packed);
                        packed.len() as u32
                    } else {
                        data.extend_from_slice(payload);
                        0
                    };
                    put_u32(&mut records, 0x0010_0100);
                    put_u64(&mut records, offset);
                    put_u32(&mut records, packed_size);
                    put_u32(&mut records, payload.len() as u32);
                    put_u32(&mut records, RECORD_SENTINEL);
                }
                Ba2Item::Texture { width, height, format, chunks } => {
                    records.push(0);
                    records.push(chunks.len() as u8);
                    put_u16(&mut records, Self::CHUNK_RECORD_LEN as u16);
                    put_u16(&mut records, *height);
                    put_u16(&mut records, *width);
                    records.push(chunks.len() as u8);
                    records.push(*format);
                    records.push(0);
                    records.push(8);

                    for (mip, chunk) in chunks.iter().enumerate() {
                        put_u64(&mut records, data_start + data.len() as u64);
                        put_u32(&mut records, 0);
                        put_u32(&mut records, chunk.len() as u32);
                        put_u16(&mut records, mip as u16);
                        put_u16(&mut records, mip as u16);
                        put_u32(&mut records, RECORD_SENTINEL);
                        data.extend_from_slice(chunk);
                    }
                }
            }
        }

        let name_table_offset = data_start + data.len() as u64;

        let mut out = Vec::with_capacity(name_table_offset as usize);
        out.extend_from_slice(&BA2_MAGIC);
        put_u32(&mut out, 1);
        out.extend_from_slice(if self.texture { &TEXTURE_TAG } else { &GENERAL_TAG });
        put_u32(&mut out, self.items.len() as u32);
        put_u64(&mut out, name_table_offset);
        out.extend_from_slice(&records);
        out.extend_from_slice(&data);

        for (name, _) in &self.items {
            put_u16(&mut out, name.len() as u16);
            out.extend_from_slice(name.as_bytes());
        }

        out
    }
}

/// Writes a `BSA\0` archive with folder and file names.
///
/// Files are grouped by folder in first-seen order, so entries listed from the
/// result match insertion order as long as each folder's files are added together.
pub struct BsaBuilder {
    version: u32,
    compressed: bool,
    embed_names: bool,
    folders: Vec<(String, Vec<(String, Vec<u8>)>)>,
}

impl BsaBuilder {
    const HEADER_LEN: usize = 36;
    const FILE_RECORD_LEN: usize = 16;

    pub fn new(version: u32) -> Self {
        BsaBuilder {
            version,
            compressed: false,
            embed_names: false,
            folders: Vec::new(),
        }
    }

    /// Compress every file by default (archive flag 0x4).
    pub fn compressed(mut self, compressed: bool) -> Self {
        self.compressed = compressed;
        self
    }

    /// Prefix every payload with its full path (archive flag 0x100).
    pub fn embed_names(mut self, embed: bool) -> Self {
        self.embed_names = embed;
        self
    }

    pub fn file(mut self, path: &str, data: Vec<u8>) -> Self {
        let (folder, name) = path.rsplit_once('\\').unwrap_or(("", path));
        match self.folders.iter_mut().find(|(f, _)| f == folder) {
            Some((_, files)) => files.push((name.to_string(), data)),
            None => self
                .folders
                .push((folder.to_string(), vec![(name.to_string(), data)])),
        }
        self
    }

    fn encode_payload(&self, folder: &str, name: &str, data: &[u8]) -> Vec<u8> {
        let mut stored = Vec::new();
        if self.embed_names && self.version != VERSION_OBLIVION {
            let full = format!("{}\\{}", folder, name);
            stored.push(full.len() as u8);
            stored.extend_from_slice(full.as_bytes());
        }
        if self.compressed {
            put_u32(&mut stored, data.len() as u32);
            if self.version == VERSION_SKYRIM_SE {
                stored.extend_from_slice(&lz4_frame(data));
            } else {
                stored.extend_from_slice(&zlib(data));
            }
        } else {
            stored.extend_from_slice(data);
        }
        stored
    }

    pub fn build(self) -> Vec<u8> {
        let folder_record_len = if self.version == VERSION_SKYRIM_SE { 24 } else { 16 };
        let file_count: usize = self.folders.iter().map(|(_, files)| files.len()).sum();
        let total_folder_name_length: usize = self.folders.iter().map(|(f, _)| f.len() + 1).sum();
        let total_file_name_length: usize = self
            .folders
            .iter()
            .flat_map(|(_, files)| files.iter().map(|(n, _)| n.len() + 1))
            .sum();

        let folder_blocks_start = Self::HEADER_LEN + self.folders.len() * folder_record_len;
        let folder_blocks_len = self.folders.len() + total_folder_name_length + file_count * Self::FILE_RECORD_LEN;
        let data_start = folder_blocks_start + folder_blocks_len + total_file_name_length;

        let mut flags = ArchiveFlags::DIRECTORY_NAMES | ArchiveFlags::FILE_NAMES;
        if self.compressed {
            flags |= ArchiveFlags::COMPRESSED;
        }
        if self.embed_names {
            flags |= ArchiveFlags::EMBEDDED_NAMES;
        }

        let mut out = Vec::new();
        out.extend_from_slice(&BSA_MAGIC);
        put_u32(&mut out, self.version);
        put_u32(&mut out, Self::HEADER_LEN as u32);
        put_u32(&mut out, flags);
        put_u32(&mut out, self.folders.len() as u32);
        put_u32(&mut out, file_count as u32);
        put_u32(&mut out, total_folder_name_length as u32);
        put_u32(&mut out, total_file_name_length as u32);
        put_u32(&mut out, 0);

        let mut block_offset = folder_blocks_start;
        for (index, (folder, files)) in self.folders.iter().enumerate() {
            put_u64(&mut out, index as u64);
            put_u32(&mut out, files.len() as u32);
            let offset = (block_offset + total_file_name_length) as u64;
            if self.version == VERSION_SKYRIM_SE {
                put_u32(&mut out, 0);
                put_u64(&mut out, offset);
            } else {
                put_u32(&mut out, offset as u32);
            }
            block_offset += 1 + folder.len() + 1 + files.len() * Self::FILE_RECORD_LEN;
        }

        let mut data = Vec::new();
        let mut names = Vec::new();
        let mut hash = 0u64;
        for (folder, files) in &self.folders {
            out.push((folder.len() + 1) as u8);
            out.extend_from_slice(folder.as_bytes());
            out.push(0);

            for (name, payload) in files {
                let stored = self.encode_payload(folder, name, payload);
                put_u64(&mut out, hash);
                put_u32(&mut out, stored.len() as u32);
                put_u32(&mut out, (data_start + data.len()) as u32);
                data.extend_from_slice(&stored);

                names.extend_from_slice(name.as_bytes());
                names.push(0);
                hash += 1;
            }
        }

        out.extend_from_slice(&names);
        debug_assert_eq!(out.len(), data_start);
        out.extend_from_slice(&data);
        out
    }
}

//! DDS container header rebuilt in front of BA2 texture chunks.
//!
//! DX10 archives strip the header from every texture and keep only the
//! dimensions, mip count and DXGI format. Extraction prepends a
//! `DDS_HEADER` followed by a `DDS_HEADER_DXT10` extension so any DXGI
//! format round-trips without a legacy FourCC mapping.

pub const DDS_MAGIC: [u8; 4] = *b"DDS ";
pub const DDS_HEADER_SIZE: u32 = 124;
pub const DDS_PIXELFORMAT_SIZE: u32 = 32;
pub const DX10_HEADER_SIZE: u32 = 20;
/// Magic + `DDS_HEADER` + `DDS_HEADER_DXT10`.
pub const DDS_FILE_HEADER_LEN: u64 = 4 + DDS_HEADER_SIZE as u64 + DX10_HEADER_SIZE as u64;

const DDSD_CAPS: u32 = 0x1;
const DDSD_HEIGHT: u32 = 0x2;
const DDSD_WIDTH: u32 = 0x4;
const DDSD_PIXELFORMAT: u32 = 0x1000;
const DDSD_MIPMAPCOUNT: u32 = 0x20000;
const DDSD_LINEARSIZE: u32 = 0x80000;

const DDPF_FOURCC: u32 = 0x4;

const DDSCAPS_COMPLEX: u32 = 0x8;
const DDSCAPS_TEXTURE: u32 = 0x1000;
const DDSCAPS_MIPMAP: u32 = 0x40_0000;
const DDSCAPS2_CUBEMAP_ALLFACES: u32 = 0xFE00;

const D3D10_RESOURCE_DIMENSION_TEXTURE2D: u32 = 3;
const D3D10_RESOURCE_MISC_TEXTURECUBE: u32 = 0x4;

/// Texture description carried by a DX10 record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub width: u16,
    pub height: u16,
    pub mip_count: u8,
    pub dxgi_format: u8,
    pub cubemap: bool,
}

/// Size in bytes of the top mip level, or 0 for formats we do not size.
pub fn linear_size(format: u8, width: u32, height: u32) -> u32 {
    let blocks = |block_bytes: u32| width.div_ceil(4).max(1) * height.div_ceil(4).max(1) * block_bytes;

    match format {
        // BC1, BC4
        70..=72 | 79..=81 => blocks(8),
        // BC2, BC3, BC5, BC6H, BC7
        73..=78 | 82..=84 | 94..=99 => blocks(16),
        // R8G8B8A8, B8G8R8A8, B8G8R8X8
        27..=32 | 87 | 88 | 90..=93 => width * height * 4,
        // R8G8
        48..=52 => width * height * 2,
        // R8, A8
        60..=65 => width * height,
        _ => 0,
    }
}

pub fn build_header(info: &TextureInfo) -> Vec<u8> {
    let width = u32::from(info.width);
    let height = u32::from(info.height);
    let mips = u32::from(info.mip_count.max(1));
    let pitch = linear_size(info.dxgi_format, width, height);

    let mut flags = DDSD_CAPS | DDSD_HEIGHT | DDSD_WIDTH | DDSD_PIXELFORMAT | DDSD_MIPMAPCOUNT;
    if pitch != 0 {
        flags |= DDSD_LINEARSIZE;
    }

    let mut caps = DDSCAPS_TEXTURE;
    let mut caps2 = 0;
    if mips > 1 {
        caps |= DDSCAPS_COMPLEX | DDSCAPS_MIPMAP;
    }
    if info.cubemap {
        caps |= DDSCAPS_COMPLEX;
        caps2 |= DDSCAPS2_CUBEMAP_ALLFACES;
    }

    let mut out = Vec::with_capacity(DDS_FILE_HEADER_LEN as usize);
    let mut put = |value: u32| out.extend_from_slice(&value.to_le_bytes());

    // DDS_HEADER
    put(u32::from_le_bytes(DDS_MAGIC));
    put(DDS_HEADER_SIZE);
    put(flags);
    put(height);
    put(width);
    put(pitch);
    put(0); // depth
    put(mips);
    for _ in 0..11 {
        put(0); // reserved1
    }

    // DDS_PIXELFORMAT
    put(DDS_PIXELFORMAT_SIZE);
    put(DDPF_FOURCC);
    put(u32::from_le_bytes(*b"DX10"));
    for _ in 0..5 {
        put(0);
    }

    put(caps);
    put(caps2);
    put(0); // caps3
    put(0); // caps4
    put(0); // reserved2

    // DDS_HEADER_DXT10
    put(u32::from(info.dxgi_format));
    put(D3D10_RESOURCE_DIMENSION_TEXTURE2D);
    put(if info.cubemap { D3D10_RESOURCE_MISC_TEXTURECUBE } else { 0 });
    put(1); // array size
    put(0); // misc flags 2

    out
}

//! Constants and structure layouts from the host's `wcxhead.h`.
//!
//! Host structures are never aliased as Rust types. Each one is described by
//! a table of byte offsets computed for the build target's pointer width with
//! natural C alignment, and read or written through a `&[u8]` view of the
//! host-owned memory.

use std::mem::size_of;

use crate::codec::{encode_text, TextVariant};
use crate::session::HeaderRecord;

pub const E_END_ARCHIVE: i32 = 10;
pub const E_NO_MEMORY: i32 = 11;
pub const E_BAD_DATA: i32 = 12;
pub const E_BAD_ARCHIVE: i32 = 13;
pub const E_UNKNOWN_FORMAT: i32 = 14;
pub const E_EOPEN: i32 = 15;
pub const E_ECREATE: i32 = 16;
pub const E_ECLOSE: i32 = 17;
pub const E_EREAD: i32 = 18;
pub const E_EWRITE: i32 = 19;
pub const E_SMALL_BUF: i32 = 20;
pub const E_EABORTED: i32 = 21;
pub const E_NO_FILES: i32 = 22;
pub const E_TOO_MANY_FILES: i32 = 23;
pub const E_NOT_SUPPORTED: i32 = 24;

pub const PK_OM_LIST: i32 = 0;
pub const PK_OM_EXTRACT: i32 = 1;

pub const PK_SKIP: i32 = 0;
pub const PK_TEST: i32 = 1;
pub const PK_EXTRACT: i32 = 2;

pub const PK_CAPS_NEW: i32 = 1;
pub const PK_CAPS_MODIFY: i32 = 2;
pub const PK_CAPS_MULTIPLE: i32 = 4;
pub const PK_CAPS_DELETE: i32 = 8;
pub const PK_CAPS_OPTIONS: i32 = 16;
pub const PK_CAPS_MEMPACK: i32 = 32;
pub const PK_CAPS_BY_CONTENT: i32 = 64;
pub const PK_CAPS_SEARCHTEXT: i32 = 128;
pub const PK_CAPS_HIDE: i32 = 256;
pub const PK_CAPS_ENCRYPT: i32 = 512;

/// `MAX_PATH`, the name length of `tHeaderData` and `PackDefaultParamStruct`.
pub const NAME_LEN: usize = 260;
/// Name length of `tHeaderDataEx` / `tHeaderDataExW`.
pub const NAME_LEN_EX: usize = 1024;

const PTR: usize = size_of::<usize>();

const fn align_up(offset: usize, align: usize) -> usize {
    offset.div_ceil(align) * align
}

fn read_ne<const N: usize>(buf: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&buf[offset..offset + N]);
    out
}

pub fn read_i32(buf: &[u8], offset: usize) -> i32 {
    i32::from_ne_bytes(read_ne(buf, offset))
}

pub fn read_usize(buf: &[u8], offset: usize) -> usize {
    usize::from_ne_bytes(read_ne(buf, offset))
}

pub fn write_i32(buf: &mut [u8], offset: usize, value: i32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_ne_bytes());
}

pub fn write_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_ne_bytes());
}

/// `tOpenArchiveData` and `tOpenArchiveDataW` share one layout; only the
/// pointee of `ArcName` differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenArchiveLayout {
    pub arc_name: usize,
    pub open_mode: usize,
    pub open_result: usize,
    pub cmt_buf: usize,
    pub cmt_buf_size: usize,
    pub cmt_size: usize,
    pub cmt_state: usize,
    pub size: usize,
}

impl OpenArchiveLayout {
    const fn new() -> Self {
        let arc_name = 0;
        let open_mode = arc_name + PTR;
        let open_result = open_mode + 4;
        let cmt_buf = align_up(open_result + 4, PTR);
        let cmt_buf_size = cmt_buf + PTR;
        let cmt_size = cmt_buf_size + 4;
        let cmt_state = cmt_size + 4;
        OpenArchiveLayout {
            arc_name,
            open_mode,
            open_result,
            cmt_buf,
            cmt_buf_size,
            cmt_size,
            cmt_state,
            size: align_up(cmt_state + 4, PTR),
        }
    }

    /// Address stored in `ArcName`.
    pub fn arc_name_ptr(&self, buf: &[u8]) -> usize {
        read_usize(buf, self.arc_name)
    }

    pub fn open_mode(&self, buf: &[u8]) -> i32 {
        read_i32(buf, self.open_mode)
    }

    pub fn set_open_result(&self, buf: &mut [u8], code: i32) {
        write_i32(buf, self.open_result, code);
    }
}

pub const OPEN_ARCHIVE_DATA: OpenArchiveLayout = OpenArchiveLayout::new();

/// Offsets of one header record flavor.
///
/// The basic `tHeaderData` has no high size words and no reserved tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLayout {
    pub variant: TextVariant,
    pub name_len: usize,
    pub arc_name: usize,
    pub file_name: usize,
    pub flags: usize,
    pub pack_size: usize,
    pub pack_size_high: Option<usize>,
    pub unp_size: usize,
    pub unp_size_high: Option<usize>,
    pub host_os: usize,
    pub file_crc: usize,
    pub file_time: usize,
    pub unp_ver: usize,
    pub method: usize,
    pub file_attr: usize,
    pub cmt_buf: usize,
    pub cmt_buf_size: usize,
    pub cmt_size: usize,
    pub cmt_state: usize,
    pub reserved: Option<usize>,
    pub size: usize,
}

impl HeaderLayout {
    const RESERVED_LEN: usize = 1024;

    const fn new(variant: TextVariant, name_len: usize, extended: bool) -> Self {
        let unit = variant.unit_size();
        let arc_name = 0;
        let file_name = arc_name + name_len * unit;
        let flags = file_name + name_len * unit;
        let pack_size = flags + 4;

        let (pack_size_high, unp_size) = if extended {
            (Some(pack_size + 4), pack_size + 8)
        } else {
            (None, pack_size + 4)
        };
        let (unp_size_high, host_os) = if extended {
            (Some(unp_size + 4), unp_size + 8)
        } else {
            (None, unp_size + 4)
        };

        let file_crc = host_os + 4;
        let file_time = file_crc + 4;
        let unp_ver = file_time + 4;
        let method = unp_ver + 4;
        let file_attr = method + 4;
        let cmt_buf = align_up(file_attr + 4, PTR);
        let cmt_buf_size = cmt_buf + PTR;
        let cmt_size = cmt_buf_size + 4;
        let cmt_state = cmt_size + 4;
        let end = cmt_state + 4;

        let (reserved, end) = if extended {
            (Some(end), end + Self::RESERVED_LEN)
        } else {
            (None, end)
        };

        HeaderLayout {
            variant,
            name_len,
            arc_name,
            file_name,
            flags,
            pack_size,
            pack_size_high,
            unp_size,
            unp_size_high,
            host_os,
            file_crc,
            file_time,
            unp_ver,
            method,
            file_attr,
            cmt_buf,
            cmt_buf_size,
            cmt_size,
            cmt_state,
            reserved,
            size: align_up(end, PTR),
        }
    }

    fn name_bytes(&self) -> usize {
        self.name_len * self.variant.unit_size()
    }

    /// Zero the whole record, then fill `FileName`, `FileTime` and the sizes.
    ///
    /// `buf` must be exactly `self.size` bytes of host memory.
    pub fn write(&self, buf: &mut [u8], record: &HeaderRecord) {
        debug_assert_eq!(buf.len(), self.size);
        buf.fill(0);

        let name_end = self.file_name + self.name_bytes();
        encode_text(&mut buf[self.file_name..name_end], &record.full_path, self.variant);

        write_u32(buf, self.file_time, record.packed_time());
        write_u32(buf, self.pack_size, record.packed_size as u32);
        write_u32(buf, self.unp_size, record.unpacked_size as u32);
        if let Some(high) = self.pack_size_high {
            write_u32(buf, high, (record.packed_size >> 32) as u32);
        }
        if let Some(high) = self.unp_size_high {
            write_u32(buf, high, (record.unpacked_size >> 32) as u32);
        }
    }
}

pub const HEADER_DATA: HeaderLayout = HeaderLayout::new(TextVariant::Ansi, NAME_LEN, false);
pub const HEADER_DATA_EX: HeaderLayout = HeaderLayout::new(TextVariant::Ansi, NAME_LEN_EX, true);
pub const HEADER_DATA_EX_W: HeaderLayout = HeaderLayout::new(TextVariant::Wide, NAME_LEN_EX, true);

/// `PackDefaultParamStruct`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultParamsLayout {
    pub size_field: usize,
    pub version_low: usize,
    pub version_high: usize,
    pub default_ini_name: usize,
    pub size: usize,
}

pub const DEFAULT_PARAMS: DefaultParamsLayout = DefaultParamsLayout {
    size_field: 0,
    version_low: 4,
    version_high: 8,
    default_ini_name: 12,
    size: 12 + NAME_LEN,
};

impl DefaultParamsLayout {
    /// `DefaultIniName`, cut at the first NUL.
    pub fn ini_name(&self, buf: &[u8]) -> Option<String> {
        let field = &buf[self.default_ini_name..self.default_ini_name + NAME_LEN];
        let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
        if end == 0 {
            return None;
        }
        Some(String::from_utf8_lossy(&field[..end]).into_owned())
    }

    pub fn interface_version(&self, buf: &[u8]) -> (i32, i32) {
        (read_i32(buf, self.version_high), read_i32(buf, self.version_low))
    }
}

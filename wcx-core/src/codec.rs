//! Conversions between host buffers and Rust values: fixed-width text and
//! the packed DOS date/time word.

use std::ffi::{c_void, CStr};
use std::path::MAIN_SEPARATOR;
use std::slice;
use std::time::SystemTime;

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, Timelike};

/// Character width of a host text buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextVariant {
    /// 8-bit narrow text, written as UTF-8.
    Ansi,
    /// 16-bit UTF-16 in native byte order.
    Wide,
}

impl TextVariant {
    pub const fn unit_size(self) -> usize {
        match self {
            TextVariant::Ansi => 1,
            TextVariant::Wide => 2,
        }
    }
}

fn normalize(c: char) -> char {
    if c == '/' {
        MAIN_SEPARATOR
    } else {
        c
    }
}

/// Write `text` into a fixed host buffer and NUL-terminate it.
///
/// At most `capacity - 1` code units are written, where capacity is
/// `dst.len() / unit_size`. A character that does not fit whole is dropped
/// together with everything after it. Returns the number of data units written.
pub fn encode_text(dst: &mut [u8], text: &str, variant: TextVariant) -> usize {
    let unit = variant.unit_size();
    let capacity = dst.len() / unit;
    if capacity == 0 {
        return 0;
    }
    let limit = capacity - 1;
    let mut written = 0;

    match variant {
        TextVariant::Ansi => {
            let mut scratch = [0u8; 4];
            for c in text.chars().map(normalize) {
                let bytes = c.encode_utf8(&mut scratch).as_bytes();
                if written + bytes.len() > limit {
                    break;
                }
                dst[written..written + bytes.len()].copy_from_slice(bytes);
                written += bytes.len();
            }
            dst[written] = 0;
        }
        TextVariant::Wide => {
            let mut scratch = [0u16; 2];
            for c in text.chars().map(normalize) {
                let units = c.encode_utf16(&mut scratch);
                if written + units.len() > limit {
                    break;
                }
                for u in units.iter() {
                    dst[written * 2..written * 2 + 2].copy_from_slice(&u.to_ne_bytes());
                    written += 1;
                }
            }
            dst[written * 2..written * 2 + 2].fill(0);
        }
    }

    written
}

/// Read a NUL-terminated host string. Invalid sequences are replaced, not rejected.
///
/// # Safety
///
/// `ptr` must be null or point to a readable, NUL-terminated buffer of the
/// given variant.
pub unsafe fn decode_text(ptr: *const c_void, variant: TextVariant) -> Option<String> {
    if ptr.is_null() {
        return None;
    }

    match variant {
        TextVariant::Ansi => Some(CStr::from_ptr(ptr.cast()).to_string_lossy().into_owned()),
        TextVariant::Wide => {
            let wide = ptr.cast::<u16>();
            let mut len = 0;
            while *wide.add(len) != 0 {
                len += 1;
            }
            Some(String::from_utf16_lossy(slice::from_raw_parts(wide, len)))
        }
    }
}

const DOS_EPOCH_YEAR: i32 = 1980;
const DOS_LAST_YEAR: i32 = DOS_EPOCH_YEAR + 127;

/// Pack a calendar time as `(year-1980)<<25 | month<<21 | day<<16 | hour<<11 | minute<<5 | second/2`.
///
/// Times before 1980 pack as 1980-01-01 00:00:00; times after 2107 as the
/// last representable second.
pub fn encode_timestamp(time: &NaiveDateTime) -> u32 {
    if time.year() < DOS_EPOCH_YEAR {
        return (1 << 21) | (1 << 16);
    }
    if time.year() > DOS_LAST_YEAR {
        return (127 << 25) | (12 << 21) | (31 << 16) | (23 << 11) | (59 << 5) | 29;
    }

    ((time.year() - DOS_EPOCH_YEAR) as u32) << 25
        | time.month() << 21
        | time.day() << 16
        | time.hour() << 11
        | time.minute() << 5
        | time.second() / 2
}

/// Local calendar time of a file timestamp.
pub fn local_time(time: SystemTime) -> NaiveDateTime {
    DateTime::<Local>::from(time).naive_local()
}

/// Unpack a DOS date/time word. Fields out of range yield `None`.
pub fn decode_timestamp(packed: u32) -> Option<NaiveDateTime> {
    let year = DOS_EPOCH_YEAR + (packed >> 25) as i32;
    let month = (packed >> 21) & 0xF;
    let day = (packed >> 16) & 0x1F;
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(
        (packed >> 11) & 0x1F,
        (packed >> 5) & 0x3F,
        (packed & 0x1F) * 2,
    )
}

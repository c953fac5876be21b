//! Little-endian field readers shared by the BA2 and BSA parsers.

use std::io::{self, Read, Seek, SeekFrom};

use crate::core::error::{ArchiveError, Result};

pub trait FixedSize: Sized {
    fn read<R: Read>(reader: &mut R) -> Result<Self>;
}

macro_rules! impl_fixed_size {
    ($($ty:ty),*) => {
        $(
            impl FixedSize for $ty {
                fn read<R: Read>(reader: &mut R) -> Result<Self> {
                    let mut buf = [0u8; std::mem::size_of::<$ty>()];
                    reader.read_exact(&mut buf)?;
                    Ok(<$ty>::from_le_bytes(buf))
                }
            }
        )*
    };
}

impl_fixed_size!(u8, u16, u32, u64);

pub fn read_u8<R: Read>(reader: &mut R) -> Result<u8> {
    u8::read(reader)
}

pub fn read_u16<R: Read>(reader: &mut R) -> Result<u16> {
    u16::read(reader)
}

pub fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    u32::read(reader)
}

pub fn read_u64<R: Read>(reader: &mut R) -> Result<u64> {
    u64::read(reader)
}

pub fn read_array<const N: usize, R: Read>(reader: &mut R) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

/// Reads exactly `len` bytes. The buffer grows with the data actually present,
/// so a bogus length in a damaged archive fails as a short read.
pub fn read_bytes<R: Read>(reader: &mut R, len: u64) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.by_ref().take(len).read_to_end(&mut buf)?;
    if (buf.len() as u64) < len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("expected {} bytes, stream ended after {}", len, buf.len()),
        )
        .into());
    }
    Ok(buf)
}

/// Fails with `Corrupt` unless `count` records of `record_len` bytes fit
/// between the current position and the end of the stream.
pub fn ensure_records_fit<R: Seek>(reader: &mut R, count: u64, record_len: u64, what: &str) -> Result<()> {
    let position = reader.stream_position()?;
    let end = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(position))?;

    let needed = count.checked_mul(record_len);
    let remaining = end.saturating_sub(position);
    match needed {
        Some(needed) if needed <= remaining => Ok(()),
        _ => Err(ArchiveError::Corrupt(format!(
            "{} {} need {} bytes each, only {} bytes remain at {:#x}",
            count, what, record_len, remaining, position
        ))),
    }
}

/// String prefixed by a one-byte length that counts the trailing NUL.
pub fn read_bzstring<R: Read>(reader: &mut R) -> Result<String> {
    let len = read_u8(reader)?;
    let bytes = read_bytes(reader, u64::from(len))?;
    Ok(decode_name(&bytes))
}

/// String prefixed by a two-byte length, no terminator (BA2 name table).
pub fn read_wstring<R: Read>(reader: &mut R) -> Result<String> {
    let len = read_u16(reader)?;
    let bytes = read_bytes(reader, u64::from(len))?;
    Ok(decode_name(&bytes))
}

/// Archive names are stored as narrow strings; anything past the first NUL is padding.
pub fn decode_name(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

use std::io::Read;

use crate::codecs::capacity_hint;
use crate::core::error::{ArchiveError, Result};

/// LZ4 cannot expand a block by more than this factor.
const LZ4_MAX_RATIO: usize = 255;

/// Raw LZ4 block, as used by Starfield BA2 v3 archives.
pub fn lz4_block_decompress(input: &[u8], expected_size: usize) -> Result<Vec<u8>> {
    // The block decoder allocates the declared size up front.
    if expected_size > input.len().saturating_mul(LZ4_MAX_RATIO) {
        return Err(ArchiveError::Decompress(format!(
            "LZ4 block of {} bytes cannot decode to {} bytes",
            input.len(),
            expected_size
        )));
    }
    let size = i32::try_from(expected_size)
        .map_err(|_| ArchiveError::Decompress(format!("LZ4 block too large: {} bytes", expected_size)))?;

    let result = ::lz4::block::decompress(input, Some(size))
        .map_err(|e| ArchiveError::Decompress(format!("LZ4 block: {}", e)))?;

    if result.len() != expected_size {
        return Err(ArchiveError::Decompress(format!(
            "LZ4 block produced {} bytes, expected {}",
            result.len(),
            expected_size
        )));
    }

    Ok(result)
}

/// LZ4 frame stream, as used by Skyrim SE (BSA v105) archives.
pub fn lz4_frame_decompress(input: &[u8], expected_size: usize) -> Result<Vec<u8>> {
    let mut decoder = ::lz4::Decoder::new(input)
        .map_err(|e| ArchiveError::Decompress(format!("LZ4 frame header: {}", e)))?;

    let mut out = Vec::with_capacity(capacity_hint(input.len(), expected_size));
    // One byte past the declared size is enough to detect an overrun.
    let limit = (expected_size as u64).saturating_add(1);
    decoder
        .by_ref()
        .take(limit)
        .read_to_end(&mut out)
        .map_err(|e| ArchiveError::Decompress(format!("LZ4 frame: {}", e)))?;

    if out.len() != expected_size {
        return Err(ArchiveError::Decompress(format!(
            "LZ4 frame produced {} bytes, expected {}",
            out.len(),
            expected_size
        )));
    }

    Ok(out)
}

use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::codecs::capacity_hint;
use crate::core::error::{ArchiveError, Result};

/// zlib stream with a known decoded length (BA2 GNRL/DX10, BSA v103/v104).
pub fn zlib_decompress(input: &[u8], expected_size: usize) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(input);
    let mut out = Vec::with_capacity(capacity_hint(input.len(), expected_size));

    // One byte past the declared size is enough to detect an overrun.
    let limit = (expected_size as u64).saturating_add(1);
    decoder
        .by_ref()
        .take(limit)
        .read_to_end(&mut out)
        .map_err(|e| ArchiveError::Decompress(format!("zlib: {}", e)))?;

    if out.len() != expected_size {
        return Err(ArchiveError::Decompress(format!(
            "zlib produced {} bytes, expected {}",
            out.len(),
            expected_size
        )));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn zlib_decompression() {
        let original = b"Hello, zlib! This is a test string for archive payloads.".repeat(4);
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&original).unwrap();
        let compressed = encoder.finish().unwrap();

        let decompressed = zlib_decompress(&compressed, original.len()).unwrap();
        assert_eq!(original, decompressed);
    }

    #[test]
    fn absurd_declared_size_fails_without_reserving_it() {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"short").unwrap();
        let compressed = encoder.finish().unwrap();

        assert!(matches!(
            zlib_decompress(&compressed, usize::MAX),
            Err(ArchiveError::Decompress(_))
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            zlib_decompress(b"definitely not zlib", 19),
            Err(ArchiveError::Decompress(_))
        ));
    }
}

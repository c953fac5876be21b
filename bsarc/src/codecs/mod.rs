//! Decompressors for the payload encodings Bethesda archives use.

pub mod lz4;
pub mod zlib;

pub use self::lz4::{lz4_block_decompress, lz4_frame_decompress};
pub use self::zlib::zlib_decompress;

/// Initial output capacity for a payload that claims to inflate to `expected_size`.
/// The claim comes from the archive, so it is bounded by what `input_len` could
/// plausibly decode to.
pub(crate) fn capacity_hint(input_len: usize, expected_size: usize) -> usize {
    const MAX_RATIO: usize = 1032;
    expected_size.min(input_len.saturating_mul(MAX_RATIO))
}

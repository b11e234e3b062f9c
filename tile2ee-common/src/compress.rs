//! The compression adapter (spec §4.2), wrapping `flate2`'s zlib codec.
//!
//! This is the one external collaborator spec.md calls out explicitly
//! ("the deflate/inflate primitive itself ... treated as a black-box
//! streaming compressor"); `yonasBSD-hayro` already depends on `flate2`
//! with the `zlib-rs` backend, so we reuse that rather than reaching for
//! a different compression crate.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::error::{ConvertError, ConvertResult};

/// Decompresses a zlib stream, failing unless the output is exactly
/// `expected_len` bytes long.
pub fn inflate(src: &[u8], expected_len: usize) -> ConvertResult<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(src);
    let mut out = Vec::with_capacity(expected_len);
    decoder
        .read_to_end(&mut out)
        .map_err(|_| ConvertError::CorruptCompressed {
            expected: expected_len,
            actual: 0,
        })?;

    if out.len() != expected_len {
        return Err(ConvertError::CorruptCompressed {
            expected: expected_len,
            actual: out.len(),
        });
    }

    Ok(out)
}

/// Compresses `src` into a zlib stream. Deterministic and infallible for
/// well-formed input.
pub fn deflate(src: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    // `Vec<u8>` as a `Write` sink never fails.
    encoder.write_all(src).expect("writing to a Vec cannot fail");
    encoder.finish().expect("finishing a Vec-backed encoder cannot fail")
}

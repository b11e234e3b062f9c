//! PVRZ container I/O (spec §6): a PVR-v3 texture header wrapped by a
//! `uint32` uncompressed size and a zlib stream.

use tile2ee_common::compress::{deflate, inflate};
use tile2ee_common::error::{ConvertError, ConvertResult};
use tile2ee_common::reader::LeReader;
use tile2ee_common::writer::LeWriter;

use crate::signature::PVR_MAGIC;

const PVR_HEADER_SIZE: usize = 52;

/// A decoded PVRZ page: its PVR pixel format code (spec §6: `7` BC1, `9`
/// BC2, `11` BC3 -- left as a raw code here so this crate does not need to
/// depend on `tile2ee-bcn`'s `Encoding`), dimensions, and raw
/// block-compressed body.
#[derive(Debug, Clone)]
pub struct PvrzPage {
    pub pixel_format: u32,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

fn is_power_of_two(v: u32) -> bool {
    v > 0 && v & (v - 1) == 0
}

/// Decompresses and parses a PVRZ file into its page.
pub fn load_pvrz(data: &[u8]) -> ConvertResult<PvrzPage> {
    let mut reader = LeReader::new(data);
    let uncompressed_size = reader.read_u32().ok_or(ConvertError::Truncated { what: "PVRZ uncompressedSize" })?;
    let rest = reader.read_bytes(reader.remaining()).unwrap_or(&[]);
    let pvr = inflate(rest, uncompressed_size as usize)?;

    let mut pr = LeReader::new(&pvr);
    let magic = pr.read_u32().ok_or(ConvertError::Truncated { what: "PVR magic" })?;
    if magic != PVR_MAGIC {
        return Err(ConvertError::BadSignature {
            expected: "PVR\\x03",
            file: Default::default(),
        });
    }
    let _flags = pr.read_u32().ok_or(ConvertError::Truncated { what: "PVR flags" })?;
    let pixel_format = pr.read_u32().ok_or(ConvertError::Truncated { what: "PVR pixelFormat" })?;
    let _ext_fmt = pr.read_u32().ok_or(ConvertError::Truncated { what: "PVR extFmt" })?;
    let _color_space = pr.read_u32().ok_or(ConvertError::Truncated { what: "PVR colorSpace" })?;
    let _channel_type = pr.read_u32().ok_or(ConvertError::Truncated { what: "PVR channelType" })?;
    let height = pr.read_u32().ok_or(ConvertError::Truncated { what: "PVR height" })?;
    let width = pr.read_u32().ok_or(ConvertError::Truncated { what: "PVR width" })?;
    let _depth = pr.read_u32().ok_or(ConvertError::Truncated { what: "PVR depth" })?;
    let _surfaces = pr.read_u32().ok_or(ConvertError::Truncated { what: "PVR surfaces" })?;
    let _faces = pr.read_u32().ok_or(ConvertError::Truncated { what: "PVR faces" })?;
    let _mip_levels = pr.read_u32().ok_or(ConvertError::Truncated { what: "PVR mipLevels" })?;
    let meta_data_size = pr.read_u32().ok_or(ConvertError::Truncated { what: "PVR metaDataSize" })?;

    if !is_power_of_two(width) || !is_power_of_two(height) {
        return Err(ConvertError::BadDimension {
            what: "PVR width/height must be powers of two",
            value: (width as i64) << 32 | height as i64,
        });
    }

    pr.seek_rel(meta_data_size as isize)
        .ok_or(ConvertError::Truncated { what: "PVR metadata" })?;
    let body = pr.read_bytes(pr.remaining()).unwrap_or(&[]).to_vec();

    Ok(PvrzPage { pixel_format, width, height, data: body })
}

/// Serializes and compresses a page back into PVRZ bytes.
pub fn save_pvrz(page: &PvrzPage) -> ConvertResult<Vec<u8>> {
    if !is_power_of_two(page.width) || !is_power_of_two(page.height) {
        return Err(ConvertError::BadDimension {
            what: "PVR width/height must be powers of two",
            value: (page.width as i64) << 32 | page.height as i64,
        });
    }

    let mut pw = LeWriter::with_capacity(PVR_HEADER_SIZE + page.data.len());
    pw.write_u32(PVR_MAGIC);
    pw.write_u32(0); // flags
    pw.write_u32(page.pixel_format);
    pw.write_u32(0); // extFmt
    pw.write_u32(0); // colorSpace
    pw.write_u32(0); // channelType
    pw.write_u32(page.height);
    pw.write_u32(page.width);
    pw.write_u32(1); // depth
    pw.write_u32(1); // surfaces
    pw.write_u32(1); // faces
    pw.write_u32(1); // mipLevels
    pw.write_u32(0); // metaDataSize
    pw.write_bytes(&page.data);
    let pvr = pw.into_bytes();

    let mut w = LeWriter::with_capacity(4 + pvr.len());
    w.write_u32(pvr.len() as u32);
    w.write_bytes(&deflate(&pvr));
    Ok(w.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pvrz_round_trips_decoded_pixels() {
        let page = PvrzPage {
            pixel_format: 7,
            width: 64,
            height: 64,
            data: vec![0xABu8; 64 * 64 / 2], // BC1: 8 bytes per 4x4 block
        };
        let bytes = save_pvrz(&page).unwrap();
        let loaded = load_pvrz(&bytes).unwrap();
        assert_eq!(loaded.width, page.width);
        assert_eq!(loaded.height, page.height);
        assert_eq!(loaded.pixel_format, page.pixel_format);
        assert_eq!(loaded.data, page.data);
    }

    #[test]
    fn save_pvrz_rejects_non_power_of_two() {
        let page = PvrzPage { pixel_format: 7, width: 100, height: 64, data: vec![] };
        assert!(save_pvrz(&page).is_err());
    }
}

//! MOS (mosaic) container I/O (spec §6): V1 palette+index blocks, the
//! MOSC zlib wrapper, and V2 PVRZ-reference blocks.

use tile2ee_common::compress::{deflate, inflate};
use tile2ee_common::error::{ConvertError, ConvertResult};
use tile2ee_common::reader::LeReader;
use tile2ee_common::writer::LeWriter;

use crate::signature::{HEADER_SIZE, MOSC_SIG, MOS_SIG, PALETTE_BYTES, TILE_DIM, VERSION_V1, VERSION_V2};

/// Number of `TILE_DIM`-sized columns/rows needed to cover `len` pixels.
fn grid_len(len: u32) -> u32 {
    (len + TILE_DIM - 1) / TILE_DIM
}

/// The actual (possibly truncated at the right/bottom edge) size of the
/// block at grid position `(col, row)`.
fn block_extent(col: u32, row: u32, width: u32, height: u32) -> (u32, u32) {
    let bw = width.saturating_sub(col * TILE_DIM).min(TILE_DIM);
    let bh = height.saturating_sub(row * TILE_DIM).min(TILE_DIM);
    (bw, bh)
}

/// One V1 MOS block: a 256-entry RGBA palette plus `bw * bh` index bytes
/// (edge blocks are smaller than `TILE_DIM x TILE_DIM`, spec §6 "MOS edge
/// blocks").
#[derive(Debug, Clone)]
pub struct MosV1Block {
    pub palette: Vec<[u8; 4]>,
    pub indices: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct MosV1 {
    pub width: u32,
    pub height: u32,
    /// Row-major, `cols * rows` entries.
    pub blocks: Vec<MosV1Block>,
}

impl MosV1 {
    pub fn cols(&self) -> u32 {
        grid_len(self.width)
    }

    pub fn rows(&self) -> u32 {
        grid_len(self.height)
    }

    /// The actual `(bw, bh)` size of the block at row-major index `i`.
    pub fn block_extent(&self, i: usize) -> (u32, u32) {
        let cols = self.cols();
        let col = i as u32 % cols;
        let row = i as u32 / cols;
        block_extent(col, row, self.width, self.height)
    }
}

pub fn parse_mos_v1(data: &[u8]) -> ConvertResult<MosV1> {
    let mut reader = LeReader::new(data);
    let sig = reader.read_array::<4>().ok_or(ConvertError::Truncated { what: "MOS signature" })?;
    if &sig != MOS_SIG {
        return Err(ConvertError::BadSignature {
            expected: "MOS ",
            file: Default::default(),
        });
    }
    let version = reader.read_array::<4>().ok_or(ConvertError::Truncated { what: "MOS version" })?;
    if version != *VERSION_V1 {
        return Err(ConvertError::UnsupportedVersion { found: version });
    }

    let width = reader.read_u16().ok_or(ConvertError::Truncated { what: "MOS width" })? as u32;
    let height = reader.read_u16().ok_or(ConvertError::Truncated { what: "MOS height" })? as u32;
    let cols = reader.read_u16().ok_or(ConvertError::Truncated { what: "MOS cols" })? as u32;
    let rows = reader.read_u16().ok_or(ConvertError::Truncated { what: "MOS rows" })? as u32;
    let _tile_dim = reader.read_u32().ok_or(ConvertError::Truncated { what: "MOS tileDim" })?;
    let pal_ofs = reader.read_u32().ok_or(ConvertError::Truncated { what: "MOS palOfs" })?;

    let expected_cols = grid_len(width);
    let expected_rows = grid_len(height);
    if cols != expected_cols || rows != expected_rows {
        return Err(ConvertError::BadDimension {
            what: "MOS cols/rows do not match width/height",
            value: (cols as i64) << 32 | rows as i64,
        });
    }

    let num_blocks = (cols * rows) as usize;

    reader
        .seek_abs(pal_ofs as usize)
        .ok_or(ConvertError::Truncated { what: "MOS palette offset" })?;

    let mut palettes = Vec::with_capacity(num_blocks);
    for _ in 0..num_blocks {
        let bytes = reader.read_bytes(PALETTE_BYTES).ok_or(ConvertError::Truncated { what: "MOS block palette" })?;
        palettes.push(bytes.chunks_exact(4).map(|c| [c[0], c[1], c[2], c[3]]).collect::<Vec<_>>());
    }

    let mut offsets = Vec::with_capacity(num_blocks);
    for _ in 0..num_blocks {
        offsets.push(reader.read_u32().ok_or(ConvertError::Truncated { what: "MOS tile data offset" })?);
    }

    let tile_data_start = reader.offset();

    let mut blocks = Vec::with_capacity(num_blocks);
    for i in 0..num_blocks {
        let col = i as u32 % cols;
        let row = i as u32 / cols;
        let (bw, bh) = block_extent(col, row, width, height);
        let start = tile_data_start + offsets[i] as usize;
        let len = (bw * bh) as usize;
        let end = start.checked_add(len).ok_or(ConvertError::Truncated { what: "MOS block indices" })?;
        let indices = data
            .get(start..end)
            .ok_or(ConvertError::Truncated { what: "MOS block indices" })?
            .to_vec();
        blocks.push(MosV1Block { palette: palettes[i].clone(), indices });
    }

    Ok(MosV1 { width, height, blocks })
}

pub fn write_mos_v1(mos: &MosV1) -> Vec<u8> {
    let cols = mos.cols();
    let rows = mos.rows();
    let num_blocks = mos.blocks.len();

    let mut w = LeWriter::with_capacity(HEADER_SIZE as usize + num_blocks * PALETTE_BYTES + num_blocks * 4);
    w.write_bytes(MOS_SIG);
    w.write_bytes(VERSION_V1);
    w.write_u16(mos.width as u16);
    w.write_u16(mos.height as u16);
    w.write_u16(cols as u16);
    w.write_u16(rows as u16);
    w.write_u32(TILE_DIM);
    w.write_u32(HEADER_SIZE);

    for block in &mos.blocks {
        for px in &block.palette {
            w.write_bytes(px);
        }
    }

    let offsets_pos = w.offset();
    for _ in 0..num_blocks {
        w.write_u32(0);
    }

    let mut offset = 0u32;
    let mut patched = Vec::with_capacity(num_blocks);
    for block in &mos.blocks {
        patched.push(offset);
        w.write_bytes(&block.indices);
        offset += block.indices.len() as u32;
    }
    for (i, value) in patched.into_iter().enumerate() {
        w.patch(offsets_pos + i * 4, &value.to_le_bytes());
    }

    w.into_bytes()
}

/// Unwraps an MOSC stream (`"MOSC" + "V1  " + le32(len) + deflate(mos)`)
/// back to its full MOS V1 byte stream.
pub fn unwrap_mosc(data: &[u8]) -> ConvertResult<Vec<u8>> {
    let mut reader = LeReader::new(data);
    let sig = reader.read_array::<4>().ok_or(ConvertError::Truncated { what: "MOSC signature" })?;
    if &sig != MOSC_SIG {
        return Err(ConvertError::BadSignature {
            expected: "MOSC",
            file: Default::default(),
        });
    }
    let version = reader.read_array::<4>().ok_or(ConvertError::Truncated { what: "MOSC version" })?;
    if version != *VERSION_V1 {
        return Err(ConvertError::UnsupportedVersion { found: version });
    }
    let uncompressed_size = reader.read_u32().ok_or(ConvertError::Truncated { what: "MOSC uncompressedSize" })?;
    let rest = reader.read_bytes(reader.remaining()).unwrap_or(&[]);
    inflate(rest, uncompressed_size as usize)
}

/// Wraps a full MOS V1 byte stream as MOSC.
pub fn wrap_mosc(mos_bytes: &[u8]) -> Vec<u8> {
    let mut w = LeWriter::with_capacity(12 + mos_bytes.len());
    w.write_bytes(MOSC_SIG);
    w.write_bytes(VERSION_V1);
    w.write_u32(mos_bytes.len() as u32);
    w.write_bytes(&deflate(mos_bytes));
    w.into_bytes()
}

/// One V2 MOS block: a PVRZ page reference plus the source sub-rectangle
/// and destination position on the logical `W x H` surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MosV2Block {
    pub page: i32,
    pub src_x: u32,
    pub src_y: u32,
    pub w: u32,
    pub h: u32,
    pub dst_x: u32,
    pub dst_y: u32,
}

#[derive(Debug, Clone)]
pub struct MosV2 {
    pub width: u32,
    pub height: u32,
    pub blocks: Vec<MosV2Block>,
}

pub fn parse_mos_v2(data: &[u8]) -> ConvertResult<MosV2> {
    let mut reader = LeReader::new(data);
    let sig = reader.read_array::<4>().ok_or(ConvertError::Truncated { what: "MOS signature" })?;
    if &sig != MOS_SIG {
        return Err(ConvertError::BadSignature {
            expected: "MOS ",
            file: Default::default(),
        });
    }
    let version = reader.read_array::<4>().ok_or(ConvertError::Truncated { what: "MOS version" })?;
    if version != *VERSION_V2 {
        return Err(ConvertError::UnsupportedVersion { found: version });
    }

    let width = reader.read_u32().ok_or(ConvertError::Truncated { what: "MOS width" })?;
    let height = reader.read_u32().ok_or(ConvertError::Truncated { what: "MOS height" })?;
    let num_blocks = reader.read_u32().ok_or(ConvertError::Truncated { what: "MOS numBlocks" })?;
    let ofs_blocks = reader.read_u32().ok_or(ConvertError::Truncated { what: "MOS ofsBlocks" })?;

    reader
        .seek_abs(ofs_blocks as usize)
        .ok_or(ConvertError::Truncated { what: "MOS block records offset" })?;

    let mut blocks = Vec::with_capacity(num_blocks as usize);
    for _ in 0..num_blocks {
        let page = reader.read_i32().ok_or(ConvertError::Truncated { what: "MOS V2 block page" })?;
        let src_x = reader.read_u32().ok_or(ConvertError::Truncated { what: "MOS V2 block srcX" })?;
        let src_y = reader.read_u32().ok_or(ConvertError::Truncated { what: "MOS V2 block srcY" })?;
        let w = reader.read_u32().ok_or(ConvertError::Truncated { what: "MOS V2 block w" })?;
        let h = reader.read_u32().ok_or(ConvertError::Truncated { what: "MOS V2 block h" })?;
        let dst_x = reader.read_u32().ok_or(ConvertError::Truncated { what: "MOS V2 block dstX" })?;
        let dst_y = reader.read_u32().ok_or(ConvertError::Truncated { what: "MOS V2 block dstY" })?;
        blocks.push(MosV2Block { page, src_x, src_y, w, h, dst_x, dst_y });
    }

    Ok(MosV2 { width, height, blocks })
}

pub fn write_mos_v2(mos: &MosV2) -> Vec<u8> {
    let mut w = LeWriter::with_capacity(HEADER_SIZE as usize + mos.blocks.len() * 28);
    w.write_bytes(MOS_SIG);
    w.write_bytes(VERSION_V2);
    w.write_u32(mos.width);
    w.write_u32(mos.height);
    w.write_u32(mos.blocks.len() as u32);
    w.write_u32(HEADER_SIZE);

    for block in &mos.blocks {
        w.write_i32(block.page);
        w.write_u32(block.src_x);
        w.write_u32(block.src_y);
        w.write_u32(block.w);
        w.write_u32(block.h);
        w.write_u32(block.dst_x);
        w.write_u32(block.dst_y);
    }

    w.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_mos(width: u32, height: u32) -> MosV1 {
        let cols = grid_len(width);
        let rows = grid_len(height);
        let mut blocks = Vec::new();
        for row in 0..rows {
            for col in 0..cols {
                let (bw, bh) = block_extent(col, row, width, height);
                blocks.push(MosV1Block {
                    palette: vec![[0, 255, 0, 0]; 256],
                    indices: vec![0u8; (bw * bh) as usize],
                });
            }
        }
        MosV1 { width, height, blocks }
    }

    #[test]
    fn mos_v1_round_trips_exact_grid() {
        let mos = sample_mos(100, 100);
        let bytes = write_mos_v1(&mos);
        let parsed = parse_mos_v1(&bytes).unwrap();
        assert_eq!(parsed.width, 100);
        assert_eq!(parsed.height, 100);
        assert_eq!(parsed.cols(), 2);
        assert_eq!(parsed.rows(), 2);
        assert_eq!(parsed.block_extent(3), (36, 36));
    }

    #[test]
    fn mosc_round_trips_byte_exact() {
        let mos = sample_mos(64, 64);
        let mos_bytes = write_mos_v1(&mos);
        let mosc_bytes = wrap_mosc(&mos_bytes);
        let unwrapped = unwrap_mosc(&mosc_bytes).unwrap();
        assert_eq!(unwrapped, mos_bytes);
    }

    #[test]
    fn mos_v2_round_trips_block_records() {
        let mos = MosV2 {
            width: 100,
            height: 100,
            blocks: vec![
                MosV2Block { page: 0, src_x: 0, src_y: 0, w: 64, h: 64, dst_x: 0, dst_y: 0 },
                MosV2Block { page: 0, src_x: 64, src_y: 0, w: 36, h: 64, dst_x: 64, dst_y: 0 },
            ],
        };
        let bytes = write_mos_v2(&mos);
        let parsed = parse_mos_v2(&bytes).unwrap();
        assert_eq!(parsed.blocks.len(), 2);
        assert_eq!(parsed.blocks[1].w, 36);
    }
}

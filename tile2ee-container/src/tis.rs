//! TIS (tile sequence) container I/O (spec §6): V1 palette+index tiles and
//! V2 PVRZ-reference tiles.

use tile2ee_common::error::{err, ConvertError, ConvertResult};
use tile2ee_common::reader::LeReader;
use tile2ee_common::writer::LeWriter;

use crate::signature::{
    HEADER_SIZE, INDICES_BYTES, PALETTE_BYTES, TILE_DIM, TIS_SIG, TIS_V1_TILE_SIZE,
    TIS_V2_TILE_SIZE, VERSION_V1, VERSION_V2,
};

/// One V1 TIS tile: a 256-entry RGBA palette plus one index byte per pixel
/// of a `TILE_DIM x TILE_DIM` block.
#[derive(Debug, Clone)]
pub struct TisV1Tile {
    pub palette: Vec<[u8; 4]>,
    pub indices: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct TisV1 {
    pub tiles: Vec<TisV1Tile>,
}

/// One V2 TIS tile: a PVRZ page reference, or the fully-transparent
/// sentinel when `page < 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TisV2Tile {
    pub page: i32,
    pub x: i32,
    pub y: i32,
}

impl TisV2Tile {
    pub const fn transparent() -> Self {
        Self { page: -1, x: 0, y: 0 }
    }

    pub const fn is_transparent(self) -> bool {
        self.page < 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct TisV2 {
    pub tiles: Vec<TisV2Tile>,
}

/// The tile layout a headerless or signatured TIS file turned out to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TisKind {
    V1,
    V2,
}

fn detect_headerless(len: usize) -> ConvertResult<TisKind> {
    // Ambiguous only for sizes divisible by both record sizes (spec §9
    // "Open questions"); the smallest such size is 0, which we reject by
    // requiring at least one tile.
    let fits_v1 = len % TIS_V1_TILE_SIZE == 0 && len / TIS_V1_TILE_SIZE >= 1;
    let fits_v2 = len % TIS_V2_TILE_SIZE == 0 && len / TIS_V2_TILE_SIZE >= 1;
    if fits_v1 {
        Ok(TisKind::V1)
    } else if fits_v2 {
        Ok(TisKind::V2)
    } else {
        err!(ConvertError::BadDimension {
            what: "headerless TIS size is not a multiple of either tile record size",
            value: len as i64,
        })
    }
}

/// Parses a TIS file (signatured or headerless) into its V1 body.
pub fn parse_tis_v1(data: &[u8]) -> ConvertResult<TisV1> {
    let body = strip_header(data, TisKind::V1)?;
    let mut reader = LeReader::new(body);
    let mut tiles = Vec::new();

    while !reader.at_end() {
        let palette_bytes = reader
            .read_bytes(PALETTE_BYTES)
            .ok_or(ConvertError::Truncated { what: "TIS V1 tile palette" })?;
        let indices = reader
            .read_bytes(INDICES_BYTES)
            .ok_or(ConvertError::Truncated { what: "TIS V1 tile indices" })?
            .to_vec();

        let palette = palette_bytes
            .chunks_exact(4)
            .map(|c| [c[0], c[1], c[2], c[3]])
            .collect();

        tiles.push(TisV1Tile { palette, indices });
    }

    Ok(TisV1 { tiles })
}

/// Serializes a TIS V1 body, with the canonical 24-byte signatured header.
pub fn write_tis_v1(tis: &TisV1) -> Vec<u8> {
    let mut w = LeWriter::with_capacity(HEADER_SIZE as usize + tis.tiles.len() * TIS_V1_TILE_SIZE);
    w.write_bytes(TIS_SIG);
    w.write_bytes(VERSION_V1);
    w.write_u32(tis.tiles.len() as u32);
    w.write_u32(TIS_V1_TILE_SIZE as u32);
    w.write_u32(HEADER_SIZE);
    w.write_u32(TILE_DIM);

    for tile in &tis.tiles {
        for px in &tile.palette {
            w.write_bytes(px);
        }
        w.write_bytes(&tile.indices);
    }

    w.into_bytes()
}

/// Parses a TIS file (signatured or headerless) into its V2 body.
pub fn parse_tis_v2(data: &[u8]) -> ConvertResult<TisV2> {
    let body = strip_header(data, TisKind::V2)?;
    let mut reader = LeReader::new(body);
    let mut tiles = Vec::new();

    while !reader.at_end() {
        let page = reader.read_i32().ok_or(ConvertError::Truncated { what: "TIS V2 tile page" })?;
        let x = reader.read_i32().ok_or(ConvertError::Truncated { what: "TIS V2 tile x" })?;
        let y = reader.read_i32().ok_or(ConvertError::Truncated { what: "TIS V2 tile y" })?;
        tiles.push(TisV2Tile { page, x, y });
    }

    Ok(TisV2 { tiles })
}

/// Serializes a TIS V2 body. The version field is written as `"V1  "` --
/// intentional, preserved for bit-for-bit compatibility with downstream
/// tools that expect the legacy version tag regardless of tile layout
/// (spec §6, §9).
pub fn write_tis_v2(tis: &TisV2) -> Vec<u8> {
    let mut w = LeWriter::with_capacity(HEADER_SIZE as usize + tis.tiles.len() * TIS_V2_TILE_SIZE);
    w.write_bytes(TIS_SIG);
    w.write_bytes(VERSION_V1);
    w.write_u32(tis.tiles.len() as u32);
    w.write_u32(TIS_V2_TILE_SIZE as u32);
    w.write_u32(HEADER_SIZE);
    w.write_u32(TILE_DIM);

    for tile in &tis.tiles {
        w.write_i32(tile.page);
        w.write_i32(tile.x);
        w.write_i32(tile.y);
    }

    w.into_bytes()
}

/// Strips a recognized header, or accepts a headerless body whose size
/// matches `expect`'s record size.
fn strip_header(data: &[u8], expect: TisKind) -> ConvertResult<&[u8]> {
    if data.len() >= HEADER_SIZE as usize && &data[0..4] == TIS_SIG {
        let version = &data[4..8];
        if version != VERSION_V1 && version != VERSION_V2 {
            return Err(ConvertError::UnsupportedVersion {
                found: version.try_into().unwrap(),
            });
        }
        if version == VERSION_V2 {
            log::warn!("TIS file declares version V2 directly; accepting with a warning");
        }

        let mut reader = LeReader::new(data);
        reader.seek_abs(8).unwrap();
        let num_tiles = reader.read_u32().ok_or(ConvertError::Truncated { what: "TIS header numTiles" })?;
        let tile_size = reader.read_u32().ok_or(ConvertError::Truncated { what: "TIS header tileSize" })?;
        let header_size = reader.read_u32().ok_or(ConvertError::Truncated { what: "TIS header headerSize" })?;
        let _tile_dim = reader.read_u32().ok_or(ConvertError::Truncated { what: "TIS header tileDim" })?;

        let want_tile_size = match expect {
            TisKind::V1 => TIS_V1_TILE_SIZE as u32,
            TisKind::V2 => TIS_V2_TILE_SIZE as u32,
        };
        if tile_size != want_tile_size {
            return Err(ConvertError::BadDimension {
                what: "TIS header tileSize does not match expected record layout",
                value: tile_size as i64,
            });
        }

        let body_start = header_size as usize;
        let expected_len = body_start + num_tiles as usize * tile_size as usize;
        if data.len() < expected_len {
            return Err(ConvertError::Truncated { what: "TIS tile body" });
        }
        Ok(&data[body_start..expected_len])
    } else {
        let kind = detect_headerless(data.len())?;
        if kind != expect {
            return Err(ConvertError::BadDimension {
                what: "headerless TIS size matches the other tile layout",
                value: data.len() as i64,
            });
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tile() -> TisV1Tile {
        let mut palette = vec![[0u8, 255, 0, 0]; 256];
        palette[1] = [10, 20, 30, 255];
        TisV1Tile {
            palette,
            indices: vec![0u8; INDICES_BYTES],
        }
    }

    #[test]
    fn tis_v1_round_trips_through_signatured_header() {
        let tis = TisV1 { tiles: vec![sample_tile(), sample_tile()] };
        let bytes = write_tis_v1(&tis);
        let parsed = parse_tis_v1(&bytes).unwrap();
        assert_eq!(parsed.tiles.len(), 2);
        assert_eq!(parsed.tiles[0].palette[1], [10, 20, 30, 255]);
    }

    #[test]
    fn tis_v1_accepts_headerless_body() {
        let tis = TisV1 { tiles: vec![sample_tile()] };
        let bytes = write_tis_v1(&tis);
        let headerless = &bytes[HEADER_SIZE as usize..];
        let parsed = parse_tis_v1(headerless).unwrap();
        assert_eq!(parsed.tiles.len(), 1);
    }

    #[test]
    fn tis_v2_writer_emits_v1_version_tag() {
        let tis = TisV2 { tiles: vec![TisV2Tile::transparent()] };
        let bytes = write_tis_v2(&tis);
        assert_eq!(&bytes[4..8], VERSION_V1);
    }

    #[test]
    fn tis_v2_round_trips_transparent_sentinel() {
        let tis = TisV2 { tiles: vec![TisV2Tile::transparent(), TisV2Tile { page: 3, x: 64, y: 0 }] };
        let bytes = write_tis_v2(&tis);
        let parsed = parse_tis_v2(&bytes).unwrap();
        assert!(parsed.tiles[0].is_transparent());
        assert_eq!(parsed.tiles[1], TisV2Tile { page: 3, x: 64, y: 0 });
    }

    #[test]
    fn truncated_tis_is_rejected() {
        let tis = TisV1 { tiles: vec![sample_tile()] };
        let mut bytes = write_tis_v1(&tis);
        bytes.truncate(bytes.len() - 10);
        assert!(parse_tis_v1(&bytes).is_err());
    }
}

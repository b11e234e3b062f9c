//! TIS V1 -> V2: decode each palette/index tile, pack non-empty tiles
//! into 1024x1024 pages, encode the pages as BC1 PVRZ, emit per-tile
//! metadata records (spec §4.8 "TIS V1 -> V2").

use std::fs;
use std::path::Path;

use tile2ee_bcn::{bcn, quantize, ColorFormat, Encoding, Quality, Texture};
use tile2ee_common::error::{bail, ConvertError, ConvertResult};
use tile2ee_common::Rect;
use tile2ee_container::{naming, pvrz, tis};
use tile2ee_pack::{Bin, HeuristicRule};

use crate::options::Options;
use crate::pool::TilePool;

use super::{allocate_pvrz_path, delete_partial_output, guard_same_path};

const PAGE_DIM: i32 = 1024;
const TILE_DIM: i32 = 64;

struct DecodedTile {
    pixels: Vec<u8>,
}

/// A page under construction: its bin packer plus the backing texture
/// it is drawn into, and the pre-shrink placements of every tile it
/// holds (needed to re-crop the texture after `shrink_to_fit` without
/// trusting the bin's internal used-rect ordering).
struct Page {
    bin: Bin,
    texture: Texture,
    placements: Vec<(usize, Rect)>,
}

pub fn convert(input: &Path, output: &Path, options: &Options) -> ConvertResult<()> {
    guard_same_path(input, output)?;

    let data = fs::read(input).map_err(|_| ConvertError::NotFound(input.to_path_buf()))?;
    let source = tis::parse_tis_v1(&data)?;

    let decoded = decode_tiles(&source, options)?;

    let mut pages: Vec<Page> = Vec::new();
    let mut page_for_tile: Vec<Option<usize>> = vec![None; source.tiles.len()];
    let mut metadata = vec![tis::TisV2Tile::transparent(); source.tiles.len()];

    for (tile_index, pixels) in decoded.into_iter().enumerate() {
        let Some(pixels) = pixels else { continue };

        let mut target = None;
        for (page_idx, page) in pages.iter_mut().enumerate() {
            let rect = page.bin.insert(TILE_DIM, TILE_DIM, HeuristicRule::BestShortSideFit);
            if rect.is_placed() {
                target = Some((page_idx, rect));
                break;
            }
        }
        let (page_idx, rect) = match target {
            Some(found) => found,
            None => {
                let mut bin = Bin::new(PAGE_DIM, PAGE_DIM);
                let rect = bin.insert(TILE_DIM, TILE_DIM, HeuristicRule::BestShortSideFit);
                if !rect.is_placed() {
                    bail!(ConvertError::EncodeFailed);
                }
                let texture = Texture::init(PAGE_DIM as usize, PAGE_DIM as usize, Encoding::Bc1, ColorFormat::Rgba, 0);
                pages.push(Page { bin, texture, placements: Vec::new() });
                (pages.len() - 1, rect)
            }
        };

        let page = &mut pages[page_idx];
        page.texture
            .set_block(rect.x as usize, rect.y as usize, TILE_DIM as usize, TILE_DIM as usize, &pixels)?;
        page.placements.push((tile_index, rect));
        page_for_tile[tile_index] = Some(page_idx);
    }

    let mut next_pvrz_index = options.tis_pvrz_start;
    let mut assigned_index = Vec::with_capacity(pages.len());

    for page in &mut pages {
        page.bin.shrink_to_fit(true);

        let min_x = page.placements.iter().map(|(_, r)| r.x).min().unwrap_or(0);
        let min_y = page.placements.iter().map(|(_, r)| r.y).min().unwrap_or(0);

        for (tile_index, rect) in &page.placements {
            metadata[*tile_index] = tis::TisV2Tile {
                page: 0, // patched to the real PVRZ index below
                x: rect.x - min_x,
                y: rect.y - min_y,
            };
        }

        let cropped = page
            .texture
            .get_block(min_x as usize, min_y as usize, page.bin.width() as usize, page.bin.height() as usize)?;
        let encoded = bcn::encode_image(
            &cropped,
            page.bin.width() as usize,
            page.bin.height() as usize,
            Encoding::Bc1,
            Quality::new(options.quality_v2),
        );

        let (index, path) = allocate_pvrz_path(&mut next_pvrz_index, options.overwrite_pvrz, |i| {
            naming::generate_tis_pvrz_name(input, i)
        })?;
        assigned_index.push(index);

        let pvrz_page = pvrz::PvrzPage {
            pixel_format: Encoding::Bc1.pvr_pixel_format(),
            width: page.bin.width() as u32,
            height: page.bin.height() as u32,
            data: encoded,
        };
        let bytes = pvrz::save_pvrz(&pvrz_page)?;
        fs::write(&path, bytes).map_err(|e| ConvertError::IoWrite(path.clone(), e.to_string()))?;
    }

    for (tile_index, maybe_page) in page_for_tile.iter().enumerate() {
        if let Some(page_idx) = maybe_page {
            metadata[tile_index].page = assigned_index[*page_idx] as i32;
        }
    }

    let result = tis::write_tis_v2(&tis::TisV2 { tiles: metadata });
    if let Err(e) = fs::write(output, &result) {
        delete_partial_output(output);
        return Err(ConvertError::IoWrite(output.to_path_buf(), e.to_string()));
    }

    Ok(())
}

/// Decodes every tile to 32bpp RGBA through the pool, returning `None` for
/// tiles whose decoded color is exactly black RGB after sentinel
/// substitution (spec §4.8 "Empty-tile optimization").
fn decode_tiles(source: &tis::TisV1, options: &Options) -> ConvertResult<Vec<Option<Vec<u8>>>> {
    let pool: TilePool<ConvertResult<DecodedTile>> =
        TilePool::new(options.resolved_thread_count(), options.queue_capacity);

    for (index, tile) in source.tiles.iter().enumerate() {
        let palette = tile.palette.clone();
        let indices = tile.indices.clone();
        pool.submit(index as u64, move || {
            let mut pixels = quantize::expand(&palette, &indices);
            // Sentinel substitution: the quantizer's transparent index
            // decodes to the (0,255,0) sentinel so it stays visually
            // distinct during editing, but every alpha=0 pixel's RGB is
            // zeroed here before the emptiness check and before it can
            // ever reach the encoder.
            for px in pixels.chunks_exact_mut(4) {
                if px[3] == 0 {
                    px[0] = 0;
                    px[1] = 0;
                    px[2] = 0;
                }
            }
            Ok(DecodedTile { pixels })
        });
    }

    let mut decoded: Vec<Option<Vec<u8>>> = vec![None; source.tiles.len()];
    for _ in 0..source.tiles.len() {
        let (idx, result) = pool.recv_any();
        let tile = result?;
        let is_empty = tile.pixels.chunks_exact(4).all(|p| p[0] == 0 && p[1] == 0 && p[2] == 0);
        decoded[idx as usize] = if is_empty { None } else { Some(tile.pixels) };
    }

    Ok(decoded)
}

//! MOS V1 -> V2: decode every block to 32bpp, pack each into 1024x1024
//! pages, encode the pages as BC1 PVRZ, emit per-block placement records
//! (spec §4.8 "MOS V1 -> V2").

use std::fs;
use std::path::Path;

use tile2ee_bcn::{bcn, quantize, ColorFormat, Encoding, Quality, Texture};
use tile2ee_common::error::{bail, ConvertError, ConvertResult};
use tile2ee_common::Rect;
use tile2ee_container::{mos, naming, pvrz};
use tile2ee_pack::{Bin, HeuristicRule};

use crate::options::Options;
use crate::pool::TilePool;

use super::{allocate_pvrz_path, delete_partial_output, guard_same_path};

const PAGE_DIM: i32 = 1024;
const TILE_DIM: i32 = 64;

struct DecodedBlock {
    bw: i32,
    bh: i32,
    pixels: Vec<u8>,
}

struct Page {
    bin: Bin,
    texture: Texture,
    /// `(block_index, src_rect_on_page, block_width, block_height)`.
    placements: Vec<(usize, Rect, i32, i32)>,
}

pub fn convert(input: &Path, output: &Path, options: &Options) -> ConvertResult<()> {
    guard_same_path(input, output)?;

    let data = fs::read(input).map_err(|_| ConvertError::NotFound(input.to_path_buf()))?;
    let mos_bytes = if data.starts_with(b"MOSC") { mos::unwrap_mosc(&data)? } else { data };
    let source = mos::parse_mos_v1(&mos_bytes)?;
    let cols = source.cols();

    let decoded = decode_blocks(&source, options)?;

    let mut pages: Vec<Page> = Vec::new();
    let mut records = vec![
        mos::MosV2Block { page: 0, src_x: 0, src_y: 0, w: 0, h: 0, dst_x: 0, dst_y: 0 };
        source.blocks.len()
    ];

    for (block_index, block) in decoded.into_iter().enumerate() {
        let DecodedBlock { bw, bh, pixels } = block;

        let mut target = None;
        for (page_idx, page) in pages.iter_mut().enumerate() {
            let rect = page.bin.insert(bw, bh, HeuristicRule::BestShortSideFit);
            if rect.is_placed() {
                target = Some((page_idx, rect));
                break;
            }
        }
        let (page_idx, rect) = match target {
            Some(found) => found,
            None => {
                let mut bin = Bin::new(PAGE_DIM, PAGE_DIM);
                let rect = bin.insert(bw, bh, HeuristicRule::BestShortSideFit);
                if !rect.is_placed() {
                    bail!(ConvertError::EncodeFailed);
                }
                let texture = Texture::init(PAGE_DIM as usize, PAGE_DIM as usize, Encoding::Bc1, ColorFormat::Rgba, 0);
                pages.push(Page { bin, texture, placements: Vec::new() });
                (pages.len() - 1, rect)
            }
        };

        let page = &mut pages[page_idx];
        page.texture.set_block(rect.x as usize, rect.y as usize, bw as usize, bh as usize, &pixels)?;
        page.placements.push((block_index, rect, bw, bh));

        let col = block_index as i32 % cols as i32;
        let row = block_index as i32 / cols as i32;
        records[block_index] = mos::MosV2Block {
            page: 0, // patched once the page's final PVRZ index is assigned
            src_x: 0,
            src_y: 0,
            w: bw as u32,
            h: bh as u32,
            dst_x: (col * TILE_DIM) as u32,
            dst_y: (row * TILE_DIM) as u32,
        };
    }

    let mut next_pvrz_index = options.mos_pvrz_start;

    for page in &mut pages {
        page.bin.shrink_to_fit(true);

        let min_x = page.placements.iter().map(|(_, r, _, _)| r.x).min().unwrap_or(0);
        let min_y = page.placements.iter().map(|(_, r, _, _)| r.y).min().unwrap_or(0);

        for (block_index, rect, bw, bh) in &page.placements {
            records[*block_index].src_x = (rect.x - min_x) as u32;
            records[*block_index].src_y = (rect.y - min_y) as u32;
            records[*block_index].w = *bw as u32;
            records[*block_index].h = *bh as u32;
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
            naming::generate_mos_pvrz_name(input, i)
        })?;

        for (block_index, _, _, _) in &page.placements {
            records[*block_index].page = index as i32;
        }

        let pvrz_page = pvrz::PvrzPage {
            pixel_format: Encoding::Bc1.pvr_pixel_format(),
            width: page.bin.width() as u32,
            height: page.bin.height() as u32,
            data: encoded,
        };
        let bytes = pvrz::save_pvrz(&pvrz_page)?;
        fs::write(&path, bytes).map_err(|e| ConvertError::IoWrite(path.clone(), e.to_string()))?;
    }

    let result = tile2ee_container::mos::write_mos_v2(&mos::MosV2 {
        width: source.width,
        height: source.height,
        blocks: records,
    });
    if let Err(e) = fs::write(output, &result) {
        delete_partial_output(output);
        return Err(ConvertError::IoWrite(output.to_path_buf(), e.to_string()));
    }

    Ok(())
}

fn decode_blocks(source: &mos::MosV1, options: &Options) -> ConvertResult<Vec<DecodedBlock>> {
    let pool: TilePool<ConvertResult<DecodedBlock>> =
        TilePool::new(options.resolved_thread_count(), options.queue_capacity);

    for (index, block) in source.blocks.iter().enumerate() {
        let (bw, bh) = source.block_extent(index);
        let palette = block.palette.clone();
        let indices = block.indices.clone();
        pool.submit(index as u64, move || {
            let pixels = quantize::expand(&palette, &indices);
            Ok(DecodedBlock { bw: bw as i32, bh: bh as i32, pixels })
        });
    }

    let mut decoded: Vec<Option<DecodedBlock>> = (0..source.blocks.len()).map(|_| None).collect();
    for _ in 0..source.blocks.len() {
        let (idx, result) = pool.recv_any();
        decoded[idx as usize] = Some(result?);
    }

    Ok(decoded.into_iter().map(|d| d.expect("every index was submitted exactly once")).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_source(width: u32, height: u32) -> mos::MosV1 {
        let cols = (width + 63) / 64;
        let rows = (height + 63) / 64;
        let mut blocks = Vec::new();
        for row in 0..rows {
            for col in 0..cols {
                let bw = width.saturating_sub(col * 64).min(64);
                let bh = height.saturating_sub(row * 64).min(64);
                blocks.push(mos::MosV1Block {
                    palette: vec![[10, 20, 30, 255]; 256],
                    indices: vec![0u8; (bw * bh) as usize],
                });
            }
        }
        mos::MosV1 { width, height, blocks }
    }

    #[test]
    fn decode_blocks_preserves_edge_block_extents() {
        let source = sample_source(100, 100);
        let decoded = decode_blocks(&source, &Options::default()).unwrap();
        assert_eq!(decoded.len(), 4);
        assert_eq!((decoded[3].bw, decoded[3].bh), (36, 36));
    }
}

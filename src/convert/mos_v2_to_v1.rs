//! MOS V2 -> V1: composite every PVRZ-referenced block onto a logical
//! `W x H` surface, then re-slice that surface into the V1 block grid and
//! quantize each block back to palette+indices (spec §4.8 "MOS V2 -> V1").

use std::fs;
use std::path::Path;

use tile2ee_bcn::{bcn, quantize, ColorFormat, Encoding, Texture};
use tile2ee_common::error::{ConvertError, ConvertResult};
use tile2ee_container::{mos, naming, pvrz};

use crate::options::Options;
use crate::pool::TilePool;
use crate::tile_data::PageCache;

use super::{delete_partial_output, guard_same_path};

const TILE_DIM: u32 = 64;

struct DecodedPage {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

fn load_page(input: &Path, page: u32) -> ConvertResult<DecodedPage> {
    let path = naming::generate_mos_pvrz_name(input, page).ok_or(ConvertError::PvrzIndexOverflow { index: page as u64 })?;
    let bytes = fs::read(&path).map_err(|_| ConvertError::NotFound(path.clone()))?;
    let pvrz_page = pvrz::load_pvrz(&bytes)?;
    let encoding = Encoding::from_pvr_pixel_format(pvrz_page.pixel_format).ok_or(ConvertError::UnsupportedVersion {
        found: pvrz_page.pixel_format.to_le_bytes(),
    })?;
    let pixels = bcn::decode_image(&pvrz_page.data, pvrz_page.width as usize, pvrz_page.height as usize, encoding);
    Ok(DecodedPage {
        width: pvrz_page.width as usize,
        height: pvrz_page.height as usize,
        pixels,
    })
}

fn grid_len(len: u32) -> u32 {
    (len + TILE_DIM - 1) / TILE_DIM
}

pub fn convert(input: &Path, output: &Path, options: &Options) -> ConvertResult<()> {
    guard_same_path(input, output)?;

    let data = fs::read(input).map_err(|_| ConvertError::NotFound(input.to_path_buf()))?;
    let source = mos::parse_mos_v2(&data)?;

    let mut surface = Texture::init(source.width as usize, source.height as usize, Encoding::Bc1, ColorFormat::Rgba, 0);
    let mut page_cache: PageCache<ConvertResult<DecodedPage>> = PageCache::new();

    for record in &source.blocks {
        let page = page_cache.get_or_load(record.page as u32, |p| load_page(input, p));
        let page = match page.as_ref() {
            Ok(page) => page,
            Err(e) => {
                delete_partial_output(output);
                return Err(e.clone());
            }
        };

        let mut block_pixels = Vec::with_capacity((record.w * record.h * 4) as usize);
        for row in 0..record.h as usize {
            let offset = ((record.src_y as usize + row) * page.width + record.src_x as usize) * 4;
            block_pixels.extend_from_slice(&page.pixels[offset..offset + record.w as usize * 4]);
        }
        surface.set_block(
            record.dst_x as usize,
            record.dst_y as usize,
            record.w as usize,
            record.h as usize,
            &block_pixels,
        )?;
    }

    let cols = grid_len(source.width);
    let rows = grid_len(source.height);
    let num_blocks = (cols * rows) as usize;

    let pool: TilePool<ConvertResult<quantize::Quantized>> =
        TilePool::new(options.resolved_thread_count(), options.queue_capacity);
    let quality_v1 = options.quality_v1 as u32;

    for index in 0..num_blocks {
        let col = index as u32 % cols;
        let row = index as u32 / cols;
        let bw = source.width.saturating_sub(col * TILE_DIM).min(TILE_DIM);
        let bh = source.height.saturating_sub(row * TILE_DIM).min(TILE_DIM);
        let block_pixels = surface.get_block((col * TILE_DIM) as usize, (row * TILE_DIM) as usize, bw as usize, bh as usize)?;
        pool.submit(index as u64, move || Ok(quantize::quantize(&block_pixels, quality_v1)));
    }

    let mut blocks = Vec::with_capacity(num_blocks);
    for next_expected in 0..num_blocks as u64 {
        let (_, result) = pool.recv_in_order(next_expected);
        let quantized = match result {
            Ok(q) => q,
            Err(e) => {
                delete_partial_output(output);
                return Err(e);
            }
        };
        blocks.push(mos::MosV1Block { palette: quantized.palette, indices: quantized.indices });
    }

    let mos_v1 = mos::MosV1 { width: source.width, height: source.height, blocks };
    let mos_bytes = mos::write_mos_v1(&mos_v1);
    let final_bytes = if options.use_mosc { mos::wrap_mosc(&mos_bytes) } else { mos_bytes };

    if let Err(e) = fs::write(output, &final_bytes) {
        delete_partial_output(output);
        return Err(ConvertError::IoWrite(output.to_path_buf(), e.to_string()));
    }

    Ok(())
}

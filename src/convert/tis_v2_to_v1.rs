//! TIS V2 -> V1: resolve each tile's `(page, x, y)` against its PVRZ page
//! (synthesizing opaque black for the transparent sentinel), quantize
//! back to palette+indices, and write tiles in index order (spec §4.8
//! "TIS V2 -> V1").

use std::fs;
use std::path::Path;

use tile2ee_bcn::{bcn, quantize, Encoding};
use tile2ee_common::error::{ConvertError, ConvertResult};
use tile2ee_container::{naming, pvrz, tis};

use crate::options::Options;
use crate::pool::TilePool;
use crate::tile_data::PageCache;

use super::{delete_partial_output, guard_same_path};

const TILE_DIM: usize = 64;

struct DecodedPage {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

fn load_page(input: &Path, page: u32) -> ConvertResult<DecodedPage> {
    let path = naming::generate_tis_pvrz_name(input, page).ok_or(ConvertError::PvrzIndexOverflow { index: page as u64 })?;
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

fn extract_tile(page: &DecodedPage, x: usize, y: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(TILE_DIM * TILE_DIM * 4);
    for row in 0..TILE_DIM {
        let offset = ((y + row) * page.width + x) * 4;
        out.extend_from_slice(&page.pixels[offset..offset + TILE_DIM * 4]);
    }
    out
}

fn opaque_black_tile() -> Vec<u8> {
    let mut out = Vec::with_capacity(TILE_DIM * TILE_DIM * 4);
    for _ in 0..(TILE_DIM * TILE_DIM) {
        out.extend_from_slice(&[0, 0, 0, 255]);
    }
    out
}

pub fn convert(input: &Path, output: &Path, options: &Options) -> ConvertResult<()> {
    guard_same_path(input, output)?;

    let data = fs::read(input).map_err(|_| ConvertError::NotFound(input.to_path_buf()))?;
    let source = tis::parse_tis_v2(&data)?;

    let pool: TilePool<ConvertResult<quantize::Quantized>> =
        TilePool::new(options.resolved_thread_count(), options.queue_capacity);

    let mut page_cache: PageCache<ConvertResult<DecodedPage>> = PageCache::new();
    let quality_v1 = options.quality_v1 as u32;

    for (index, tile) in source.tiles.iter().enumerate() {
        let pixels = if tile.is_transparent() {
            opaque_black_tile()
        } else {
            let page = page_cache.get_or_load(tile.page as u32, |p| load_page(input, p));
            let page = match page.as_ref() {
                Ok(page) => page,
                Err(e) => {
                    delete_partial_output(output);
                    return Err(e.clone());
                }
            };
            extract_tile(page, tile.x as usize, tile.y as usize)
        };

        pool.submit(index as u64, move || Ok(quantize::quantize(&pixels, quality_v1)));
    }

    let mut w = tile2ee_common::writer::LeWriter::with_capacity(24 + source.tiles.len() * tile2ee_container::signature::TIS_V1_TILE_SIZE);
    w.write_bytes(tile2ee_container::signature::TIS_SIG);
    w.write_bytes(tile2ee_container::signature::VERSION_V1);
    w.write_u32(source.tiles.len() as u32);
    w.write_u32(tile2ee_container::signature::TIS_V1_TILE_SIZE as u32);
    w.write_u32(tile2ee_container::signature::HEADER_SIZE);
    w.write_u32(tile2ee_container::signature::TILE_DIM);

    for next_expected in 0..source.tiles.len() as u64 {
        let (_, result) = pool.recv_in_order(next_expected);
        let quantized = match result {
            Ok(q) => q,
            Err(e) => {
                delete_partial_output(output);
                return Err(e);
            }
        };
        for px in &quantized.palette {
            w.write_bytes(px);
        }
        w.write_bytes(&quantized.indices);
    }

    if let Err(e) = fs::write(output, w.into_bytes()) {
        delete_partial_output(output);
        return Err(ConvertError::IoWrite(output.to_path_buf(), e.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_black_tile_has_correct_pixel_count() {
        let tile = opaque_black_tile();
        assert_eq!(tile.len(), 64 * 64 * 4);
        assert_eq!(&tile[0..4], &[0, 0, 0, 255]);
    }

    #[test]
    fn extract_tile_reads_correct_subrect() {
        let width = 128;
        let height = 64;
        let mut pixels = vec![0u8; width * height * 4];
        for row in 0..64 {
            let offset = (row * width + 64) * 4;
            for col in 0..64 {
                pixels[offset + col * 4] = 200;
            }
        }
        let page = DecodedPage { width, height, pixels };
        let tile = extract_tile(&page, 64, 0);
        assert_eq!(tile[0], 200);
    }
}

//! The 32bpp RGBA atlas surface (spec §4.6), carrying the encoding/color
//! format/page index needed to round-trip through PVRZ.

use crate::format::{ColorFormat, Encoding};
use tile2ee_common::{ConvertError, ConvertResult};

/// A contiguous 32bpp RGBA surface plus the metadata needed to place it on
/// a PVRZ page.
pub struct Texture {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
    encoding: Encoding,
    color_format: ColorFormat,
    index: u32,
}

impl Texture {
    /// Allocates a `w x h` surface filled with the format's empty pixel
    /// (spec §4.6 "init").
    pub fn init(w: usize, h: usize, encoding: Encoding, color_format: ColorFormat, index: u32) -> Self {
        let empty = color_format.empty_pixel();
        let mut pixels = Vec::with_capacity(w * h * 4);
        for _ in 0..(w * h) {
            pixels.extend_from_slice(&empty);
        }
        Self {
            width: w,
            height: h,
            pixels,
            encoding,
            color_format,
            index,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn color_format(&self) -> ColorFormat {
        self.color_format
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn set_index(&mut self, index: u32) {
        self.index = index;
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    fn check_rect(&self, x: usize, y: usize, w: usize, h: usize) -> ConvertResult<()> {
        if x + w > self.width || y + h > self.height {
            return Err(ConvertError::BadDimension {
                what: "texture sub-rectangle escapes surface bounds",
                value: ((x + w).max(y + h)) as i64,
            });
        }
        Ok(())
    }

    /// Copies a `w x h` sub-rectangle starting at `(x, y)` out as a run of
    /// RGBA8 pixels (spec §4.6 "getBlock").
    pub fn get_block(&self, x: usize, y: usize, w: usize, h: usize) -> ConvertResult<Vec<u8>> {
        self.check_rect(x, y, w, h)?;
        let mut out = Vec::with_capacity(w * h * 4);
        for row in 0..h {
            let offset = ((y + row) * self.width + x) * 4;
            out.extend_from_slice(&self.pixels[offset..offset + w * 4]);
        }
        Ok(out)
    }

    /// Writes a `w x h` run of RGBA8 pixels into the sub-rectangle at
    /// `(x, y)` (spec §4.6 "setBlock").
    pub fn set_block(&mut self, x: usize, y: usize, w: usize, h: usize, bytes: &[u8]) -> ConvertResult<()> {
        self.check_rect(x, y, w, h)?;
        if bytes.len() != w * h * 4 {
            return Err(ConvertError::BadDimension {
                what: "setBlock byte count does not match w*h*4",
                value: bytes.len() as i64,
            });
        }
        let width = self.width;
        for row in 0..h {
            let offset = ((y + row) * width + x) * 4;
            let src = &bytes[row * w * 4..(row + 1) * w * 4];
            self.pixels[offset..offset + w * 4].copy_from_slice(src);
        }
        Ok(())
    }

    /// Reallocates to `(nw, nh)`, preserving the top-left
    /// `min(oldW,nw) x min(oldH,nh)` region (spec §4.6 "resize").
    pub fn resize(&mut self, nw: usize, nh: usize) {
        let empty = self.color_format.empty_pixel();
        let mut next = Vec::with_capacity(nw * nh * 4);
        for _ in 0..(nw * nh) {
            next.extend_from_slice(&empty);
        }

        let copy_w = self.width.min(nw);
        let copy_h = self.height.min(nh);
        for row in 0..copy_h {
            let src_offset = (row * self.width) * 4;
            let dst_offset = (row * nw) * 4;
            next[dst_offset..dst_offset + copy_w * 4]
                .copy_from_slice(&self.pixels[src_offset..src_offset + copy_w * 4]);
        }

        self.pixels = next;
        self.width = nw;
        self.height = nh;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_block_round_trips() {
        let mut tex = Texture::init(8, 8, Encoding::Bc1, ColorFormat::Rgba, 0);
        let block = vec![1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];
        tex.set_block(2, 2, 2, 2, &block).unwrap();
        let read_back = tex.get_block(2, 2, 2, 2).unwrap();
        assert_eq!(read_back, block);
    }

    #[test]
    fn get_block_rejects_out_of_bounds() {
        let tex = Texture::init(4, 4, Encoding::Bc1, ColorFormat::Rgba, 0);
        assert!(tex.get_block(3, 3, 2, 2).is_err());
    }

    #[test]
    fn resize_preserves_overlapping_region() {
        let mut tex = Texture::init(4, 4, Encoding::Bc1, ColorFormat::Rgba, 0);
        let block = vec![9u8; 4 * 4 * 4];
        tex.set_block(0, 0, 4, 4, &block).unwrap();
        tex.resize(8, 2);
        let preserved = tex.get_block(0, 0, 4, 2).unwrap();
        assert_eq!(preserved, vec![9u8; 4 * 2 * 4]);
    }

    #[test]
    fn resize_fills_new_area_with_empty_pixel() {
        let mut tex = Texture::init(2, 2, Encoding::Bc1, ColorFormat::Rgba, 0);
        tex.resize(4, 4);
        let corner = tex.get_block(3, 3, 1, 1).unwrap();
        assert_eq!(corner, ColorFormat::Rgba.empty_pixel().to_vec());
    }

    #[test]
    fn init_fills_argb_with_opaque_black() {
        let tex = Texture::init(2, 2, Encoding::Bc1, ColorFormat::Argb, 0);
        let px = tex.get_block(0, 0, 1, 1).unwrap();
        assert_eq!(px, ColorFormat::Argb.empty_pixel().to_vec());
    }
}

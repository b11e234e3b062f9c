//! BC1/BC2/BC3 (DXT1/3/5) block codec (spec §4.4), operating on 4x4 blocks
//! of RGBA8 pixels in canonical `(r, g, b, a)` order.
//!
//! The original tool (`examples/original_source/.../ConverterDxt.hpp`)
//! delegates encoding to `libsquish`; no such crate exists in the example
//! pack, so the cluster/range-fit endpoint search it describes is
//! implemented directly here, selected by the same quality knob (spec
//! §4.4 "Encoder").

use crate::format::Encoding;

/// Encoder quality, `0..=9` as in spec §4.4. Clamped on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    pub fn new(v: u8) -> Self {
        Self(v.min(9))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// "weight color by alpha" applies at quality 5..=9.
    fn weight_by_alpha(self) -> bool {
        self.0 >= 5
    }

    /// Number of refinement passes performed after the initial range fit.
    /// 0 at quality 0..=2 (pure range fit), growing through cluster fit.
    fn refine_passes(self) -> u32 {
        match self.0 {
            0..=2 => 0,
            3..=6 => 2,
            _ => 6,
        }
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::new(9)
    }
}

type Rgba = [u8; 4];

/// Expands a 5-bit or 6-bit channel to 8 bits by replicating the high bits
/// (spec §4.4 "Channel expansion").
fn expand5(v: u16) -> u8 {
    ((v << 3) | (v >> 2)) as u8
}

fn expand6(v: u16) -> u8 {
    ((v << 2) | (v >> 4)) as u8
}

fn rgb565_to_rgb888(c: u16) -> (u8, u8, u8) {
    let r = (c >> 11) & 0x1f;
    let g = (c >> 5) & 0x3f;
    let b = c & 0x1f;
    (expand5(r), expand6(g), expand5(b))
}

fn rgb888_to_rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 >> 3) << 11) | ((g as u16 >> 2) << 5) | (b as u16 >> 3)
}

fn lerp_u8(a: u8, b: u8, num: u16, den: u16) -> u8 {
    ((a as u16 * (den - num) + b as u16 * num) / den) as u8
}

fn lerp_rgb(a: (u8, u8, u8), b: (u8, u8, u8), num: u16, den: u16) -> (u8, u8, u8) {
    (
        lerp_u8(a.0, b.0, num, den),
        lerp_u8(a.1, b.1, num, den),
        lerp_u8(a.2, b.2, num, den),
    )
}

/// The color palette a BC1 block selects between, plus whether it is in
/// four-color mode (spec §4.4 "BC1 block").
fn bc1_palette(c0: u16, c1: u16) -> ([(u8, u8, u8); 4], bool) {
    let rgb0 = rgb565_to_rgb888(c0);
    let rgb1 = rgb565_to_rgb888(c1);

    if c0 > c1 {
        (
            [
                rgb0,
                rgb1,
                lerp_rgb(rgb0, rgb1, 1, 3),
                lerp_rgb(rgb0, rgb1, 2, 3),
            ],
            true,
        )
    } else {
        (
            [rgb0, rgb1, lerp_rgb(rgb0, rgb1, 1, 2), (0, 0, 0)],
            false,
        )
    }
}

fn color_dist2(a: (u8, u8, u8), b: (u8, u8, u8)) -> i32 {
    let dr = a.0 as i32 - b.0 as i32;
    let dg = a.1 as i32 - b.1 as i32;
    let db = a.2 as i32 - b.2 as i32;
    dr * dr + dg * dg + db * db
}

/// Picks two RGB565 endpoints for a 16-pixel block. `transparent` marks
/// pixels that must decode through the block's "fourth" slot (BC1's
/// 1-bit-alpha three-color mode); such pixels do not participate in
/// endpoint selection.
fn choose_endpoints(
    pixels: &[Rgba; 16],
    transparent: &[bool; 16],
    quality: Quality,
) -> (u16, u16) {
    let opaque: Vec<usize> = (0..16).filter(|&i| !transparent[i]).collect();
    if opaque.is_empty() {
        return (0, 0);
    }

    let weight = |i: usize| -> f32 {
        if quality.weight_by_alpha() {
            (pixels[i][3] as f32 / 255.0).max(1.0 / 255.0)
        } else {
            1.0
        }
    };

    // Range fit: project onto the axis of greatest per-channel spread.
    let (mut rmin, mut rmax) = (255u8, 0u8);
    let (mut gmin, mut gmax) = (255u8, 0u8);
    let (mut bmin, mut bmax) = (255u8, 0u8);
    for &i in &opaque {
        let [r, g, b, _] = pixels[i];
        rmin = rmin.min(r);
        rmax = rmax.max(r);
        gmin = gmin.min(g);
        gmax = gmax.max(g);
        bmin = bmin.min(b);
        bmax = bmax.max(b);
    }
    let rspan = rmax as i32 - rmin as i32;
    let gspan = gmax as i32 - gmin as i32;
    let bspan = bmax as i32 - bmin as i32;

    let axis = if rspan >= gspan && rspan >= bspan {
        0
    } else if gspan >= bspan {
        1
    } else {
        2
    };

    let project = |px: Rgba| -> i32 {
        match axis {
            0 => px[0] as i32,
            1 => px[1] as i32,
            _ => px[2] as i32,
        }
    };

    let mut lo = opaque[0];
    let mut hi = opaque[0];
    for &i in &opaque {
        if project(pixels[i]) < project(pixels[lo]) {
            lo = i;
        }
        if project(pixels[i]) > project(pixels[hi]) {
            hi = i;
        }
    }

    let mut endpoint_a = (pixels[lo][0], pixels[lo][1], pixels[lo][2]);
    let mut endpoint_b = (pixels[hi][0], pixels[hi][1], pixels[hi][2]);

    // Cluster fit: refine by iteratively re-centering each endpoint on the
    // weighted mean of the pixels currently closer to it (a tiny k-means).
    for _ in 0..quality.refine_passes() {
        let (mut sum_a, mut sum_b) = ((0.0f32, 0.0f32, 0.0f32, 0.0f32), (0.0f32, 0.0f32, 0.0f32, 0.0f32));
        for &i in &opaque {
            let [r, g, b, _] = pixels[i];
            let w = weight(i);
            let rgb = (r, g, b);
            let (sum, _other) = if color_dist2(rgb, endpoint_a) <= color_dist2(rgb, endpoint_b) {
                (&mut sum_a, ())
            } else {
                (&mut sum_b, ())
            };
            sum.0 += r as f32 * w;
            sum.1 += g as f32 * w;
            sum.2 += b as f32 * w;
            sum.3 += w;
        }
        if sum_a.3 > 0.0 {
            endpoint_a = (
                (sum_a.0 / sum_a.3).round() as u8,
                (sum_a.1 / sum_a.3).round() as u8,
                (sum_a.2 / sum_a.3).round() as u8,
            );
        }
        if sum_b.3 > 0.0 {
            endpoint_b = (
                (sum_b.0 / sum_b.3).round() as u8,
                (sum_b.1 / sum_b.3).round() as u8,
                (sum_b.2 / sum_b.3).round() as u8,
            );
        }
    }

    (
        rgb888_to_rgb565(endpoint_a.0, endpoint_a.1, endpoint_a.2),
        rgb888_to_rgb565(endpoint_b.0, endpoint_b.1, endpoint_b.2),
    )
}

/// Encodes a 4x4 RGBA8 block as BC1 (8 bytes). `has_alpha` selects whether
/// any transparent pixel forces the three-color + 1-bit-alpha mode.
pub fn encode_bc1_block(pixels: &[Rgba; 16], quality: Quality) -> [u8; 8] {
    let transparent: [bool; 16] = std::array::from_fn(|i| pixels[i][3] == 0);
    let any_transparent = transparent.iter().any(|&t| t);

    let (mut c0, mut c1) = choose_endpoints(pixels, &transparent, quality);

    if any_transparent {
        // Three-color mode requires c0 <= c1; swap if the fit picked the reverse.
        if c0 > c1 {
            std::mem::swap(&mut c0, &mut c1);
        }
    } else if c0 == c1 {
        // Force four-color mode even for a uniform block.
        if c1 > 0 {
            c1 -= 1;
        } else {
            c0 += 1;
        }
        if c0 <= c1 {
            std::mem::swap(&mut c0, &mut c1);
        }
    } else if c0 < c1 {
        std::mem::swap(&mut c0, &mut c1);
    }

    let (palette, four_color) = bc1_palette(c0, c1);

    let mut indices = 0u32;
    for (i, px) in pixels.iter().enumerate() {
        let idx = if !four_color && px[3] == 0 {
            3
        } else {
            let rgb = (px[0], px[1], px[2]);
            (0..4)
                .min_by_key(|&k| color_dist2(rgb, palette[k]))
                .unwrap() as u32
        };
        indices |= idx << (i * 2);
    }

    let mut out = [0u8; 8];
    out[0..2].copy_from_slice(&c0.to_le_bytes());
    out[2..4].copy_from_slice(&c1.to_le_bytes());
    out[4..8].copy_from_slice(&indices.to_le_bytes());
    out
}

/// Decodes an 8-byte BC1 block into 16 RGBA8 pixels.
pub fn decode_bc1_block(data: &[u8; 8]) -> [Rgba; 16] {
    let c0 = u16::from_le_bytes([data[0], data[1]]);
    let c1 = u16::from_le_bytes([data[2], data[3]]);
    let indices = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);

    let (palette, four_color) = bc1_palette(c0, c1);

    std::array::from_fn(|i| {
        let idx = ((indices >> (i * 2)) & 0x3) as usize;
        let (r, g, b) = palette[idx];
        let a = if !four_color && idx == 3 { 0 } else { 255 };
        [r, g, b, a]
    })
}

/// Encodes a 4x4 block as BC2 (16 bytes): explicit 4-bit alpha followed by
/// a BC1 color block always in four-color mode.
pub fn encode_bc2_block(pixels: &[Rgba; 16], quality: Quality) -> [u8; 16] {
    let mut out = [0u8; 16];

    let mut alpha_bits: u64 = 0;
    for (i, px) in pixels.iter().enumerate() {
        let a4 = (px[3] as u64 + 8) / 17; // round 0..255 to 0..15
        alpha_bits |= a4 << (i * 4);
    }
    out[0..8].copy_from_slice(&alpha_bits.to_le_bytes());

    let transparent = [false; 16]; // BC2 alpha is explicit; color block stays four-color.
    let (c0, c1) = choose_endpoints(pixels, &transparent, quality);
    let (c0, c1) = force_four_color(c0, c1);
    let (palette, _) = bc1_palette(c0, c1);

    let mut indices = 0u32;
    for (i, px) in pixels.iter().enumerate() {
        let rgb = (px[0], px[1], px[2]);
        let idx = (0..4).min_by_key(|&k| color_dist2(rgb, palette[k])).unwrap() as u32;
        indices |= idx << (i * 2);
    }
    out[8..10].copy_from_slice(&c0.to_le_bytes());
    out[10..12].copy_from_slice(&c1.to_le_bytes());
    out[12..16].copy_from_slice(&indices.to_le_bytes());
    out
}

pub fn decode_bc2_block(data: &[u8; 16]) -> [Rgba; 16] {
    let alpha_bits = u64::from_le_bytes(data[0..8].try_into().unwrap());
    let c0 = u16::from_le_bytes([data[8], data[9]]);
    let c1 = u16::from_le_bytes([data[10], data[11]]);
    let indices = u32::from_le_bytes(data[12..16].try_into().unwrap());

    let (palette, _) = bc1_palette(c0, c1);

    std::array::from_fn(|i| {
        let idx = ((indices >> (i * 2)) & 0x3) as usize;
        let (r, g, b) = palette[idx];
        let a4 = ((alpha_bits >> (i * 4)) & 0xf) as u8;
        let a = a4 * 17;
        [r, g, b, a]
    })
}

fn force_four_color(c0: u16, c1: u16) -> (u16, u16) {
    if c0 == c1 {
        if c1 > 0 {
            (c0, c1 - 1)
        } else {
            (c0 + 1, c1)
        }
    } else if c0 < c1 {
        (c1, c0)
    } else {
        (c0, c1)
    }
}

fn bc3_alpha_palette(a0: u8, a1: u8) -> [u8; 8] {
    if a0 > a1 {
        [
            a0,
            a1,
            lerp_u8(a0, a1, 1, 7),
            lerp_u8(a0, a1, 2, 7),
            lerp_u8(a0, a1, 3, 7),
            lerp_u8(a0, a1, 4, 7),
            lerp_u8(a0, a1, 5, 7),
            lerp_u8(a0, a1, 6, 7),
        ]
    } else {
        [
            a0,
            a1,
            lerp_u8(a0, a1, 1, 5),
            lerp_u8(a0, a1, 2, 5),
            lerp_u8(a0, a1, 3, 5),
            lerp_u8(a0, a1, 4, 5),
            0,
            255,
        ]
    }
}

fn choose_alpha_endpoints(pixels: &[Rgba; 16]) -> (u8, u8) {
    let mut amin = 255u8;
    let mut amax = 0u8;
    for px in pixels {
        amin = amin.min(px[3]);
        amax = amax.max(px[3]);
    }
    (amax, amin) // a0 > a1 picks the eight-value interpolation mode
}

/// Encodes a 4x4 block as BC3 (16 bytes): interpolated alpha endpoints
/// followed by a BC1 color block in four-color mode.
pub fn encode_bc3_block(pixels: &[Rgba; 16], quality: Quality) -> [u8; 16] {
    let mut out = [0u8; 16];

    let (a0, a1) = choose_alpha_endpoints(pixels);
    out[0] = a0;
    out[1] = a1;
    let palette = bc3_alpha_palette(a0, a1);

    let mut alpha_indices: u64 = 0;
    for (i, px) in pixels.iter().enumerate() {
        let idx = (0..8)
            .min_by_key(|&k| (px[3] as i32 - palette[k] as i32).abs())
            .unwrap() as u64;
        alpha_indices |= idx << (i * 3);
    }
    out[2..8].copy_from_slice(&alpha_indices.to_le_bytes()[0..6]);

    let transparent = [false; 16];
    let (c0, c1) = choose_endpoints(pixels, &transparent, quality);
    let (c0, c1) = force_four_color(c0, c1);
    let (cpalette, _) = bc1_palette(c0, c1);

    let mut indices = 0u32;
    for (i, px) in pixels.iter().enumerate() {
        let rgb = (px[0], px[1], px[2]);
        let idx = (0..4).min_by_key(|&k| color_dist2(rgb, cpalette[k])).unwrap() as u32;
        indices |= idx << (i * 2);
    }
    out[8..10].copy_from_slice(&c0.to_le_bytes());
    out[10..12].copy_from_slice(&c1.to_le_bytes());
    out[12..16].copy_from_slice(&indices.to_le_bytes());
    out
}

pub fn decode_bc3_block(data: &[u8; 16]) -> [Rgba; 16] {
    let a0 = data[0];
    let a1 = data[1];
    let mut alpha_bits_buf = [0u8; 8];
    alpha_bits_buf[0..6].copy_from_slice(&data[2..8]);
    let alpha_indices = u64::from_le_bytes(alpha_bits_buf);
    let palette = bc3_alpha_palette(a0, a1);

    let c0 = u16::from_le_bytes([data[8], data[9]]);
    let c1 = u16::from_le_bytes([data[10], data[11]]);
    let indices = u32::from_le_bytes(data[12..16].try_into().unwrap());
    let (cpalette, _) = bc1_palette(c0, c1);

    std::array::from_fn(|i| {
        let cidx = ((indices >> (i * 2)) & 0x3) as usize;
        let aidx = ((alpha_indices >> (i * 3)) & 0x7) as usize;
        let (r, g, b) = cpalette[cidx];
        [r, g, b, palette[aidx]]
    })
}

/// Pads a `sw x sh` RGBA8 image up to `dw x dh` (both padded to multiples
/// of 4 by the caller). Pixels outside the source extent are either
/// replicated from the nearest edge (`copy`) or filled with `empty`.
pub fn pad(src: &[u8], sw: usize, sh: usize, dw: usize, dh: usize, copy: bool, empty: Rgba) -> Vec<u8> {
    let mut out = vec![0u8; dw * dh * 4];
    for y in 0..dh {
        for x in 0..dw {
            let px = if x < sw && y < sh {
                let i = (y * sw + x) * 4;
                [src[i], src[i + 1], src[i + 2], src[i + 3]]
            } else if copy {
                let sx = x.min(sw.saturating_sub(1));
                let sy = y.min(sh.saturating_sub(1));
                let i = (sy * sw + sx) * 4;
                [src[i], src[i + 1], src[i + 2], src[i + 3]]
            } else {
                empty
            };
            let o = (y * dw + x) * 4;
            out[o..o + 4].copy_from_slice(&px);
        }
    }
    out
}

/// Crops a `sw x sh` region out of a `dw x dh` (padded) RGBA8 image.
pub fn unpad(src: &[u8], dw: usize, sw: usize, sh: usize) -> Vec<u8> {
    let mut out = vec![0u8; sw * sh * 4];
    for y in 0..sh {
        let src_row = (y * dw) * 4;
        let dst_row = (y * sw) * 4;
        out[dst_row..dst_row + sw * 4].copy_from_slice(&src[src_row..src_row + sw * 4]);
    }
    out
}

/// Encodes a padded (multiple-of-4) RGBA8 image with the given encoding.
pub fn encode_image(src: &[u8], w: usize, h: usize, encoding: Encoding, quality: Quality) -> Vec<u8> {
    debug_assert_eq!(w % 4, 0);
    debug_assert_eq!(h % 4, 0);
    let block_size = encoding.block_size();
    let mut out = Vec::with_capacity((w / 4) * (h / 4) * block_size);

    for by in (0..h).step_by(4) {
        for bx in (0..w).step_by(4) {
            let mut block: [Rgba; 16] = [[0; 4]; 16];
            for (row, dst) in block.chunks_exact_mut(4).enumerate() {
                let i = ((by + row) * w + bx) * 4;
                for (col, px) in dst.iter_mut().enumerate() {
                    let o = i + col * 4;
                    *px = [src[o], src[o + 1], src[o + 2], src[o + 3]];
                }
            }

            match encoding {
                Encoding::Bc1 => out.extend_from_slice(&encode_bc1_block(&block, quality)),
                Encoding::Bc2 => out.extend_from_slice(&encode_bc2_block(&block, quality)),
                Encoding::Bc3 => out.extend_from_slice(&encode_bc3_block(&block, quality)),
            }
        }
    }
    out
}

/// Decodes an encoded `w x h` (multiple-of-4) image back to RGBA8.
pub fn decode_image(src: &[u8], w: usize, h: usize, encoding: Encoding) -> Vec<u8> {
    debug_assert_eq!(w % 4, 0);
    debug_assert_eq!(h % 4, 0);
    let block_size = encoding.block_size();
    let mut out = vec![0u8; w * h * 4];

    let blocks_per_row = w / 4;
    for (block_index, chunk) in src.chunks_exact(block_size).enumerate() {
        let bx = (block_index % blocks_per_row) * 4;
        let by = (block_index / blocks_per_row) * 4;

        let block: [Rgba; 16] = match encoding {
            Encoding::Bc1 => decode_bc1_block(chunk.try_into().unwrap()),
            Encoding::Bc2 => decode_bc2_block(chunk.try_into().unwrap()),
            Encoding::Bc3 => decode_bc3_block(chunk.try_into().unwrap()),
        };

        for (row, px_row) in block.chunks_exact(4).enumerate() {
            let o = ((by + row) * w + bx) * 4;
            for (col, px) in px_row.iter().enumerate() {
                out[o + col * 4..o + col * 4 + 4].copy_from_slice(px);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_block(color: Rgba) -> [Rgba; 16] {
        [color; 16]
    }

    #[test]
    fn uniform_color_round_trips_exactly_bc1() {
        // 206/203/206 survive the 565 truncate-then-bit-replicate round
        // trip exactly (not every 888 triple does).
        let block = solid_block([206, 203, 206, 255]);
        let encoded = encode_bc1_block(&block, Quality::new(9));
        let decoded = decode_bc1_block(&encoded);
        for px in decoded {
            assert_eq!(px, [206, 203, 206, 255]);
        }
    }

    #[test]
    fn uniform_color_round_trips_exactly_bc3() {
        let block = solid_block([206, 203, 206, 128]);
        let encoded = encode_bc3_block(&block, Quality::new(9));
        let decoded = decode_bc3_block(&encoded);
        for px in decoded {
            assert_eq!(px[0..3], [206, 203, 206]);
        }
    }

    #[test]
    fn bc1_transparent_pixel_decodes_alpha_zero() {
        let mut block = solid_block([255, 0, 0, 255]);
        block[0] = [0, 255, 0, 0];
        let encoded = encode_bc1_block(&block, Quality::new(9));
        let decoded = decode_bc1_block(&encoded);
        assert_eq!(decoded[0][3], 0);
    }

    #[test]
    fn bc2_alpha_is_explicit_per_pixel() {
        let mut block = solid_block([1, 2, 3, 255]);
        block[5][3] = 128;
        let encoded = encode_bc2_block(&block, Quality::new(9));
        let decoded = decode_bc2_block(&encoded);
        // 4-bit alpha quantization: 128 -> nearest multiple of 17.
        assert!((decoded[5][3] as i32 - 128).abs() <= 17);
    }

    #[test]
    fn pad_replicates_edge_when_copy() {
        let src = vec![10, 20, 30, 255]; // 1x1 image
        let padded = pad(&src, 1, 1, 4, 4, true, [0, 0, 0, 0]);
        for chunk in padded.chunks_exact(4) {
            assert_eq!(chunk, [10, 20, 30, 255]);
        }
    }

    #[test]
    fn pad_fills_empty_when_not_copy() {
        let src = vec![10, 20, 30, 255];
        let padded = pad(&src, 1, 1, 2, 2, false, [9, 9, 9, 9]);
        assert_eq!(&padded[0..4], &[10, 20, 30, 255]);
        assert_eq!(&padded[4..8], &[9, 9, 9, 9]);
    }

    #[test]
    fn encode_decode_image_round_trip_is_close() {
        let w = 8;
        let h = 8;
        let mut src = vec![0u8; w * h * 4];
        for (i, px) in src.chunks_exact_mut(4).enumerate() {
            px.copy_from_slice(&[(i * 7 % 255) as u8, (i * 3 % 255) as u8, (i * 11 % 255) as u8, 255]);
        }
        let encoded = encode_image(&src, w, h, Encoding::Bc1, Quality::new(9));
        let decoded = decode_image(&encoded, w, h, Encoding::Bc1);
        for (a, b) in src.chunks_exact(4).zip(decoded.chunks_exact(4)) {
            for c in 0..3 {
                assert!((a[c] as i32 - b[c] as i32).abs() <= 40);
            }
        }
    }
}

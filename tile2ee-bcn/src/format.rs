//! Pixel encoding and channel-order enums (spec §3 `Texture`), ported from
//! `Types.hpp`'s `Encoding` / `ColorFormat`.

/// The DXTn variant used to compress a [`crate::texture::Texture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// DXT1: 8 bytes/block, 1-bit alpha via the three-color fallback mode.
    Bc1,
    /// DXT3: 16 bytes/block, explicit 4-bit-per-pixel alpha.
    Bc2,
    /// DXT5: 16 bytes/block, interpolated 8-bit alpha endpoints.
    Bc3,
}

impl Encoding {
    /// Bytes per 4x4 block.
    pub const fn block_size(self) -> usize {
        match self {
            Self::Bc1 => 8,
            Self::Bc2 | Self::Bc3 => 16,
        }
    }

    /// The PVR `pixelFormat` field value (spec §6).
    pub const fn pvr_pixel_format(self) -> u32 {
        match self {
            Self::Bc1 => 7,
            Self::Bc2 => 9,
            Self::Bc3 => 11,
        }
    }

    pub const fn from_pvr_pixel_format(v: u32) -> Option<Self> {
        match v {
            7 => Some(Self::Bc1),
            9 => Some(Self::Bc2),
            11 => Some(Self::Bc3),
            _ => None,
        }
    }
}

/// The byte order of a 4-byte pixel. `ARGB` means byte 0 holds alpha, byte
/// 1 red, and so on; `0xaarrggbb` when read as a big-endian integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorFormat {
    Argb,
    Abgr,
    Bgra,
    Rgba,
}

impl ColorFormat {
    /// Byte offsets of (a, r_or_b, g, b_or_r) -- returns `(a_idx, r_idx, g_idx, b_idx)`.
    const fn channel_indices(self) -> (usize, usize, usize, usize) {
        match self {
            Self::Argb => (0, 1, 2, 3),
            Self::Abgr => (0, 3, 2, 1),
            Self::Bgra => (3, 2, 1, 0),
            Self::Rgba => (3, 0, 1, 2),
        }
    }

    /// The "empty" pixel for this format: opaque black for ARGB/ABGR,
    /// fully transparent for RGBA/BGRA (spec §4.4 "Padding/unpadding").
    pub fn empty_pixel(self) -> [u8; 4] {
        match self {
            Self::Argb | Self::Abgr => self.pack(255, 0, 0, 0),
            Self::Bgra | Self::Rgba => self.pack(0, 0, 0, 0),
        }
    }

    pub fn pack(self, a: u8, r: u8, g: u8, b: u8) -> [u8; 4] {
        let (ai, ri, gi, bi) = self.channel_indices();
        let mut out = [0u8; 4];
        out[ai] = a;
        out[ri] = r;
        out[gi] = g;
        out[bi] = b;
        out
    }

    pub fn unpack(self, px: [u8; 4]) -> (u8, u8, u8, u8) {
        let (ai, ri, gi, bi) = self.channel_indices();
        (px[ai], px[ri], px[gi], px[bi])
    }

    /// Reorders every pixel of `data` (a run of 4-byte pixels) from `from`
    /// to `to`, in place -- a pure permutation over the 4-byte stride
    /// (spec §4.5 "Channel reordering").
    pub fn reorder(data: &mut [u8], from: ColorFormat, to: ColorFormat) {
        if from == to {
            return;
        }
        for px in data.chunks_exact_mut(4) {
            let (a, r, g, b) = from.unpack([px[0], px[1], px[2], px[3]]);
            let packed = to.pack(a, r, g, b);
            px.copy_from_slice(&packed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reorder_round_trips() {
        let mut px = ColorFormat::Argb.pack(10, 20, 30, 40).to_vec();
        ColorFormat::reorder(&mut px, ColorFormat::Argb, ColorFormat::Bgra);
        ColorFormat::reorder(&mut px, ColorFormat::Bgra, ColorFormat::Argb);
        assert_eq!(ColorFormat::Argb.unpack([px[0], px[1], px[2], px[3]]), (10, 20, 30, 40));
    }

    #[test]
    fn empty_pixel_matches_channel_semantics() {
        assert_eq!(ColorFormat::Argb.unpack(ColorFormat::Argb.empty_pixel()), (255, 0, 0, 0));
        assert_eq!(ColorFormat::Rgba.unpack(ColorFormat::Rgba.empty_pixel()), (0, 0, 0, 0));
    }
}

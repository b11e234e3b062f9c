//! RGBA8 -> 256-color palette quantizer (spec §4.5), substituting for the
//! original tool's `libimagequant` dependency (no such crate exists in the
//! example pack) with a hand-rolled octree quantizer.
//!
//! Palette index 0 is always the reserved "transparent green" sentinel
//! `(r=0, g=255, b=0, a=0)` (spec §4.5 "Sentinel"), matching
//! `Colors::palToARGB`'s little-endian read of `0x0000ff00` at offset 0.

/// The reserved sentinel color occupying palette index 0.
pub const SENTINEL_RGBA: [u8; 4] = [0, 255, 0, 0];

/// A 256-entry RGBA8 palette plus one index per source pixel.
pub struct Quantized {
    pub palette: Vec<[u8; 4]>,
    pub indices: Vec<u8>,
}

struct OctreeNode {
    children: [Option<usize>; 8],
    r_sum: u64,
    g_sum: u64,
    b_sum: u64,
    count: u64,
    is_leaf: bool,
}

impl OctreeNode {
    fn new() -> Self {
        Self {
            children: [None; 8],
            r_sum: 0,
            g_sum: 0,
            b_sum: 0,
            count: 0,
            is_leaf: false,
        }
    }
}

/// An arena-backed octree (Gervautz/Purgathofer reduction), chosen over the
/// naive all-pairs leaf merge: reducing from the deepest populated level
/// keeps the merge step near-linear in distinct colors instead of cubic,
/// which matters since a single 64x64 block can hold up to 4096 of them.
struct Octree {
    arena: Vec<OctreeNode>,
    reducible: Vec<Vec<usize>>,
    leaf_count: usize,
}

impl Octree {
    fn new() -> Self {
        Self {
            arena: vec![OctreeNode::new()],
            reducible: (0..7).map(|_| Vec::new()).collect(),
            leaf_count: 0,
        }
    }

    fn insert(&mut self, r: u8, g: u8, b: u8) {
        let mut node_idx = 0usize;
        let mut level = 0u32;
        while level < 8 && !self.arena[node_idx].is_leaf {
            let shift = 7 - level;
            let child_slot = (((r >> shift) & 1) << 2 | ((g >> shift) & 1) << 1 | ((b >> shift) & 1)) as usize;
            node_idx = match self.arena[node_idx].children[child_slot] {
                Some(i) => i,
                None => {
                    self.arena.push(OctreeNode::new());
                    let new_idx = self.arena.len() - 1;
                    self.arena[node_idx].children[child_slot] = Some(new_idx);
                    // A child created while descending from depth `level` has
                    // actual depth `level + 1`; only register it as reducible
                    // if that depth is still internal (< 8, the leaf depth).
                    if level < 7 {
                        self.reducible[level as usize].push(new_idx);
                    }
                    new_idx
                }
            };
            level += 1;
        }

        let node = &mut self.arena[node_idx];
        if !node.is_leaf {
            node.is_leaf = true;
            self.leaf_count += 1;
        }
        node.r_sum += r as u64;
        node.g_sum += g as u64;
        node.b_sum += b as u64;
        node.count += 1;
    }

    /// Merges one node's leaf children back into itself, picked from the
    /// deepest level with anything left to merge. Returns `false` once
    /// nothing more can be reduced.
    fn reduce_one(&mut self) -> bool {
        let Some(level) = self.reducible.iter().rposition(|l| !l.is_empty()) else {
            return false;
        };
        let Some(node_idx) = self.reducible[level].pop() else {
            return false;
        };

        let children = self.arena[node_idx].children;
        let mut merged = 0u64;
        for child_idx in children.iter().flatten() {
            let child = &self.arena[*child_idx];
            debug_assert!(child.is_leaf, "reduction must proceed from the deepest level up");
            self.arena[node_idx].r_sum += child.r_sum;
            self.arena[node_idx].g_sum += child.g_sum;
            self.arena[node_idx].b_sum += child.b_sum;
            self.arena[node_idx].count += child.count;
            merged += 1;
        }
        self.arena[node_idx].children = [None; 8];
        self.arena[node_idx].is_leaf = true;
        self.leaf_count -= (merged.saturating_sub(1)) as usize;
        true
    }

    /// Collects every remaining leaf's mean color and pixel count.
    fn collect_leaves(&self) -> Vec<([u8; 3], u64)> {
        self.arena
            .iter()
            .filter(|n| n.is_leaf && n.count > 0)
            .map(|n| {
                (
                    [
                        (n.r_sum / n.count) as u8,
                        (n.g_sum / n.count) as u8,
                        (n.b_sum / n.count) as u8,
                    ],
                    n.count,
                )
            })
            .collect()
    }
}

/// Speed knob, mirroring the original tool's `10 - qualityV1` formula:
/// higher values trade palette fidelity for faster convergence.
fn merge_target(speed: u32) -> usize {
    // Lower speed -> finer palette (closer to the full 255 non-sentinel slots);
    // higher speed -> coarser, faster convergence.
    let max_colors = 255usize;
    let floor = 16usize;
    let scaled = max_colors.saturating_sub(speed as usize * 24);
    scaled.max(floor)
}

/// Quantizes `src` (a run of RGBA8 pixels) into a 256-entry palette. Index 0
/// is reserved: set to [`SENTINEL_RGBA`] when `src` has any fully transparent
/// pixel (which all map to index 0), left zero-filled otherwise (spec §4.5).
///
/// `quality_v1` is `0..=10` as in spec §4.5; converted to the quantizer's
/// speed knob via `10 - quality_v1`, matching the original tool.
pub fn quantize(src: &[u8], quality_v1: u32) -> Quantized {
    let speed = 10u32.saturating_sub(quality_v1.min(10));
    let target_colors = merge_target(speed);

    let mut tree = Octree::new();
    for px in src.chunks_exact(4) {
        if px[3] == 0 {
            continue;
        }
        tree.insert(px[0], px[1], px[2]);
    }

    while tree.leaf_count > target_colors {
        if !tree.reduce_one() {
            break;
        }
    }

    let leaves = tree.collect_leaves();
    let has_transparent = src.chunks_exact(4).any(|px| px[3] == 0);

    let mut palette = Vec::with_capacity(256);
    palette.push(if has_transparent { SENTINEL_RGBA } else { [0, 0, 0, 0] });
    for (rgb, _) in &leaves {
        if palette.len() >= 256 {
            break;
        }
        palette.push([rgb[0], rgb[1], rgb[2], 255]);
    }
    while palette.len() < 256 {
        palette.push(SENTINEL_RGBA);
    }

    let mut indices = Vec::with_capacity(src.len() / 4);
    for px in src.chunks_exact(4) {
        if px[3] == 0 {
            indices.push(0);
            continue;
        }
        let rgb = [px[0], px[1], px[2]];
        let nearest = palette
            .iter()
            .enumerate()
            .skip(1)
            .min_by_key(|(_, c)| color_dist(rgb, [c[0], c[1], c[2]]))
            .map(|(i, _)| i as u8)
            .unwrap_or(0);
        indices.push(nearest);
    }

    Quantized { palette, indices }
}

/// Expands a palette + index buffer back to RGBA8, for round-trip tests
/// and for decoding V1 TIS/MOS tiles, mirroring `Colors::palToARGB`: the
/// palette's stored alpha byte is never read back. Index 0 decodes
/// transparent only when the palette's own entry 0 is the sentinel;
/// every other pixel is forced fully opaque.
pub fn expand(palette: &[[u8; 4]], indices: &[u8]) -> Vec<u8> {
    let sentinel_reserved = palette.first().copied() == Some(SENTINEL_RGBA);
    let mut out = Vec::with_capacity(indices.len() * 4);
    for &idx in indices {
        if idx == 0 && sentinel_reserved {
            out.extend_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        let rgb = palette.get(idx as usize).copied().unwrap_or(SENTINEL_RGBA);
        out.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
    }
    out
}

fn color_dist(a: [u8; 3], b: [u8; 3]) -> i64 {
    let dr = a[0] as i64 - b[0] as i64;
    let dg = a[1] as i64 - b[1] as i64;
    let db = a[2] as i64 - b[2] as i64;
    dr * dr + dg * dg + db * db
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_occupies_index_zero_when_source_has_transparency() {
        let src = vec![10, 20, 30, 0, 40, 50, 60, 255];
        let q = quantize(&src, 9);
        assert_eq!(q.palette[0], SENTINEL_RGBA);
    }

    #[test]
    fn index_zero_is_zero_filled_when_source_is_fully_opaque() {
        let src = vec![10, 20, 30, 255, 40, 50, 60, 255];
        let q = quantize(&src, 9);
        assert_eq!(q.palette[0], [0, 0, 0, 0]);
        assert!(q.indices.iter().all(|&i| i != 0));
    }

    #[test]
    fn transparent_pixels_map_to_index_zero() {
        let src = vec![10, 20, 30, 0, 40, 50, 60, 255];
        let q = quantize(&src, 9);
        assert_eq!(q.indices[0], 0);
    }

    #[test]
    fn uniform_image_round_trips_through_palette() {
        let mut src = Vec::new();
        for _ in 0..64 {
            src.extend_from_slice(&[100, 150, 200, 255]);
        }
        let q = quantize(&src, 9);
        let expanded = expand(&q.palette, &q.indices);
        for px in expanded.chunks_exact(4) {
            assert_eq!(px[0..3], [100, 150, 200]);
        }
    }

    #[test]
    fn palette_never_exceeds_256_entries() {
        let mut src = Vec::new();
        for i in 0..4096u32 {
            src.extend_from_slice(&[(i % 255) as u8, ((i * 3) % 255) as u8, ((i * 7) % 255) as u8, 255]);
        }
        let q = quantize(&src, 0);
        assert_eq!(q.palette.len(), 256);
    }
}

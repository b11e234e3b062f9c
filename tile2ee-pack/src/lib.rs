//! The MaxRects 2D bin packer (spec §4.3): offline/online packing with five
//! heuristics and post-pack shrink-to-fit.

mod bin;

pub use bin::{Bin, HeuristicRule};
pub use tile2ee_common::rect::{Rect, RectSize};

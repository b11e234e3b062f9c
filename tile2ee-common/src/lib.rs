//! Binary I/O, error types, geometry primitives and the compression adapter
//! shared by every `tile2ee-*` crate.

pub mod compress;
pub mod error;
pub mod reader;
pub mod rect;
pub mod writer;

pub use error::{ConvertError, ConvertResult};
pub use rect::{Rect, RectSize};

//! BC1/BC2/BC3 block codec, the 32bpp `Texture` surface, and the RGBA ->
//! palette color quantizer (spec §4.4-§4.6).

pub mod bcn;
pub mod format;
pub mod quantize;
pub mod texture;

pub use bcn::Quality;
pub use format::{ColorFormat, Encoding};
pub use quantize::{quantize, Quantized, SENTINEL_RGBA};
pub use texture::Texture;

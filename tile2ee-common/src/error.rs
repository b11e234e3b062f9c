//! Error types shared by every `tile2ee-*` crate.
//!
//! Structured the way `hayro-jbig2::error` structures its `DecodeError`:
//! one flat top-level enum wrapping per-domain sub-enums, each with its
//! own `Display` impl, plus `bail!`/`err!` helper macros.

use std::fmt;
use std::path::PathBuf;

/// The result type used throughout the `tile2ee-*` crates.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Top-level error type for every conversion operation.
#[derive(Debug, Clone)]
pub enum ConvertError {
    /// A required file or PVRZ page could not be located.
    NotFound(PathBuf),
    /// A read ran past the end of the available bytes.
    Truncated { what: &'static str },
    /// A container's magic signature did not match any known kind.
    BadSignature { expected: &'static str, file: PathBuf },
    /// A container declared a version this build does not understand.
    UnsupportedVersion { found: [u8; 4] },
    /// A dimension was non-positive, not a power of two where required,
    /// or otherwise out of range.
    BadDimension { what: &'static str, value: i64 },
    /// `inflate` produced a length different from the one recorded on disk.
    CorruptCompressed { expected: usize, actual: usize },
    /// The color quantizer could not produce a palette.
    QuantizeFailed,
    /// The BCn encoder could not produce a block.
    EncodeFailed,
    /// Writing the output file failed.
    IoWrite(PathBuf, String),
    /// A PVRZ page index grew past the representable range (0..=99 for
    /// TIS, 0..=99999 for MOS).
    PvrzIndexOverflow { index: u64 },
    /// The resolved output path is identical to the input path.
    InputEqualsOutput(PathBuf),
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(p) => write!(f, "not found: {}", p.display()),
            Self::Truncated { what } => write!(f, "truncated while reading {what}"),
            Self::BadSignature { expected, file } => {
                write!(f, "bad signature in {} (expected {expected})", file.display())
            }
            Self::UnsupportedVersion { found } => write!(
                f,
                "unsupported version {:?}",
                String::from_utf8_lossy(found)
            ),
            Self::BadDimension { what, value } => write!(f, "bad dimension {what}: {value}"),
            Self::CorruptCompressed { expected, actual } => write!(
                f,
                "corrupt compressed data: expected {expected} bytes, got {actual}"
            ),
            Self::QuantizeFailed => write!(f, "quantization failed"),
            Self::EncodeFailed => write!(f, "block encoding failed"),
            Self::IoWrite(p, msg) => write!(f, "failed to write {}: {msg}", p.display()),
            Self::PvrzIndexOverflow { index } => {
                write!(f, "pvrz index overflow: {index}")
            }
            Self::InputEqualsOutput(p) => {
                write!(f, "input and output both resolve to {}", p.display())
            }
        }
    }
}

impl std::error::Error for ConvertError {}

macro_rules! bail {
    ($err:expr) => {
        return Err($err)
    };
}

macro_rules! err {
    ($err:expr) => {
        Err($err)
    };
}

pub use bail;
pub use err;

//! The four conversion orchestrators (spec §4.8): open input, validate
//! header, stream per-tile work through the pool, stream per-tile output,
//! finalize.

mod mos_v1_to_v2;
mod mos_v2_to_v1;
mod tis_v1_to_v2;
mod tis_v2_to_v1;

pub use mos_v1_to_v2::convert as mos_v1_to_v2;
pub use mos_v2_to_v1::convert as mos_v2_to_v1;
pub use tis_v1_to_v2::convert as tis_v1_to_v2;
pub use tis_v2_to_v1::convert as tis_v2_to_v1;

use std::path::{Path, PathBuf};

use tile2ee_common::error::{ConvertError, ConvertResult};

/// Picks the next PVRZ sibling path starting at `start`, skipping any
/// index whose file already exists when `overwrite` is false (spec §6
/// scenario 6, "PVRZ index skipping").
fn allocate_pvrz_path(
    next_index: &mut u32,
    overwrite: bool,
    name_for: impl Fn(u32) -> Option<PathBuf>,
) -> ConvertResult<(u32, PathBuf)> {
    loop {
        let index = *next_index;
        let path = name_for(index).ok_or(ConvertError::PvrzIndexOverflow { index: index as u64 })?;
        *next_index += 1;
        if !overwrite && path.exists() {
            continue;
        }
        return Ok((index, path));
    }
}

/// Deletes a partially-written output file (spec §7 "user-visible
/// behavior": the output is marked "delete on close" until conversion
/// succeeds).
fn delete_partial_output(path: &Path) {
    if let Err(err) = std::fs::remove_file(path) {
        if err.kind() != std::io::ErrorKind::NotFound {
            log::warn!("failed to remove partial output {}: {err}", path.display());
        }
    }
}

fn guard_same_path(input: &Path, output: &Path) -> ConvertResult<()> {
    if input == output {
        return Err(ConvertError::InputEqualsOutput(output.to_path_buf()));
    }
    Ok(())
}

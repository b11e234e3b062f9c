//! PVRZ sibling-file naming (spec §6), ported 1:1 from
//! `Options::GenerateTisPvrzName` / `Options::GenerateMosPvrzName` in
//! `examples/original_source/.../Options.cpp`.

use std::path::{Path, PathBuf};

/// Builds the PVRZ sibling path for a TIS page: `<c0><base[2..]><pp>.pvrz`
/// next to `tis_path`, where `c0` is the first character of the TIS
/// basename and `pp` is the zero-padded two-digit page. `None` if `index`
/// is outside `0..100` or the basename is empty.
pub fn generate_tis_pvrz_name(tis_path: &Path, index: u32) -> Option<PathBuf> {
    if index >= 100 {
        return None;
    }
    let file_base = tis_path.file_stem()?.to_str()?;
    let mut chars = file_base.chars();
    let first = chars.next()?;

    let mut name = String::new();
    name.push(first);
    // `fileBase.substr(2)`: everything from the third character on, if any.
    if file_base.chars().count() > 2 {
        name.push_str(&file_base.chars().skip(2).collect::<String>());
    }
    if index < 10 {
        name.push('0');
    }
    name.push_str(&index.to_string());
    name.push_str(".pvrz");

    Some(sibling(tis_path, &name))
}

/// Builds the PVRZ sibling path for a MOS page: `mos<NNNN>.pvrz`, zero
/// padded to at least 4 digits. `None` if `index > 99999`.
pub fn generate_mos_pvrz_name(mos_path: &Path, index: u32) -> Option<PathBuf> {
    if index > 99999 {
        return None;
    }

    let mut name = String::from("mos");
    if index < 10 {
        name.push_str("000");
    } else if index < 100 {
        name.push_str("00");
    } else if index < 1000 {
        name.push('0');
    }
    name.push_str(&index.to_string());
    name.push_str(".pvrz");

    Some(sibling(mos_path, &name))
}

fn sibling(reference: &Path, file_name: &str) -> PathBuf {
    match reference.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(file_name),
        _ => PathBuf::from(file_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tis_name_drops_second_character_and_pads_single_digits() {
        let name = generate_tis_pvrz_name(Path::new("/tiles/AREA01.TIS"), 3).unwrap();
        assert_eq!(name, Path::new("/tiles/AEA0103.pvrz"));
    }

    #[test]
    fn tis_name_handles_double_digit_pages_without_padding() {
        let name = generate_tis_pvrz_name(Path::new("/tiles/AREA01.TIS"), 42).unwrap();
        assert_eq!(name, Path::new("/tiles/AEA0142.pvrz"));
    }

    #[test]
    fn tis_name_rejects_index_past_99() {
        assert!(generate_tis_pvrz_name(Path::new("AREA01.TIS"), 100).is_none());
    }

    #[test]
    fn mos_name_pads_to_four_digits() {
        let name = generate_mos_pvrz_name(Path::new("/mos/map.mos"), 7).unwrap();
        assert_eq!(name, Path::new("/mos/mos0007.pvrz"));
    }

    #[test]
    fn mos_name_does_not_pad_past_four_digits() {
        let name = generate_mos_pvrz_name(Path::new("map.mos"), 12345).unwrap();
        assert_eq!(name, PathBuf::from("mos12345.pvrz"));
    }

    #[test]
    fn mos_name_rejects_index_past_99999() {
        assert!(generate_mos_pvrz_name(Path::new("map.mos"), 100_000).is_none());
    }
}

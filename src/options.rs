//! Conversion configuration (spec §3 "Additions"), read-only once a
//! conversion's worker pool has started (spec §5).

/// Tunables shared by every orchestrator direction, grounded in the
/// original tool's `Options` class (`examples/original_source/.../Options.hpp`).
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Quantizer quality, `0..=10`; the octree speed knob is `10 - quality_v1`.
    pub quality_v1: u8,
    /// BCn encoder quality, `0..=9` (spec §4.4).
    pub quality_v2: u8,
    /// Worker thread count; `0` autodetects from hardware concurrency.
    pub threads: usize,
    /// Bounded submit queue capacity (spec §4.7).
    pub queue_capacity: usize,
    /// When `false`, PVRZ naming skips indices whose sibling file already
    /// exists on disk rather than overwriting it (spec §6 scenario 6).
    pub overwrite_pvrz: bool,
    /// First PVRZ page index to assign for MOS output.
    pub mos_pvrz_start: u32,
    /// First PVRZ page index to assign for TIS output.
    pub tis_pvrz_start: u32,
    /// Wrap MOS V1 output in the MOSC zlib envelope.
    pub use_mosc: bool,
    /// Stop the whole batch on the first file that fails, rather than
    /// reporting and continuing (spec §7 "Propagation policy").
    pub halt_on_error: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            quality_v1: 9,
            quality_v2: 9,
            threads: 0,
            queue_capacity: 64,
            overwrite_pvrz: true,
            mos_pvrz_start: 0,
            tis_pvrz_start: 0,
            use_mosc: false,
            halt_on_error: true,
        }
    }
}

impl Options {
    /// Resolves `threads` against hardware concurrency (spec §4.7
    /// "`T` = configured value, `0` -> autodetect").
    pub fn resolved_thread_count(&self) -> usize {
        if self.threads == 0 {
            std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
        } else {
            self.threads
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_tool_quality() {
        let opts = Options::default();
        assert_eq!(opts.quality_v1, 9);
        assert_eq!(opts.quality_v2, 9);
        assert!(opts.halt_on_error);
    }

    #[test]
    fn zero_threads_resolves_to_at_least_one() {
        let opts = Options { threads: 0, ..Options::default() };
        assert!(opts.resolved_thread_count() >= 1);
    }
}

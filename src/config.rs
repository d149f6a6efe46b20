//! Filtering configuration (§6).
//!
//! All four fields are seconds-denominated `u32`s applied atomically by
//! [`FilterConfig::apply`]: a zero field leaves the corresponding current
//! value unchanged, which is how `set_filtering` can be called with only the
//! parameters the caller actually wants to change.

use crate::types::Config;

/// Promotion/pruning/reassembly timing knobs for a [`crate::DtcContext`].
///
/// Mirrors how `libautomotive`'s protocol configs (`CanConfig`, `IsoTpConfig`,
/// `J1939Config`) are plain structs validated through the `Config` trait
/// rather than builders; this one happens to have no invalid combination of
/// field values; see the [`Config`] impl below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterConfig {
    threshold_reads: u32,
    window_active: u32,
    window_inactive: u32,
    timeout_multi_frame: u32,
}

impl FilterConfig {
    /// Promotion threshold for candidate -> active (default 10).
    pub const fn threshold_reads(&self) -> u32 {
        self.threshold_reads
    }

    /// Maximum age of a candidate before it is pruned (default 10s).
    pub const fn window_active(&self) -> u32 {
        self.window_active
    }

    /// Inactivity after which an active DTC is removed (default 20s).
    pub const fn window_inactive(&self) -> u32 {
        self.window_inactive
    }

    /// Maximum age of a partial BAM reassembly (default 5s).
    pub const fn timeout_multi_frame(&self) -> u32 {
        self.timeout_multi_frame
    }

    /// Applies a partial update: a zero argument leaves the current value of
    /// that field unchanged. Matches `set_filtering` (§6) exactly.
    pub fn apply(
        &mut self,
        threshold_reads: u32,
        window_active: u32,
        window_inactive: u32,
        timeout_multi_frame: u32,
    ) {
        if threshold_reads != 0 {
            self.threshold_reads = threshold_reads;
        }
        if window_active != 0 {
            self.window_active = window_active;
        }
        if window_inactive != 0 {
            self.window_inactive = window_inactive;
        }
        if timeout_multi_frame != 0 {
            self.timeout_multi_frame = timeout_multi_frame;
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            threshold_reads: 10,
            window_active: 10,
            window_inactive: 20,
            timeout_multi_frame: 5,
        }
    }
}

impl Config for FilterConfig {
    fn validate(&self) -> crate::error::Result<()> {
        // Every field is an unsigned age/threshold in seconds; there is no
        // combination of them that is structurally invalid, only vacuous
        // (e.g. threshold_reads == 0 promotes on first sighting). Kept for
        // symmetry with the rest of the crate's Config impls.
        Ok(())
    }
}

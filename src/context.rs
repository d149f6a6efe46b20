//! `DtcContext` (§9 Design Notes): the owning handle that replaces the
//! source's process-wide singleton with a constructible instance, so a host
//! can run one per CAN bus with no global state.

use crate::bam::BamTable;
use crate::classify::{classify, Classification};
use crate::config::FilterConfig;
use crate::dm1::decode_dm1;
use crate::dtc::DtcRecord;
use crate::gate::Gate;
use crate::limits::N_ACT;
use crate::types::Seconds;

/// A callback invoked synchronously from [`DtcContext::tick`] whenever the
/// active set changed. Receives an ordered view of the current active set.
///
/// A plain function pointer, not a boxed closure, so the default no_std path
/// never allocates (§4.6).
pub type ChangeCallback = fn(active: &[DtcRecord]);

/// Owns the registry, reassembly table, gate, configuration, and optional
/// callback for one independent instance of the parser.
pub struct DtcContext {
    bam: BamTable,
    registry: crate::registry::Registry,
    gate: Gate,
    config: FilterConfig,
    callback: Option<ChangeCallback>,
    reentry_guard: core::cell::Cell<bool>,
}

impl Default for DtcContext {
    fn default() -> Self {
        Self {
            bam: BamTable::new(),
            registry: crate::registry::Registry::new(),
            gate: Gate::new(),
            config: FilterConfig::default(),
            callback: None,
            reentry_guard: core::cell::Cell::new(false),
        }
    }
}

impl DtcContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a partial filtering-configuration update; a zero argument
    /// leaves the current value of that field unchanged (§6).
    pub fn set_filtering(
        &mut self,
        threshold_reads: u32,
        window_active: u32,
        window_inactive: u32,
        timeout_multi_frame: u32,
    ) {
        self.config
            .apply(threshold_reads, window_active, window_inactive, timeout_multi_frame);
    }

    /// Registers the callback invoked from `tick` whenever the active set
    /// changes. Replaces any previously registered callback.
    pub fn register_callback(&mut self, f: ChangeCallback) {
        self.callback = Some(f);
    }

    /// Ingests one CAN frame (§4.1-§4.4). Drops the frame silently if the
    /// gate is contended (§4.5, §8 P5).
    pub fn ingest_frame(&mut self, can_id: u32, data: [u8; 8], t: Seconds) {
        if !self.gate.try_acquire() {
            tracing::trace!(can_id, "ingest_frame: gate contended, dropping frame");
            return;
        }

        match classify(can_id, &data) {
            Classification::Dm1 { src } => {
                let registry = &mut self.registry;
                let config = &self.config;
                decode_dm1(src, &data, t, |obs| registry.update(t, obs, config));
            }
            Classification::TpCm => {
                self.bam.on_cm(can_id, &data, t);
            }
            Classification::TpDt => {
                let registry = &mut self.registry;
                let config = &self.config;
                self.bam.on_dt(can_id, &data, t, |obs| registry.update(t, obs, config));
            }
            Classification::Ignore => {}
        }

        self.gate.release();
    }

    /// Runs the periodic debounce/reassembly-age sweep (§4.4 Prune, §4.3 Age
    /// sweep) and fires the registered callback if the active set changed.
    ///
    /// Returns whether the active set changed since the last successful
    /// tick. The gate is always acquired for `tick` — unlike `ingest_frame`,
    /// the caller is expected to own when ticks run, so a contended gate
    /// here indicates a caller bug rather than a legitimate race (§4.5).
    pub fn tick(&mut self, t: Seconds) -> bool {
        if !self.gate.try_acquire() {
            tracing::warn!("tick: gate contended, skipping this tick");
            return false;
        }

        self.bam.sweep(t, self.config.timeout_multi_frame());
        self.registry.prune(t, &self.config);
        let changed = self.registry.take_changed();

        if changed {
            if let Some(cb) = self.callback {
                if !self.reentry_guard.get() {
                    self.reentry_guard.set(true);
                    cb(self.registry.active());
                    self.reentry_guard.set(false);
                }
            }
        }

        self.gate.release();
        changed
    }

    /// Copies the active set into a caller-supplied buffer (§4.6).
    ///
    /// Acquires the gate for the duration of the copy so a concurrent
    /// `ingest_frame`/`tick` from the other execution context (§5) can never
    /// observe or produce a partial read. Fails with [`DtcError::GateContended`]
    /// if the gate is held, or [`DtcError::BufferTooSmall`] if `buf` cannot
    /// hold every active record; returns the number of records copied.
    pub fn copy_active(&self, buf: &mut [DtcRecord]) -> crate::error::Result<usize> {
        if !self.gate.try_acquire() {
            return Err(crate::error::DtcError::GateContended);
        }
        let active = self.registry.active();
        if buf.len() < active.len() {
            self.gate.release();
            return Err(crate::error::DtcError::BufferTooSmall);
        }
        buf[..active.len()].copy_from_slice(active);
        let count = active.len();
        self.gate.release();
        Ok(count)
    }

    /// Allocates and returns an owned copy of the active set (§4.6).
    ///
    /// Acquires the gate for the duration of the copy, same as
    /// [`DtcContext::copy_active`]. The one point in this crate where
    /// ordinary heap allocation is used — every other path is preallocated
    /// and bounded (§5) — so the allocation itself is fallible via
    /// `try_reserve_exact` rather than aborting: a failure is reported as
    /// [`DtcError::AllocationFailed`] instead of crashing, exactly as §4.6
    /// requires ("No allocation failure crashes the system (except
    /// `dyn_copy_active`, which reports failure)").
    #[cfg(feature = "alloc")]
    pub fn dyn_copy_active(&self) -> crate::error::Result<alloc::vec::Vec<DtcRecord>> {
        if !self.gate.try_acquire() {
            return Err(crate::error::DtcError::GateContended);
        }
        let active = self.registry.active();
        let mut out = alloc::vec::Vec::new();
        if out.try_reserve_exact(active.len()).is_err() {
            self.gate.release();
            return Err(crate::error::DtcError::AllocationFailed);
        }
        out.extend_from_slice(active);
        self.gate.release();
        Ok(out)
    }

    /// Attempts to acquire the gate for a borrowed-reference read (§4.6).
    /// The caller must call [`DtcContext::unlock`] once finished.
    pub fn try_lock(&self) -> bool {
        self.gate.try_acquire()
    }

    /// Releases a gate previously acquired with [`DtcContext::try_lock`].
    pub fn unlock(&self) {
        self.gate.release();
    }

    /// Returns a borrowed view of the active set. The caller must hold the
    /// gate (via [`DtcContext::try_lock`]) for the entire duration the
    /// returned slice is used; reading outside the lock is a logic error
    /// (§4.6, §9).
    pub fn reference_active(&self) -> &[DtcRecord] {
        self.registry.active()
    }

    /// Returns the previously-active history ring, most-recently-deactivated
    /// last (a supplement to the core spec; see `SPEC_FULL.md`).
    pub fn previously_active(&self) -> &[crate::dtc::HistoryEntry] {
        self.registry.history()
    }

    /// Clears all candidate, active, and previously-active history state,
    /// and discards any in-flight BAM reassemblies (§4.6, `SPEC_FULL.md`).
    ///
    /// Sets `changed` iff the active set was non-empty before the call,
    /// matching the teacher's `clear_active_dtcs`/`clear_inactive_dtcs`
    /// (see DESIGN.md).
    pub fn clear_all(&mut self) {
        self.registry.clear_all();
        self.bam = BamTable::new();
    }
}

/// Capacity of the fixed buffer `copy_active` expects, for callers that want
/// to size one statically.
pub const ACTIVE_CAPACITY: usize = N_ACT;

//! DTC Registry (§4.4): the candidate→active→inactive debounce state
//! machine, plus the previously-active history ring (a supplement, see
//! `SPEC_FULL.md`).

use heapless::Vec;

use crate::config::FilterConfig;
use crate::dtc::{DtcKey, DtcObservation, DtcPayload, DtcRecord, HistoryEntry};
use crate::limits::{N_ACT, N_CAND, N_HIST};
use crate::types::Seconds;

/// The two bounded DTC sets plus the previously-active history ring.
#[derive(Default)]
pub struct Registry {
    candidates: Vec<DtcRecord, N_CAND>,
    active: Vec<DtcRecord, N_ACT>,
    history: Vec<HistoryEntry, N_HIST>,
    /// True iff an active-set mutation has occurred since the last
    /// successful tick observation (§3 I7).
    changed: bool,
}

/// Removes the element at `idx` by shifting every later element left by one,
/// preserving the insertion order observable in callback deliveries (§9
/// "Sequence-shift removal").
fn remove_ordered<const N: usize>(v: &mut Vec<DtcRecord, N>, idx: usize) -> DtcRecord {
    let removed = v[idx];
    for i in idx..v.len() - 1 {
        v[i] = v[i + 1];
    }
    v.truncate(v.len() - 1);
    removed
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> &[DtcRecord] {
        &self.active
    }

    pub fn candidates(&self) -> &[DtcRecord] {
        &self.candidates
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// True iff the active set changed since the flag was last cleared by
    /// [`Registry::take_changed`].
    pub fn changed(&self) -> bool {
        self.changed
    }

    /// Reads and clears the `changed` flag, as consulted by `tick`.
    pub fn take_changed(&mut self) -> bool {
        core::mem::replace(&mut self.changed, false)
    }

    /// Applies one decoded DTC observation to the registry (§4.4 Update).
    pub fn update(&mut self, t: Seconds, obs: DtcObservation, cfg: &FilterConfig) {
        let key = obs.key();
        let payload = DtcPayload {
            cm: obs.cm,
            oc: obs.oc,
            lamps: obs.lamps,
        };

        if let Some(rec) = self.active.iter_mut().find(|r| r.key == key) {
            rec.payload = payload;
            rec.last_seen = t;
            return;
        }

        if let Some(rec) = self.candidates.iter_mut().find(|r| r.key == key) {
            rec.payload = payload;
            rec.last_seen = t;
            rec.read_count = rec.read_count.saturating_add(1);
        } else if self
            .candidates
            .push(DtcRecord {
                key,
                payload,
                first_seen: t,
                last_seen: t,
                read_count: 1,
            })
            .is_err()
        {
            tracing::warn!(src = obs.src, spn = obs.spn, fmi = obs.fmi, "registry: candidates full, dropping observation");
            return;
        }

        self.promote(t, cfg);
    }

    /// Promotion pass: moves every eligible candidate into `active`,
    /// in candidate order (§4.4 step 4).
    fn promote(&mut self, t: Seconds, cfg: &FilterConfig) {
        let mut i = 0;
        while i < self.candidates.len() {
            let rec = self.candidates[i];
            let within_window = t.saturating_sub(rec.first_seen) <= cfg.window_active();
            let past_threshold = rec.read_count as u32 >= cfg.threshold_reads();

            if within_window && past_threshold {
                if self.active.push(rec).is_ok() {
                    remove_ordered(&mut self.candidates, i);
                    self.changed = true;
                    continue;
                }
                tracing::warn!(spn = rec.key.spn, fmi = rec.key.fmi, "registry: active set full, promotion declined");
            }
            i += 1;
        }
    }

    /// Prunes stale candidates and inactive DTCs (§4.4 Prune, invoked by
    /// `tick`).
    pub fn prune(&mut self, t: Seconds, cfg: &FilterConfig) {
        let mut i = 0;
        while i < self.candidates.len() {
            let rec = self.candidates[i];
            if t.saturating_sub(rec.first_seen) > cfg.window_active() {
                remove_ordered(&mut self.candidates, i);
            } else {
                i += 1;
            }
        }

        let mut i = 0;
        while i < self.active.len() {
            let rec = self.active[i];
            if t.saturating_sub(rec.last_seen) > cfg.window_inactive() {
                let removed = remove_ordered(&mut self.active, i);
                self.changed = true;
                self.record_history(removed.key, removed.last_seen);
            } else {
                i += 1;
            }
        }
    }

    fn record_history(&mut self, key: DtcKey, last_seen: Seconds) {
        if self.history.is_full() {
            self.history.remove(0);
        }
        let _ = self.history.push(HistoryEntry { key, last_seen });
    }

    /// Clears every candidate, active record, and history entry (a
    /// supplement to the core spec, grounded in the teacher's
    /// `clear_active_dtcs`/`clear_inactive_dtcs`; see `SPEC_FULL.md`).
    ///
    /// Sets `changed` iff `active` was non-empty before the call.
    pub fn clear_all(&mut self) {
        self.changed = !self.active.is_empty();
        self.candidates.clear();
        self.active.clear();
        self.history.clear();
    }
}

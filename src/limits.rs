//! Compile-time capacity constants (§6).
//!
//! Every collection in this crate is preallocated to one of these sizes —
//! there is no dynamic growth path anywhere in the core engine (the one
//! explicit exception, `dyn_copy_active`, lives behind the `alloc` feature
//! and is documented at its call site).

/// Number of concurrent in-flight BAM reassemblies the transport table can
/// track at once.
pub const N_MF: usize = 4;

/// Largest reassembled DM1 payload the transport table will accept.
pub const MAX_MF_SIZE: usize = 256;

/// Maximum number of DTCs awaiting promotion at any one time.
pub const N_CAND: usize = 40;

/// Maximum number of simultaneously active DTCs.
pub const N_ACT: usize = 20;

/// Maximum number of deactivated-DTC entries retained in the previously-active
/// history (a supplement to the spec's core Registry, see `SPEC_FULL.md`).
pub const N_HIST: usize = 20;

/// J1939 PGN for DM1 — Active Diagnostic Trouble Codes.
pub const PGN_DM1: u32 = 0x00FECA;

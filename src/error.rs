//! Error types for the DTC parser.
//!
//! Most failure modes in this crate (a full candidate table, an out-of-order
//! transport frame) are *soft*: reported only through a `tracing` event, with
//! no return-value signal at all, per §7/§8. The Observation API's copy paths
//! (§4.6) are the exception — `copy_active`/`dyn_copy_active` report their
//! two genuinely fallible outcomes (contended gate, undersized/unallocatable
//! destination) through `DtcError`.

use core::fmt;

/// Errors returned by [`crate::DtcContext`]'s copy-out observation methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtcError {
    /// The gate (§4.5) was held by the other execution context.
    GateContended,
    /// A caller-supplied buffer was too small for the requested copy.
    BufferTooSmall,
    /// The allocator-backed copy path failed (allocation failure).
    AllocationFailed,
}

impl fmt::Display for DtcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DtcError::GateContended => write!(f, "gate contended"),
            DtcError::BufferTooSmall => write!(f, "destination buffer too small"),
            DtcError::AllocationFailed => write!(f, "allocation failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DtcError {}

/// A specialized `Result` type for the fallible operations in this crate.
pub type Result<T> = core::result::Result<T, DtcError>;

//! Common types shared across the classifier, reassembler, and registry.

/// 29-bit extended CAN identifier.
pub type CanId = u32;

/// Integer-second timestamp, as supplied by the host's wall-clock source.
///
/// The library has no clock of its own (§5 of the design notes): every
/// timestamp comparison is driven by the `t` the caller passes into
/// [`crate::DtcContext::ingest_frame`] or [`crate::DtcContext::tick`].
pub type Seconds = u32;

/// A single CAN frame as it would arrive from a CAN controller.
///
/// Unlike a general-purpose CAN frame type, this one is fixed at exactly 8
/// data bytes and a 29-bit identifier, matching the wire contract this
/// parser consumes (§6) — no variable-length DLC, no CAN-FD, no RTR frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanFrame {
    /// 29-bit extended CAN identifier.
    pub id: CanId,
    /// The 8 data bytes carried by the frame.
    pub data: [u8; 8],
    /// Reception timestamp, in seconds.
    pub timestamp: Seconds,
}

impl CanFrame {
    /// Builds a frame from its wire fields.
    pub const fn new(id: CanId, data: [u8; 8], timestamp: Seconds) -> Self {
        Self {
            id,
            data,
            timestamp,
        }
    }
}

/// Configuration trait implemented by [`crate::config::FilterConfig`].
///
/// Kept distinct from the struct itself so the validation contract reads the
/// same way across this crate's configuration surface, however small.
pub trait Config {
    /// Validates the configuration's invariants.
    fn validate(&self) -> crate::error::Result<()>;
}

//! DM1 payload decoder (§4.2).
//!
//! Decodes a contiguous DM1 byte buffer — whether it arrived as a single CAN
//! frame or was just reassembled out of a BAM session — into zero or more
//! [`DtcObservation`]s, which the caller (almost always
//! [`crate::context::DtcContext`]) feeds into the registry.

use crate::dtc::{DtcObservation, Lamps};
use crate::types::Seconds;

/// Decodes a DM1 buffer and invokes `emit` once per decoded DTC tuple, in
/// frame order.
///
/// Returns the number of tuples emitted. Buffers shorter than 6 bytes are
/// dropped outright (§4.2); a first decoded SPN of zero discards the entire
/// message (an empty-DM1 convention carried over from the source behaviour —
/// see the Open Questions in `SPEC_FULL.md`). Zero SPNs appearing *after* the
/// first tuple are still emitted normally.
pub fn decode_dm1(src: u8, buf: &[u8], t: Seconds, mut emit: impl FnMut(DtcObservation)) -> usize {
    let len = buf.len();
    if len < 6 {
        tracing::trace!(len, "dm1: buffer too short, dropping");
        return 0;
    }

    let lamps = Lamps::from_prefix_byte(buf[0]);
    // buf[1] is reserved and intentionally ignored.

    let byte_at = |idx: usize| buf.get(idx).copied().unwrap_or(0);

    let mut emitted = 0;
    let mut i = 2;
    while i < len - 2 {
        let b0 = byte_at(i);
        let b1 = byte_at(i + 1);
        let b2 = byte_at(i + 2);
        let b3 = byte_at(i + 3);

        let spn = (((b2 & 0xE0) as u32) >> 5) << 16 | (b1 as u32) << 8 | b0 as u32;
        let fmi = b2 & 0x1F;
        let cm = (b3 >> 7) & 0x1;
        let oc = b3 & 0x7F;

        if emitted == 0 && spn == 0 {
            tracing::trace!(src, "dm1: first SPN is zero, discarding empty message");
            return 0;
        }

        emit(DtcObservation {
            src,
            spn,
            fmi,
            cm,
            oc,
            lamps,
        });
        emitted += 1;
        i += 4;
    }

    emitted
}

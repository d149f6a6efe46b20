#![cfg_attr(not(feature = "std"), no_std)]

//! A J1939 DM1 (Active Diagnostic Trouble Code) parser: CAN-ID
//! classification, BAM transport-protocol reassembly, and a debounced
//! candidate/active DTC registry, built for embedded hosts with bounded,
//! preallocated storage throughout the core engine.
//!
//! The crate is organised bottom-up, the same way as its source material:
//! wire-level decoding first, then the reassembly and registry state
//! machines that consume it, topped by [`DtcContext`], the owning handle a
//! host constructs once per CAN bus.

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod bam;
pub mod classify;
pub mod config;
pub mod context;
pub mod dm1;
pub mod dtc;
pub mod error;
pub mod gate;
pub mod limits;
pub mod registry;
pub mod types;

pub use context::{ChangeCallback, DtcContext, ACTIVE_CAPACITY};
pub use dtc::{DtcKey, DtcPayload, DtcRecord, HistoryEntry, Lamps};
pub use error::{DtcError, Result};
pub use types::{CanFrame, CanId, Config, Seconds};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#![forbid(unsafe_code)]

//! Input-event record format — pure data and codecs.
//!
//! Everything needed to describe, encode and decode a recorded input
//! session lives here. No file system, no logging, no locking: the
//! runtime crate owns all side effects.

/// Magic number at the start of every finalized record log ("TEST" read LE).
pub const RECORD_SIGNATURE: u32 = 0x5445_5354;

/// Record log format version written by this crate.
pub const RECORD_VERSION: u32 = 1;

pub mod events;
pub mod wire;
pub mod codec;
pub mod header;
pub mod time_log;
pub mod random;
pub mod ledger;
pub mod key_repeat;
pub mod state;
pub mod hashing;

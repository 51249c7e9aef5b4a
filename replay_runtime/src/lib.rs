#![forbid(unsafe_code)]

//! Input-event recorder runtime.
//!
//! Wraps the record format from `replay_kernel` with storage, the
//! record/playback channels, and the event manager the game loop polls.
//!
//! No format logic lives here — entries, headers and time deltas are
//! encoded and decoded by the kernel.

pub mod error;
pub mod config;
pub mod storage;
pub mod platform;
pub mod recorder;
pub mod playback;
pub mod time_channel;
pub mod manager;
pub mod log_reader;
pub mod drift;
pub mod session;

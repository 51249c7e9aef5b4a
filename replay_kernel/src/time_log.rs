//! Time-delta log — run-length coded millisecond deltas.
//!
//! Each entry is the difference between successive millisecond
//! readings. Deltas below 0xFF take one byte; anything larger is the
//! escape byte 0xFF followed by the full delta as u32 LE.

use std::io::{self, Read, Write};

use crate::wire::*;

/// Escape byte announcing a full 32-bit delta.
pub const DELTA_ESCAPE: u8 = 0xFF;

/// Write one delta. Returns the number of bytes written (1 or 5).
pub fn write_delta<W: Write + ?Sized>(out: &mut W, delta: u32) -> io::Result<usize> {
    if delta >= DELTA_ESCAPE as u32 {
        write_u8(out, DELTA_ESCAPE)?;
        write_u32_le(out, delta)?;
        Ok(5)
    } else {
        write_u8(out, delta as u8)?;
        Ok(1)
    }
}

/// Read one delta written by `write_delta`.
pub fn read_delta<R: Read + ?Sized>(input: &mut R) -> io::Result<u32> {
    let b = read_u8(input)?;
    if b == DELTA_ESCAPE {
        read_u32_le(input)
    } else {
        Ok(b as u32)
    }
}

/// Virtual millisecond clock shared by the recording and replaying sides.
///
/// Recording turns absolute readings into deltas; replaying turns deltas
/// back into absolute readings starting from the same origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeClock {
    last_millis: u32,
}

impl TimeClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_millis(&self) -> u32 {
        self.last_millis
    }

    /// Encode `millis` relative to the previous reading and advance.
    pub fn record<W: Write + ?Sized>(&mut self, out: &mut W, millis: u32) -> io::Result<usize> {
        let delta = millis.wrapping_sub(self.last_millis);
        let n = write_delta(out, delta)?;
        self.last_millis = millis;
        Ok(n)
    }

    /// Decode the next delta and return the reconstructed reading.
    pub fn replay<R: Read + ?Sized>(&mut self, input: &mut R) -> io::Result<u32> {
        let delta = read_delta(input)?;
        self.last_millis = self.last_millis.wrapping_add(delta);
        Ok(self.last_millis)
    }

    /// Advance without touching any stream (pass-through of a live reading).
    pub fn observe(&mut self, millis: u32) {
        self.last_millis = millis;
    }
}

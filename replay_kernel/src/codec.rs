//! Record codec — one `(diff, event)` log entry to and from bytes.
//!
//! Layout, little-endian:
//!   [diff: u32][tag: u32][payload]
//!
//! Payload by tag:
//!   - key down/up:        keycode i32, ascii u16, flags u8 (7 bytes)
//!   - mouse/button/wheel: x i16, y i16                     (4 bytes)
//!   - everything else:    nothing
//!
//! The `synthetic` flag is not persisted; decoded events are always
//! non-synthetic.

use std::io::{self, Read, Write};

use thiserror::Error;

use crate::events::*;
use crate::wire::*;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Failures while decoding log structures.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Underlying stream failed, including truncation (`UnexpectedEof`).
    #[error("record stream I/O failed: {0}")]
    Io(#[from] io::Error),

    /// Record log does not start with the expected magic number.
    #[error("unknown record file signature {found:#010x}")]
    BadSignature { found: u32 },
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// Header bytes every entry carries (diff + tag).
pub const ENTRY_HEADER_LEN: usize = 8;
const KEY_PAYLOAD_LEN: usize = 7;
const MOUSE_PAYLOAD_LEN: usize = 4;

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Append one log entry.
pub fn write_record<W: Write + ?Sized>(out: &mut W, diff: u32, event: &Event) -> io::Result<()> {
    write_u32_le(out, diff)?;
    write_u32_le(out, event.kind.tag())?;

    if let Some(key) = event.kind.key() {
        write_i32_le(out, key.keycode.0)?;
        write_u16_le(out, key.ascii)?;
        write_u8(out, key.flags)?;
    } else if let Some(pos) = event.kind.mouse() {
        write_i16_le(out, pos.x)?;
        write_i16_le(out, pos.y)?;
    }
    Ok(())
}

/// Encoded size of one entry for `event`.
pub fn record_len(event: &Event) -> usize {
    if event.kind.key().is_some() {
        ENTRY_HEADER_LEN + KEY_PAYLOAD_LEN
    } else if event.kind.mouse().is_some() {
        ENTRY_HEADER_LEN + MOUSE_PAYLOAD_LEN
    } else {
        ENTRY_HEADER_LEN
    }
}

/// Encode one entry into a fresh buffer.
pub fn encode_record(diff: u32, event: &Event) -> Vec<u8> {
    let mut buf = Vec::with_capacity(record_len(event));
    // Writing into a Vec cannot fail.
    let _ = write_record(&mut buf, diff, event);
    buf
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Read one log entry. Unknown tags become `EventKind::Other` with no payload.
pub fn read_record<R: Read + ?Sized>(input: &mut R) -> io::Result<(u32, Event)> {
    let diff = read_u32_le(input)?;
    let tag = read_u32_le(input)?;

    let kind = match tag {
        TAG_KEY_DOWN => EventKind::KeyDown(read_key(input)?),
        TAG_KEY_UP => EventKind::KeyUp(read_key(input)?),
        TAG_MOUSE_MOVE => EventKind::MouseMove(read_point(input)?),
        TAG_LBUTTON_DOWN => EventKind::LButtonDown(read_point(input)?),
        TAG_LBUTTON_UP => EventKind::LButtonUp(read_point(input)?),
        TAG_RBUTTON_DOWN => EventKind::RButtonDown(read_point(input)?),
        TAG_RBUTTON_UP => EventKind::RButtonUp(read_point(input)?),
        TAG_WHEEL_UP => EventKind::WheelUp(read_point(input)?),
        TAG_WHEEL_DOWN => EventKind::WheelDown(read_point(input)?),
        TAG_QUIT => EventKind::Quit,
        TAG_SCREEN_CHANGED => EventKind::ScreenChanged,
        TAG_PREDICTIVE_DIALOG => EventKind::PredictiveDialog,
        TAG_MAIN_MENU => EventKind::MainMenu,
        TAG_RETURN_TO_LAUNCHER => EventKind::ReturnToLauncher,
        other => EventKind::Other(other),
    };

    Ok((diff, Event::new(kind)))
}

fn read_key<R: Read + ?Sized>(input: &mut R) -> io::Result<KeyState> {
    let keycode = KeyCode(read_i32_le(input)?);
    let ascii = read_u16_le(input)?;
    let flags = read_u8(input)?;
    Ok(KeyState { keycode, ascii, flags })
}

fn read_point<R: Read + ?Sized>(input: &mut R) -> io::Result<Point> {
    let x = read_i16_le(input)?;
    let y = read_i16_le(input)?;
    Ok(Point { x, y })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

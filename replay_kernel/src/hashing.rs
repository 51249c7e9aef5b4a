/// Stream digests — canonical hashing of delivered event streams.
///
/// Two sessions are considered identical when they delivered the same
/// events at the same event ticks. The canonical form is the record
/// codec itself, with the absolute tick in place of the relative diff,
/// followed by one byte for the synthetic flag.

use sha2::{Digest, Sha256};

use crate::codec::write_record;
use crate::events::Event;

/// One delivered event and the event tick it arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivered {
    pub tick: u32,
    pub event: Event,
}

/// Canonical byte form of a delivered stream.
pub fn canonical_serialize(stream: &[Delivered]) -> Vec<u8> {
    let mut buf = Vec::new();
    for d in stream {
        // Vec<u8> writes are infallible.
        let _ = write_record(&mut buf, d.tick, &d.event);
        buf.push(u8::from(d.event.synthetic));
    }
    buf
}

/// SHA-256 of the canonical form. Lowercase hex.
pub fn stream_digest(stream: &[Delivered]) -> String {
    let digest = Sha256::digest(canonical_serialize(stream));
    digest
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<String>()
}

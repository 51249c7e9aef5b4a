//! Key-repeat tracker.
//!
//! Tracks at most one held key. A press while another key is held is
//! ignored for repeat purposes; only releasing the tracked key stops
//! the stream.

use crate::events::{Event, EventKind, KeyCode, KeyState};

/// Delay before the first repeat, in milliseconds.
pub const KEY_REPEAT_INITIAL_DELAY: u32 = 400;
/// Interval between subsequent repeats, in milliseconds.
pub const KEY_REPEAT_SUSTAIN_DELAY: u32 = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyRepeat {
    held: Option<KeyState>,
    next_fire: u32,
}

impl KeyRepeat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn held(&self) -> Option<&KeyState> {
        self.held.as_ref()
    }

    /// Start tracking `key` unless another key is already held.
    pub fn key_down(&mut self, key: &KeyState, now: u32) {
        if self.held.is_some() || key.keycode == KeyCode::INVALID {
            return;
        }
        self.held = Some(*key);
        self.next_fire = now.wrapping_add(KEY_REPEAT_INITIAL_DELAY);
    }

    /// Stop tracking if `keycode` is the tracked key.
    pub fn key_up(&mut self, keycode: KeyCode) {
        if self.held.map(|k| k.keycode) == Some(keycode) {
            self.held = None;
        }
    }

    /// Synthesize a repeat if the deadline passed strictly before `now`.
    pub fn poll(&mut self, now: u32) -> Option<Event> {
        let key = self.held?;
        if self.next_fire >= now {
            return None;
        }
        self.next_fire = now.wrapping_add(KEY_REPEAT_SUSTAIN_DELAY);
        Some(Event {
            kind: EventKind::KeyDown(key),
            synthetic: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeats_after_initial_then_sustain() {
        let mut kr = KeyRepeat::new();
        let k = KeyState::ascii(b'k');
        kr.key_down(&k, 1000);
        assert!(kr.poll(1400).is_none());
        let evt = kr.poll(1401).unwrap();
        assert!(evt.synthetic);
        assert_eq!(evt.kind, EventKind::KeyDown(k));
        assert!(kr.poll(1501).is_none());
        assert!(kr.poll(1502).is_some());
    }

    #[test]
    fn second_key_does_not_take_over() {
        let mut kr = KeyRepeat::new();
        let k = KeyState::ascii(b'k');
        let j = KeyState::ascii(b'j');
        kr.key_down(&k, 0);
        kr.key_down(&j, 300);
        assert_eq!(kr.held(), Some(&k));
        let evt = kr.poll(401).unwrap();
        assert_eq!(evt.kind, EventKind::KeyDown(k));

        // Releasing the other key leaves the stream running.
        kr.key_up(j.keycode);
        assert!(kr.poll(502).is_some());

        kr.key_up(k.keycode);
        assert!(kr.poll(10_000).is_none());
        assert!(kr.held().is_none());
    }
}

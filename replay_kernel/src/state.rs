//! Shadow input state — what the game can ask about without polling.

use crate::events::{Event, EventKind, Point};

pub const LBUTTON: u8 = 1 << 0;
pub const RBUTTON: u8 = 1 << 1;

/// Modifier flags, pressed mouse buttons and last pointer position,
/// as seen through the stream of delivered events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub modifiers: u8,
    pub buttons: u8,
    pub mouse: Point,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one delivered event into the shadow state.
    pub fn apply(&mut self, event: &Event) {
        match event.kind {
            EventKind::KeyDown(k) | EventKind::KeyUp(k) => self.modifiers = k.flags,
            EventKind::MouseMove(p) => self.mouse = p,
            EventKind::LButtonDown(p) => {
                self.mouse = p;
                self.buttons |= LBUTTON;
            }
            EventKind::LButtonUp(p) => {
                self.mouse = p;
                self.buttons &= !LBUTTON;
            }
            EventKind::RButtonDown(p) => {
                self.mouse = p;
                self.buttons |= RBUTTON;
            }
            EventKind::RButtonUp(p) => {
                self.mouse = p;
                self.buttons &= !RBUTTON;
            }
            // Wheel events do not move the tracked pointer.
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{KeyCode, KeyState, KBD_ALT};

    #[test]
    fn buttons_and_position_follow_events() {
        let mut s = InputState::new();
        s.apply(&Event::new(EventKind::LButtonDown(Point::new(5, 6))));
        s.apply(&Event::new(EventKind::RButtonDown(Point::new(7, 8))));
        assert_eq!(s.buttons, LBUTTON | RBUTTON);
        assert_eq!(s.mouse, Point::new(7, 8));
        s.apply(&Event::new(EventKind::LButtonUp(Point::new(9, 9))));
        assert_eq!(s.buttons, RBUTTON);
        s.apply(&Event::new(EventKind::WheelUp(Point::new(0, 0))));
        assert_eq!(s.mouse, Point::new(9, 9));
    }

    #[test]
    fn modifiers_come_from_key_events() {
        let mut s = InputState::new();
        s.apply(&Event::key_down(KeyState::new(KeyCode::TAB, 9, KBD_ALT)));
        assert_eq!(s.modifiers, KBD_ALT);
        s.apply(&Event::key_up(KeyState::new(KeyCode::TAB, 9, 0)));
        assert_eq!(s.modifiers, 0);
    }
}

//! Input event definitions.
//!
//! Events are pure data. A closed enum with one catch-all variant:
//! tags this crate does not know about decode to `EventKind::Other`
//! and carry no payload, so older readers keep working on newer logs.

use serde::{Deserialize, Serialize};

// ── Wire tags ──────────────────────────────────────────────────────

pub const TAG_KEY_DOWN: u32 = 1;
pub const TAG_KEY_UP: u32 = 2;
pub const TAG_MOUSE_MOVE: u32 = 3;
pub const TAG_LBUTTON_DOWN: u32 = 4;
pub const TAG_LBUTTON_UP: u32 = 5;
pub const TAG_RBUTTON_DOWN: u32 = 6;
pub const TAG_RBUTTON_UP: u32 = 7;
pub const TAG_WHEEL_UP: u32 = 8;
pub const TAG_WHEEL_DOWN: u32 = 9;
pub const TAG_QUIT: u32 = 10;
pub const TAG_SCREEN_CHANGED: u32 = 11;
pub const TAG_PREDICTIVE_DIALOG: u32 = 12;
pub const TAG_MAIN_MENU: u32 = 15;
pub const TAG_RETURN_TO_LAUNCHER: u32 = 16;

// ── Modifier flags ─────────────────────────────────────────────────

pub const KBD_CTRL: u8 = 1 << 0;
pub const KBD_ALT: u8 = 1 << 1;
pub const KBD_SHIFT: u8 = 1 << 2;

/// Key identity as reported by the platform layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCode(pub i32);

impl KeyCode {
    /// No key. Used by the key-repeat tracker to mean "nothing held".
    pub const INVALID: KeyCode = KeyCode(0);
    pub const BACKSPACE: KeyCode = KeyCode(8);
    pub const TAB: KeyCode = KeyCode(9);
    pub const RETURN: KeyCode = KeyCode(13);
    pub const ESCAPE: KeyCode = KeyCode(27);
    pub const SPACE: KeyCode = KeyCode(32);
    pub const UP: KeyCode = KeyCode(273);
    pub const DOWN: KeyCode = KeyCode(274);
    pub const RIGHT: KeyCode = KeyCode(275);
    pub const LEFT: KeyCode = KeyCode(276);
    pub const F1: KeyCode = KeyCode(282);
    pub const F5: KeyCode = KeyCode(286);
    pub const F11: KeyCode = KeyCode(292);

    /// Key code for a printable ASCII letter or digit (lowercase for letters).
    pub fn from_ascii(c: u8) -> KeyCode {
        KeyCode(c.to_ascii_lowercase() as i32)
    }
}

/// Keyboard payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyState {
    pub keycode: KeyCode,
    pub ascii: u16,
    pub flags: u8,
}

impl KeyState {
    pub fn new(keycode: KeyCode, ascii: u16, flags: u8) -> Self {
        Self { keycode, ascii, flags }
    }

    /// Plain key press of a printable character, no modifiers.
    pub fn ascii(c: u8) -> Self {
        Self::new(KeyCode::from_ascii(c), c as u16, 0)
    }
}

/// Pointer payload, screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i16,
    pub y: i16,
}

impl Point {
    pub fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }
}

/// What happened, with the payload that tag carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EventKind {
    KeyDown(KeyState),
    KeyUp(KeyState),
    MouseMove(Point),
    LButtonDown(Point),
    LButtonUp(Point),
    RButtonDown(Point),
    RButtonUp(Point),
    WheelUp(Point),
    WheelDown(Point),
    Quit,
    ScreenChanged,
    PredictiveDialog,
    MainMenu,
    ReturnToLauncher,
    /// Any tag not listed above. Never carries a payload.
    Other(u32),
}

impl EventKind {
    /// Numeric tag written to the record log.
    pub fn tag(&self) -> u32 {
        match self {
            EventKind::KeyDown(_) => TAG_KEY_DOWN,
            EventKind::KeyUp(_) => TAG_KEY_UP,
            EventKind::MouseMove(_) => TAG_MOUSE_MOVE,
            EventKind::LButtonDown(_) => TAG_LBUTTON_DOWN,
            EventKind::LButtonUp(_) => TAG_LBUTTON_UP,
            EventKind::RButtonDown(_) => TAG_RBUTTON_DOWN,
            EventKind::RButtonUp(_) => TAG_RBUTTON_UP,
            EventKind::WheelUp(_) => TAG_WHEEL_UP,
            EventKind::WheelDown(_) => TAG_WHEEL_DOWN,
            EventKind::Quit => TAG_QUIT,
            EventKind::ScreenChanged => TAG_SCREEN_CHANGED,
            EventKind::PredictiveDialog => TAG_PREDICTIVE_DIALOG,
            EventKind::MainMenu => TAG_MAIN_MENU,
            EventKind::ReturnToLauncher => TAG_RETURN_TO_LAUNCHER,
            EventKind::Other(tag) => *tag,
        }
    }

    /// Keyboard payload, if this is a key event.
    pub fn key(&self) -> Option<&KeyState> {
        match self {
            EventKind::KeyDown(k) | EventKind::KeyUp(k) => Some(k),
            _ => None,
        }
    }

    /// Pointer payload, if this is a mouse event.
    pub fn mouse(&self) -> Option<Point> {
        match self {
            EventKind::MouseMove(p)
            | EventKind::LButtonDown(p)
            | EventKind::LButtonUp(p)
            | EventKind::RButtonDown(p)
            | EventKind::RButtonUp(p)
            | EventKind::WheelUp(p)
            | EventKind::WheelDown(p) => Some(*p),
            _ => None,
        }
    }
}

/// A single input event as handed to the game loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    /// Set when the event manager manufactured the event (key repeat),
    /// as opposed to it coming from the platform or the log.
    #[serde(default)]
    pub synthetic: bool,
}

impl Event {
    pub fn new(kind: EventKind) -> Self {
        Self { kind, synthetic: false }
    }

    pub fn key_down(key: KeyState) -> Self {
        Self::new(EventKind::KeyDown(key))
    }

    pub fn key_up(key: KeyState) -> Self {
        Self::new(EventKind::KeyUp(key))
    }

    pub fn mouse_move(x: i16, y: i16) -> Self {
        Self::new(EventKind::MouseMove(Point::new(x, y)))
    }

    pub fn quit() -> Self {
        Self::new(EventKind::Quit)
    }

    pub fn is_quit(&self) -> bool {
        matches!(self.kind, EventKind::Quit)
    }
}

impl From<EventKind> for Event {
    fn from(kind: EventKind) -> Self {
        Event::new(kind)
    }
}

//! Collaborator traits — the platform event source and the host
//! application. The event manager owns one of each, injected at
//! construction.

use std::collections::VecDeque;

use replay_kernel::events::Event;

/// Native input and clock of the backend.
pub trait EventSource {
    /// Next hardware event, if one is pending.
    fn poll_native_event(&mut self) -> Option<Event>;

    /// Milliseconds since an arbitrary, fixed origin.
    fn millis(&self) -> u32;

    /// Move the visible cursor.
    fn warp_mouse(&mut self, x: i16, y: i16);
}

/// What the user picked in the global main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuAction {
    #[default]
    Resume,
    Quit,
    ReturnToLauncher,
}

/// The running game engine and its modal UI, as seen by the event manager.
pub trait Host {
    fn is_paused(&self) -> bool;

    fn pause_engine(&mut self, pause: bool);

    /// Run the global main menu until it is dismissed.
    fn main_menu_dialog(&mut self) -> MenuAction;

    /// Ask the user a yes/no question. `true` means yes.
    fn confirm_quit(&mut self, message: &str) -> bool;
}

/// Host for tools and tests with no engine attached: never paused,
/// the menu resumes immediately, quitting is always confirmed.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessHost;

impl Host for HeadlessHost {
    fn is_paused(&self) -> bool {
        false
    }

    fn pause_engine(&mut self, _pause: bool) {}

    fn main_menu_dialog(&mut self) -> MenuAction {
        MenuAction::Resume
    }

    fn confirm_quit(&mut self, _message: &str) -> bool {
        true
    }
}

/// Deterministic source for tools and tests.
///
/// Each native poll consumes one frame and advances the clock by
/// `step_ms`; an exhausted script keeps returning `None`. Cursor warps
/// are remembered so callers can check them.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    frames: VecDeque<Option<Event>>,
    now: u32,
    step_ms: u32,
    warps: Vec<(i16, i16)>,
}

impl ScriptedSource {
    pub fn new(frames: impl IntoIterator<Item = Option<Event>>, step_ms: u32) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            now: 0,
            step_ms,
            warps: Vec::new(),
        }
    }

    /// A source that never produces input, only time.
    pub fn idle(step_ms: u32) -> Self {
        Self::new(std::iter::empty(), step_ms)
    }

    pub fn push_frame(&mut self, frame: Option<Event>) {
        self.frames.push_back(frame);
    }

    pub fn set_millis(&mut self, now: u32) {
        self.now = now;
    }

    pub fn warps(&self) -> &[(i16, i16)] {
        &self.warps
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl EventSource for ScriptedSource {
    fn poll_native_event(&mut self) -> Option<Event> {
        self.now = self.now.wrapping_add(self.step_ms);
        self.frames.pop_front().flatten()
    }

    fn millis(&self) -> u32 {
        self.now
    }

    fn warp_mouse(&mut self, x: i16, y: i16) {
        self.warps.push((x, y));
    }
}

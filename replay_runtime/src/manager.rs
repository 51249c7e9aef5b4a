//! Event manager — the polling front end with record/playback.
//!
//! Every poll goes through here. In pass-through the platform stream is
//! handed on unchanged (plus key repeat and the global hot keys). In
//! record mode each delivered event is appended to the log together
//! with the number of polls since the previous one. In playback the
//! platform stream is discarded and logged events are delivered on the
//! same poll count they were recorded on.
//!
//! Two locks, always taken time-first when both are needed:
//!   - time lock:     time channel + virtual clock (`TimeHandle`)
//!   - recorder lock: event channel, tick counters, seed ledger

use std::collections::VecDeque;
use std::mem;
use std::sync::Arc;

use parking_lot::Mutex;
use replay_kernel::events::{Event, EventKind, KeyCode, Point};
use replay_kernel::key_repeat::KeyRepeat;
use replay_kernel::random::SeededRandom;
use replay_kernel::state::InputState;
use tracing::{debug, error, info, warn};

use crate::config::{ConfigManager, RecordMode, RecorderSettings, KEY_SUBTITLES};
use crate::error::{RecorderError, Result};
use crate::platform::{EventSource, Host, MenuAction};
use crate::playback::{open_playback, EventPlayer};
use crate::recorder::{open_recording, EventRecorder, FinalizeReport};
use crate::storage::SaveFileManager;
use crate::time_channel::{TimeChannel, TimeHandle};

/// Key that opens the global main menu.
pub const MAIN_MENU_HOTKEY: KeyCode = KeyCode::F11;

/// Prompt shown when quitting needs confirmation.
pub const QUIT_PROMPT: &str = "Do you really want to quit?";

enum EventChannel {
    Idle,
    Recording(EventRecorder),
    Playback(EventPlayer),
}

struct RecorderState {
    channel: EventChannel,
    /// Polls seen since the manager started (record/playback only).
    event_count: u32,
    /// `event_count` at the last recorded or delivered log entry.
    last_event_count: u32,
}

pub struct EventManager<S: EventSource, H: Host> {
    source: S,
    host: H,
    storage: Arc<dyn SaveFileManager>,
    mode: RecordMode,
    confirm_exit: bool,
    recorder: Mutex<RecorderState>,
    time: TimeHandle,
    queue: VecDeque<Event>,
    key_repeat: KeyRepeat,
    input: InputState,
    should_quit: bool,
    should_rtl: bool,
}

impl<S: EventSource, H: Host> EventManager<S, H> {
    /// Build a manager in the mode `config` asks for.
    ///
    /// If the logs for that mode cannot be opened the manager runs in
    /// pass-through instead; the reason is logged, never returned.
    /// Starting playback writes the recorded `subtitles` flag back into
    /// `config`.
    pub fn new(
        source: S,
        host: H,
        storage: Arc<dyn SaveFileManager>,
        config: &mut ConfigManager,
    ) -> Self {
        let settings = RecorderSettings::from_config(config);

        let (mode, channel, time_channel) = match settings.mode {
            RecordMode::PassThrough => (RecordMode::PassThrough, EventChannel::Idle, TimeChannel::Idle),
            RecordMode::Record => match open_recording(storage.as_ref(), &settings) {
                Ok((events, time)) => {
                    info!(
                        temp_file = %settings.record_temp_file_name,
                        time_file = %settings.record_time_file_name,
                        "recording input events"
                    );
                    (
                        RecordMode::Record,
                        EventChannel::Recording(events),
                        TimeChannel::Recording(time),
                    )
                }
                Err(e) => {
                    warn!("{}. Recording was switched off", e);
                    (RecordMode::PassThrough, EventChannel::Idle, TimeChannel::Idle)
                }
            },
            RecordMode::Playback => match open_playback(storage.as_ref(), &settings) {
                Ok((events, time)) => {
                    config.set_bool(KEY_SUBTITLES, events.subtitles());
                    info!(
                        file = %settings.record_file_name,
                        records = events.record_count(),
                        "playing back input events"
                    );
                    (
                        RecordMode::Playback,
                        EventChannel::Playback(events),
                        TimeChannel::Playback(time),
                    )
                }
                Err(e @ RecorderError::BadSignature { .. }) => {
                    error!("{}. Playback was switched off", e);
                    (RecordMode::PassThrough, EventChannel::Idle, TimeChannel::Idle)
                }
                Err(e) => {
                    warn!("{}. Playback was switched off", e);
                    (RecordMode::PassThrough, EventChannel::Idle, TimeChannel::Idle)
                }
            },
        };

        Self {
            source,
            host,
            storage,
            mode,
            confirm_exit: settings.confirm_exit,
            recorder: Mutex::new(RecorderState {
                channel,
                event_count: 0,
                last_event_count: 0,
            }),
            time: TimeHandle::new(time_channel),
            queue: VecDeque::new(),
            key_repeat: KeyRepeat::new(),
            input: InputState::new(),
            should_quit: false,
            should_rtl: false,
        }
    }

    /// Next event for the game loop, or `None` if nothing is pending.
    pub fn poll_event(&mut self) -> Option<Event> {
        let time = self.source.millis();

        let mut found = match self.queue.pop_front() {
            Some(event) => Some(event),
            None => self.source.poll_native_event(),
        };

        if self.mode != RecordMode::PassThrough {
            let mut guard = self.recorder.lock();
            let rec = &mut *guard;
            rec.event_count = rec.event_count.wrapping_add(1);
            let since_last = rec.event_count.wrapping_sub(rec.last_event_count);

            match &mut rec.channel {
                EventChannel::Playback(player) => {
                    // A live quit always gets through, so a stuck replay can be left.
                    if !found.map_or(false, |e| e.is_quit()) {
                        found = player.step(since_last, &mut self.source);
                        if found.is_some() {
                            rec.last_event_count = rec.event_count;
                        }
                    }
                }
                EventChannel::Recording(recorder) => {
                    if let Some(event) = &found {
                        if let Err(e) = recorder.record(since_last, event) {
                            error!("{}. Event recording stopped", e);
                        }
                        rec.last_event_count = rec.event_count;
                    }
                }
                EventChannel::Idle => {}
            }
        }

        match found {
            Some(mut event) => {
                event.synthetic = false;
                self.input.apply(&event);
                self.dispatch(event, time)
            }
            None => self.key_repeat.poll(time),
        }
    }

    /// Side effects of a delivered event. `None` means it was swallowed.
    fn dispatch(&mut self, mut event: Event, time: u32) -> Option<Event> {
        match event.kind {
            EventKind::KeyDown(key) => {
                self.key_repeat.key_down(&key, time);
                if key.keycode == MAIN_MENU_HOTKEY && !self.host.is_paused() {
                    self.push_event(Event::new(EventKind::MainMenu));
                }
            }
            EventKind::KeyUp(key) => self.key_repeat.key_up(key.keycode),
            EventKind::MainMenu => {
                if !self.host.is_paused() {
                    match self.host.main_menu_dialog() {
                        MenuAction::Resume => {}
                        MenuAction::Quit => self.should_quit = true,
                        MenuAction::ReturnToLauncher => {
                            self.should_rtl = true;
                            self.should_quit = true;
                        }
                    }
                }
                if self.should_quit {
                    event.kind = EventKind::Quit;
                }
            }
            EventKind::ReturnToLauncher => {
                self.should_rtl = true;
                self.should_quit = true;
            }
            EventKind::Quit => {
                if self.confirm_exit {
                    self.host.pause_engine(true);
                    let confirmed = self.host.confirm_quit(QUIT_PROMPT);
                    self.host.pause_engine(false);
                    self.should_quit = confirmed;
                    if !confirmed {
                        debug!("quit cancelled by user");
                        return None;
                    }
                } else {
                    self.should_quit = true;
                }
            }
            _ => {}
        }
        Some(event)
    }

    /// Queue a manufactured event ahead of platform input.
    ///
    /// A quit is dropped if one was already accepted or is still queued.
    pub fn push_event(&mut self, event: Event) {
        if event.is_quit() && (self.should_quit || self.queue.iter().any(Event::is_quit)) {
            debug!("duplicate quit event ignored");
            return;
        }
        self.queue.push_back(event);
    }

    /// Recording: remember `rng`'s seed. Playback: overwrite it with the
    /// next seed recorded under `name`.
    pub fn register_random_source(&self, rng: &mut dyn SeededRandom, name: &str) {
        let mut rec = self.recorder.lock();
        match &mut rec.channel {
            EventChannel::Recording(recorder) => recorder.capture_seed(rng, name),
            EventChannel::Playback(player) => {
                if !player.restore_seed(rng, name) {
                    warn!(source = name, "no recorded seed for random source");
                }
            }
            EventChannel::Idle => {}
        }
    }

    /// Record `millis`, or replace it with the replayed value.
    pub fn process_millis(&self, millis: &mut u32) {
        self.time.process_millis(millis);
    }

    /// Handle for other threads that need `process_millis`.
    pub fn time_handle(&self) -> TimeHandle {
        self.time.clone()
    }

    /// Write the final record log. Returns `None` unless a recording was
    /// running. Afterwards the manager is in pass-through.
    pub fn finalize(&mut self) -> Result<Option<FinalizeReport>> {
        let (channel, time_channel) = {
            let mut time = self.time.lock();
            let mut rec = self.recorder.lock();
            self.mode = RecordMode::PassThrough;
            (
                mem::replace(&mut rec.channel, EventChannel::Idle),
                mem::replace(&mut time.channel, TimeChannel::Idle),
            )
        };
        self.queue.clear();

        match (channel, time_channel) {
            (EventChannel::Recording(events), TimeChannel::Recording(time)) => {
                let time_count = time.close()?;
                events
                    .finalize(self.storage.as_ref(), time_count)
                    .map(Some)
            }
            (EventChannel::Recording(events), _) => {
                warn!("time log missing at finalize");
                events.finalize(self.storage.as_ref(), 0).map(Some)
            }
            _ => Ok(None),
        }
    }

    pub fn mode(&self) -> RecordMode {
        self.mode
    }

    /// Polls counted since construction (zero in pass-through).
    pub fn event_count(&self) -> u32 {
        self.recorder.lock().event_count
    }

    pub fn button_state(&self) -> u8 {
        self.input.buttons
    }

    pub fn modifier_state(&self) -> u8 {
        self.input.modifiers
    }

    pub fn mouse_pos(&self) -> Point {
        self.input.mouse
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn should_rtl(&self) -> bool {
        self.should_rtl
    }

    pub fn reset_rtl(&mut self) {
        self.should_rtl = false;
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn host(&self) -> &H {
        &self.host
    }
}

impl<S: EventSource, H: Host> Drop for EventManager<S, H> {
    fn drop(&mut self) {
        if self.mode != RecordMode::Record {
            return;
        }
        warn!("event manager dropped while recording, finalizing now");
        if let Err(e) = self.finalize() {
            error!("{}", e);
        }
    }
}

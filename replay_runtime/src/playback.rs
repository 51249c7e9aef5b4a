//! Playback side — header load and the per-poll stepper.
//!
//! The stepper holds at most one decoded entry. It is read lazily the
//! first time a poll needs it and delivered once enough event ticks
//! have passed since the previous delivery.

use replay_kernel::codec::read_record;
use replay_kernel::events::Event;
use replay_kernel::header::LogHeader;
use replay_kernel::ledger::SeedLedger;
use replay_kernel::random::SeededRandom;
use replay_kernel::RECORD_VERSION;
use tracing::{debug, error, warn};

use crate::config::RecorderSettings;
use crate::error::{RecorderError, Result};
use crate::platform::EventSource;
use crate::storage::{InSaveFile, SaveFileManager};
use crate::time_channel::TimePlayer;

/// Event half of an open playback.
pub struct EventPlayer {
    file: InSaveFile,
    name: String,
    record_count: u32,
    played: u32,
    subtitles: bool,
    ledger: SeedLedger,
    pending: Option<(u32, Event)>,
    failed: bool,
}

/// Open both logs and read the record header.
///
/// Either file missing, or a bad signature, fails the whole playback.
pub fn open_playback(
    storage: &dyn SaveFileManager,
    settings: &RecorderSettings,
) -> Result<(EventPlayer, TimePlayer)> {
    let name = settings.record_file_name.clone();
    let mut file = storage
        .open_for_loading(&name)
        .ok_or_else(|| RecorderError::OpenForLoading(name.clone()))?;
    let mut time = TimePlayer::open(storage, &settings.record_time_file_name)?;

    let header =
        LogHeader::read_from(&mut file).map_err(|e| RecorderError::from_codec(&name, e))?;
    if header.version != RECORD_VERSION {
        warn!(
            file = %name,
            version = header.version,
            expected = RECORD_VERSION,
            "record file version differs, playing back anyway"
        );
    }
    time.set_total(header.time_count);

    let player = EventPlayer {
        file,
        name,
        record_count: header.record_count,
        played: 0,
        subtitles: header.subtitles,
        ledger: header.ledger,
        pending: None,
        failed: false,
    };
    Ok((player, time))
}

impl EventPlayer {
    /// Deliver the next logged event if it is due.
    ///
    /// `since_last` is the number of event ticks since the previous
    /// delivery. Pointer events warp the cursor to their recorded
    /// position before they are returned.
    pub fn step<S: EventSource + ?Sized>(&mut self, since_last: u32, source: &mut S) -> Option<Event> {
        if self.pending.is_none() && !self.failed && self.played < self.record_count {
            match read_record(&mut self.file) {
                Ok(entry) => {
                    self.played += 1;
                    self.pending = Some(entry);
                    if self.played == self.record_count {
                        debug!(file = %self.name, "last record entry loaded");
                    }
                }
                Err(e) => {
                    error!(
                        file = %self.name,
                        entry = self.played,
                        error = %e,
                        "record file read failed, playback stopped"
                    );
                    self.failed = true;
                }
            }
        }

        let (diff, event) = self.pending?;
        if diff > since_last {
            return None;
        }
        if let Some(pos) = event.kind.mouse() {
            source.warp_mouse(pos.x, pos.y);
        }
        self.pending = None;
        Some(event)
    }

    /// Apply the next seed recorded under `name`, if any.
    pub fn restore_seed(&mut self, rng: &mut dyn SeededRandom, name: &str) -> bool {
        self.ledger.restore(rng, name)
    }

    /// Subtitles setting captured when the log was recorded.
    pub fn subtitles(&self) -> bool {
        self.subtitles
    }

    pub fn record_count(&self) -> u32 {
        self.record_count
    }
}

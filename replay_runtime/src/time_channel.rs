//! Time channel — the millisecond path, behind its own lock.
//!
//! Timer and audio callbacks may ask for the time while the main loop
//! is polling events, so this state is shared through `TimeHandle`
//! and never touches the recorder lock.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use replay_kernel::time_log::TimeClock;
use tracing::error;

use crate::error::{RecorderError, Result};
use crate::storage::{InSaveFile, OutSaveFile, SaveFileManager};

/// Writes time deltas while recording.
pub struct TimeRecorder {
    file: Box<dyn OutSaveFile>,
    name: String,
    count: u32,
    failed: bool,
}

impl TimeRecorder {
    pub fn open(storage: &dyn SaveFileManager, name: &str) -> Result<Self> {
        let file = storage
            .open_for_saving(name)
            .ok_or_else(|| RecorderError::OpenForSaving(name.to_string()))?;
        Ok(Self {
            file,
            name: name.to_string(),
            count: 0,
            failed: false,
        })
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Flush and close. Returns the number of entries written before
    /// any write failure.
    pub fn close(mut self) -> Result<u32> {
        self.file
            .finalize()
            .map_err(|e| RecorderError::io(&self.name, e))?;
        Ok(self.count)
    }
}

/// Reads time deltas while replaying.
pub struct TimePlayer {
    file: InSaveFile,
    name: String,
    total: u32,
    played: u32,
}

impl TimePlayer {
    pub fn open(storage: &dyn SaveFileManager, name: &str) -> Result<Self> {
        let file = storage
            .open_for_loading(name)
            .ok_or_else(|| RecorderError::OpenForLoading(name.to_string()))?;
        Ok(Self {
            file,
            name: name.to_string(),
            total: 0,
            played: 0,
        })
    }

    /// Number of entries the log header announced.
    pub fn set_total(&mut self, total: u32) {
        self.total = total;
    }
}

pub(crate) enum TimeChannel {
    Idle,
    Recording(TimeRecorder),
    Playback(TimePlayer),
}

pub(crate) struct TimeState {
    pub(crate) channel: TimeChannel,
    clock: TimeClock,
}

impl TimeState {
    fn process(&mut self, millis: &mut u32) {
        let mut failed = false;
        match &mut self.channel {
            TimeChannel::Idle => return,
            TimeChannel::Recording(rec) => {
                if rec.failed {
                    return;
                }
                match self.clock.record(rec.file.as_mut(), *millis) {
                    Ok(_) => rec.count += 1,
                    Err(e) => {
                        error!(file = %rec.name, error = %e, "time log write failed, time recording stopped");
                        rec.failed = true;
                    }
                }
            }
            TimeChannel::Playback(player) => {
                if player.played < player.total {
                    match self.clock.replay(&mut player.file) {
                        Ok(replayed) => {
                            *millis = replayed;
                            player.played += 1;
                        }
                        Err(e) => {
                            error!(file = %player.name, error = %e, "time log read failed, time playback stopped");
                            failed = true;
                        }
                    }
                }
            }
        }
        if failed {
            self.channel = TimeChannel::Idle;
            return;
        }
        self.clock.observe(*millis);
    }
}

/// Cloneable, thread-safe access to the time channel.
#[derive(Clone)]
pub struct TimeHandle {
    inner: Arc<Mutex<TimeState>>,
}

impl TimeHandle {
    pub(crate) fn new(channel: TimeChannel) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TimeState {
                channel,
                clock: TimeClock::new(),
            })),
        }
    }

    /// Record `millis`, or replace it with the replayed reading.
    /// Does nothing in pass-through.
    pub fn process_millis(&self, millis: &mut u32) {
        self.inner.lock().process(millis);
    }

    /// Last reading that went through the channel.
    pub fn last_millis(&self) -> u32 {
        self.inner.lock().clock.last_millis()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, TimeState> {
        self.inner.lock()
    }
}

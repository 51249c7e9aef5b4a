//! Recording side — temp event log, seed capture, finalize-by-copy.
//!
//! While recording, entries are appended to the temp log with no
//! header, because the counts are unknown until the session ends. A
//! crashed session therefore leaves a readable temp log but no valid
//! final log.
//!
//! Finalize order:
//!   1. flush and close the temp log
//!   2. open the final log, write header + ledger
//!   3. re-read every entry from the temp log and write it out again
//!   4. flush and close, then remove the temp log

use replay_kernel::codec::{read_record, write_record};
use replay_kernel::events::Event;
use replay_kernel::header::LogHeader;
use replay_kernel::ledger::SeedLedger;
use replay_kernel::random::SeededRandom;
use tracing::{info, warn};

use crate::config::RecorderSettings;
use crate::error::{RecorderError, Result};
use crate::storage::{OutSaveFile, SaveFileManager};
use crate::time_channel::TimeRecorder;

/// Event half of an open recording.
pub struct EventRecorder {
    file: Box<dyn OutSaveFile>,
    temp_name: String,
    final_name: String,
    record_count: u32,
    subtitles: bool,
    ledger: SeedLedger,
    /// Set by the first failed append. The temp log then holds
    /// `record_count` whole entries followed by an unknown tail.
    failed: bool,
}

/// What `finalize` wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizeReport {
    pub file_name: String,
    pub record_count: u32,
    pub time_count: u32,
    pub random_sources: usize,
}

/// Open the temp event log and the time log for a new recording.
///
/// On failure every stream opened so far is closed by scope; a temp
/// file that was already created stays behind, empty.
pub fn open_recording(
    storage: &dyn SaveFileManager,
    settings: &RecorderSettings,
) -> Result<(EventRecorder, TimeRecorder)> {
    let file = storage
        .open_for_saving(&settings.record_temp_file_name)
        .ok_or_else(|| RecorderError::OpenForSaving(settings.record_temp_file_name.clone()))?;
    let time = TimeRecorder::open(storage, &settings.record_time_file_name)?;

    let recorder = EventRecorder {
        file,
        temp_name: settings.record_temp_file_name.clone(),
        final_name: settings.record_file_name.clone(),
        record_count: 0,
        subtitles: settings.subtitles,
        ledger: SeedLedger::new(),
        failed: false,
    };
    Ok((recorder, time))
}

impl EventRecorder {
    /// Append one entry to the temp log.
    ///
    /// After the first failure nothing more is appended, so finalize
    /// copies only the entries written before it.
    pub fn record(&mut self, diff: u32, event: &Event) -> Result<()> {
        if self.failed {
            return Ok(());
        }
        if let Err(e) = write_record(self.file.as_mut(), diff, event) {
            self.failed = true;
            return Err(RecorderError::io(&self.temp_name, e));
        }
        self.record_count += 1;
        Ok(())
    }

    /// Remember `rng`'s current seed under `name`.
    pub fn capture_seed(&mut self, rng: &dyn SeededRandom, name: &str) {
        self.ledger.capture(rng, name);
    }

    /// Transcode the temp log into the final log. Consumes the recorder;
    /// every stream is closed on return, success or not.
    pub fn finalize(
        self,
        storage: &dyn SaveFileManager,
        time_count: u32,
    ) -> Result<FinalizeReport> {
        let EventRecorder {
            mut file,
            temp_name,
            final_name,
            record_count,
            subtitles,
            ledger,
            failed,
        } = self;

        if failed {
            warn!(
                file = %temp_name,
                records = record_count,
                "event log write failed earlier, keeping entries written before it"
            );
            // The tail past `record_count` is never read back.
            if let Err(e) = file.finalize() {
                warn!(file = %temp_name, error = %e, "flush of failed temp log");
            }
        } else {
            file.finalize().map_err(|e| RecorderError::io(&temp_name, e))?;
        }
        drop(file);

        let mut input = storage
            .open_for_loading(&temp_name)
            .ok_or_else(|| RecorderError::OpenForLoading(temp_name.clone()))?;
        let mut out = storage
            .open_for_saving(&final_name)
            .ok_or_else(|| RecorderError::OpenForSaving(final_name.clone()))?;

        let random_sources = ledger.len();
        let header = LogHeader::new(subtitles, record_count, time_count, ledger);
        header
            .write_to(out.as_mut())
            .map_err(|e| RecorderError::from_codec(&final_name, e))?;

        for _ in 0..record_count {
            let (diff, event) =
                read_record(&mut input).map_err(|e| RecorderError::io(&temp_name, e))?;
            write_record(out.as_mut(), diff, &event)
                .map_err(|e| RecorderError::io(&final_name, e))?;
        }
        out.finalize().map_err(|e| RecorderError::io(&final_name, e))?;
        drop(out);
        drop(input);

        if let Err(e) = storage.remove(&temp_name) {
            warn!(file = %temp_name, error = %e, "could not remove temp record file");
        }

        info!(
            file = %final_name,
            records = record_count,
            time_entries = time_count,
            random_sources,
            "record file finalized"
        );

        Ok(FinalizeReport {
            file_name: final_name,
            record_count,
            time_count,
            random_sources,
        })
    }
}

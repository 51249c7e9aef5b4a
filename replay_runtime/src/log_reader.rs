//! Offline log loading — inspect finalized logs and salvage temp logs
//! without running an event manager.

use std::io::{self, Read};

use replay_kernel::codec::{read_record, CodecError};
use replay_kernel::events::Event;
use replay_kernel::hashing::Delivered;
use replay_kernel::header::LogHeader;
use replay_kernel::time_log::TimeClock;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::{RecorderError, Result};
use crate::storage::SaveFileManager;

/// A finalized record log held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLog {
    pub header: LogHeader,
    pub entries: Vec<(u32, Event)>,
}

impl RecordLog {
    /// Parse header and all `record_count` entries from a stream.
    pub fn read_from<R: Read + ?Sized>(input: &mut R) -> std::result::Result<Self, CodecError> {
        let header = LogHeader::read_from(input)?;
        let mut entries = Vec::new();
        for _ in 0..header.record_count {
            entries.push(read_record(input)?);
        }
        Ok(Self { header, entries })
    }

    /// Load a finalized log from storage.
    pub fn load(storage: &dyn SaveFileManager, name: &str) -> Result<Self> {
        let mut input = storage
            .open_for_loading(name)
            .ok_or_else(|| RecorderError::OpenForLoading(name.to_string()))?;
        Self::read_from(&mut input).map_err(|e| RecorderError::from_codec(name, e))
    }

    /// Entries with their absolute event tick instead of the diff.
    pub fn delivered(&self) -> Vec<Delivered> {
        let mut tick = 0u32;
        self.entries
            .iter()
            .map(|(diff, event)| {
                tick = tick.wrapping_add(*diff);
                Delivered { tick, event: *event }
            })
            .collect()
    }
}

/// Read the entries of an unfinalized temp log.
///
/// Temp logs have no header and no count: read until the stream ends.
/// A torn entry at the end (crash mid-write) counts as end of stream.
pub fn recover_temp_log(storage: &dyn SaveFileManager, name: &str) -> Result<Vec<(u32, Event)>> {
    let mut input = storage
        .open_for_loading(name)
        .ok_or_else(|| RecorderError::OpenForLoading(name.to_string()))?;

    let mut entries = Vec::new();
    loop {
        match read_record(&mut input) {
            Ok(entry) => entries.push(entry),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(RecorderError::io(name, e)),
        }
    }
    Ok(entries)
}

/// Decode `count` entries of a time log into absolute readings.
pub fn load_time_log(storage: &dyn SaveFileManager, name: &str, count: u32) -> Result<Vec<u32>> {
    let mut input = storage
        .open_for_loading(name)
        .ok_or_else(|| RecorderError::OpenForLoading(name.to_string()))?;

    let mut clock = TimeClock::new();
    let mut readings = Vec::new();
    for i in 0..count {
        match clock.replay(&mut input) {
            Ok(millis) => readings.push(millis),
            Err(e) => {
                warn!(file = name, entry = i, expected = count, "time log shorter than header says");
                return Err(RecorderError::io(name, e));
            }
        }
    }
    Ok(readings)
}

/// SHA-256 of a stored file, lowercase hex. Used to fingerprint logs.
pub fn file_digest(storage: &dyn SaveFileManager, name: &str) -> Result<String> {
    let mut input = storage
        .open_for_loading(name)
        .ok_or_else(|| RecorderError::OpenForLoading(name.to_string()))?;
    let mut bytes = Vec::new();
    input
        .read_to_end(&mut bytes)
        .map_err(|e| RecorderError::io(name, e))?;
    Ok(Sha256::digest(&bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect())
}

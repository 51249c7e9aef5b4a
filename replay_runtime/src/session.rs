//! Scripted sessions — drive an event manager from a fixed script.
//!
//! A script lists one optional native event per poll plus the random
//! sources the "game" registers at startup. Running it once in record
//! mode and once in playback mode against the same storage must give
//! identical delivered streams; that is what `replay_check` verifies.
//!
//! Per poll, in order:
//!   1. read the clock through `process_millis`
//!   2. `poll_event`, and note the event tick of anything delivered

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use replay_kernel::events::Event;
use replay_kernel::hashing::Delivered;
use replay_kernel::random::{RandomSource, SeededRandom};

use crate::config::{ConfigManager, RecordMode, KEY_RECORD_MODE, KEY_SUBTITLES};
use crate::error::{RecorderError, Result};
use crate::manager::EventManager;
use crate::platform::{EventSource, HeadlessHost, ScriptedSource};
use crate::recorder::FinalizeReport;
use crate::storage::SaveFileManager;

/// Seed a scripted game gives one of its generators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedSpec {
    pub name: String,
    pub seed: u32,
}

/// A reproducible input session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionScript {
    pub name: String,
    #[serde(default = "default_step_ms")]
    pub step_ms: u32,
    #[serde(default)]
    pub subtitles: bool,
    #[serde(default)]
    pub random_sources: Vec<SeedSpec>,
    /// One entry per poll; `null` means no native event that poll.
    pub frames: Vec<Option<Event>>,
    /// Extra empty polls after the script runs out.
    #[serde(default)]
    pub trailing_polls: u32,
}

fn default_step_ms() -> u32 {
    10
}

impl SessionScript {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| RecorderError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RecorderError::io(&path.display().to_string(), e))?;
        Self::from_json(&content)
    }

    pub fn total_polls(&self) -> u32 {
        self.frames.len() as u32 + self.trailing_polls
    }
}

/// Everything observable about one run of a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    /// Mode the manager actually ran in.
    pub mode: RecordMode,
    pub delivered: Vec<Delivered>,
    /// Seed of each registered source right after registration.
    pub seeds: Vec<u32>,
    /// First random draw (0..=999) from each registered source.
    pub first_draws: Vec<u32>,
    /// Clock readings after `process_millis`, one per poll.
    pub millis: Vec<u32>,
    pub subtitles: bool,
    pub finalized: Option<FinalizeReport>,
}

/// Run `script` in `mode` against `storage`.
///
/// Record mode feeds the script's frames as native input. Playback
/// mode feeds an idle source, and gives every generator a wrong seed
/// first, so everything observed must come from the log.
pub fn run_scripted_session(
    storage: Arc<dyn SaveFileManager>,
    mode: RecordMode,
    script: &SessionScript,
) -> Result<SessionOutcome> {
    let mut config = ConfigManager::new();
    config.set(KEY_RECORD_MODE, mode_name(mode));
    if mode != RecordMode::Playback {
        config.set_bool(KEY_SUBTITLES, script.subtitles);
    }

    let source = match mode {
        RecordMode::Playback => ScriptedSource::idle(script.step_ms),
        _ => ScriptedSource::new(script.frames.iter().copied(), script.step_ms),
    };
    let mut manager = EventManager::new(source, HeadlessHost, storage, &mut config);

    let mut seeds = Vec::new();
    let mut first_draws = Vec::new();
    for seeded in &script.random_sources {
        let start = match manager.mode() {
            RecordMode::Playback => !seeded.seed,
            _ => seeded.seed,
        };
        let mut rng = RandomSource::with_seed(start);
        manager.register_random_source(&mut rng, &seeded.name);
        seeds.push(rng.seed());
        first_draws.push(rng.random_number(999));
    }

    let mut delivered = Vec::new();
    let mut millis = Vec::new();
    for _ in 0..script.total_polls() {
        let mut now = manager.source().millis();
        manager.process_millis(&mut now);
        millis.push(now);

        if let Some(event) = manager.poll_event() {
            delivered.push(Delivered {
                tick: manager.event_count(),
                event,
            });
        }
    }

    let ran_in = manager.mode();
    let finalized = manager.finalize()?;

    Ok(SessionOutcome {
        mode: ran_in,
        delivered,
        seeds,
        first_draws,
        millis,
        subtitles: config.get_bool(KEY_SUBTITLES),
        finalized,
    })
}

fn mode_name(mode: RecordMode) -> &'static str {
    match mode {
        RecordMode::PassThrough => "",
        RecordMode::Record => "record",
        RecordMode::Playback => "playback",
    }
}

/// replay_check — record/playback round-trip harness.
///
/// Runs each session script twice against a scratch directory: once
/// recording live (scripted) input, once playing the log back with no
/// input at all. Both runs must deliver the same events on the same
/// event ticks, restore the same seeds and see the same clock.
///
/// Usage: replay_check [script.json ...]
/// With no arguments a built-in demo session is checked.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use replay_kernel::events::{Event, EventKind, KeyCode, KeyState, Point, KBD_SHIFT};
use replay_runtime::config::{RecordMode, DEFAULT_RECORD_FILE_NAME};
use replay_runtime::drift::compare_streams;
use replay_runtime::error::{RecorderError, Result};
use replay_runtime::log_reader::{file_digest, RecordLog};
use replay_runtime::session::{run_scripted_session, SeedSpec, SessionOutcome, SessionScript};
use replay_runtime::storage::{DirSaveFileManager, SaveFileManager};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let scripts = if args.is_empty() {
        vec![demo_script()]
    } else {
        let mut loaded = Vec::new();
        for arg in &args {
            match SessionScript::load(Path::new(arg)) {
                Ok(script) => {
                    println!("Loaded script from: {}", arg);
                    loaded.push(script);
                }
                Err(e) => {
                    error!("{}", e);
                    std::process::exit(2);
                }
            }
        }
        loaded
    };

    let mut total = 0;
    let mut passed = 0;

    for script in &scripts {
        total += 1;
        match check_script(script) {
            Ok(problems) if problems.is_empty() => passed += 1,
            Ok(problems) => {
                println!("[FAIL] {}:", script.name);
                for p in problems {
                    println!("  {}", p);
                }
            }
            Err(e) => println!("[FAIL] {}: {}", script.name, e),
        }
    }

    println!();
    println!("Results: {}/{} passed", passed, total);
    if passed != total {
        std::process::exit(1);
    }
}

/// Record then replay one script. Returns the list of mismatches.
fn check_script(script: &SessionScript) -> Result<Vec<String>> {
    let dir = scratch_dir(&script.name)?;
    let storage: Arc<dyn SaveFileManager> = Arc::new(
        DirSaveFileManager::open(&dir)
            .map_err(|e| RecorderError::io(&dir.display().to_string(), e))?,
    );

    let recorded = run_scripted_session(storage.clone(), RecordMode::Record, script)?;
    let replayed = run_scripted_session(storage.clone(), RecordMode::Playback, script)?;

    let mut problems = Vec::new();
    if recorded.mode != RecordMode::Record {
        problems.push(format!("recording ran in {:?}", recorded.mode));
    }
    if replayed.mode != RecordMode::Playback {
        problems.push(format!("playback ran in {:?}", replayed.mode));
    }
    compare_outcomes(&recorded, &replayed, &mut problems);

    let log = RecordLog::load(storage.as_ref(), DEFAULT_RECORD_FILE_NAME)?;
    let log_hash = file_digest(storage.as_ref(), DEFAULT_RECORD_FILE_NAME)?;

    if problems.is_empty() {
        let report = compare_streams(&recorded.delivered, &replayed.delivered);
        println!(
            "[PASS] {}: events={}, synthetic={}, records={}, times={}, seeds={}, digest={}, log={}",
            script.name,
            report.len_a,
            report.synthetic_a,
            log.header.record_count,
            log.header.time_count,
            log.header.ledger.len(),
            report.digest_a,
            log_hash
        );
    }
    info!(dir = %dir.display(), "session logs kept");
    Ok(problems)
}

fn compare_outcomes(recorded: &SessionOutcome, replayed: &SessionOutcome, problems: &mut Vec<String>) {
    let report = compare_streams(&recorded.delivered, &replayed.delivered);
    if !report.is_identical() {
        problems.push(format!(
            "event streams differ at index {:?}: recorded={} ({} events) replayed={} ({} events)",
            report.first_divergence, report.digest_a, report.len_a, report.digest_b, report.len_b
        ));
    }
    if recorded.seeds != replayed.seeds {
        problems.push(format!(
            "seeds: recorded={:?} replayed={:?}",
            recorded.seeds, replayed.seeds
        ));
    }
    if recorded.first_draws != replayed.first_draws {
        problems.push(format!(
            "random draws: recorded={:?} replayed={:?}",
            recorded.first_draws, replayed.first_draws
        ));
    }
    if let Some(i) = recorded
        .millis
        .iter()
        .zip(&replayed.millis)
        .position(|(a, b)| a != b)
    {
        problems.push(format!(
            "clock differs at poll {}: recorded={} replayed={}",
            i, recorded.millis[i], replayed.millis[i]
        ));
    }
    if recorded.subtitles != replayed.subtitles {
        problems.push(format!(
            "subtitles: recorded={} replayed={}",
            recorded.subtitles, replayed.subtitles
        ));
    }
}

fn scratch_dir(name: &str) -> Result<PathBuf> {
    let dir = std::env::temp_dir().join("replay_check").join(name);
    if dir.exists() {
        fs::remove_dir_all(&dir).ok();
    }
    fs::create_dir_all(&dir)
        .map_err(|e| RecorderError::io(&dir.display().to_string(), e))?;
    Ok(dir)
}

/// Pointer work, typing with a held key, the F11 menu, then quit.
fn demo_script() -> SessionScript {
    let shift_a = KeyState::new(KeyCode::from_ascii(b'a'), u16::from(b'A'), KBD_SHIFT);
    let f11 = KeyState::new(KeyCode::F11, 0, 0);
    let at = Point::new(120, 80);

    let mut frames = vec![
        Some(Event::mouse_move(40, 30)),
        None,
        Some(Event::mouse_move(120, 80)),
        Some(Event::new(EventKind::LButtonDown(at))),
        None,
        Some(Event::new(EventKind::LButtonUp(at))),
        Some(Event::key_down(KeyState::ascii(b'h'))),
        Some(Event::key_up(KeyState::ascii(b'h'))),
        Some(Event::key_down(shift_a)),
    ];
    // Hold the key long enough for several repeats.
    frames.extend(std::iter::repeat(None).take(60));
    frames.push(Some(Event::key_up(shift_a)));
    frames.push(Some(Event::new(EventKind::WheelDown(at))));
    frames.push(Some(Event::key_down(f11)));
    frames.push(None);
    frames.push(Some(Event::key_up(f11)));
    frames.push(Some(Event::quit()));

    SessionScript {
        name: "demo".to_string(),
        step_ms: 10,
        subtitles: true,
        random_sources: vec![
            SeedSpec {
                name: "engine".to_string(),
                seed: 0x1234_5678,
            },
            SeedSpec {
                name: "sound".to_string(),
                seed: 42,
            },
            SeedSpec {
                name: "engine".to_string(),
                seed: 7,
            },
        ],
        frames,
        trailing_polls: 5,
    }
}

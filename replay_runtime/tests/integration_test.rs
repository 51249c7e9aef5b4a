//! Integration tests for replay_runtime.
//!
//! All tests use temporary directories for isolation.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Cursor, Write};
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use replay_kernel::codec::{record_len, write_record};
use replay_kernel::events::{Event, EventKind, KeyCode, KeyState, Point, KBD_CTRL};
use replay_kernel::hashing::Delivered;
use replay_kernel::random::{RandomSource, SeededRandom};

use replay_runtime::config::{
    ConfigManager, RecordMode, DEFAULT_RECORD_FILE_NAME, DEFAULT_RECORD_TEMP_FILE_NAME,
    DEFAULT_RECORD_TIME_FILE_NAME, KEY_CONFIRM_EXIT, KEY_RECORD_MODE, KEY_SUBTITLES,
};
use replay_runtime::drift::verify_determinism;
use replay_runtime::log_reader::{file_digest, load_time_log, recover_temp_log, RecordLog};
use replay_runtime::manager::{EventManager, QUIT_PROMPT};
use replay_runtime::platform::{EventSource, Host, MenuAction, ScriptedSource};
use replay_runtime::session::{run_scripted_session, SeedSpec, SessionScript};
use replay_runtime::storage::{DirSaveFileManager, InSaveFile, OutSaveFile, SaveFileManager};

/// Create a temp directory for a test.
fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join("replay_runtime_tests")
        .join(name);
    if dir.exists() {
        fs::remove_dir_all(&dir).ok();
    }
    fs::create_dir_all(&dir).expect("Failed to create temp dir");
    dir
}

fn dir_storage(dir: &PathBuf) -> Arc<DirSaveFileManager> {
    Arc::new(DirSaveFileManager::open(dir).expect("open storage"))
}

/// Host whose answers the test controls. Remembers what it was asked.
#[derive(Debug, Default)]
struct TestHost {
    paused: bool,
    menu_action: MenuAction,
    confirm: bool,
    prompts: Vec<String>,
    pause_calls: Vec<bool>,
    menus_shown: u32,
}

impl Host for TestHost {
    fn is_paused(&self) -> bool {
        self.paused
    }

    fn pause_engine(&mut self, pause: bool) {
        self.pause_calls.push(pause);
    }

    fn main_menu_dialog(&mut self) -> MenuAction {
        self.menus_shown += 1;
        self.menu_action
    }

    fn confirm_quit(&mut self, message: &str) -> bool {
        self.prompts.push(message.to_string());
        self.confirm
    }
}

fn config_for(mode: &str) -> ConfigManager {
    let mut config = ConfigManager::new();
    config.set(KEY_RECORD_MODE, mode);
    config
}

fn manager_with(
    storage: Arc<dyn SaveFileManager>,
    config: &mut ConfigManager,
    frames: Vec<Option<Event>>,
) -> EventManager<ScriptedSource, TestHost> {
    EventManager::new(
        ScriptedSource::new(frames, 10),
        TestHost::default(),
        storage,
        config,
    )
}

/// Poll `n` times, keeping what came out and on which poll.
fn poll_n(
    manager: &mut EventManager<ScriptedSource, TestHost>,
    n: usize,
) -> Vec<(usize, Event)> {
    (1..=n)
        .filter_map(|i| manager.poll_event().map(|e| (i, e)))
        .collect()
}

fn demo_script(name: &str) -> SessionScript {
    let at = Point::new(64, 48);
    let mut frames = vec![
        Some(Event::mouse_move(10, 20)),
        None,
        Some(Event::mouse_move(64, 48)),
        Some(Event::new(EventKind::LButtonDown(at))),
        Some(Event::new(EventKind::LButtonUp(at))),
        Some(Event::key_down(KeyState::ascii(b'x'))),
    ];
    frames.extend(std::iter::repeat(None).take(50));
    frames.push(Some(Event::key_up(KeyState::ascii(b'x'))));
    frames.push(Some(Event::key_down(KeyState::new(KeyCode::F11, 0, 0))));
    frames.push(Some(Event::key_up(KeyState::new(KeyCode::F11, 0, 0))));
    frames.push(Some(Event::quit()));

    SessionScript {
        name: name.to_string(),
        step_ms: 10,
        subtitles: true,
        random_sources: vec![
            SeedSpec { name: "engine".to_string(), seed: 1234 },
            SeedSpec { name: "fx".to_string(), seed: 99 },
        ],
        frames,
        trailing_polls: 3,
    }
}

// ─────────────────────────────────────────────────────────────
// Test 1: record_then_playback_is_deterministic
// ─────────────────────────────────────────────────────────────

#[test]
fn record_then_playback_is_deterministic() {
    let dir = temp_dir("record_playback");
    let storage = dir_storage(&dir);
    let script = demo_script("round_trip");

    let recorded = run_scripted_session(storage.clone(), RecordMode::Record, &script)
        .expect("record run");
    let replayed = run_scripted_session(storage.clone(), RecordMode::Playback, &script)
        .expect("playback run");

    assert_eq!(recorded.mode, RecordMode::Record);
    assert_eq!(replayed.mode, RecordMode::Playback);
    verify_determinism(&recorded.delivered, &replayed.delivered);

    // Held key produced repeats, and they replay too.
    assert!(recorded.delivered.iter().any(|d| d.event.synthetic));

    assert_eq!(recorded.seeds, vec![1234, 99]);
    assert_eq!(replayed.seeds, recorded.seeds);
    assert_eq!(replayed.first_draws, recorded.first_draws);
    assert_eq!(replayed.millis, recorded.millis);
    assert!(replayed.subtitles);

    let report = recorded.finalized.expect("recording finalized");
    assert_eq!(report.file_name, DEFAULT_RECORD_FILE_NAME);
    assert_eq!(report.time_count, script.total_polls());
    assert_eq!(report.random_sources, 2);
    assert!(replayed.finalized.is_none());
}

// ─────────────────────────────────────────────────────────────
// Test 2: final_log_matches_delivered_stream
// ─────────────────────────────────────────────────────────────

#[test]
fn final_log_matches_delivered_stream() {
    let dir = temp_dir("log_matches");
    let storage = dir_storage(&dir);
    let script = demo_script("log_matches");

    let recorded = run_scripted_session(storage.clone(), RecordMode::Record, &script)
        .expect("record run");

    let log = RecordLog::load(storage.as_ref(), DEFAULT_RECORD_FILE_NAME).expect("load log");
    let logged: Vec<Delivered> = recorded
        .delivered
        .iter()
        .filter(|d| !d.event.synthetic)
        .copied()
        .collect();
    assert_eq!(log.delivered(), logged);
    assert_eq!(log.header.record_count as usize, logged.len());
    assert!(log.header.subtitles);
    assert_eq!(log.header.ledger.len(), 2);

    // F11 queues the main menu, which is logged like any other event.
    assert!(log
        .entries
        .iter()
        .any(|(_, e)| e.kind == EventKind::MainMenu));

    let times = load_time_log(
        storage.as_ref(),
        DEFAULT_RECORD_TIME_FILE_NAME,
        log.header.time_count,
    )
    .expect("load time log");
    assert_eq!(times, recorded.millis);

    assert!(!storage.path_of(DEFAULT_RECORD_TEMP_FILE_NAME).exists());
}

// ─────────────────────────────────────────────────────────────
// Test 3: same_script_same_log_bytes
// ─────────────────────────────────────────────────────────────

#[test]
fn same_script_same_log_bytes() {
    let script = demo_script("bytes");
    let mut hashes = Vec::new();
    for name in ["bytes_a", "bytes_b"] {
        let storage = dir_storage(&temp_dir(name));
        run_scripted_session(storage.clone(), RecordMode::Record, &script).expect("record run");
        hashes.push(
            file_digest(storage.as_ref(), DEFAULT_RECORD_FILE_NAME).expect("hash record log"),
        );
    }
    assert_eq!(hashes[0], hashes[1]);
}

// ─────────────────────────────────────────────────────────────
// Test 4: script_from_json
// ─────────────────────────────────────────────────────────────

#[test]
fn script_from_json_round_trips() {
    let json = r#"{
        "name": "json",
        "step_ms": 5,
        "random_sources": [{"name": "engine", "seed": 7}],
        "frames": [
            {"kind": {"type": "mouse_move", "data": {"x": 3, "y": 4}}},
            null,
            {"kind": {"type": "key_down", "data": {"keycode": 97, "ascii": 97, "flags": 0}}},
            {"kind": {"type": "key_up", "data": {"keycode": 97, "ascii": 97, "flags": 0}}},
            {"kind": {"type": "quit"}}
        ],
        "trailing_polls": 2
    }"#;
    let script = SessionScript::from_json(json).expect("parse script");
    assert_eq!(script.total_polls(), 7);
    assert!(!script.subtitles);
    assert_eq!(script.frames[0], Some(Event::mouse_move(3, 4)));
    assert_eq!(script.frames[4], Some(Event::quit()));

    let storage = dir_storage(&temp_dir("json_script"));
    let recorded = run_scripted_session(storage.clone(), RecordMode::Record, &script).unwrap();
    let replayed = run_scripted_session(storage.clone(), RecordMode::Playback, &script).unwrap();
    assert_eq!(recorded.delivered.len(), 4);
    verify_determinism(&recorded.delivered, &replayed.delivered);
}

// ─────────────────────────────────────────────────────────────
// Test 5: playback_without_time_log_passes_through
// ─────────────────────────────────────────────────────────────

#[test]
fn playback_without_time_log_passes_through() {
    let dir = temp_dir("missing_time_log");
    let storage = dir_storage(&dir);
    run_scripted_session(storage.clone(), RecordMode::Record, &demo_script("missing"))
        .expect("record run");
    storage.remove(DEFAULT_RECORD_TIME_FILE_NAME).unwrap();

    let mut config = config_for("playback");
    let mut manager = manager_with(
        storage.clone(),
        &mut config,
        vec![Some(Event::mouse_move(1, 2))],
    );
    assert_eq!(manager.mode(), RecordMode::PassThrough);
    assert_eq!(manager.poll_event(), Some(Event::mouse_move(1, 2)));
    assert_eq!(manager.event_count(), 0);
    assert!(manager.finalize().unwrap().is_none());
}

// ─────────────────────────────────────────────────────────────
// Test 6: bad_signature_passes_through
// ─────────────────────────────────────────────────────────────

#[test]
fn bad_signature_passes_through() {
    let dir = temp_dir("bad_signature");
    fs::write(dir.join(DEFAULT_RECORD_FILE_NAME), b"NOPE\x01\x00\x00\x00garbage").unwrap();
    fs::write(dir.join(DEFAULT_RECORD_TIME_FILE_NAME), b"").unwrap();
    let storage = dir_storage(&dir);

    let mut config = config_for("playback");
    config.set_bool(KEY_SUBTITLES, false);
    let mut manager = manager_with(storage, &mut config, vec![Some(Event::quit())]);

    assert_eq!(manager.mode(), RecordMode::PassThrough);
    assert_eq!(manager.poll_event(), Some(Event::quit()));
    assert!(!config.get_bool(KEY_SUBTITLES));
}

// ─────────────────────────────────────────────────────────────
// Test 7: unwritable_storage_disables_recording
// ─────────────────────────────────────────────────────────────

struct ReadOnlyStorage;

impl SaveFileManager for ReadOnlyStorage {
    fn open_for_loading(&self, _name: &str) -> Option<InSaveFile> {
        None
    }

    fn open_for_saving(&self, _name: &str) -> Option<Box<dyn OutSaveFile>> {
        None
    }

    fn remove(&self, _name: &str) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn unwritable_storage_disables_recording() {
    let mut config = config_for("record");
    let mut manager = manager_with(
        Arc::new(ReadOnlyStorage),
        &mut config,
        vec![Some(Event::mouse_move(9, 9))],
    );
    assert_eq!(manager.mode(), RecordMode::PassThrough);
    assert_eq!(manager.poll_event(), Some(Event::mouse_move(9, 9)));
    assert!(manager.finalize().unwrap().is_none());
}

// ─────────────────────────────────────────────────────────────
// Test 8: seeds_restore_in_registration_order
// ─────────────────────────────────────────────────────────────

#[test]
fn seeds_restore_in_registration_order() {
    let dir = temp_dir("seed_order");
    let storage = dir_storage(&dir);

    {
        let mut config = config_for("record");
        let mut manager = manager_with(storage.clone(), &mut config, Vec::new());
        for (name, seed) in [("shared", 1u32), ("other", 2), ("shared", 3)] {
            let mut rng = RandomSource::with_seed(seed);
            manager.register_random_source(&mut rng, name);
        }
        let report = manager.finalize().unwrap().expect("recording");
        assert_eq!(report.random_sources, 3);
    }

    let mut config = config_for("playback");
    let manager = manager_with(storage.clone(), &mut config, Vec::new());
    assert_eq!(manager.mode(), RecordMode::Playback);

    let mut seeds = Vec::new();
    for name in ["shared", "shared", "other", "shared", "unknown"] {
        let mut rng = RandomSource::with_seed(500);
        manager.register_random_source(&mut rng, name);
        seeds.push(rng.seed());
    }
    // Same-name sources get their seeds back first-in first-out; once
    // the ledger has nothing for a name the generator keeps its own seed.
    assert_eq!(seeds, vec![1, 3, 2, 500, 500]);
}

// ─────────────────────────────────────────────────────────────
// Test 9: key_repeat_tracks_first_held_key
// ─────────────────────────────────────────────────────────────

#[test]
fn key_repeat_tracks_first_held_key() {
    let a = KeyState::ascii(b'a');
    let b = KeyState::ascii(b'b');

    let mut only_a = vec![Some(Event::key_down(a))];
    only_a.extend(std::iter::repeat(None).take(59));

    let mut a_then_b = only_a.clone();
    a_then_b[4] = Some(Event::key_down(b));

    let run = |frames: Vec<Option<Event>>| {
        let mut config = ConfigManager::new();
        let mut manager = manager_with(Arc::new(ReadOnlyStorage), &mut config, frames);
        poll_n(&mut manager, 60)
            .into_iter()
            .filter(|(_, e)| e.synthetic)
            .collect::<Vec<_>>()
    };

    let repeats_a = run(only_a);
    let repeats_ab = run(a_then_b);

    // Poll n reads the clock at (n - 1) * 10 ms: first repeat strictly
    // after 400 ms, then every 100 ms.
    let polls: Vec<usize> = repeats_a.iter().map(|(i, _)| *i).collect();
    assert_eq!(polls, vec![42, 53]);
    assert!(repeats_a
        .iter()
        .all(|(_, e)| e.kind == EventKind::KeyDown(a)));
    assert_eq!(repeats_ab, repeats_a);
}

#[test]
fn key_up_stops_repeat() {
    let a = KeyState::ascii(b'a');
    let mut frames = vec![Some(Event::key_down(a))];
    frames.extend(std::iter::repeat(None).take(44));
    frames.push(Some(Event::key_up(a)));

    let mut config = ConfigManager::new();
    let mut manager = manager_with(Arc::new(ReadOnlyStorage), &mut config, frames);
    let out = poll_n(&mut manager, 100);

    let repeats = out.iter().filter(|(_, e)| e.synthetic).count();
    assert_eq!(repeats, 1);
    assert_eq!(out.last().map(|(_, e)| *e), Some(Event::key_up(a)));
}

// ─────────────────────────────────────────────────────────────
// Test 10: quit handling
// ─────────────────────────────────────────────────────────────

#[test]
fn duplicate_quit_is_suppressed() {
    let mut config = ConfigManager::new();
    let mut manager = manager_with(Arc::new(ReadOnlyStorage), &mut config, Vec::new());

    manager.push_event(Event::quit());
    manager.push_event(Event::quit());
    assert_eq!(manager.poll_event(), Some(Event::quit()));
    assert!(manager.should_quit());
    assert_eq!(manager.poll_event(), None);

    manager.push_event(Event::quit());
    assert_eq!(manager.poll_event(), None);
}

#[test]
fn refused_quit_is_swallowed() {
    let mut config = ConfigManager::new();
    config.set_bool(KEY_CONFIRM_EXIT, true);
    let mut manager = manager_with(Arc::new(ReadOnlyStorage), &mut config, Vec::new());

    manager.push_event(Event::quit());
    assert_eq!(manager.poll_event(), None);
    assert!(!manager.should_quit());
    assert_eq!(manager.host().prompts, vec![QUIT_PROMPT.to_string()]);
    assert_eq!(manager.host().pause_calls, vec![true, false]);

    // Refused, so a new quit request is accepted into the queue.
    manager.push_event(Event::quit());
    assert_eq!(manager.poll_event(), None);
    assert_eq!(manager.host().prompts.len(), 2);
}

#[test]
fn return_to_launcher_sets_both_flags() {
    let mut config = ConfigManager::new();
    let mut manager = manager_with(Arc::new(ReadOnlyStorage), &mut config, Vec::new());

    manager.push_event(Event::new(EventKind::ReturnToLauncher));
    assert_eq!(
        manager.poll_event().map(|e| e.kind),
        Some(EventKind::ReturnToLauncher)
    );
    assert!(manager.should_quit());
    assert!(manager.should_rtl());
    manager.reset_rtl();
    assert!(!manager.should_rtl());
}

// ─────────────────────────────────────────────────────────────
// Test 11: main menu hot key
// ─────────────────────────────────────────────────────────────

#[test]
fn f11_opens_main_menu() {
    let f11 = KeyState::new(KeyCode::F11, 0, 0);
    let mut config = ConfigManager::new();
    let mut manager = manager_with(
        Arc::new(ReadOnlyStorage),
        &mut config,
        vec![Some(Event::key_down(f11))],
    );

    assert_eq!(manager.poll_event(), Some(Event::key_down(f11)));
    assert_eq!(
        manager.poll_event().map(|e| e.kind),
        Some(EventKind::MainMenu)
    );
    assert_eq!(manager.host().menus_shown, 1);
    assert!(!manager.should_quit());
}

#[test]
fn main_menu_quit_becomes_quit_event() {
    let mut config = ConfigManager::new();
    let mut manager = EventManager::new(
        ScriptedSource::idle(10),
        TestHost {
            menu_action: MenuAction::Quit,
            ..TestHost::default()
        },
        Arc::new(ReadOnlyStorage),
        &mut config,
    );

    manager.push_event(Event::new(EventKind::MainMenu));
    assert_eq!(manager.poll_event(), Some(Event::quit()));
    assert!(manager.should_quit());
    assert!(!manager.should_rtl());
}

#[test]
fn paused_host_ignores_f11() {
    let f11 = KeyState::new(KeyCode::F11, 0, 0);
    let mut config = ConfigManager::new();
    let mut manager = EventManager::new(
        ScriptedSource::new(vec![Some(Event::key_down(f11))], 10),
        TestHost {
            paused: true,
            ..TestHost::default()
        },
        Arc::new(ReadOnlyStorage),
        &mut config,
    );

    assert_eq!(manager.poll_event(), Some(Event::key_down(f11)));
    assert_eq!(manager.poll_event(), None);
    assert_eq!(manager.host().menus_shown, 0);
}

// ─────────────────────────────────────────────────────────────
// Test 12: playback specifics
// ─────────────────────────────────────────────────────────────

#[test]
fn playback_warps_pointer_and_writes_back_subtitles() {
    let dir = temp_dir("playback_warp");
    let storage = dir_storage(&dir);

    {
        let mut config = config_for("record");
        config.set_bool(KEY_SUBTITLES, true);
        let mut manager = manager_with(
            storage.clone(),
            &mut config,
            vec![
                Some(Event::mouse_move(5, 6)),
                None,
                Some(Event::new(EventKind::RButtonDown(Point::new(7, 8)))),
            ],
        );
        poll_n(&mut manager, 3);
        assert_eq!(manager.event_count(), 3);
        manager.finalize().unwrap();
    }

    let mut config = config_for("playback");
    config.set_bool(KEY_SUBTITLES, false);
    let mut manager = manager_with(storage.clone(), &mut config, Vec::new());
    assert!(config.get_bool(KEY_SUBTITLES));

    let out = poll_n(&mut manager, 5);
    assert_eq!(
        out,
        vec![
            (1, Event::mouse_move(5, 6)),
            (3, Event::new(EventKind::RButtonDown(Point::new(7, 8)))),
        ]
    );
    assert_eq!(manager.source().warps(), &[(5, 6), (7, 8)]);
    assert_eq!(manager.mouse_pos(), Point::new(7, 8));
    assert_eq!(manager.button_state(), 2);
}

#[test]
fn live_quit_interrupts_playback() {
    let dir = temp_dir("playback_quit");
    let storage = dir_storage(&dir);
    run_scripted_session(storage.clone(), RecordMode::Record, &demo_script("quit"))
        .expect("record run");

    let mut config = config_for("playback");
    let mut manager = manager_with(storage, &mut config, vec![None, Some(Event::quit())]);
    assert_eq!(manager.mode(), RecordMode::Playback);

    // Poll 1 delivers the first logged event, poll 2 the live quit.
    assert_eq!(manager.poll_event(), Some(Event::mouse_move(10, 20)));
    assert_eq!(manager.poll_event(), Some(Event::quit()));
    assert!(manager.should_quit());
}

// ─────────────────────────────────────────────────────────────
// Test 13: time channel
// ─────────────────────────────────────────────────────────────

#[test]
fn time_log_is_run_length_encoded_and_replayed() {
    let dir = temp_dir("time_rle");
    let storage = dir_storage(&dir);

    {
        let mut config = config_for("record");
        let mut manager = manager_with(storage.clone(), &mut config, Vec::new());
        for reading in [16u32, 316, 316] {
            let mut now = reading;
            manager.process_millis(&mut now);
            assert_eq!(now, reading);
        }
        let report = manager.finalize().unwrap().expect("recording");
        assert_eq!(report.time_count, 3);
        assert_eq!(report.record_count, 0);
    }

    // 16 and 0 fit in one byte; 300 needs the escape plus four bytes.
    let time_bytes = fs::read(storage.path_of(DEFAULT_RECORD_TIME_FILE_NAME)).unwrap();
    assert_eq!(time_bytes.len(), 7);

    let mut config = config_for("playback");
    let manager = manager_with(storage.clone(), &mut config, Vec::new());
    let handle = manager.time_handle();

    let replayed = std::thread::scope(|s| {
        s.spawn(|| {
            [1u32, 2, 3, 4]
                .iter()
                .map(|&live| {
                    let mut now = live;
                    handle.process_millis(&mut now);
                    now
                })
                .collect::<Vec<_>>()
        })
        .join()
        .unwrap()
    });
    // Once the log runs out, live readings pass through untouched.
    assert_eq!(replayed, vec![16, 316, 316, 4]);
    assert_eq!(manager.time_handle().last_millis(), 4);
}

// ─────────────────────────────────────────────────────────────
// Test 14: temp log handling
// ─────────────────────────────────────────────────────────────

#[test]
fn recover_temp_log_stops_at_torn_entry() {
    let dir = temp_dir("recover_temp");
    let mut bytes = Vec::new();
    write_record(&mut bytes, 1, &Event::mouse_move(1, 1)).unwrap();
    write_record(&mut bytes, 3, &Event::key_down(KeyState::ascii(b'q'))).unwrap();
    let whole = bytes.len();
    write_record(&mut bytes, 2, &Event::mouse_move(2, 2)).unwrap();
    bytes.truncate(whole + 5);
    fs::write(dir.join(DEFAULT_RECORD_TEMP_FILE_NAME), &bytes).unwrap();

    let storage = dir_storage(&dir);
    let entries = recover_temp_log(storage.as_ref(), DEFAULT_RECORD_TEMP_FILE_NAME).unwrap();
    assert_eq!(
        entries,
        vec![
            (1, Event::mouse_move(1, 1)),
            (3, Event::key_down(KeyState::ascii(b'q'))),
        ]
    );
}

#[test]
fn dropping_a_recording_manager_finalizes() {
    let dir = temp_dir("drop_finalizes");
    let storage = dir_storage(&dir);

    {
        let mut config = config_for("record");
        let mut manager = manager_with(
            storage.clone(),
            &mut config,
            vec![None, Some(Event::mouse_move(3, 3))],
        );
        poll_n(&mut manager, 2);
        assert!(storage.path_of(DEFAULT_RECORD_TEMP_FILE_NAME).exists());
    }

    let log = RecordLog::load(storage.as_ref(), DEFAULT_RECORD_FILE_NAME).unwrap();
    assert_eq!(log.entries, vec![(2, Event::mouse_move(3, 3))]);
    assert!(!storage.path_of(DEFAULT_RECORD_TEMP_FILE_NAME).exists());
}

#[test]
fn finalize_twice_is_a_no_op() {
    let dir = temp_dir("finalize_twice");
    let storage = dir_storage(&dir);
    let mut config = config_for("record");
    let mut manager = manager_with(storage.clone(), &mut config, Vec::new());

    assert!(manager.finalize().unwrap().is_some());
    assert_eq!(manager.mode(), RecordMode::PassThrough);
    assert!(manager.finalize().unwrap().is_none());
}

#[test]
fn scripted_source_frames_and_clock() {
    let ctrl_s = KeyState::new(KeyCode::from_ascii(b's'), u16::from(b's'), KBD_CTRL);
    let mut source = ScriptedSource::idle(10);
    source.set_millis(1_000);
    source.push_frame(None);
    source.push_frame(Some(Event::key_down(ctrl_s)));
    source.push_frame(None);
    assert_eq!(source.remaining(), 3);

    let mut config = ConfigManager::new();
    let mut manager = EventManager::new(
        source,
        TestHost::default(),
        Arc::new(ReadOnlyStorage),
        &mut config,
    );

    assert_eq!(manager.poll_event(), None);
    assert_eq!(manager.source().millis(), 1_010);
    assert_eq!(manager.poll_event(), Some(Event::key_down(ctrl_s)));
    assert_eq!(manager.modifier_state(), KBD_CTRL);
    assert_eq!(manager.source().remaining(), 1);
}

// ─────────────────────────────────────────────────────────────
// Test 15: log stream failures
// ─────────────────────────────────────────────────────────────

/// In-memory storage. Optionally fails one write call on one stream.
#[derive(Default)]
struct MemStorage {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    /// (stream name, 1-based write call that fails)
    fail_write: Option<(String, usize)>,
}

struct MemOut {
    name: String,
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    calls: usize,
    fail_on: Option<usize>,
}

impl Write for MemOut {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.calls += 1;
        if Some(self.calls) == self.fail_on {
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        self.files
            .lock()
            .entry(self.name.clone())
            .or_default()
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl OutSaveFile for MemOut {
    fn finalize(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SaveFileManager for MemStorage {
    fn open_for_loading(&self, name: &str) -> Option<InSaveFile> {
        let bytes = self.files.lock().get(name)?.clone();
        Some(Box::new(Cursor::new(bytes)))
    }

    fn open_for_saving(&self, name: &str) -> Option<Box<dyn OutSaveFile>> {
        self.files.lock().insert(name.to_string(), Vec::new());
        let fail_on = match &self.fail_write {
            Some((file, call)) if file == name => Some(*call),
            _ => None,
        };
        Some(Box::new(MemOut {
            name: name.to_string(),
            files: self.files.clone(),
            calls: 0,
            fail_on,
        }))
    }

    fn remove(&self, name: &str) -> io::Result<()> {
        self.files.lock().remove(name);
        Ok(())
    }
}

#[test]
fn failed_event_write_keeps_intact_prefix() {
    // Each mouse entry is four writes: diff, tag, x, y. Call 6 is the
    // tag of the second entry, so its diff is already in the temp log.
    let storage = Arc::new(MemStorage {
        fail_write: Some((DEFAULT_RECORD_TEMP_FILE_NAME.to_string(), 6)),
        ..MemStorage::default()
    });

    {
        let mut config = config_for("record");
        let mut manager = manager_with(
            storage.clone(),
            &mut config,
            vec![
                Some(Event::mouse_move(1, 1)),
                Some(Event::mouse_move(2, 2)),
                Some(Event::mouse_move(3, 3)),
            ],
        );
        // Delivery does not depend on the log.
        assert_eq!(poll_n(&mut manager, 3).len(), 3);

        let report = manager.finalize().unwrap().expect("recording");
        assert_eq!(report.record_count, 1);
    }

    let log = RecordLog::load(storage.as_ref(), DEFAULT_RECORD_FILE_NAME).unwrap();
    assert_eq!(log.entries, vec![(1, Event::mouse_move(1, 1))]);
    assert!(!storage.files.lock().contains_key(DEFAULT_RECORD_TEMP_FILE_NAME));

    let mut config = config_for("playback");
    let mut manager = manager_with(storage.clone(), &mut config, Vec::new());
    assert_eq!(manager.mode(), RecordMode::Playback);
    assert_eq!(poll_n(&mut manager, 4), vec![(1, Event::mouse_move(1, 1))]);
}

#[test]
fn torn_record_log_ends_playback() {
    let dir = temp_dir("torn_record_log");
    let storage = dir_storage(&dir);

    {
        let mut config = config_for("record");
        let mut manager = manager_with(
            storage.clone(),
            &mut config,
            vec![
                Some(Event::mouse_move(1, 1)),
                Some(Event::mouse_move(2, 2)),
                Some(Event::mouse_move(3, 3)),
            ],
        );
        poll_n(&mut manager, 3);
        assert_eq!(manager.finalize().unwrap().unwrap().record_count, 3);
    }

    // Cut the file five bytes into the second entry.
    let path = storage.path_of(DEFAULT_RECORD_FILE_NAME);
    let mut bytes = fs::read(&path).unwrap();
    let entry = record_len(&Event::mouse_move(0, 0));
    bytes.truncate(bytes.len() - 2 * entry + 5);
    fs::write(&path, &bytes).unwrap();

    let mut config = config_for("playback");
    let mut manager = manager_with(storage.clone(), &mut config, vec![None; 6]);
    assert_eq!(manager.mode(), RecordMode::Playback);

    assert_eq!(poll_n(&mut manager, 6), vec![(1, Event::mouse_move(1, 1))]);
    assert_eq!(manager.event_count(), 6);

    // Live quit still gets through after the log broke.
    manager.push_event(Event::quit());
    assert_eq!(manager.poll_event(), Some(Event::quit()));
}

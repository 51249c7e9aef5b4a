//! Configuration — key/value store plus the recorder's typed view of it.
//!
//! `ConfigManager` holds the application's settings as an ordered JSON
//! object. The event manager reads its keys once, at construction,
//! through `RecorderSettings`, and writes back `subtitles` when a
//! playback log overrides it.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{RecorderError, Result};

pub const KEY_RECORD_MODE: &str = "record_mode";
pub const KEY_RECORD_FILE_NAME: &str = "record_file_name";
pub const KEY_RECORD_TEMP_FILE_NAME: &str = "record_temp_file_name";
pub const KEY_RECORD_TIME_FILE_NAME: &str = "record_time_file_name";
pub const KEY_SUBTITLES: &str = "subtitles";
pub const KEY_CONFIRM_EXIT: &str = "confirm_exit";

pub const DEFAULT_RECORD_FILE_NAME: &str = "record.bin";
pub const DEFAULT_RECORD_TEMP_FILE_NAME: &str = "record.tmp";
pub const DEFAULT_RECORD_TIME_FILE_NAME: &str = "record.time";

/// Flat string/bool settings store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigManager {
    values: Map<String, Value>,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object. Non-object documents are rejected.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| RecorderError::Config(e.to_string()))?;
        match value {
            Value::Object(values) => Ok(Self { values }),
            other => Err(RecorderError::Config(format!(
                "expected a JSON object, got {}",
                other
            ))),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| RecorderError::io(&path.display().to_string(), e))?;
        Self::from_json(&content)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.values)
            .map_err(|e| RecorderError::Config(e.to_string()))?;
        fs::write(path, json).map_err(|e| RecorderError::io(&path.display().to_string(), e))
    }

    /// String value for `key`. Empty string when unset.
    /// Numbers and bools are rendered the way they would print.
    pub fn get(&self, key: &str) -> String {
        match self.values.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }

    /// Bool value for `key`. Accepts JSON bools and the strings
    /// "true"/"yes"/"1" (case-insensitive). Unset is false.
    pub fn get_bool(&self, key: &str) -> bool {
        match self.values.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_i64().map(|v| v != 0).unwrap_or(false),
            Some(Value::String(s)) => {
                let s = s.to_ascii_lowercase();
                s == "true" || s == "yes" || s == "1"
            }
            _ => false,
        }
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.values
            .insert(key.to_string(), Value::String(value.to_string()));
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.values.insert(key.to_string(), Value::Bool(value));
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

/// Which side of the recorder is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordMode {
    #[default]
    PassThrough,
    Record,
    Playback,
}

impl RecordMode {
    /// "record" and "playback" (any case) select a mode; anything else
    /// means pass-through.
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("record") {
            RecordMode::Record
        } else if s.eq_ignore_ascii_case("playback") {
            RecordMode::Playback
        } else {
            RecordMode::PassThrough
        }
    }
}

/// The recorder's settings, resolved against defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecorderSettings {
    pub mode: RecordMode,
    pub record_file_name: String,
    pub record_temp_file_name: String,
    pub record_time_file_name: String,
    pub subtitles: bool,
    pub confirm_exit: bool,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            mode: RecordMode::PassThrough,
            record_file_name: DEFAULT_RECORD_FILE_NAME.to_string(),
            record_temp_file_name: DEFAULT_RECORD_TEMP_FILE_NAME.to_string(),
            record_time_file_name: DEFAULT_RECORD_TIME_FILE_NAME.to_string(),
            subtitles: false,
            confirm_exit: false,
        }
    }
}

impl RecorderSettings {
    pub fn from_config(config: &ConfigManager) -> Self {
        let or_default = |key: &str, default: &str| {
            let v = config.get(key);
            if v.is_empty() {
                default.to_string()
            } else {
                v
            }
        };

        Self {
            mode: RecordMode::parse(&config.get(KEY_RECORD_MODE)),
            record_file_name: or_default(KEY_RECORD_FILE_NAME, DEFAULT_RECORD_FILE_NAME),
            record_temp_file_name: or_default(
                KEY_RECORD_TEMP_FILE_NAME,
                DEFAULT_RECORD_TEMP_FILE_NAME,
            ),
            record_time_file_name: or_default(
                KEY_RECORD_TIME_FILE_NAME,
                DEFAULT_RECORD_TIME_FILE_NAME,
            ),
            subtitles: config.get_bool(KEY_SUBTITLES),
            confirm_exit: config.get_bool(KEY_CONFIRM_EXIT),
        }
    }

    pub fn with_mode(mut self, mode: RecordMode) -> Self {
        self.mode = mode;
        self
    }
}

use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use crate::error::PreferenceError;
use crate::models::{Difficulty, GameMode, UNSET_AVERAGE_TIME};

pub const HIGH_SCORE_KEY: &str = "highScore";
pub const HIGH_SCORE_AVG_TIME_KEY: &str = "highScoreAverageTime";
pub const GAME_MODE_KEY: &str = "gameMode";
pub const DIFFICULTY_KEY: &str = "difficulty";

/// String-keyed store of scalar values that survives restarts.
pub trait PreferenceStore: Send {
    fn get_f64(&self, key: &str) -> Option<f64>;
    fn get_string(&self, key: &str) -> Option<String>;
    fn put_f64(&mut self, key: &str, value: f64) -> Result<(), PreferenceError>;
    fn put_string(&mut self, key: &str, value: &str) -> Result<(), PreferenceError>;
    fn remove(&mut self, key: &str) -> Result<(), PreferenceError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PreferenceValue {
    Number(f64),
    Text(String),
}

impl PreferenceValue {
    fn as_f64(&self) -> Option<f64> {
        match self {
            PreferenceValue::Number(value) => Some(*value),
            PreferenceValue::Text(_) => None,
        }
    }

    fn as_text(&self) -> Option<String> {
        match self {
            PreferenceValue::Text(value) => Some(value.clone()),
            PreferenceValue::Number(_) => None,
        }
    }
}

/// Process-local store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPreferenceStore {
    values: Arc<Mutex<HashMap<String, PreferenceValue>>>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_values<T>(&self, f: impl FnOnce(&mut HashMap<String, PreferenceValue>) -> T) -> T {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut values)
    }
}

impl PreferenceStore for InMemoryPreferenceStore {
    fn get_f64(&self, key: &str) -> Option<f64> {
        self.with_values(|values| values.get(key).and_then(PreferenceValue::as_f64))
    }

    fn get_string(&self, key: &str) -> Option<String> {
        self.with_values(|values| values.get(key).and_then(PreferenceValue::as_text))
    }

    fn put_f64(&mut self, key: &str, value: f64) -> Result<(), PreferenceError> {
        self.with_values(|values| values.insert(key.to_string(), PreferenceValue::Number(value)));
        Ok(())
    }

    fn put_string(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.with_values(|values| {
            values.insert(key.to_string(), PreferenceValue::Text(value.to_string()))
        });
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PreferenceError> {
        self.with_values(|values| values.remove(key));
        Ok(())
    }
}

/// Flat JSON object on disk, rewritten through a temp file on every change.
#[derive(Debug)]
pub struct JsonFilePreferenceStore {
    path: PathBuf,
    values: BTreeMap<String, PreferenceValue>,
}

impl JsonFilePreferenceStore {
    /// A missing file starts empty; an unreadable one is an error; a corrupted
    /// one is logged and replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PreferenceError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                tracing::warn!(
                    "Ignoring corrupted preference file {}: {}",
                    path.display(),
                    e
                );
                BTreeMap::new()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No preference file at {}, starting empty", path.display());
                BTreeMap::new()
            }
            Err(source) => return Err(PreferenceError::Io { path, source }),
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), PreferenceError> {
        let encoded = serde_json::to_vec_pretty(&self.values)?;
        let tmp = self.path.with_extension("json.tmp");
        let io_err = |source| PreferenceError::Io {
            path: self.path.clone(),
            source,
        };
        fs::write(&tmp, encoded).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)
    }
}

impl PreferenceStore for JsonFilePreferenceStore {
    fn get_f64(&self, key: &str) -> Option<f64> {
        self.values.get(key).and_then(PreferenceValue::as_f64)
    }

    fn get_string(&self, key: &str) -> Option<String> {
        self.values.get(key).and_then(PreferenceValue::as_text)
    }

    fn put_f64(&mut self, key: &str, value: f64) -> Result<(), PreferenceError> {
        self.values
            .insert(key.to_string(), PreferenceValue::Number(value));
        self.flush()
    }

    fn put_string(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.values
            .insert(key.to_string(), PreferenceValue::Text(value.to_string()));
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), PreferenceError> {
        if self.values.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// Typed view of everything the engine persists.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preferences {
    pub high_score: f64,
    pub high_score_average_time: f64,
    pub game_mode: GameMode,
    pub difficulty: Difficulty,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            high_score: 0.0,
            high_score_average_time: UNSET_AVERAGE_TIME,
            game_mode: GameMode::Normal,
            difficulty: Difficulty::Medium,
        }
    }
}

impl Preferences {
    /// Missing or corrupted entries fall back to their defaults.
    pub fn load(store: &dyn PreferenceStore) -> Self {
        let defaults = Self::default();

        let high_score = store
            .get_f64(HIGH_SCORE_KEY)
            .filter(|value| value.is_finite() && *value >= 0.0)
            .unwrap_or(defaults.high_score);
        let high_score_average_time = store
            .get_f64(HIGH_SCORE_AVG_TIME_KEY)
            .filter(|value| value.is_finite())
            .unwrap_or(defaults.high_score_average_time);

        let game_mode = parse_or_default(store, GAME_MODE_KEY, defaults.game_mode);
        let difficulty = parse_or_default(store, DIFFICULTY_KEY, defaults.difficulty);

        Self {
            high_score,
            high_score_average_time,
            game_mode,
            difficulty,
        }
    }
}

fn parse_or_default<T>(store: &dyn PreferenceStore, key: &str, default: T) -> T
where
    T: std::str::FromStr<Err = String>,
{
    match store.get_string(key) {
        Some(raw) => raw.parse().unwrap_or_else(|e| {
            tracing::warn!("Stored {} is invalid ({}), using default", key, e);
            default
        }),
        None => default,
    }
}

pub fn persist_high_score(
    store: &mut dyn PreferenceStore,
    score: f64,
    average_seconds: f64,
) -> Result<(), PreferenceError> {
    store.put_f64(HIGH_SCORE_KEY, score)?;
    store.put_f64(HIGH_SCORE_AVG_TIME_KEY, average_seconds)
}

pub fn clear_high_score(store: &mut dyn PreferenceStore) -> Result<(), PreferenceError> {
    store.remove(HIGH_SCORE_KEY)?;
    store.remove(HIGH_SCORE_AVG_TIME_KEY)
}

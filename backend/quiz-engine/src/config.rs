use std::{env, ops::RangeInclusive, path::PathBuf, time::Duration};

use crate::models::DEFAULT_TOTAL_QUESTIONS;
use crate::services::question_generator::{ShadeSettings, ShadeTuning};
use crate::services::session_service::{FeedbackTimings, SessionSettings};

const DEFAULT_PREFERENCES_PATH: &str = "colorblind_test_prefs.json";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub default_total_questions: usize,
    pub feedback_correct_ms: u64,
    pub feedback_incorrect_ms: u64,
    /// Fixed seed for reproducible question sequences.
    pub rng_seed: Option<u64>,
    pub shade: ShadeSettings,
    pub preferences_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_total_questions: DEFAULT_TOTAL_QUESTIONS,
            feedback_correct_ms: 500,
            feedback_incorrect_ms: 1000,
            rng_seed: None,
            shade: ShadeSettings::default(),
            preferences_path: PathBuf::from(DEFAULT_PREFERENCES_PATH),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Local .env is optional
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            // Override with environment variables (prefix: APP_)
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let defaults = Self::default();
        let shade_defaults = defaults.shade;

        let default_total_questions = int_setting(
            &settings,
            "quiz.default_total_questions",
            defaults.default_total_questions as i64,
            1..=1000,
        ) as usize;
        let feedback_correct_ms = int_setting(
            &settings,
            "quiz.feedback_correct_ms",
            defaults.feedback_correct_ms as i64,
            0..=60_000,
        ) as u64;
        let feedback_incorrect_ms = int_setting(
            &settings,
            "quiz.feedback_incorrect_ms",
            defaults.feedback_incorrect_ms as i64,
            0..=60_000,
        ) as u64;
        let rng_seed = settings
            .get_int("quiz.rng_seed")
            .ok()
            .and_then(|seed| u64::try_from(seed).ok());

        let configured_shade = ShadeSettings {
            option_count: int_setting(
                &settings,
                "shade.option_count",
                shade_defaults.option_count as i64,
                2..=64,
            ) as usize,
            medium: ShadeTuning {
                spread: int_setting(
                    &settings,
                    "shade.medium_spread",
                    i64::from(shade_defaults.medium.spread),
                    0..=255,
                ) as u8,
                min_distance: int_setting(
                    &settings,
                    "shade.medium_min_distance",
                    i64::from(shade_defaults.medium.min_distance),
                    0..=765,
                ) as u32,
            },
            hard: ShadeTuning {
                spread: int_setting(
                    &settings,
                    "shade.hard_spread",
                    i64::from(shade_defaults.hard.spread),
                    0..=255,
                ) as u8,
                min_distance: int_setting(
                    &settings,
                    "shade.hard_min_distance",
                    i64::from(shade_defaults.hard.min_distance),
                    0..=765,
                ) as u32,
            },
        };

        let shade = configured_shade.normalized();
        if shade != configured_shade {
            tracing::warn!(
                "Shade tuning {:?} cannot be satisfied, using {:?}",
                configured_shade,
                shade
            );
        }

        let preferences_path = settings
            .get_string("preferences.path")
            .or_else(|_| env::var("COLORQUIZ_PREFERENCES_PATH"))
            .map(PathBuf::from)
            .unwrap_or(defaults.preferences_path);

        tracing::debug!("Configuration loaded for environment: {}", env);

        Ok(Config {
            default_total_questions,
            feedback_correct_ms,
            feedback_incorrect_ms,
            rng_seed,
            shade,
            preferences_path,
        })
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            default_total_questions: self.default_total_questions,
            feedback: FeedbackTimings {
                correct: Duration::from_millis(self.feedback_correct_ms),
                incorrect: Duration::from_millis(self.feedback_incorrect_ms),
            },
        }
    }
}

/// Reads an integer key; missing keys take the default, out-of-range or
/// unparsable values take the default with a warning.
fn int_setting(
    settings: &config::Config,
    key: &str,
    default: i64,
    allowed: RangeInclusive<i64>,
) -> i64 {
    match settings.get_int(key) {
        Ok(value) if allowed.contains(&value) => value,
        Ok(value) => {
            tracing::warn!(
                "Setting {}={} outside {:?}, using default {}",
                key,
                value,
                allowed,
                default
            );
            default
        }
        Err(config::ConfigError::NotFound(_)) => default,
        Err(e) => {
            tracing::warn!("Invalid setting {} ({}), using default {}", key, e, default);
            default
        }
    }
}

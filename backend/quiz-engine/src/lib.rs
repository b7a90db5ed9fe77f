//! Engine for a red/green color-vision quiz: palette sampling, question
//! generation, session lifecycle with timed answer feedback, scoring and
//! persisted preferences. Presentation is left to the embedding application,
//! which drives [`SessionStateMachine`] intents and renders its snapshots.

use anyhow::Context;
use tokio::runtime::Handle;

pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod services;
pub mod telemetry;

pub use crate::config::Config;
pub use error::{PreferenceError, QuizError};
pub use models::{
    AnswerOption, ColorName, ColorSample, Difficulty, GameMode, Question, Screen, SessionPhase,
    SessionState,
};
pub use services::{SessionStateMachine, SessionSummary, Verdict};

/// Loads configuration and opens the preference file. Must be called from
/// within a tokio runtime, which then drives the feedback timers. Tracing is
/// left to the caller; see [`telemetry::init_tracing`].
pub fn bootstrap() -> anyhow::Result<SessionStateMachine> {
    let runtime = Handle::try_current().context("bootstrap requires a tokio runtime")?;
    let config = Config::load().context("failed to load configuration")?;
    let machine = SessionStateMachine::from_config(&config, runtime).with_context(|| {
        format!(
            "failed to open preferences at {}",
            config.preferences_path.display()
        )
    })?;
    tracing::info!(
        "Quiz engine bootstrapped with preferences at {}",
        config.preferences_path.display()
    );
    Ok(machine)
}

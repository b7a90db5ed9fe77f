use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::question::{AnswerOption, Question};
use super::GameMode;

/// Entry of the post-session review list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnsweredRecord {
    pub question: Question,
    pub selected: AnswerOption,
    pub was_correct: bool,
    pub game_mode: GameMode,
    pub elapsed_millis: u64,
    pub answered_at: DateTime<Utc>,
}

impl AnsweredRecord {
    pub fn outcome(&self) -> AnswerOutcome {
        AnswerOutcome::classify(&self.selected, self.was_correct)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOutcome {
    Correct,
    Incorrect,
    Skipped,
}

impl AnswerOutcome {
    pub fn classify(selected: &AnswerOption, was_correct: bool) -> Self {
        if selected.is_skipped() {
            AnswerOutcome::Skipped
        } else if was_correct {
            AnswerOutcome::Correct
        } else {
            AnswerOutcome::Incorrect
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerOutcome::Correct => "correct",
            AnswerOutcome::Incorrect => "incorrect",
            AnswerOutcome::Skipped => "skipped",
        }
    }
}

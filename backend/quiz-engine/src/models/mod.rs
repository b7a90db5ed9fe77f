use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

pub mod answer;
pub mod color;
pub mod question;

pub use answer::{AnsweredRecord, AnswerOutcome};
pub use color::{ChannelRange, ColorName, ColorSample, ColorSwatch, RgbRange};
pub use question::{AnswerOption, Question, GENERATION_ERROR_LABEL};

pub const DEFAULT_TOTAL_QUESTIONS: usize = 10;
/// Stored average time meaning "no high score recorded yet".
pub const UNSET_AVERAGE_TIME: f64 = -1.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum GameMode {
    /// Name the displayed swatch.
    #[default]
    Normal,
    /// Pick the swatch matching a named color.
    Reverse,
    /// Pick the shade matching a reference shade.
    Shade,
}

impl GameMode {
    pub const ALL: [GameMode; 3] = [GameMode::Normal, GameMode::Reverse, GameMode::Shade];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Normal => "NORMAL",
            GameMode::Reverse => "REVERSE",
            GameMode::Shade => "SHADE",
        }
    }

    pub fn uses_color_options(&self) -> bool {
        matches!(self, GameMode::Reverse | GameMode::Shade)
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_uppercase().as_str() {
            "NORMAL" => Ok(GameMode::Normal),
            "REVERSE" => Ok(GameMode::Reverse),
            "SHADE" => Ok(GameMode::Shade),
            _ => Err(format!("Invalid game mode: {}", value)),
        }
    }
}

/// Only affects SHADE questions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Difficulty {
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_uppercase().as_str() {
            "MEDIUM" => Ok(Difficulty::Medium),
            "HARD" => Ok(Difficulty::Hard),
            _ => Err(format!("Invalid difficulty: {}", value)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Home,
    Game,
    Result,
}

/// Screen plus the transient feedback sub-state of GAME.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Home,
    Game,
    GameFeedback,
    Result,
}

/// Read-only view of a quiz session published to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionState {
    pub session_id: Uuid,
    pub screen: Screen,
    pub mode: GameMode,
    pub difficulty: Difficulty,
    pub total_questions: usize,
    pub current_index: usize,
    pub current_question: Option<Question>,
    pub correct_count: usize,
    /// Elapsed milliseconds per answered question, in order.
    pub times: Vec<u64>,
    pub incorrect_answers: Vec<AnsweredRecord>,
    pub selected_answer: Option<AnswerOption>,
    pub answered: bool,
    pub feedback_active: bool,
    pub last_answer_correct: Option<bool>,
    pub correct_option_for_display: Option<AnswerOption>,
    pub final_score: Option<f64>,
    pub high_score: f64,
    /// Seconds, or [`UNSET_AVERAGE_TIME`].
    pub high_score_average_time: f64,
}

impl SessionState {
    pub fn home(mode: GameMode, difficulty: Difficulty, total_questions: usize) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            screen: Screen::Home,
            mode,
            difficulty,
            total_questions,
            current_index: 0,
            current_question: None,
            correct_count: 0,
            times: Vec::new(),
            incorrect_answers: Vec::new(),
            selected_answer: None,
            answered: false,
            feedback_active: false,
            last_answer_correct: None,
            correct_option_for_display: None,
            final_score: None,
            high_score: 0.0,
            high_score_average_time: UNSET_AVERAGE_TIME,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        match self.screen {
            Screen::Home => SessionPhase::Home,
            Screen::Game if self.feedback_active => SessionPhase::GameFeedback,
            Screen::Game => SessionPhase::Game,
            Screen::Result => SessionPhase::Result,
        }
    }

    pub fn has_high_score_time(&self) -> bool {
        self.high_score_average_time >= 0.0
    }
}

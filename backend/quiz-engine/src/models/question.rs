use serde::{Deserialize, Serialize};

use super::color::{ColorName, ColorSample, ColorSwatch};
use super::GameMode;

/// Shown as both prompt and single option when no question could be built.
pub const GENERATION_ERROR_LABEL: &str = "Could not generate a question. Please restart the test.";

/// A selectable answer. Name options belong to NORMAL mode, color options
/// to REVERSE and SHADE.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnswerOption {
    Name(ColorName),
    Color(ColorSample),
    Label(String),
    /// Recorded when the user skips; never matches a correct answer.
    Skipped,
}

impl AnswerOption {
    pub fn is_skipped(&self) -> bool {
        matches!(self, AnswerOption::Skipped)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub mode: GameMode,
    /// Empty in NORMAL mode, where the target swatch itself is the prompt.
    pub prompt: String,
    /// Displayed swatch (NORMAL), named target (REVERSE) or reference shade (SHADE).
    pub target: Option<ColorSwatch>,
    pub correct_answer: AnswerOption,
    pub options: Vec<AnswerOption>,
    /// Set on the placeholder question produced when generation fails.
    pub degraded: bool,
}

impl Question {
    pub fn generation_error(mode: GameMode) -> Self {
        let label = AnswerOption::Label(GENERATION_ERROR_LABEL.to_string());
        Self {
            mode,
            prompt: GENERATION_ERROR_LABEL.to_string(),
            target: None,
            correct_answer: label.clone(),
            options: vec![label],
            degraded: true,
        }
    }

    /// Compares names in NORMAL mode and samples in REVERSE/SHADE. An option of
    /// the wrong kind for the mode is simply incorrect.
    pub fn is_correct(&self, option: &AnswerOption) -> bool {
        if self.degraded {
            return false;
        }
        match (self.mode, option, &self.correct_answer) {
            (GameMode::Normal, AnswerOption::Name(chosen), AnswerOption::Name(expected)) => {
                chosen == expected
            }
            (mode, AnswerOption::Color(chosen), AnswerOption::Color(expected))
                if mode.uses_color_options() =>
            {
                chosen == expected
            }
            _ => false,
        }
    }

    pub fn correct_option_count(&self) -> usize {
        self.options
            .iter()
            .filter(|option| self.is_correct(option))
            .count()
    }
}

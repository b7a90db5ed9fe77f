use rand::{
    rngs::StdRng,
    seq::{IndexedRandom, SliceRandom},
    Rng, SeedableRng,
};
use serde::{Deserialize, Serialize};
use std::iter;

use super::color_palette::ColorPalette;
use crate::error::QuizError;
use crate::metrics::{QUESTIONS_GENERATED_TOTAL, QUESTION_GENERATION_FAILURES_TOTAL};
use crate::models::{
    AnswerOption, ColorSample, ColorSwatch, Difficulty, GameMode, Question,
};

const DISTRACTOR_COUNT: usize = 3;
const MAX_SHADE_ATTEMPTS: usize = 64;

pub const SHADE_PROMPT: &str = "Pick the shade that exactly matches the reference color.";

pub fn reverse_prompt(swatch: &ColorSwatch) -> String {
    format!("Which one is {}?", swatch.name)
}

/// How far SHADE distractors may drift from the reference shade.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShadeTuning {
    /// Maximum per-channel offset from the reference.
    pub spread: u8,
    /// Minimum summed channel distance from the reference.
    pub min_distance: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShadeSettings {
    pub option_count: usize,
    pub medium: ShadeTuning,
    pub hard: ShadeTuning,
}

impl Default for ShadeSettings {
    fn default() -> Self {
        Self {
            option_count: 9,
            medium: ShadeTuning {
                spread: 36,
                min_distance: 12,
            },
            hard: ShadeTuning {
                spread: 14,
                min_distance: 4,
            },
        }
    }
}

impl ShadeTuning {
    /// Spread of at least 1 and a minimum distance that some offset within
    /// the spread can reach (`1..=3 * spread`).
    pub fn normalized(self) -> Self {
        let spread = self.spread.max(1);
        let min_distance = self.min_distance.clamp(1, 3 * u32::from(spread));
        Self {
            spread,
            min_distance,
        }
    }
}

impl ShadeSettings {
    pub fn normalized(self) -> Self {
        Self {
            option_count: self.option_count.max(2),
            medium: self.medium.normalized(),
            hard: self.hard.normalized(),
        }
    }

    pub fn tuning(&self, difficulty: Difficulty) -> ShadeTuning {
        let tuning = match difficulty {
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        };
        tuning.normalized()
    }
}

/// Builds one question at a time from a palette and a random source.
pub struct QuestionGenerator<R = StdRng> {
    palette: ColorPalette,
    shade: ShadeSettings,
    rng: R,
}

impl QuestionGenerator<StdRng> {
    pub fn seeded(palette: ColorPalette, shade: ShadeSettings, seed: u64) -> Self {
        Self::new(palette, shade, StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy(palette: ColorPalette, shade: ShadeSettings) -> Self {
        Self::new(palette, shade, StdRng::from_os_rng())
    }
}

impl<R: Rng> QuestionGenerator<R> {
    pub fn new(palette: ColorPalette, shade: ShadeSettings, rng: R) -> Self {
        Self {
            palette,
            shade,
            rng,
        }
    }

    pub fn palette(&self) -> &ColorPalette {
        &self.palette
    }

    /// Never fails: a generation error yields the placeholder question.
    pub fn generate(&mut self, mode: GameMode, difficulty: Difficulty) -> Question {
        match self.try_generate(mode, difficulty) {
            Ok(question) => {
                QUESTIONS_GENERATED_TOTAL
                    .with_label_values(&[mode.as_str()])
                    .inc();
                tracing::debug!(
                    "Generated {} question with {} options",
                    mode,
                    question.options.len()
                );
                question
            }
            Err(e) => {
                QUESTION_GENERATION_FAILURES_TOTAL.inc();
                tracing::warn!("Question generation failed for mode {}: {}", mode, e);
                Question::generation_error(mode)
            }
        }
    }

    pub fn try_generate(
        &mut self,
        mode: GameMode,
        difficulty: Difficulty,
    ) -> Result<Question, QuizError> {
        if self.palette.is_empty() {
            return Err(QuizError::EmptyPalette);
        }
        let swatches = self.palette.generate_palette(&mut self.rng);

        match mode {
            GameMode::Normal => self.normal_question(&swatches),
            GameMode::Reverse => self.reverse_question(&swatches),
            GameMode::Shade => self.shade_question(&swatches, difficulty),
        }
    }

    fn normal_question(&mut self, swatches: &[ColorSwatch]) -> Result<Question, QuizError> {
        let correct = *swatches
            .choose(&mut self.rng)
            .ok_or(QuizError::EmptyPalette)?;

        let mut others: Vec<_> = swatches
            .iter()
            .map(|swatch| swatch.name)
            .filter(|name| *name != correct.name)
            .collect();
        others.shuffle(&mut self.rng);
        others.truncate(DISTRACTOR_COUNT);

        let mut options: Vec<AnswerOption> = iter::once(correct.name)
            .chain(others)
            .map(AnswerOption::Name)
            .collect();
        options.shuffle(&mut self.rng);

        Ok(Question {
            mode: GameMode::Normal,
            prompt: String::new(),
            target: Some(correct),
            correct_answer: AnswerOption::Name(correct.name),
            options,
            degraded: false,
        })
    }

    fn reverse_question(&mut self, swatches: &[ColorSwatch]) -> Result<Question, QuizError> {
        let target = *swatches
            .choose(&mut self.rng)
            .ok_or(QuizError::EmptyPalette)?;

        let distractors =
            self.palette
                .pick_distractors(target.name, swatches, DISTRACTOR_COUNT, &mut self.rng);

        // Overlapping custom ranges could draw the target sample twice.
        let mut options: Vec<AnswerOption> = iter::once(target.color)
            .chain(
                distractors
                    .iter()
                    .map(|swatch| swatch.color)
                    .filter(|color| *color != target.color),
            )
            .map(AnswerOption::Color)
            .collect();
        options.shuffle(&mut self.rng);

        Ok(Question {
            mode: GameMode::Reverse,
            prompt: reverse_prompt(&target),
            target: Some(target),
            correct_answer: AnswerOption::Color(target.color),
            options,
            degraded: false,
        })
    }

    fn shade_question(
        &mut self,
        swatches: &[ColorSwatch],
        difficulty: Difficulty,
    ) -> Result<Question, QuizError> {
        let base = *swatches
            .choose(&mut self.rng)
            .ok_or(QuizError::EmptyPalette)?;
        let tuning = self.shade.tuning(difficulty);
        let reference = base.color;

        let wanted = self.shade.option_count.max(2);
        let mut shades = vec![reference];
        while shades.len() < wanted {
            match self.near_shade(reference, tuning, &shades) {
                Some(shade) => shades.push(shade),
                None => break,
            }
        }

        let mut options: Vec<AnswerOption> =
            shades.into_iter().map(AnswerOption::Color).collect();
        options.shuffle(&mut self.rng);

        Ok(Question {
            mode: GameMode::Shade,
            prompt: SHADE_PROMPT.to_string(),
            target: Some(base),
            correct_answer: AnswerOption::Color(reference),
            options,
            degraded: false,
        })
    }

    /// A shade within `tuning.spread` of `reference` on every channel, at least
    /// `tuning.min_distance` away in total and not already in `taken`.
    fn near_shade(
        &mut self,
        reference: ColorSample,
        tuning: ShadeTuning,
        taken: &[ColorSample],
    ) -> Option<ColorSample> {
        let spread = i16::from(tuning.spread);
        let min_distance = tuning.min_distance;
        let fits = |candidate: &ColorSample| {
            candidate.distance(&reference) >= min_distance && !taken.contains(candidate)
        };

        for _ in 0..MAX_SHADE_ATTEMPTS {
            let candidate = ColorSample::new(
                offset_channel(reference.red, self.rng.random_range(-spread..=spread)),
                offset_channel(reference.green, self.rng.random_range(-spread..=spread)),
                offset_channel(reference.blue, self.rng.random_range(-spread..=spread)),
            );
            if fits(&candidate) {
                return Some(candidate);
            }
        }

        // Crowded spreads or colors pinned at the channel limits: scan every
        // offset in the spread cube. Clamping keeps each channel within spread.
        for red in -spread..=spread {
            for green in -spread..=spread {
                for blue in -spread..=spread {
                    let candidate = ColorSample::new(
                        offset_channel(reference.red, red),
                        offset_channel(reference.green, green),
                        offset_channel(reference.blue, blue),
                    );
                    if fits(&candidate) {
                        return Some(candidate);
                    }
                }
            }
        }
        None
    }
}

fn offset_channel(value: u8, offset: i16) -> u8 {
    (i16::from(value) + offset).clamp(0, 255) as u8
}

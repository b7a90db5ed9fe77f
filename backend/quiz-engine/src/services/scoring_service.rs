//! Turns a finished session's accuracy and response times into a 0-100 score.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::GameMode;

const ACCURACY_WEIGHT: f64 = 0.75;
const TIME_WEIGHT: f64 = 0.25;
const FAST_TIME_THRESHOLD: f64 = 2.0;
const MEDIUM_TIME_THRESHOLD: f64 = 5.0;
const SLOW_TIME_THRESHOLD: f64 = 8.0;

const NO_SIGNS_THRESHOLD: f64 = 80.0;
const MILD_SIGNS_THRESHOLD: f64 = 60.0;

/// Speed component in [-100, 100]: flat 100 up to 2s, linear down to 0 at 5s,
/// linear down to -100 at 8s, flat -100 beyond.
pub fn time_score(avg_seconds: f64) -> f64 {
    if avg_seconds <= FAST_TIME_THRESHOLD {
        100.0
    } else if avg_seconds <= MEDIUM_TIME_THRESHOLD {
        (MEDIUM_TIME_THRESHOLD - avg_seconds) / (MEDIUM_TIME_THRESHOLD - FAST_TIME_THRESHOLD)
            * 100.0
    } else if avg_seconds <= SLOW_TIME_THRESHOLD {
        (SLOW_TIME_THRESHOLD - avg_seconds) / (SLOW_TIME_THRESHOLD - MEDIUM_TIME_THRESHOLD) * 100.0
            - 100.0
    } else {
        -100.0
    }
}

/// Mean of `times` in seconds, 0 when nothing was answered.
pub fn average_seconds(times: &[u64]) -> f64 {
    if times.is_empty() {
        return 0.0;
    }
    let total: f64 = times.iter().map(|ms| *ms as f64).sum();
    total / times.len() as f64 / 1000.0
}

pub fn accuracy_percent(correct_count: usize, total_questions: usize) -> f64 {
    correct_count as f64 / total_questions.max(1) as f64 * 100.0
}

pub fn final_score(correct_count: usize, total_questions: usize, times: &[u64]) -> f64 {
    let accuracy = accuracy_percent(correct_count, total_questions);
    let speed = time_score(average_seconds(times));
    let combined = ACCURACY_WEIGHT * accuracy + TIME_WEIGHT * (speed + 100.0) / 2.0;
    combined.clamp(0.0, 100.0)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    NoStrongSigns,
    MildSigns,
    SignificantSigns,
}

impl Verdict {
    pub fn from_score(score: f64) -> Self {
        if score >= NO_SIGNS_THRESHOLD {
            Verdict::NoStrongSigns
        } else if score >= MILD_SIGNS_THRESHOLD {
            Verdict::MildSigns
        } else {
            Verdict::SignificantSigns
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Verdict::NoStrongSigns => "No strong signs of red/green color-vision deficiency",
            Verdict::MildSigns => "Mild signs of red/green color-vision deficiency",
            Verdict::SignificantSigns => {
                "Significant signs of red/green color-vision deficiency; consider an eye exam"
            }
        }
    }
}

/// Result-screen digest of a completed session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSummary {
    pub mode: GameMode,
    pub correct_count: usize,
    pub total_questions: usize,
    /// Whole percent, rounded down.
    pub accuracy_percent: usize,
    pub average_seconds: Option<f64>,
    pub score: f64,
    pub verdict: Verdict,
}

impl SessionSummary {
    pub fn new(
        mode: GameMode,
        correct_count: usize,
        total_questions: usize,
        times: &[u64],
        score: f64,
    ) -> Self {
        let accuracy_percent = if total_questions > 0 {
            correct_count * 100 / total_questions
        } else {
            0
        };
        Self {
            mode,
            correct_count,
            total_questions,
            accuracy_percent,
            average_seconds: (!times.is_empty()).then(|| average_seconds(times)),
            score,
            verdict: Verdict::from_score(score),
        }
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mode: {}", self.mode)?;
        writeln!(
            f,
            "Correct: {}/{} ({}%)",
            self.correct_count, self.total_questions, self.accuracy_percent
        )?;
        match self.average_seconds {
            Some(avg) => writeln!(f, "Average time: {:.2}s", avg)?,
            None => writeln!(f, "Average time: n/a")?,
        }
        writeln!(f)?;
        write!(f, "Verdict: {}", self.verdict.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn time_score_breakpoints() {
        assert_eq!(time_score(2.0), 100.0);
        assert_eq!(time_score(5.0), 0.0);
        assert_eq!(time_score(8.0), -100.0);
        assert_eq!(time_score(0.5), 100.0);
        assert_eq!(time_score(10.0), -100.0);
        assert!(approx(time_score(3.5), 50.0));
        assert!(approx(time_score(6.5), -50.0));
    }

    #[test]
    fn time_score_is_non_increasing_between_breakpoints() {
        let mut previous = time_score(2.0);
        let mut seconds = 2.0;
        while seconds <= 8.0 {
            let current = time_score(seconds);
            assert!(current <= previous, "increase at {}s", seconds);
            previous = current;
            seconds += 0.01;
        }
    }

    #[test]
    fn average_seconds_handles_empty() {
        assert_eq!(average_seconds(&[]), 0.0);
        assert!(approx(average_seconds(&[1000, 3000]), 2.0));
    }

    #[test]
    fn final_score_blends_accuracy_and_speed() {
        assert!(approx(final_score(1, 1, &[1000]), 100.0));
        assert!(approx(final_score(0, 1, &[0]), 25.0));
        // 50% accuracy at 3.5s average: 37.5 + 0.25 * 75
        assert!(approx(final_score(5, 10, &[3500; 10]), 56.25));
        // slow and wrong bottoms out at zero
        assert!(approx(final_score(0, 4, &[20_000; 4]), 0.0));
    }

    #[test]
    fn final_score_stays_in_bounds() {
        for total in 0..12usize {
            for correct in 0..=total {
                for ms in [0u64, 900, 2500, 4999, 6000, 8000, 60_000] {
                    let times = vec![ms; total];
                    let score = final_score(correct, total, &times);
                    assert!((0.0..=100.0).contains(&score));
                }
            }
        }
    }

    #[test]
    fn zero_total_does_not_divide_by_zero() {
        assert!(approx(final_score(0, 0, &[]), 25.0));
    }

    #[test]
    fn verdict_thresholds() {
        assert_eq!(Verdict::from_score(80.0), Verdict::NoStrongSigns);
        assert_eq!(Verdict::from_score(79.99), Verdict::MildSigns);
        assert_eq!(Verdict::from_score(60.0), Verdict::MildSigns);
        assert_eq!(Verdict::from_score(59.99), Verdict::SignificantSigns);
    }

    #[test]
    fn summary_text_lists_accuracy_time_and_verdict() {
        let summary = SessionSummary::new(GameMode::Reverse, 2, 3, &[1000, 2000, 1500], 91.0);
        assert_eq!(summary.accuracy_percent, 66);
        assert_eq!(summary.verdict, Verdict::NoStrongSigns);

        let text = summary.to_string();
        assert!(text.contains("Mode: REVERSE"));
        assert!(text.contains("Correct: 2/3 (66%)"));
        assert!(text.contains("Average time: 1.50s"));
        assert!(text.contains("No strong signs"));

        let empty = SessionSummary::new(GameMode::Normal, 0, 0, &[], 25.0);
        assert_eq!(empty.average_seconds, None);
        assert!(empty.to_string().contains("Average time: n/a"));
    }
}

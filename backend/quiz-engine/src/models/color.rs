use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::QuizError;

/// Base color names used by the quiz, in canonical palette order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColorName {
    Red,
    Green,
    Blue,
    Yellow,
    Orange,
    Purple,
    Brown,
    Pink,
}

impl ColorName {
    pub const ALL: [ColorName; 8] = [
        ColorName::Red,
        ColorName::Green,
        ColorName::Blue,
        ColorName::Yellow,
        ColorName::Orange,
        ColorName::Purple,
        ColorName::Brown,
        ColorName::Pink,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorName::Red => "Red",
            ColorName::Green => "Green",
            ColorName::Blue => "Blue",
            ColorName::Yellow => "Yellow",
            ColorName::Orange => "Orange",
            ColorName::Purple => "Purple",
            ColorName::Brown => "Brown",
            ColorName::Pink => "Pink",
        }
    }
}

impl fmt::Display for ColorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorName {
    type Err = QuizError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        ColorName::ALL
            .into_iter()
            .find(|name| name.as_str().to_lowercase() == normalized)
            .ok_or_else(|| QuizError::UnknownColor(value.to_string()))
    }
}

/// A concrete sRGB color drawn from a palette range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ColorSample {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl ColorSample {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }

    /// Sum of absolute per-channel differences.
    pub fn distance(&self, other: &ColorSample) -> u32 {
        let diff = |a: u8, b: u8| u32::from(a.abs_diff(b));
        diff(self.red, other.red) + diff(self.green, other.green) + diff(self.blue, other.blue)
    }
}

impl fmt::Display for ColorSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Inclusive sampling interval for one color channel.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ChannelRange {
    low: u8,
    high: u8,
}

impl ChannelRange {
    pub fn new(low: u8, high: u8) -> Result<Self, QuizError> {
        if low > high {
            return Err(QuizError::InvalidRange { low, high });
        }
        Ok(Self { low, high })
    }

    /// Caller guarantees `low <= high`.
    pub(crate) const fn fixed(low: u8, high: u8) -> Self {
        Self { low, high }
    }

    pub fn low(&self) -> u8 {
        self.low
    }

    pub fn high(&self) -> u8 {
        self.high
    }

    pub fn contains(&self, value: u8) -> bool {
        (self.low..=self.high).contains(&value)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u8 {
        rng.random_range(self.low..=self.high)
    }
}

/// Per-channel sampling ranges for one base color.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct RgbRange {
    pub red: ChannelRange,
    pub green: ChannelRange,
    pub blue: ChannelRange,
}

impl RgbRange {
    pub fn new(red: (u8, u8), green: (u8, u8), blue: (u8, u8)) -> Result<Self, QuizError> {
        Ok(Self {
            red: ChannelRange::new(red.0, red.1)?,
            green: ChannelRange::new(green.0, green.1)?,
            blue: ChannelRange::new(blue.0, blue.1)?,
        })
    }

    pub(crate) const fn fixed(red: (u8, u8), green: (u8, u8), blue: (u8, u8)) -> Self {
        Self {
            red: ChannelRange::fixed(red.0, red.1),
            green: ChannelRange::fixed(green.0, green.1),
            blue: ChannelRange::fixed(blue.0, blue.1),
        }
    }

    pub fn contains(&self, sample: &ColorSample) -> bool {
        self.red.contains(sample.red)
            && self.green.contains(sample.green)
            && self.blue.contains(sample.blue)
    }

    /// Draws each channel independently and uniformly.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> ColorSample {
        ColorSample {
            red: self.red.sample(rng),
            green: self.green.sample(rng),
            blue: self.blue.sample(rng),
        }
    }
}

/// A sampled color paired with the base name it was drawn from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColorSwatch {
    pub name: ColorName,
    pub color: ColorSample,
}

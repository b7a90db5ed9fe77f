use rand::{seq::SliceRandom, Rng};
use std::collections::HashMap;

use crate::error::QuizError;
use crate::models::{ColorName, ColorSample, ColorSwatch, RgbRange};

const STANDARD_RANGES: [(ColorName, RgbRange); 8] = [
    // bright, pure reds
    (ColorName::Red, RgbRange::fixed((160, 220), (0, 50), (0, 50))),
    // yellowish greens, extra red in the mix
    (ColorName::Green, RgbRange::fixed((80, 135), (160, 255), (0, 50))),
    (ColorName::Blue, RgbRange::fixed((0, 30), (0, 80), (200, 255))),
    // red and green kept close together
    (ColorName::Yellow, RgbRange::fixed((190, 255), (190, 235), (0, 50))),
    (ColorName::Orange, RgbRange::fixed((210, 255), (130, 170), (0, 40))),
    (ColorName::Purple, RgbRange::fixed((125, 150), (0, 50), (150, 220))),
    (ColorName::Brown, RgbRange::fixed((100, 140), (40, 75), (10, 40))),
    (ColorName::Pink, RgbRange::fixed((220, 255), (120, 160), (160, 200))),
];

const STANDARD_CONFUSIONS: [(ColorName, &[ColorName]); 8] = [
    (ColorName::Green, &[ColorName::Yellow, ColorName::Brown]),
    (ColorName::Red, &[ColorName::Brown, ColorName::Orange]),
    (ColorName::Purple, &[ColorName::Blue, ColorName::Pink]),
    (ColorName::Blue, &[ColorName::Purple]),
    (ColorName::Yellow, &[ColorName::Green, ColorName::Orange]),
    (
        ColorName::Brown,
        &[ColorName::Red, ColorName::Green, ColorName::Orange],
    ),
    (
        ColorName::Orange,
        &[ColorName::Red, ColorName::Yellow, ColorName::Brown],
    ),
    (ColorName::Pink, &[ColorName::Purple, ColorName::Red]),
];

/// Named sampling ranges plus the confusion hints used to pick distractors.
///
/// The palette holds no random source of its own; every draw takes the
/// caller's generator so a seeded generator reproduces the same colors.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorPalette {
    ranges: Vec<(ColorName, RgbRange)>,
    confusions: HashMap<ColorName, Vec<ColorName>>,
}

impl ColorPalette {
    /// Duplicate names keep their first range.
    pub fn new(
        ranges: impl IntoIterator<Item = (ColorName, RgbRange)>,
        confusions: HashMap<ColorName, Vec<ColorName>>,
    ) -> Self {
        let mut unique: Vec<(ColorName, RgbRange)> = Vec::new();
        for (name, range) in ranges {
            if unique.iter().any(|(existing, _)| *existing == name) {
                tracing::warn!("Duplicate palette range for {} ignored", name);
                continue;
            }
            unique.push((name, range));
        }
        Self {
            ranges: unique,
            confusions,
        }
    }

    pub fn standard() -> Self {
        let confusions = STANDARD_CONFUSIONS
            .iter()
            .map(|(name, confusables)| (*name, confusables.to_vec()))
            .collect();
        Self::new(STANDARD_RANGES, confusions)
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), HashMap::new())
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = ColorName> + '_ {
        self.ranges.iter().map(|(name, _)| *name)
    }

    pub fn range_of(&self, name: ColorName) -> Option<&RgbRange> {
        self.ranges
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, range)| range)
    }

    pub fn sample_color<R: Rng + ?Sized>(
        &self,
        name: ColorName,
        rng: &mut R,
    ) -> Result<ColorSample, QuizError> {
        self.range_of(name)
            .map(|range| range.sample(rng))
            .ok_or_else(|| QuizError::UnknownColor(name.to_string()))
    }

    /// One freshly sampled swatch per configured name, in palette order.
    pub fn generate_palette<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<ColorSwatch> {
        self.ranges
            .iter()
            .map(|(name, range)| ColorSwatch {
                name: *name,
                color: range.sample(rng),
            })
            .collect()
    }

    pub fn confusables_of(&self, name: ColorName) -> &[ColorName] {
        self.confusions
            .get(&name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Picks up to `count` swatches other than `target`, taking confusable
    /// names first (in shuffled order) and topping up from the shuffled rest.
    pub fn pick_distractors<R: Rng + ?Sized>(
        &self,
        target: ColorName,
        swatches: &[ColorSwatch],
        count: usize,
        rng: &mut R,
    ) -> Vec<ColorSwatch> {
        let mut confusables = self.confusables_of(target).to_vec();
        confusables.shuffle(rng);

        let mut picked: Vec<ColorSwatch> = Vec::with_capacity(count);
        for name in confusables {
            if picked.len() >= count {
                break;
            }
            if name == target || picked.iter().any(|swatch| swatch.name == name) {
                continue;
            }
            if let Some(swatch) = swatches.iter().find(|swatch| swatch.name == name) {
                picked.push(*swatch);
            }
        }

        let mut remaining: Vec<ColorSwatch> = swatches
            .iter()
            .filter(|swatch| {
                swatch.name != target && !picked.iter().any(|p| p.name == swatch.name)
            })
            .copied()
            .collect();
        remaining.shuffle(rng);

        let missing = count.saturating_sub(picked.len());
        picked.extend(remaining.into_iter().take(missing));
        picked
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::standard()
    }
}

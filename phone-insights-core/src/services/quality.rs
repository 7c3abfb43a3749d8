//! Input quality scoring.
//!
//! Scores how much the upstream model can be trusted with a given input:
//! how many of the task's expected attributes were supplied, and whether the
//! supplied values fall inside the ranges seen in the phone dataset.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use super::format::{format_battery, format_ram, format_screen, format_weight};
use crate::domain::{input::PredictionInput, task::TaskType};

/// Penalty applied to the score for each implausible attribute.
const WARNING_PENALTY: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    /// 0.0 (unusable) to 1.0 (complete and plausible).
    pub score: f64,
    pub provided: Vec<String>,
    pub missing: Vec<String>,
    pub warnings: Vec<String>,
}

/// Plausible ranges for dataset attributes.
#[derive(Debug, Clone)]
pub struct InputQuality {
    ram_gb: RangeInclusive<f64>,
    battery_mah: RangeInclusive<f64>,
    screen_inches: RangeInclusive<f64>,
    weight_grams: RangeInclusive<f64>,
    earliest_year: i32,
}

impl Default for InputQuality {
    fn default() -> Self {
        Self {
            ram_gb: 1.0..=32.0,
            battery_mah: 1000.0..=10000.0,
            screen_inches: 3.0..=8.0,
            weight_grams: 80.0..=400.0,
            earliest_year: 2000,
        }
    }
}

impl InputQuality {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scores `input` against what `task` expects.
    pub fn assess(&self, task: TaskType, input: &PredictionInput) -> QualityReport {
        let expected = task.expected_fields();
        let (provided, missing): (Vec<&str>, Vec<&str>) =
            expected.iter().copied().partition(|field| input.is_provided(field));

        let warnings = self.plausibility_warnings(input);

        let completeness = if expected.is_empty() {
            1.0
        } else {
            provided.len() as f64 / expected.len() as f64
        };
        let score = (completeness - WARNING_PENALTY * warnings.len() as f64).clamp(0.0, 1.0);

        QualityReport {
            score,
            provided: provided.into_iter().map(str::to_string).collect(),
            missing: missing.into_iter().map(str::to_string).collect(),
            warnings,
        }
    }

    fn plausibility_warnings(&self, input: &PredictionInput) -> Vec<String> {
        let mut warnings = Vec::new();

        let checks: [(&str, Option<f64>, &RangeInclusive<f64>, fn(f64) -> String, &str); 4] = [
            ("ram", input.ram, &self.ram_gb, format_ram, "GB"),
            ("battery", input.battery, &self.battery_mah, format_battery, "mAh"),
            ("screenSize", input.screen_size, &self.screen_inches, format_screen, "in"),
            ("weight", input.weight, &self.weight_grams, format_weight, "g"),
        ];
        for (field, value, range, format, unit) in checks {
            if let Some(v) = value {
                if !range.contains(&v) {
                    warnings.push(format!(
                        "{} of {} is outside the usual {}-{} {}",
                        field,
                        format(v),
                        range.start(),
                        range.end(),
                        unit
                    ));
                }
            }
        }

        if let Some(year) = input.year {
            let latest = Utc::now().year() + 1;
            if year < self.earliest_year || year > latest {
                warnings.push(format!(
                    "year {} is outside {}-{}",
                    year, self.earliest_year, latest
                ));
            }
        }

        warnings
    }
}

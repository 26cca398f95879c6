//! Population anthropometric ratios and plausibility correction.
//!
//! Each measurement is compared against its expected ratio to height. Values
//! far outside normal biological variation are more likely to be landmark
//! noise than real anatomy, so they are shrunk toward the expectation.

use serde::{Deserialize, Serialize};

use crate::config::CorrectionConfig;
use crate::measurement::{MeasurementKey, MeasurementSet, Warning};
use crate::types::safe_div;

/// Version tag of the built-in ratio tables.
pub const RATIO_TABLE_VERSION: &str = "2024.1";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    /// Uses the mean of the male and female tables
    #[default]
    Other,
}

/// Expected ratio of a measurement to height and its standard deviation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioEntry {
    pub expected_ratio: f64,
    pub std_dev: f64,
}

impl RatioEntry {
    const fn new(expected_ratio: f64, std_dev: f64) -> Self {
        Self {
            expected_ratio,
            std_dev,
        }
    }

    fn blend(a: Self, b: Self) -> Self {
        Self::new(
            (a.expected_ratio + b.expected_ratio) / 2.0,
            (a.std_dev + b.std_dev) / 2.0,
        )
    }
}

const MALE: [(MeasurementKey, RatioEntry); 9] = [
    (MeasurementKey::Shoulders, RatioEntry::new(0.259, 0.015)),
    (MeasurementKey::Chest, RatioEntry::new(0.560, 0.040)),
    (MeasurementKey::Waist, RatioEntry::new(0.470, 0.050)),
    (MeasurementKey::Hips, RatioEntry::new(0.545, 0.035)),
    (MeasurementKey::Neck, RatioEntry::new(0.220, 0.015)),
    (MeasurementKey::Sleeve, RatioEntry::new(0.350, 0.020)),
    (MeasurementKey::Inseam, RatioEntry::new(0.450, 0.025)),
    (MeasurementKey::Thigh, RatioEntry::new(0.320, 0.030)),
    (MeasurementKey::Calf, RatioEntry::new(0.215, 0.020)),
];

const FEMALE: [(MeasurementKey, RatioEntry); 9] = [
    (MeasurementKey::Shoulders, RatioEntry::new(0.230, 0.015)),
    (MeasurementKey::Chest, RatioEntry::new(0.540, 0.045)),
    (MeasurementKey::Waist, RatioEntry::new(0.445, 0.055)),
    (MeasurementKey::Hips, RatioEntry::new(0.600, 0.045)),
    (MeasurementKey::Neck, RatioEntry::new(0.205, 0.015)),
    (MeasurementKey::Sleeve, RatioEntry::new(0.340, 0.020)),
    (MeasurementKey::Inseam, RatioEntry::new(0.455, 0.025)),
    (MeasurementKey::Thigh, RatioEntry::new(0.345, 0.035)),
    (MeasurementKey::Calf, RatioEntry::new(0.220, 0.020)),
];

/// Read-only ratio table for one gender.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatioTable {
    pub version: &'static str,
    pub gender: Gender,
    entries: Vec<(MeasurementKey, RatioEntry)>,
}

impl RatioTable {
    pub fn for_gender(gender: Gender) -> Self {
        let entries = match gender {
            Gender::Male => MALE.to_vec(),
            Gender::Female => FEMALE.to_vec(),
            Gender::Other => MALE
                .iter()
                .zip(FEMALE.iter())
                .map(|(&(key, m), &(_, f))| (key, RatioEntry::blend(m, f)))
                .collect(),
        };
        Self {
            version: RATIO_TABLE_VERSION,
            gender,
            entries,
        }
    }

    pub fn get(&self, key: MeasurementKey) -> Option<RatioEntry> {
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, e)| *e)
    }

    /// Expected value of `key` in centimeters for a person of `height` cm.
    pub fn expected(&self, key: MeasurementKey, height: f64) -> Option<f64> {
        self.get(key).map(|e| e.expected_ratio * height)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MeasurementKey, RatioEntry)> + '_ {
        self.entries.iter().copied()
    }
}

/// Distance of `measured` from the population norm, in standard deviations.
/// Returns 0 for a non-positive height.
pub fn z_score(measured: f64, height: f64, entry: RatioEntry) -> f64 {
    if height <= 0.0 {
        return 0.0;
    }
    let actual_ratio = safe_div(measured, height);
    safe_div((actual_ratio - entry.expected_ratio).abs(), entry.std_dev)
}

/// Shrink measurements that deviate strongly from the population ratios.
///
/// * z > heavy threshold: `heavy_w * measured + (1 - heavy_w) * expected`, with a warning
/// * light < z <= heavy: `light_w * measured + (1 - light_w) * expected`
/// * otherwise: unchanged
///
/// Keys without a table entry (height) pass through untouched.
pub fn correct(
    raw: &MeasurementSet,
    height: f64,
    gender: Gender,
    config: &CorrectionConfig,
) -> (MeasurementSet, Vec<Warning>) {
    let table = RatioTable::for_gender(gender);
    let mut corrected = MeasurementSet::new();
    let mut warnings = Vec::new();

    for (key, measured) in raw.iter() {
        let Some(entry) = table.get(key).filter(|_| height > 0.0 && measured > 0.0) else {
            corrected.insert(key, measured);
            continue;
        };

        let expected = entry.expected_ratio * height;
        let z = z_score(measured, height, entry);
        let value = if z > config.heavy_threshold {
            tracing::warn!(key = %key, z, measured, expected, "statistical outlier corrected");
            warnings.push(Warning::StatisticalOutlier { key, z_score: z });
            blend(measured, expected, config.heavy_measured_weight)
        } else if z > config.light_threshold {
            tracing::debug!(key = %key, z, measured, expected, "light correction");
            blend(measured, expected, config.light_measured_weight)
        } else {
            measured
        };
        corrected.insert(key, value);
    }

    (corrected, warnings)
}

fn blend(measured: f64, expected: f64, measured_weight: f64) -> f64 {
    measured_weight * measured + (1.0 - measured_weight) * expected
}

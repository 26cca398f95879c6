//! Measurement keys, measurement sets and the per-scan result.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationMethod;
use crate::landmark::AngleKind;

/// The body measurements this crate produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementKey {
    Height,
    Shoulders,
    Chest,
    Waist,
    Hips,
    Neck,
    Sleeve,
    Inseam,
    Thigh,
    Calf,
}

impl MeasurementKey {
    pub const ALL: [MeasurementKey; 10] = [
        Self::Height,
        Self::Shoulders,
        Self::Chest,
        Self::Waist,
        Self::Hips,
        Self::Neck,
        Self::Sleeve,
        Self::Inseam,
        Self::Thigh,
        Self::Calf,
    ];

    /// Keys estimated as cross-section circumferences rather than straight lengths.
    pub const CIRCUMFERENCES: [MeasurementKey; 6] = [
        Self::Chest,
        Self::Waist,
        Self::Hips,
        Self::Neck,
        Self::Thigh,
        Self::Calf,
    ];

    pub fn is_circumference(self) -> bool {
        Self::CIRCUMFERENCES.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Height => "height",
            Self::Shoulders => "shoulders",
            Self::Chest => "chest",
            Self::Waist => "waist",
            Self::Hips => "hips",
            Self::Neck => "neck",
            Self::Sleeve => "sleeve",
            Self::Inseam => "inseam",
            Self::Thigh => "thigh",
            Self::Calf => "calf",
        }
    }
}

impl std::fmt::Display for MeasurementKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Centimeter values keyed by measurement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeasurementSet {
    values: BTreeMap<MeasurementKey, f64>,
}

impl MeasurementSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: MeasurementKey) -> Option<f64> {
        self.values.get(&key).copied()
    }

    /// Stores `value`, mapping non-finite input to 0.
    pub fn insert(&mut self, key: MeasurementKey, value: f64) {
        let value = if value.is_finite() { value } else { 0.0 };
        self.values.insert(key, value);
    }

    pub fn contains(&self, key: MeasurementKey) -> bool {
        self.values.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = MeasurementKey> + '_ {
        self.values.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MeasurementKey, f64)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }

    /// Height, or 0 when absent.
    pub fn height(&self) -> f64 {
        self.get(MeasurementKey::Height).unwrap_or(0.0)
    }
}

impl FromIterator<(MeasurementKey, f64)> for MeasurementSet {
    fn from_iter<I: IntoIterator<Item = (MeasurementKey, f64)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

/// Non-fatal diagnostics collected while computing a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// No reference object or known height; scale assumes an average height.
    EstimatedCalibration { assumed_height_cm: f64 },
    /// No side capture; circumferences come from population ratios.
    MissingSideView,
    /// A measurement deviated more than the heavy threshold from the population norm.
    StatisticalOutlier { key: MeasurementKey, z_score: f64 },
    /// The front capture yielded no usable body extent.
    DegenerateGeometry,
}

impl Warning {
    /// Suggested user action for this warning.
    pub fn remedy(&self) -> &'static str {
        match self {
            Self::EstimatedCalibration { .. } => {
                "Enter your height or hold a credit card in frame for calibrated results"
            }
            Self::MissingSideView => "Add a side photo for accurate circumference measurements",
            Self::StatisticalOutlier { .. } => {
                "Retake the photo in good lighting with fitted clothing and a full-body view"
            }
            Self::DegenerateGeometry => "Retake with your full body visible, head to feet",
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EstimatedCalibration { assumed_height_cm } => write!(
                f,
                "Calibration estimated from an assumed height of {:.0} cm",
                assumed_height_cm
            ),
            Self::MissingSideView => {
                f.write_str("No side view: circumferences estimated from population ratios")
            }
            Self::StatisticalOutlier { key, z_score } => write!(
                f,
                "{} was a statistical outlier (z = {:.1}) and has been corrected",
                key, z_score
            ),
            Self::DegenerateGeometry => f.write_str("Could not detect a full body outline"),
        }
    }
}

/// Provenance of a [`MeasurementResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    pub angles_used: Vec<AngleKind>,
    pub calibration_method: CalibrationMethod,
    pub engine_version: String,
}

/// Output of one scan's pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementResult {
    /// Centimeter values
    pub measurements: MeasurementSet,
    /// Per-measurement confidence, 0 to 100
    pub confidence: MeasurementSet,
    /// Overall accuracy score, 0 to 100
    pub overall_accuracy: f64,
    pub warnings: Vec<Warning>,
    pub metadata: ResultMetadata,
}

impl MeasurementResult {
    pub fn value_of(&self, key: MeasurementKey) -> Option<f64> {
        self.measurements.get(key)
    }

    pub fn confidence_of(&self, key: MeasurementKey) -> f64 {
        self.confidence.get(key).unwrap_or(0.0)
    }

    pub fn has_side_view(&self) -> bool {
        self.metadata.angles_used.contains(&AngleKind::Side)
    }
}

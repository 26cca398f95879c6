//! Accuracy reporting for a single scan, optionally cross-checked against history.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationMethod;
use crate::measurement::{MeasurementKey, MeasurementResult, MeasurementSet};
use crate::types::safe_div;

const HIGH_CONFIDENCE: f64 = 85.0;
const MEDIUM_CONFIDENCE: f64 = 70.0;
/// Relative deviation from the historical mean that marks a value unreliable.
const HISTORY_HARD_DEVIATION: f64 = 0.15;
const HISTORY_SOFT_DEVIATION: f64 = 0.08;
const MIN_HISTORY: usize = 2;
/// Fraction of the unconfident share of a value taken as its expected error.
const ERROR_SCALE: f64 = 0.2;
const CALIBRATION_GAIN: f64 = 15.0;
const SIDE_VIEW_GAIN: f64 = 12.0;
const MULTI_SCAN_GAIN: f64 = 5.0;
const MAX_SCORE: f64 = 98.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reliability {
    Low,
    Medium,
    High,
}

impl Reliability {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= HIGH_CONFIDENCE {
            Self::High
        } else if confidence >= MEDIUM_CONFIDENCE {
            Self::Medium
        } else {
            Self::Low
        }
    }

    fn downgrade(self) -> Self {
        match self {
            Self::High => Self::Medium,
            Self::Medium | Self::Low => Self::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementAccuracy {
    pub confidence: f64,
    pub reliability: Reliability,
    pub estimated_error_cm: f64,
}

/// Overall score reachable with each improvement, capped at 98.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementPotential {
    pub with_calibration: f64,
    pub with_side_view: f64,
    pub with_multiple_scans: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracyReport {
    pub overall_score: f64,
    pub per_measurement: BTreeMap<MeasurementKey, MeasurementAccuracy>,
    pub recommendations: Vec<String>,
    pub improvement_potential: ImprovementPotential,
}

/// Build an accuracy report for `result`.
///
/// `history` holds earlier scans of the same person, oldest first. When at
/// least two earlier values exist for a key, a current value far from their
/// mean has its reliability downgraded and a recommendation added.
pub fn analyze_accuracy(result: &MeasurementResult, history: &[MeasurementSet]) -> AccuracyReport {
    let mut recommendations = Vec::new();
    let mut per_measurement = BTreeMap::new();

    for (key, value) in result.measurements.iter() {
        let confidence = result.confidence_of(key);
        let mut reliability = Reliability::from_confidence(confidence);

        if let Some(mean) = historical_mean(history, key) {
            let deviation = safe_div((value - mean).abs(), mean);
            if deviation > HISTORY_HARD_DEVIATION {
                reliability = Reliability::Low;
                recommendations.push(format!(
                    "{key} ({value:.1} cm) differs {:.0}% from your average of {mean:.1} cm; rescan to confirm",
                    deviation * 100.0
                ));
            } else if deviation > HISTORY_SOFT_DEVIATION {
                reliability = reliability.downgrade();
                recommendations.push(format!(
                    "{key} is {:.0}% off your average of {mean:.1} cm",
                    deviation * 100.0
                ));
            }
        }

        let estimated_error_cm =
            (value.abs() * (100.0 - confidence).max(0.0) / 100.0 * ERROR_SCALE * 10.0).round() / 10.0;
        per_measurement.insert(
            key,
            MeasurementAccuracy {
                confidence,
                reliability,
                estimated_error_cm,
            },
        );
    }

    let estimated = result.metadata.calibration_method == CalibrationMethod::Estimated;
    let side_view = result.has_side_view();
    let overall = result.overall_accuracy;

    if estimated {
        recommendations
            .push("Hold a credit card in frame or enter your height to calibrate the scale".to_string());
    }
    if !side_view {
        recommendations.push("Add a side-view photo for more accurate circumferences".to_string());
    }
    let low: Vec<&str> = per_measurement
        .iter()
        .filter(|(_, a)| a.reliability == Reliability::Low)
        .map(|(k, _)| k.as_str())
        .collect();
    if !low.is_empty() {
        recommendations.push(format!("Low reliability for {}", low.join(", ")));
    }
    if overall < MEDIUM_CONFIDENCE {
        recommendations.push(
            "Retake in even lighting with fitted clothing and your full body in frame".to_string(),
        );
    }

    let gain = |applies: bool, amount: f64| {
        let bonus = if applies { amount } else { 0.0 };
        (overall + bonus).min(MAX_SCORE)
    };
    let improvement_potential = ImprovementPotential {
        with_calibration: gain(estimated, CALIBRATION_GAIN),
        with_side_view: gain(!side_view, SIDE_VIEW_GAIN),
        with_multiple_scans: gain(true, MULTI_SCAN_GAIN),
    };

    AccuracyReport {
        overall_score: overall,
        per_measurement,
        recommendations,
        improvement_potential,
    }
}

fn historical_mean(history: &[MeasurementSet], key: MeasurementKey) -> Option<f64> {
    let values: Vec<f64> = history
        .iter()
        .filter_map(|h| h.get(key))
        .filter(|v| *v > 0.0)
        .collect();
    if values.len() < MIN_HISTORY {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

//! Per-measurement confidence and overall accuracy scoring.

use crate::landmark::{AngleKind, CaptureAngle};
use crate::measurement::{MeasurementKey, MeasurementSet};
use crate::types::safe_div;

/// Share of landmark visibility that converts into base confidence.
const VISIBILITY_WEIGHT: f64 = 0.7;
const CALIBRATION_BONUS: f64 = 10.0;
const SIDE_VIEW_BONUS: f64 = 15.0;
const ANGLE_BONUS: f64 = 2.5;
const MAX_ANGLE_BONUS: f64 = 5.0;
const MAX_OVERALL: f64 = 98.0;

/// Ceiling and offset for one measurement's confidence. Thin and distal
/// regions are harder to localize than height or shoulder width.
#[derive(Debug, Clone, Copy)]
struct KeyProfile {
    cap: f64,
    offset: f64,
}

fn profile(key: MeasurementKey) -> KeyProfile {
    let (cap, offset) = match key {
        MeasurementKey::Height => (98.0, 5.0),
        MeasurementKey::Shoulders => (95.0, 3.0),
        MeasurementKey::Chest => (92.0, 0.0),
        MeasurementKey::Sleeve => (92.0, -2.0),
        MeasurementKey::Waist => (90.0, -3.0),
        MeasurementKey::Hips => (90.0, -4.0),
        MeasurementKey::Inseam => (90.0, -4.0),
        MeasurementKey::Neck => (88.0, -8.0),
        MeasurementKey::Thigh => (87.0, -10.0),
        MeasurementKey::Calf => (85.0, -12.0),
    };
    KeyProfile { cap, offset }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceScores {
    /// Confidence per measurement, 0 to 100
    pub per_measurement: MeasurementSet,
    /// Overall accuracy, 0 to 98
    pub overall_accuracy: f64,
}

/// Score every key of `measurements`.
pub fn score(
    captures: &[CaptureAngle],
    measurements: &MeasurementSet,
    has_side_view: bool,
    has_calibration: bool,
) -> ConfidenceScores {
    let mean_visibility = safe_div(
        captures.iter().map(CaptureAngle::mean_visibility).sum(),
        captures.len() as f64,
    );
    let base = (mean_visibility * 100.0 * VISIBILITY_WEIGHT).round();
    let calibration_bonus = if has_calibration { CALIBRATION_BONUS } else { 0.0 };

    let mut per_measurement = MeasurementSet::new();
    for key in measurements.keys() {
        let KeyProfile { cap, offset } = profile(key);
        let side_bonus = if has_side_view && key.is_circumference() {
            SIDE_VIEW_BONUS
        } else {
            0.0
        };
        let confidence = (base + calibration_bonus + side_bonus + offset).clamp(0.0, cap);
        per_measurement.insert(key, confidence.round());
    }

    let mut angles: Vec<AngleKind> = captures.iter().map(|c| c.angle).collect();
    angles.sort();
    angles.dedup();
    let extra_angles = angles.len().saturating_sub(1) as f64;
    let angle_bonus = (extra_angles * ANGLE_BONUS).min(MAX_ANGLE_BONUS);

    let overall = weighted_accuracy(&per_measurement) + angle_bonus;
    let overall_accuracy = overall.clamp(0.0, MAX_OVERALL).round();

    tracing::debug!(mean_visibility, base, overall_accuracy, "scored confidence");

    ConfidenceScores {
        per_measurement,
        overall_accuracy,
    }
}

/// 100 minus the root-mean-square shortfall of each confidence from 100.
///
/// Squaring the shortfall makes one poorly localized measurement cost more
/// than it would in a plain mean. An empty set scores 0.
fn weighted_accuracy(confidence: &MeasurementSet) -> f64 {
    if confidence.is_empty() {
        return 0.0;
    }
    let squared_shortfall = safe_div(
        confidence.iter().map(|(_, c)| (100.0 - c).powi(2)).sum(),
        confidence.len() as f64,
    );
    (100.0 - squared_shortfall.sqrt()).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{standing_front, standing_side, uniform_visibility};

    fn all_keys() -> MeasurementSet {
        MeasurementKey::ALL.iter().map(|&k| (k, 50.0)).collect()
    }

    #[test]
    fn test_base_from_visibility() {
        let captures = vec![uniform_visibility(standing_front(), 0.9)];
        let scores = score(&captures, &all_keys(), false, false);
        // round(0.9 * 100 * 0.7) = 63
        assert_eq!(scores.per_measurement.get(MeasurementKey::Chest), Some(63.0));
        assert_eq!(scores.per_measurement.get(MeasurementKey::Height), Some(68.0));
        assert_eq!(scores.per_measurement.get(MeasurementKey::Calf), Some(51.0));
    }

    #[test]
    fn test_bonuses() {
        let front = uniform_visibility(standing_front(), 0.9);
        let side = uniform_visibility(standing_side(), 0.9);
        let scores = score(&[front, side], &all_keys(), true, true);
        // 63 + 10 calibration + 15 side view
        assert_eq!(scores.per_measurement.get(MeasurementKey::Chest), Some(88.0));
        // sleeve is linear, no side-view bonus
        assert_eq!(scores.per_measurement.get(MeasurementKey::Sleeve), Some(71.0));
    }

    #[test]
    fn test_caps_apply() {
        let front = uniform_visibility(standing_front(), 1.0);
        let side = uniform_visibility(standing_side(), 1.0);
        let scores = score(&[front, side], &all_keys(), true, true);
        for key in MeasurementKey::ALL {
            let c = scores.per_measurement.get(key).unwrap();
            assert!(c <= profile(key).cap);
        }
        // 70 + 10 + 15 clamps at the chest ceiling
        assert_eq!(scores.per_measurement.get(MeasurementKey::Chest), Some(92.0));
        assert!(scores.overall_accuracy <= 98.0);
    }

    #[test]
    fn test_overall_within_bounds() {
        for vis in [0.0, 0.3, 0.7, 1.0] {
            let captures = vec![uniform_visibility(standing_front(), vis)];
            let scores = score(&captures, &all_keys(), false, false);
            assert!((0.0..=100.0).contains(&scores.overall_accuracy));
        }
        // only the height and shoulder offsets survive without any capture
        let empty = score(&[], &all_keys(), false, false);
        assert_eq!(empty.per_measurement.get(MeasurementKey::Chest), Some(0.0));
        assert!(empty.overall_accuracy <= 5.0);
    }

    #[test]
    fn test_extra_angles_raise_overall() {
        let front = uniform_visibility(standing_front(), 0.8);
        let mut back = front.clone();
        back.angle = AngleKind::Back;
        let single = score(&[front.clone()], &all_keys(), false, false);
        let double = score(&[front, back], &all_keys(), false, false);
        assert!((double.overall_accuracy - single.overall_accuracy - 2.5).abs() <= 1.0);
    }

    #[test]
    fn test_weighted_accuracy_of_uniform_scores() {
        let even: MeasurementSet = [(MeasurementKey::Height, 80.0), (MeasurementKey::Chest, 80.0)]
            .into_iter()
            .collect();
        assert!((weighted_accuracy(&even) - 80.0).abs() < 1e-12);
        assert_eq!(weighted_accuracy(&MeasurementSet::new()), 0.0);
    }

    #[test]
    fn test_low_outlier_pulls_below_plain_mean() {
        let scores: MeasurementSet = [
            (MeasurementKey::Height, 90.0),
            (MeasurementKey::Chest, 90.0),
            (MeasurementKey::Waist, 90.0),
            (MeasurementKey::Calf, 30.0),
        ]
        .into_iter()
        .collect();
        let plain_mean = 75.0;
        // shortfalls 10, 10, 10, 70: sqrt((3 * 100 + 4900) / 4) = 36.06
        let overall = weighted_accuracy(&scores);
        assert!((overall - (100.0 - 1300.0_f64.sqrt())).abs() < 1e-9);
        assert!(overall < plain_mean);
    }
}

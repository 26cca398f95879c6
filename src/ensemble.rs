//! Cross-scan aggregation: outlier-robust ensemble averaging and
//! historical outlier detection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::measurement::{MeasurementKey, MeasurementResult, MeasurementSet};
use crate::types::{round_cm, safe_div};

/// Default z-score above which a new value is flagged against history.
pub const DEFAULT_Z_THRESHOLD: f64 = 2.5;
/// Fewest historical values needed before a key can be judged.
const MIN_HISTORY: usize = 3;
/// Fewest samples for which quartiles are meaningful.
const MIN_IQR_SAMPLES: usize = 4;
const IQR_FENCE: f64 = 1.5;
const MAX_ENSEMBLE_BONUS: f64 = 15.0;
const ENSEMBLE_BONUS_SCALE: f64 = 5.0;
/// Floor on the historical standard deviation, in centimeters. Tape
/// measurements are not repeatable below this.
const MIN_STD_DEV_CM: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsembleResult {
    pub measurements: MeasurementSet,
    pub confidence: MeasurementSet,
    pub scans_used: usize,
    pub outliers_removed: usize,
}

/// Combine repeated scans into one estimate.
///
/// Per key: values outside the Tukey fences (`Q1 - 1.5 IQR`, `Q3 + 1.5 IQR`)
/// are dropped when at least four samples exist, the rest are averaged with
/// their confidences as weights. The confidence gains `min(15, 5 * sqrt(n))`
/// for the `n` retained samples.
pub fn ensemble_average(results: &[MeasurementResult]) -> Result<EnsembleResult> {
    match results {
        [] => Err(Error::EmptyInput),
        [single] => Ok(EnsembleResult {
            measurements: single.measurements.clone(),
            confidence: single.confidence.clone(),
            scans_used: 1,
            outliers_removed: 0,
        }),
        _ => Ok(combine(results)),
    }
}

fn combine(results: &[MeasurementResult]) -> EnsembleResult {
    let mut samples: BTreeMap<MeasurementKey, Vec<(f64, f64)>> = BTreeMap::new();
    for result in results {
        for (key, value) in result.measurements.iter() {
            samples
                .entry(key)
                .or_default()
                .push((value, result.confidence_of(key)));
        }
    }

    let mut measurements = MeasurementSet::new();
    let mut confidence = MeasurementSet::new();
    let mut outliers_removed = 0;

    for (key, all) in samples {
        let kept = reject_outliers(&all);
        outliers_removed += all.len() - kept.len();

        let value = weighted_value(&kept);

        let n = kept.len() as f64;
        let bonus = (n.sqrt() * ENSEMBLE_BONUS_SCALE).min(MAX_ENSEMBLE_BONUS);
        let conf = (mean(kept.iter().map(|(_, c)| *c)) + bonus).clamp(0.0, 100.0);

        tracing::debug!(key = %key, samples = all.len(), kept = kept.len(), value, "ensemble");
        measurements.insert(key, value);
        confidence.insert(key, conf.round());
    }

    EnsembleResult {
        measurements,
        confidence,
        scans_used: results.len(),
        outliers_removed,
    }
}

/// Confidence-weighted mean of `(value, confidence)` samples, rounded to
/// 0.1 cm. Agreeing samples return their common value untouched.
fn weighted_value(kept: &[(f64, f64)]) -> f64 {
    match kept.first() {
        None => 0.0,
        Some(&(first, _)) if kept.iter().all(|&(v, _)| v == first) => first,
        Some(_) => {
            let weight_sum: f64 = kept.iter().map(|(_, c)| c).sum();
            let value = if weight_sum > 0.0 {
                kept.iter().map(|(v, c)| v * c).sum::<f64>() / weight_sum
            } else {
                mean(kept.iter().map(|(v, _)| *v))
            };
            round_cm(value)
        }
    }
}

/// Drop `(value, confidence)` samples outside the IQR fences.
fn reject_outliers(samples: &[(f64, f64)]) -> Vec<(f64, f64)> {
    if samples.len() < MIN_IQR_SAMPLES {
        return samples.to_vec();
    }
    let mut values: Vec<f64> = samples.iter().map(|(v, _)| *v).collect();
    values.sort_by(|a, b| a.total_cmp(b));
    let q1 = quantile(&values, 0.25);
    let q3 = quantile(&values, 0.75);
    let iqr = q3 - q1;
    let (low, high) = (q1 - IQR_FENCE * iqr, q3 + IQR_FENCE * iqr);
    samples
        .iter()
        .copied()
        .filter(|(v, _)| *v >= low && *v <= high)
        .collect()
}

/// Linearly interpolated quantile of sorted data.
pub(crate) fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    safe_div(sum, n as f64)
}

/// Outcome of checking one key against history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlierFlag {
    pub is_outlier: bool,
    pub z_score: f64,
    /// Historical mean
    pub expected: f64,
}

impl OutlierFlag {
    fn clear() -> Self {
        Self {
            is_outlier: false,
            z_score: 0.0,
            expected: 0.0,
        }
    }
}

pub type OutlierFlags = BTreeMap<MeasurementKey, OutlierFlag>;

/// Flag keys of `new_measurement` that are implausible given `history`.
///
/// A key needs at least three historical values; with fewer it is reported as
/// not an outlier. Uses the sample standard deviation, floored at 0.5 cm.
pub fn detect_outlier(
    new_measurement: &MeasurementSet,
    history: &[MeasurementSet],
    z_threshold: f64,
) -> OutlierFlags {
    let mut flags = OutlierFlags::new();
    for (key, value) in new_measurement.iter() {
        let past: Vec<f64> = history.iter().filter_map(|h| h.get(key)).collect();
        if past.len() < MIN_HISTORY {
            flags.insert(key, OutlierFlag::clear());
            continue;
        }

        let n = past.len() as f64;
        let expected = past.iter().sum::<f64>() / n;
        let variance = past.iter().map(|v| (v - expected).powi(2)).sum::<f64>() / (n - 1.0);
        let std_dev = variance.sqrt().max(MIN_STD_DEV_CM);
        let z_score = (value - expected).abs() / std_dev;
        let is_outlier = z_score > z_threshold;
        if is_outlier {
            tracing::warn!(key = %key, value, expected, z_score, "measurement inconsistent with history");
        }
        flags.insert(
            key,
            OutlierFlag {
                is_outlier,
                z_score,
                expected,
            },
        );
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CalibrationMethod;
    use crate::landmark::AngleKind;
    use crate::measurement::ResultMetadata;

    fn scan(chest: f64, waist: f64, confidence: f64) -> MeasurementResult {
        MeasurementResult {
            measurements: [(MeasurementKey::Chest, chest), (MeasurementKey::Waist, waist)]
                .into_iter()
                .collect(),
            confidence: [(MeasurementKey::Chest, confidence), (MeasurementKey::Waist, confidence)]
                .into_iter()
                .collect(),
            overall_accuracy: confidence,
            warnings: Vec::new(),
            metadata: ResultMetadata {
                angles_used: vec![AngleKind::Front],
                calibration_method: CalibrationMethod::KnownHeight,
                engine_version: "test".to_string(),
            },
        }
    }

    #[test]
    fn test_empty_input_fails() {
        assert!(matches!(ensemble_average(&[]), Err(Error::EmptyInput)));
    }

    #[test]
    fn test_single_result_passes_through() {
        let r = scan(95.0, 80.0, 70.0);
        let e = ensemble_average(std::slice::from_ref(&r)).unwrap();
        assert_eq!(e.measurements, r.measurements);
        assert_eq!(e.confidence, r.confidence);
        assert_eq!(e.scans_used, 1);
        assert_eq!(e.outliers_removed, 0);
    }

    #[test]
    fn test_identical_results_unchanged() {
        let results = vec![scan(95.0, 80.0, 70.0); 5];
        let e = ensemble_average(&results).unwrap();
        assert_eq!(e.measurements.get(MeasurementKey::Chest), Some(95.0));
        assert_eq!(e.measurements.get(MeasurementKey::Waist), Some(80.0));
        assert_eq!(e.scans_used, 5);
        assert_eq!(e.outliers_removed, 0);
        // 70 + min(15, 5 * sqrt(5)) = 81.18
        assert_eq!(e.confidence.get(MeasurementKey::Chest), Some(81.0));
    }

    #[test]
    fn test_identical_results_keep_exact_value() {
        for value in [95.3, 81.7, 102.9, 37.1, 64.45] {
            for confidence in [63.0, 70.0, 77.0, 83.0] {
                for n in 2..10 {
                    let results = vec![scan(value, value, confidence); n];
                    let e = ensemble_average(&results).unwrap();
                    assert_eq!(e.measurements.get(MeasurementKey::Chest), Some(value));
                }
            }
        }
    }

    #[test]
    fn test_weighted_mean_rounded_to_millimeter() {
        let results = vec![scan(95.3, 80.0, 63.0), scan(95.4, 80.0, 71.0), scan(95.3, 80.0, 83.0)];
        let e = ensemble_average(&results).unwrap();
        // 95.3 + 0.1 * 71 / 217 = 95.3327
        assert_eq!(e.measurements.get(MeasurementKey::Chest), Some(95.3));
    }

    #[test]
    fn test_extreme_outlier_removed() {
        let results = vec![
            scan(95.0, 80.0, 70.0),
            scan(95.5, 80.5, 70.0),
            scan(96.0, 79.5, 70.0),
            scan(140.0, 80.0, 70.0),
        ];
        let e = ensemble_average(&results).unwrap();
        let chest = e.measurements.get(MeasurementKey::Chest).unwrap();
        assert!((chest - 95.5).abs() < 1e-9);
        assert_eq!(e.outliers_removed, 1);
    }

    #[test]
    fn test_confidence_weighting() {
        let results = vec![scan(90.0, 80.0, 30.0), scan(100.0, 80.0, 90.0)];
        let e = ensemble_average(&results).unwrap();
        // (90 * 30 + 100 * 90) / 120 = 97.5
        assert!((e.measurements.get(MeasurementKey::Chest).unwrap() - 97.5).abs() < 1e-9);
        // mean 60 + 5 * sqrt(2)
        assert_eq!(e.confidence.get(MeasurementKey::Chest), Some(67.0));
    }

    #[test]
    fn test_zero_confidence_falls_back_to_plain_mean() {
        let results = vec![scan(90.0, 80.0, 0.0), scan(100.0, 80.0, 0.0)];
        let e = ensemble_average(&results).unwrap();
        assert!((e.measurements.get(MeasurementKey::Chest).unwrap() - 95.0).abs() < 1e-9);
    }

    #[test]
    fn test_quantile_interpolates() {
        let data = [1.0, 2.0, 3.0, 4.0];
        assert!((quantile(&data, 0.25) - 1.75).abs() < 1e-12);
        assert!((quantile(&data, 0.75) - 3.25).abs() < 1e-12);
        assert_eq!(quantile(&[], 0.5), 0.0);
        assert_eq!(quantile(&[7.0], 0.9), 7.0);
    }

    fn chest(v: f64) -> MeasurementSet {
        [(MeasurementKey::Chest, v)].into_iter().collect()
    }

    #[test]
    fn test_detect_outlier_flags_large_jump() {
        let history = vec![chest(94.0), chest(95.0), chest(96.0)];

        let flags = detect_outlier(&chest(140.0), &history, DEFAULT_Z_THRESHOLD);
        let flag = &flags[&MeasurementKey::Chest];
        assert!(flag.is_outlier);
        assert!(flag.z_score > 2.5);
        assert!((flag.expected - 95.0).abs() < 1e-9);

        let flags = detect_outlier(&chest(95.5), &history, DEFAULT_Z_THRESHOLD);
        assert!(!flags[&MeasurementKey::Chest].is_outlier);
    }

    #[test]
    fn test_detect_outlier_needs_three_entries() {
        let history = vec![chest(94.0), chest(95.0)];
        let flags = detect_outlier(&chest(200.0), &history, DEFAULT_Z_THRESHOLD);
        assert!(!flags[&MeasurementKey::Chest].is_outlier);
    }

    #[test]
    fn test_detect_outlier_constant_history() {
        let history = vec![chest(95.0); 4];
        let flags = detect_outlier(&chest(95.4), &history, DEFAULT_Z_THRESHOLD);
        assert!(!flags[&MeasurementKey::Chest].is_outlier);
        let flags = detect_outlier(&chest(97.0), &history, DEFAULT_Z_THRESHOLD);
        assert!(flags[&MeasurementKey::Chest].is_outlier);
        assert!(flags[&MeasurementKey::Chest].z_score.is_finite());
    }
}

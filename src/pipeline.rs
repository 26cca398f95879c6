//! The per-scan pipeline: calibration, geometry, circumferences,
//! anthropometric correction and confidence scoring.

use serde::{Deserialize, Serialize};

use crate::anthropometry::{self, Gender};
use crate::calibration::{self, ReferenceObject};
use crate::circumference;
use crate::config::MeasurementConfig;
use crate::confidence;
use crate::error::{Error, Result};
use crate::geometry;
use crate::landmark::{front_capture, AngleKind, CaptureAngle};
use crate::measurement::{MeasurementKey, MeasurementResult, MeasurementSet, ResultMetadata};
use crate::types;

/// Version reported in every result's metadata.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Everything needed to measure one scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanInput {
    /// One to three captures; exactly one must face the camera.
    pub captures: Vec<CaptureAngle>,
    #[serde(default)]
    pub reference_object: Option<ReferenceObject>,
    #[serde(default)]
    pub known_height_cm: Option<f64>,
    #[serde(default)]
    pub gender: Gender,
}

impl ScanInput {
    pub fn new(captures: Vec<CaptureAngle>, gender: Gender) -> Self {
        Self {
            captures,
            reference_object: None,
            known_height_cm: None,
            gender,
        }
    }

    pub fn with_reference_object(mut self, reference: ReferenceObject) -> Self {
        self.reference_object = Some(reference);
        self
    }

    pub fn with_known_height(mut self, height_cm: f64) -> Self {
        self.known_height_cm = Some(height_cm);
        self
    }

    fn capture(&self, angle: AngleKind) -> Option<&CaptureAngle> {
        self.captures.iter().find(|c| c.angle == angle)
    }
}

/// Measure a scan with the default constants.
pub fn compute_measurements(input: &ScanInput) -> Result<MeasurementResult> {
    compute_measurements_with(input, &MeasurementConfig::default())
}

/// Measure a scan.
///
/// Fails with [`Error::MissingRequiredAngle`] when no front capture is
/// supplied and with [`Error::DuplicateAngle`] when an angle repeats. Every
/// other problem is reported as a soft warning.
pub fn compute_measurements_with(input: &ScanInput, config: &MeasurementConfig) -> Result<MeasurementResult> {
    let front = front_capture(&input.captures)?;
    let side = input.capture(AngleKind::Side);

    let (calibration, mut warnings) = calibration::resolve(
        &input.captures,
        input.reference_object.as_ref(),
        input.known_height_cm,
        &config.calibration,
    )?;

    let raw = geometry::extract(
        front,
        side,
        calibration.scale_cm_per_pixel(),
        &config.calibration,
        &config.geometry,
    );
    let height = raw.height();

    let (circumferences, circ_warnings) =
        circumference::estimate(&raw.front_widths, raw.side_depths.as_ref(), height, input.gender);
    warnings.extend(circ_warnings);

    let mut combined = raw.linear.clone();
    for (key, value) in circumferences.iter() {
        combined.insert(key, value);
    }

    let (measurements, correction_warnings) =
        anthropometry::correct(&combined, height, input.gender, &config.correction);
    warnings.extend(correction_warnings);
    let measurements = round_cm(&measurements);

    let scores = confidence::score(
        &input.captures,
        &measurements,
        side.is_some(),
        calibration.method.is_calibrated(),
    );

    let mut angles_used: Vec<AngleKind> = input.captures.iter().map(|c| c.angle).collect();
    angles_used.sort();
    angles_used.dedup();

    tracing::info!(
        height,
        method = %calibration.method,
        angles = angles_used.len(),
        overall_accuracy = scores.overall_accuracy,
        warnings = warnings.len(),
        "computed measurements"
    );

    Ok(MeasurementResult {
        measurements,
        confidence: scores.per_measurement,
        overall_accuracy: scores.overall_accuracy,
        warnings,
        metadata: ResultMetadata {
            angles_used,
            calibration_method: calibration.method,
            engine_version: ENGINE_VERSION.to_string(),
        },
    })
}

/// Round to millimeters.
fn round_cm(set: &MeasurementSet) -> MeasurementSet {
    set.iter()
        .map(|(k, v): (MeasurementKey, f64)| (k, types::round_cm(v)))
        .collect()
}

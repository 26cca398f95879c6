//! # tailor-measure
//!
//! Real-world body measurements from 2D pose landmarks.
//!
//! This crate provides:
//! - **Calibration**: pixel-to-centimeter scale from a reference object, a known
//!   height, or a population-average fallback
//! - **Measurements**: height, shoulder width, sleeve and inseam lengths, and
//!   chest/waist/hip/neck/thigh/calf circumferences
//! - **Plausibility**: anthropometric correction against population ratios and
//!   per-measurement confidence scores
//! - **Multi-scan analysis**: accuracy reports, IQR-filtered ensemble averages
//!   and outlier detection against a person's history
//!
//! Landmarks come from an external pose detector (33-point BlazePose
//! topology, normalized coordinates). Everything here is a pure function of
//! its inputs.
//!
//! ## Pipeline
//!
//! 1. Resolve the scale factor from the front capture
//! 2. Measure joint distances and body widths (and depths, given a side capture)
//! 3. Model each cross-section as an ellipse and take its perimeter
//!    (population ratios when there is no side view)
//! 4. Shrink statistical outliers toward the expected ratio to height
//! 5. Score confidence from landmark visibility, calibration and views
//!
//! ## Quick Start
//!
//! ```rust
//! use tailor_measure::{
//!     compute_measurements, AngleKind, CaptureAngle, Gender, Landmark, LandmarkName,
//!     MeasurementKey, ScanInput,
//! };
//!
//! // Landmarks as returned by the pose detector
//! let landmarks: Vec<Landmark> = LandmarkName::ALL
//!     .iter()
//!     .map(|&name| Landmark::new(name, 0.5, 0.5, 0.9))
//!     .collect();
//! let front = CaptureAngle::new(AngleKind::Front, landmarks, 1080, 1920);
//!
//! let input = ScanInput::new(vec![front], Gender::Other).with_known_height(172.0);
//! let result = compute_measurements(&input).unwrap();
//! println!("chest: {:?} cm", result.value_of(MeasurementKey::Chest));
//! ```
//!
//! ## Repeated scans
//!
//! ```rust
//! use tailor_measure::{detect_outlier, MeasurementKey, MeasurementSet, DEFAULT_Z_THRESHOLD};
//!
//! let history: Vec<MeasurementSet> = [94.0, 95.0, 96.0]
//!     .iter()
//!     .map(|&v| [(MeasurementKey::Chest, v)].into_iter().collect())
//!     .collect();
//! let new: MeasurementSet = [(MeasurementKey::Chest, 140.0)].into_iter().collect();
//! let flags = detect_outlier(&new, &history, DEFAULT_Z_THRESHOLD);
//! assert!(flags[&MeasurementKey::Chest].is_outlier);
//! ```

mod accuracy;
mod anthropometry;
mod calibration;
mod circumference;
mod config;
mod confidence;
mod ensemble;
mod error;
mod geometry;
mod landmark;
mod measurement;
mod pipeline;
mod types;

#[cfg(test)]
mod test_utils;

pub use accuracy::{analyze_accuracy, AccuracyReport, ImprovementPotential, MeasurementAccuracy, Reliability};
pub use anthropometry::{correct, z_score, Gender, RatioEntry, RatioTable, RATIO_TABLE_VERSION};
pub use calibration::{
    resolve as resolve_calibration, CalibrationMethod, CalibrationReference, ReferenceObject,
    A4_PAPER_CM, CREDIT_CARD_CM,
};
pub use circumference::{cross_section_circumference, ellipse_circumference, estimate as estimate_circumferences};
pub use config::{CalibrationConfig, CorrectionConfig, GeometryConfig, MeasurementConfig};
pub use confidence::{score as score_confidence, ConfidenceScores};
pub use ensemble::{
    detect_outlier, ensemble_average, EnsembleResult, OutlierFlag, OutlierFlags, DEFAULT_Z_THRESHOLD,
};
pub use error::{Error, Result};
pub use geometry::{body_pixel_height, extract as extract_geometry, foot_bottom, head_top, RawMeasurementSet};
pub use landmark::{AngleKind, CaptureAngle, Landmark, LandmarkName};
pub use measurement::{MeasurementKey, MeasurementResult, MeasurementSet, ResultMetadata, Warning};
pub use pipeline::{compute_measurements, compute_measurements_with, ScanInput, ENGINE_VERSION};
pub use types::Point;

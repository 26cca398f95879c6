//! Tunable constants of the measurement pipeline.
//!
//! The defaults are empirically chosen values. They can be overridden from a
//! TOML file so that they can be refit against tape-measured ground truth:
//!
//! ```toml
//! [geometry]
//! waist_width = 1.12
//!
//! [correction]
//! heavy_measured_weight = 0.5
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementConfig {
    pub calibration: CalibrationConfig,
    pub geometry: GeometryConfig,
    pub correction: CorrectionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Height assumed when neither a reference object nor a known height is given
    pub fallback_height_cm: f64,
    /// Confidence of an estimated calibration
    pub estimated_confidence: f64,
    /// Confidence of a known-height calibration (head top is inferred)
    pub known_height_confidence: f64,
    /// Confidence of a reference object whose two axes agree
    pub reference_confidence: f64,
    /// Relative width/height scale disagreement tolerated before confidence drops
    pub reference_tolerance: f64,
    /// Confidence lost per unit of relative disagreement beyond the tolerance
    pub reference_penalty_slope: f64,
    /// Lower bound on reference-object confidence
    pub reference_min_confidence: f64,
    /// Head top sits this fraction of the nose-to-shoulder drop above the nose
    pub head_top_factor: f64,
    /// Minimum visibility for a foot landmark to count as detected
    pub min_visibility: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            fallback_height_cm: 170.0,
            estimated_confidence: 0.5,
            known_height_confidence: 0.85,
            reference_confidence: 0.95,
            reference_tolerance: 0.05,
            reference_penalty_slope: 2.0,
            reference_min_confidence: 0.5,
            head_top_factor: 0.6,
            min_visibility: 0.3,
        }
    }
}

/// Multipliers turning joint-to-joint distances into body-edge widths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Shoulder joints sit inside the visible outer edge
    pub shoulder_edge: f64,
    /// Crotch sits below the hip midpoint by this fraction of image height
    pub crotch_offset: f64,
    pub chest_width: f64,
    pub waist_width: f64,
    pub hips_width: f64,
    pub neck_width: f64,
    pub thigh_width: f64,
    pub calf_width: f64,
    /// Hip depth relative to waist depth in the side view
    pub hip_depth: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            shoulder_edge: 1.05,
            crotch_offset: 0.02,
            chest_width: 0.95,
            waist_width: 1.10,
            hips_width: 1.15,
            neck_width: 0.22,
            thigh_width: 0.45,
            calf_width: 0.45,
            hip_depth: 1.15,
        }
    }
}

/// Shrinkage of outlying measurements toward the population expectation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionConfig {
    /// z-score above which a light correction applies
    pub light_threshold: f64,
    /// z-score above which a heavy correction applies and a warning is emitted
    pub heavy_threshold: f64,
    /// Weight kept on the measured value under light correction
    pub light_measured_weight: f64,
    /// Weight kept on the measured value under heavy correction
    pub heavy_measured_weight: f64,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            light_threshold: 2.0,
            heavy_threshold: 3.0,
            light_measured_weight: 0.8,
            heavy_measured_weight: 0.4,
        }
    }
}

impl MeasurementConfig {
    /// Load and validate a TOML config. Missing fields keep their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: MeasurementConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let c = &self.calibration;
        let g = &self.geometry;
        let k = &self.correction;

        let positive = [
            ("calibration.fallback_height_cm", c.fallback_height_cm),
            ("calibration.head_top_factor", c.head_top_factor),
            ("geometry.shoulder_edge", g.shoulder_edge),
            ("geometry.chest_width", g.chest_width),
            ("geometry.waist_width", g.waist_width),
            ("geometry.hips_width", g.hips_width),
            ("geometry.neck_width", g.neck_width),
            ("geometry.thigh_width", g.thigh_width),
            ("geometry.calf_width", g.calf_width),
            ("geometry.hip_depth", g.hip_depth),
            ("correction.light_threshold", k.light_threshold),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::InvalidConfig(format!("{name} must be positive, got {value}")));
            }
        }

        let non_negative = [
            ("calibration.reference_tolerance", c.reference_tolerance),
            ("calibration.reference_penalty_slope", c.reference_penalty_slope),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::InvalidConfig(format!("{name} must be non-negative, got {value}")));
            }
        }

        let unit = [
            ("calibration.estimated_confidence", c.estimated_confidence),
            ("calibration.known_height_confidence", c.known_height_confidence),
            ("calibration.reference_confidence", c.reference_confidence),
            ("calibration.reference_min_confidence", c.reference_min_confidence),
            ("calibration.min_visibility", c.min_visibility),
            ("geometry.crotch_offset", g.crotch_offset),
            ("correction.light_measured_weight", k.light_measured_weight),
            ("correction.heavy_measured_weight", k.heavy_measured_weight),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfig(format!("{name} must lie in [0, 1], got {value}")));
            }
        }

        if c.reference_min_confidence > c.reference_confidence {
            return Err(Error::InvalidConfig(format!(
                "calibration.reference_min_confidence ({}) must not exceed calibration.reference_confidence ({})",
                c.reference_min_confidence, c.reference_confidence
            )));
        }

        if k.light_threshold >= k.heavy_threshold {
            return Err(Error::InvalidConfig(format!(
                "correction.light_threshold ({}) must be below correction.heavy_threshold ({})",
                k.light_threshold, k.heavy_threshold
            )));
        }
        Ok(())
    }
}

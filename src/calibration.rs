//! Pixel-to-centimeter scale resolution.
//!
//! Three sources are tried in priority order:
//! 1. a reference object of known size detected in the front photo,
//! 2. a height entered by the user,
//! 3. an assumed population-average height.

use serde::{Deserialize, Serialize};

use crate::config::CalibrationConfig;
use crate::error::{Error, Result};
use crate::geometry::body_pixel_height;
use crate::landmark::{front_capture, CaptureAngle};
use crate::measurement::Warning;
use crate::types::safe_div;

/// ISO/IEC 7810 ID-1 card (credit card, ID card) in centimeters.
pub const CREDIT_CARD_CM: (f64, f64) = (8.56, 5.398);

/// ISO 216 A4 sheet in centimeters.
pub const A4_PAPER_CM: (f64, f64) = (21.0, 29.7);

/// How the scale factor was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationMethod {
    ReferenceObject,
    KnownHeight,
    Estimated,
}

impl CalibrationMethod {
    /// True when the scale came from a physical measurement rather than an assumption.
    pub fn is_calibrated(self) -> bool {
        !matches!(self, Self::Estimated)
    }
}

impl std::fmt::Display for CalibrationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReferenceObject => f.write_str("reference object"),
            Self::KnownHeight => f.write_str("known height"),
            Self::Estimated => f.write_str("estimated"),
        }
    }
}

/// An object of known physical size detected in the image.
///
/// The height axis is optional; when present it is used to cross-check the
/// width-derived scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceObject {
    pub real_width_cm: f64,
    pub pixel_width: f64,
    #[serde(default)]
    pub real_height_cm: Option<f64>,
    #[serde(default)]
    pub pixel_height: Option<f64>,
}

impl ReferenceObject {
    pub fn new(real_width_cm: f64, pixel_width: f64) -> Self {
        Self {
            real_width_cm,
            pixel_width,
            real_height_cm: None,
            pixel_height: None,
        }
    }

    pub fn with_height(mut self, real_height_cm: f64, pixel_height: f64) -> Self {
        self.real_height_cm = Some(real_height_cm);
        self.pixel_height = Some(pixel_height);
        self
    }

    pub fn credit_card(pixel_width: f64, pixel_height: f64) -> Self {
        Self::new(CREDIT_CARD_CM.0, pixel_width).with_height(CREDIT_CARD_CM.1, pixel_height)
    }

    pub fn a4_paper(pixel_width: f64, pixel_height: f64) -> Self {
        Self::new(A4_PAPER_CM.0, pixel_width).with_height(A4_PAPER_CM.1, pixel_height)
    }

    fn width_axis(&self) -> Option<(f64, f64)> {
        valid_axis(self.real_width_cm, self.pixel_width)
    }

    fn height_axis(&self) -> Option<(f64, f64)> {
        valid_axis(self.real_height_cm?, self.pixel_height?)
    }

    fn is_detected(&self) -> bool {
        self.width_axis().is_some()
    }
}

fn valid_axis(real: f64, pixels: f64) -> Option<(f64, f64)> {
    (real.is_finite() && pixels.is_finite() && real > 0.0 && pixels > 0.0).then_some((real, pixels))
}

/// A resolved calibration. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationReference {
    pub method: CalibrationMethod,
    /// Extent of the calibration target in pixels
    pub pixel_extent: f64,
    /// Physical extent of the same target in centimeters
    pub real_extent_cm: f64,
    /// Reliability of the scale, 0 to 1
    pub confidence: f64,
}

impl CalibrationReference {
    /// Scale from a reference object. Returns `None` if the object has no usable width.
    ///
    /// Both axes' extents are pooled into the scale; their disagreement lowers
    /// the confidence.
    pub fn from_reference_object(object: &ReferenceObject, config: &CalibrationConfig) -> Option<Self> {
        let (real_w, px_w) = object.width_axis()?;
        let (pixel_extent, real_extent_cm, confidence) = match object.height_axis() {
            Some((real_h, px_h)) => {
                let scale_w = real_w / px_w;
                let scale_h = real_h / px_h;
                let disagreement = (scale_w - scale_h).abs() / ((scale_w + scale_h) / 2.0);
                let confidence = if disagreement <= config.reference_tolerance {
                    config.reference_confidence
                } else {
                    (config.reference_confidence
                        - (disagreement - config.reference_tolerance) * config.reference_penalty_slope)
                        .min(config.reference_confidence)
                        .max(config.reference_min_confidence)
                };
                (px_w + px_h, real_w + real_h, confidence)
            }
            None => (px_w, real_w, config.reference_confidence),
        };
        Some(Self {
            method: CalibrationMethod::ReferenceObject,
            pixel_extent,
            real_extent_cm,
            confidence,
        })
    }

    pub fn from_known_height(height_cm: f64, pixel_height: f64, config: &CalibrationConfig) -> Self {
        Self {
            method: CalibrationMethod::KnownHeight,
            pixel_extent: pixel_height,
            real_extent_cm: height_cm,
            confidence: config.known_height_confidence,
        }
    }

    pub fn estimated(pixel_height: f64, config: &CalibrationConfig) -> Self {
        Self {
            method: CalibrationMethod::Estimated,
            pixel_extent: pixel_height,
            real_extent_cm: config.fallback_height_cm,
            confidence: config.estimated_confidence,
        }
    }

    /// Centimeters per pixel, or 0 for a degenerate pixel extent.
    pub fn scale_cm_per_pixel(&self) -> f64 {
        safe_div(self.real_extent_cm, self.pixel_extent)
    }

    /// Pixels per centimeter, or 0 for a degenerate calibration.
    pub fn pixels_per_cm(&self) -> f64 {
        safe_div(self.pixel_extent, self.real_extent_cm)
    }
}

/// Determine the scale factor for a scan.
///
/// Fails with [`Error::MissingRequiredAngle`] when no front capture is present
/// and with [`Error::DuplicateAngle`] when an angle is supplied twice.
pub fn resolve(
    captures: &[CaptureAngle],
    reference: Option<&ReferenceObject>,
    known_height_cm: Option<f64>,
    config: &CalibrationConfig,
) -> Result<(CalibrationReference, Vec<Warning>)> {
    let front = front_capture(captures)?;

    let mut warnings = Vec::new();

    if let Some(calibration) = reference
        .filter(|r| r.is_detected())
        .and_then(|r| CalibrationReference::from_reference_object(r, config))
    {
        tracing::debug!(
            pixels_per_cm = calibration.pixels_per_cm(),
            confidence = calibration.confidence,
            "calibrated from reference object"
        );
        return Ok((calibration, warnings));
    }

    let pixel_height = body_pixel_height(front, config);
    if pixel_height <= 0.0 {
        tracing::warn!("front capture has zero body extent");
        warnings.push(Warning::DegenerateGeometry);
    }

    let calibration = match known_height_cm.filter(|h| h.is_finite() && *h > 0.0) {
        Some(height_cm) => CalibrationReference::from_known_height(height_cm, pixel_height, config),
        None => {
            tracing::warn!(
                assumed_height_cm = config.fallback_height_cm,
                "no calibration input, assuming average height"
            );
            warnings.push(Warning::EstimatedCalibration {
                assumed_height_cm: config.fallback_height_cm,
            });
            CalibrationReference::estimated(pixel_height, config)
        }
    };

    tracing::debug!(
        method = %calibration.method,
        pixel_height,
        scale = calibration.scale_cm_per_pixel(),
        "resolved calibration"
    );
    Ok((calibration, warnings))
}

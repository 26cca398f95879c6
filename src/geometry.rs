//! Raw linear measurements and cross-section widths from 2D landmarks.
//!
//! Distances are measured in pixels on the un-normalized image and then
//! converted with the calibration scale. Joint landmarks sit inside the
//! visible body outline, so widths are derived from joint spans through the
//! empirical multipliers in [`GeometryConfig`].

use crate::config::{CalibrationConfig, GeometryConfig};
use crate::landmark::{CaptureAngle, LandmarkName};
use crate::measurement::{MeasurementKey, MeasurementSet};
use crate::types::Point;

/// Linear measurements plus the intermediate front widths and side depths
/// consumed by circumference estimation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMeasurementSet {
    /// Height, shoulders, sleeve and inseam in centimeters
    pub linear: MeasurementSet,
    /// Front-view widths of circumference regions in centimeters
    pub front_widths: MeasurementSet,
    /// Side-view depths of circumference regions, when a side capture exists
    pub side_depths: Option<MeasurementSet>,
}

impl RawMeasurementSet {
    pub fn height(&self) -> f64 {
        self.linear.height()
    }
}

/// Estimated top of the head.
///
/// Heads are not detected directly; the crown is placed above the nose by a
/// fraction of the nose-to-shoulder vertical drop.
pub fn head_top(capture: &CaptureAngle, config: &CalibrationConfig) -> Point {
    let nose = capture.pixel(LandmarkName::Nose);
    let shoulders = capture
        .pixel(LandmarkName::LeftShoulder)
        .midpoint(&capture.pixel(LandmarkName::RightShoulder));
    let drop = (shoulders.y - nose.y).max(0.0);
    Point::new(nose.x, nose.y - drop * config.head_top_factor)
}

/// Lowest foot point: max y over heels, toes and ankles, with x their mean.
/// Uses the ankles alone when no heel or toe is visible.
pub fn foot_bottom(capture: &CaptureAngle, config: &CalibrationConfig) -> Point {
    const FOOT: [LandmarkName; 4] = [
        LandmarkName::LeftHeel,
        LandmarkName::RightHeel,
        LandmarkName::LeftFootIndex,
        LandmarkName::RightFootIndex,
    ];
    const ANKLES: [LandmarkName; 2] = [LandmarkName::LeftAnkle, LandmarkName::RightAnkle];

    let visible = |names: &[LandmarkName]| -> Vec<Point> {
        names
            .iter()
            .filter(|&&n| capture.landmark(n).is_visible(config.min_visibility))
            .map(|&n| capture.pixel(n))
            .collect()
    };

    let mut candidates = visible(&FOOT[..]);
    if candidates.is_empty() {
        candidates = ANKLES.iter().map(|&n| capture.pixel(n)).collect();
    } else {
        candidates.extend(visible(&ANKLES[..]));
    }

    let y = candidates.iter().map(|p| p.y).fold(f64::MIN, f64::max);
    let x = Point::centroid(&candidates).x;
    Point::new(x, y)
}

/// Head-top to foot-bottom distance in pixels.
pub fn body_pixel_height(capture: &CaptureAngle, config: &CalibrationConfig) -> f64 {
    head_top(capture, config).distance(&foot_bottom(capture, config))
}

/// Extract raw measurements from the front (and optional side) capture.
pub fn extract(
    front: &CaptureAngle,
    side: Option<&CaptureAngle>,
    scale_cm_per_pixel: f64,
    calibration: &CalibrationConfig,
    geometry: &GeometryConfig,
) -> RawMeasurementSet {
    use LandmarkName::*;

    let scale = if scale_cm_per_pixel.is_finite() && scale_cm_per_pixel > 0.0 {
        scale_cm_per_pixel
    } else {
        0.0
    };
    let px = |name| front.pixel(name);

    let shoulder_span = px(LeftShoulder).distance(&px(RightShoulder));
    let hip_span = px(LeftHip).distance(&px(RightHip));

    let sleeve = |s, e, w| {
        let (s, e, w): (Point, Point, Point) = (px(s), px(e), px(w));
        s.distance(&e) + e.distance(&w)
    };
    let sleeve_px = (sleeve(LeftShoulder, LeftElbow, LeftWrist)
        + sleeve(RightShoulder, RightElbow, RightWrist))
        / 2.0;

    let crotch = px(LeftHip).midpoint(&px(RightHip))
        + Point::new(0.0, front.image_height as f64 * geometry.crotch_offset);
    let leg = |k, a| {
        let (k, a): (Point, Point) = (px(k), px(a));
        crotch.distance(&k) + k.distance(&a)
    };
    let inseam_px = (leg(LeftKnee, LeftAnkle) + leg(RightKnee, RightAnkle)) / 2.0;

    let height_px = body_pixel_height(front, calibration);

    let mut linear = MeasurementSet::new();
    linear.insert(MeasurementKey::Height, height_px * scale);
    linear.insert(MeasurementKey::Shoulders, shoulder_span * geometry.shoulder_edge * scale);
    linear.insert(MeasurementKey::Sleeve, sleeve_px * scale);
    linear.insert(MeasurementKey::Inseam, inseam_px * scale);

    let (thigh_px, calf_px) = leg_segments(front);
    let mut front_widths = MeasurementSet::new();
    front_widths.insert(MeasurementKey::Chest, shoulder_span * geometry.chest_width * scale);
    front_widths.insert(MeasurementKey::Waist, hip_span * geometry.waist_width * scale);
    front_widths.insert(MeasurementKey::Hips, hip_span * geometry.hips_width * scale);
    front_widths.insert(MeasurementKey::Neck, shoulder_span * geometry.neck_width * scale);
    front_widths.insert(MeasurementKey::Thigh, thigh_px * geometry.thigh_width * scale);
    front_widths.insert(MeasurementKey::Calf, calf_px * geometry.calf_width * scale);

    let side_depths = side.map(|side| extract_side_depths(side, scale, geometry));

    tracing::debug!(
        height_px,
        shoulder_span,
        hip_span,
        has_side = side_depths.is_some(),
        "extracted raw geometry"
    );

    RawMeasurementSet {
        linear,
        front_widths,
        side_depths,
    }
}

/// Hip-midpoint to knee-midpoint and knee-midpoint to ankle-midpoint lengths in pixels.
fn leg_segments(capture: &CaptureAngle) -> (f64, f64) {
    use LandmarkName::*;

    let mid = |a, b| capture.pixel(a).midpoint(&capture.pixel(b));
    let hips = mid(LeftHip, RightHip);
    let knees = mid(LeftKnee, RightKnee);
    let ankles = mid(LeftAnkle, RightAnkle);
    (hips.distance(&knees), knees.distance(&ankles))
}

/// Body depths seen from the side. The near and far joints of a pair are
/// offset horizontally by roughly the torso depth at that level.
fn extract_side_depths(side: &CaptureAngle, scale: f64, geometry: &GeometryConfig) -> MeasurementSet {
    use LandmarkName::*;

    let spread = |a, b| (side.pixel(a).x - side.pixel(b).x).abs();
    let chest = spread(LeftShoulder, RightShoulder) * scale;
    let waist = spread(LeftHip, RightHip) * scale;
    let (thigh_px, calf_px) = leg_segments(side);

    let mut depths = MeasurementSet::new();
    depths.insert(MeasurementKey::Chest, chest);
    depths.insert(MeasurementKey::Waist, waist);
    depths.insert(MeasurementKey::Hips, waist * geometry.hip_depth);
    depths.insert(MeasurementKey::Thigh, thigh_px * geometry.thigh_width * scale);
    depths.insert(MeasurementKey::Calf, calf_px * geometry.calf_width * scale);
    depths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{AngleKind, Landmark};
    use crate::test_utils::{standing_front, standing_side, STANDING_HEIGHT_PX};

    fn configs() -> (CalibrationConfig, GeometryConfig) {
        (CalibrationConfig::default(), GeometryConfig::default())
    }

    #[test]
    fn test_head_top_above_nose() {
        let (cal, _) = configs();
        let capture = standing_front();
        let top = head_top(&capture, &cal);
        // nose at y=200, shoulders at y=400
        assert!((top.y - 80.0).abs() < 1e-9);
        assert!((top.x - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_foot_bottom_uses_lowest_point() {
        let (cal, _) = configs();
        let capture = standing_front();
        let foot = foot_bottom(&capture, &cal);
        assert!((foot.y - 1840.0).abs() < 1e-9);
        assert!((foot.x - 500.0).abs() < 1e-9);
        assert!((body_pixel_height(&capture, &cal) - STANDING_HEIGHT_PX).abs() < 1e-9);
    }

    #[test]
    fn test_foot_bottom_falls_back_to_ankles() {
        let (cal, _) = configs();
        let mut capture = standing_front();
        for lm in capture.landmarks.iter_mut() {
            if lm.name.contains("heel") || lm.name.contains("foot_index") {
                lm.visibility = 0.0;
            }
        }
        let foot = foot_bottom(&capture, &cal);
        // ankles at y=0.90
        assert!((foot.y - 1800.0).abs() < 1e-9);
    }

    #[test]
    fn test_extract_linear_measurements() {
        let (cal, geo) = configs();
        let capture = standing_front();
        let scale = 170.0 / STANDING_HEIGHT_PX;
        let raw = extract(&capture, None, scale, &cal, &geo);

        assert!((raw.height() - 170.0).abs() < 1e-9);
        let shoulders = raw.linear.get(MeasurementKey::Shoulders).unwrap();
        assert!((shoulders - 420.0 * 1.05 * scale).abs() < 1e-9);
        assert!(raw.linear.get(MeasurementKey::Sleeve).unwrap() > 55.0);
        assert!(raw.linear.get(MeasurementKey::Inseam).unwrap() > 70.0);
        assert!(raw.side_depths.is_none());

        let chest = raw.front_widths.get(MeasurementKey::Chest).unwrap();
        assert!((chest - 420.0 * 0.95 * scale).abs() < 1e-9);
        let hips = raw.front_widths.get(MeasurementKey::Hips).unwrap();
        let waist = raw.front_widths.get(MeasurementKey::Waist).unwrap();
        assert!(hips > waist);
    }

    #[test]
    fn test_extract_side_depths() {
        let (cal, geo) = configs();
        let scale = 0.1;
        let raw = extract(&standing_front(), Some(&standing_side()), scale, &cal, &geo);
        let depths = raw.side_depths.unwrap();
        let chest = depths.get(MeasurementKey::Chest).unwrap();
        assert!((chest - 250.0 * scale).abs() < 1e-9);
        let waist = depths.get(MeasurementKey::Waist).unwrap();
        let hips = depths.get(MeasurementKey::Hips).unwrap();
        assert!((hips - waist * 1.15).abs() < 1e-9);
        assert!(!depths.contains(MeasurementKey::Neck));
    }

    #[test]
    fn test_missing_points_yield_zero_not_nan() {
        let (cal, geo) = configs();
        let capture = CaptureAngle::new(
            AngleKind::Front,
            vec![Landmark::new(LandmarkName::Nose, 0.5, 0.1, 0.9)],
            640,
            480,
        );
        let raw = extract(&capture, None, 0.0, &cal, &geo);
        for (_, v) in raw.linear.iter().chain(raw.front_widths.iter()) {
            assert!(v.is_finite());
            assert_eq!(v, 0.0);
        }
    }
}

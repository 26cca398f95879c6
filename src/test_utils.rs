//! Synthetic skeletons for unit tests.

use crate::landmark::{AngleKind, CaptureAngle, Landmark, LandmarkName};

/// Head-top to foot-bottom distance of [`standing_front`] in pixels.
pub(crate) const STANDING_HEIGHT_PX: f64 = 1760.0;

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 2000;

fn build(angle: AngleKind, points: &[(LandmarkName, f64, f64)], width: u32, height: u32) -> CaptureAngle {
    let landmarks = LandmarkName::ALL
        .iter()
        .map(|&name| {
            let (x, y) = points
                .iter()
                .find(|(n, _, _)| *n == name)
                .map(|&(_, x, y)| (x, y))
                .unwrap_or((0.5, 0.09));
            Landmark::new(name, x, y, 0.9)
        })
        .collect();
    CaptureAngle::new(angle, landmarks, width, height)
}

/// Front view of a person standing upright on a 1000x2000 image.
///
/// Nose at y=200 px, shoulders at y=400 px (head top at y=80), lowest toe
/// at y=1840. Shoulder joints 420 px apart, hip joints 170 px apart.
pub(crate) fn standing_front() -> CaptureAngle {
    use LandmarkName::*;
    build(
        AngleKind::Front,
        &[
            (Nose, 0.50, 0.10),
            (LeftShoulder, 0.71, 0.20),
            (RightShoulder, 0.29, 0.20),
            (LeftElbow, 0.74, 0.37),
            (RightElbow, 0.26, 0.37),
            (LeftWrist, 0.75, 0.52),
            (RightWrist, 0.25, 0.52),
            (LeftPinky, 0.75, 0.55),
            (RightPinky, 0.25, 0.55),
            (LeftIndex, 0.75, 0.55),
            (RightIndex, 0.25, 0.55),
            (LeftThumb, 0.74, 0.54),
            (RightThumb, 0.26, 0.54),
            (LeftHip, 0.585, 0.50),
            (RightHip, 0.415, 0.50),
            (LeftKnee, 0.58, 0.72),
            (RightKnee, 0.42, 0.72),
            (LeftAnkle, 0.575, 0.90),
            (RightAnkle, 0.425, 0.90),
            (LeftHeel, 0.575, 0.915),
            (RightHeel, 0.425, 0.915),
            (LeftFootIndex, 0.59, 0.92),
            (RightFootIndex, 0.41, 0.92),
        ],
        WIDTH,
        HEIGHT,
    )
}

/// Side view of the same person: shoulders 250 px apart horizontally,
/// hips 200 px apart.
pub(crate) fn standing_side() -> CaptureAngle {
    use LandmarkName::*;
    build(
        AngleKind::Side,
        &[
            (Nose, 0.55, 0.10),
            (LeftShoulder, 0.625, 0.20),
            (RightShoulder, 0.375, 0.20),
            (LeftElbow, 0.52, 0.37),
            (RightElbow, 0.48, 0.37),
            (LeftWrist, 0.53, 0.52),
            (RightWrist, 0.47, 0.52),
            (LeftHip, 0.60, 0.50),
            (RightHip, 0.40, 0.50),
            (LeftKnee, 0.52, 0.72),
            (RightKnee, 0.48, 0.72),
            (LeftAnkle, 0.50, 0.90),
            (RightAnkle, 0.50, 0.90),
            (LeftHeel, 0.47, 0.915),
            (RightHeel, 0.47, 0.915),
            (LeftFootIndex, 0.56, 0.92),
            (RightFootIndex, 0.56, 0.92),
        ],
        WIDTH,
        HEIGHT,
    )
}

/// Minimal front skeleton on a 1000x1200 image whose head-top to
/// foot-bottom distance is `height_px`.
pub(crate) fn capture_with_body_height(height_px: f64) -> CaptureAngle {
    use LandmarkName::*;
    let image_h = 1200.0;
    // nose at 240 px, shoulders at 360 px: head top at 240 - 0.6 * 120 = 168 px
    let foot = (168.0 + height_px) / image_h;
    build(
        AngleKind::Front,
        &[
            (Nose, 0.5, 0.2),
            (LeftShoulder, 0.6, 0.3),
            (RightShoulder, 0.4, 0.3),
            (LeftAnkle, 0.45, foot),
            (RightAnkle, 0.55, foot),
            (LeftHeel, 0.45, foot),
            (RightHeel, 0.55, foot),
            (LeftFootIndex, 0.45, foot),
            (RightFootIndex, 0.55, foot),
        ],
        1000,
        image_h as u32,
    )
}

pub(crate) fn uniform_visibility(mut capture: CaptureAngle, visibility: f64) -> CaptureAngle {
    for lm in capture.landmarks.iter_mut() {
        lm.visibility = visibility;
    }
    capture
}

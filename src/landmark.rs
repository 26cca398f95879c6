//! Body landmark skeleton as delivered by the external pose detector.
//!
//! The detector reports the 33-point BlazePose topology. Each point carries
//! normalized `[0,1]` image coordinates, a relative depth hint and a
//! visibility score. Detectors sometimes drop or rename points, so lookups
//! go by name first, then by position, and finally fall back to a
//! zero-visibility sentinel in the middle of the frame.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Point;

/// The 33 BlazePose landmark indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(usize)]
pub enum LandmarkName {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl LandmarkName {
    pub const COUNT: usize = 33;

    pub const ALL: [LandmarkName; Self::COUNT] = [
        Self::Nose,
        Self::LeftEyeInner,
        Self::LeftEye,
        Self::LeftEyeOuter,
        Self::RightEyeInner,
        Self::RightEye,
        Self::RightEyeOuter,
        Self::LeftEar,
        Self::RightEar,
        Self::MouthLeft,
        Self::MouthRight,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftPinky,
        Self::RightPinky,
        Self::LeftIndex,
        Self::RightIndex,
        Self::LeftThumb,
        Self::RightThumb,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
        Self::LeftHeel,
        Self::RightHeel,
        Self::LeftFootIndex,
        Self::RightFootIndex,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Resolve a detector name regardless of naming style: `left_shoulder`,
    /// `LEFT_SHOULDER`, `leftShoulder` and `left-shoulder` all match.
    pub fn parse(name: &str) -> Option<Self> {
        let wanted = fold_name(name);
        if wanted.is_empty() {
            return None;
        }
        Self::ALL.iter().copied().find(|n| fold_name(n.as_str()) == wanted)
    }

    /// Detector wire name, e.g. `"left_shoulder"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEyeInner => "left_eye_inner",
            Self::LeftEye => "left_eye",
            Self::LeftEyeOuter => "left_eye_outer",
            Self::RightEyeInner => "right_eye_inner",
            Self::RightEye => "right_eye",
            Self::RightEyeOuter => "right_eye_outer",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::MouthLeft => "mouth_left",
            Self::MouthRight => "mouth_right",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftPinky => "left_pinky",
            Self::RightPinky => "right_pinky",
            Self::LeftIndex => "left_index",
            Self::RightIndex => "right_index",
            Self::LeftThumb => "left_thumb",
            Self::RightThumb => "right_thumb",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
            Self::LeftHeel => "left_heel",
            Self::RightHeel => "right_heel",
            Self::LeftFootIndex => "left_foot_index",
            Self::RightFootIndex => "right_foot_index",
        }
    }
}

fn fold_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl std::fmt::Display for LandmarkName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single detected landmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Normalized X coordinate (0.0 to 1.0)
    pub x: f64,
    /// Normalized Y coordinate (0.0 to 1.0)
    pub y: f64,
    /// Relative depth hint, unused by the 2D pipeline
    #[serde(default)]
    pub z: f64,
    /// Visibility confidence (0.0 to 1.0)
    #[serde(default)]
    pub visibility: f64,
    /// Detector wire name; may be empty when the detector only reports positions
    #[serde(default)]
    pub name: String,
}

impl Landmark {
    pub fn new(name: LandmarkName, x: f64, y: f64, visibility: f64) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            visibility,
            name: name.as_str().to_string(),
        }
    }

    /// Placeholder for a point the detector did not report.
    pub fn missing(name: LandmarkName) -> Self {
        Self::new(name, 0.5, 0.5, 0.0)
    }

    pub fn is_visible(&self, threshold: f64) -> bool {
        self.visibility >= threshold && self.visibility > 0.0
    }

    /// Convert to pixel coordinates on a `width` x `height` image.
    pub fn to_pixel(&self, width: u32, height: u32) -> Point {
        Point::new(self.x * width as f64, self.y * height as f64)
    }
}

/// Which way the subject faced the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleKind {
    Front,
    Side,
    Back,
}

/// The front capture of a scan.
///
/// Fails with [`Error::MissingRequiredAngle`] when there is none and with
/// [`Error::DuplicateAngle`] when any angle appears twice.
pub(crate) fn front_capture(captures: &[CaptureAngle]) -> Result<&CaptureAngle> {
    for (i, capture) in captures.iter().enumerate() {
        if captures[..i].iter().any(|c| c.angle == capture.angle) {
            return Err(Error::DuplicateAngle(capture.angle));
        }
    }
    captures
        .iter()
        .find(|c| c.angle == AngleKind::Front)
        .ok_or(Error::MissingRequiredAngle)
}

impl std::fmt::Display for AngleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Front => f.write_str("front"),
            Self::Side => f.write_str("side"),
            Self::Back => f.write_str("back"),
        }
    }
}

/// One photograph's full landmark skeleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureAngle {
    pub angle: AngleKind,
    pub landmarks: Vec<Landmark>,
    pub image_width: u32,
    pub image_height: u32,
    #[serde(default)]
    pub detection_confidence: f64,
}

impl CaptureAngle {
    pub fn new(angle: AngleKind, landmarks: Vec<Landmark>, image_width: u32, image_height: u32) -> Self {
        Self {
            angle,
            landmarks,
            image_width,
            image_height,
            detection_confidence: 1.0,
        }
    }

    /// Look up a landmark. Never fails: tries the name in any naming style,
    /// then the fixed BlazePose index, then returns a zero-visibility point in
    /// the frame center.
    ///
    /// The index fallback is skipped when the point stored there is named as
    /// a different landmark, so a shifted array never yields the wrong joint.
    pub fn landmark(&self, name: LandmarkName) -> Landmark {
        if let Some(lm) = self
            .landmarks
            .iter()
            .find(|lm| LandmarkName::parse(&lm.name) == Some(name))
        {
            return lm.clone();
        }
        match self.landmarks.get(name.index()) {
            Some(lm) if LandmarkName::parse(&lm.name).is_none() => lm.clone(),
            _ => Landmark::missing(name),
        }
    }

    /// Landmark position in pixel coordinates.
    pub fn pixel(&self, name: LandmarkName) -> Point {
        self.landmark(name).to_pixel(self.image_width, self.image_height)
    }

    /// Mean visibility over the full 33-point skeleton, counting missing points as 0.
    pub fn mean_visibility(&self) -> f64 {
        let sum: f64 = LandmarkName::ALL
            .iter()
            .map(|&n| self.landmark(n).visibility.clamp(0.0, 1.0))
            .sum();
        sum / LandmarkName::COUNT as f64
    }
}

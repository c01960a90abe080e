//! Per-frame landmark detection results and the detector seam.
//!
//! The landmark detector itself is an external collaborator: it turns one
//! inbound frame payload into up to four independently present landmark
//! groups. Absence is carried structurally as [`GroupDetection::Absent`].

use crate::error::{Result, SignStreamError};
use serde::Deserialize;
use std::sync::Arc;

/// A single normalized landmark position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Only reported for pose landmarks.
    pub visibility: Option<f32>,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            visibility: None,
        }
    }

    pub fn with_visibility(mut self, visibility: f32) -> Self {
        self.visibility = Some(visibility);
        self
    }
}

/// Detection outcome of one landmark group in one frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum GroupDetection {
    Present(Vec<Landmark>),
    #[default]
    Absent,
}

impl GroupDetection {
    pub fn is_present(&self) -> bool {
        matches!(self, GroupDetection::Present(_))
    }

    /// Landmarks of a present group, empty for an absent one.
    pub fn landmarks(&self) -> &[Landmark] {
        match self {
            GroupDetection::Present(points) => points,
            GroupDetection::Absent => &[],
        }
    }
}

impl From<Option<Vec<Landmark>>> for GroupDetection {
    fn from(points: Option<Vec<Landmark>>) -> Self {
        match points {
            Some(points) if !points.is_empty() => GroupDetection::Present(points),
            _ => GroupDetection::Absent,
        }
    }
}

/// All landmark groups detected in one frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Detection {
    pub pose: GroupDetection,
    pub face: GroupDetection,
    pub left_hand: GroupDetection,
    pub right_hand: GroupDetection,
}

impl Detection {
    /// A frame in which nothing was detected.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether at least one hand is visible, the precondition for a usable sign.
    pub fn has_hands(&self) -> bool {
        self.left_hand.is_present() || self.right_hand.is_present()
    }

    /// Whether no group at all was detected.
    pub fn is_empty(&self) -> bool {
        !self.pose.is_present()
            && !self.face.is_present()
            && !self.left_hand.is_present()
            && !self.right_hand.is_present()
    }
}

/// Trait for per-frame landmark detection.
///
/// Implementations decode one inbound frame payload and locate the landmark
/// groups in it. Errors mean the payload itself could not be decoded.
pub trait LandmarkDetector: Send + Sync {
    /// Detect landmarks in one frame payload.
    fn detect(&self, payload: &[u8]) -> Result<Detection>;

    /// Name for logging/diagnostics.
    fn name(&self) -> &str;
}

/// Implement LandmarkDetector for Arc<T> to allow sharing across sessions.
impl<T: LandmarkDetector + ?Sized> LandmarkDetector for Arc<T> {
    fn detect(&self, payload: &[u8]) -> Result<Detection> {
        (**self).detect(payload)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Wire shape of a client-side landmark payload.
#[derive(Debug, Deserialize)]
struct LandmarkPayload {
    #[serde(default)]
    pose: Option<Vec<Vec<f32>>>,
    #[serde(default)]
    face: Option<Vec<Vec<f32>>>,
    #[serde(default)]
    left_hand: Option<Vec<Vec<f32>>>,
    #[serde(default)]
    right_hand: Option<Vec<Vec<f32>>>,
}

/// Detector for frames whose landmarks were already extracted client-side.
///
/// Each frame is a JSON object with optional `pose`, `face`, `left_hand` and
/// `right_hand` arrays of `[x, y, z]` or `[x, y, z, visibility]` points. A
/// missing, `null` or empty group is reported as absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLandmarkDetector;

impl JsonLandmarkDetector {
    fn convert(group: &str, points: Option<Vec<Vec<f32>>>) -> Result<GroupDetection> {
        let Some(points) = points else {
            return Ok(GroupDetection::Absent);
        };

        let landmarks = points
            .into_iter()
            .enumerate()
            .map(|(idx, point)| match point.as_slice() {
                [x, y, z] => Ok(Landmark::new(*x, *y, *z)),
                [x, y, z, v, ..] => Ok(Landmark::new(*x, *y, *z).with_visibility(*v)),
                _ => Err(SignStreamError::FrameDecode {
                    message: format!(
                        "{group} landmark {idx} has {} values, expected 3 or 4",
                        point.len()
                    ),
                }),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(landmarks).into())
    }
}

impl LandmarkDetector for JsonLandmarkDetector {
    fn detect(&self, payload: &[u8]) -> Result<Detection> {
        let payload: LandmarkPayload =
            serde_json::from_slice(payload).map_err(|e| SignStreamError::FrameDecode {
                message: e.to_string(),
            })?;

        Ok(Detection {
            pose: Self::convert("pose", payload.pose)?,
            face: Self::convert("face", payload.face)?,
            left_hand: Self::convert("left_hand", payload.left_hand)?,
            right_hand: Self::convert("right_hand", payload.right_hand)?,
        })
    }

    fn name(&self) -> &str {
        "json"
    }
}

/// Mock detector for testing
#[derive(Debug, Clone)]
pub struct MockLandmarkDetector {
    detection: Detection,
    should_fail: bool,
}

impl MockLandmarkDetector {
    /// Create a mock that reports the given detection for every frame
    pub fn new(detection: Detection) -> Self {
        Self {
            detection,
            should_fail: false,
        }
    }

    /// Configure the mock to fail decoding every frame
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl LandmarkDetector for MockLandmarkDetector {
    fn detect(&self, _payload: &[u8]) -> Result<Detection> {
        if self.should_fail {
            Err(SignStreamError::FrameDecode {
                message: "mock decode failure".to_string(),
            })
        } else {
            Ok(self.detection.clone())
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

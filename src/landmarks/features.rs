//! Feature vector construction from one frame's landmark groups.
//!
//! Layout (offsets fixed regardless of detection):
//! ```text
//! [ pose 33×(x,y,z,vis) | face 468×(x,y,z) | left hand 21×(x,y,z) | right hand 21×(x,y,z) ]
//!   0..132                132..1536          1536..1599             1599..1662
//! ```
//! An absent group leaves its region zeroed.

use crate::defaults;
use crate::landmarks::detection::{Detection, GroupDetection, Landmark};

/// Fixed-length numeric representation of one frame.
///
/// Always exactly [`defaults::FEATURE_LEN`] values long.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    /// The all-zero vector, used for padding and for frames with no landmarks.
    pub fn zeros() -> Self {
        Self(vec![0.0; defaults::FEATURE_LEN])
    }

    /// Wrap raw values, truncating or zero-padding to the configured length.
    pub fn from_values(mut values: Vec<f32>) -> Self {
        values.resize(defaults::FEATURE_LEN, 0.0);
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether every component is zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::zeros()
    }
}

/// Shape of one landmark group's region in the feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GroupRegion {
    landmarks: usize,
    values_per_landmark: usize,
}

impl GroupRegion {
    const POSE: Self = Self {
        landmarks: defaults::POSE_LANDMARKS,
        values_per_landmark: defaults::POSE_VALUES,
    };
    const FACE: Self = Self {
        landmarks: defaults::FACE_LANDMARKS,
        values_per_landmark: defaults::POINT_VALUES,
    };
    const HAND: Self = Self {
        landmarks: defaults::HAND_LANDMARKS,
        values_per_landmark: defaults::POINT_VALUES,
    };

    fn len(self) -> usize {
        self.landmarks * self.values_per_landmark
    }

    /// Append this group's region to `out`, zero-filled when absent.
    ///
    /// A present group reporting more or fewer landmarks than expected is
    /// truncated or zero-padded so later regions keep their offsets.
    fn write(self, group: &GroupDetection, out: &mut Vec<f32>) {
        let start = out.len();
        for landmark in group.landmarks().iter().take(self.landmarks) {
            self.push_landmark(landmark, out);
        }
        out.resize(start + self.len(), 0.0);
    }

    fn push_landmark(self, landmark: &Landmark, out: &mut Vec<f32>) {
        out.extend_from_slice(&[landmark.x, landmark.y, landmark.z]);
        if self.values_per_landmark == defaults::POSE_VALUES {
            out.push(landmark.visibility.unwrap_or(0.0));
        }
    }
}

/// Builds one [`FeatureVector`] per frame from its landmark detection.
///
/// Pure function of the detection; holds no state between frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureVectorBuilder;

impl FeatureVectorBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, detection: &Detection) -> FeatureVector {
        let mut values = Vec::with_capacity(defaults::FEATURE_LEN);
        GroupRegion::POSE.write(&detection.pose, &mut values);
        GroupRegion::FACE.write(&detection.face, &mut values);
        GroupRegion::HAND.write(&detection.left_hand, &mut values);
        GroupRegion::HAND.write(&detection.right_hand, &mut values);
        FeatureVector::from_values(values)
    }
}

//! Landmark detection results and per-frame feature extraction.

pub mod detection;
pub mod features;

pub use detection::{
    Detection, GroupDetection, JsonLandmarkDetector, Landmark, LandmarkDetector,
    MockLandmarkDetector,
};
pub use features::{FeatureVector, FeatureVectorBuilder};

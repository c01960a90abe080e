//! Sentence segmentation over the stream of recognised signs.

pub mod engine;

pub use engine::{SegmentEvent, SegmentState, SegmentationEngine};

//! Sliding window of the most recent feature vectors of one session.

use crate::defaults;
use crate::landmarks::features::FeatureVector;
use std::collections::VecDeque;

/// Keeps the last `width` feature vectors in arrival order.
///
/// Older frames are evicted silently once the window is full. When fewer than
/// `width` frames have been appended, [`materialize`](Self::materialize) pads
/// the front with zero vectors so the classifier always sees `width` rows.
#[derive(Debug, Clone)]
pub struct SlidingWindowBuffer {
    frames: VecDeque<FeatureVector>,
    width: usize,
    appended: u64,
}

impl SlidingWindowBuffer {
    /// Creates a window of the classifier's default input length.
    pub fn new() -> Self {
        Self::with_width(defaults::WINDOW_LEN)
    }

    /// Creates a window holding `width` frames (at least one).
    pub fn with_width(width: usize) -> Self {
        let width = width.max(1);
        Self {
            frames: VecDeque::with_capacity(width),
            width,
            appended: 0,
        }
    }

    /// Append the newest frame, evicting the oldest when full.
    pub fn push(&mut self, vector: FeatureVector) {
        if self.frames.len() == self.width {
            self.frames.pop_front();
        }
        self.frames.push_back(vector);
        self.appended += 1;
    }

    /// Number of real (non-padding) frames currently held.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Total frames appended since the window was created.
    pub fn appended(&self) -> u64 {
        self.appended
    }

    /// Exactly `width` rows, oldest first, zero rows in front when short.
    pub fn materialize(&self) -> Vec<FeatureVector> {
        let padding = self.width - self.frames.len();
        let mut rows = Vec::with_capacity(self.width);
        rows.extend(std::iter::repeat_with(FeatureVector::zeros).take(padding));
        rows.extend(self.frames.iter().cloned());
        rows
    }

    /// Row-major `width × FEATURE_LEN` values of the materialized window.
    pub fn to_flat(&self) -> Vec<f32> {
        let mut flat = Vec::with_capacity(self.width * defaults::FEATURE_LEN);
        for row in self.materialize() {
            flat.extend_from_slice(row.as_slice());
        }
        flat
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

impl Default for SlidingWindowBuffer {
    fn default() -> Self {
        Self::new()
    }
}

//! Sequence classifier seam and the per-window adapter around it.

use crate::error::{Result, SignStreamError};
use crate::landmarks::features::FeatureVector;
use crate::recognition::labels::{LabelTable, SignLabel};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Trait for the trained sequence model.
///
/// The model is treated as a pure function from a window of feature vectors
/// to a class probability vector. It is loaded once and shared read-only by
/// every session.
pub trait SignModel: Send + Sync {
    /// Class probabilities for one window, indexed by class.
    fn predict(&self, window: &[FeatureVector]) -> Result<Vec<f32>>;

    /// Get the name of the loaded model
    fn model_name(&self) -> &str;
}

/// Implement SignModel for Arc<T> to allow sharing across sessions.
impl<T: SignModel + ?Sized> SignModel for Arc<T> {
    fn predict(&self, window: &[FeatureVector]) -> Result<Vec<f32>> {
        (**self).predict(window)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Label and confidence for one processed frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub label: SignLabel,
    /// Maximum class probability, in `[0, 1]`.
    pub confidence: f32,
}

impl ClassificationResult {
    pub fn new(label: SignLabel, confidence: f32) -> Self {
        Self {
            label,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// The "no signal" result for frames without hands or failed inference.
    pub fn no_hand() -> Self {
        Self {
            label: SignLabel::NoHandDetected,
            confidence: 0.0,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.label.is_sentinel()
    }
}

/// Adapter turning a window into a [`ClassificationResult`].
///
/// Cheap to clone; the model and label table are shared.
#[derive(Clone)]
pub struct SignClassifier {
    model: Arc<dyn SignModel>,
    labels: Arc<LabelTable>,
}

impl SignClassifier {
    pub fn new(model: Arc<dyn SignModel>, labels: Arc<LabelTable>) -> Self {
        Self { model, labels }
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    /// Classify one window.
    ///
    /// The model always runs. A frame without hands is still reported as
    /// [`SignLabel::NoHandDetected`], and any model failure degrades to the
    /// same sentinel instead of propagating.
    pub fn classify(&self, window: &[FeatureVector], hands_present: bool) -> ClassificationResult {
        let prediction = self.model.predict(window).and_then(|p| self.decode(&p));

        match prediction {
            Ok(_) if !hands_present => ClassificationResult::no_hand(),
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(model = self.model.model_name(), error = %e, "Sign classification failed");
                ClassificationResult::no_hand()
            }
        }
    }

    /// Arg-max decoding of a probability vector.
    fn decode(&self, probabilities: &[f32]) -> Result<ClassificationResult> {
        let (index, confidence) = probabilities
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, p)| p.is_finite())
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .ok_or_else(|| SignStreamError::Inference {
                message: "model returned no finite class probabilities".to_string(),
            })?;

        Ok(ClassificationResult::new(self.labels.decode(index), confidence))
    }
}

/// Mock model for testing
#[derive(Debug)]
pub struct MockSignModel {
    model_name: String,
    probabilities: Vec<f32>,
    should_fail: bool,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockSignModel {
    /// Create a mock that always predicts class 0 with full confidence
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            probabilities: vec![1.0],
            should_fail: false,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Configure the probabilities returned for every window
    pub fn with_probabilities(mut self, probabilities: Vec<f32>) -> Self {
        self.probabilities = probabilities;
        self
    }

    /// Configure the mock to fail on predict
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Configure the mock to block for `delay` on every predict
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of predict calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SignModel for MockSignModel {
    fn predict(&self, _window: &[FeatureVector]) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if self.should_fail {
            Err(SignStreamError::Inference {
                message: "mock inference failure".to_string(),
            })
        } else {
            Ok(self.probabilities.clone())
        }
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

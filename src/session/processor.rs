//! Synchronous per-frame pipeline for one session.

use crate::error::Result;
use crate::landmarks::{FeatureVectorBuilder, LandmarkDetector};
use crate::recognition::{ClassificationResult, SignClassifier, SlidingWindowBuffer};
use crate::segmentation::{SegmentEvent, SegmentationEngine};
use crate::session::clock::Clock;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Owns the mutable per-session state: window buffer and segmentation engine.
///
/// Runs detection, feature extraction, classification and segmentation for
/// each frame, in arrival order.
pub struct FrameProcessor {
    detector: Arc<dyn LandmarkDetector>,
    builder: FeatureVectorBuilder,
    window: SlidingWindowBuffer,
    classifier: SignClassifier,
    engine: SegmentationEngine,
    clock: Arc<dyn Clock>,
    frames: u64,
}

impl FrameProcessor {
    pub fn new(
        detector: Arc<dyn LandmarkDetector>,
        classifier: SignClassifier,
        clock: Arc<dyn Clock>,
        window_len: usize,
        pause: Duration,
    ) -> Self {
        Self {
            detector,
            builder: FeatureVectorBuilder::new(),
            window: SlidingWindowBuffer::with_width(window_len),
            classifier,
            engine: SegmentationEngine::with_pause(pause),
            clock,
            frames: 0,
        }
    }

    /// Process one frame payload that arrived at `arrived`.
    ///
    /// The pause timer runs on arrival time, so time spent queued or in
    /// inference never counts as silence. Errors only when the payload
    /// cannot be decoded; classification failures already degrade to the
    /// no-hand sentinel.
    pub fn process_frame(&mut self, payload: &[u8], arrived: Instant) -> Result<Vec<SegmentEvent>> {
        let detection = self.detector.detect(payload)?;
        self.window.push(self.builder.build(&detection));

        let window = self.window.materialize();
        let result = self.classifier.classify(&window, detection.has_hands());
        self.frames += 1;

        Ok(self.engine.process(&result, arrived))
    }

    /// Advance the pause timer without a frame, as if a handless frame arrived.
    pub fn idle(&mut self) -> Vec<SegmentEvent> {
        let now = self.clock.now();
        self.engine.process(&ClassificationResult::no_hand(), now)
    }

    /// Drop the accumulated signs, returning how many there were.
    pub fn discard(&mut self) -> usize {
        self.engine.discard()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames
    }

    pub fn engine(&self) -> &SegmentationEngine {
        &self.engine
    }

    pub fn window(&self) -> &SlidingWindowBuffer {
        &self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{JsonLandmarkDetector, MockLandmarkDetector};
    use crate::recognition::{LabelTable, MockSignModel, SignLabel};
    use crate::session::clock::ManualClock;

    const HAND: &[u8] = br#"{"right_hand": [[0.4, 0.5, 0.0], [0.42, 0.48, 0.01]]}"#;
    const NO_HAND: &[u8] = br#"{"pose": [[0.5, 0.5, 0.0, 0.9]]}"#;

    fn processor(model: MockSignModel, clock: &ManualClock) -> FrameProcessor {
        let labels = Arc::new(LabelTable::from_labels(["hello", "friend"]));
        FrameProcessor::new(
            Arc::new(JsonLandmarkDetector),
            SignClassifier::new(Arc::new(model), labels),
            Arc::new(clock.clone()),
            30,
            Duration::from_secs(2),
        )
    }

    #[test]
    fn test_hand_frame_emits_intermediate() {
        let clock = ManualClock::new();
        let mut p = processor(MockSignModel::new("mock").with_probabilities(vec![0.2, 0.8]), &clock);

        let events = p.process_frame(HAND, clock.now()).unwrap();
        assert_eq!(
            events,
            vec![SegmentEvent::Intermediate {
                label: SignLabel::sign("friend"),
                confidence: 0.8,
            }]
        );
        assert_eq!(p.frames_processed(), 1);
        assert_eq!(p.window().len(), 1);
    }

    #[test]
    fn test_handless_frames_are_silent() {
        let clock = ManualClock::new();
        let mut p = processor(MockSignModel::new("mock"), &clock);

        for _ in 0..40 {
            clock.advance(Duration::from_millis(100));
            assert!(p.process_frame(NO_HAND, clock.now()).unwrap().is_empty());
        }
        assert!(p.engine().tokens().is_empty());
        assert_eq!(p.window().len(), 30);
    }

    #[test]
    fn test_pause_closes_sentence() {
        let clock = ManualClock::new();
        let mut p = processor(MockSignModel::new("mock"), &clock);

        p.process_frame(HAND, clock.now()).unwrap();
        clock.advance(Duration::from_millis(500));
        p.process_frame(HAND, clock.now()).unwrap();

        clock.advance(Duration::from_millis(2100));
        let events = p.process_frame(NO_HAND, clock.now()).unwrap();
        assert_eq!(
            events,
            vec![SegmentEvent::Boundary {
                phrase: "hello hello".to_string()
            }]
        );
    }

    #[test]
    fn test_idle_tick_closes_sentence() {
        let clock = ManualClock::new();
        let mut p = processor(MockSignModel::new("mock"), &clock);

        p.process_frame(HAND, clock.now()).unwrap();
        clock.advance(Duration::from_millis(1000));
        assert!(p.idle().is_empty());

        clock.advance(Duration::from_millis(1500));
        assert_eq!(
            p.idle(),
            vec![SegmentEvent::Boundary {
                phrase: "hello".to_string()
            }]
        );
    }

    #[test]
    fn test_slow_inference_does_not_count_as_pause() {
        let clock = ManualClock::new();
        let mut p = processor(MockSignModel::new("mock"), &clock);

        // three frames arrive together; the worker gets to each one late
        let arrived = clock.now();
        for _ in 0..3 {
            clock.advance(Duration::from_millis(2500));
            let events = p.process_frame(HAND, arrived).unwrap();
            assert_eq!(events.len(), 1, "unexpected boundary: {events:?}");
        }

        assert_eq!(p.engine().tokens().len(), 3);
        assert_eq!(
            p.idle(),
            vec![SegmentEvent::Boundary {
                phrase: "hello hello hello".to_string()
            }]
        );
    }

    #[test]
    fn test_model_failure_degrades_to_sentinel() {
        let clock = ManualClock::new();
        let mut p = processor(MockSignModel::new("broken").with_failure(), &clock);

        assert!(p.process_frame(HAND, clock.now()).unwrap().is_empty());
        assert!(p.engine().tokens().is_empty());
    }

    #[test]
    fn test_decode_failure_is_error() {
        let clock = ManualClock::new();
        let labels = Arc::new(LabelTable::from_labels(["hello"]));
        let mut p = FrameProcessor::new(
            Arc::new(MockLandmarkDetector::new(Default::default()).with_failure()),
            SignClassifier::new(Arc::new(MockSignModel::new("mock")), labels),
            Arc::new(clock.clone()),
            30,
            Duration::from_secs(2),
        );

        assert!(p.process_frame(b"garbage", clock.now()).is_err());
        assert_eq!(p.frames_processed(), 0);
    }

    #[test]
    fn test_discard_reports_pending_signs() {
        let clock = ManualClock::new();
        let mut p = processor(MockSignModel::new("mock"), &clock);

        p.process_frame(HAND, clock.now()).unwrap();
        p.process_frame(HAND, clock.now()).unwrap();
        assert_eq!(p.discard(), 2);
        assert_eq!(p.discard(), 0);
    }
}

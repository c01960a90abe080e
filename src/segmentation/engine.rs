//! Pause-driven sentence segmentation.
//!
//! Turns the per-frame classification stream of one session into live sign
//! echoes and sentence boundaries. A sentence closes once no sign has been
//! recognised for longer than the pause threshold.

use crate::defaults;
use crate::recognition::classifier::ClassificationResult;
use crate::recognition::labels::SignLabel;
use std::time::{Duration, Instant};

/// Current state of the segmentation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentState {
    /// No sign accumulated since the last boundary.
    Idle,
    /// One or more signs accumulated since the last boundary.
    Accumulating,
}

/// Events emitted by the segmentation engine.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentEvent {
    /// A sign was recognised in this frame. Live echo, not a boundary.
    Intermediate { label: SignLabel, confidence: f32 },
    /// The pause threshold elapsed; `phrase` is the space-joined raw signs.
    Boundary { phrase: String },
}

/// Segmentation state machine for one session.
#[derive(Debug, Clone)]
pub struct SegmentationEngine {
    pause_threshold: Duration,
    tokens: Vec<SignLabel>,
    last_detection: Option<Instant>,
}

impl SegmentationEngine {
    /// Creates an engine with the default two-second pause threshold.
    pub fn new() -> Self {
        Self::with_pause(Duration::from_millis(defaults::PAUSE_THRESHOLD_MS))
    }

    pub fn with_pause(pause_threshold: Duration) -> Self {
        Self {
            pause_threshold,
            tokens: Vec::new(),
            last_detection: None,
        }
    }

    pub fn state(&self) -> SegmentState {
        if self.tokens.is_empty() {
            SegmentState::Idle
        } else {
            SegmentState::Accumulating
        }
    }

    /// Signs accumulated since the last boundary, in arrival order.
    pub fn tokens(&self) -> &[SignLabel] {
        &self.tokens
    }

    pub fn pause_threshold(&self) -> Duration {
        self.pause_threshold
    }

    /// Feed one frame's classification observed at `now`.
    ///
    /// Returns at most one intermediate event followed by at most one
    /// boundary. The pause is measured from the detection time recorded
    /// *before* this frame, so a sign arriving after a long gap is appended
    /// first and then closes the sentence it belongs to.
    pub fn process(&mut self, result: &ClassificationResult, now: Instant) -> Vec<SegmentEvent> {
        let previous_detection = self.last_detection;
        let was_accumulating = !self.tokens.is_empty();
        let mut events = Vec::new();

        if !result.is_sentinel() {
            self.tokens.push(result.label.clone());
            self.last_detection = Some(now);
            events.push(SegmentEvent::Intermediate {
                label: result.label.clone(),
                confidence: result.confidence,
            });
        }

        if was_accumulating
            && let Some(previous) = previous_detection
            && now.saturating_duration_since(previous) > self.pause_threshold
        {
            events.push(SegmentEvent::Boundary {
                phrase: self.take_phrase(),
            });
        }

        events
    }

    /// Drop any accumulated signs without emitting a boundary.
    ///
    /// Returns how many signs were discarded.
    pub fn discard(&mut self) -> usize {
        let count = self.tokens.len();
        self.tokens.clear();
        count
    }

    fn take_phrase(&mut self) -> String {
        let phrase = self
            .tokens
            .iter()
            .map(SignLabel::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        self.tokens.clear();
        phrase
    }
}

impl Default for SegmentationEngine {
    fn default() -> Self {
        Self::new()
    }
}

//! Turns a raw phrase into the final sentence and its audio.

use crate::refine::refiner::Refiner;
use crate::refine::speech::Synthesizer;
use std::sync::Arc;

/// Refined sentence plus the handle of its synthesized audio.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalSentence {
    pub sentence: String,
    /// `None` when synthesis is disabled or failed.
    pub audio_path: Option<String>,
}

/// Runs the refinement and speech collaborators for one phrase.
///
/// Collaborator failures never propagate: a failed refinement keeps the raw
/// phrase, a failed synthesis leaves the audio absent.
#[derive(Clone)]
pub struct SentenceFinalizer {
    refiner: Arc<dyn Refiner>,
    synthesizer: Option<Arc<dyn Synthesizer>>,
}

impl SentenceFinalizer {
    pub fn new(refiner: Arc<dyn Refiner>, synthesizer: Option<Arc<dyn Synthesizer>>) -> Self {
        Self {
            refiner,
            synthesizer,
        }
    }

    /// Refine `raw`, falling back to `raw` itself on failure or empty output.
    pub async fn refine(&self, raw: &str) -> String {
        match self.refiner.refine(raw).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                tracing::warn!(refiner = self.refiner.name(), "Refiner returned empty text, keeping raw phrase");
                raw.to_string()
            }
            Err(e) => {
                tracing::warn!(refiner = self.refiner.name(), error = %e, "Refinement failed, keeping raw phrase");
                raw.to_string()
            }
        }
    }

    /// Synthesize `sentence`, returning `None` when disabled or failed.
    pub async fn speak(&self, sentence: &str) -> Option<String> {
        let synthesizer = self.synthesizer.as_ref()?;
        match synthesizer.synthesize(sentence).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(synthesizer = synthesizer.name(), error = %e, "Speech synthesis failed, sending sentence without audio");
                None
            }
        }
    }

    pub async fn finalize(&self, raw: &str) -> FinalSentence {
        let sentence = self.refine(raw).await;
        let audio_path = self.speak(&sentence).await;
        FinalSentence {
            sentence,
            audio_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refine::refiner::MockRefiner;
    use crate::refine::speech::MockSynthesizer;

    fn finalizer(refiner: MockRefiner, synth: Option<MockSynthesizer>) -> SentenceFinalizer {
        SentenceFinalizer::new(
            Arc::new(refiner),
            synth.map(|s| Arc::new(s) as Arc<dyn Synthesizer>),
        )
    }

    #[tokio::test]
    async fn finalize_uses_refined_text_for_audio() {
        let f = finalizer(
            MockRefiner::new().with_response("Hello, friend."),
            Some(MockSynthesizer::new()),
        );

        let result = f.finalize("hello friend").await;

        assert_eq!(result.sentence, "Hello, friend.");
        assert_eq!(result.audio_path.as_deref(), Some("tts/Hello_friend.wav"));
    }

    #[tokio::test]
    async fn refinement_failure_keeps_raw_phrase() {
        let f = finalizer(MockRefiner::new().with_failure(), Some(MockSynthesizer::new()));

        let result = f.finalize("thanks you").await;

        assert_eq!(result.sentence, "thanks you");
        assert!(result.audio_path.is_some());
    }

    #[tokio::test]
    async fn empty_refinement_keeps_raw_phrase() {
        let f = finalizer(MockRefiner::new().with_response("   "), None);
        assert_eq!(f.refine("yes").await, "yes");
    }

    #[tokio::test]
    async fn synthesis_failure_leaves_audio_absent() {
        let f = finalizer(MockRefiner::new(), Some(MockSynthesizer::new().with_failure()));

        let result = f.finalize("good morning").await;

        assert_eq!(result.sentence, "good morning");
        assert_eq!(result.audio_path, None);
    }

    #[tokio::test]
    async fn no_synthesizer_means_no_audio() {
        let f = finalizer(MockRefiner::new(), None);
        assert_eq!(f.speak("hello").await, None);
    }
}

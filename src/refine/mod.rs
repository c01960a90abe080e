//! Sentence refinement and speech synthesis collaborators.

pub mod finalizer;
#[cfg(feature = "gemini")]
pub mod gemini;
pub mod refiner;
pub mod speech;

pub use finalizer::{FinalSentence, SentenceFinalizer};
#[cfg(feature = "gemini")]
pub use gemini::GeminiRefiner;
pub use refiner::{MockRefiner, PassthroughRefiner, Refiner, refinement_prompt};
pub use speech::{CommandSynthesizer, MockSynthesizer, Synthesizer, speech_file_stem};

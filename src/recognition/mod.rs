//! Windowed sign recognition: sliding window, label table and classifier.

pub mod classifier;
pub mod labels;
pub mod linear;
#[cfg(feature = "lstm-model")]
pub mod lstm;
pub mod window;

pub use classifier::{ClassificationResult, MockSignModel, SignClassifier, SignModel};
pub use labels::{LabelTable, SignLabel};
pub use linear::LinearSignModel;
#[cfg(feature = "lstm-model")]
pub use lstm::{LstmArchitecture, LstmSignModel};
pub use window::SlidingWindowBuffer;

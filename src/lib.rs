//! signstream - Real-time sign language to sentence streaming
//!
//! Per-frame landmarks are turned into fixed-length feature vectors, classified
//! over a sliding window, and segmented into sentences by pauses. Sentences are
//! refined, spoken, and streamed back to the client.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod app;
pub mod assets;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod landmarks;
pub mod logging;
pub mod recognition;
pub mod refine;
pub mod segmentation;
pub mod server;
pub mod session;

// Core traits (detect → classify → refine → speak)
pub use landmarks::LandmarkDetector;
pub use recognition::SignModel;
pub use refine::{Refiner, Synthesizer};
pub use session::Clock;

// Pipeline
pub use landmarks::{FeatureVector, FeatureVectorBuilder};
pub use recognition::{ClassificationResult, SignClassifier, SignLabel, SlidingWindowBuffer};
pub use segmentation::{SegmentEvent, SegmentationEngine};
pub use session::{SessionConfig, SessionCoordinator, SessionServices};

// Error handling
pub use error::{Result, SignStreamError};

// Config
pub use assets::SignAssetMap;
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.3.0+abc1234"` when git hash is available, `"0.3.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

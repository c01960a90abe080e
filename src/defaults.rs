//! Default configuration constants for signstream.
//!
//! Shared constants used across configuration types and pipeline stages.

/// Landmarks produced by the pose model, each carrying x, y, z and visibility.
pub const POSE_LANDMARKS: usize = 33;

/// Values per pose landmark (x, y, z, visibility).
pub const POSE_VALUES: usize = 4;

/// Landmarks in the face mesh, each carrying x, y, z.
pub const FACE_LANDMARKS: usize = 468;

/// Landmarks per hand, each carrying x, y, z.
pub const HAND_LANDMARKS: usize = 21;

/// Values per face or hand landmark (x, y, z).
pub const POINT_VALUES: usize = 3;

/// Length of one frame's feature vector.
///
/// pose (33×4) + face (468×3) + left hand (21×3) + right hand (21×3) = 1662.
pub const FEATURE_LEN: usize = POSE_LANDMARKS * POSE_VALUES
    + FACE_LANDMARKS * POINT_VALUES
    + 2 * HAND_LANDMARKS * POINT_VALUES;

/// Number of frames the sequence classifier consumes per prediction.
pub const WINDOW_LEN: usize = 30;

/// Silence after the last recognised sign before the sentence is closed.
pub const PAUSE_THRESHOLD_MS: u64 = 2000;

/// Label reported for frames without any usable hand landmarks.
pub const NO_HAND_LABEL: &str = "no_hand_detected";

/// Label reported when the model picks a class index missing from the label table.
pub const UNKNOWN_LABEL: &str = "unknown_sign";

/// Largest class index accepted in a label file.
pub const MAX_CLASS_INDEX: usize = 65_535;

/// Key of the mandatory fallback entry in the sign asset map.
pub const DEFAULT_ASSET_KEY: &str = "default";

/// Asset used when the sign asset map file is missing.
pub const DEFAULT_ASSET: &str = "unknown_sign.gif";

/// Per-session inbound frame queue capacity before the oldest frame is dropped.
pub const QUEUE_CAPACITY: usize = 8;

/// Minimum spacing between two processed frames of one session.
pub const MIN_FRAME_INTERVAL_MS: u64 = 50;

/// Maximum accepted length (in characters) of a text-to-sign request.
pub const MAX_TEXT_CHARS: usize = 500;

/// Default HTTP listen port.
pub const PORT: u16 = 8000;

/// Default Gemini model used for sentence refinement.
pub const REFINE_MODEL: &str = "gemini-pro";

/// Default directory for synthesized speech files.
pub const TTS_DIR: &str = "tts";

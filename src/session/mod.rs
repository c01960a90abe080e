//! Streaming sessions: one per client connection.

pub mod clock;
pub mod coordinator;
pub mod processor;
pub mod queue;

pub use clock::{Clock, ManualClock, SystemClock};
pub use coordinator::{SessionConfig, SessionCoordinator, SessionEnd, SessionServices, SessionSummary};
pub use processor::FrameProcessor;
pub use queue::{FrameReceiver, FrameSender, PushOutcome, Recv, frame_queue};

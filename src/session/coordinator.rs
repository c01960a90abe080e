//! Per-connection session orchestration.
//!
//! Each session runs three cooperating parts:
//!
//! ```text
//! inbound stream ──▶ FrameQueue ──▶ worker (blocking) ──▶ events ──▶ writer ──▶ outbound
//!                    drop-oldest    detect/classify/segment           refine/speak
//! ```
//!
//! The reader stamps each frame with its arrival time and never waits on
//! inference. The worker measures pauses on those stamps, so a slow model or
//! a writer busy finalizing never splits a sentence. The writer finalizes
//! sentences in boundary order. Closing the inbound stream cancels the session: pending
//! signs are discarded and nothing more is sent.

use crate::defaults;
use crate::landmarks::LandmarkDetector;
use crate::recognition::SignClassifier;
use crate::refine::SentenceFinalizer;
use crate::segmentation::SegmentEvent;
use crate::server::protocol::OutboundMessage;
use crate::session::clock::Clock;
use crate::session::processor::FrameProcessor;
use crate::session::queue::{FrameReceiver, PushOutcome, Recv, frame_queue};
use futures_util::{Stream, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use uuid::Uuid;

const EVENT_BUFFER: usize = 64;
const MIN_IDLE_TICK: Duration = Duration::from_millis(10);

/// Tunables for one session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Frames per classification window.
    pub window_len: usize,
    /// Silence that closes a sentence.
    pub pause: Duration,
    /// Frames buffered between reader and worker before the oldest is dropped.
    pub queue_capacity: usize,
    /// Minimum time the worker spends per frame. Zero disables pacing.
    pub min_frame_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            window_len: defaults::WINDOW_LEN,
            pause: Duration::from_millis(defaults::PAUSE_THRESHOLD_MS),
            queue_capacity: defaults::QUEUE_CAPACITY,
            min_frame_interval: Duration::from_millis(defaults::MIN_FRAME_INTERVAL_MS),
        }
    }
}

/// Read-only services shared by every session.
#[derive(Clone)]
pub struct SessionServices {
    pub detector: Arc<dyn LandmarkDetector>,
    pub classifier: SignClassifier,
    pub finalizer: SentenceFinalizer,
    pub clock: Arc<dyn Clock>,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The inbound stream closed.
    Disconnected,
    /// A frame payload could not be decoded.
    DecodeFailed,
    /// The outbound side stopped accepting messages.
    ClientGone,
}

/// Counters reported when a session ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub id: Uuid,
    pub end: SessionEnd,
    pub frames_received: u64,
    pub frames_processed: u64,
    pub frames_dropped: u64,
    pub sentences: u64,
    /// Accumulated signs thrown away at close.
    pub discarded: usize,
}

#[derive(Debug, Default)]
struct WorkerReport {
    frames_processed: u64,
    discarded: usize,
    decode_failed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterExit {
    EventsClosed,
    ClientGone,
}

/// Drives one streaming connection from first frame to close.
pub struct SessionCoordinator {
    id: Uuid,
    services: SessionServices,
    config: SessionConfig,
}

impl SessionCoordinator {
    pub fn new(services: SessionServices, config: SessionConfig) -> Self {
        Self {
            id: Uuid::now_v7(),
            services,
            config,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Run the session until `inbound` ends, a frame fails to decode, or
    /// `outbound` is closed.
    pub async fn run<I>(self, inbound: I, outbound: mpsc::Sender<OutboundMessage>) -> SessionSummary
    where
        I: Stream<Item = Vec<u8>> + Send,
    {
        let id = self.id;
        tracing::info!(session = %id, model = self.services.classifier.model_name(), "Session started");

        let (frames_tx, frames_rx) = frame_queue(self.config.queue_capacity);
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        let sentences = Arc::new(AtomicU64::new(0));

        let processor = FrameProcessor::new(
            Arc::clone(&self.services.detector),
            self.services.classifier.clone(),
            Arc::clone(&self.services.clock),
            self.config.window_len,
            self.config.pause,
        );
        let config = self.config.clone();
        let worker = tokio::task::spawn_blocking(move || {
            run_worker(id, processor, frames_rx, event_tx, &config)
        });

        let mut writer = tokio::spawn(forward_events(
            id,
            event_rx,
            self.services.finalizer.clone(),
            outbound,
            Arc::clone(&sentences),
        ));

        let clock = Arc::clone(&self.services.clock);
        let mut inbound = std::pin::pin!(inbound);
        let mut frames_received = 0u64;
        let writer_exit = loop {
            tokio::select! {
                frame = inbound.next() => match frame {
                    Some(payload) => {
                        frames_received += 1;
                        if frames_tx.push((payload, clock.now())) == PushOutcome::DroppedOldest {
                            tracing::debug!(session = %id, "Frame queue full, dropped oldest frame");
                        }
                    }
                    None => break None,
                },
                exit = &mut writer => break Some(exit),
            }
        };

        let frames_dropped = frames_tx.dropped();
        frames_tx.close();
        drop(frames_tx);

        if writer_exit.is_none() {
            writer.abort();
        }

        let report = match worker.await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(session = %id, error = %e, "Session worker panicked");
                WorkerReport::default()
            }
        };

        let end = match writer_exit {
            None => SessionEnd::Disconnected,
            Some(Ok(WriterExit::ClientGone)) => SessionEnd::ClientGone,
            Some(_) if report.decode_failed => SessionEnd::DecodeFailed,
            Some(_) => SessionEnd::ClientGone,
        };

        let summary = SessionSummary {
            id,
            end,
            frames_received,
            frames_processed: report.frames_processed,
            frames_dropped,
            sentences: sentences.load(Ordering::SeqCst),
            discarded: report.discarded,
        };
        tracing::info!(
            session = %id,
            end = ?summary.end,
            frames = summary.frames_processed,
            dropped = summary.frames_dropped,
            sentences = summary.sentences,
            "Session closed"
        );
        summary
    }
}

/// Worker loop, run on a blocking thread.
fn run_worker(
    id: Uuid,
    mut processor: FrameProcessor,
    frames: FrameReceiver<(Vec<u8>, Instant)>,
    events: mpsc::Sender<SegmentEvent>,
    config: &SessionConfig,
) -> WorkerReport {
    let idle_tick = (config.pause / 4).max(MIN_IDLE_TICK);
    let mut decode_failed = false;

    loop {
        let (batch, started) = match frames.recv_timeout(idle_tick) {
            Recv::Frame((payload, arrived)) => {
                let started = Instant::now();
                match processor.process_frame(&payload, arrived) {
                    Ok(batch) => (batch, Some(started)),
                    Err(e) => {
                        tracing::warn!(session = %id, error = %e, "Frame decode failed, ending session");
                        decode_failed = true;
                        break;
                    }
                }
            }
            Recv::Idle => (processor.idle(), None),
            Recv::Closed => break,
        };

        let mut client_gone = false;
        for event in batch {
            if events.blocking_send(event).is_err() {
                client_gone = true;
                break;
            }
        }
        if client_gone {
            break;
        }

        if let Some(started) = started {
            let elapsed = started.elapsed();
            if elapsed < config.min_frame_interval {
                std::thread::sleep(config.min_frame_interval - elapsed);
            }
        }
    }

    let discarded = processor.discard();
    if discarded > 0 {
        tracing::info!(session = %id, "discarding {discarded} accumulated signs");
    }

    WorkerReport {
        frames_processed: processor.frames_processed(),
        discarded,
        decode_failed,
    }
}

/// Writer loop: turns segmentation events into outbound messages in order.
async fn forward_events(
    id: Uuid,
    mut events: mpsc::Receiver<SegmentEvent>,
    finalizer: SentenceFinalizer,
    outbound: mpsc::Sender<OutboundMessage>,
    sentences: Arc<AtomicU64>,
) -> WriterExit {
    while let Some(event) = events.recv().await {
        let message = match event {
            SegmentEvent::Intermediate { label, confidence } => OutboundMessage::Intermediate {
                current_sign: label.to_string(),
                confidence,
            },
            SegmentEvent::Boundary { phrase } => {
                tracing::info!(session = %id, phrase = %phrase, "Sentence boundary");
                let sentence = finalizer.finalize(&phrase).await;
                sentences.fetch_add(1, Ordering::SeqCst);
                OutboundMessage::Final {
                    final_sentence: sentence.sentence,
                    audio_path: sentence.audio_path,
                }
            }
        };

        if outbound.send(message).await.is_err() {
            return WriterExit::ClientGone;
        }
    }
    WriterExit::EventsClosed
}

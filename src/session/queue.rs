//! Bounded per-session frame queue with drop-oldest overflow.
//!
//! Built on a crossbeam channel: the producer keeps a receiver clone so it
//! can evict the oldest queued frame when the consumer falls behind.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Result of pushing a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Queued,
    /// The queue was full; the oldest frame was discarded to make room.
    DroppedOldest,
    /// The consumer is gone; the frame was discarded.
    Closed,
}

/// Result of waiting for a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recv<T> {
    Frame(T),
    /// No frame arrived within the timeout.
    Idle,
    /// The producer closed or dropped the queue.
    Closed,
}

#[derive(Debug, Default)]
struct Shared {
    closed: AtomicBool,
    dropped: AtomicU64,
}

/// Producer half.
#[derive(Debug)]
pub struct FrameSender<T> {
    tx: Sender<T>,
    evict: Receiver<T>,
    shared: Arc<Shared>,
}

/// Consumer half.
#[derive(Debug)]
pub struct FrameReceiver<T> {
    rx: Receiver<T>,
    shared: Arc<Shared>,
}

/// Creates a queue holding at most `capacity` frames (at least one).
pub fn frame_queue<T>(capacity: usize) -> (FrameSender<T>, FrameReceiver<T>) {
    let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
    let shared = Arc::new(Shared::default());
    (
        FrameSender {
            tx,
            evict: rx.clone(),
            shared: Arc::clone(&shared),
        },
        FrameReceiver { rx, shared },
    )
}

impl<T> FrameSender<T> {
    pub fn push(&self, frame: T) -> PushOutcome {
        if self.shared.closed.load(Ordering::SeqCst) {
            return PushOutcome::Closed;
        }

        let mut frame = frame;
        let mut outcome = PushOutcome::Queued;
        loop {
            match self.tx.try_send(frame) {
                Ok(()) => return outcome,
                Err(TrySendError::Full(rejected)) => {
                    if self.evict.try_recv().is_ok() {
                        self.shared.dropped.fetch_add(1, Ordering::SeqCst);
                        outcome = PushOutcome::DroppedOldest;
                    }
                    frame = rejected;
                }
                Err(TrySendError::Disconnected(_)) => return PushOutcome::Closed,
            }
        }
    }

    /// Stop delivery: the consumer sees `Closed` on its next receive, even
    /// if frames are still queued.
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::SeqCst);
    }

    /// Frames discarded by overflow so far.
    pub fn dropped(&self) -> u64 {
        self.shared.dropped.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }
}

impl<T> FrameReceiver<T> {
    /// Waits up to `timeout` for the next frame.
    pub fn recv_timeout(&self, timeout: Duration) -> Recv<T> {
        if self.shared.closed.load(Ordering::SeqCst) {
            return Recv::Closed;
        }
        match self.rx.recv_timeout(timeout) {
            Ok(_) if self.shared.closed.load(Ordering::SeqCst) => Recv::Closed,
            Ok(frame) => Recv::Frame(frame),
            Err(RecvTimeoutError::Timeout) => Recv::Idle,
            Err(RecvTimeoutError::Disconnected) => Recv::Closed,
        }
    }

    pub fn dropped(&self) -> u64 {
        self.shared.dropped.load(Ordering::SeqCst)
    }
}

impl<T> Drop for FrameReceiver<T> {
    fn drop(&mut self) {
        self.shared.closed.store(true, Ordering::SeqCst);
    }
}

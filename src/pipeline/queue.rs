//! Bounded inter-stage queues with a drop-oldest overflow policy.
//!
//! Capture must never block: when a queue is full the oldest unconsumed
//! item is discarded to make room, a warning is logged on the first drop,
//! and a counter records the rest. `close()` rejects further pushes while
//! letting the consumer drain what is already queued.

use crossbeam_channel::{Receiver, Sender, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Outcome of a push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Item enqueued, nothing dropped.
    Pushed,
    /// Item enqueued after discarding the oldest queued item.
    PushedDroppingOldest,
    /// Queue is closed; item discarded.
    Closed,
}

/// Why a pop returned no item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopError {
    /// Nothing arrived within the timeout; the queue is still open.
    Timeout,
    /// Queue is closed and fully drained.
    Closed,
}

struct Shared<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
    closed: AtomicBool,
    dropped: AtomicU64,
    warned: AtomicBool,
    name: &'static str,
}

/// A bounded queue between two pipeline stages.
///
/// Clones share the same channel; the producer side holds one clone, the
/// consumer another.
pub struct ChunkQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for ChunkQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> ChunkQueue<T> {
    /// Create a queue holding at most `capacity` items.
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        Self {
            shared: Arc::new(Shared {
                tx,
                rx,
                closed: AtomicBool::new(false),
                dropped: AtomicU64::new(0),
                warned: AtomicBool::new(false),
                name,
            }),
        }
    }

    /// Enqueue an item, discarding the oldest queued item when full.
    ///
    /// Never blocks. Returns what happened so callers can account for
    /// drops.
    pub fn push(&self, item: T) -> PushOutcome {
        if self.shared.closed.load(Ordering::SeqCst) {
            return PushOutcome::Closed;
        }

        let mut dropped_any = false;
        let mut item = item;
        loop {
            match self.shared.tx.try_send(item) {
                Ok(()) => {
                    return if dropped_any {
                        PushOutcome::PushedDroppingOldest
                    } else {
                        PushOutcome::Pushed
                    };
                }
                Err(crossbeam_channel::TrySendError::Full(rejected)) => {
                    // Make room by discarding the oldest item. The consumer
                    // may win the race and pop it first; either way space
                    // opens up.
                    if self.shared.rx.try_recv().is_ok() {
                        let total = self.shared.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                        dropped_any = true;
                        if !self.shared.warned.swap(true, Ordering::Relaxed) {
                            eprintln!(
                                "refrain: {} queue full, dropping oldest item (consumer is behind real time); total dropped: {}",
                                self.shared.name, total
                            );
                        }
                    }
                    item = rejected;
                }
                Err(crossbeam_channel::TrySendError::Disconnected(_)) => {
                    // Both ends live in this struct, so this cannot happen
                    // while any clone exists.
                    return PushOutcome::Closed;
                }
            }
        }
    }

    /// Wait up to `timeout` for an item.
    ///
    /// Returns `PopError::Closed` once the queue is closed and drained, so
    /// consumers can finish their backlog before exiting.
    pub fn pop_timeout(&self, timeout: Duration) -> Result<T, PopError> {
        // Drain without waiting first so close + non-empty still yields items
        match self.shared.rx.try_recv() {
            Ok(item) => return Ok(item),
            Err(_) => {
                if self.shared.closed.load(Ordering::SeqCst) {
                    return Err(PopError::Closed);
                }
            }
        }

        match self.shared.rx.recv_timeout(timeout) {
            Ok(item) => Ok(item),
            Err(_) => {
                if self.shared.closed.load(Ordering::SeqCst) && self.shared.rx.is_empty() {
                    Err(PopError::Closed)
                } else {
                    Err(PopError::Timeout)
                }
            }
        }
    }

    /// Reject all future pushes. Queued items remain poppable.
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::SeqCst);
    }

    /// Whether the queue has been closed.
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Items currently queued.
    pub fn len(&self) -> usize {
        self.shared.rx.len()
    }

    /// Whether the queue is currently empty.
    pub fn is_empty(&self) -> bool {
        self.shared.rx.is_empty()
    }

    /// Total items discarded by the drop-oldest policy.
    pub fn dropped(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }
}

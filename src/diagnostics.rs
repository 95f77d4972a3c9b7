//! Interrupt-safe diagnostic event queue.
//!
//! The channel core emits [`ChannelEvent`]s from edge ISRs and from the
//! timer task.  Neither context may touch the logger, so events go into a
//! lock-free multi-producer queue and the main task drains and logs them
//! when it wakes.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────┐     ┌──────────────┐
//! │ Edge ISRs   │────▶│ DiagnosticQueue  │────▶│  Main task   │
//! │ Timer task  │────▶│ (mpmc, lock-free)│     │  (LogSink)   │
//! └─────────────┘     └──────────────────┘     └──────────────┘
//! ```
//!
//! Delivery is best-effort: a full queue drops the event and bumps a
//! counter.

use core::sync::atomic::{AtomicU32, Ordering};

use heapless::mpmc::MpMcQueue;

use crate::app::events::ChannelEvent;
use crate::app::ports::DiagnosticSink;

/// Maximum number of pending events.  Power of two (mpmc requirement).
pub const DIAG_QUEUE_CAP: usize = 32;

pub struct DiagnosticQueue {
    queue: MpMcQueue<ChannelEvent, DIAG_QUEUE_CAP>,
    dropped: AtomicU32,
}

impl Default for DiagnosticQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticQueue {
    pub const fn new() -> Self {
        Self {
            queue: MpMcQueue::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Push an event.  Safe to call from ISR context.
    /// Returns `false` if the queue is full (event dropped).
    pub fn push(&self, event: ChannelEvent) -> bool {
        if self.queue.enqueue(event).is_ok() {
            true
        } else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    pub fn pop(&self) -> Option<ChannelEvent> {
        self.queue.dequeue()
    }

    /// Drain all pending events into a callback, FIFO.
    pub fn drain(&self, mut handler: impl FnMut(ChannelEvent)) {
        while let Some(event) = self.pop() {
            handler(event);
        }
    }

    /// Events dropped since the last call; resets the counter.
    pub fn take_dropped(&self) -> u32 {
        self.dropped.swap(0, Ordering::Relaxed)
    }
}

impl DiagnosticSink for DiagnosticQueue {
    fn emit(&self, event: ChannelEvent) {
        self.push(event);
    }
}

//! Command queue - the double buffer between producers and the consumer
//!
//! Two command lists and a write-target flag behind one mutex. `push` locks
//! only long enough to append; `drain_and_swap` locks only long enough to
//! flip the flag and take the former write list, then owns it exclusively
//! with no further locking. The O(n) apply phase therefore never holds the
//! lock, and a `push` never waits on anything longer than another append.
//!
//! Ordering: commands from a single producer task drain in that task's push
//! order. Relative order across tasks is unspecified.

use parking_lot::Mutex;
use thiserror::Error;

use crate::command::Command;

/// Queue growth within one frame is unbounded unless a capacity is set;
/// either way the depth is tracked here for monitoring.
#[derive(Clone, Copy, Debug, Default)]
pub struct QueueStats {
    /// Commands accepted by `push`
    pub pushed: u64,
    /// Commands handed to the consumer
    pub drained: u64,
    /// Commands rejected by the capacity cap
    pub rejected: u64,
    /// Deepest write list ever observed
    pub peak_depth: usize,
    /// Number of swaps performed
    pub swaps: u64,
}

/// `push` failed because the configured capacity was reached this frame
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("command queue is full ({capacity} commands)")]
pub struct QueueFull {
    pub capacity: usize,
}

struct QueueInner {
    /// The two lists. `write` indexes the one producers append to; the other
    /// belongs to the consumer between swaps.
    buffers: [Vec<Command>; 2],
    write: usize,
    stats: QueueStats,
}

/// The command double buffer
pub struct CommandQueue {
    inner: Mutex<QueueInner>,
    capacity: Option<usize>,
}

impl CommandQueue {
    /// Create a queue. `capacity` bounds the write list per frame;
    /// `None` leaves growth unbounded.
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                buffers: [Vec::new(), Vec::new()],
                write: 0,
                stats: QueueStats::default(),
            }),
            capacity,
        }
    }

    /// Append a command to the current write list.
    ///
    /// Callable from any producer thread at any time, including while the
    /// consumer is applying the other list.
    pub fn push(&self, command: Command) -> Result<(), QueueFull> {
        let mut inner = self.inner.lock();
        let write = inner.write;

        if let Some(capacity) = self.capacity {
            if inner.buffers[write].len() >= capacity {
                inner.stats.rejected += 1;
                drop(inner);
                log::warn!("command queue full ({} commands), rejecting push", capacity);
                return Err(QueueFull { capacity });
            }
        }

        inner.buffers[write].push(command);
        inner.stats.pushed += 1;
        let depth = inner.buffers[write].len();
        if depth > inner.stats.peak_depth {
            inner.stats.peak_depth = depth;
        }
        Ok(())
    }

    /// Flip the write target and take the former write list.
    ///
    /// Callable only by the consumer thread, once per frame. The returned
    /// list is owned; applying it needs no lock. The list handed back by the
    /// previous call has been drained by then, so flipping onto it is safe.
    pub fn drain_and_swap(&self) -> Vec<Command> {
        let mut inner = self.inner.lock();
        let read = inner.write;
        inner.write ^= 1;
        let drained = std::mem::take(&mut inner.buffers[read]);
        inner.stats.drained += drained.len() as u64;
        inner.stats.swaps += 1;
        drained
    }

    /// Current depth of the write list
    pub fn depth(&self) -> usize {
        let inner = self.inner.lock();
        inner.buffers[inner.write].len()
    }

    /// Snapshot of queue statistics
    pub fn stats(&self) -> QueueStats {
        self.inner.lock().stats
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new(None)
    }
}

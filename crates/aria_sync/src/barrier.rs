//! Frame barrier - task registry plus the end-of-frame rendezvous
//!
//! The barrier tracks which producer tasks exist and which have signaled
//! "done for this frame". The consumer sleeps on a condition variable until
//! the waiting set equals the registered set; producers sleep on a second
//! condition variable until the consumer has swapped the command buffer and
//! advanced the frame counter, then are released together by a broadcast.
//!
//! Both waits use the monitor pattern: one mutex, an explicit boolean
//! predicate, and a `while` loop around the wait, so spurious wakeups and
//! missed notifications cannot corrupt the handshake.
//!
//! State machine: Idle (no tasks) -> Armed (some registered, not all
//! waiting) -> Ready (waiting == registered) -> fires -> Armed. With zero
//! registered tasks the barrier reports ready immediately and the consumer
//! free-runs.

use std::collections::HashSet;
use std::time::Duration;

use aria_core::{TaskId, TaskIdAllocator};
use parking_lot::{Condvar, Mutex};
use thiserror::Error;

/// Producer-side misuse of the barrier
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum BarrierError {
    /// The task was never registered, or has already been unregistered
    #[error("{0} is not registered with the frame barrier")]
    UnknownTask(TaskId),
    /// The task signaled twice without the frame advancing in between
    #[error("{0} waited twice without frame progress")]
    AlreadyWaiting(TaskId),
}

#[derive(Default)]
struct BarrierState {
    registered: HashSet<TaskId>,
    waiting: HashSet<TaskId>,
    /// Monotonic frame counter; advancing it is what releases producers
    frame: u64,
}

impl BarrierState {
    /// Every registered task has signaled (vacuously true with no tasks).
    /// `waiting` only ever holds registered IDs, so comparing lengths is
    /// exactly set equality.
    fn ready(&self) -> bool {
        self.waiting.len() == self.registered.len()
    }
}

/// The frame barrier and producer task registry
pub struct FrameBarrier {
    state: Mutex<BarrierState>,
    consumer_cv: Condvar,
    producer_cv: Condvar,
    task_ids: TaskIdAllocator,
    /// How long the consumer waits before logging which tasks are stalling
    stall_warn: Duration,
}

impl FrameBarrier {
    /// Create a barrier. `stall_warn` controls how often the consumer's wait
    /// names tasks that registered but never signaled.
    pub fn new(stall_warn: Duration) -> Self {
        Self {
            state: Mutex::new(BarrierState::default()),
            consumer_cv: Condvar::new(),
            producer_cv: Condvar::new(),
            task_ids: TaskIdAllocator::new(),
            stall_warn,
        }
    }

    /// Register a new producer task, arming the barrier
    pub fn register_task(&self) -> TaskId {
        let id = self.task_ids.next();
        self.state.lock().registered.insert(id);
        log::debug!("{} registered with frame barrier", id);
        id
    }

    /// Remove a task from the registry.
    ///
    /// Called on task termination. Removing the last laggard can itself
    /// complete the barrier, so the consumer is re-checked here; otherwise a
    /// dying task would stall every other producer forever.
    pub fn unregister_task(&self, id: TaskId) {
        let mut state = self.state.lock();
        state.registered.remove(&id);
        state.waiting.remove(&id);
        log::debug!("{} unregistered from frame barrier", id);
        if state.ready() {
            self.consumer_cv.notify_one();
        }
    }

    /// Signal "done for this frame" and suspend until the next frame begins.
    ///
    /// Blocks only on the barrier's own short-held lock plus the actual
    /// frame sleep; it never blocks on rendering work directly.
    pub fn wait_for_next_frame(&self, id: TaskId) -> Result<(), BarrierError> {
        let mut state = self.state.lock();
        if !state.registered.contains(&id) {
            return Err(BarrierError::UnknownTask(id));
        }
        if !state.waiting.insert(id) {
            // Two callers sharing one TaskId, or a task host driving the
            // same task from two threads.
            return Err(BarrierError::AlreadyWaiting(id));
        }
        if state.ready() {
            self.consumer_cv.notify_one();
        }

        let resume_at = state.frame + 1;
        while state.frame < resume_at {
            self.producer_cv.wait(&mut state);
        }
        Ok(())
    }

    /// Consumer side: sleep until every registered task has signaled.
    ///
    /// Wakes early on a timeout only to log a stall diagnostic naming the
    /// tasks that registered but never called
    /// [`wait_for_next_frame`](Self::wait_for_next_frame), then goes back to
    /// sleep. Never spins.
    pub fn wait_until_ready(&self) {
        let mut state = self.state.lock();
        while !state.ready() {
            let timed_out = self
                .consumer_cv
                .wait_for(&mut state, self.stall_warn)
                .timed_out();
            if timed_out && !state.ready() {
                let laggards: Vec<TaskId> = state
                    .registered
                    .difference(&state.waiting)
                    .copied()
                    .collect();
                log::warn!(
                    "frame {} barrier stalled for {:?}: {} of {} tasks not waiting: {:?}",
                    state.frame,
                    self.stall_warn,
                    laggards.len(),
                    state.registered.len(),
                    laggards
                );
            }
        }
    }

    /// Consumer side: begin the next frame and release all producers.
    ///
    /// Must be called only after the command buffer swap for the new frame
    /// has completed; producers released before the swap would append to the
    /// list the consumer is about to apply.
    pub fn release(&self) {
        let mut state = self.state.lock();
        state.waiting.clear();
        state.frame += 1;
        self.producer_cv.notify_all();
    }

    /// Current frame number
    pub fn frame(&self) -> u64 {
        self.state.lock().frame
    }

    /// Number of registered producer tasks
    pub fn registered_count(&self) -> usize {
        self.state.lock().registered.len()
    }

    /// Number of tasks currently waiting for the next frame
    pub fn waiting_count(&self) -> usize {
        self.state.lock().waiting.len()
    }
}

impl Default for FrameBarrier {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_unregistered_task_is_rejected() {
        let barrier = FrameBarrier::default();
        let err = barrier.wait_for_next_frame(TaskId::from_raw(99));
        assert_eq!(err, Err(BarrierError::UnknownTask(TaskId::from_raw(99))));
    }

    #[test]
    fn test_ready_with_no_tasks() {
        let barrier = FrameBarrier::default();
        // Must return immediately: nothing is registered.
        barrier.wait_until_ready();
        barrier.release();
        assert_eq!(barrier.frame(), 1);
    }

    #[test]
    fn test_unregister_completes_barrier() {
        let barrier = Arc::new(FrameBarrier::default());
        let waiter = barrier.register_task();
        let laggard = barrier.register_task();

        let producer = {
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || barrier.wait_for_next_frame(waiter).unwrap())
        };

        // Wait until the first task has signaled.
        while barrier.waiting_count() < 1 {
            std::thread::yield_now();
        }

        // The laggard dies without ever signaling; the barrier must still fire.
        barrier.unregister_task(laggard);
        barrier.wait_until_ready();
        barrier.release();
        producer.join().unwrap();
    }

    #[test]
    fn test_single_task_round_trip() {
        let barrier = Arc::new(FrameBarrier::default());
        let id = barrier.register_task();

        let producer = {
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                for _ in 0..3 {
                    barrier.wait_for_next_frame(id).unwrap();
                }
                barrier.unregister_task(id);
            })
        };

        for _ in 0..3 {
            barrier.wait_until_ready();
            barrier.release();
        }
        producer.join().unwrap();
        assert_eq!(barrier.frame(), 3);
        assert_eq!(barrier.registered_count(), 0);
    }

    #[test]
    fn test_double_wait_is_rejected() {
        let barrier = Arc::new(FrameBarrier::default());
        let id = barrier.register_task();
        // A second task keeps the barrier from firing while the first blocks.
        let holdoff = barrier.register_task();

        let producer = {
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || barrier.wait_for_next_frame(id).unwrap())
        };

        while barrier.waiting_count() < 1 {
            std::thread::yield_now();
        }

        // Same TaskId signaling again from another thread, no frame progress
        // in between.
        assert_eq!(
            barrier.wait_for_next_frame(id),
            Err(BarrierError::AlreadyWaiting(id))
        );

        barrier.unregister_task(holdoff);
        barrier.wait_until_ready();
        barrier.release();
        producer.join().unwrap();
    }

    #[test]
    fn test_consumer_wait_survives_stall_timeouts() {
        use std::time::Instant;

        // Short stall window so the consumer's timed wait expires (and logs
        // its laggard diagnostic) several times before the task signals.
        let barrier = Arc::new(FrameBarrier::new(Duration::from_millis(10)));
        let id = barrier.register_task();

        let consumer = {
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || {
                barrier.wait_until_ready();
                barrier.release();
            })
        };

        let start = Instant::now();
        std::thread::sleep(Duration::from_millis(50));
        barrier.wait_for_next_frame(id).unwrap();
        consumer.join().unwrap();

        // The consumer sat through multiple timeouts without firing early.
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert_eq!(barrier.frame(), 1);
    }

    #[test]
    fn test_waiting_set_clears_on_release() {
        let barrier = Arc::new(FrameBarrier::default());
        let id = barrier.register_task();

        let producer = {
            let barrier = Arc::clone(&barrier);
            std::thread::spawn(move || barrier.wait_for_next_frame(id).unwrap())
        };

        barrier.wait_until_ready();
        assert_eq!(barrier.waiting_count(), 1);
        barrier.release();
        producer.join().unwrap();
        assert_eq!(barrier.waiting_count(), 0);
    }
}

//! Consumer-side frame loop
//!
//! Runs on the render thread. Each frame: wait at the barrier until every
//! registered producer is parked, swap the command buffers, apply the drained
//! batch to the consumer store, run the destroy-cleanup hook, then release
//! the producers into the next frame. Rendering proper happens after
//! `run_frame` returns, against the consumer store only.

use std::sync::Arc;

use aria_core::NodeId;
use aria_scene::{ConsumerStore, Node};
use aria_sync::{apply_all, QueueStats};

use crate::context::SyncContext;

/// Per-frame tally, suitable for stats logging
#[derive(Debug, Clone, Copy)]
pub struct FrameReport {
    /// Frame number after this frame's release
    pub frame: u64,
    /// Commands drained from the queue
    pub drained: usize,
    pub applied: usize,
    pub dropped: usize,
    /// Nodes destroyed this frame
    pub destroyed: usize,
}

type CleanupFn = Box<dyn FnMut(&Node) + Send>;

pub struct RenderLoop {
    ctx: Arc<SyncContext>,
    store: ConsumerStore,
    cleanup: Option<CleanupFn>,
}

impl RenderLoop {
    pub fn new(ctx: Arc<SyncContext>) -> Self {
        Self {
            ctx,
            store: ConsumerStore::new(),
            cleanup: None,
        }
    }

    /// Hook invoked once per destroyed node, after the frame's commands have
    /// been applied. This is where GPU-side resources get freed.
    pub fn on_destroy(&mut self, f: impl FnMut(&Node) + Send + 'static) {
        self.cleanup = Some(Box::new(f));
    }

    /// Run one frame of the synchronization cycle
    pub fn run_frame(&mut self) -> FrameReport {
        self.ctx.barrier().wait_until_ready();
        let commands = self.ctx.queue().drain_and_swap();

        let drained = commands.len();
        let report = apply_all(commands, &mut self.store, self.ctx.window());
        if let Some(cleanup) = &mut self.cleanup {
            for node in &report.destroyed {
                cleanup(node);
            }
        }

        // Release strictly after the swap; producers resume into the other
        // buffer while the caller renders this frame.
        self.ctx.barrier().release();

        let frame = self.ctx.barrier().frame();
        log::trace!(
            "frame {}: drained {} applied {} dropped {}",
            frame,
            drained,
            report.applied,
            report.dropped
        );
        FrameReport {
            frame,
            drained,
            applied: report.applied,
            dropped: report.dropped,
            destroyed: report.destroyed.len(),
        }
    }

    /// The consumer-side scene, stable between frames
    pub fn store(&self) -> &ConsumerStore {
        &self.store
    }

    /// Look up a node in the consumer-side scene
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.store.get(id)
    }

    pub fn queue_stats(&self) -> QueueStats {
        self.ctx.queue().stats()
    }

    /// Whether a close has been requested through the window state
    pub fn close_requested(&self) -> bool {
        self.ctx.window().lock().close_requested
    }
}

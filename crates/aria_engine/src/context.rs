//! Shared synchronization context
//!
//! One [`SyncContext`] is shared (via `Arc`) between every producer task and
//! the render loop. It owns the four pieces of cross-thread state: the
//! command queue, the frame barrier, the producer-side scene store, and the
//! pending window state. Nothing in it hands out references to nodes across
//! the thread boundary; everything travels by ID and by value.

use std::collections::HashMap;
use std::sync::Arc;

use aria_core::{NodeId, NodeIdAllocator, TaskId};
use aria_scene::ProducerStore;
use aria_sync::{CommandQueue, FrameBarrier, WindowState};
use parking_lot::{Mutex, RwLock};

use crate::config::EngineConfig;
use crate::producer::ProducerHandle;

pub struct SyncContext {
    queue: CommandQueue,
    barrier: FrameBarrier,
    node_ids: NodeIdAllocator,
    /// Producer-side scene twin. Lock is held only for the duration of a
    /// single lookup or field write, never across an enqueue.
    nodes: RwLock<ProducerStore>,
    /// Which task may mutate which node. `None` marks a released node any
    /// task may adopt.
    owners: Mutex<HashMap<NodeId, Option<TaskId>>>,
    window: Mutex<WindowState>,
}

impl SyncContext {
    pub fn new(config: &EngineConfig) -> Arc<Self> {
        let window = WindowState {
            title: config.window.title.clone(),
            width: config.window.width,
            height: config.window.height,
            fullscreen: config.window.fullscreen,
            ..WindowState::default()
        };
        Arc::new(Self {
            queue: CommandQueue::new(config.sync.queue_capacity),
            barrier: FrameBarrier::new(config.sync.stall_warn()),
            node_ids: NodeIdAllocator::new(),
            nodes: RwLock::new(ProducerStore::new()),
            owners: Mutex::new(HashMap::new()),
            window: Mutex::new(window),
        })
    }

    /// Register a new producer task and hand back its handle
    pub fn spawn_producer(self: &Arc<Self>) -> ProducerHandle {
        let task = self.barrier.register_task();
        log::debug!("producer {} registered", task);
        ProducerHandle::new(Arc::clone(self), task)
    }

    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    pub fn barrier(&self) -> &FrameBarrier {
        &self.barrier
    }

    pub fn window(&self) -> &Mutex<WindowState> {
        &self.window
    }

    pub(crate) fn alloc_node_id(&self) -> NodeId {
        self.node_ids.next()
    }

    pub(crate) fn nodes(&self) -> &RwLock<ProducerStore> {
        &self.nodes
    }

    pub(crate) fn owners(&self) -> &Mutex<HashMap<NodeId, Option<TaskId>>> {
        &self.owners
    }

    /// Number of live nodes on the producer side
    pub fn live_nodes(&self) -> usize {
        self.nodes.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_starts_empty() {
        let ctx = SyncContext::new(&EngineConfig::default());
        assert_eq!(ctx.live_nodes(), 0);
        assert_eq!(ctx.barrier().registered_count(), 0);
        assert_eq!(ctx.queue().depth(), 0);
    }

    #[test]
    fn test_window_seeded_from_config() {
        let mut config = EngineConfig::default();
        config.window.title = "seeded".to_string();
        config.window.width = 640;
        let ctx = SyncContext::new(&config);
        let window = ctx.window().lock();
        assert_eq!(window.title, "seeded");
        assert_eq!(window.width, 640);
    }

    #[test]
    fn test_spawn_producer_registers_task() {
        let ctx = SyncContext::new(&EngineConfig::default());
        let _a = ctx.spawn_producer();
        let _b = ctx.spawn_producer();
        assert_eq!(ctx.barrier().registered_count(), 2);
    }
}

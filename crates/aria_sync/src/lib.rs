//! # aria_sync - Producer/Consumer Scene Synchronization
//!
//! The machinery that carries scene mutations from many concurrently
//! scheduled producer tasks to the single render thread:
//!
//! - [`Command`] - an immutable, value-captured mutation record
//! - [`CommandQueue`] - two command lists swapped under one short-held lock
//! - [`FrameBarrier`] - releases the consumer only once every registered
//!   producer task has signaled "done for this frame"
//! - [`apply`] - applies a drained command list to the consumer store
//!
//! ```text
//! producer tasks ──► CommandQueue (write list) ─┐
//!       │                                       │ drain_and_swap, once per frame
//!       ▼                                       ▼
//! FrameBarrier ◄── wait_for_next_frame    consumer applies ──► ConsumerStore
//!       │                                       │
//!       └────────── release (broadcast) ◄───────┘
//! ```
//!
//! Commands never hold pointers into producer memory; everything they need is
//! copied by value at enqueue time. That is the whole reason a cross-thread
//! `apply` is safe without locking either node store.

pub mod apply;
pub mod barrier;
pub mod command;
pub mod queue;
pub mod window;

pub use apply::{apply, apply_all, ApplyOutcome, ApplyReport};
pub use barrier::{BarrierError, FrameBarrier};
pub use command::{
    CameraCommand, Command, CommandError, EffectOp, GeometryOp, HierarchyCommand, HierarchyOp,
    LightCommand, MaterialOp, MeshOp, NodeOp, SceneOp, TextureOp, TransformField,
};
pub use queue::{CommandQueue, QueueFull, QueueStats};
pub use window::{WindowCommand, WindowState};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::apply::{apply_all, ApplyReport};
    pub use crate::barrier::{BarrierError, FrameBarrier};
    pub use crate::command::{Command, CommandError, TransformField};
    pub use crate::queue::{CommandQueue, QueueStats};
    pub use crate::window::{WindowCommand, WindowState};
}

//! Engine bridge between producer tasks and the render thread.
//!
//! This crate wires the synchronization primitives from `aria_sync` into a
//! usable engine surface:
//!
//! - [`SyncContext`] owns the shared state (queue, barrier, producer store,
//!   window state) and is cloned by `Arc` into every thread.
//! - [`ProducerHandle`] is the per-task scene API. Create one per script
//!   thread with [`SyncContext::spawn_producer`].
//! - [`RenderLoop`] drives the consumer side, one
//!   [`run_frame`](RenderLoop::run_frame) call per video frame.
//! - [`EngineConfig`] is the TOML-backed configuration for all of the above.

pub mod config;
pub mod context;
pub mod producer;
pub mod render;

pub use config::{ConfigError, EngineConfig, SyncConfig, WindowConfig};
pub use context::SyncContext;
pub use producer::{ProducerError, ProducerHandle};
pub use render::{FrameReport, RenderLoop};

pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::context::SyncContext;
    pub use crate::producer::{ProducerError, ProducerHandle};
    pub use crate::render::{FrameReport, RenderLoop};
    pub use aria_scene::prelude::*;
    pub use aria_sync::prelude::*;
}

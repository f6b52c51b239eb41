//! # aria_core - Aria Engine Core
//!
//! Zero-dependency identifier primitives shared by every other crate.
//! A `NodeId` names a scene entity on both sides of the producer/consumer
//! boundary; a `TaskId` names a registered producer script.

pub mod id;

pub use id::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::id::{NodeId, NodeIdAllocator, TaskId, TaskIdAllocator};
}

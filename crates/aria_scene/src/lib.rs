//! # aria_scene - Scene Node Model
//!
//! The tree of positioned entities that both sides of the sync boundary
//! mirror structurally. Two independent [`NodeStore`] instances exist at
//! runtime: one owned by the producer side (the scripting VM), one by the
//! consumer side (the render thread). The store side is a type parameter, so
//! a lookup against the wrong store does not compile.
//!
//! This crate holds only data; all cross-thread movement of scene state goes
//! through `aria_sync` commands.

pub mod node;
pub mod resources;
pub mod store;
pub mod transform;

pub use node::{Node, NodeData, NodeKind, Spatial};
pub use resources::{
    Attribute, CameraParams, EffectData, GeometryData, LightKind, LightParams, MaterialData,
    MaterialOption, Projection, SamplerFilter, SamplerParams, SamplerWrap, TextureData,
    TextureSource, UniformValue,
};
pub use store::{ConsumerSide, ConsumerStore, NodeStore, ProducerSide, ProducerStore};
pub use transform::Transform;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::node::{Node, NodeData, NodeKind, Spatial};
    pub use crate::resources::*;
    pub use crate::store::{ConsumerStore, NodeStore, ProducerStore};
    pub use crate::transform::Transform;
    pub use aria_core::prelude::*;
}

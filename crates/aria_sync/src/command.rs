//! Commands - value-captured scene mutations
//!
//! A command captures a target [`NodeId`] and a copy of the changed fields at
//! enqueue time. It is constructed on a producer thread, travels through the
//! [`CommandQueue`](crate::queue::CommandQueue), and is applied to the
//! consumer store by the render thread. Commands are grouped by the node
//! aspect they touch, each group a small closed op set, so the apply match is
//! exhaustive and a new mutation kind cannot be forgotten.
//!
//! Malformed payloads (attribute component-count mismatches, wrong pixel
//! buffer sizes) are rejected here, at construction on the producer thread -
//! never deferred to apply time.

use aria_core::NodeId;
use aria_scene::{
    Attribute, CameraParams, LightParams, MaterialOption, Node, SamplerParams, UniformValue,
};
use glam::{Quat, Vec3};
use thiserror::Error;

use crate::window::WindowCommand;

/// A payload the producer refused to turn into a command
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CommandError {
    #[error("attribute '{name}': component count {components} outside 1..=4")]
    AttributeComponents { name: String, components: u32 },
    #[error("attribute '{name}': {len} floats is not a multiple of {components} components")]
    AttributeSizeMismatch {
        name: String,
        components: u32,
        len: usize,
    },
    #[error("texture dimensions {width}x{height} must be non-zero")]
    TextureZeroDimension { width: u32, height: u32 },
    #[error("texture payload is {len} bytes, expected {expected} for {width}x{height} rgba8")]
    TexturePayloadSize {
        width: u32,
        height: u32,
        len: usize,
        expected: usize,
    },
}

/// Node lifecycle and identity operations
#[derive(Clone, Debug, PartialEq)]
pub enum NodeOp {
    /// Snapshot of the node at creation time. Always the first command ever
    /// enqueued for its ID.
    Create(Box<Node>),
    /// Remove the consumer twin and retire the ID
    Destroy(NodeId),
    SetName { id: NodeId, name: String },
}

/// One changed transform field, captured by value
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransformField {
    Position(Vec3),
    Rotation(Quat),
    Scale(Vec3),
}

/// Parent/child relationship change between two spatial nodes
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HierarchyCommand {
    pub parent: NodeId,
    pub child: NodeId,
    pub op: HierarchyOp,
}

/// What to do with the relationship
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HierarchyOp {
    Add,
    Remove,
}

/// Mesh resource bindings (by ID, never by pointer)
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MeshOp {
    BindGeometry(NodeId),
    BindMaterial(NodeId),
}

/// Scene-root operations
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SceneOp {
    SetBackground(Vec3),
}

/// Geometry buffer uploads
#[derive(Clone, Debug, PartialEq)]
pub enum GeometryOp {
    SetAttribute { name: String, attribute: Attribute },
    SetIndices(Option<Vec<u32>>),
}

/// Material bag updates
#[derive(Clone, Debug, PartialEq)]
pub enum MaterialOp {
    SetUniform { name: String, value: UniformValue },
    SetOption { name: String, value: MaterialOption },
}

/// Texture payload and sampler updates
#[derive(Clone, Debug, PartialEq)]
pub enum TextureOp {
    SetPixels {
        width: u32,
        height: u32,
        data: Vec<u8>,
    },
    SetPath(String),
    SetSampler(SamplerParams),
}

/// Full light parameter set (small enough to copy whole)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightCommand {
    pub id: NodeId,
    pub params: LightParams,
}

/// Full camera parameter set
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraCommand {
    pub id: NodeId,
    pub params: CameraParams,
}

/// Post-process chain operations
#[derive(Clone, Debug, PartialEq)]
pub enum EffectOp {
    /// Link this effect's output into `next` (`None` = screen)
    Link(Option<NodeId>),
    Bypass(bool),
    SetUniform { name: String, value: UniformValue },
}

/// The closed set of mutations that cross the producer/consumer boundary
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Node(NodeOp),
    Transform { id: NodeId, field: TransformField },
    Hierarchy(HierarchyCommand),
    Mesh { id: NodeId, op: MeshOp },
    Scene { id: NodeId, op: SceneOp },
    Geometry { id: NodeId, op: GeometryOp },
    Material { id: NodeId, op: MaterialOp },
    Texture { id: NodeId, op: TextureOp },
    Light(LightCommand),
    Camera(CameraCommand),
    Effect { id: NodeId, op: EffectOp },
    /// Applied to the shared window state rather than a node
    Window(WindowCommand),
}

impl Command {
    /// Creation snapshot for a freshly registered producer node
    pub fn create(node: Node) -> Self {
        Self::Node(NodeOp::Create(Box::new(node)))
    }

    /// Destroy a node, retiring its ID
    pub fn destroy(id: NodeId) -> Self {
        Self::Node(NodeOp::Destroy(id))
    }

    /// Rename a node
    pub fn set_name(id: NodeId, name: impl Into<String>) -> Self {
        Self::Node(NodeOp::SetName {
            id,
            name: name.into(),
        })
    }

    /// Set a node's position
    pub fn set_position(id: NodeId, position: Vec3) -> Self {
        Self::Transform {
            id,
            field: TransformField::Position(position),
        }
    }

    /// Set a node's rotation
    pub fn set_rotation(id: NodeId, rotation: Quat) -> Self {
        Self::Transform {
            id,
            field: TransformField::Rotation(rotation),
        }
    }

    /// Set a node's scale
    pub fn set_scale(id: NodeId, scale: Vec3) -> Self {
        Self::Transform {
            id,
            field: TransformField::Scale(scale),
        }
    }

    /// Attach `child` under `parent`
    pub fn add_child(parent: NodeId, child: NodeId) -> Self {
        Self::Hierarchy(HierarchyCommand {
            parent,
            child,
            op: HierarchyOp::Add,
        })
    }

    /// Detach `child` from `parent`
    pub fn remove_child(parent: NodeId, child: NodeId) -> Self {
        Self::Hierarchy(HierarchyCommand {
            parent,
            child,
            op: HierarchyOp::Remove,
        })
    }

    /// Bind a geometry resource to a mesh
    pub fn bind_geometry(mesh: NodeId, geometry: NodeId) -> Self {
        Self::Mesh {
            id: mesh,
            op: MeshOp::BindGeometry(geometry),
        }
    }

    /// Bind a material resource to a mesh
    pub fn bind_material(mesh: NodeId, material: NodeId) -> Self {
        Self::Mesh {
            id: mesh,
            op: MeshOp::BindMaterial(material),
        }
    }

    /// Set the scene background color
    pub fn set_background(scene: NodeId, color: Vec3) -> Self {
        Self::Scene {
            id: scene,
            op: SceneOp::SetBackground(color),
        }
    }

    /// Upload a vertex attribute, validating its shape first
    pub fn set_geometry_attribute(
        id: NodeId,
        name: impl Into<String>,
        components: u32,
        data: Vec<f32>,
    ) -> Result<Self, CommandError> {
        let name = name.into();
        if !(1..=4).contains(&components) {
            return Err(CommandError::AttributeComponents { name, components });
        }
        if data.len() % components as usize != 0 {
            return Err(CommandError::AttributeSizeMismatch {
                name,
                components,
                len: data.len(),
            });
        }
        Ok(Self::Geometry {
            id,
            op: GeometryOp::SetAttribute {
                name,
                attribute: Attribute { components, data },
            },
        })
    }

    /// Replace the index buffer (`None` = non-indexed)
    pub fn set_geometry_indices(id: NodeId, indices: Option<Vec<u32>>) -> Self {
        Self::Geometry {
            id,
            op: GeometryOp::SetIndices(indices),
        }
    }

    /// Set a material uniform
    pub fn set_uniform(id: NodeId, name: impl Into<String>, value: UniformValue) -> Self {
        Self::Material {
            id,
            op: MaterialOp::SetUniform {
                name: name.into(),
                value,
            },
        }
    }

    /// Set a material render option
    pub fn set_option(id: NodeId, name: impl Into<String>, value: MaterialOption) -> Self {
        Self::Material {
            id,
            op: MaterialOp::SetOption {
                name: name.into(),
                value,
            },
        }
    }

    /// Upload RGBA8 pixels, validating the buffer size first
    pub fn set_texture_pixels(
        id: NodeId,
        width: u32,
        height: u32,
        data: Vec<u8>,
    ) -> Result<Self, CommandError> {
        if width == 0 || height == 0 {
            return Err(CommandError::TextureZeroDimension { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(CommandError::TexturePayloadSize {
                width,
                height,
                len: data.len(),
                expected,
            });
        }
        Ok(Self::Texture {
            id,
            op: TextureOp::SetPixels {
                width,
                height,
                data,
            },
        })
    }

    /// Point a texture at a file path
    pub fn set_texture_path(id: NodeId, path: impl Into<String>) -> Self {
        Self::Texture {
            id,
            op: TextureOp::SetPath(path.into()),
        }
    }

    /// Replace a texture's sampler params
    pub fn set_texture_sampler(id: NodeId, sampler: SamplerParams) -> Self {
        Self::Texture {
            id,
            op: TextureOp::SetSampler(sampler),
        }
    }

    /// Replace a light's parameter set
    pub fn set_light(id: NodeId, params: LightParams) -> Self {
        Self::Light(LightCommand { id, params })
    }

    /// Replace a camera's parameter set
    pub fn set_camera(id: NodeId, params: CameraParams) -> Self {
        Self::Camera(CameraCommand { id, params })
    }

    /// Link an effect's output into the chain
    pub fn effect_link(id: NodeId, next: Option<NodeId>) -> Self {
        Self::Effect {
            id,
            op: EffectOp::Link(next),
        }
    }

    /// Toggle an effect's bypass
    pub fn effect_bypass(id: NodeId, bypass: bool) -> Self {
        Self::Effect {
            id,
            op: EffectOp::Bypass(bypass),
        }
    }

    /// Set an effect uniform
    pub fn effect_uniform(id: NodeId, name: impl Into<String>, value: UniformValue) -> Self {
        Self::Effect {
            id,
            op: EffectOp::SetUniform {
                name: name.into(),
                value,
            },
        }
    }

    /// Wrap a window/input control
    pub fn window(cmd: WindowCommand) -> Self {
        Self::Window(cmd)
    }

    /// The node this command targets, if any.
    ///
    /// `None` for window controls, which target shared window state instead.
    pub fn target(&self) -> Option<NodeId> {
        match self {
            Self::Node(NodeOp::Create(node)) => Some(node.id),
            Self::Node(NodeOp::Destroy(id)) => Some(*id),
            Self::Node(NodeOp::SetName { id, .. }) => Some(*id),
            Self::Transform { id, .. }
            | Self::Mesh { id, .. }
            | Self::Scene { id, .. }
            | Self::Geometry { id, .. }
            | Self::Material { id, .. }
            | Self::Texture { id, .. }
            | Self::Effect { id, .. } => Some(*id),
            Self::Hierarchy(h) => Some(h.child),
            Self::Light(l) => Some(l.id),
            Self::Camera(c) => Some(c.id),
            Self::Window(_) => None,
        }
    }
}

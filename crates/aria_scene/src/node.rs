//! Node - an addressable scene entity with a stable ID
//!
//! Spatial nodes (scene root, groups, meshes, lights, cameras) carry a
//! [`Spatial`] block: a TRS transform plus parent/children links by ID.
//! Resource nodes (geometry, material, texture, effect) carry only their
//! payload. All links are [`NodeId`]s; a node never holds a pointer to
//! another node, which is what lets a command snapshot one by value.

use aria_core::NodeId;
use glam::Vec3;

use crate::resources::{
    CameraParams, EffectData, GeometryData, LightParams, MaterialData, TextureData,
};
use crate::transform::Transform;

/// Transform plus hierarchy links for a spatial node
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Spatial {
    pub transform: Transform,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl Spatial {
    /// Add a child link if not already present
    pub fn add_child(&mut self, child: NodeId) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    /// Remove a child link if present
    pub fn remove_child(&mut self, child: NodeId) {
        self.children.retain(|&c| c != child);
    }
}

/// The payload of a node, one variant per node kind
#[derive(Clone, Debug, PartialEq)]
pub enum NodeData {
    /// Scene root
    Scene { spatial: Spatial, background: Vec3 },
    /// Empty transform node, used for grouping
    Group { spatial: Spatial },
    /// Drawable: references geometry and material by ID.
    /// [`NodeId::NULL`] means "unbound, use the engine default".
    Mesh {
        spatial: Spatial,
        geometry: NodeId,
        material: NodeId,
    },
    Light {
        spatial: Spatial,
        params: LightParams,
    },
    Camera {
        spatial: Spatial,
        params: CameraParams,
    },
    Geometry(GeometryData),
    Material(MaterialData),
    Texture(TextureData),
    Effect(EffectData),
}

/// Discriminant of [`NodeData`], used in logs and creation requests
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Scene,
    Group,
    Mesh,
    Light,
    Camera,
    Geometry,
    Material,
    Texture,
    Effect,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Scene => "scene",
            Self::Group => "group",
            Self::Mesh => "mesh",
            Self::Light => "light",
            Self::Camera => "camera",
            Self::Geometry => "geometry",
            Self::Material => "material",
            Self::Texture => "texture",
            Self::Effect => "effect",
        };
        write!(f, "{}", s)
    }
}

/// An addressable scene entity
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub data: NodeData,
}

impl Node {
    /// Create a node from parts
    pub fn new(id: NodeId, name: impl Into<String>, data: NodeData) -> Self {
        Self {
            id,
            name: name.into(),
            data,
        }
    }

    /// Create a scene root
    pub fn scene(id: NodeId, name: impl Into<String>) -> Self {
        Self::new(
            id,
            name,
            NodeData::Scene {
                spatial: Spatial::default(),
                background: Vec3::ZERO,
            },
        )
    }

    /// Create an empty group node
    pub fn group(id: NodeId, name: impl Into<String>) -> Self {
        Self::new(
            id,
            name,
            NodeData::Group {
                spatial: Spatial::default(),
            },
        )
    }

    /// Create a mesh with unbound geometry and material
    pub fn mesh(id: NodeId, name: impl Into<String>) -> Self {
        Self::new(
            id,
            name,
            NodeData::Mesh {
                spatial: Spatial::default(),
                geometry: NodeId::NULL,
                material: NodeId::NULL,
            },
        )
    }

    /// Create a light with default parameters
    pub fn light(id: NodeId, name: impl Into<String>) -> Self {
        Self::new(
            id,
            name,
            NodeData::Light {
                spatial: Spatial::default(),
                params: LightParams::default(),
            },
        )
    }

    /// Create a camera with default parameters
    pub fn camera(id: NodeId, name: impl Into<String>) -> Self {
        Self::new(
            id,
            name,
            NodeData::Camera {
                spatial: Spatial::default(),
                params: CameraParams::default(),
            },
        )
    }

    /// Create an empty geometry resource
    pub fn geometry(id: NodeId, name: impl Into<String>) -> Self {
        Self::new(id, name, NodeData::Geometry(GeometryData::default()))
    }

    /// Create an empty material resource
    pub fn material(id: NodeId, name: impl Into<String>) -> Self {
        Self::new(id, name, NodeData::Material(MaterialData::default()))
    }

    /// Create an empty texture resource
    pub fn texture(id: NodeId, name: impl Into<String>) -> Self {
        Self::new(id, name, NodeData::Texture(TextureData::default()))
    }

    /// Create an effect with an unlinked chain slot
    pub fn effect(id: NodeId, name: impl Into<String>) -> Self {
        Self::new(id, name, NodeData::Effect(EffectData::default()))
    }

    /// The kind of this node
    pub fn kind(&self) -> NodeKind {
        match &self.data {
            NodeData::Scene { .. } => NodeKind::Scene,
            NodeData::Group { .. } => NodeKind::Group,
            NodeData::Mesh { .. } => NodeKind::Mesh,
            NodeData::Light { .. } => NodeKind::Light,
            NodeData::Camera { .. } => NodeKind::Camera,
            NodeData::Geometry(_) => NodeKind::Geometry,
            NodeData::Material(_) => NodeKind::Material,
            NodeData::Texture(_) => NodeKind::Texture,
            NodeData::Effect(_) => NodeKind::Effect,
        }
    }

    /// Spatial block, if this node kind carries one
    pub fn spatial(&self) -> Option<&Spatial> {
        match &self.data {
            NodeData::Scene { spatial, .. }
            | NodeData::Group { spatial }
            | NodeData::Mesh { spatial, .. }
            | NodeData::Light { spatial, .. }
            | NodeData::Camera { spatial, .. } => Some(spatial),
            _ => None,
        }
    }

    /// Mutable spatial block, if this node kind carries one
    pub fn spatial_mut(&mut self) -> Option<&mut Spatial> {
        match &mut self.data {
            NodeData::Scene { spatial, .. }
            | NodeData::Group { spatial }
            | NodeData::Mesh { spatial, .. }
            | NodeData::Light { spatial, .. }
            | NodeData::Camera { spatial, .. } => Some(spatial),
            _ => None,
        }
    }
}

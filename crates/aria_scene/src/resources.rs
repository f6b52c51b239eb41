//! Resource node payloads: geometry, material, texture, light, camera, effect
//!
//! Resource nodes have no transform; spatial nodes reference them by
//! [`NodeId`](aria_core::NodeId). Everything here is plain owned data so a
//! command can snapshot it by value and carry it across the thread boundary.

use std::collections::HashMap;

use aria_core::NodeId;
use glam::Vec3;

/// One vertex attribute of a geometry: `components` floats per vertex.
///
/// Invariant (enforced by the command constructors before anything reaches a
/// store): `1 <= components <= 4` and `data.len()` is a multiple of
/// `components`.
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub components: u32,
    pub data: Vec<f32>,
}

impl Attribute {
    /// Number of vertices covered by this attribute
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.data.len() / self.components as usize
    }
}

/// CPU-side geometry buffers
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeometryData {
    /// Named vertex attributes ("position", "normal", "uv", ...)
    pub attributes: HashMap<String, Attribute>,
    /// Optional index buffer; `None` means non-indexed drawing
    pub indices: Option<Vec<u32>>,
}

/// A typed material uniform value
#[derive(Clone, Debug, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec3(Vec3),
    /// Sampler bound to a texture node. [`NodeId::NULL`] is the engine's
    /// fallback texture (1x1 white) and is substituted when the referenced
    /// texture has been destroyed.
    Texture(NodeId),
}

/// A render-option value (wireframe, cull mode, blend mode, ...)
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MaterialOption {
    Bool(bool),
    Uint(u32),
    Float(f32),
}

/// Typed uniform bag plus render-option bag
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialData {
    pub uniforms: HashMap<String, UniformValue>,
    pub options: HashMap<String, MaterialOption>,
}

/// Texture wrap behavior outside [0, 1]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SamplerWrap {
    #[default]
    Repeat,
    Clamp,
    Mirror,
}

/// Texture filtering mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SamplerFilter {
    Nearest,
    #[default]
    Linear,
}

/// Sampler parameters for a texture node
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SamplerParams {
    pub wrap_u: SamplerWrap,
    pub wrap_v: SamplerWrap,
    pub filter_min: SamplerFilter,
    pub filter_mag: SamplerFilter,
}

/// Where a texture's pixels come from
#[derive(Clone, Debug, Default, PartialEq)]
pub enum TextureSource {
    /// Nothing uploaded yet
    #[default]
    Empty,
    /// Raw RGBA8 pixels.
    ///
    /// Invariant (enforced at command construction): `data.len() == width *
    /// height * 4`.
    Pixels {
        width: u32,
        height: u32,
        data: Vec<u8>,
    },
    /// Decode from a file path (decode itself is out of scope here)
    Path(String),
}

/// Pixel/file payload plus sampler params
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextureData {
    pub source: TextureSource,
    pub sampler: SamplerParams,
}

/// Kind of light
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LightKind {
    Directional,
    Point { radius: f32 },
}

/// Light parameters
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightParams {
    pub kind: LightKind,
    pub color: Vec3,
    pub intensity: f32,
}

impl Default for LightParams {
    fn default() -> Self {
        Self {
            kind: LightKind::Directional,
            color: Vec3::ONE,
            intensity: 1.0,
        }
    }
}

/// Camera projection
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Projection {
    Perspective { fov_y: f32, near: f32, far: f32 },
    Orthographic { height: f32, near: f32, far: f32 },
}

/// Camera parameters
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraParams {
    pub projection: Projection,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            projection: Projection::Perspective {
                fov_y: std::f32::consts::FRAC_PI_4,
                near: 0.1,
                far: 1000.0,
            },
        }
    }
}

/// One element of a singly-linked post-process chain.
///
/// `next` points at the effect that consumes this one's output;
/// `None` terminates the chain at the screen.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EffectData {
    pub next: Option<NodeId>,
    pub bypass: bool,
    pub uniforms: HashMap<String, UniformValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_vertex_count() {
        let attr = Attribute {
            components: 3,
            data: vec![0.0; 9],
        };
        assert_eq!(attr.vertex_count(), 3);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(SamplerParams::default().wrap_u, SamplerWrap::Repeat);
        assert_eq!(LightParams::default().intensity, 1.0);
        assert!(matches!(
            CameraParams::default().projection,
            Projection::Perspective { .. }
        ));
    }
}

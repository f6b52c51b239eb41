//! Applying drained commands to the consumer store
//!
//! Runs on the render thread only, after `drain_and_swap` and before the
//! barrier release. A missing or mismatched target is never an error here:
//! the command may legitimately reference a node destroyed by an earlier
//! command in the same batch, so it is dropped with a debug log. Corruption
//! of the consumer store itself has no recoverable path by contract; nothing
//! in this module can produce it short of a violated core invariant.

use aria_core::NodeId;
use aria_scene::{ConsumerStore, Node, NodeData, NodeKind, UniformValue};
use parking_lot::Mutex;

use crate::command::{
    Command, EffectOp, GeometryOp, HierarchyCommand, HierarchyOp, MaterialOp, MeshOp, NodeOp,
    SceneOp, TextureOp, TransformField,
};
use crate::window::WindowState;

/// What happened to one command
#[derive(Debug)]
pub enum ApplyOutcome {
    /// The mutation reached the consumer store (or window state)
    Applied,
    /// Stale or mismatched target; the command was skipped
    Dropped,
    /// A node was destroyed; carries the removed consumer twin so the caller
    /// can run consumer-only cleanup (freeing GPU resources and the like)
    Destroyed(Node),
}

/// Tally of one frame's apply phase
#[derive(Debug, Default)]
pub struct ApplyReport {
    pub applied: usize,
    pub dropped: usize,
    /// Consumer twins removed this frame, in destruction order
    pub destroyed: Vec<Node>,
}

/// Apply a whole drained list in order
pub fn apply_all(
    commands: Vec<Command>,
    store: &mut ConsumerStore,
    window: &Mutex<WindowState>,
) -> ApplyReport {
    let mut report = ApplyReport::default();
    for command in commands {
        match apply(command, store, window) {
            ApplyOutcome::Applied => report.applied += 1,
            ApplyOutcome::Dropped => report.dropped += 1,
            ApplyOutcome::Destroyed(node) => {
                report.applied += 1;
                report.destroyed.push(node);
            }
        }
    }
    report
}

/// Apply a single command
pub fn apply(
    command: Command,
    store: &mut ConsumerStore,
    window: &Mutex<WindowState>,
) -> ApplyOutcome {
    match command {
        Command::Node(op) => apply_node(op, store),
        Command::Transform { id, field } => apply_transform(id, field, store),
        Command::Hierarchy(h) => apply_hierarchy(h, store),
        Command::Mesh { id, op } => apply_mesh(id, op, store),
        Command::Scene { id, op } => apply_scene(id, op, store),
        Command::Geometry { id, op } => apply_geometry(id, op, store),
        Command::Material { id, op } => apply_material(id, op, store),
        Command::Texture { id, op } => apply_texture(id, op, store),
        Command::Light(cmd) => {
            with_node(store, cmd.id, "light params", |node| match &mut node.data {
                NodeData::Light { params, .. } => {
                    *params = cmd.params;
                    true
                }
                _ => false,
            })
        }
        Command::Camera(cmd) => {
            with_node(store, cmd.id, "camera params", |node| match &mut node.data {
                NodeData::Camera { params, .. } => {
                    *params = cmd.params;
                    true
                }
                _ => false,
            })
        }
        Command::Effect { id, op } => apply_effect(id, op, store),
        Command::Window(cmd) => {
            cmd.apply(&mut window.lock());
            ApplyOutcome::Applied
        }
    }
}

/// Run `f` against a live target; drop with a debug log when the target is
/// gone (stale) or `f` reports a kind mismatch.
fn with_node(
    store: &mut ConsumerStore,
    id: NodeId,
    what: &str,
    f: impl FnOnce(&mut Node) -> bool,
) -> ApplyOutcome {
    match store.get_mut(id) {
        None => {
            log::debug!("dropping {} for stale {}", what, id);
            ApplyOutcome::Dropped
        }
        Some(node) => {
            let kind = node.kind();
            if f(node) {
                ApplyOutcome::Applied
            } else {
                log::debug!("dropping {} aimed at {} ({})", what, id, kind);
                ApplyOutcome::Dropped
            }
        }
    }
}

fn apply_node(op: NodeOp, store: &mut ConsumerStore) -> ApplyOutcome {
    match op {
        NodeOp::Create(node) => {
            // The store itself refuses retired IDs: a Create that races a
            // Destroy from the same batch stays dead.
            if store.register(*node) {
                ApplyOutcome::Applied
            } else {
                ApplyOutcome::Dropped
            }
        }
        NodeOp::Destroy(id) => match store.unregister(id) {
            None => {
                log::debug!("dropping destroy for stale {}", id);
                ApplyOutcome::Dropped
            }
            Some(removed) => {
                unlink_destroyed(&removed, store);
                ApplyOutcome::Destroyed(removed)
            }
        },
        NodeOp::SetName { id, name } => with_node(store, id, "rename", |node| {
            node.name = name;
            true
        }),
    }
}

/// Scrub hierarchy links that pointed at a node we just removed. Other by-ID
/// references (mesh bindings, effect chains, sampler uniforms) are left in
/// place; lookups of a retired ID fail safely and render as defaults.
fn unlink_destroyed(removed: &Node, store: &mut ConsumerStore) {
    let Some(spatial) = removed.spatial() else {
        return;
    };
    if let Some(parent) = spatial.parent {
        if let Some(sp) = store.get_mut(parent).and_then(|n| n.spatial_mut()) {
            sp.remove_child(removed.id);
        }
    }
    for &child in &spatial.children {
        if let Some(sp) = store.get_mut(child).and_then(|n| n.spatial_mut()) {
            sp.parent = None;
        }
    }
}

fn apply_transform(id: NodeId, field: TransformField, store: &mut ConsumerStore) -> ApplyOutcome {
    with_node(store, id, "transform set", |node| {
        let Some(spatial) = node.spatial_mut() else {
            return false;
        };
        match field {
            TransformField::Position(v) => spatial.transform.position = v,
            TransformField::Rotation(q) => spatial.transform.rotation = q,
            TransformField::Scale(v) => spatial.transform.scale = v,
        }
        true
    })
}

fn apply_hierarchy(h: HierarchyCommand, store: &mut ConsumerStore) -> ApplyOutcome {
    let HierarchyCommand { parent, child, op } = h;
    match op {
        HierarchyOp::Add => {
            let parent_ok = store.get(parent).is_some_and(|n| n.spatial().is_some());
            let child_ok = store.get(child).is_some_and(|n| n.spatial().is_some());
            if !parent_ok || !child_ok {
                log::debug!("dropping add-child {} -> {}: stale endpoint", parent, child);
                return ApplyOutcome::Dropped;
            }

            let old_parent = store
                .get_mut(child)
                .and_then(|n| n.spatial_mut())
                .map(|sp| sp.parent.replace(parent))
                .flatten();
            if let Some(old) = old_parent {
                if old != parent {
                    if let Some(sp) = store.get_mut(old).and_then(|n| n.spatial_mut()) {
                        sp.remove_child(child);
                    }
                }
            }
            if let Some(sp) = store.get_mut(parent).and_then(|n| n.spatial_mut()) {
                sp.add_child(child);
            }
            ApplyOutcome::Applied
        }
        HierarchyOp::Remove => {
            if !store.contains(parent) && !store.contains(child) {
                log::debug!(
                    "dropping remove-child {} -> {}: both endpoints stale",
                    parent,
                    child
                );
                return ApplyOutcome::Dropped;
            }
            if let Some(sp) = store.get_mut(parent).and_then(|n| n.spatial_mut()) {
                sp.remove_child(child);
            }
            if let Some(sp) = store.get_mut(child).and_then(|n| n.spatial_mut()) {
                if sp.parent == Some(parent) {
                    sp.parent = None;
                }
            }
            ApplyOutcome::Applied
        }
    }
}

fn apply_mesh(id: NodeId, op: MeshOp, store: &mut ConsumerStore) -> ApplyOutcome {
    // Resolve the resource first: a binding whose target died in this same
    // batch degrades to the null binding (engine default geometry/material).
    let resolved = |target: NodeId, kind: NodeKind, store: &ConsumerStore| -> Option<NodeId> {
        if target.is_null() {
            return Some(NodeId::NULL);
        }
        match store.get(target) {
            Some(node) if node.kind() == kind => Some(target),
            Some(node) => {
                log::debug!("mesh {} binding: {} is a {}, not {}", id, target, node.kind(), kind);
                None
            }
            None => {
                log::debug!("mesh {} binding: {} is stale, using default", id, target);
                Some(NodeId::NULL)
            }
        }
    };

    let (slot_kind, target) = match op {
        MeshOp::BindGeometry(t) => (NodeKind::Geometry, t),
        MeshOp::BindMaterial(t) => (NodeKind::Material, t),
    };
    let Some(resolved_id) = resolved(target, slot_kind, store) else {
        return ApplyOutcome::Dropped;
    };

    with_node(store, id, "mesh binding", |node| match &mut node.data {
        NodeData::Mesh {
            geometry, material, ..
        } => {
            match slot_kind {
                NodeKind::Geometry => *geometry = resolved_id,
                _ => *material = resolved_id,
            }
            true
        }
        _ => false,
    })
}

fn apply_scene(id: NodeId, op: SceneOp, store: &mut ConsumerStore) -> ApplyOutcome {
    with_node(store, id, "scene set", |node| match &mut node.data {
        NodeData::Scene { background, .. } => {
            let SceneOp::SetBackground(color) = op;
            *background = color;
            true
        }
        _ => false,
    })
}

fn apply_geometry(id: NodeId, op: GeometryOp, store: &mut ConsumerStore) -> ApplyOutcome {
    with_node(store, id, "geometry upload", |node| match &mut node.data {
        NodeData::Geometry(geo) => {
            match op {
                GeometryOp::SetAttribute { name, attribute } => {
                    geo.attributes.insert(name, attribute);
                }
                GeometryOp::SetIndices(indices) => geo.indices = indices,
            }
            true
        }
        _ => false,
    })
}

fn apply_material(id: NodeId, op: MaterialOp, store: &mut ConsumerStore) -> ApplyOutcome {
    let op = match op {
        MaterialOp::SetUniform { name, value } => MaterialOp::SetUniform {
            value: resolve_uniform(id, &name, value, store),
            name,
        },
        other => other,
    };
    with_node(store, id, "material set", |node| match &mut node.data {
        NodeData::Material(mat) => {
            match op {
                MaterialOp::SetUniform { name, value } => {
                    mat.uniforms.insert(name, value);
                }
                MaterialOp::SetOption { name, value } => {
                    mat.options.insert(name, value);
                }
            }
            true
        }
        _ => false,
    })
}

/// Sampler uniforms referencing a destroyed texture fall back to
/// [`NodeId::NULL`], the engine's 1x1 white texture.
fn resolve_uniform(
    id: NodeId,
    name: &str,
    value: UniformValue,
    store: &ConsumerStore,
) -> UniformValue {
    match value {
        UniformValue::Texture(tex) if !tex.is_null() && !store.contains(tex) => {
            log::debug!(
                "uniform '{}' on {}: texture {} is stale, using fallback",
                name,
                id,
                tex
            );
            UniformValue::Texture(NodeId::NULL)
        }
        other => other,
    }
}

fn apply_texture(id: NodeId, op: TextureOp, store: &mut ConsumerStore) -> ApplyOutcome {
    with_node(store, id, "texture upload", |node| match &mut node.data {
        NodeData::Texture(tex) => {
            match op {
                TextureOp::SetPixels {
                    width,
                    height,
                    data,
                } => {
                    tex.source = aria_scene::TextureSource::Pixels {
                        width,
                        height,
                        data,
                    };
                }
                TextureOp::SetPath(path) => {
                    tex.source = aria_scene::TextureSource::Path(path);
                }
                TextureOp::SetSampler(sampler) => tex.sampler = sampler,
            }
            true
        }
        _ => false,
    })
}

fn apply_effect(id: NodeId, op: EffectOp, store: &mut ConsumerStore) -> ApplyOutcome {
    let op = match op {
        // A chain link to an effect destroyed in this batch degrades to
        // "output to screen".
        EffectOp::Link(Some(next)) if !store.contains(next) => {
            log::debug!("effect {} link: {} is stale, terminating chain", id, next);
            EffectOp::Link(None)
        }
        EffectOp::SetUniform { name, value } => EffectOp::SetUniform {
            value: resolve_uniform(id, &name, value, store),
            name,
        },
        other => other,
    };
    with_node(store, id, "effect set", |node| match &mut node.data {
        NodeData::Effect(fx) => {
            match op {
                EffectOp::Link(next) => fx.next = next,
                EffectOp::Bypass(bypass) => fx.bypass = bypass,
                EffectOp::SetUniform { name, value } => {
                    fx.uniforms.insert(name, value);
                }
            }
            true
        }
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aria_scene::{LightParams, MaterialOption};
    use glam::Vec3;

    fn fixture() -> (ConsumerStore, Mutex<WindowState>) {
        (ConsumerStore::new(), Mutex::new(WindowState::default()))
    }

    fn id(raw: u64) -> NodeId {
        NodeId::from_raw(raw)
    }

    #[test]
    fn test_create_then_mutate() {
        let (mut store, window) = fixture();

        apply(Command::create(Node::mesh(id(1), "cube")), &mut store, &window);
        apply(
            Command::set_position(id(1), Vec3::new(1.0, 0.0, 0.0)),
            &mut store,
            &window,
        );

        let spatial = store.get(id(1)).unwrap().spatial().unwrap();
        assert_eq!(spatial.transform.position, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_stale_target_dropped() {
        let (mut store, window) = fixture();
        let outcome = apply(Command::set_position(id(5), Vec3::ONE), &mut store, &window);
        assert!(matches!(outcome, ApplyOutcome::Dropped));
        assert!(store.is_empty());
    }

    #[test]
    fn test_kind_mismatch_dropped() {
        let (mut store, window) = fixture();
        apply(Command::create(Node::material(id(1), "m")), &mut store, &window);

        // A material has no transform.
        let outcome = apply(Command::set_position(id(1), Vec3::ONE), &mut store, &window);
        assert!(matches!(outcome, ApplyOutcome::Dropped));

        // And a light-params set does not land on a material either.
        let outcome = apply(
            Command::set_light(id(1), LightParams::default()),
            &mut store,
            &window,
        );
        assert!(matches!(outcome, ApplyOutcome::Dropped));
    }

    #[test]
    fn test_destroy_unlinks_hierarchy() {
        let (mut store, window) = fixture();
        apply(Command::create(Node::group(id(1), "parent")), &mut store, &window);
        apply(Command::create(Node::group(id(2), "child")), &mut store, &window);
        apply(Command::add_child(id(1), id(2)), &mut store, &window);

        let outcome = apply(Command::destroy(id(2)), &mut store, &window);
        assert!(matches!(outcome, ApplyOutcome::Destroyed(_)));

        let parent = store.get(id(1)).unwrap().spatial().unwrap();
        assert!(parent.children.is_empty());
    }

    #[test]
    fn test_reparent_moves_child() {
        let (mut store, window) = fixture();
        for (raw, name) in [(1, "a"), (2, "b"), (3, "child")] {
            apply(Command::create(Node::group(id(raw), name)), &mut store, &window);
        }
        apply(Command::add_child(id(1), id(3)), &mut store, &window);
        apply(Command::add_child(id(2), id(3)), &mut store, &window);

        assert!(store.get(id(1)).unwrap().spatial().unwrap().children.is_empty());
        assert_eq!(store.get(id(2)).unwrap().spatial().unwrap().children, vec![id(3)]);
        assert_eq!(store.get(id(3)).unwrap().spatial().unwrap().parent, Some(id(2)));
    }

    #[test]
    fn test_stale_texture_uniform_falls_back() {
        let (mut store, window) = fixture();
        apply(Command::create(Node::material(id(1), "m")), &mut store, &window);

        // Texture 9 was never created on the consumer side.
        apply(
            Command::set_uniform(id(1), "albedo", UniformValue::Texture(id(9))),
            &mut store,
            &window,
        );

        let NodeData::Material(mat) = &store.get(id(1)).unwrap().data else {
            panic!("expected material");
        };
        assert_eq!(
            mat.uniforms.get("albedo"),
            Some(&UniformValue::Texture(NodeId::NULL))
        );
    }

    #[test]
    fn test_material_option_set() {
        let (mut store, window) = fixture();
        apply(Command::create(Node::material(id(1), "m")), &mut store, &window);
        apply(
            Command::set_option(id(1), "wireframe", MaterialOption::Bool(true)),
            &mut store,
            &window,
        );

        let NodeData::Material(mat) = &store.get(id(1)).unwrap().data else {
            panic!("expected material");
        };
        assert_eq!(
            mat.options.get("wireframe"),
            Some(&MaterialOption::Bool(true))
        );
    }

    #[test]
    fn test_create_after_destroy_is_dropped() {
        let (mut store, window) = fixture();
        apply(Command::create(Node::group(id(1), "g")), &mut store, &window);
        apply(Command::destroy(id(1)), &mut store, &window);

        let outcome = apply(Command::create(Node::group(id(1), "zombie")), &mut store, &window);
        assert!(matches!(outcome, ApplyOutcome::Dropped));
        assert!(!store.contains(id(1)));
    }

    #[test]
    fn test_window_command_applies() {
        let (mut store, window) = fixture();
        apply(
            Command::window(crate::window::WindowCommand::SetFullscreen(true)),
            &mut store,
            &window,
        );
        assert!(window.lock().fullscreen);
    }

    #[test]
    fn test_report_tallies() {
        let (mut store, window) = fixture();
        let commands = vec![
            Command::create(Node::group(id(1), "g")),
            Command::set_position(id(1), Vec3::ONE),
            Command::set_position(id(99), Vec3::ONE), // stale
            Command::destroy(id(1)),
        ];
        let report = apply_all(commands, &mut store, &window);
        assert_eq!(report.applied, 3);
        assert_eq!(report.dropped, 1);
        assert_eq!(report.destroyed.len(), 1);
        assert_eq!(report.destroyed[0].id, id(1));
    }
}

//! Producer-side scene API
//!
//! A [`ProducerHandle`] belongs to one task (one script thread). Every
//! mutation goes through it in three steps: validate against the
//! producer-side twin, update the twin, enqueue the value-captured command.
//! The handle never blocks on the render thread except in
//! [`wait_for_next_frame`](ProducerHandle::wait_for_next_frame).
//!
//! Ownership is exclusive: a task may only mutate nodes it created or
//! adopted. [`release_node`](ProducerHandle::release_node) detaches a node
//! from its task so it survives the task and can be adopted by another.
//! Dropping the handle destroys everything it still owns.

use std::collections::HashSet;
use std::sync::Arc;

use aria_core::{NodeId, TaskId};
use aria_scene::{
    Attribute, CameraParams, LightParams, MaterialOption, Node, NodeData, NodeKind, SamplerParams,
    TextureSource, UniformValue,
};
use aria_sync::{BarrierError, Command, CommandError, QueueFull, WindowCommand};
use glam::{Quat, Vec3};
use thiserror::Error;

use crate::context::SyncContext;

#[derive(Debug, Error)]
pub enum ProducerError {
    #[error(transparent)]
    QueueFull(#[from] QueueFull),
    #[error(transparent)]
    Barrier(#[from] BarrierError),
    #[error(transparent)]
    Payload(#[from] CommandError),
    #[error("{id} is owned by {owner}")]
    NotOwned { id: NodeId, owner: TaskId },
    #[error("{0} has been released; adopt it first")]
    Released(NodeId),
    #[error("{0} was destroyed")]
    Destroyed(NodeId),
    #[error("{0} is not a known node")]
    Unknown(NodeId),
    #[error("{id} is not a {expected}")]
    WrongKind { id: NodeId, expected: NodeKind },
}

pub struct ProducerHandle {
    ctx: Arc<SyncContext>,
    task: TaskId,
    /// Local mirror of this task's entries in the shared owner map, so Drop
    /// knows what to destroy.
    owned: HashSet<NodeId>,
}

impl ProducerHandle {
    pub(crate) fn new(ctx: Arc<SyncContext>, task: TaskId) -> Self {
        Self {
            ctx,
            task,
            owned: HashSet::new(),
        }
    }

    pub fn task(&self) -> TaskId {
        self.task
    }

    /// Nodes currently owned by this handle
    pub fn owned_count(&self) -> usize {
        self.owned.len()
    }

    /// Block until the render thread has consumed the current frame.
    ///
    /// For a task registered before the frame's barrier fired, commands
    /// pushed before this call are drained (and applied in order) by the
    /// time it returns. A task that registers mid-frame may see its first
    /// pushes carried over to the next drain.
    pub fn wait_for_next_frame(&self) -> Result<(), ProducerError> {
        self.ctx.barrier().wait_for_next_frame(self.task)?;
        Ok(())
    }

    fn push(&self, command: Command) -> Result<(), ProducerError> {
        self.ctx.queue().push(command)?;
        Ok(())
    }

    fn ensure_owned(&self, id: NodeId) -> Result<(), ProducerError> {
        match self.ctx.owners().lock().get(&id) {
            Some(Some(owner)) if *owner == self.task => return Ok(()),
            Some(Some(owner)) => {
                return Err(ProducerError::NotOwned {
                    id,
                    owner: *owner,
                })
            }
            Some(None) => return Err(ProducerError::Released(id)),
            None => {}
        }
        if self.ctx.nodes().read().is_retired(id) {
            Err(ProducerError::Destroyed(id))
        } else {
            Err(ProducerError::Unknown(id))
        }
    }

    /// Target must be live and of `expected` kind, or NULL (engine default)
    fn ensure_kind(&self, id: NodeId, expected: NodeKind) -> Result<(), ProducerError> {
        if id.is_null() {
            return Ok(());
        }
        let nodes = self.ctx.nodes().read();
        match nodes.get(id) {
            Some(node) if node.kind() == expected => Ok(()),
            Some(_) => Err(ProducerError::WrongKind { id, expected }),
            None if nodes.is_retired(id) => Err(ProducerError::Destroyed(id)),
            None => Err(ProducerError::Unknown(id)),
        }
    }

    // ---- creation ----

    fn create_node(&mut self, build: impl FnOnce(NodeId) -> Node) -> Result<NodeId, ProducerError> {
        let id = self.ctx.alloc_node_id();
        let node = build(id);
        self.ctx.nodes().write().register(node.clone());
        self.ctx.owners().lock().insert(id, Some(self.task));
        self.owned.insert(id);
        if let Err(err) = self.push(Command::create(node)) {
            // Queue rejected the create: the node never reaches the consumer,
            // so take it back out of the producer twin as well.
            self.ctx.nodes().write().unregister(id);
            self.ctx.owners().lock().remove(&id);
            self.owned.remove(&id);
            return Err(err);
        }
        Ok(id)
    }

    pub fn create_scene(&mut self, name: impl Into<String>) -> Result<NodeId, ProducerError> {
        let name = name.into();
        self.create_node(|id| Node::scene(id, name))
    }

    pub fn create_group(&mut self, name: impl Into<String>) -> Result<NodeId, ProducerError> {
        let name = name.into();
        self.create_node(|id| Node::group(id, name))
    }

    pub fn create_mesh(&mut self, name: impl Into<String>) -> Result<NodeId, ProducerError> {
        let name = name.into();
        self.create_node(|id| Node::mesh(id, name))
    }

    pub fn create_light(&mut self, name: impl Into<String>) -> Result<NodeId, ProducerError> {
        let name = name.into();
        self.create_node(|id| Node::light(id, name))
    }

    pub fn create_camera(&mut self, name: impl Into<String>) -> Result<NodeId, ProducerError> {
        let name = name.into();
        self.create_node(|id| Node::camera(id, name))
    }

    pub fn create_geometry(&mut self, name: impl Into<String>) -> Result<NodeId, ProducerError> {
        let name = name.into();
        self.create_node(|id| Node::geometry(id, name))
    }

    pub fn create_material(&mut self, name: impl Into<String>) -> Result<NodeId, ProducerError> {
        let name = name.into();
        self.create_node(|id| Node::material(id, name))
    }

    pub fn create_texture(&mut self, name: impl Into<String>) -> Result<NodeId, ProducerError> {
        let name = name.into();
        self.create_node(|id| Node::texture(id, name))
    }

    pub fn create_effect(&mut self, name: impl Into<String>) -> Result<NodeId, ProducerError> {
        let name = name.into();
        self.create_node(|id| Node::effect(id, name))
    }

    // ---- lifetime ----

    /// Destroy an owned node. Its ID is retired on both sides and never
    /// comes back; commands already queued against it will be dropped.
    pub fn destroy(&mut self, id: NodeId) -> Result<(), ProducerError> {
        self.ensure_owned(id)?;
        self.retire_twin(id);
        self.ctx.owners().lock().remove(&id);
        self.owned.remove(&id);
        self.push(Command::destroy(id))
    }

    /// Remove a node from the producer twin, scrubbing hierarchy links
    fn retire_twin(&self, id: NodeId) {
        let mut nodes = self.ctx.nodes().write();
        if let Some(removed) = nodes.unregister(id) {
            if let Some(spatial) = removed.spatial() {
                if let Some(parent) = spatial.parent {
                    if let Some(sp) = nodes.get_mut(parent).and_then(|n| n.spatial_mut()) {
                        sp.remove_child(id);
                    }
                }
                for &child in &spatial.children {
                    if let Some(sp) = nodes.get_mut(child).and_then(|n| n.spatial_mut()) {
                        sp.parent = None;
                    }
                }
            }
        }
    }

    /// Give up ownership without destroying. The node stays in the scene
    /// past this task's lifetime, and any task may
    /// [`adopt_node`](Self::adopt_node) it.
    pub fn release_node(&mut self, id: NodeId) -> Result<(), ProducerError> {
        self.ensure_owned(id)?;
        self.ctx.owners().lock().insert(id, None);
        self.owned.remove(&id);
        Ok(())
    }

    /// Release everything this task still owns in one go
    pub fn release_all(&mut self) {
        let mut owners = self.ctx.owners().lock();
        for id in self.owned.drain() {
            owners.insert(id, None);
        }
    }

    /// Take ownership of a released node
    pub fn adopt_node(&mut self, id: NodeId) -> Result<(), ProducerError> {
        let mut owners = self.ctx.owners().lock();
        match owners.get(&id).copied() {
            Some(None) => {
                owners.insert(id, Some(self.task));
                drop(owners);
                self.owned.insert(id);
                Ok(())
            }
            Some(Some(owner)) if owner == self.task => Ok(()),
            Some(Some(owner)) => Err(ProducerError::NotOwned { id, owner }),
            None => {
                drop(owners);
                if self.ctx.nodes().read().is_retired(id) {
                    Err(ProducerError::Destroyed(id))
                } else {
                    Err(ProducerError::Unknown(id))
                }
            }
        }
    }

    // ---- transforms and naming ----

    pub fn set_name(&self, id: NodeId, name: impl Into<String>) -> Result<(), ProducerError> {
        self.ensure_owned(id)?;
        let name = name.into();
        if let Some(node) = self.ctx.nodes().write().get_mut(id) {
            node.name = name.clone();
        }
        self.push(Command::set_name(id, name))
    }

    pub fn set_position(&self, id: NodeId, position: Vec3) -> Result<(), ProducerError> {
        self.ensure_owned(id)?;
        if let Some(sp) = self.ctx.nodes().write().get_mut(id).and_then(|n| n.spatial_mut()) {
            sp.transform.position = position;
        }
        self.push(Command::set_position(id, position))
    }

    pub fn set_rotation(&self, id: NodeId, rotation: Quat) -> Result<(), ProducerError> {
        self.ensure_owned(id)?;
        if let Some(sp) = self.ctx.nodes().write().get_mut(id).and_then(|n| n.spatial_mut()) {
            sp.transform.rotation = rotation;
        }
        self.push(Command::set_rotation(id, rotation))
    }

    pub fn set_scale(&self, id: NodeId, scale: Vec3) -> Result<(), ProducerError> {
        self.ensure_owned(id)?;
        if let Some(sp) = self.ctx.nodes().write().get_mut(id).and_then(|n| n.spatial_mut()) {
            sp.transform.scale = scale;
        }
        self.push(Command::set_scale(id, scale))
    }

    /// Read back a node's position from the producer twin
    pub fn position(&self, id: NodeId) -> Option<Vec3> {
        self.ctx
            .nodes()
            .read()
            .get(id)
            .and_then(|n| n.spatial())
            .map(|sp| sp.transform.position)
    }

    /// Snapshot a whole node from the producer twin.
    ///
    /// Any task may read; only the owner may mutate.
    pub fn node(&self, id: NodeId) -> Option<Node> {
        self.ctx.nodes().read().get(id).cloned()
    }

    // ---- hierarchy ----

    pub fn add_child(&self, parent: NodeId, child: NodeId) -> Result<(), ProducerError> {
        self.ensure_owned(parent)?;
        self.ensure_owned(child)?;
        {
            let mut nodes = self.ctx.nodes().write();
            let old_parent = nodes
                .get_mut(child)
                .and_then(|n| n.spatial_mut())
                .and_then(|sp| sp.parent.replace(parent));
            if let Some(old) = old_parent {
                if old != parent {
                    if let Some(sp) = nodes.get_mut(old).and_then(|n| n.spatial_mut()) {
                        sp.remove_child(child);
                    }
                }
            }
            if let Some(sp) = nodes.get_mut(parent).and_then(|n| n.spatial_mut()) {
                sp.add_child(child);
            }
        }
        self.push(Command::add_child(parent, child))
    }

    pub fn remove_child(&self, parent: NodeId, child: NodeId) -> Result<(), ProducerError> {
        self.ensure_owned(parent)?;
        self.ensure_owned(child)?;
        {
            let mut nodes = self.ctx.nodes().write();
            if let Some(sp) = nodes.get_mut(parent).and_then(|n| n.spatial_mut()) {
                sp.remove_child(child);
            }
            if let Some(sp) = nodes.get_mut(child).and_then(|n| n.spatial_mut()) {
                if sp.parent == Some(parent) {
                    sp.parent = None;
                }
            }
        }
        self.push(Command::remove_child(parent, child))
    }

    // ---- scene and mesh ----

    pub fn set_background(&self, scene: NodeId, color: Vec3) -> Result<(), ProducerError> {
        self.ensure_owned(scene)?;
        if let Some(node) = self.ctx.nodes().write().get_mut(scene) {
            if let NodeData::Scene { background, .. } = &mut node.data {
                *background = color;
            }
        }
        self.push(Command::set_background(scene, color))
    }

    pub fn bind_geometry(&self, mesh: NodeId, geometry: NodeId) -> Result<(), ProducerError> {
        self.ensure_owned(mesh)?;
        self.ensure_kind(geometry, NodeKind::Geometry)?;
        self.bind_mesh_slot(mesh, geometry, true)?;
        self.push(Command::bind_geometry(mesh, geometry))
    }

    pub fn bind_material(&self, mesh: NodeId, material: NodeId) -> Result<(), ProducerError> {
        self.ensure_owned(mesh)?;
        self.ensure_kind(material, NodeKind::Material)?;
        self.bind_mesh_slot(mesh, material, false)?;
        self.push(Command::bind_material(mesh, material))
    }

    fn bind_mesh_slot(
        &self,
        mesh: NodeId,
        target: NodeId,
        is_geometry: bool,
    ) -> Result<(), ProducerError> {
        let mut nodes = self.ctx.nodes().write();
        match nodes.get_mut(mesh).map(|n| &mut n.data) {
            Some(NodeData::Mesh {
                geometry, material, ..
            }) => {
                if is_geometry {
                    *geometry = target;
                } else {
                    *material = target;
                }
                Ok(())
            }
            _ => Err(ProducerError::WrongKind {
                id: mesh,
                expected: NodeKind::Mesh,
            }),
        }
    }

    // ---- resources ----

    pub fn set_geometry_attribute(
        &self,
        id: NodeId,
        name: impl Into<String>,
        components: u32,
        data: Vec<f32>,
    ) -> Result<(), ProducerError> {
        self.ensure_owned(id)?;
        let name = name.into();
        // Validates component count and data length before anything mutates.
        let command = Command::set_geometry_attribute(id, name.clone(), components, data.clone())?;
        if let Some(NodeData::Geometry(geo)) =
            self.ctx.nodes().write().get_mut(id).map(|n| &mut n.data)
        {
            geo.attributes.insert(name, Attribute { components, data });
        }
        self.push(command)
    }

    pub fn set_geometry_indices(
        &self,
        id: NodeId,
        indices: Option<Vec<u32>>,
    ) -> Result<(), ProducerError> {
        self.ensure_owned(id)?;
        if let Some(NodeData::Geometry(geo)) =
            self.ctx.nodes().write().get_mut(id).map(|n| &mut n.data)
        {
            geo.indices = indices.clone();
        }
        self.push(Command::set_geometry_indices(id, indices))
    }

    pub fn set_uniform(
        &self,
        id: NodeId,
        name: impl Into<String>,
        value: UniformValue,
    ) -> Result<(), ProducerError> {
        self.ensure_owned(id)?;
        if let UniformValue::Texture(tex) = value {
            self.ensure_kind(tex, NodeKind::Texture)?;
        }
        let name = name.into();
        if let Some(NodeData::Material(mat)) =
            self.ctx.nodes().write().get_mut(id).map(|n| &mut n.data)
        {
            mat.uniforms.insert(name.clone(), value.clone());
        }
        self.push(Command::set_uniform(id, name, value))
    }

    pub fn set_option(
        &self,
        id: NodeId,
        name: impl Into<String>,
        value: MaterialOption,
    ) -> Result<(), ProducerError> {
        self.ensure_owned(id)?;
        let name = name.into();
        if let Some(NodeData::Material(mat)) =
            self.ctx.nodes().write().get_mut(id).map(|n| &mut n.data)
        {
            mat.options.insert(name.clone(), value);
        }
        self.push(Command::set_option(id, name, value))
    }

    pub fn set_texture_pixels(
        &self,
        id: NodeId,
        width: u32,
        height: u32,
        data: Vec<u8>,
    ) -> Result<(), ProducerError> {
        self.ensure_owned(id)?;
        // Validates dimensions and buffer length before anything mutates.
        let command = Command::set_texture_pixels(id, width, height, data.clone())?;
        if let Some(NodeData::Texture(tex)) =
            self.ctx.nodes().write().get_mut(id).map(|n| &mut n.data)
        {
            tex.source = TextureSource::Pixels {
                width,
                height,
                data,
            };
        }
        self.push(command)
    }

    pub fn set_texture_path(&self, id: NodeId, path: impl Into<String>) -> Result<(), ProducerError> {
        self.ensure_owned(id)?;
        let path = path.into();
        if let Some(NodeData::Texture(tex)) =
            self.ctx.nodes().write().get_mut(id).map(|n| &mut n.data)
        {
            tex.source = TextureSource::Path(path.clone());
        }
        self.push(Command::set_texture_path(id, path))
    }

    pub fn set_texture_sampler(
        &self,
        id: NodeId,
        sampler: SamplerParams,
    ) -> Result<(), ProducerError> {
        self.ensure_owned(id)?;
        if let Some(NodeData::Texture(tex)) =
            self.ctx.nodes().write().get_mut(id).map(|n| &mut n.data)
        {
            tex.sampler = sampler;
        }
        self.push(Command::set_texture_sampler(id, sampler))
    }

    pub fn set_light(&self, id: NodeId, params: LightParams) -> Result<(), ProducerError> {
        self.ensure_owned(id)?;
        if let Some(NodeData::Light { params: p, .. }) =
            self.ctx.nodes().write().get_mut(id).map(|n| &mut n.data)
        {
            *p = params;
        }
        self.push(Command::set_light(id, params))
    }

    pub fn set_camera(&self, id: NodeId, params: CameraParams) -> Result<(), ProducerError> {
        self.ensure_owned(id)?;
        if let Some(NodeData::Camera { params: p, .. }) =
            self.ctx.nodes().write().get_mut(id).map(|n| &mut n.data)
        {
            *p = params;
        }
        self.push(Command::set_camera(id, params))
    }

    // ---- effects ----

    pub fn effect_link(&self, id: NodeId, next: Option<NodeId>) -> Result<(), ProducerError> {
        self.ensure_owned(id)?;
        if let Some(next) = next {
            self.ensure_kind(next, NodeKind::Effect)?;
        }
        if let Some(NodeData::Effect(fx)) =
            self.ctx.nodes().write().get_mut(id).map(|n| &mut n.data)
        {
            fx.next = next;
        }
        self.push(Command::effect_link(id, next))
    }

    pub fn effect_bypass(&self, id: NodeId, bypass: bool) -> Result<(), ProducerError> {
        self.ensure_owned(id)?;
        if let Some(NodeData::Effect(fx)) =
            self.ctx.nodes().write().get_mut(id).map(|n| &mut n.data)
        {
            fx.bypass = bypass;
        }
        self.push(Command::effect_bypass(id, bypass))
    }

    pub fn effect_uniform(
        &self,
        id: NodeId,
        name: impl Into<String>,
        value: UniformValue,
    ) -> Result<(), ProducerError> {
        self.ensure_owned(id)?;
        if let UniformValue::Texture(tex) = value {
            self.ensure_kind(tex, NodeKind::Texture)?;
        }
        let name = name.into();
        if let Some(NodeData::Effect(fx)) =
            self.ctx.nodes().write().get_mut(id).map(|n| &mut n.data)
        {
            fx.uniforms.insert(name.clone(), value.clone());
        }
        self.push(Command::effect_uniform(id, name, value))
    }

    // ---- window ----

    /// Queue a window-state change; it lands when the frame is applied
    pub fn window_command(&self, cmd: WindowCommand) -> Result<(), ProducerError> {
        self.push(Command::window(cmd))
    }
}

impl Drop for ProducerHandle {
    fn drop(&mut self) {
        // Still-owned nodes die with their task; anything meant to outlive
        // it must have been released first.
        let owned: Vec<NodeId> = self.owned.drain().collect();
        for id in owned {
            self.retire_twin(id);
            self.ctx.owners().lock().remove(&id);
            if let Err(err) = self.ctx.queue().push(Command::destroy(id)) {
                log::warn!("could not queue destroy for {} at task exit: {}", id, err);
            }
        }
        self.ctx.barrier().unregister_task(self.task);
        log::debug!("producer {} unregistered", self.task);
    }
}

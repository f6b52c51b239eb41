//! Demo producer scripts
//!
//! Each script runs on its own thread with its own [`ProducerHandle`],
//! pacing itself against the frame barrier exactly the way a user script
//! would. Errors end the script; the scene it built stays alive.

use std::sync::Arc;

use aria_engine::{ProducerError, SyncContext};
use aria_scene::{MaterialOption, UniformValue};
use glam::{Quat, Vec3};

/// Build the stage every other script plays on: scene root, camera, light.
///
/// Runs once and returns the root so later scripts can adopt it.
pub fn setup_stage(ctx: &Arc<SyncContext>) -> Result<aria_core::NodeId, ProducerError> {
    let mut p = ctx.spawn_producer();

    let root = p.create_scene("stage")?;
    p.set_background(root, Vec3::new(0.02, 0.02, 0.05))?;

    let camera = p.create_camera("main-camera")?;
    p.set_position(camera, Vec3::new(0.0, 2.0, 8.0))?;
    p.add_child(root, camera)?;

    let sun = p.create_light("sun")?;
    p.set_position(sun, Vec3::new(4.0, 10.0, 4.0))?;
    p.add_child(root, sun)?;

    p.wait_for_next_frame()?;
    // Everything on the stage outlives this setup task.
    p.release_all();
    Ok(root)
}

/// A mesh orbiting the origin, one revolution over `frames` frames
pub fn orbit(
    ctx: Arc<SyncContext>,
    root: aria_core::NodeId,
    label: &str,
    radius: f32,
    frames: u32,
) -> Result<(), ProducerError> {
    let mut p = ctx.spawn_producer();

    let geometry = p.create_geometry(format!("{}-quad", label))?;
    p.set_geometry_attribute(
        geometry,
        "position",
        3,
        vec![
            -0.5, -0.5, 0.0, //
            0.5, -0.5, 0.0, //
            0.5, 0.5, 0.0, //
            -0.5, 0.5, 0.0,
        ],
    )?;
    p.set_geometry_indices(geometry, Some(vec![0, 1, 2, 0, 2, 3]))?;

    let material = p.create_material(format!("{}-mat", label))?;
    p.set_uniform(material, "base_color", UniformValue::Vec3(Vec3::X))?;
    p.set_option(material, "double_sided", MaterialOption::Bool(true))?;

    let mesh = p.create_mesh(label)?;
    p.bind_geometry(mesh, geometry)?;
    p.bind_material(mesh, material)?;

    // The root is shared between scripts; hold it only long enough to link.
    loop {
        match p.adopt_node(root) {
            Ok(()) => break,
            Err(ProducerError::NotOwned { .. }) => std::thread::yield_now(),
            Err(err) => return Err(err),
        }
    }
    p.add_child(root, mesh)?;
    p.release_node(root)?;

    for frame in 0..frames {
        let angle = frame as f32 / frames as f32 * std::f32::consts::TAU;
        p.set_position(mesh, Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius))?;
        p.set_rotation(mesh, Quat::from_rotation_y(-angle))?;
        p.wait_for_next_frame()?;
    }
    p.release_all();
    log::info!("{}: orbit complete, leaving mesh in scene", label);
    Ok(())
}

/// Creates and destroys short-lived groups every frame, exercising the
/// ID-retirement path under load
pub fn churn(ctx: Arc<SyncContext>, frames: u32, per_frame: u32) -> Result<(), ProducerError> {
    let mut p = ctx.spawn_producer();

    let mut spawned = 0u64;
    for _ in 0..frames {
        let mut batch = Vec::with_capacity(per_frame as usize);
        for i in 0..per_frame {
            let id = p.create_group(format!("spark-{}", i))?;
            p.set_position(id, Vec3::new(i as f32, 0.0, 0.0))?;
            batch.push(id);
            spawned += 1;
        }
        p.wait_for_next_frame()?;
        for id in batch {
            p.destroy(id)?;
        }
        p.wait_for_next_frame()?;
    }
    log::info!("churn: spawned and destroyed {} nodes", spawned);
    Ok(())
}

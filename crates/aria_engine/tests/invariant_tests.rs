//! Invariant tests: properties the synchronization core must hold under
//! concurrency, not just in straight-line use.

use std::thread;

use aria_engine::prelude::*;
use glam::Vec3;

/// Run the render loop on the current thread until every producer thread has
/// been joined, then one final frame to drain the stragglers.
fn pump_all(render: &mut RenderLoop, producers: Vec<thread::JoinHandle<()>>) {
    for producer in producers {
        while !producer.is_finished() {
            render.run_frame();
        }
        if let Err(panic) = producer.join() {
            std::panic::resume_unwind(panic);
        }
    }
    render.run_frame();
}

#[test]
fn test_node_ids_are_never_reused() {
    let ctx = SyncContext::new(&EngineConfig::default());
    let mut p = ctx.spawn_producer();

    let mut seen = std::collections::HashSet::new();
    for _ in 0..100 {
        let id = p.create_group("churn").unwrap();
        assert!(seen.insert(id), "allocator handed out {} twice", id);
        p.destroy(id).unwrap();
    }
}

#[test]
fn test_retired_id_stays_dead_on_consumer() {
    let ctx = SyncContext::new(&EngineConfig::default());
    let ctx2 = ctx.clone();

    let producer = thread::spawn(move || {
        let mut p = ctx2.spawn_producer();
        let id = p.create_group("g").unwrap();
        p.wait_for_next_frame().unwrap();
        p.destroy(id).unwrap();
        p.wait_for_next_frame().unwrap();
    });

    let mut render = RenderLoop::new(ctx);
    loop {
        render.run_frame();
        if producer.is_finished() {
            break;
        }
    }
    producer.join().unwrap();
    render.run_frame();

    // The destroyed ID is retired on the consumer, never merely absent.
    let id = aria_core::NodeId::from_raw(1);
    assert!(render.store().is_retired(id));
    assert!(!render.store().contains(id));
}

#[test]
fn test_barrier_counts_every_registered_task() {
    const TASKS: usize = 4;
    const FRAMES: u64 = 10;

    let ctx = SyncContext::new(&EngineConfig::default());

    let mut producers = Vec::new();
    for t in 0..TASKS {
        let ctx = ctx.clone();
        producers.push(thread::spawn(move || {
            let mut p = ctx.spawn_producer();
            let node = p.create_group(format!("task-{}", t)).unwrap();
            for frame in 0..FRAMES {
                p.set_position(node, Vec3::splat(frame as f32)).unwrap();
                p.wait_for_next_frame().unwrap();
            }
            p.release_all();
        }));
    }

    let mut render = RenderLoop::new(ctx.clone());
    pump_all(&mut render, producers);

    // Each producer observed FRAMES releases, so the consumer ran at least
    // that many frames, and every task's final write landed.
    assert!(render.store().len() == TASKS);
    for node in render.store().iter() {
        let spatial = node.spatial().unwrap();
        assert_eq!(spatial.transform.position, Vec3::splat((FRAMES - 1) as f32));
    }
}

#[test]
fn test_stores_converge_under_churn() {
    const TASKS: u64 = 4;
    const NODES_PER_TASK: u64 = 200;

    let ctx = SyncContext::new(&EngineConfig::default());

    let mut producers = Vec::new();
    for t in 0..TASKS {
        let ctx = ctx.clone();
        producers.push(thread::spawn(move || {
            let mut p = ctx.spawn_producer();
            let mut mine = Vec::new();
            for i in 0..NODES_PER_TASK {
                let id = p.create_mesh(format!("t{}-n{}", t, i)).unwrap();
                p.set_position(id, Vec3::new(t as f32, i as f32, 0.0)).unwrap();
                mine.push(id);
                if i % 50 == 0 {
                    p.wait_for_next_frame().unwrap();
                }
            }
            // Destroy every other node, keeping the rest alive.
            for chunk in mine.chunks(2) {
                p.destroy(chunk[0]).unwrap();
            }
            p.wait_for_next_frame().unwrap();
            p.release_all();
        }));
    }

    let mut render = RenderLoop::new(ctx.clone());
    pump_all(&mut render, producers);

    let expected = (TASKS * NODES_PER_TASK / 2) as usize;
    assert_eq!(render.store().len(), expected);
    assert_eq!(ctx.live_nodes(), expected);

    // Surviving nodes carry the position their producer last wrote.
    for node in render.store().iter() {
        let spatial = node.spatial().unwrap();
        let t = spatial.transform.position.x as u64;
        assert!(t < TASKS);
    }
}

#[test]
fn test_two_tasks_thousand_nodes_each() {
    const NODES: u64 = 1000;

    let ctx = SyncContext::new(&EngineConfig::default());

    let mut producers = Vec::new();
    for t in 0..2u64 {
        let ctx = ctx.clone();
        producers.push(thread::spawn(move || {
            let mut p = ctx.spawn_producer();
            for i in 0..NODES {
                let id = p.create_group(format!("t{}-{}", t, i)).unwrap();
                p.set_position(id, Vec3::new(t as f32, i as f32, 0.0)).unwrap();
            }
            p.wait_for_next_frame().unwrap();
            p.release_all();
        }));
    }

    let mut render = RenderLoop::new(ctx);
    pump_all(&mut render, producers);

    assert_eq!(render.store().len(), 2 * NODES as usize);

    // Spot-check a handful of snapshots from each task.
    let mut per_task = [0u64, 0];
    for node in render.store().iter() {
        let pos = node.spatial().unwrap().transform.position;
        per_task[pos.x as usize] += 1;
    }
    assert_eq!(per_task, [NODES, NODES]);
}

#[test]
fn test_empty_frames_are_idempotent() {
    let ctx = SyncContext::new(&EngineConfig::default());
    let ctx2 = ctx.clone();

    let producer = thread::spawn(move || {
        let mut p = ctx2.spawn_producer();
        let id = p.create_group("static").unwrap();
        p.set_position(id, Vec3::X).unwrap();
        p.wait_for_next_frame().unwrap();
        p.release_node(id).unwrap();
        id
    });

    let mut render = RenderLoop::new(ctx);
    loop {
        render.run_frame();
        if producer.is_finished() {
            break;
        }
    }
    let id = producer.join().unwrap();
    render.run_frame();

    let before = render.store().len();
    for _ in 0..10 {
        let report = render.run_frame();
        assert_eq!(report.drained, 0);
        assert_eq!(report.applied, 0);
    }
    assert_eq!(render.store().len(), before);
    assert_eq!(
        render.store().get(id).unwrap().spatial().unwrap().transform.position,
        Vec3::X
    );
}

#[test]
fn test_queue_stats_account_for_everything() {
    let ctx = SyncContext::new(&EngineConfig::default());
    let ctx2 = ctx.clone();

    let producer = thread::spawn(move || {
        let mut p = ctx2.spawn_producer();
        let id = p.create_group("counted").unwrap();
        for _ in 0..9 {
            p.set_position(id, Vec3::ONE).unwrap();
        }
        p.wait_for_next_frame().unwrap();
        p.release_all();
    });

    let mut render = RenderLoop::new(ctx);
    loop {
        render.run_frame();
        if producer.is_finished() {
            break;
        }
    }
    producer.join().unwrap();
    render.run_frame();

    let stats = render.queue_stats();
    assert_eq!(stats.pushed, 10);
    assert_eq!(stats.drained, 10);
    assert_eq!(stats.rejected, 0);
    assert!(stats.peak_depth <= 10);
}

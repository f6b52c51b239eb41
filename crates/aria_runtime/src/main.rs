//! Aria demo runtime
//!
//! Spins up a handful of scripted producer tasks against one render loop and
//! runs them to completion, logging per-frame and end-of-run statistics.
//!
//! Run with: cargo run --bin aria
//! Optional first argument: path to a TOML config file.

mod scripts;

use std::thread;
use std::time::{Duration, Instant};

use aria_engine::{EngineConfig, RenderLoop, SyncContext};

const ORBIT_FRAMES: u32 = 240;
const CHURN_FRAMES: u32 = 60;
const STATS_EVERY: u64 = 60;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => match EngineConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                log::error!("could not load {}: {}", path, err);
                std::process::exit(1);
            }
        },
        None => EngineConfig::from_env(),
    };
    config.print_summary();

    let ctx = SyncContext::new(&config);

    let root = match scripts::setup_stage(&ctx) {
        Ok(root) => root,
        Err(err) => {
            log::error!("stage setup failed: {}", err);
            std::process::exit(1);
        }
    };

    let mut producers = Vec::new();
    for (label, radius) in [("red-orbiter", 3.0f32), ("far-orbiter", 5.0)] {
        let ctx = ctx.clone();
        producers.push(thread::spawn(move || {
            if let Err(err) = scripts::orbit(ctx, root, label, radius, ORBIT_FRAMES) {
                log::error!("{}: {}", label, err);
            }
        }));
    }
    {
        let ctx = ctx.clone();
        producers.push(thread::spawn(move || {
            if let Err(err) = scripts::churn(ctx, CHURN_FRAMES, 16) {
                log::error!("churn: {}", err);
            }
        }));
    }

    let mut render = RenderLoop::new(ctx.clone());
    render.on_destroy(|node| {
        log::trace!("freeing consumer resources for {} '{}'", node.id, node.name);
    });

    let started = Instant::now();
    let frame_budget = Duration::from_millis(16);
    loop {
        let frame_start = Instant::now();
        let report = render.run_frame();

        if report.frame % STATS_EVERY == 0 {
            log::info!(
                "frame {}: {} commands ({} applied, {} dropped), {} live nodes",
                report.frame,
                report.drained,
                report.applied,
                report.dropped,
                render.store().len()
            );
        }

        if producers.iter().all(|p| p.is_finished()) {
            break;
        }
        if render.close_requested() {
            log::info!("close requested, shutting down");
            break;
        }
        // Pace to roughly 60 fps; the barrier itself never sleeps the frame.
        if let Some(remaining) = frame_budget.checked_sub(frame_start.elapsed()) {
            thread::sleep(remaining);
        }
    }
    for producer in producers {
        let _ = producer.join();
    }
    // One more frame to drain anything pushed after the last barrier wait.
    let report = render.run_frame();

    let stats = render.queue_stats();
    log::info!(
        "run complete: {} frames in {:.2?}, {} commands pushed, {} drained, {} rejected, peak depth {}",
        report.frame,
        started.elapsed(),
        stats.pushed,
        stats.drained,
        stats.rejected,
        stats.peak_depth
    );
    log::info!("final scene: {} live nodes", render.store().len());
}

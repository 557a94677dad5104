//! Headless orbiter demo
//!
//! Drives the scene with a fixed 120fps timestep: a scripted drag and
//! release, then the launch animation, logging frame snapshots along the
//! way.
//!
//! Run with: cargo run -p orbit_app

use anyhow::Result;
use orbit_animation::AnimationScheduler;
use orbit_app::Scene;
use tracing::info;

const FPS: f32 = 120.0;
const TICK_MS: f32 = 1000.0 / FPS;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let scheduler = AnimationScheduler::new();
    let mut scene = Scene::new(scheduler.handle())?;

    info!("dragging the box out to (120, 80)");
    scene.pointer_down();
    for step in 1..=20 {
        scene.pointer_move(step as f32 * 6.0, step as f32 * 4.0);
        scheduler.advance(TICK_MS);
    }
    scene.pointer_up();

    // Let the spring-back play out.
    run_for(&scheduler, &mut scene, 2.0);

    info!("starting the launch animation");
    scene.start_animation();
    run_for(&scheduler, &mut scene, 3.0);

    info!(animating = scene.is_animating(), "launch finished; orbits continue");
    run_for(&scheduler, &mut scene, 1.0);

    scene.cancel_all();
    info!("scene torn down");
    Ok(())
}

/// Advance the scheduler for `seconds`, logging a frame 4x per second
fn run_for(scheduler: &AnimationScheduler, scene: &mut Scene, seconds: f32) {
    let ticks = (seconds * FPS) as usize;
    for tick in 0..ticks {
        scheduler.advance(TICK_MS);
        if tick % (FPS as usize / 4) == 0 {
            let frame = scene.frame();
            info!(
                pos = ?frame.position,
                rot = %frame.rotation,
                scale = frame.scale,
                opacity = frame.opacity,
                sat1 = ?frame.satellites[0],
                "frame"
            );
        }
    }
}

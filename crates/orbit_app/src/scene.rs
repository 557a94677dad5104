//! The orbiter scene
//!
//! Composition root for the demo: a draggable main box that springs back
//! to center on release, a one-shot "launch" animation (scale pulse, four
//! full rotations, opacity dip), and three satellites orbiting on
//! infinite loops. The scene owns every animated value and all animation
//! descriptions for the lifetime of the mount; the renderer pulls a
//! [`Frame`] snapshot once per tick.

use orbit_animation::{
    Animation, AnimatedValue, AnimatedValueXY, GestureTracker, Interpolator, Result, RunHandle,
    SchedulerHandle, SpringConfig,
};
use std::f32::consts::{PI, TAU};

/// One orbiting satellite: a looping phase value plus the interpolators
/// that derive its offset from the phase.
struct Satellite {
    phase: AnimatedValue,
    orbit: Animation,
    angle: Interpolator,
    offset_x: Interpolator,
    offset_y: Interpolator,
    run: Option<RunHandle>,
}

impl Satellite {
    fn new(
        orbit_ms: f32,
        x_outputs: [f32; 3],
        y_inputs: &[f32],
        y_outputs: &[f32],
    ) -> Result<Self> {
        let phase = AnimatedValue::new(0.0);
        let orbit = Animation::loop_forever(Animation::timing(&phase, 1.0, orbit_ms)?);
        Ok(Self {
            orbit,
            angle: Interpolator::new(&[0.0, 1.0], &[0.0, TAU])?,
            offset_x: Interpolator::new(&[0.0, PI, TAU], &x_outputs)?,
            offset_y: Interpolator::new(y_inputs, y_outputs)?,
            run: None,
            phase,
        })
    }

    fn offset(&self) -> (f32, f32) {
        let angle = self.angle.evaluate(self.phase.read());
        (
            self.offset_x.evaluate(angle),
            self.offset_y.evaluate(angle),
        )
    }
}

/// Read-only per-tick snapshot for the renderer
#[derive(Clone, Debug)]
pub struct Frame {
    /// Main box translation
    pub position: (f32, f32),
    /// Main box rotation, formatted for the transform consumer
    pub rotation: String,
    pub scale: f32,
    pub opacity: f32,
    /// Satellite offsets relative to the main box
    pub satellites: [(f32, f32); 3],
}

/// Owns all animated values and animation trees for the mounted scene
pub struct Scene {
    scheduler: SchedulerHandle,
    position: AnimatedValueXY,
    rotation: AnimatedValue,
    scale: AnimatedValue,
    opacity: AnimatedValue,
    spin: Interpolator,
    satellites: [Satellite; 3],
    launch: Animation,
    launch_run: Option<RunHandle>,
    tracker: GestureTracker,
}

impl Scene {
    pub fn new(scheduler: SchedulerHandle) -> Result<Self> {
        let position = AnimatedValueXY::default();
        let rotation = AnimatedValue::new(0.0);
        let scale = AnimatedValue::new(1.0);
        let opacity = AnimatedValue::new(1.0);

        // Rotation value runs 0..4; the renderer sees it as four full turns.
        let spin = Interpolator::new(&[0.0, 4.0], &[0.0, 1440.0])?;

        let cardinal = [0.0, PI / 2.0, PI, PI * 1.5, TAU];
        let satellites = [
            Satellite::new(
                2000.0,
                [-50.0, 50.0, -50.0],
                &cardinal,
                &[0.0, -50.0, 0.0, 50.0, 0.0],
            )?,
            Satellite::new(
                3000.0,
                [50.0, -50.0, 50.0],
                &cardinal,
                &[0.0, 50.0, 0.0, -50.0, 0.0],
            )?,
            Satellite::new(
                4000.0,
                [0.0, 0.0, 0.0],
                &[0.0, PI, TAU],
                &[-70.0, 70.0, -70.0],
            )?,
        ];

        // The launch tree joins only the finite parts. The satellite loops
        // run as separate runs so the "is animating" flag can clear; an
        // infinite loop inside this AND-join would gate it forever.
        let launch = Animation::parallel(vec![
            Animation::sequence(vec![
                Animation::timing(&scale, 1.5, 1000.0)?,
                Animation::timing(&scale, 1.0, 1000.0)?,
            ]),
            Animation::timing(&rotation, 4.0, 2000.0)?,
            Animation::sequence(vec![
                Animation::timing(&opacity, 0.5, 1000.0)?,
                Animation::timing(&opacity, 1.0, 1000.0)?,
            ]),
        ]);

        let tracker = GestureTracker::new(scheduler.clone(), position.clone())
            .with_spring(SpringConfig::gentle());

        Ok(Self {
            scheduler,
            position,
            rotation,
            scale,
            opacity,
            spin,
            satellites,
            launch,
            launch_run: None,
            tracker,
        })
    }

    /// Start the launch animation and the satellite orbits
    ///
    /// Restarting while a launch is in flight preempts the previous run
    /// (the scheduler cancels it value by value).
    pub fn start_animation(&mut self) -> RunHandle {
        let run = self.scheduler.start(self.launch.clone());
        self.launch_run = Some(run.clone());
        for satellite in &mut self.satellites {
            satellite.run = Some(self.scheduler.start(satellite.orbit.clone()));
        }
        run
    }

    /// Whether the launch animation is still running
    ///
    /// Deliberately ignores the satellite orbits; those never complete.
    pub fn is_animating(&self) -> bool {
        self.launch_run
            .as_ref()
            .map(|run| run.is_running())
            .unwrap_or(false)
    }

    /// Tear down every run, including the satellite orbits (unmount path)
    pub fn cancel_all(&mut self) {
        if let Some(run) = self.launch_run.take() {
            run.cancel();
        }
        for satellite in &mut self.satellites {
            if let Some(run) = satellite.run.take() {
                run.cancel();
            }
        }
        // Also drops a spring-back that may still be in flight.
        self.scheduler.cancel_all();
    }

    // Gesture input, pre-decoded by the platform layer.

    pub fn pointer_down(&mut self) {
        self.tracker.pointer_down();
    }

    pub fn pointer_move(&mut self, dx: f32, dy: f32) {
        self.tracker.pointer_move(dx, dy);
    }

    pub fn pointer_up(&mut self) {
        self.tracker.pointer_up();
    }

    /// Snapshot the current visual parameters
    pub fn frame(&self) -> Frame {
        Frame {
            position: self.position.read(),
            rotation: self.spin.evaluate_deg(self.rotation.read()),
            scale: self.scale.read(),
            opacity: self.opacity.read(),
            satellites: [
                self.satellites[0].offset(),
                self.satellites[1].offset(),
                self.satellites[2].offset(),
            ],
        }
    }
}

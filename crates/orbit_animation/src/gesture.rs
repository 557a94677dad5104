//! Drag gesture tracking
//!
//! Converts pre-decoded pointer deltas into direct writes on an
//! [`AnimatedValueXY`], then hands the pair back to a spring run on
//! release. Direct gesture writes are the one path that mutates values
//! synchronously instead of going through a timed run.

use crate::node::Animation;
use crate::scheduler::{RunHandle, SchedulerHandle};
use crate::spring::SpringConfig;
use crate::value::AnimatedValueXY;

/// Gesture lifecycle
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GesturePhase {
    Idle,
    Dragging {
        origin: (f32, f32),
        delta: (f32, f32),
    },
    /// Pointer is up and the spring-back run is in flight
    Released,
}

/// Tracks one drag gesture against a single 2D value pair
///
/// The tracker holds the tracked pair and a scheduler handle and nothing
/// else; it cannot touch any other animated state. Moves write straight
/// into the pair; release starts a spring run back to rest. A pointer-down
/// while the spring is still in flight cancels it and resumes tracking
/// from the spring's current position.
pub struct GestureTracker {
    target: AnimatedValueXY,
    scheduler: SchedulerHandle,
    spring: SpringConfig,
    phase: GesturePhase,
    spring_back: Option<RunHandle>,
}

impl GestureTracker {
    pub fn new(scheduler: SchedulerHandle, target: AnimatedValueXY) -> Self {
        Self {
            target,
            scheduler,
            spring: SpringConfig::gentle(),
            phase: GesturePhase::Idle,
            spring_back: None,
        }
    }

    /// Override the spring used for the release return
    pub fn with_spring(mut self, config: SpringConfig) -> Self {
        self.spring = config;
        self
    }

    /// Current phase, after folding a settled spring-back into `Idle`
    pub fn phase(&mut self) -> GesturePhase {
        self.settle();
        self.phase
    }

    /// Pointer went down on the tracked element
    pub fn pointer_down(&mut self) {
        self.settle();
        if let Some(run) = self.spring_back.take() {
            // Resume direct tracking from wherever the spring left the
            // value; continuity over snapping.
            run.cancel();
        }
        self.phase = GesturePhase::Dragging {
            origin: self.target.read(),
            delta: (0.0, 0.0),
        };
    }

    /// Pointer moved by `(dx, dy)` since the gesture began
    ///
    /// Writes the pair synchronously, bypassing the scheduler. Moves
    /// arriving while the spring-back is in flight are dropped.
    pub fn pointer_move(&mut self, dx: f32, dy: f32) {
        self.settle();
        if let GesturePhase::Dragging { origin, delta } = &mut self.phase {
            *delta = (dx, dy);
            let (ox, oy) = *origin;
            self.target.write(ox + dx, oy + dy);
        }
    }

    /// Pointer released; spring the pair back to the rest position
    pub fn pointer_up(&mut self) {
        self.settle();
        if !matches!(self.phase, GesturePhase::Dragging { .. }) {
            return;
        }
        // The rest target is a finite constant, so this cannot fail.
        if let Ok(spring) = Animation::spring(&self.target, (0.0, 0.0), self.spring) {
            self.spring_back = Some(self.scheduler.start(spring));
        }
        self.phase = GesturePhase::Released;
    }

    /// Fold a finished spring-back into the idle phase
    fn settle(&mut self) {
        if self.phase == GesturePhase::Released {
            let done = self
                .spring_back
                .as_ref()
                .map(|run| !run.is_running())
                .unwrap_or(true);
            if done {
                self.spring_back = None;
                self.phase = GesturePhase::Idle;
            }
        }
    }
}

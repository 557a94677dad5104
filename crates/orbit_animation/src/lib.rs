//! Orbit Animation Engine
//!
//! Declarative, composable value animation driven by a shared clock.
//!
//! # Features
//!
//! - **Animated values**: observable scalars (and 2D pairs) with
//!   version-stamped readings and synchronous subscribers
//! - **Interpolators**: piecewise-linear breakpoint mapping with clamp or
//!   extend extrapolation, plus degree-string formatting
//! - **Composable nodes**: timed tweens, spring physics, sequences,
//!   parallels, and finite/infinite loops in one tree
//! - **Scheduler**: advances every active run once per tick; one active
//!   run per value, newest run wins
//! - **Poll-able completion**: each run exposes an observable
//!   running/completed/cancelled state instead of a callback
//! - **Gesture tracking**: direct drag writes with spring-back on release

pub mod easing;
pub mod error;
pub mod gesture;
pub mod interpolate;
pub mod node;
pub mod scheduler;
pub mod spring;
pub mod value;

pub use easing::Easing;
pub use error::{ConfigError, Result};
pub use gesture::{GesturePhase, GestureTracker};
pub use interpolate::{Extrapolate, Interpolator};
pub use node::{Animation, LoopCount};
pub use scheduler::{AnimationScheduler, RunHandle, RunId, RunState, SchedulerHandle};
pub use spring::{Spring, SpringConfig};
pub use value::{AnimatedValue, AnimatedValueXY, SubscriptionId, ValueId};

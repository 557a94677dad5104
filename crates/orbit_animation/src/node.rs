//! Composable animation nodes
//!
//! An [`Animation`] is an immutable description tree: leaves move values
//! (timed tween or spring), interior nodes compose (sequence, parallel,
//! loop). Trees are validated here at construction; the scheduler turns a
//! tree into a run and snapshots the targeted values at start time.

use crate::easing::Easing;
use crate::error::{ConfigError, Result};
use crate::spring::SpringConfig;
use crate::value::{AnimatedValue, AnimatedValueXY, ValueId};
use smallvec::SmallVec;

/// Iteration policy for [`Animation::looped`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopCount {
    Finite(u32),
    Infinite,
}

/// Timed tween toward a target value
#[derive(Clone, Debug)]
pub struct Timing {
    pub(crate) target: AnimatedValue,
    pub(crate) to_value: f32,
    pub(crate) duration_ms: f32,
    pub(crate) easing: Easing,
}

/// Spring motion of a 2D pair toward a target point
#[derive(Clone, Debug)]
pub struct SpringTo {
    pub(crate) target: AnimatedValueXY,
    pub(crate) to_value: (f32, f32),
    pub(crate) config: SpringConfig,
}

/// A composable animation description
#[derive(Clone, Debug)]
pub enum Animation {
    Timing(Timing),
    Spring(SpringTo),
    /// Children run one after another; completes with the last child
    Sequence(Vec<Animation>),
    /// Children run together; completes when all children complete
    Parallel(Vec<Animation>),
    /// Child restarts from its start state on each completion
    Loop {
        child: Box<Animation>,
        iterations: LoopCount,
    },
}

impl Animation {
    /// Linear tween of `value` to `to_value` over `duration_ms`
    pub fn timing(value: &AnimatedValue, to_value: f32, duration_ms: f32) -> Result<Self> {
        Self::timing_eased(value, to_value, duration_ms, Easing::Linear)
    }

    /// Tween with an explicit easing curve
    pub fn timing_eased(
        value: &AnimatedValue,
        to_value: f32,
        duration_ms: f32,
        easing: Easing,
    ) -> Result<Self> {
        if !duration_ms.is_finite() || duration_ms < 0.0 {
            return Err(ConfigError::InvalidDuration(duration_ms));
        }
        if !to_value.is_finite() {
            return Err(ConfigError::NonFiniteTarget(to_value));
        }
        Ok(Animation::Timing(Timing {
            target: value.clone(),
            to_value,
            duration_ms,
            easing,
        }))
    }

    /// Spring the pair toward `to_value` with the given physics
    pub fn spring(
        pair: &AnimatedValueXY,
        to_value: (f32, f32),
        config: SpringConfig,
    ) -> Result<Self> {
        if !to_value.0.is_finite() {
            return Err(ConfigError::NonFiniteTarget(to_value.0));
        }
        if !to_value.1.is_finite() {
            return Err(ConfigError::NonFiniteTarget(to_value.1));
        }
        Ok(Animation::Spring(SpringTo {
            target: pair.clone(),
            to_value,
            config,
        }))
    }

    /// Run children back to back; an empty sequence completes immediately
    pub fn sequence(children: Vec<Animation>) -> Self {
        Animation::Sequence(children)
    }

    /// Run children together with an AND-join on completion
    pub fn parallel(children: Vec<Animation>) -> Self {
        Animation::Parallel(children)
    }

    /// Repeat `child` per the iteration policy
    pub fn looped(child: Animation, iterations: LoopCount) -> Self {
        Animation::Loop {
            child: Box::new(child),
            iterations,
        }
    }

    /// Repeat `child` until the run is cancelled
    pub fn loop_forever(child: Animation) -> Self {
        Self::looped(child, LoopCount::Infinite)
    }

    /// Identities of every value this tree writes to
    pub(crate) fn collect_target_ids(&self, out: &mut SmallVec<[ValueId; 8]>) {
        match self {
            Animation::Timing(t) => {
                if !out.contains(&t.target.id()) {
                    out.push(t.target.id());
                }
            }
            Animation::Spring(s) => {
                for id in [s.target.x.id(), s.target.y.id()] {
                    if !out.contains(&id) {
                        out.push(id);
                    }
                }
            }
            Animation::Sequence(children) | Animation::Parallel(children) => {
                for child in children {
                    child.collect_target_ids(out);
                }
            }
            Animation::Loop { child, .. } => child.collect_target_ids(out),
        }
    }

    /// Handles of every value this tree writes to
    pub(crate) fn collect_values(&self, out: &mut Vec<AnimatedValue>) {
        match self {
            Animation::Timing(t) => {
                if !out.iter().any(|v| v.id() == t.target.id()) {
                    out.push(t.target.clone());
                }
            }
            Animation::Spring(s) => {
                for axis in [&s.target.x, &s.target.y] {
                    if !out.iter().any(|v| v.id() == axis.id()) {
                        out.push(axis.clone());
                    }
                }
            }
            Animation::Sequence(children) | Animation::Parallel(children) => {
                for child in children {
                    child.collect_values(out);
                }
            }
            Animation::Loop { child, .. } => child.collect_values(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_duration_rejected() {
        let value = AnimatedValue::new(0.0);
        assert!(matches!(
            Animation::timing(&value, 1.0, f32::NAN).unwrap_err(),
            ConfigError::InvalidDuration(_)
        ));
        assert_eq!(
            Animation::timing(&value, 1.0, -10.0).unwrap_err(),
            ConfigError::InvalidDuration(-10.0)
        );
    }

    #[test]
    fn non_finite_target_rejected() {
        let value = AnimatedValue::new(0.0);
        assert!(Animation::timing(&value, f32::INFINITY, 100.0).is_err());

        let pair = AnimatedValueXY::default();
        assert!(Animation::spring(&pair, (f32::NAN, 0.0), SpringConfig::default()).is_err());
    }

    #[test]
    fn target_ids_are_deduplicated() {
        let value = AnimatedValue::new(0.0);
        let tree = Animation::sequence(vec![
            Animation::timing(&value, 1.0, 100.0).unwrap(),
            Animation::timing(&value, 0.0, 100.0).unwrap(),
        ]);

        let mut ids = SmallVec::new();
        tree.collect_target_ids(&mut ids);
        assert_eq!(ids.len(), 1);
        assert_eq!(ids[0], value.id());
    }

    #[test]
    fn nested_trees_collect_all_targets() {
        let a = AnimatedValue::new(0.0);
        let pair = AnimatedValueXY::default();
        let tree = Animation::parallel(vec![
            Animation::loop_forever(Animation::timing(&a, 1.0, 100.0).unwrap()),
            Animation::spring(&pair, (0.0, 0.0), SpringConfig::default()).unwrap(),
        ]);

        let mut ids = SmallVec::new();
        tree.collect_target_ids(&mut ids);
        assert_eq!(ids.len(), 3);
    }
}

//! Animation scheduler
//!
//! Turns [`Animation`] trees into active runs and advances every run once
//! per tick. A run owns the values it targets for its whole lifetime:
//! starting a new run against a value that is already animating silently
//! cancels the older run (newest writer wins). Completion is a poll-able
//! signal on the [`RunHandle`], never a callback, so ordering and
//! cancellation stay observable in tests.

use crate::easing::Easing;
use crate::node::{Animation, LoopCount};
use crate::spring::Spring;
use crate::value::{AnimatedValue, AnimatedValueXY, ValueId};
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Weak};
use std::time::Instant;

new_key_type! {
    /// Handle to a registered animation run
    pub struct RunId;
}

/// Springs are physically open-ended; force-complete after this bound.
const SPRING_TIMEOUT_MS: f32 = 5_000.0;

/// Lifecycle of a started run
///
/// `Completed` and `Cancelled` are terminal; a tree can only run again
/// through a fresh `start`, which creates a new run with a new signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Running,
    Completed,
    Cancelled,
}

// ============================================================================
// Per-node run state
// ============================================================================

/// Runtime state for one node of a started tree
///
/// The description tree stays immutable; all mutable progress lives here.
/// Sequence and Loop re-enter the description lazily so child snapshots
/// are taken at the moment each child starts.
enum NodeRun {
    Timing {
        target: AnimatedValue,
        from: f32,
        to: f32,
        duration_ms: f32,
        easing: Easing,
        elapsed_ms: f32,
    },
    Spring {
        target: AnimatedValueXY,
        x: Spring,
        y: Spring,
        elapsed_ms: f32,
    },
    Sequence {
        queue: VecDeque<Animation>,
        current: Box<NodeRun>,
    },
    Parallel {
        children: Vec<NodeRun>,
    },
    Loop {
        template: Animation,
        start_state: Vec<(AnimatedValue, f32)>,
        remaining: LoopCount,
        current: Box<NodeRun>,
    },
}

impl NodeRun {
    /// Start a description node, snapshotting its targets
    ///
    /// Returns `None` when the node completes immediately (empty sequence,
    /// zero-iteration loop), so such nodes never enter the active set.
    fn start(desc: &Animation) -> Option<NodeRun> {
        match desc {
            Animation::Timing(t) => Some(NodeRun::Timing {
                from: t.target.read(),
                target: t.target.clone(),
                to: t.to_value,
                duration_ms: t.duration_ms,
                easing: t.easing,
                elapsed_ms: 0.0,
            }),
            Animation::Spring(s) => {
                let mut x = Spring::new(s.config, s.target.x.read());
                let mut y = Spring::new(s.config, s.target.y.read());
                x.set_target(s.to_value.0);
                y.set_target(s.to_value.1);
                Some(NodeRun::Spring {
                    target: s.target.clone(),
                    x,
                    y,
                    elapsed_ms: 0.0,
                })
            }
            Animation::Sequence(children) => {
                let mut queue: VecDeque<Animation> = children.iter().cloned().collect();
                while let Some(next) = queue.pop_front() {
                    if let Some(current) = NodeRun::start(&next) {
                        return Some(NodeRun::Sequence {
                            queue,
                            current: Box::new(current),
                        });
                    }
                }
                None
            }
            Animation::Parallel(children) => {
                let children: Vec<NodeRun> =
                    children.iter().filter_map(NodeRun::start).collect();
                if children.is_empty() {
                    None
                } else {
                    Some(NodeRun::Parallel { children })
                }
            }
            Animation::Loop { child, iterations } => {
                if *iterations == LoopCount::Finite(0) {
                    return None;
                }
                let mut values = Vec::new();
                child.collect_values(&mut values);
                let start_state = values.into_iter().map(|v| (v.clone(), v.read())).collect();
                let current = NodeRun::start(child)?;
                Some(NodeRun::Loop {
                    template: (**child).clone(),
                    start_state,
                    remaining: *iterations,
                    current: Box::new(current),
                })
            }
        }
    }

    /// Advance by `dt_ms`; returns true when the node completed this tick
    fn advance(&mut self, dt_ms: f32) -> bool {
        match self {
            NodeRun::Timing {
                target,
                from,
                to,
                duration_ms,
                easing,
                elapsed_ms,
            } => {
                *elapsed_ms += dt_ms;
                if *elapsed_ms >= *duration_ms {
                    // Clamp the final write so the value lands exactly on
                    // the target, with no floating drift.
                    target.write(*to);
                    true
                } else {
                    let t = *elapsed_ms / *duration_ms;
                    target.write(*from + (*to - *from) * easing.apply(t));
                    false
                }
            }
            NodeRun::Spring {
                target,
                x,
                y,
                elapsed_ms,
            } => {
                *elapsed_ms += dt_ms;
                let dt = dt_ms / 1000.0;
                x.step(dt);
                y.step(dt);
                if *elapsed_ms >= SPRING_TIMEOUT_MS || (x.is_settled() && y.is_settled()) {
                    target.write(x.target(), y.target());
                    true
                } else {
                    target.write(x.position(), y.position());
                    false
                }
            }
            NodeRun::Sequence { queue, current } => {
                if !current.advance(dt_ms) {
                    return false;
                }
                // Current child finished inside this tick; the next child
                // starts now and gets its first dt on the next tick.
                while let Some(next) = queue.pop_front() {
                    if let Some(run) = NodeRun::start(&next) {
                        *current = Box::new(run);
                        return false;
                    }
                }
                true
            }
            NodeRun::Parallel { children } => {
                children.retain_mut(|child| !child.advance(dt_ms));
                children.is_empty()
            }
            NodeRun::Loop {
                template,
                start_state,
                remaining,
                current,
            } => {
                if !current.advance(dt_ms) {
                    return false;
                }
                if let LoopCount::Finite(n) = remaining {
                    *n -= 1;
                    if *n == 0 {
                        return true;
                    }
                }
                // Restart the child from the state captured when the loop
                // itself started.
                for (value, initial) in start_state.iter() {
                    value.write(*initial);
                }
                match NodeRun::start(template) {
                    Some(run) => {
                        *current = Box::new(run);
                        false
                    }
                    None => true,
                }
            }
        }
    }
}

// ============================================================================
// Scheduler
// ============================================================================

struct ActiveRun {
    root: NodeRun,
    signal: Arc<Mutex<RunState>>,
}

struct SchedulerInner {
    runs: SlotMap<RunId, ActiveRun>,
    /// Registration order; slotmap iteration order is not insertion order
    order: Vec<RunId>,
    /// Which run currently owns each targeted value
    owners: FxHashMap<ValueId, RunId>,
    last_frame: Instant,
}

impl SchedulerInner {
    fn start(&mut self, animation: Animation) -> (Option<RunId>, Arc<Mutex<RunState>>) {
        let mut targets: SmallVec<[ValueId; 8]> = SmallVec::new();
        animation.collect_target_ids(&mut targets);

        // Single-ownership invariant: the newest run targeting a value
        // wins, and the superseded run is cancelled whole.
        for value_id in &targets {
            if let Some(&owner) = self.owners.get(value_id) {
                tracing::debug!(?owner, ?value_id, "preempting run on busy value");
                self.cancel(owner);
            }
        }

        let signal = Arc::new(Mutex::new(RunState::Running));
        match NodeRun::start(&animation) {
            None => {
                *signal.lock().unwrap() = RunState::Completed;
                (None, signal)
            }
            Some(root) => {
                let id = self.runs.insert(ActiveRun {
                    root,
                    signal: Arc::clone(&signal),
                });
                self.order.push(id);
                for value_id in targets {
                    self.owners.insert(value_id, id);
                }
                // Fresh runs should not see the idle time since the last
                // tick as their first dt.
                self.last_frame = Instant::now();
                tracing::trace!(?id, "animation run started");
                (Some(id), signal)
            }
        }
    }

    fn advance(&mut self, dt_ms: f32) {
        let ids: Vec<RunId> = self.order.clone();
        for id in ids {
            let done = match self.runs.get_mut(id) {
                Some(run) => run.root.advance(dt_ms),
                None => continue,
            };
            if done {
                if let Some(run) = self.runs.remove(id) {
                    *run.signal.lock().unwrap() = RunState::Completed;
                }
                self.detach(id);
                tracing::trace!(?id, "animation run completed");
            }
        }
    }

    fn cancel(&mut self, id: RunId) {
        if let Some(run) = self.runs.remove(id) {
            *run.signal.lock().unwrap() = RunState::Cancelled;
            self.detach(id);
            tracing::debug!(?id, "animation run cancelled");
        }
    }

    fn cancel_all(&mut self) {
        let ids: Vec<RunId> = self.order.clone();
        for id in ids {
            self.cancel(id);
        }
    }

    /// Remove every scheduler reference to a finished or cancelled run
    fn detach(&mut self, id: RunId) {
        self.order.retain(|run| *run != id);
        self.owners.retain(|_, owner| *owner != id);
    }
}

/// Drives all active animation runs forward once per rendering tick
///
/// Single logical thread of execution: the embedder calls [`tick`] (or
/// [`advance`] with an explicit delta) once per display refresh, and every
/// active run is advanced in registration order.
///
/// [`tick`]: AnimationScheduler::tick
/// [`advance`]: AnimationScheduler::advance
pub struct AnimationScheduler {
    inner: Arc<Mutex<SchedulerInner>>,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SchedulerInner {
                runs: SlotMap::with_key(),
                order: Vec::new(),
                owners: FxHashMap::default(),
                last_frame: Instant::now(),
            })),
        }
    }

    /// Weak handle for components that need to start or cancel runs
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Start an animation tree as a new run
    ///
    /// The tree snapshots its targets now. Any already-active run claiming
    /// one of the same values is cancelled before this run registers.
    pub fn start(&self, animation: Animation) -> RunHandle {
        let (id, signal) = self.inner.lock().unwrap().start(animation);
        RunHandle {
            scheduler: self.handle(),
            id,
            signal,
        }
    }

    /// Advance every active run by an explicit delta (milliseconds)
    ///
    /// Deterministic entry point used by tests and fixed-timestep drivers.
    pub fn advance(&self, dt_ms: f32) {
        self.inner.lock().unwrap().advance(dt_ms);
    }

    /// Advance using wall-clock time elapsed since the previous tick
    pub fn tick(&self) {
        let mut inner = self.inner.lock().unwrap();
        let now = Instant::now();
        let dt_ms = (now - inner.last_frame).as_secs_f32() * 1000.0;
        inner.last_frame = now;
        inner.advance(dt_ms);
    }

    /// Cancel every active run (unmount path)
    pub fn cancel_all(&self) {
        self.inner.lock().unwrap().cancel_all();
    }

    /// Number of active runs
    pub fn active_count(&self) -> usize {
        self.inner.lock().unwrap().runs.len()
    }

    /// Whether any run still needs ticking
    pub fn has_active_runs(&self) -> bool {
        self.active_count() > 0
    }
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// A weak handle to the scheduler
///
/// Held by the gesture tracker and the composition root; does not keep the
/// scheduler alive. Operations no-op once the scheduler is dropped.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Weak<Mutex<SchedulerInner>>,
}

impl SchedulerHandle {
    /// Start a run; see [`AnimationScheduler::start`]
    ///
    /// If the scheduler is gone the returned handle reads `Cancelled`.
    pub fn start(&self, animation: Animation) -> RunHandle {
        match self.inner.upgrade() {
            Some(inner) => {
                let (id, signal) = inner.lock().unwrap().start(animation);
                RunHandle {
                    scheduler: self.clone(),
                    id,
                    signal,
                }
            }
            None => RunHandle {
                scheduler: self.clone(),
                id: None,
                signal: Arc::new(Mutex::new(RunState::Cancelled)),
            },
        }
    }

    /// Cancel every active run
    pub fn cancel_all(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.lock().unwrap().cancel_all();
        }
    }

    fn cancel(&self, id: RunId) {
        if let Some(inner) = self.inner.upgrade() {
            inner.lock().unwrap().cancel(id);
        }
    }

    /// Whether the scheduler is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

/// Observable result of a started run
///
/// Poll [`state`](RunHandle::state) to learn whether the run is still
/// going, completed, or was cancelled (either explicitly or by a newer
/// run preempting one of its values). A cancelled run never reports
/// completion.
#[derive(Clone)]
pub struct RunHandle {
    scheduler: SchedulerHandle,
    id: Option<RunId>,
    signal: Arc<Mutex<RunState>>,
}

impl RunHandle {
    pub fn state(&self) -> RunState {
        *self.signal.lock().unwrap()
    }

    pub fn is_running(&self) -> bool {
        self.state() == RunState::Running
    }

    pub fn is_completed(&self) -> bool {
        self.state() == RunState::Completed
    }

    pub fn is_cancelled(&self) -> bool {
        self.state() == RunState::Cancelled
    }

    /// Synchronously detach the whole run from the scheduler
    ///
    /// Every descendant node leaves the active set before this returns; no
    /// later tick observes the run, and completion is never reported.
    pub fn cancel(&self) {
        if let Some(id) = self.id {
            self.scheduler.cancel(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spring::SpringConfig;

    const TICK_MS: f32 = 100.0;

    fn advance_ticks(scheduler: &AnimationScheduler, ticks: usize) {
        for _ in 0..ticks {
            scheduler.advance(TICK_MS);
        }
    }

    #[test]
    fn timing_lands_exactly_on_target() {
        let scheduler = AnimationScheduler::new();
        let value = AnimatedValue::new(0.0);

        let run = scheduler.start(Animation::timing(&value, 1.5, 1000.0).unwrap());
        advance_ticks(&scheduler, 5);
        assert!(run.is_running());
        assert!((value.read() - 0.75).abs() < 1e-4);

        advance_ticks(&scheduler, 5);
        assert!(run.is_completed());
        assert_eq!(value.read(), 1.5);
        assert!(!scheduler.has_active_runs());
    }

    #[test]
    fn second_run_preempts_first() {
        let scheduler = AnimationScheduler::new();
        let value = AnimatedValue::new(0.0);

        let first = scheduler.start(Animation::timing(&value, 1.5, 1000.0).unwrap());
        advance_ticks(&scheduler, 3);
        let second = scheduler.start(Animation::timing(&value, 1.0, 1000.0).unwrap());

        assert!(first.is_cancelled());
        assert_eq!(scheduler.active_count(), 1);

        advance_ticks(&scheduler, 10);
        assert!(first.is_cancelled(), "cancelled run must never complete");
        assert!(second.is_completed());
        assert_eq!(value.read(), 1.0);
    }

    #[test]
    fn back_to_back_timings_end_exactly_at_one() {
        // Timing(1.5, 1000ms) then Timing(1.0, 1000ms): after 2000ms plus
        // at least one further tick the value reads exactly 1.0.
        let scheduler = AnimationScheduler::new();
        let value = AnimatedValue::new(1.0);

        let run = scheduler.start(Animation::sequence(vec![
            Animation::timing(&value, 1.5, 1000.0).unwrap(),
            Animation::timing(&value, 1.0, 1000.0).unwrap(),
        ]));

        advance_ticks(&scheduler, 21);
        assert!(run.is_completed());
        assert_eq!(value.read(), 1.0);
    }

    #[test]
    fn sequence_duration_is_sum_of_children() {
        let scheduler = AnimationScheduler::new();
        let value = AnimatedValue::new(0.0);

        let run = scheduler.start(Animation::sequence(vec![
            Animation::timing(&value, 1.0, 600.0).unwrap(),
            Animation::timing(&value, 2.0, 400.0).unwrap(),
        ]));

        // Sum is 1000ms = 10 ticks; allow one extra tick for the handoff.
        advance_ticks(&scheduler, 9);
        assert!(run.is_running());
        advance_ticks(&scheduler, 2);
        assert!(run.is_completed());
        assert_eq!(value.read(), 2.0);
    }

    #[test]
    fn empty_sequence_completes_immediately() {
        let scheduler = AnimationScheduler::new();
        let run = scheduler.start(Animation::sequence(vec![]));

        assert!(run.is_completed());
        assert!(!scheduler.has_active_runs());
    }

    #[test]
    fn sequence_child_snapshot_taken_at_child_start() {
        let scheduler = AnimationScheduler::new();
        let a = AnimatedValue::new(0.0);
        let b = AnimatedValue::new(0.0);

        scheduler.start(Animation::sequence(vec![
            Animation::timing(&a, 10.0, 500.0).unwrap(),
            Animation::timing(&b, 20.0, 500.0).unwrap(),
        ]));

        // While the first child runs, b must not move.
        advance_ticks(&scheduler, 4);
        assert_eq!(b.read(), 0.0);
        advance_ticks(&scheduler, 8);
        assert_eq!(b.read(), 20.0);
    }

    #[test]
    fn parallel_completes_at_slowest_child() {
        let scheduler = AnimationScheduler::new();
        let a = AnimatedValue::new(0.0);
        let b = AnimatedValue::new(0.0);

        let run = scheduler.start(Animation::parallel(vec![
            Animation::timing(&a, 1.0, 300.0).unwrap(),
            Animation::timing(&b, 1.0, 900.0).unwrap(),
        ]));

        advance_ticks(&scheduler, 4);
        assert_eq!(a.read(), 1.0);
        assert!(run.is_running());

        advance_ticks(&scheduler, 5);
        assert!(run.is_completed());
        assert_eq!(b.read(), 1.0);
    }

    #[test]
    fn parallel_with_infinite_loop_never_completes() {
        let scheduler = AnimationScheduler::new();
        let a = AnimatedValue::new(0.0);
        let phase = AnimatedValue::new(0.0);

        let run = scheduler.start(Animation::parallel(vec![
            Animation::timing(&a, 1.0, 200.0).unwrap(),
            Animation::loop_forever(Animation::timing(&phase, 1.0, 400.0).unwrap()),
        ]));

        advance_ticks(&scheduler, 100);
        assert!(run.is_running());
        assert_eq!(a.read(), 1.0);
    }

    #[test]
    fn finite_loop_restarts_from_start_state() {
        let scheduler = AnimationScheduler::new();
        let phase = AnimatedValue::new(0.0);

        let run = scheduler.start(Animation::looped(
            Animation::timing(&phase, 1.0, 500.0).unwrap(),
            LoopCount::Finite(3),
        ));

        // First iteration ends at tick 5 and the value snaps back to 0.
        advance_ticks(&scheduler, 5);
        assert!(run.is_running());
        assert_eq!(phase.read(), 0.0);

        // 3 iterations x 5 ticks, plus the two restart handoffs.
        advance_ticks(&scheduler, 12);
        assert!(run.is_completed());
        assert_eq!(phase.read(), 1.0);
    }

    #[test]
    fn zero_iteration_loop_completes_immediately() {
        let scheduler = AnimationScheduler::new();
        let phase = AnimatedValue::new(0.0);

        let run = scheduler.start(Animation::looped(
            Animation::timing(&phase, 1.0, 500.0).unwrap(),
            LoopCount::Finite(0),
        ));
        assert!(run.is_completed());
        assert_eq!(phase.read(), 0.0);
    }

    #[test]
    fn cancelled_infinite_loop_leaves_active_set() {
        let scheduler = AnimationScheduler::new();
        let phase = AnimatedValue::new(0.0);

        let run = scheduler.start(Animation::loop_forever(
            Animation::timing(&phase, 1.0, 400.0).unwrap(),
        ));
        advance_ticks(&scheduler, 2);
        assert!(scheduler.has_active_runs());

        run.cancel();
        assert!(run.is_cancelled());
        assert!(!scheduler.has_active_runs());

        // No further tick moves the value.
        let before = phase.read();
        advance_ticks(&scheduler, 10);
        assert_eq!(phase.read(), before);
    }

    #[test]
    fn spring_run_settles_on_target() {
        let scheduler = AnimationScheduler::new();
        let pair = AnimatedValueXY::new(40.0, -25.0);

        let run = scheduler.start(
            Animation::spring(&pair, (0.0, 0.0), SpringConfig::gentle()).unwrap(),
        );

        for _ in 0..600 {
            scheduler.advance(1000.0 / 120.0);
            if !run.is_running() {
                break;
            }
        }
        assert!(run.is_completed());
        assert_eq!(pair.read(), (0.0, 0.0));
    }

    #[test]
    fn spring_run_is_capped() {
        // An extremely underdamped spring may oscillate past any settle
        // threshold; the timeout forces termination at the target.
        let scheduler = AnimationScheduler::new();
        let pair = AnimatedValueXY::new(500.0, 0.0);

        let run = scheduler.start(
            Animation::spring(&pair, (0.0, 0.0), SpringConfig::new(800.0, 0.2, 1.0)).unwrap(),
        );

        for _ in 0..650 {
            scheduler.advance(10.0);
        }
        assert!(run.is_completed());
        assert_eq!(pair.read(), (0.0, 0.0));
    }

    #[test]
    fn runs_advance_in_registration_order() {
        let scheduler = AnimationScheduler::new();
        let a = AnimatedValue::new(0.0);
        let b = AnimatedValue::new(0.0);
        let order = Arc::new(Mutex::new(Vec::new()));

        for (value, tag) in [(&a, "a"), (&b, "b")] {
            let order = Arc::clone(&order);
            value.subscribe(move |_| order.lock().unwrap().push(tag));
            scheduler.start(Animation::timing(value, 1.0, 500.0).unwrap());
        }

        scheduler.advance(TICK_MS);
        assert_eq!(*order.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn cancel_all_tears_down_every_run() {
        let scheduler = AnimationScheduler::new();
        let a = AnimatedValue::new(0.0);
        let phase = AnimatedValue::new(0.0);

        let finite = scheduler.start(Animation::timing(&a, 1.0, 1000.0).unwrap());
        let infinite = scheduler.start(Animation::loop_forever(
            Animation::timing(&phase, 1.0, 400.0).unwrap(),
        ));

        scheduler.cancel_all();
        assert!(finite.is_cancelled());
        assert!(infinite.is_cancelled());
        assert!(!scheduler.has_active_runs());
    }

    #[test]
    fn dropped_scheduler_yields_cancelled_runs() {
        let handle = {
            let scheduler = AnimationScheduler::new();
            scheduler.handle()
        };
        assert!(!handle.is_alive());

        let value = AnimatedValue::new(0.0);
        let run = handle.start(Animation::timing(&value, 1.0, 100.0).unwrap());
        assert!(run.is_cancelled());
    }
}

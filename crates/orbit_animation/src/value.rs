//! Observable animated values
//!
//! An [`AnimatedValue`] is a shared, mutable scalar read by interpolators
//! and the renderer, and written by exactly two callers: the scheduler
//! (timed animation runs) and the gesture tracker (direct writes during a
//! drag). Both go through the same [`AnimatedValue::write`] path.

use slotmap::{new_key_type, SlotMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

new_key_type! {
    /// Token returned by [`AnimatedValue::subscribe`]
    pub struct SubscriptionId;
}

/// Process-unique identity of an animated value
///
/// The scheduler keys its value-ownership table on this, so it never has
/// to compare value handles by pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ValueId(u64);

fn next_value_id() -> ValueId {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    ValueId(COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// Callback invoked with the new reading after each write
pub type ValueCallback = Box<dyn FnMut(f32) + Send>;

struct ValueState {
    current: f32,
    version: u64,
}

/// A shared, observable scalar driving visual output
///
/// Cheap to clone; all clones refer to the same underlying state, and
/// every write is serialized through a single mutex. No bounds checking
/// is performed on written values; interpolators and other consumers are
/// responsible for semantic validity.
#[derive(Clone)]
pub struct AnimatedValue {
    id: ValueId,
    state: Arc<Mutex<ValueState>>,
    subscribers: Arc<Mutex<SlotMap<SubscriptionId, ValueCallback>>>,
}

impl AnimatedValue {
    pub fn new(initial: f32) -> Self {
        Self {
            id: next_value_id(),
            state: Arc::new(Mutex::new(ValueState {
                current: initial,
                version: 0,
            })),
            subscribers: Arc::new(Mutex::new(SlotMap::with_key())),
        }
    }

    /// Identity of this value (stable across clones)
    pub fn id(&self) -> ValueId {
        self.id
    }

    /// Current reading
    pub fn read(&self) -> f32 {
        self.state.lock().unwrap().current
    }

    /// Current reading together with its version stamp
    ///
    /// The version increments on every write, so a consumer can detect
    /// whether a value changed between two pulls without comparing floats.
    pub fn read_versioned(&self) -> (f32, u64) {
        let state = self.state.lock().unwrap();
        (state.current, state.version)
    }

    /// Write a new reading and notify subscribers synchronously
    ///
    /// Subscribers run in subscription order before this returns. The
    /// subscriber list is locked during notification; callbacks must not
    /// subscribe or unsubscribe on the same value.
    pub fn write(&self, v: f32) {
        {
            let mut state = self.state.lock().unwrap();
            state.current = v;
            state.version += 1;
        }
        let mut subscribers = self.subscribers.lock().unwrap();
        for (_, cb) in subscribers.iter_mut() {
            cb(v);
        }
    }

    /// Register a change callback; returns a token for [`unsubscribe`](Self::unsubscribe)
    pub fn subscribe<F>(&self, cb: F) -> SubscriptionId
    where
        F: FnMut(f32) + Send + 'static,
    {
        self.subscribers.lock().unwrap().insert(Box::new(cb))
    }

    /// Remove a previously registered callback
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.lock().unwrap().remove(id);
    }

    /// Number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }
}

impl std::fmt::Debug for AnimatedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (value, version) = self.read_versioned();
        f.debug_struct("AnimatedValue")
            .field("id", &self.id)
            .field("value", &value)
            .field("version", &version)
            .finish()
    }
}

/// A pair of independently addressable values for 2D motion
///
/// This is a convenience grouping over two [`AnimatedValue`]s, not a new
/// primitive; each axis keeps its own identity, subscribers, and version.
#[derive(Clone, Debug)]
pub struct AnimatedValueXY {
    pub x: AnimatedValue,
    pub y: AnimatedValue,
}

impl AnimatedValueXY {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: AnimatedValue::new(x),
            y: AnimatedValue::new(y),
        }
    }

    pub fn read(&self) -> (f32, f32) {
        (self.x.read(), self.y.read())
    }

    pub fn write(&self, x: f32, y: f32) {
        self.x.write(x);
        self.y.write(y);
    }
}

impl Default for AnimatedValueXY {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

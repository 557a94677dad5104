//! Damped spring simulation
//!
//! Scalar spring physics used by the `Spring` animation node and the
//! gesture spring-back. Integrated with RK4 so large tick deltas stay
//! stable.

/// Spring parameters (stiffness, damping, mass)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpringConfig {
    pub stiffness: f32,
    pub damping: f32,
    pub mass: f32,
}

impl SpringConfig {
    pub fn new(stiffness: f32, damping: f32, mass: f32) -> Self {
        Self {
            stiffness,
            damping,
            mass,
        }
    }

    /// Gentle spring for slow, soft returns
    pub fn gentle() -> Self {
        Self::new(120.0, 14.0, 1.0)
    }

    /// Underdamped spring with visible overshoot
    pub fn wobbly() -> Self {
        Self::new(180.0, 12.0, 1.0)
    }

    /// Snappy spring with minimal oscillation
    pub fn stiff() -> Self {
        Self::new(400.0, 30.0, 1.0)
    }

    /// Damping value at which this spring stops oscillating
    pub fn critical_damping(&self) -> f32 {
        2.0 * (self.stiffness * self.mass).sqrt()
    }

    /// Whether the spring will overshoot and oscillate
    pub fn is_underdamped(&self) -> bool {
        self.damping < self.critical_damping()
    }
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self::gentle()
    }
}

/// Position threshold under which a spring counts as settled
pub const SETTLE_DISTANCE: f32 = 0.05;
/// Velocity threshold under which a spring counts as settled
pub const SETTLE_VELOCITY: f32 = 0.5;

/// One-dimensional damped harmonic oscillator
#[derive(Clone, Copy, Debug)]
pub struct Spring {
    config: SpringConfig,
    position: f32,
    velocity: f32,
    target: f32,
}

#[derive(Clone, Copy)]
struct Derivative {
    dp: f32,
    dv: f32,
}

impl Spring {
    pub fn new(config: SpringConfig, initial: f32) -> Self {
        Self {
            config,
            position: initial,
            velocity: 0.0,
            target: initial,
        }
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    /// Retarget mid-flight; current velocity carries over
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Settled means both displacement and velocity are under threshold
    pub fn is_settled(&self) -> bool {
        (self.position - self.target).abs() < SETTLE_DISTANCE
            && self.velocity.abs() < SETTLE_VELOCITY
    }

    /// Snap to the target and zero out motion
    pub fn snap(&mut self) {
        self.position = self.target;
        self.velocity = 0.0;
    }

    /// Advance the simulation by `dt` seconds using RK4
    pub fn step(&mut self, dt: f32) {
        if self.is_settled() {
            self.snap();
            return;
        }

        let k1 = self.derive(self.position, self.velocity);
        let k2 = self.derive(
            self.position + k1.dp * dt * 0.5,
            self.velocity + k1.dv * dt * 0.5,
        );
        let k3 = self.derive(
            self.position + k2.dp * dt * 0.5,
            self.velocity + k2.dv * dt * 0.5,
        );
        let k4 = self.derive(self.position + k3.dp * dt, self.velocity + k3.dv * dt);

        self.position += (k1.dp + 2.0 * k2.dp + 2.0 * k3.dp + k4.dp) * dt / 6.0;
        self.velocity += (k1.dv + 2.0 * k2.dv + 2.0 * k3.dv + k4.dv) * dt / 6.0;
    }

    fn derive(&self, position: f32, velocity: f32) -> Derivative {
        let displacement = position - self.target;
        let force = -self.config.stiffness * displacement - self.config.damping * velocity;
        Derivative {
            dp: velocity,
            dv: force / self.config.mass,
        }
    }
}

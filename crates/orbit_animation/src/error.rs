//! Error types for orbit_animation

use thiserror::Error;

/// Configuration errors raised when building animation primitives.
///
/// All of these are detected synchronously at construction time; a
/// malformed node can never be started, so evaluation and ticking are
/// infallible.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Interpolator breakpoint arrays have different lengths
    #[error("breakpoint arrays differ in length: {inputs} inputs vs {outputs} outputs")]
    BreakpointMismatch { inputs: usize, outputs: usize },

    /// Fewer than two breakpoints were supplied
    #[error("an interpolator needs at least 2 breakpoints, got {0}")]
    TooFewBreakpoints(usize),

    /// Input breakpoints must be strictly increasing
    #[error("input breakpoints not strictly increasing at index {0}")]
    NonIncreasingInputs(usize),

    /// A breakpoint value is NaN or infinite
    #[error("non-finite breakpoint at index {0}")]
    NonFiniteBreakpoint(usize),

    /// A timing duration is NaN, infinite, or negative
    #[error("animation duration must be finite and non-negative, got {0}")]
    InvalidDuration(f32),

    /// An animation target value is NaN or infinite
    #[error("animation target must be finite, got {0}")]
    NonFiniteTarget(f32),
}

/// Result type for orbit_animation construction APIs
pub type Result<T> = std::result::Result<T, ConfigError>;

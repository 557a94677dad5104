//! Piecewise-linear interpolation
//!
//! An [`Interpolator`] maps one animated scalar's domain to an output
//! range through ordered breakpoints. Breakpoint validation happens at
//! construction; [`Interpolator::evaluate`] is infallible.

use crate::error::{ConfigError, Result};
use smallvec::SmallVec;

/// Behavior outside the declared input range
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Extrapolate {
    /// Return the nearest edge output unchanged (default)
    #[default]
    Clamp,
    /// Continue the edge segment linearly
    Extend,
}

/// Maps an input domain to an output range via piecewise-linear breakpoints
#[derive(Clone, Debug)]
pub struct Interpolator {
    inputs: SmallVec<[f32; 5]>,
    outputs: SmallVec<[f32; 5]>,
    extrapolate: Extrapolate,
}

impl Interpolator {
    /// Build an interpolator from matching breakpoint arrays
    ///
    /// Inputs must be strictly increasing, both arrays must be finite and
    /// of equal length ≥ 2. Violations are reported here, never at
    /// evaluation time.
    pub fn new(inputs: &[f32], outputs: &[f32]) -> Result<Self> {
        if inputs.len() != outputs.len() {
            return Err(ConfigError::BreakpointMismatch {
                inputs: inputs.len(),
                outputs: outputs.len(),
            });
        }
        if inputs.len() < 2 {
            return Err(ConfigError::TooFewBreakpoints(inputs.len()));
        }
        for (i, v) in inputs.iter().chain(outputs.iter()).enumerate() {
            if !v.is_finite() {
                return Err(ConfigError::NonFiniteBreakpoint(i % inputs.len()));
            }
        }
        for i in 1..inputs.len() {
            if inputs[i] <= inputs[i - 1] {
                return Err(ConfigError::NonIncreasingInputs(i));
            }
        }

        Ok(Self {
            inputs: SmallVec::from_slice(inputs),
            outputs: SmallVec::from_slice(outputs),
            extrapolate: Extrapolate::Clamp,
        })
    }

    /// Set the out-of-range policy
    pub fn with_extrapolate(mut self, mode: Extrapolate) -> Self {
        self.extrapolate = mode;
        self
    }

    /// Evaluate the mapping at `input`
    ///
    /// Inputs landing exactly on a breakpoint return the matching output
    /// exactly; segment interiors interpolate linearly. Breakpoint counts
    /// are small (≤5 in practice), so the segment search is a linear scan.
    pub fn evaluate(&self, input: f32) -> f32 {
        let last = self.inputs.len() - 1;

        if input <= self.inputs[0] {
            return match self.extrapolate {
                Extrapolate::Clamp => self.outputs[0],
                Extrapolate::Extend => {
                    if input == self.inputs[0] {
                        self.outputs[0]
                    } else {
                        self.segment(0, input)
                    }
                }
            };
        }
        if input >= self.inputs[last] {
            return match self.extrapolate {
                Extrapolate::Clamp => self.outputs[last],
                Extrapolate::Extend => {
                    if input == self.inputs[last] {
                        self.outputs[last]
                    } else {
                        self.segment(last - 1, input)
                    }
                }
            };
        }

        let mut seg = 0;
        for i in 1..=last {
            if input <= self.inputs[i] {
                seg = i - 1;
                break;
            }
        }
        if input == self.inputs[seg] {
            return self.outputs[seg];
        }
        if input == self.inputs[seg + 1] {
            return self.outputs[seg + 1];
        }
        self.segment(seg, input)
    }

    /// Evaluate and format as a degree string (e.g. `"1440deg"`)
    ///
    /// Angular output is purely presentational; the numeric result is the
    /// same value [`evaluate`](Self::evaluate) returns.
    pub fn evaluate_deg(&self, input: f32) -> String {
        format!("{}deg", self.evaluate(input))
    }

    fn segment(&self, i: usize, input: f32) -> f32 {
        let (x0, x1) = (self.inputs[i], self.inputs[i + 1]);
        let (y0, y1) = (self.outputs[i], self.outputs[i + 1]);
        y0 + (y1 - y0) * ((input - x0) / (x1 - x0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_exact() {
        let interp = Interpolator::new(&[0.0, 4.0], &[0.0, 1440.0]).unwrap();
        assert_eq!(interp.evaluate(0.0), 0.0);
        assert_eq!(interp.evaluate(4.0), 1440.0);
    }

    #[test]
    fn interior_breakpoints_are_exact() {
        let angles = [0.0, std::f32::consts::PI, std::f32::consts::TAU];
        let interp = Interpolator::new(&angles, &[-50.0, 50.0, -50.0]).unwrap();
        assert_eq!(interp.evaluate(std::f32::consts::PI), 50.0);
    }

    #[test]
    fn interior_points_interpolate_linearly() {
        let interp = Interpolator::new(&[0.0, 1.0], &[0.0, 100.0]).unwrap();
        assert!((interp.evaluate(0.25) - 25.0).abs() < 1e-4);
        assert!((interp.evaluate(0.75) - 75.0).abs() < 1e-4);
    }

    #[test]
    fn out_of_range_clamps_by_default() {
        let interp = Interpolator::new(&[0.0, 1.0], &[10.0, 20.0]).unwrap();
        assert_eq!(interp.evaluate(-5.0), 10.0);
        assert_eq!(interp.evaluate(2.0), 20.0);
    }

    #[test]
    fn extend_mode_extrapolates() {
        let interp = Interpolator::new(&[0.0, 1.0], &[0.0, 100.0])
            .unwrap()
            .with_extrapolate(Extrapolate::Extend);
        assert!((interp.evaluate(2.0) - 200.0).abs() < 1e-4);
        assert!((interp.evaluate(-1.0) + 100.0).abs() < 1e-4);
        // Endpoints stay exact in extend mode too
        assert_eq!(interp.evaluate(1.0), 100.0);
    }

    #[test]
    fn mismatched_lengths_rejected() {
        let err = Interpolator::new(&[0.0, 1.0, 2.0], &[0.0, 1.0]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::BreakpointMismatch {
                inputs: 3,
                outputs: 2
            }
        );
    }

    #[test]
    fn non_increasing_inputs_rejected() {
        let err = Interpolator::new(&[0.0, 1.0, 1.0], &[0.0, 1.0, 2.0]).unwrap_err();
        assert_eq!(err, ConfigError::NonIncreasingInputs(2));
    }

    #[test]
    fn single_breakpoint_rejected() {
        let err = Interpolator::new(&[0.0], &[0.0]).unwrap_err();
        assert_eq!(err, ConfigError::TooFewBreakpoints(1));
    }

    #[test]
    fn non_finite_breakpoint_rejected() {
        assert!(Interpolator::new(&[0.0, f32::NAN], &[0.0, 1.0]).is_err());
        assert!(Interpolator::new(&[0.0, 1.0], &[0.0, f32::INFINITY]).is_err());
    }

    #[test]
    fn degree_formatting() {
        let interp = Interpolator::new(&[0.0, 4.0], &[0.0, 1440.0]).unwrap();
        assert_eq!(interp.evaluate_deg(0.0), "0deg");
        assert_eq!(interp.evaluate_deg(4.0), "1440deg");
        assert_eq!(interp.evaluate_deg(1.0), "360deg");
    }
}

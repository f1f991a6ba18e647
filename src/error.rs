use std::fmt;

use thiserror::Error;

/// Result type used throughout the solver.
pub type SolverResult<T> = Result<T, SolverError>;

/// Which time step limit was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StabilityBound {
    /// dt < min(dx², dy²) / (4ν)
    Diffusive,
    /// dt < min(dx, dy) / max|u|
    Convective,
}

impl fmt::Display for StabilityBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StabilityBound::Diffusive => f.write_str("diffusive"),
            StabilityBound::Convective => f.write_str("convective"),
        }
    }
}

/// Solver errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("invalid grid: {nx}x{ny} nodes over {lx}x{ly}; need at least 3x3 nodes and a positive finite domain")]
    InvalidGrid { nx: usize, ny: usize, lx: f64, ly: f64 },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("time step {dt:.3e} violates the {bound} stability bound (must be below {limit:.3e})")]
    StabilityViolation { bound: StabilityBound, dt: f64, limit: f64 },

    #[error("pressure solve did not converge at step {step}: {iterations} iterations, max change {max_change:.3e}")]
    PressureNotConverged { step: usize, iterations: usize, max_change: f64 },
}

impl SolverError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        SolverError::InvalidParameter { name, reason: reason.into() }
    }
}

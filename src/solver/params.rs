use crate::error::{SolverError, SolverResult};

use super::operators::ConvectionScheme;

/// Physical and time-stepping parameters of the flow solver.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverParams {
    /// Density ρ [kg/m³].
    pub density: f64,
    /// Kinematic viscosity ν [m²/s].
    pub viscosity: f64,
    /// Tangential speed of the lid [m/s].
    pub lid_velocity: f64,
    pub dt: f64,
    pub convection: ConvectionScheme,
    /// Fail the step on a CFL violation instead of warning.
    pub enforce_stability: bool,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            density: 1.0,
            viscosity: 0.01,
            lid_velocity: 1.0,
            dt: 0.001,
            convection: ConvectionScheme::Central,
            enforce_stability: true,
        }
    }
}

impl SolverParams {
    /// Parameters for a cavity of side `length` at Reynolds number `re`.
    /// Uses unit density and lid speed, so ν = L / Re.
    pub fn from_reynolds(re: f64, length: f64, dt: f64) -> Self {
        Self {
            viscosity: length / re,
            dt,
            ..Self::default()
        }
    }

    /// Re = U L / ν.
    pub fn reynolds(&self, length: f64) -> f64 {
        self.lid_velocity.abs() * length / self.viscosity
    }

    pub fn validate(&self) -> SolverResult<()> {
        if !(self.density.is_finite() && self.density > 0.0) {
            return Err(SolverError::invalid("density", format!("must be positive, got {}", self.density)));
        }
        if !(self.viscosity.is_finite() && self.viscosity >= 0.0) {
            return Err(SolverError::invalid("viscosity", format!("must be non-negative, got {}", self.viscosity)));
        }
        if !self.lid_velocity.is_finite() {
            return Err(SolverError::invalid("lid_velocity", "must be finite"));
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(SolverError::invalid("dt", format!("must be positive, got {}", self.dt)));
        }
        Ok(())
    }
}

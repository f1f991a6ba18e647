mod boundary;
pub mod diagnostics;
pub mod operators;
mod params;
mod poisson;
mod stability;

// Re-export public API
pub use boundary::{apply_pressure_boundary, apply_velocity_boundary, BoundarySpec, EdgeCondition, EdgeSet, FieldType};
pub use operators::ConvectionScheme;
pub use params::SolverParams;
pub use poisson::{residual, PoissonSettings, PoissonSolver, PoissonStatus, Relaxation};
pub use stability::StabilityLimits;

use crate::error::SolverResult;
use crate::grid::Grid;
use crate::state::{PressureField, VelocityField};
use operators::{convection_at, ddx_at, ddy_at, divergence, interior_rms, laplacian_at};

/// Diagnostics of one time step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// RMS divergence of the intermediate velocity u*.
    pub divergence_before: f64,
    /// RMS divergence after projection and boundary enforcement.
    pub divergence_after: f64,
    pub pressure: PoissonStatus,
    /// Largest pointwise velocity change over the step.
    pub max_velocity_change: f64,
}

/// Advances velocity and pressure by one projection step.
///
/// Scratch buffers are allocated once for the grid passed to [`TimeStepper::new`];
/// every later call must use the same grid.
pub struct TimeStepper {
    params: SolverParams,
    poisson: PoissonSolver,
    /// Intermediate velocity u*.
    star: VelocityField,
    /// Velocity at the start of the step.
    previous: VelocityField,
    div: Vec<f64>,
    rhs: Vec<f64>,
    stability_warned: bool,
}

impl TimeStepper {
    pub fn new(grid: &Grid, params: SolverParams, poisson: PoissonSettings) -> SolverResult<Self> {
        params.validate()?;
        Ok(Self {
            poisson: PoissonSolver::new(grid, poisson)?,
            params,
            star: VelocityField::zeros(grid),
            previous: VelocityField::zeros(grid),
            div: grid.zeros(),
            rhs: grid.zeros(),
            stability_warned: false,
        })
    }

    pub fn params(&self) -> &SolverParams {
        &self.params
    }

    pub fn poisson_settings(&self) -> &PoissonSettings {
        self.poisson.settings()
    }

    /// Time step limits for the current velocity field, counting the
    /// speeds the walls impose.
    pub fn stability_limits(&self, grid: &Grid, bc: &BoundarySpec, vel: &VelocityField) -> StabilityLimits {
        let max_speed = vel.max_speed().max(bc.max_wall_speed());
        StabilityLimits::new(grid, self.params.viscosity, max_speed)
    }

    fn check_stability(&mut self, grid: &Grid, bc: &BoundarySpec, vel: &VelocityField) -> SolverResult<()> {
        match self.stability_limits(grid, bc, vel).check(self.params.dt) {
            Ok(()) => Ok(()),
            Err(err) if !self.params.enforce_stability => {
                if !self.stability_warned {
                    log::warn!("{}; continuing with stability enforcement disabled", err);
                    self.stability_warned = true;
                }
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// One full step: intermediate velocity, pressure solve, projection,
    /// wall conditions. `vel` and `pressure` are updated in place; the
    /// previous pressure is the initial guess of the Poisson solve.
    pub fn step(
        &mut self,
        grid: &Grid,
        bc: &BoundarySpec,
        vel: &mut VelocityField,
        pressure: &mut PressureField,
    ) -> SolverResult<StepReport> {
        self.check_stability(grid, bc, vel)?;
        self.previous.copy_from(vel);
        let (rho, dt) = (self.params.density, self.params.dt);

        // 1. Intermediate velocity u* (convection + diffusion, no pressure)
        self.compute_intermediate_velocity(grid, vel);
        apply_velocity_boundary(grid, bc, &mut self.star);

        // 2. Pressure Poisson solve: ∇²p = (ρ/Δt) ∇·u*
        divergence(grid, &self.star.u, &self.star.v, &mut self.div);
        let divergence_before = interior_rms(grid, &self.div);
        let scale = rho / dt;
        for (r, d) in self.rhs.iter_mut().zip(self.div.iter()) {
            *r = scale * d;
        }
        let pressure_status = self.poisson.solve(grid, bc, pressure, &self.rhs);

        // 3. Project: u = u* − (Δt/ρ) ∇p
        let c = dt / rho;
        for j in 1..(grid.ny() - 1) {
            for i in 1..(grid.nx() - 1) {
                let k = grid.idx(i, j);
                vel.u[k] = self.star.u[k] - c * ddx_at(grid, &pressure.p, i, j);
                vel.v[k] = self.star.v[k] - c * ddy_at(grid, &pressure.p, i, j);
            }
        }

        // 4. Projection leaves walls stale
        apply_velocity_boundary(grid, bc, vel);

        divergence(grid, &vel.u, &vel.v, &mut self.div);
        let report = StepReport {
            divergence_before,
            divergence_after: interior_rms(grid, &self.div),
            pressure: pressure_status,
            max_velocity_change: vel.max_abs_diff(&self.previous),
        };
        log::trace!(
            "step: div {:.3e} -> {:.3e}, pressure {} sweeps, max du {:.3e}",
            report.divergence_before,
            report.divergence_after,
            report.pressure.iterations(),
            report.max_velocity_change
        );
        Ok(report)
    }

    /// Explicit Euler update of the interior of `self.star` from `vel`.
    fn compute_intermediate_velocity(&mut self, grid: &Grid, vel: &VelocityField) {
        let (dt, nu, scheme) = (self.params.dt, self.params.viscosity, self.params.convection);
        for j in 1..(grid.ny() - 1) {
            for i in 1..(grid.nx() - 1) {
                let k = grid.idx(i, j);
                let adv_u = convection_at(grid, &vel.u, &vel.v, &vel.u, i, j, scheme);
                let adv_v = convection_at(grid, &vel.u, &vel.v, &vel.v, i, j, scheme);
                self.star.u[k] = vel.u[k] + dt * (nu * laplacian_at(grid, &vel.u, i, j) - adv_u);
                self.star.v[k] = vel.v[k] + dt * (nu * laplacian_at(grid, &vel.v, i, j) - adv_v);
            }
        }
    }
}

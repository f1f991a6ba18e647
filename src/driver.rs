use serde::Deserialize;

use crate::error::{SolverError, SolverResult};
use crate::grid::Grid;
use crate::solver::{
    apply_pressure_boundary, apply_velocity_boundary, BoundarySpec, PoissonSettings, SolverParams, StepReport,
    TimeStepper,
};
use crate::state::{PressureField, VelocityField};

/// What to do when a pressure solve hits its iteration cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonConvergencePolicy {
    /// Keep the approximate pressure, log and count the event.
    #[default]
    Continue,
    /// Stop the run with [`SolverError::PressureNotConverged`].
    Abort,
}

/// Stopping rules of the time loop.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub max_steps: usize,
    /// Steady once the max velocity change of a step drops below this.
    pub steady_tolerance: f64,
    /// Speeds above this count as blow-up.
    pub blowup_speed: f64,
    pub on_non_convergence: NonConvergencePolicy,
    /// Steps between progress log lines; 0 disables them.
    pub report_interval: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            max_steps: 50_000,
            steady_tolerance: 1e-6,
            blowup_speed: 100.0,
            on_non_convergence: NonConvergencePolicy::Continue,
            report_interval: 1000,
        }
    }
}

impl RunSettings {
    pub fn validate(&self) -> SolverResult<()> {
        if self.max_steps == 0 {
            return Err(SolverError::invalid("time.max_steps", "must be at least 1"));
        }
        if !(self.steady_tolerance.is_finite() && self.steady_tolerance > 0.0) {
            return Err(SolverError::invalid(
                "time.steady_tolerance",
                format!("must be positive, got {}", self.steady_tolerance),
            ));
        }
        if !(self.blowup_speed > 0.0) {
            return Err(SolverError::invalid("time.blowup_speed", format!("must be positive, got {}", self.blowup_speed)));
        }
        Ok(())
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Velocity change per step fell below the steady tolerance.
    Converged,
    /// Non-finite values or speeds above the blow-up limit.
    Diverged,
    /// Step cap reached first.
    Exhausted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub status: RunStatus,
    /// Steps taken by this run.
    pub steps: usize,
    /// Simulated time at the end of the run.
    pub time: f64,
    /// Steps of this run whose pressure solve did not converge.
    pub pressure_failures: usize,
    pub last_step: Option<StepReport>,
}

/// Owns the cavity state and drives the time loop.
pub struct Simulation {
    grid: Grid,
    boundary: BoundarySpec,
    stepper: TimeStepper,
    settings: RunSettings,
    velocity: VelocityField,
    pressure: PressureField,
    steps: usize,
    time: f64,
    pressure_failures: usize,
}

impl Simulation {
    /// Lid-driven cavity at rest, walls already imposed.
    pub fn new(grid: Grid, params: SolverParams, poisson: PoissonSettings, settings: RunSettings) -> SolverResult<Self> {
        let boundary = BoundarySpec::lid_driven_cavity(&grid, params.lid_velocity);
        Self::with_boundary(grid, boundary, params, poisson, settings)
    }

    /// Fluid at rest under arbitrary wall conditions.
    pub fn with_boundary(
        grid: Grid,
        boundary: BoundarySpec,
        params: SolverParams,
        poisson: PoissonSettings,
        settings: RunSettings,
    ) -> SolverResult<Self> {
        settings.validate()?;
        boundary.validate(&grid)?;
        let stepper = TimeStepper::new(&grid, params, poisson)?;

        let mut velocity = VelocityField::zeros(&grid);
        let mut pressure = PressureField::zeros(&grid);
        apply_velocity_boundary(&grid, &boundary, &mut velocity);
        apply_pressure_boundary(&grid, &boundary, &mut pressure);

        let limits = stepper.stability_limits(&grid, &boundary, &velocity);
        log::debug!(
            "dt limits: diffusive {:.3e}, convective {:.3e}",
            limits.diffusive,
            limits.convective
        );

        Ok(Self {
            grid,
            boundary,
            stepper,
            settings,
            velocity,
            pressure,
            steps: 0,
            time: 0.0,
            pressure_failures: 0,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn boundary(&self) -> &BoundarySpec {
        &self.boundary
    }

    pub fn params(&self) -> &SolverParams {
        self.stepper.params()
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    pub fn velocity(&self) -> &VelocityField {
        &self.velocity
    }

    pub fn pressure(&self) -> &PressureField {
        &self.pressure
    }

    /// Total steps taken since construction.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Advance one time step, applying the non-convergence policy.
    pub fn step(&mut self) -> SolverResult<StepReport> {
        let report = self.stepper.step(&self.grid, &self.boundary, &mut self.velocity, &mut self.pressure)?;
        self.steps += 1;
        self.time += self.stepper.params().dt;

        if !report.pressure.is_converged() {
            self.pressure_failures += 1;
            match self.settings.on_non_convergence {
                NonConvergencePolicy::Abort => {
                    return Err(SolverError::PressureNotConverged {
                        step: self.steps,
                        iterations: report.pressure.iterations(),
                        max_change: report.pressure.max_change(),
                    });
                }
                NonConvergencePolicy::Continue if self.pressure_failures == 1 => {
                    log::warn!(
                        "step {}: pressure solve stopped after {} sweeps (max change {:.3e}); continuing with the approximate field",
                        self.steps,
                        report.pressure.iterations(),
                        report.pressure.max_change()
                    );
                }
                NonConvergencePolicy::Continue => {
                    log::debug!(
                        "step {}: pressure not converged ({} sweeps)",
                        self.steps,
                        report.pressure.iterations()
                    );
                }
            }
        }
        Ok(report)
    }

    fn diverged(&self) -> bool {
        !self.velocity.is_finite()
            || !self.pressure.is_finite()
            || self.velocity.max_speed() > self.settings.blowup_speed
    }

    /// Step until steady state, divergence or the step cap.
    pub fn run(&mut self) -> SolverResult<RunReport> {
        let failures_before = self.pressure_failures;
        let mut last_step = None;
        let mut status = RunStatus::Exhausted;
        let mut taken = 0;

        log::info!(
            "running {}x{} cavity, Re = {:.1}, dt = {:.3e}",
            self.grid.nx(),
            self.grid.ny(),
            self.params().reynolds(self.grid.lx()),
            self.params().dt
        );

        while taken < self.settings.max_steps {
            let report = self.step()?;
            taken += 1;
            last_step = Some(report);

            if self.diverged() {
                log::warn!("solution diverged at step {}", self.steps);
                status = RunStatus::Diverged;
                break;
            }
            if report.max_velocity_change < self.settings.steady_tolerance {
                status = RunStatus::Converged;
                break;
            }
            if self.settings.report_interval > 0 && self.steps % self.settings.report_interval == 0 {
                log::debug!(
                    "step {} (t = {:.4}): max du {:.3e}, div {:.3e}",
                    self.steps,
                    self.time,
                    report.max_velocity_change,
                    report.divergence_after
                );
            }
        }

        let run = RunReport {
            status,
            steps: taken,
            time: self.time,
            pressure_failures: self.pressure_failures - failures_before,
            last_step,
        };
        log::info!(
            "run finished: {:?} after {} steps (t = {:.4}), {} unconverged pressure solves",
            run.status,
            run.steps,
            run.time,
            run.pressure_failures
        );
        Ok(run)
    }
}

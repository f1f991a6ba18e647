use rayon::prelude::*;

use crate::error::{SolverError, SolverResult};
use crate::grid::Grid;
use crate::state::{max_abs_diff, PressureField};

use super::boundary::{apply_pressure_boundary, BoundarySpec};
use super::operators::laplacian_at;

/// Relaxation scheme for the pressure Poisson equation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Relaxation {
    /// Double-buffered; rows are updated in parallel.
    Jacobi,
    /// In place, lexicographic order.
    GaussSeidel,
    /// Over-relaxed Gauss-Seidel, `0 < omega < 2`.
    Sor { omega: f64 },
}

/// Stopping rule and scheme for the pressure solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoissonSettings {
    pub relaxation: Relaxation,
    /// Stop once the largest pointwise change of a sweep drops below this.
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for PoissonSettings {
    fn default() -> Self {
        Self {
            relaxation: Relaxation::Sor { omega: 1.8 },
            tolerance: 1e-6,
            max_iterations: 500,
        }
    }
}

impl PoissonSettings {
    pub fn validate(&self) -> SolverResult<()> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(SolverError::invalid("pressure.tolerance", format!("must be positive, got {}", self.tolerance)));
        }
        if self.max_iterations == 0 {
            return Err(SolverError::invalid("pressure.max_iterations", "must be at least 1"));
        }
        if let Relaxation::Sor { omega } = self.relaxation {
            if !(omega > 0.0 && omega < 2.0) {
                return Err(SolverError::invalid("pressure.omega", format!("must lie in (0, 2), got {omega}")));
            }
        }
        Ok(())
    }
}

/// Outcome of one pressure solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PoissonStatus {
    Converged { iterations: usize, max_change: f64 },
    /// Iteration cap hit (or the iterate went non-finite). The pressure
    /// field holds the last iterate.
    NotConverged { iterations: usize, max_change: f64 },
}

impl PoissonStatus {
    pub fn is_converged(&self) -> bool {
        matches!(self, PoissonStatus::Converged { .. })
    }

    pub fn iterations(&self) -> usize {
        match *self {
            PoissonStatus::Converged { iterations, .. } | PoissonStatus::NotConverged { iterations, .. } => iterations,
        }
    }

    pub fn max_change(&self) -> f64 {
        match *self {
            PoissonStatus::Converged { max_change, .. } | PoissonStatus::NotConverged { max_change, .. } => max_change,
        }
    }
}

/// Iterative solver for ∇²p = rhs with the pressure wall conditions.
pub struct PoissonSolver {
    settings: PoissonSettings,
    /// Previous iterate (Jacobi: also the write target of each sweep).
    previous: Vec<f64>,
}

impl PoissonSolver {
    pub fn new(grid: &Grid, settings: PoissonSettings) -> SolverResult<Self> {
        settings.validate()?;
        Ok(Self { settings, previous: grid.zeros() })
    }

    pub fn settings(&self) -> &PoissonSettings {
        &self.settings
    }

    /// Relax `pressure` in place towards the solution of ∇²p = `rhs`.
    ///
    /// The current contents of `pressure` are the initial guess. Boundary
    /// conditions are applied after every sweep and take part in the
    /// convergence check.
    pub fn solve(
        &mut self,
        grid: &Grid,
        bc: &BoundarySpec,
        pressure: &mut PressureField,
        rhs: &[f64],
    ) -> PoissonStatus {
        let tolerance = self.settings.tolerance;
        let mut max_change = f64::INFINITY;
        let mut iterations = 0;

        while iterations < self.settings.max_iterations {
            iterations += 1;
            match self.settings.relaxation {
                Relaxation::Jacobi => {
                    jacobi_sweep(grid, &pressure.p, rhs, &mut self.previous);
                    std::mem::swap(&mut pressure.p, &mut self.previous);
                }
                Relaxation::GaussSeidel => {
                    self.previous.copy_from_slice(&pressure.p);
                    sor_sweep(grid, &mut pressure.p, rhs, 1.0);
                }
                Relaxation::Sor { omega } => {
                    self.previous.copy_from_slice(&pressure.p);
                    sor_sweep(grid, &mut pressure.p, rhs, omega);
                }
            }
            apply_pressure_boundary(grid, bc, pressure);

            max_change = max_abs_diff(&pressure.p, &self.previous);
            if max_change < tolerance {
                log::trace!("pressure converged: {} sweeps, max change {:.3e}", iterations, max_change);
                return PoissonStatus::Converged { iterations, max_change };
            }
            if !max_change.is_finite() {
                break;
            }
        }

        log::trace!("pressure not converged: {} sweeps, max change {:.3e}", iterations, max_change);
        PoissonStatus::NotConverged { iterations, max_change }
    }
}

/// Five-point update for node (i, j) from its neighbours and source.
#[inline(always)]
fn relaxed_value(p: &[f64], rhs: &[f64], k: usize, nx: usize, dx2: f64, dy2: f64) -> f64 {
    ((p[k + 1] + p[k - 1]) * dy2 + (p[k + nx] + p[k - nx]) * dx2 - rhs[k] * dx2 * dy2) / (2.0 * (dx2 + dy2))
}

/// One Jacobi sweep: interior of `dst` from `src`. Rows are independent.
fn jacobi_sweep(grid: &Grid, src: &[f64], rhs: &[f64], dst: &mut [f64]) {
    let (nx, ny) = (grid.nx(), grid.ny());
    let (dx2, dy2) = (grid.dx() * grid.dx(), grid.dy() * grid.dy());
    dst.par_chunks_mut(nx)
        .enumerate()
        .filter(|(j, _)| *j > 0 && *j < ny - 1)
        .for_each(|(j, row)| {
            for i in 1..(nx - 1) {
                row[i] = relaxed_value(src, rhs, grid.idx(i, j), nx, dx2, dy2);
            }
        });
}

/// One in-place Gauss-Seidel sweep, over-relaxed by `omega`.
fn sor_sweep(grid: &Grid, p: &mut [f64], rhs: &[f64], omega: f64) {
    let (nx, ny) = (grid.nx(), grid.ny());
    let (dx2, dy2) = (grid.dx() * grid.dx(), grid.dy() * grid.dy());
    for j in 1..(ny - 1) {
        for i in 1..(nx - 1) {
            let k = grid.idx(i, j);
            let gs = relaxed_value(p, rhs, k, nx, dx2, dy2);
            p[k] += omega * (gs - p[k]);
        }
    }
}

/// Largest |∇²p − rhs| over interior nodes.
pub fn residual(grid: &Grid, p: &[f64], rhs: &[f64]) -> f64 {
    let mut max = 0.0_f64;
    for j in 1..(grid.ny() - 1) {
        for i in 1..(grid.nx() - 1) {
            let r = laplacian_at(grid, p, i, j) - rhs[grid.idx(i, j)];
            max = max.max(r.abs());
        }
    }
    max
}

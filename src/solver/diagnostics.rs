use crate::grid::Grid;
use crate::state::VelocityField;

use super::operators::{divergence, interior_rms};

/// Volume-averaged kinetic energy over interior nodes: KE = 0.5 * <u² + v²>.
pub fn compute_kinetic_energy(grid: &Grid, vel: &VelocityField) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for j in 1..(grid.ny() - 1) {
        for i in 1..(grid.nx() - 1) {
            let k = grid.idx(i, j);
            sum += vel.u[k] * vel.u[k] + vel.v[k] * vel.v[k];
            count += 1;
        }
    }
    if count > 0 { 0.5 * sum / count as f64 } else { 0.0 }
}

/// RMS of the discrete divergence over interior nodes.
pub fn divergence_rms(grid: &Grid, vel: &VelocityField) -> f64 {
    let mut div = grid.zeros();
    divergence(grid, &vel.u, &vel.v, &mut div);
    interior_rms(grid, &div)
}

/// Stream function with ψ = 0 on the bottom wall, integrating u = ∂ψ/∂y
/// upwards with the trapezoidal rule.
pub fn compute_stream_function(grid: &Grid, vel: &VelocityField) -> Vec<f64> {
    let mut psi = grid.zeros();
    let half_dy = 0.5 * grid.dy();
    for j in 1..grid.ny() {
        for i in 0..grid.nx() {
            let below = psi[grid.idx(i, j - 1)];
            psi[grid.idx(i, j)] = below + half_dy * (vel.u[grid.idx(i, j)] + vel.u[grid.idx(i, j - 1)]);
        }
    }
    psi
}

/// Location of the primary vortex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VortexCenter {
    pub i: usize,
    pub j: usize,
    pub x: f64,
    pub y: f64,
    /// Stream function value at the centre.
    pub psi: f64,
}

/// Interior node where ψ is smallest. For a lid moving in +x this is the
/// centre of the clockwise primary vortex.
pub fn find_vortex_center(grid: &Grid, vel: &VelocityField) -> VortexCenter {
    let psi = compute_stream_function(grid, vel);
    let mut best = VortexCenter { i: 1, j: 1, x: grid.x(1), y: grid.y(1), psi: psi[grid.idx(1, 1)] };
    for j in 1..(grid.ny() - 1) {
        for i in 1..(grid.nx() - 1) {
            let value = psi[grid.idx(i, j)];
            if value < best.psi {
                best = VortexCenter { i, j, x: grid.x(i), y: grid.y(j), psi: value };
            }
        }
    }
    best
}

/// `(y, u)` along the vertical line through the middle column.
pub fn centerline_u(grid: &Grid, vel: &VelocityField) -> Vec<(f64, f64)> {
    let i = grid.nx() / 2;
    (0..grid.ny()).map(|j| (grid.y(j), vel.u[grid.idx(i, j)])).collect()
}

/// `(x, v)` along the horizontal line through the middle row.
pub fn centerline_v(grid: &Grid, vel: &VelocityField) -> Vec<(f64, f64)> {
    let j = grid.ny() / 2;
    (0..grid.nx()).map(|i| (grid.x(i), vel.v[grid.idx(i, j)])).collect()
}

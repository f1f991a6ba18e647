//! Finite-difference stencils on interior nodes.
//!
//! Every operator reads neighbours `i±1`, `j±1` and is evaluated only on
//! interior nodes `1..=n-2`. Wall entries of output slices are never
//! written; wall values come from the boundary conditions instead.

use serde::Deserialize;

use crate::grid::Grid;

/// Discretization of the convective term `u ∂f/∂x + v ∂f/∂y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvectionScheme {
    /// Second-order central differences.
    #[default]
    Central,
    /// First-order upwind differences, biased against the local velocity.
    Upwind,
}

#[inline(always)]
pub fn ddx_at(grid: &Grid, f: &[f64], i: usize, j: usize) -> f64 {
    (f[grid.idx(i + 1, j)] - f[grid.idx(i - 1, j)]) / (2.0 * grid.dx())
}

#[inline(always)]
pub fn ddy_at(grid: &Grid, f: &[f64], i: usize, j: usize) -> f64 {
    (f[grid.idx(i, j + 1)] - f[grid.idx(i, j - 1)]) / (2.0 * grid.dy())
}

#[inline(always)]
pub fn laplacian_at(grid: &Grid, f: &[f64], i: usize, j: usize) -> f64 {
    let c = f[grid.idx(i, j)];
    let (dx2, dy2) = (grid.dx() * grid.dx(), grid.dy() * grid.dy());
    (f[grid.idx(i + 1, j)] - 2.0 * c + f[grid.idx(i - 1, j)]) / dx2
        + (f[grid.idx(i, j + 1)] - 2.0 * c + f[grid.idx(i, j - 1)]) / dy2
}

#[inline(always)]
pub fn divergence_at(grid: &Grid, u: &[f64], v: &[f64], i: usize, j: usize) -> f64 {
    ddx_at(grid, u, i, j) + ddy_at(grid, v, i, j)
}

/// `u ∂f/∂x + v ∂f/∂y` at one node, with `(u, v)` the advecting velocity.
#[inline(always)]
pub fn convection_at(
    grid: &Grid,
    u: &[f64],
    v: &[f64],
    f: &[f64],
    i: usize,
    j: usize,
    scheme: ConvectionScheme,
) -> f64 {
    let k = grid.idx(i, j);
    let (uc, vc) = (u[k], v[k]);
    match scheme {
        ConvectionScheme::Central => uc * ddx_at(grid, f, i, j) + vc * ddy_at(grid, f, i, j),
        ConvectionScheme::Upwind => {
            let fc = f[k];
            let dfdx = if uc >= 0.0 {
                (fc - f[grid.idx(i - 1, j)]) / grid.dx()
            } else {
                (f[grid.idx(i + 1, j)] - fc) / grid.dx()
            };
            let dfdy = if vc >= 0.0 {
                (fc - f[grid.idx(i, j - 1)]) / grid.dy()
            } else {
                (f[grid.idx(i, j + 1)] - fc) / grid.dy()
            };
            uc * dfdx + vc * dfdy
        }
    }
}

fn for_interior(grid: &Grid, out: &mut [f64], mut f: impl FnMut(usize, usize) -> f64) {
    for j in 1..(grid.ny() - 1) {
        for i in 1..(grid.nx() - 1) {
            out[grid.idx(i, j)] = f(i, j);
        }
    }
}

pub fn gradient_x(grid: &Grid, f: &[f64], out: &mut [f64]) {
    for_interior(grid, out, |i, j| ddx_at(grid, f, i, j));
}

pub fn gradient_y(grid: &Grid, f: &[f64], out: &mut [f64]) {
    for_interior(grid, out, |i, j| ddy_at(grid, f, i, j));
}

pub fn divergence(grid: &Grid, u: &[f64], v: &[f64], out: &mut [f64]) {
    for_interior(grid, out, |i, j| divergence_at(grid, u, v, i, j));
}

pub fn laplacian(grid: &Grid, f: &[f64], out: &mut [f64]) {
    for_interior(grid, out, |i, j| laplacian_at(grid, f, i, j));
}

pub fn convection(grid: &Grid, u: &[f64], v: &[f64], f: &[f64], scheme: ConvectionScheme, out: &mut [f64]) {
    for_interior(grid, out, |i, j| convection_at(grid, u, v, f, i, j, scheme));
}

/// Vorticity ω = ∂v/∂x − ∂u/∂y.
pub fn vorticity(grid: &Grid, u: &[f64], v: &[f64], out: &mut [f64]) {
    for_interior(grid, out, |i, j| ddx_at(grid, v, i, j) - ddy_at(grid, u, i, j));
}

/// Root-mean-square of `f` over interior nodes.
pub fn interior_rms(grid: &Grid, f: &[f64]) -> f64 {
    let mut sum = 0.0;
    for j in 1..(grid.ny() - 1) {
        for i in 1..(grid.nx() - 1) {
            let x = f[grid.idx(i, j)];
            sum += x * x;
        }
    }
    let count = (grid.nx() - 2) * (grid.ny() - 2);
    (sum / count as f64).sqrt()
}

/// Largest |f| over interior nodes.
pub fn interior_max_abs(grid: &Grid, f: &[f64]) -> f64 {
    let mut max = 0.0_f64;
    for j in 1..(grid.ny() - 1) {
        for i in 1..(grid.nx() - 1) {
            max = max.max(f[grid.idx(i, j)].abs());
        }
    }
    max
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Grid {
        Grid::new(21, 17, 1.0, 0.8).unwrap()
    }

    #[test]
    fn test_gradient_of_linear_field_exact() {
        let g = grid();
        let f = g.sample(|x, y| 3.0 * x - 2.0 * y + 1.0);
        let mut gx = g.zeros();
        let mut gy = g.zeros();
        gradient_x(&g, &f, &mut gx);
        gradient_y(&g, &f, &mut gy);
        for j in 1..(g.ny() - 1) {
            for i in 1..(g.nx() - 1) {
                let k = g.idx(i, j);
                assert!((gx[k] - 3.0).abs() < 1e-10, "df/dx at ({}, {}) = {}", i, j, gx[k]);
                assert!((gy[k] + 2.0).abs() < 1e-10, "df/dy at ({}, {}) = {}", i, j, gy[k]);
            }
        }
    }

    #[test]
    fn test_operators_leave_walls_untouched() {
        let g = grid();
        let f = g.sample(|x, y| x * x + y);
        let mut out = vec![-99.0; g.len()];
        laplacian(&g, &f, &mut out);
        for i in 0..g.nx() {
            assert_eq!(out[g.idx(i, 0)], -99.0);
            assert_eq!(out[g.idx(i, g.ny() - 1)], -99.0);
        }
        for j in 0..g.ny() {
            assert_eq!(out[g.idx(0, j)], -99.0);
            assert_eq!(out[g.idx(g.nx() - 1, j)], -99.0);
        }
    }

    #[test]
    fn test_divergence_of_rotation_is_zero() {
        // u = y, v = -x is solenoidal
        let g = grid();
        let u = g.sample(|_, y| y);
        let v = g.sample(|x, _| -x);
        let mut div = vec![1.0; g.len()];
        divergence(&g, &u, &v, &mut div);
        assert!(interior_max_abs(&g, &div) < 1e-12, "max |div| = {}", interior_max_abs(&g, &div));
    }

    #[test]
    fn test_divergence_of_source_flow() {
        // u = x, v = y has divergence 2
        let g = grid();
        let u = g.sample(|x, _| x);
        let v = g.sample(|_, y| y);
        let mut div = g.zeros();
        divergence(&g, &u, &v, &mut div);
        assert!((div[g.idx(5, 5)] - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_laplacian_of_quadratic() {
        // ∇²(x² + 2y²) = 2 + 4 = 6, exact for the 5-point stencil
        let g = grid();
        let f = g.sample(|x, y| x * x + 2.0 * y * y);
        let mut lap = g.zeros();
        laplacian(&g, &f, &mut lap);
        for j in 1..(g.ny() - 1) {
            for i in 1..(g.nx() - 1) {
                let k = g.idx(i, j);
                assert!((lap[k] - 6.0).abs() < 1e-8, "lap at ({}, {}) = {}", i, j, lap[k]);
            }
        }
    }

    #[test]
    fn test_laplacian_second_order_accuracy() {
        use std::f64::consts::PI;
        let err = |n: usize| {
            let g = Grid::new(n, n, 1.0, 1.0).unwrap();
            let f = g.sample(|x, y| (PI * x).sin() * (PI * y).sin());
            let mut lap = g.zeros();
            laplacian(&g, &f, &mut lap);
            let mut max_err = 0.0_f64;
            for j in 1..(n - 1) {
                for i in 1..(n - 1) {
                    let k = g.idx(i, j);
                    let exact = -2.0 * PI * PI * f[k];
                    max_err = max_err.max((lap[k] - exact).abs());
                }
            }
            max_err
        };
        let coarse = err(11);
        let fine = err(21);
        let ratio = coarse / fine;
        assert!(ratio > 3.5 && ratio < 4.5, "halving h should quarter the error, ratio={}", ratio);
    }

    #[test]
    fn test_convection_schemes_agree_on_linear_field() {
        let g = grid();
        let u = vec![0.7; g.len()];
        let v = vec![-0.4; g.len()];
        let f = g.sample(|x, y| 2.0 * x + 5.0 * y);
        let mut central = g.zeros();
        let mut upwind = g.zeros();
        convection(&g, &u, &v, &f, ConvectionScheme::Central, &mut central);
        convection(&g, &u, &v, &f, ConvectionScheme::Upwind, &mut upwind);
        let expected = 0.7 * 2.0 - 0.4 * 5.0;
        let k = g.idx(7, 9);
        assert!((central[k] - expected).abs() < 1e-10, "central={}", central[k]);
        assert!((upwind[k] - expected).abs() < 1e-10, "upwind={}", upwind[k]);
    }

    #[test]
    fn test_upwind_uses_upstream_neighbor() {
        let g = Grid::new(5, 5, 1.0, 1.0).unwrap();
        let mut f = g.zeros();
        // Spike downstream of (2, 2) for positive u
        f[g.idx(3, 2)] = 1.0;
        let u = vec![1.0; g.len()];
        let v = g.zeros();
        let c = convection_at(&g, &u, &v, &f, 2, 2, ConvectionScheme::Upwind);
        assert_eq!(c, 0.0, "upwind should ignore downstream values");
        let c = convection_at(&g, &u, &v, &f, 2, 2, ConvectionScheme::Central);
        assert!(c > 0.0);
    }

    #[test]
    fn test_vorticity_of_solid_rotation() {
        // u = -y, v = x rotates counter-clockwise with ω = 2
        let g = grid();
        let u = g.sample(|_, y| -y);
        let v = g.sample(|x, _| x);
        let mut w = g.zeros();
        vorticity(&g, &u, &v, &mut w);
        assert!((w[g.idx(10, 8)] - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_interior_rms_ignores_walls() {
        let g = Grid::new(4, 4, 1.0, 1.0).unwrap();
        let mut f = vec![100.0; g.len()];
        for j in 1..3 {
            for i in 1..3 {
                f[g.idx(i, j)] = 2.0;
            }
        }
        assert!((interior_rms(&g, &f) - 2.0).abs() < 1e-12);
        assert_eq!(interior_max_abs(&g, &f), 2.0);
    }
}

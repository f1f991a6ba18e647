use crate::grid::Grid;

/// Nodal velocity components, row-major over the grid (see [`Grid::idx`]).
#[derive(Debug, Clone, PartialEq)]
pub struct VelocityField {
    pub u: Vec<f64>,
    pub v: Vec<f64>,
}

/// Nodal pressure, row-major over the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct PressureField {
    pub p: Vec<f64>,
}

impl VelocityField {
    /// Fluid at rest.
    pub fn zeros(grid: &Grid) -> Self {
        Self { u: grid.zeros(), v: grid.zeros() }
    }

    /// Maximum nodal speed |(u, v)| over the whole field, including walls.
    pub fn max_speed(&self) -> f64 {
        self.u
            .iter()
            .zip(self.v.iter())
            .map(|(u, v)| (u * u + v * v).sqrt())
            .fold(0.0_f64, f64::max)
    }

    /// Largest pointwise change of either component relative to `other`.
    pub fn max_abs_diff(&self, other: &VelocityField) -> f64 {
        max_abs_diff(&self.u, &other.u).max(max_abs_diff(&self.v, &other.v))
    }

    pub fn is_finite(&self) -> bool {
        self.u.iter().chain(self.v.iter()).all(|x| x.is_finite())
    }

    /// Copy `src` into `self` without reallocating.
    pub fn copy_from(&mut self, src: &VelocityField) {
        self.u.copy_from_slice(&src.u);
        self.v.copy_from_slice(&src.v);
    }
}

impl PressureField {
    pub fn zeros(grid: &Grid) -> Self {
        Self { p: grid.zeros() }
    }

    pub fn is_finite(&self) -> bool {
        self.p.iter().all(|x| x.is_finite())
    }
}

/// Largest pointwise |a - b| over two equally sized slices. NaN wins.
pub fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0_f64, |acc, d| if d.is_nan() || d > acc { d } else { acc })
}

use crate::error::{SolverError, SolverResult};

/// Flat index for node (i, j) in a row-major field with `nx` columns.
#[inline(always)]
pub const fn idx_inner(i: usize, j: usize, nx: usize) -> usize {
    j * nx + i
}

/// Uniform node grid over `[0, lx] x [0, ly]`.
///
/// Node `(i, j)` sits at `(i * dx, j * dy)`. Row `j = ny - 1` is the lid.
/// Fields are stored row-major with `i` fastest, see [`idx_inner`].
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    nx: usize,
    ny: usize,
    lx: f64,
    ly: f64,
    dx: f64,
    dy: f64,
}

impl Grid {
    pub fn new(nx: usize, ny: usize, lx: f64, ly: f64) -> SolverResult<Self> {
        let domain_ok = lx.is_finite() && ly.is_finite() && lx > 0.0 && ly > 0.0;
        if nx < 3 || ny < 3 || !domain_ok {
            return Err(SolverError::InvalidGrid { nx, ny, lx, ly });
        }
        Ok(Self {
            nx,
            ny,
            lx,
            ly,
            dx: lx / (nx - 1) as f64,
            dy: ly / (ny - 1) as f64,
        })
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    pub fn lx(&self) -> f64 {
        self.lx
    }

    pub fn ly(&self) -> f64 {
        self.ly
    }

    pub fn dx(&self) -> f64 {
        self.dx
    }

    pub fn dy(&self) -> f64 {
        self.dy
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    #[inline(always)]
    pub fn idx(&self, i: usize, j: usize) -> usize {
        idx_inner(i, j, self.nx)
    }

    pub fn x(&self, i: usize) -> f64 {
        i as f64 * self.dx
    }

    pub fn y(&self, j: usize) -> f64 {
        j as f64 * self.dy
    }

    /// Whether (i, j) lies on one of the four walls.
    pub fn is_boundary(&self, i: usize, j: usize) -> bool {
        i == 0 || j == 0 || i == self.nx - 1 || j == self.ny - 1
    }

    /// Whether (i, j) is one of the four corner nodes.
    pub fn is_corner(&self, i: usize, j: usize) -> bool {
        (i == 0 || i == self.nx - 1) && (j == 0 || j == self.ny - 1)
    }

    /// Zero-filled field with one entry per node.
    pub fn zeros(&self) -> Vec<f64> {
        vec![0.0; self.len()]
    }

    /// Field sampled from `f(x, y)` at every node.
    pub fn sample(&self, f: impl Fn(f64, f64) -> f64) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.len());
        for j in 0..self.ny {
            for i in 0..self.nx {
                out.push(f(self.x(i), self.y(j)));
            }
        }
        out
    }
}

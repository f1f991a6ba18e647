use crate::error::{SolverError, SolverResult};
use crate::grid::Grid;
use crate::state::{PressureField, VelocityField};

/// Field type for boundary condition dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Vx,
    Vy,
    Pressure,
}

/// Condition on one wall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeCondition {
    /// Fixed value.
    Dirichlet(f64),
    /// Zero normal gradient: copy the adjacent interior row/column.
    Neumann,
}

/// Conditions on the four walls of one field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeSet {
    pub top: EdgeCondition,
    pub bottom: EdgeCondition,
    pub left: EdgeCondition,
    pub right: EdgeCondition,
}

impl EdgeSet {
    pub fn uniform(cond: EdgeCondition) -> Self {
        Self { top: cond, bottom: cond, left: cond, right: cond }
    }

    fn all_neumann(&self) -> bool {
        [self.top, self.bottom, self.left, self.right]
            .iter()
            .all(|c| *c == EdgeCondition::Neumann)
    }
}

/// Per-field, per-wall boundary conditions.
///
/// `pressure_reference` names one wall node where p = 0. A pure-Neumann
/// pressure problem is only determined up to a constant; after the walls
/// are applied the whole field is shifted so the reference reads zero.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundarySpec {
    pub u: EdgeSet,
    pub v: EdgeSet,
    pub p: EdgeSet,
    pub pressure_reference: Option<(usize, usize)>,
}

impl BoundarySpec {
    /// Lid-driven cavity: the top wall slides at `lid_velocity`, the other
    /// walls are no-slip, pressure is zero-gradient everywhere with the lid
    /// midpoint as reference.
    pub fn lid_driven_cavity(grid: &Grid, lid_velocity: f64) -> Self {
        let no_slip = EdgeCondition::Dirichlet(0.0);
        Self {
            u: EdgeSet { top: EdgeCondition::Dirichlet(lid_velocity), ..EdgeSet::uniform(no_slip) },
            v: EdgeSet::uniform(no_slip),
            p: EdgeSet::uniform(EdgeCondition::Neumann),
            pressure_reference: Some((grid.nx() / 2, grid.ny() - 1)),
        }
    }

    /// Largest speed any wall imposes through its Dirichlet velocity
    /// conditions. Neumann walls count as still.
    pub fn max_wall_speed(&self) -> f64 {
        fn value(cond: EdgeCondition) -> f64 {
            match cond {
                EdgeCondition::Dirichlet(value) => value,
                EdgeCondition::Neumann => 0.0,
            }
        }
        [
            (self.u.top, self.v.top),
            (self.u.bottom, self.v.bottom),
            (self.u.left, self.v.left),
            (self.u.right, self.v.right),
        ]
        .iter()
        .map(|&(u, v)| value(u).hypot(value(v)))
        .fold(0.0_f64, f64::max)
    }

    pub fn edges(&self, field_type: FieldType) -> &EdgeSet {
        match field_type {
            FieldType::Vx => &self.u,
            FieldType::Vy => &self.v,
            FieldType::Pressure => &self.p,
        }
    }

    /// Check the conditions against the grid they will be applied to.
    pub fn validate(&self, grid: &Grid) -> SolverResult<()> {
        match self.pressure_reference {
            Some(_) if !self.p.all_neumann() => {
                return Err(SolverError::invalid(
                    "pressure_reference",
                    "a Dirichlet pressure wall already fixes the constant; drop the reference node",
                ));
            }
            Some((i, j)) => {
                if i >= grid.nx() || j >= grid.ny() {
                    return Err(SolverError::invalid(
                        "pressure_reference",
                        format!("node ({i}, {j}) lies outside the {}x{} grid", grid.nx(), grid.ny()),
                    ));
                }
                if !grid.is_boundary(i, j) || grid.is_corner(i, j) {
                    return Err(SolverError::invalid(
                        "pressure_reference",
                        format!("node ({i}, {j}) must be a wall node other than a corner"),
                    ));
                }
            }
            None if self.p.all_neumann() => {
                return Err(SolverError::invalid(
                    "pressure_reference",
                    "all pressure walls are Neumann; a reference node is required",
                ));
            }
            None => {}
        }
        Ok(())
    }
}

/// Overwrite every wall node of `x` according to `edges`.
///
/// Side walls are written first over rows `1..ny-1`, then the bottom and
/// top rows over the full width, so corners take the bottom/top value (for
/// Neumann rows, the value of their vertical neighbour).
pub fn set_bnd(edges: &EdgeSet, x: &mut [f64], grid: &Grid) {
    let (nx, ny) = (grid.nx(), grid.ny());

    // Pass 1: left/right walls
    for j in 1..(ny - 1) {
        x[grid.idx(0, j)] = match edges.left {
            EdgeCondition::Dirichlet(value) => value,
            EdgeCondition::Neumann => x[grid.idx(1, j)],
        };
        x[grid.idx(nx - 1, j)] = match edges.right {
            EdgeCondition::Dirichlet(value) => value,
            EdgeCondition::Neumann => x[grid.idx(nx - 2, j)],
        };
    }

    // Pass 2: bottom/top walls, corners included
    for i in 0..nx {
        x[grid.idx(i, 0)] = match edges.bottom {
            EdgeCondition::Dirichlet(value) => value,
            EdgeCondition::Neumann => x[grid.idx(i, 1)],
        };
        x[grid.idx(i, ny - 1)] = match edges.top {
            EdgeCondition::Dirichlet(value) => value,
            EdgeCondition::Neumann => x[grid.idx(i, ny - 2)],
        };
    }
}

/// Impose the velocity wall conditions on both components.
pub fn apply_velocity_boundary(grid: &Grid, bc: &BoundarySpec, vel: &mut VelocityField) {
    set_bnd(bc.edges(FieldType::Vx), &mut vel.u, grid);
    set_bnd(bc.edges(FieldType::Vy), &mut vel.v, grid);
}

/// Impose the pressure wall conditions, then shift the field so the
/// reference node reads zero. The shift leaves every gradient intact.
pub fn apply_pressure_boundary(grid: &Grid, bc: &BoundarySpec, pressure: &mut PressureField) {
    set_bnd(bc.edges(FieldType::Pressure), &mut pressure.p, grid);
    if let Some((i, j)) = bc.pressure_reference {
        let offset = pressure.p[grid.idx(i, j)];
        if offset != 0.0 {
            pressure.p.iter_mut().for_each(|x| *x -= offset);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cavity(n: usize) -> (Grid, BoundarySpec) {
        let grid = Grid::new(n, n, 1.0, 1.0).unwrap();
        let bc = BoundarySpec::lid_driven_cavity(&grid, 1.0);
        (grid, bc)
    }

    fn assert_cavity_walls(grid: &Grid, vel: &VelocityField) {
        let (nx, ny) = (grid.nx(), grid.ny());
        for i in 0..nx {
            assert_eq!(vel.u[grid.idx(i, ny - 1)], 1.0, "lid u should be 1 at i={}", i);
            assert_eq!(vel.v[grid.idx(i, ny - 1)], 0.0, "lid v should be 0 at i={}", i);
            assert_eq!(vel.u[grid.idx(i, 0)], 0.0, "bottom u should be 0 at i={}", i);
            assert_eq!(vel.v[grid.idx(i, 0)], 0.0, "bottom v should be 0 at i={}", i);
        }
        for j in 0..(ny - 1) {
            assert_eq!(vel.u[grid.idx(0, j)], 0.0, "left u should be 0 at j={}", j);
            assert_eq!(vel.v[grid.idx(0, j)], 0.0, "left v should be 0 at j={}", j);
            assert_eq!(vel.u[grid.idx(nx - 1, j)], 0.0, "right u should be 0 at j={}", j);
            assert_eq!(vel.v[grid.idx(nx - 1, j)], 0.0, "right v should be 0 at j={}", j);
        }
    }

    #[test]
    fn test_velocity_boundary_overwrites_garbage() {
        let (grid, bc) = cavity(9);
        let mut vel = VelocityField { u: vec![7.5; grid.len()], v: vec![-3.25; grid.len()] };
        apply_velocity_boundary(&grid, &bc, &mut vel);
        assert_cavity_walls(&grid, &vel);
        // Interior untouched
        assert_eq!(vel.u[grid.idx(4, 4)], 7.5);
        assert_eq!(vel.v[grid.idx(4, 4)], -3.25);
    }

    #[test]
    fn test_lid_covers_top_corners() {
        let (grid, bc) = cavity(5);
        let mut vel = VelocityField::zeros(&grid);
        apply_velocity_boundary(&grid, &bc, &mut vel);
        assert_eq!(vel.u[grid.idx(0, 4)], 1.0);
        assert_eq!(vel.u[grid.idx(4, 4)], 1.0);
        assert_eq!(vel.u[grid.idx(0, 0)], 0.0);
    }

    #[test]
    fn test_pressure_boundary_copies_neighbor() {
        let (grid, bc) = cavity(6);
        let mut p = PressureField::zeros(&grid);
        for j in 1..5 {
            for i in 1..5 {
                p.p[grid.idx(i, j)] = (10 * i + j) as f64;
            }
        }
        apply_pressure_boundary(&grid, &bc, &mut p);
        for j in 1..5 {
            assert_eq!(p.p[grid.idx(0, j)], p.p[grid.idx(1, j)], "left Neumann at j={}", j);
            assert_eq!(p.p[grid.idx(5, j)], p.p[grid.idx(4, j)], "right Neumann at j={}", j);
        }
        for i in 0..6 {
            assert_eq!(p.p[grid.idx(i, 0)], p.p[grid.idx(i, 1)], "bottom Neumann at i={}", i);
            assert_eq!(p.p[grid.idx(i, 5)], p.p[grid.idx(i, 4)], "top Neumann at i={}", i);
        }
        assert_eq!(p.p[grid.idx(3, 5)], 0.0, "reference node should read zero");
    }

    #[test]
    fn test_pressure_reference_shifts_whole_field() {
        // Reference (3, 5) copies (3, 4) = 34; everything moves down by 34
        let (grid, bc) = cavity(6);
        let mut p = PressureField::zeros(&grid);
        for j in 1..5 {
            for i in 1..5 {
                p.p[grid.idx(i, j)] = (10 * i + j) as f64;
            }
        }
        apply_pressure_boundary(&grid, &bc, &mut p);
        assert_eq!(p.p[grid.idx(3, 4)], 0.0, "node below the reference keeps zero gradient");
        assert_eq!(p.p[grid.idx(1, 1)], 11.0 - 34.0);
        assert_eq!(p.p[grid.idx(4, 2)] - p.p[grid.idx(2, 2)], 20.0, "differences survive the shift");
    }

    #[test]
    fn test_pressure_boundary_idempotent() {
        let (grid, bc) = cavity(7);
        let mut p = PressureField { p: (0..grid.len()).map(|k| (k as f64 * 0.37).sin()).collect() };
        apply_pressure_boundary(&grid, &bc, &mut p);
        let once = p.clone();
        apply_pressure_boundary(&grid, &bc, &mut p);
        assert_eq!(p, once, "second application should change nothing");
    }

    #[test]
    fn test_dirichlet_pressure_edge() {
        let grid = Grid::new(5, 5, 1.0, 1.0).unwrap();
        let bc = BoundarySpec {
            p: EdgeSet { top: EdgeCondition::Dirichlet(0.0), ..EdgeSet::uniform(EdgeCondition::Neumann) },
            pressure_reference: None,
            ..BoundarySpec::lid_driven_cavity(&grid, 1.0)
        };
        assert!(bc.validate(&grid).is_ok());
        let mut p = PressureField { p: vec![2.0; grid.len()] };
        apply_pressure_boundary(&grid, &bc, &mut p);
        for i in 0..5 {
            assert_eq!(p.p[grid.idx(i, 4)], 0.0);
            assert_eq!(p.p[grid.idx(i, 0)], 2.0);
        }
    }

    #[test]
    fn test_validate_cavity_ok() {
        let (grid, bc) = cavity(11);
        assert!(bc.validate(&grid).is_ok());
        assert_eq!(bc.pressure_reference, Some((5, 10)));
    }

    #[test]
    fn test_validate_rejects_missing_reference() {
        let (grid, mut bc) = cavity(11);
        bc.pressure_reference = None;
        assert!(matches!(
            bc.validate(&grid),
            Err(SolverError::InvalidParameter { name: "pressure_reference", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_interior_and_corner_reference() {
        let (grid, mut bc) = cavity(11);
        bc.pressure_reference = Some((5, 5));
        assert!(bc.validate(&grid).is_err(), "interior reference should be rejected");
        bc.pressure_reference = Some((10, 10));
        assert!(bc.validate(&grid).is_err(), "corner reference should be rejected");
        bc.pressure_reference = Some((3, 11));
        assert!(bc.validate(&grid).is_err(), "out-of-range reference should be rejected");
        bc.pressure_reference = Some((0, 4));
        assert!(bc.validate(&grid).is_ok(), "left wall reference is allowed");
    }

    #[test]
    fn test_validate_rejects_reference_with_dirichlet_pressure() {
        let (grid, mut bc) = cavity(11);
        bc.p.top = EdgeCondition::Dirichlet(0.0);
        assert!(bc.validate(&grid).is_err(), "reference plus Dirichlet wall should be rejected");
        bc.pressure_reference = None;
        assert!(bc.validate(&grid).is_ok());
    }

    #[test]
    fn test_max_wall_speed() {
        let (_, bc) = cavity(11);
        assert_eq!(bc.max_wall_speed(), 1.0);
        let grid = Grid::new(11, 11, 1.0, 1.0).unwrap();
        let mut bc = BoundarySpec::lid_driven_cavity(&grid, -2.0);
        assert_eq!(bc.max_wall_speed(), 2.0);
        bc.u.left = EdgeCondition::Dirichlet(3.0);
        bc.v.left = EdgeCondition::Dirichlet(4.0);
        assert!((bc.max_wall_speed() - 5.0).abs() < 1e-12);
        bc.u = EdgeSet::uniform(EdgeCondition::Neumann);
        bc.v = EdgeSet::uniform(EdgeCondition::Neumann);
        assert_eq!(bc.max_wall_speed(), 0.0);
    }

    proptest! {
        #[test]
        fn prop_velocity_walls_match_conditions(
            values in prop::collection::vec(-1.0e6f64..1.0e6, 2 * 8 * 6),
        ) {
            let grid = Grid::new(8, 6, 2.0, 1.0).unwrap();
            let bc = BoundarySpec::lid_driven_cavity(&grid, 1.0);
            let (u, v) = values.split_at(grid.len());
            let mut vel = VelocityField { u: u.to_vec(), v: v.to_vec() };
            apply_velocity_boundary(&grid, &bc, &mut vel);
            assert_cavity_walls(&grid, &vel);
            let once = vel.clone();
            apply_velocity_boundary(&grid, &bc, &mut vel);
            prop_assert_eq!(vel, once);
        }
    }
}

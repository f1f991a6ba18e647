//! Two-dimensional incompressible Navier-Stokes solver for the lid-driven
//! cavity, using Chorin's projection method on a collocated node grid.
//!
//! A [`Simulation`] owns the grid, fields and boundary conditions and drives
//! [`solver::TimeStepper`] until the flow is steady, diverges or the step
//! cap is reached.

pub mod config;
pub mod driver;
pub mod error;
pub mod grid;
pub mod solver;
pub mod state;

pub use driver::{NonConvergencePolicy, RunReport, RunSettings, RunStatus, Simulation};
pub use error::{SolverError, SolverResult, StabilityBound};
pub use grid::Grid;
pub use state::{PressureField, VelocityField};

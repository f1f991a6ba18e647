use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::driver::{NonConvergencePolicy, RunSettings};
use crate::error::SolverResult;
use crate::grid::Grid;
use crate::solver::{ConvectionScheme, PoissonSettings, Relaxation, SolverParams};

pub const DEFAULT_PATH: &str = "lidcavity.yaml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub grid: GridConfig,
    pub physics: PhysicsConfig,
    pub time: TimeConfig,
    pub pressure: PressureConfig,
    /// Default log filter; `RUST_LOG` takes precedence.
    pub log_level: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub nx: usize,
    pub ny: usize,
    pub lx: f64,
    pub ly: f64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub density: f64,
    pub viscosity: f64,
    pub lid_velocity: f64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    pub dt: f64,
    pub max_steps: usize,
    pub steady_tolerance: f64,
    pub blowup_speed: f64,
    pub enforce_stability: bool,
    pub convection: ConvectionScheme,
    pub report_interval: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelaxationKind {
    Jacobi,
    GaussSeidel,
    Sor,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PressureConfig {
    pub relaxation: RelaxationKind,
    /// Only read for `sor`.
    pub omega: f64,
    pub tolerance: f64,
    pub max_iterations: usize,
    pub on_non_convergence: NonConvergencePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            physics: PhysicsConfig::default(),
            time: TimeConfig::default(),
            pressure: PressureConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { nx: 41, ny: 41, lx: 1.0, ly: 1.0 }
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self { density: 1.0, viscosity: 0.01, lid_velocity: 1.0 }
    }
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            dt: 0.001,
            max_steps: 50_000,
            steady_tolerance: 1e-6,
            blowup_speed: 100.0,
            enforce_stability: true,
            convection: ConvectionScheme::Central,
            report_interval: 1000,
        }
    }
}

impl Default for PressureConfig {
    fn default() -> Self {
        Self {
            relaxation: RelaxationKind::Sor,
            omega: 1.8,
            tolerance: 1e-6,
            max_iterations: 500,
            on_non_convergence: NonConvergencePolicy::Continue,
        }
    }
}

impl Config {
    pub fn grid(&self) -> SolverResult<Grid> {
        Grid::new(self.grid.nx, self.grid.ny, self.grid.lx, self.grid.ly)
    }

    pub fn solver_params(&self) -> SolverParams {
        SolverParams {
            density: self.physics.density,
            viscosity: self.physics.viscosity,
            lid_velocity: self.physics.lid_velocity,
            dt: self.time.dt,
            convection: self.time.convection,
            enforce_stability: self.time.enforce_stability,
        }
    }

    pub fn poisson_settings(&self) -> PoissonSettings {
        let relaxation = match self.pressure.relaxation {
            RelaxationKind::Jacobi => Relaxation::Jacobi,
            RelaxationKind::GaussSeidel => Relaxation::GaussSeidel,
            RelaxationKind::Sor => Relaxation::Sor { omega: self.pressure.omega },
        };
        PoissonSettings {
            relaxation,
            tolerance: self.pressure.tolerance,
            max_iterations: self.pressure.max_iterations,
        }
    }

    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            max_steps: self.time.max_steps,
            steady_tolerance: self.time.steady_tolerance,
            blowup_speed: self.time.blowup_speed,
            on_non_convergence: self.pressure.on_non_convergence,
            report_interval: self.time.report_interval,
        }
    }
}

/// Parse a YAML document into a config.
pub fn parse(contents: &str, path: &Path) -> Result<Config, ConfigError> {
    serde_yaml::from_str(contents).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
}

/// Load `path`; a missing file yields the defaults.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents =
        std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    parse(&contents, path)
}

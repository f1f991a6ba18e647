use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use env_logger::{Builder, Target};
use log::LevelFilter;

use lidcavity::config::{self, Config};
use lidcavity::solver::diagnostics::{centerline_u, compute_kinetic_energy, divergence_rms, find_vortex_center};
use lidcavity::{RunStatus, Simulation, SolverResult};

/// Configured level as the default, refined or overridden by `RUST_LOG`
/// directives (`debug`, `lidcavity::solver=trace,warn`, ...).
fn log_builder(configured: &str, env_filters: Option<&str>) -> Builder {
    let mut builder = Builder::new();
    builder.filter_level(configured.parse::<LevelFilter>().unwrap_or(LevelFilter::Info));
    if let Some(filters) = env_filters {
        builder.parse_filters(filters);
    }
    builder
        .target(Target::Stderr)
        .format(|buf, record| writeln!(buf, "[{:5} {}] {}", record.level(), record.target(), record.args()));
    builder
}

fn init_logging(configured: &str) {
    let env_filters = std::env::var("RUST_LOG").ok();
    log_builder(configured, env_filters.as_deref()).init();
}

fn run(cfg: &Config) -> SolverResult<RunStatus> {
    let grid = cfg.grid()?;
    let mut sim = Simulation::new(grid, cfg.solver_params(), cfg.poisson_settings(), cfg.run_settings())?;
    let report = sim.run()?;

    let grid = sim.grid();
    let vel = sim.velocity();
    let status = match report.status {
        RunStatus::Converged => "converged",
        RunStatus::Diverged => "diverged",
        RunStatus::Exhausted => "step limit reached",
    };
    println!("status:      {} after {} steps (t = {:.4} s)", status, report.steps, report.time);
    println!(
        "grid:        {}x{} nodes, Re = {:.1}",
        grid.nx(),
        grid.ny(),
        sim.params().reynolds(grid.lx())
    );
    println!("kinetic energy: {:.6e}", compute_kinetic_energy(grid, vel));
    println!("divergence RMS: {:.6e}", divergence_rms(grid, vel));
    if report.pressure_failures > 0 {
        println!("pressure solves not converged: {}", report.pressure_failures);
    }

    let center = find_vortex_center(grid, vel);
    println!("vortex centre: x = {:.4}, y = {:.4}, psi = {:.6e}", center.x, center.y, center.psi);

    println!();
    println!("{:>8} {:>12}", "y", "u(x=0.5L)");
    for (y, u) in centerline_u(grid, vel) {
        println!("{:>8.4} {:>12.6}", y, u);
    }
    Ok(report.status)
}

fn main() -> ExitCode {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_PATH));

    let loaded = config::load(&path);
    let level = loaded.as_ref().map(|cfg| cfg.log_level.as_str()).unwrap_or("info");
    init_logging(level);

    let cfg = match loaded {
        Ok(cfg) => cfg,
        Err(e) => {
            log::warn!("{e}; using defaults");
            Config::default()
        }
    };

    match run(&cfg) {
        Ok(RunStatus::Diverged) => ExitCode::from(2),
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

use crate::error::{SolverError, SolverResult, StabilityBound};
use crate::grid::Grid;

/// Time step limits of the explicit scheme on a given grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilityLimits {
    /// min(dx², dy²) / (4ν); infinite for inviscid flow.
    pub diffusive: f64,
    /// min(dx, dy) / max|u|; infinite for fluid at rest.
    pub convective: f64,
}

impl StabilityLimits {
    pub fn new(grid: &Grid, viscosity: f64, max_speed: f64) -> Self {
        let h = grid.dx().min(grid.dy());
        let diffusive = if viscosity > 0.0 { h * h / (4.0 * viscosity) } else { f64::INFINITY };
        let convective = if max_speed > 0.0 { h / max_speed } else { f64::INFINITY };
        Self { diffusive, convective }
    }

    /// The tighter of the two limits.
    pub fn max_dt(&self) -> f64 {
        self.diffusive.min(self.convective)
    }

    /// Fails with the first limit `dt` does not stay strictly below.
    pub fn check(&self, dt: f64) -> SolverResult<()> {
        if dt >= self.diffusive {
            return Err(SolverError::StabilityViolation {
                bound: StabilityBound::Diffusive,
                dt,
                limit: self.diffusive,
            });
        }
        if dt >= self.convective {
            return Err(SolverError::StabilityViolation {
                bound: StabilityBound::Convective,
                dt,
                limit: self.convective,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Grid {
        // dx = dy = 0.1
        Grid::new(11, 11, 1.0, 1.0).unwrap()
    }

    #[test]
    fn test_limits() {
        let limits = StabilityLimits::new(&grid(), 0.1, 2.0);
        assert!((limits.diffusive - 0.025).abs() < 1e-12, "diffusive={}", limits.diffusive);
        assert!((limits.convective - 0.05).abs() < 1e-12, "convective={}", limits.convective);
        assert!((limits.max_dt() - 0.025).abs() < 1e-12);
    }

    #[test]
    fn test_check_passes_small_dt() {
        let limits = StabilityLimits::new(&grid(), 0.01, 1.0);
        assert!(limits.check(0.01).is_ok());
    }

    #[test]
    fn test_check_diffusive_violation() {
        let limits = StabilityLimits::new(&grid(), 0.1, 1.0);
        match limits.check(0.03) {
            Err(SolverError::StabilityViolation { bound, dt, limit }) => {
                assert_eq!(bound, StabilityBound::Diffusive);
                assert_eq!(dt, 0.03);
                assert!((limit - 0.025).abs() < 1e-12);
            }
            other => panic!("expected diffusive violation, got {:?}", other),
        }
    }

    #[test]
    fn test_check_convective_violation() {
        let limits = StabilityLimits::new(&grid(), 0.001, 10.0);
        assert!(matches!(
            limits.check(0.02),
            Err(SolverError::StabilityViolation { bound: StabilityBound::Convective, .. })
        ));
    }

    #[test]
    fn test_rest_and_inviscid_are_unbounded() {
        let limits = StabilityLimits::new(&grid(), 0.0, 0.0);
        assert!(limits.diffusive.is_infinite());
        assert!(limits.convective.is_infinite());
        assert!(limits.check(1.0).is_ok());
    }
}

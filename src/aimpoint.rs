//! Aimpoint solver: searches for the launch thrust-angle pair whose nominal
//! (perturbation-free) trajectory impacts a specified target point.
//!
//! Stage 1 estimates a great-circle bearing toward the target and refines a
//! single magnitude scale on that bearing with a bracketed Brent line
//! search. Stage 2 polishes both angles with a box-constrained
//! finite-difference descent. Every objective evaluation is one complete
//! deterministic flight.

use std::f64::consts::PI;

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{RunConfig, RunType};
use crate::coords;
use crate::error::SimError;
use crate::flight;
use crate::optimize::{bracket_minimum, brent_minimize, ConstrainedDescent};
use crate::vehicle::Vehicle;

const BRENT_TOL: f64 = 1e-6;

/// Thrust angles selected by the solver and the residual miss distance of
/// the nominal trajectory they produce.
#[derive(Debug, Clone, Copy)]
pub struct AimpointSolution {
    pub theta_long: f64,
    pub theta_lat: f64,
    /// Euclidean miss distance at impact (m)
    pub miss: f64,
}

/// Wrap an angle into [-pi, pi].
pub fn wrap_angle(theta: f64) -> f64 {
    (theta + PI).rem_euclid(2.0 * PI) - PI
}

/// Miss distance of one deterministic nominal flight flown with the given
/// thrust angles.
fn evaluate_miss(nominal: &RunConfig, theta_lat: f64, theta_long: f64) -> f64 {
    let mut config = nominal.clone();
    config.theta_lat = wrap_angle(theta_lat);
    config.theta_long = wrap_angle(theta_long);

    let mut vehicle = Vehicle::for_config(&config);
    let mut rng = StdRng::seed_from_u64(0);
    match flight::fly(&config, &mut vehicle, &mut rng) {
        Ok(impact) => (impact.pos - config.aimpoint()).norm(),
        Err(_) => f64::INFINITY,
    }
}

/// Search for the thrust angles that steer the nominal trajectory onto the
/// configured aimpoint. Reentry-only runs have no powered steering; their
/// configured angles are returned unchanged.
pub fn update_aimpoint(config: &RunConfig) -> Result<AimpointSolution, SimError> {
    config.validate()?;
    let nominal = config.nominal();

    if config.run_type == RunType::ReentryOnly {
        return Ok(AimpointSolution {
            theta_long: config.theta_long,
            theta_lat: config.theta_lat,
            miss: evaluate_miss(&nominal, config.theta_lat, config.theta_long),
        });
    }

    // Stage 1: great-circle bearing from the launch point toward the
    // target, then a scalar magnitude search along that bearing.
    let target = coords::cart_to_spher(&config.aimpoint());
    let (target_lon, target_lat) = (target.y, target.z);
    let bearing_lat = target_lat.sin();
    let bearing_long = target_lon.sin() * target_lat.cos();

    let mut magnitude_objective =
        |m: f64| evaluate_miss(&nominal, m * bearing_lat, m * bearing_long);
    let bracket = bracket_minimum(0.5, 1.5, &mut magnitude_objective);
    let line = brent_minimize(&bracket, BRENT_TOL, &mut magnitude_objective);
    if !line.converged {
        warn!(
            "magnitude line search did not converge after {} iterations; keeping best point",
            line.iterations
        );
    }

    let mut theta_lat = wrap_angle(line.xmin * bearing_lat);
    let mut theta_long = wrap_angle(line.xmin * bearing_long);
    let mut miss = line.fmin;
    debug!(
        "stage 1: theta_lat = {:.6}, theta_long = {:.6}, miss = {:.1} m",
        theta_lat, theta_long, miss
    );

    // Stage 2: constrained 2-D refinement of both angles.
    let descent = ConstrainedDescent {
        lower: [-PI, -PI],
        upper: [PI, PI],
        fd_step: 1e-6,
        grad_scale: 1e6,
        ftol: 1e-6,
        max_iters: 100,
    };
    let mut angle_objective = |x: [f64; 2]| evaluate_miss(&nominal, x[0], x[1]);
    let (refined, refined_miss) = descent.minimize([theta_lat, theta_long], &mut angle_objective);
    if refined_miss < miss {
        theta_lat = refined[0];
        theta_long = refined[1];
        miss = refined_miss;
    }
    debug!(
        "stage 2: theta_lat = {:.6}, theta_long = {:.6}, miss = {:.1} m",
        theta_lat, theta_long, miss
    );

    Ok(AimpointSolution {
        theta_long,
        theta_lat,
        miss,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wrap_angle() {
        assert_relative_eq!(wrap_angle(0.0), 0.0);
        assert_relative_eq!(wrap_angle(3.0 * PI), -PI, epsilon = 1e-12);
        assert_relative_eq!(wrap_angle(-PI / 2.0), -PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(wrap_angle(2.0 * PI + 0.25), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_reentry_only_returns_configured_angles() {
        let config = RunConfig {
            run_type: RunType::ReentryOnly,
            theta_long: 0.4,
            theta_lat: -0.1,
            ..Default::default()
        };
        let solution = update_aimpoint(&config).unwrap();
        assert_eq!(solution.theta_long, 0.4);
        assert_eq!(solution.theta_lat, -0.1);
    }
}

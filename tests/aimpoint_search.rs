use reentry_engine::config::{RunConfig, RunType, RvType};
use reentry_engine::{fly, update_aimpoint, Vehicle};

use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn test_solver_converges_on_reachable_target() {
    // Generate a guaranteed-reachable target by flying known thrust angles,
    // then ask the solver to recover an angle pair that hits it.
    let base = RunConfig {
        run_type: RunType::FullTrajectory,
        rv_type: RvType::Ballistic,
        time_step_main: 1.0,
        time_step_reentry: 0.5,
        seed: Some(0),
        ..Default::default()
    };

    let reference = RunConfig {
        theta_lat: 0.3,
        theta_long: 0.1,
        ..base.clone()
    };
    let mut vehicle = Vehicle::for_config(&reference);
    let mut rng = StdRng::seed_from_u64(0);
    let target = fly(&reference, &mut vehicle, &mut rng).unwrap();
    assert!(target.altitude().abs() < 10.0);

    let config = RunConfig {
        x_aim: target.pos.x,
        y_aim: target.pos.y,
        z_aim: target.pos.z,
        ..base
    };
    let solution = update_aimpoint(&config).unwrap();

    assert!(
        solution.miss < 10_000.0,
        "solver missed by {:.0} m (theta_lat = {:.4}, theta_long = {:.4})",
        solution.miss,
        solution.theta_lat,
        solution.theta_long
    );
    assert!(solution.theta_lat.abs() <= std::f64::consts::PI);
    assert!(solution.theta_long.abs() <= std::f64::consts::PI);
}

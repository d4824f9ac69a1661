//! Aerodynamic force models: drag on every track, lift on maneuvering
//! reentry vehicles. Both mutate the acceleration components of the passed
//! state in place, reading density and wind from the supplied atmosphere
//! sample.

use nalgebra::Vector3;

use crate::atmosphere::AtmosphereSample;
use crate::config::{RunConfig, RunType};
use crate::constants::MIN_SPEED_THRESHOLD;
use crate::coords;
use crate::state::VehicleState;
use crate::vehicle::Vehicle;

/// First-order lift response time constant (s). The realized lift chases
/// the commanded acceleration with this lag.
const LIFT_TIME_CONSTANT: f64 = 1.0;

/// Update the state's drag acceleration components in place.
///
/// Drag opposes the airspeed vector (velocity minus local wind). During
/// powered flight the booster's reference area and drag coefficient apply;
/// after burnout the RV ballistic coefficient does. `step_timer` is the
/// elapsed time inside the step-anomaly window, owned and advanced by the
/// flight driver.
pub fn update_drag(
    config: &RunConfig,
    vehicle: &Vehicle,
    sample: &AtmosphereSample,
    state: &mut VehicleState,
    step_timer: &f64,
) {
    let wind = coords::local_wind_to_cart(
        sample.meridional_wind,
        sample.zonal_wind,
        sample.vertical_wind,
        &state.pos,
    );
    let v_rel = state.vel - wind;
    let speed = v_rel.norm();
    if speed < MIN_SPEED_THRESHOLD {
        state.a_drag = Vector3::zeros();
        return;
    }

    let boosting =
        !vehicle.booster.stages.is_empty() && state.t < vehicle.booster.total_burn_time;
    let coefficient = if boosting {
        0.5 * sample.density * vehicle.booster.c_d * vehicle.booster.area
            / vehicle.current_mass
    } else {
        0.5 * sample.density / vehicle.rv.beta
    };

    state.a_drag = v_rel * (-coefficient * speed);

    // Step-function drag anomaly, reentry-only runs
    if config.run_type == RunType::ReentryOnly
        && config.step_acc_mag != 0.0
        && sample.altitude < config.step_acc_hgt
        && *step_timer < config.step_acc_dur
    {
        state.a_drag *= 1.0 + config.step_acc_mag;
    }
}

/// Update the state's lift acceleration components in place, realizing the
/// commanded acceleration up to the maximum attainable lift at the current
/// dynamic pressure, with a first-order response lag.
pub fn update_lift(
    config: &RunConfig,
    state: &mut VehicleState,
    command: &Vector3<f64>,
    sample: &AtmosphereSample,
    vehicle: &Vehicle,
    dt: f64,
) {
    let wind = coords::local_wind_to_cart(
        sample.meridional_wind,
        sample.zonal_wind,
        sample.vertical_wind,
        &state.pos,
    );
    let v_rel = state.vel - wind;
    let speed = v_rel.norm();

    let c_l = vehicle.rv.c_l_max * (1.0 + config.cl_pert);
    let dynamic_pressure = 0.5 * sample.density * speed * speed;
    let max_accel = dynamic_pressure * vehicle.rv.area * c_l / vehicle.current_mass;

    let command_mag = command.norm();
    let target = if command_mag > max_accel && command_mag > 0.0 {
        command * (max_accel / command_mag)
    } else {
        *command
    };

    let alpha = (dt / LIFT_TIME_CONSTANT).min(1.0);
    state.a_lift += (target - state.a_lift) * alpha;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atmosphere::AtmosphereModel;
    use crate::constants::EARTH_RADIUS_M;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample_at(altitude: f64) -> AtmosphereSample {
        let config = RunConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        AtmosphereModel::initialize(&config, &mut rng).sample(altitude)
    }

    fn descending_state(speed: f64) -> VehicleState {
        VehicleState {
            t: 1000.0,
            pos: Vector3::new(EARTH_RADIUS_M + 10e3, 0.0, 0.0),
            vel: Vector3::new(-speed, 0.0, 0.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_drag_opposes_velocity() {
        let config = RunConfig::default();
        let vehicle = Vehicle::reentry_only();
        let mut state = descending_state(3000.0);
        update_drag(&config, &vehicle, &sample_at(10e3), &mut state, &0.0);
        // velocity is -x, drag must be +x
        assert!(state.a_drag.x > 0.0);
        assert_relative_eq!(state.a_drag.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_drag_scales_with_density() {
        let config = RunConfig::default();
        let vehicle = Vehicle::reentry_only();
        let mut low = descending_state(3000.0);
        let mut high = descending_state(3000.0);
        update_drag(&config, &vehicle, &sample_at(5e3), &mut low, &0.0);
        update_drag(&config, &vehicle, &sample_at(50e3), &mut high, &0.0);
        assert!(low.a_drag.norm() > high.a_drag.norm());
    }

    #[test]
    fn test_mock_vehicle_drag_negligible() {
        let config = RunConfig::default();
        let vehicle = Vehicle::mock();
        let mut state = descending_state(300.0);
        update_drag(&config, &vehicle, &sample_at(0.0), &mut state, &0.0);
        assert!(state.a_drag.norm() < 1e-6);
    }

    #[test]
    fn test_step_anomaly_scales_drag() {
        let vehicle = Vehicle::reentry_only();
        let base_config = RunConfig {
            run_type: RunType::ReentryOnly,
            ..Default::default()
        };
        let anomaly_config = RunConfig {
            step_acc_mag: 0.5,
            step_acc_hgt: 20e3,
            step_acc_dur: 5.0,
            ..base_config.clone()
        };
        let mut plain = descending_state(3000.0);
        let mut stepped = descending_state(3000.0);
        update_drag(&base_config, &vehicle, &sample_at(10e3), &mut plain, &0.0);
        update_drag(&anomaly_config, &vehicle, &sample_at(10e3), &mut stepped, &0.0);
        assert_relative_eq!(
            stepped.a_drag.norm(),
            1.5 * plain.a_drag.norm(),
            epsilon = 1e-9
        );

        // expired window: no scaling
        let mut expired = descending_state(3000.0);
        update_drag(&anomaly_config, &vehicle, &sample_at(10e3), &mut expired, &10.0);
        assert_relative_eq!(expired.a_drag.norm(), plain.a_drag.norm(), epsilon = 1e-9);
    }

    #[test]
    fn test_lift_saturates_at_max() {
        let config = RunConfig::default();
        let vehicle = Vehicle::maneuverable();
        let mut state = descending_state(3000.0);
        let huge_command = Vector3::new(0.0, 1e9, 0.0);
        // dt far beyond the lag constant: realized lift reaches the cap
        update_lift(&config, &mut state, &huge_command, &sample_at(10e3), &vehicle, 10.0);

        let sample = sample_at(10e3);
        let q = 0.5 * sample.density * 3000.0 * 3000.0;
        let expected_max = q * vehicle.rv.area * vehicle.rv.c_l_max / vehicle.current_mass;
        assert_relative_eq!(state.a_lift.norm(), expected_max, epsilon = 1e-6);
    }

    #[test]
    fn test_lift_lags_command() {
        let config = RunConfig::default();
        let vehicle = Vehicle::maneuverable();
        let mut state = descending_state(3000.0);
        let command = Vector3::new(0.0, 1.0, 0.0);
        update_lift(&config, &mut state, &command, &sample_at(10e3), &vehicle, 0.1);
        assert!(state.a_lift.norm() > 0.0);
        assert!(state.a_lift.norm() < command.norm());
    }
}

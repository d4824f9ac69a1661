//! Vehicle state: one kinematic/kinetic snapshot of a simulated vehicle.
//!
//! Each flight advances three independent instances in lock-step: the true
//! state (ground truth), the estimated state (onboard navigation's belief),
//! and the desired state (guidance's target). They are never shared.

use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::config::{RunConfig, RunType};
use crate::constants::EARTH_RADIUS_M;
use crate::coords;

/// Kinematic and kinetic snapshot of a single vehicle track.
///
/// Accelerations are split by cause (gravity, drag, lift, thrust) plus a
/// summed total; the force collaborators mutate their own component and
/// `sum_accelerations` combines them once per step before integration.
#[derive(Debug, Clone, Copy, Default)]
pub struct VehicleState {
    /// Simulation time (s)
    pub t: f64,
    /// Earth-centered Cartesian position (m)
    pub pos: Vector3<f64>,
    /// Earth-centered Cartesian velocity (m/s)
    pub vel: Vector3<f64>,

    /// Thrust steering angles (rad)
    pub theta_long: f64,
    pub theta_lat: f64,
    /// Frozen initial steering perturbations (rad), zero on nominal tracks
    pub initial_theta_long_pert: f64,
    pub initial_theta_lat_pert: f64,

    /// Acceleration by cause (m/s²)
    pub a_grav: Vector3<f64>,
    pub a_drag: Vector3<f64>,
    pub a_lift: Vector3<f64>,
    pub a_thrust: Vector3<f64>,
    /// Summed total acceleration (m/s²)
    pub a_total: Vector3<f64>,
}

impl VehicleState {
    /// Altitude of this state above the Earth surface (m).
    pub fn altitude(&self) -> f64 {
        coords::altitude(&self.pos)
    }

    /// Sum the four acceleration causes into the total.
    pub fn sum_accelerations(&mut self) {
        self.a_total = self.a_grav + self.a_drag + self.a_lift + self.a_thrust;
    }
}

fn gaussian(rng: &mut StdRng, sigma: f64) -> f64 {
    let draw: f64 = rng.sample(StandardNormal);
    sigma * draw
}

/// Initialize the true (ground truth) state for a flight, drawing the
/// configured initial condition and steering perturbations.
pub fn init_true_state(config: &RunConfig, rng: &mut StdRng) -> VehicleState {
    let mut state = VehicleState::default();

    match config.run_type {
        RunType::FullTrajectory => {
            state.pos = Vector3::new(
                EARTH_RADIUS_M + gaussian(rng, config.initial_x_error),
                gaussian(rng, config.initial_pos_error),
                gaussian(rng, config.initial_pos_error),
            );
            state.vel = Vector3::new(
                gaussian(rng, config.initial_vel_error),
                gaussian(rng, config.initial_vel_error),
                gaussian(rng, config.initial_vel_error),
            );
        }
        RunType::ReentryOnly => {
            state.pos = Vector3::new(
                EARTH_RADIUS_M + 500e3 + gaussian(rng, config.initial_x_error),
                gaussian(rng, config.initial_pos_error),
                gaussian(rng, config.initial_pos_error),
            );
            state.vel = Vector3::new(
                -config.reentry_vel + gaussian(rng, config.initial_vel_error),
                gaussian(rng, config.initial_vel_error),
                gaussian(rng, config.initial_vel_error),
            );
        }
    }

    // A common rotational perturbation couples the two steering angles in
    // addition to their independent draws.
    let initial_rot_pert = gaussian(rng, config.initial_angle_error);
    state.initial_theta_lat_pert = gaussian(rng, config.initial_angle_error)
        + config.theta_long * initial_rot_pert
        - (config.theta_lat * initial_rot_pert).abs();
    state.initial_theta_long_pert = gaussian(rng, config.initial_angle_error)
        - config.theta_lat * initial_rot_pert
        - (config.theta_long * initial_rot_pert).abs();
    state.theta_long = config.theta_long + state.initial_theta_long_pert;
    state.theta_lat = config.theta_lat + state.initial_theta_lat_pert;

    state
}

/// Initialize a nominal (unperturbed) state, used for the estimated and
/// desired tracks.
pub fn init_est_state(config: &RunConfig) -> VehicleState {
    let mut state = VehicleState::default();

    match config.run_type {
        RunType::FullTrajectory => {
            state.pos = Vector3::new(EARTH_RADIUS_M, 0.0, 0.0);
        }
        RunType::ReentryOnly => {
            state.pos = Vector3::new(EARTH_RADIUS_M + 500e3, 0.0, 0.0);
            state.vel = Vector3::new(-config.reentry_vel, 0.0, 0.0);
        }
    }

    state.theta_long = config.theta_long;
    state.theta_lat = config.theta_lat;
    state
}

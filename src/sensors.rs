//! Onboard sensor models feeding the estimated track.
//!
//! The IMU replaces the estimated state's total acceleration with a
//! measurement of the true one, corrupted by a frozen scale factor error and
//! an accumulating gyro misalignment. The GNSS receiver overwrites the
//! estimated position with a noisy fix of the true one.

use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::config::RunConfig;
use crate::state::VehicleState;

fn gaussian(rng: &mut StdRng, sigma: f64) -> f64 {
    let draw: f64 = rng.sample(StandardNormal);
    sigma * draw
}

/// Inertial measurement unit. Scale factor and gyro biases are drawn once
/// per flight; the gyro misalignment angles accumulate as bias plus
/// random-walk noise.
#[derive(Debug, Clone)]
pub struct Imu {
    /// Accelerometer scale factor, nominally 1
    acc_scale: f64,
    gyro_bias_lat: f64,
    gyro_bias_long: f64,
    gyro_noise: f64,
    /// Accumulated misalignment angles (rad)
    gyro_error_lat: f64,
    gyro_error_long: f64,
}

impl Imu {
    pub fn initialize(config: &RunConfig, rng: &mut StdRng) -> Self {
        Imu {
            acc_scale: 1.0 + gaussian(rng, config.acc_scale_stability),
            gyro_bias_lat: gaussian(rng, config.gyro_bias_stability),
            gyro_bias_long: gaussian(rng, config.gyro_bias_stability),
            gyro_noise: config.gyro_noise,
            gyro_error_lat: 0.0,
            gyro_error_long: 0.0,
        }
    }

    /// Advance the accumulated gyro misalignment over one time step:
    /// deterministic bias drift plus a random walk.
    pub fn update(&mut self, dt: f64, rng: &mut StdRng) {
        let walk = self.gyro_noise * dt.sqrt();
        self.gyro_error_lat += self.gyro_bias_lat * dt + gaussian(rng, walk);
        self.gyro_error_long += self.gyro_bias_long * dt + gaussian(rng, walk);
    }

    /// Reset the accumulated misalignment, as a stellar or external
    /// alignment update would.
    pub fn zero_gyro_errors(&mut self) {
        self.gyro_error_lat = 0.0;
        self.gyro_error_long = 0.0;
    }

    /// Overwrite the estimated state's total acceleration with the measured
    /// true acceleration: scaled, then rotated by the small misalignment
    /// angles.
    pub fn measure(&self, true_state: &VehicleState, est_state: &mut VehicleState) {
        let a = true_state.a_total * self.acc_scale;
        est_state.a_total = Vector3::new(
            a.x - self.gyro_error_long * a.y + self.gyro_error_lat * a.z,
            a.y + self.gyro_error_long * a.x,
            a.z - self.gyro_error_lat * a.x,
        );
    }
}

/// GNSS receiver: position fixes with independent Gaussian noise per axis.
#[derive(Debug, Clone)]
pub struct Gnss {
    noise: f64,
}

impl Gnss {
    pub fn initialize(config: &RunConfig) -> Self {
        Gnss {
            noise: config.gnss_noise,
        }
    }

    /// Overwrite the estimated position with a noisy fix of the true one.
    pub fn measure(
        &self,
        true_state: &VehicleState,
        est_state: &mut VehicleState,
        rng: &mut StdRng,
    ) {
        est_state.pos = true_state.pos
            + Vector3::new(
                gaussian(rng, self.noise),
                gaussian(rng, self.noise),
                gaussian(rng, self.noise),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    fn accelerating_state() -> VehicleState {
        VehicleState {
            a_total: Vector3::new(-9.0, 2.0, 1.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_perfect_imu_passes_acceleration_through() {
        let mut rng = StdRng::seed_from_u64(3);
        let imu = Imu::initialize(&RunConfig::default(), &mut rng);
        let true_state = accelerating_state();
        let mut est_state = VehicleState::default();
        imu.measure(&true_state, &mut est_state);
        assert_relative_eq!(
            (est_state.a_total - true_state.a_total).norm(),
            0.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_biased_imu_drifts() {
        let config = RunConfig {
            gyro_bias_stability: 1e-4,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let mut imu = Imu::initialize(&config, &mut rng);
        let true_state = accelerating_state();

        let mut est_state = VehicleState::default();
        imu.measure(&true_state, &mut est_state);
        let before = est_state.a_total;

        for _ in 0..1000 {
            imu.update(1.0, &mut rng);
        }
        imu.measure(&true_state, &mut est_state);
        assert!((est_state.a_total - before).norm() > 0.0);
    }

    #[test]
    fn test_zero_gyro_errors_resets_alignment() {
        let config = RunConfig {
            gyro_bias_stability: 1e-3,
            acc_scale_stability: 0.0,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(9);
        let mut imu = Imu::initialize(&config, &mut rng);
        for _ in 0..100 {
            imu.update(1.0, &mut rng);
        }
        imu.zero_gyro_errors();

        let true_state = accelerating_state();
        let mut est_state = VehicleState::default();
        imu.measure(&true_state, &mut est_state);
        assert_relative_eq!(
            (est_state.a_total - true_state.a_total).norm(),
            0.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_gnss_fix_tracks_true_position() {
        let config = RunConfig {
            gnss_noise: 10.0,
            ..Default::default()
        };
        let gnss = Gnss::initialize(&config);
        let mut rng = StdRng::seed_from_u64(21);
        let true_state = VehicleState {
            pos: Vector3::new(6.5e6, 1e5, -2e4),
            ..Default::default()
        };
        let mut est_state = VehicleState::default();
        gnss.measure(&true_state, &mut est_state, &mut rng);
        let miss = (est_state.pos - true_state.pos).norm();
        assert!(miss > 0.0);
        assert!(miss < 100.0);
    }

    #[test]
    fn test_noiseless_gnss_is_exact() {
        let gnss = Gnss::initialize(&RunConfig::default());
        let mut rng = StdRng::seed_from_u64(21);
        let true_state = VehicleState {
            pos: Vector3::new(6.5e6, 1e5, -2e4),
            ..Default::default()
        };
        let mut est_state = VehicleState::default();
        gnss.measure(&true_state, &mut est_state, &mut rng);
        assert_relative_eq!((est_state.pos - true_state.pos).norm(), 0.0);
    }
}

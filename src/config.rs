//! Run configuration: the immutable per-run parameter set, loaded from a
//! TOML file or built programmatically.
//!
//! A `RunConfig` is read-only for the duration of one flight. The aimpoint
//! solver works on its own mutable copy, updating the thrust angles and
//! aimpoint between (never during) flights.

use std::path::{Path, PathBuf};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::constants::MAX_RUNS;
use crate::error::SimError;

/// Overall run mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunType {
    /// Launch through boost, midcourse, and reentry to impact.
    FullTrajectory,
    /// Reentry only, starting from a high-altitude initial state.
    ReentryOnly,
}

/// Reentry vehicle type selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RvType {
    Ballistic,
    Maneuverable,
}

/// Reentry maneuvering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManeuverMode {
    /// No reentry guidance.
    Off,
    /// Proportional-navigation guidance with a lift response.
    Guided,
    /// Idealized maneuvering that nulls residual navigation error at impact.
    Perfect,
}

/// Atmosphere law selector for the true (perturbed) side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtmosphereLaw {
    /// Closed-form exponential decay.
    Exponential,
    /// Altitude-indexed lookup from a pre-loaded empirical profile table.
    Profile,
}

/// Per-run configuration. Field semantics follow the documented run
/// parameter set; all distances are meters, times seconds, angles radians.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub run_name: String,
    pub run_type: RunType,
    pub rv_type: RvType,

    /// Number of Monte Carlo iterations (at most `MAX_RUNS`).
    pub num_runs: usize,
    /// Time step during boost and outside the atmosphere (s).
    pub time_step_main: f64,
    /// Time step during reentry (s).
    pub time_step_reentry: f64,

    /// Write per-step trajectory diagnostics for the first iteration.
    pub traj_output: bool,
    /// Write the impact ensemble to `impact_data_path`.
    pub impact_output: bool,
    pub trajectory_path: PathBuf,
    pub impact_data_path: PathBuf,

    /// Target aimpoint, Earth-centered Cartesian (m).
    pub x_aim: f64,
    pub y_aim: f64,
    pub z_aim: f64,

    /// Thrust steering angles (rad).
    pub theta_long: f64,
    pub theta_lat: f64,

    /// Enable gravitational (harmonic) perturbations on the true track.
    pub grav_error: bool,
    /// Enable atmospheric density/wind perturbations on the true track.
    pub atm_error: bool,
    /// Atmosphere law used for the true track.
    pub atm_law: AtmosphereLaw,
    /// Profile table path, required when `atm_law` is `Profile`.
    pub atm_profile_path: Option<PathBuf>,

    /// Enable GNSS position fixes on the estimated track.
    pub gnss_nav: bool,
    /// Enable inertial navigation on the estimated track.
    pub ins_nav: bool,
    /// Reentry maneuvering mode.
    pub rv_maneuv: ManeuverMode,

    /// Initial speed for reentry-only runs (m/s, directed inward).
    pub reentry_vel: f64,

    /// Initial condition error magnitudes (one sigma).
    pub initial_x_error: f64,
    pub initial_pos_error: f64,
    pub initial_vel_error: f64,
    pub initial_angle_error: f64,

    /// Sensor error magnitudes (one sigma).
    pub acc_scale_stability: f64,
    pub gyro_bias_stability: f64,
    pub gyro_noise: f64,
    pub gnss_noise: f64,

    /// Lift coefficient perturbation magnitude for maneuverable vehicles.
    pub cl_pert: f64,

    /// Step-anomaly drag parameters for reentry-only runs: magnitude
    /// (fractional drag increase), activation altitude (m), duration (s).
    pub step_acc_mag: f64,
    pub step_acc_hgt: f64,
    pub step_acc_dur: f64,

    /// Fixed RNG seed for reproducible ensembles. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            run_name: "run".to_string(),
            run_type: RunType::FullTrajectory,
            rv_type: RvType::Ballistic,
            num_runs: 1,
            time_step_main: 1.0,
            time_step_reentry: 0.01,
            traj_output: false,
            impact_output: false,
            trajectory_path: PathBuf::from("trajectory.txt"),
            impact_data_path: PathBuf::from("impact_data.txt"),
            x_aim: crate::constants::EARTH_RADIUS_M,
            y_aim: 0.0,
            z_aim: 0.0,
            theta_long: 0.0,
            theta_lat: 0.0,
            grav_error: false,
            atm_error: false,
            atm_law: AtmosphereLaw::Exponential,
            atm_profile_path: None,
            gnss_nav: false,
            ins_nav: false,
            rv_maneuv: ManeuverMode::Off,
            reentry_vel: 7000.0,
            initial_x_error: 0.0,
            initial_pos_error: 0.0,
            initial_vel_error: 0.0,
            initial_angle_error: 0.0,
            acc_scale_stability: 0.0,
            gyro_bias_stability: 0.0,
            gyro_noise: 0.0,
            gnss_noise: 0.0,
            cl_pert: 0.0,
            step_acc_mag: 0.0,
            step_acc_hgt: 0.0,
            step_acc_dur: 0.0,
            seed: None,
        }
    }
}

impl RunConfig {
    /// Load a configuration from a TOML file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let contents = std::fs::read_to_string(path)?;
        let config: RunConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check configuration invariants that the type system cannot express.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.num_runs > MAX_RUNS {
            return Err(SimError::EnsembleCapacity {
                requested: self.num_runs,
            });
        }
        if self.num_runs == 0 {
            return Err(SimError::InvalidConfig(
                "num_runs must be at least 1".to_string(),
            ));
        }
        if self.time_step_main <= 0.0 || self.time_step_reentry <= 0.0 {
            return Err(SimError::InvalidConfig(
                "time steps must be positive".to_string(),
            ));
        }
        if self.atm_law == AtmosphereLaw::Profile && self.atm_profile_path.is_none() {
            return Err(SimError::InvalidConfig(
                "atm_law = \"profile\" requires atm_profile_path".to_string(),
            ));
        }
        Ok(())
    }

    /// The target aimpoint as a Cartesian vector.
    pub fn aimpoint(&self) -> Vector3<f64> {
        Vector3::new(self.x_aim, self.y_aim, self.z_aim)
    }

    /// A copy of this configuration with all stochastic perturbations and
    /// file outputs disabled, for deterministic nominal flights (one run,
    /// fixed seed). Used by the aimpoint solver's objective evaluations.
    pub fn nominal(&self) -> Self {
        let mut nominal = self.clone();
        nominal.num_runs = 1;
        nominal.traj_output = false;
        nominal.impact_output = false;
        nominal.grav_error = false;
        nominal.atm_error = false;
        nominal.atm_law = AtmosphereLaw::Exponential;
        nominal.gnss_nav = false;
        nominal.ins_nav = false;
        nominal.initial_x_error = 0.0;
        nominal.initial_pos_error = 0.0;
        nominal.initial_vel_error = 0.0;
        nominal.initial_angle_error = 0.0;
        nominal.acc_scale_stability = 0.0;
        nominal.gyro_bias_stability = 0.0;
        nominal.gyro_noise = 0.0;
        nominal.gnss_noise = 0.0;
        nominal.cl_pert = 0.0;
        nominal.seed = Some(0);
        nominal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        RunConfig::default().validate().unwrap();
    }

    #[test]
    fn test_capacity_rejected() {
        let config = RunConfig {
            num_runs: MAX_RUNS + 1,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SimError::EnsembleCapacity { requested }) if requested == MAX_RUNS + 1
        ));
    }

    #[test]
    fn test_profile_law_requires_path() {
        let config = RunConfig {
            atm_law: AtmosphereLaw::Profile,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_toml_round_trip() {
        let toml_str = r#"
            run_name = "test"
            run_type = "reentry_only"
            rv_type = "maneuverable"
            num_runs = 10
            rv_maneuv = "guided"
            theta_long = 0.25
            seed = 42
        "#;
        let config: RunConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.run_type, RunType::ReentryOnly);
        assert_eq!(config.rv_type, RvType::Maneuverable);
        assert_eq!(config.rv_maneuv, ManeuverMode::Guided);
        assert_eq!(config.num_runs, 10);
        assert_eq!(config.theta_long, 0.25);
        assert_eq!(config.seed, Some(42));
        // Unlisted fields take defaults
        assert_eq!(config.time_step_main, 1.0);
    }

    #[test]
    fn test_unknown_selector_rejected_at_parse() {
        let toml_str = r#"rv_type = "glider""#;
        assert!(toml::from_str::<RunConfig>(toml_str).is_err());
    }

    #[test]
    fn test_nominal_strips_perturbations() {
        let config = RunConfig {
            atm_error: true,
            grav_error: true,
            ins_nav: true,
            initial_pos_error: 100.0,
            num_runs: 50,
            ..Default::default()
        };
        let nominal = config.nominal();
        assert!(!nominal.atm_error);
        assert!(!nominal.grav_error);
        assert!(!nominal.ins_nav);
        assert_eq!(nominal.initial_pos_error, 0.0);
        assert_eq!(nominal.num_runs, 1);
        assert_eq!(nominal.seed, Some(0));
    }
}

//! Vehicle descriptors and the thrust/mass-depletion model.
//!
//! The factory produces a three-stage ballistic booster with a
//! Minuteman-III-class mass/thrust/burn-time profile, a maneuverable variant
//! of the same booster, a bare reentry vehicle for reentry-only runs, and a
//! zero-thrust mock vehicle for tests.

use crate::config::{RunConfig, RunType, RvType};
use crate::coords;
use crate::state::VehicleState;

/// One booster stage. Thrust is constant over the stage burn; mass depletes
/// linearly at `mass_rate`.
#[derive(Debug, Clone, Copy)]
pub struct Stage {
    /// Loaded stage mass including fuel (kg)
    pub total_mass: f64,
    /// Fuel mass burned over the stage (kg)
    pub fuel_mass: f64,
    /// Stage thrust (N)
    pub thrust: f64,
    /// Stage burn duration (s)
    pub burn_time: f64,
    /// Fuel consumption rate (kg/s)
    pub mass_rate: f64,
}

impl Stage {
    fn new(total_mass: f64, fuel_mass: f64, exhaust_velocity: f64, burn_time: f64) -> Self {
        let mass_rate = fuel_mass / burn_time;
        Stage {
            total_mass,
            fuel_mass,
            thrust: exhaust_velocity * mass_rate,
            burn_time,
            mass_rate,
        }
    }
}

/// Booster stack: stages burned in order, plus boost-phase drag geometry.
#[derive(Debug, Clone)]
pub struct Booster {
    pub stages: Vec<Stage>,
    /// Total powered flight duration (s)
    pub total_burn_time: f64,
    /// Cross-sectional reference area during boost (m²)
    pub area: f64,
    /// Boost-phase drag coefficient
    pub c_d: f64,
}

/// Reentry vehicle (payload) descriptor.
#[derive(Debug, Clone, Copy)]
pub struct ReentryVehicle {
    /// Payload mass after burnout (kg)
    pub mass: f64,
    /// Ballistic coefficient m/(Cd·A) (kg/m²)
    pub beta: f64,
    /// Lift reference area (m²)
    pub area: f64,
    /// Maximum lift coefficient; zero for non-maneuverable vehicles
    pub c_l_max: f64,
    pub maneuverable: bool,
}

/// A vehicle: booster stack + reentry vehicle + the current (depleting) mass.
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub name: &'static str,
    pub booster: Booster,
    pub rv: ReentryVehicle,
    /// Total vehicle mass at the current simulation time (kg)
    pub current_mass: f64,
}

/// Minuteman-III-class stage data: (loaded mass kg, fuel kg, Isp s, burn s).
const MMIII_STAGES: [(f64, f64, f64, f64); 3] = [
    (23230.0, 20780.0, 267.0, 61.0),
    (7270.0, 6240.0, 287.0, 66.0),
    (3710.0, 3306.0, 285.0, 61.0),
];

const MMIII_PAYLOAD_KG: f64 = 900.0;
const MMIII_DIAMETER_M: f64 = 1.7;
const BOOST_CD: f64 = 0.25;
const G0: f64 = 9.8;

/// Ballistic coefficient of the ballistic RV, kg/m² (2000 lb/ft²).
const RV_BETA: f64 = 2000.0 * 3.28 * 3.28 / 2.2046;

/// Maximum lift coefficient of the maneuverable RV.
const MANEUV_CL_MAX: f64 = 0.35;

impl Vehicle {
    fn mmiii_booster() -> Booster {
        let stages: Vec<Stage> = MMIII_STAGES
            .iter()
            .map(|&(m0, fuel, isp, burn)| Stage::new(m0, fuel, isp * G0, burn))
            .collect();
        let total_burn_time = stages.iter().map(|s| s.burn_time).sum();
        Booster {
            stages,
            total_burn_time,
            area: std::f64::consts::PI * (MMIII_DIAMETER_M / 2.0).powi(2),
            c_d: BOOST_CD,
        }
    }

    /// Three-stage booster with a non-maneuvering ballistic RV.
    pub fn ballistic() -> Self {
        let booster = Self::mmiii_booster();
        let current_mass =
            booster.stages.iter().map(|s| s.total_mass).sum::<f64>() + MMIII_PAYLOAD_KG;
        Vehicle {
            name: "mmiii_ballistic",
            booster,
            rv: ReentryVehicle {
                mass: MMIII_PAYLOAD_KG,
                beta: RV_BETA,
                area: 0.25,
                c_l_max: 0.0,
                maneuverable: false,
            },
            current_mass,
        }
    }

    /// Same booster with a lifting, maneuverable RV.
    pub fn maneuverable() -> Self {
        let mut vehicle = Self::ballistic();
        vehicle.name = "mmiii_swerve";
        vehicle.rv.c_l_max = MANEUV_CL_MAX;
        vehicle.rv.maneuverable = true;
        vehicle
    }

    /// Select the vehicle for a configured run.
    pub fn for_config(config: &RunConfig) -> Self {
        match (config.run_type, config.rv_type) {
            (RunType::FullTrajectory, RvType::Ballistic) => Self::ballistic(),
            (RunType::FullTrajectory, RvType::Maneuverable) => Self::maneuverable(),
            (RunType::ReentryOnly, RvType::Ballistic) => Self::reentry_only(),
            (RunType::ReentryOnly, RvType::Maneuverable) => {
                let mut vehicle = Self::reentry_only();
                vehicle.rv.c_l_max = MANEUV_CL_MAX;
                vehicle.rv.maneuverable = true;
                vehicle
            }
        }
    }

    /// Bare RV with no booster, for reentry-only runs.
    pub fn reentry_only() -> Self {
        let rv = ReentryVehicle {
            mass: MMIII_PAYLOAD_KG,
            beta: RV_BETA,
            area: 0.25,
            c_l_max: 0.0,
            maneuverable: false,
        };
        Vehicle {
            name: "reentry_only",
            booster: Booster {
                stages: Vec::new(),
                total_burn_time: 0.0,
                area: 0.0,
                c_d: 0.0,
            },
            rv,
            current_mass: rv.mass,
        }
    }

    /// Zero-thrust, drag-free vehicle for tests.
    pub fn mock() -> Self {
        let rv = ReentryVehicle {
            mass: 1.0,
            beta: 1e12,
            area: 0.0,
            c_l_max: 0.0,
            maneuverable: false,
        };
        Vehicle {
            name: "mock",
            booster: Booster {
                stages: Vec::new(),
                total_burn_time: 0.0,
                area: 0.0,
                c_d: 0.0,
            },
            rv,
            current_mass: rv.mass,
        }
    }

    /// The stage burning at time `t`, with the burn time already elapsed in
    /// earlier stages. `None` after burnout.
    fn active_stage(&self, t: f64) -> Option<&Stage> {
        let mut elapsed = 0.0;
        for stage in &self.booster.stages {
            if t < elapsed + stage.burn_time {
                return Some(stage);
            }
            elapsed += stage.burn_time;
        }
        None
    }

    /// Update the state's thrust acceleration components in place. Thrust
    /// acts along the state's steering angles during powered flight and is
    /// zero after burnout.
    pub fn update_thrust(&self, state: &mut VehicleState) {
        state.a_thrust = match self.active_stage(state.t) {
            Some(stage) => {
                let magnitude = stage.thrust / self.current_mass;
                coords::spher_vec_to_cart(magnitude, state.theta_long, state.theta_lat)
            }
            None => nalgebra::Vector3::zeros(),
        };
    }

    /// Update the current mass for time `t`: linear fuel depletion within the
    /// active stage, spent stages jettisoned at their burnout instants, RV
    /// payload mass after total burnout.
    pub fn update_mass(&mut self, t: f64) {
        let mut elapsed = 0.0;
        let mut mass =
            self.booster.stages.iter().map(|s| s.total_mass).sum::<f64>() + self.rv.mass;
        for stage in &self.booster.stages {
            if t < elapsed + stage.burn_time {
                mass -= stage.mass_rate * (t - elapsed);
                self.current_mass = mass;
                return;
            }
            // stage exhausted and jettisoned
            mass -= stage.total_mass;
            elapsed += stage.burn_time;
        }
        self.current_mass = self.rv.mass;
    }
}

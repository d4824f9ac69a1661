//! Flight driver: one complete trajectory from launch (or reentry start) to
//! ground impact.
//!
//! Three vehicle state tracks advance in lock-step: the true track feels the
//! perturbed environment, the estimated track is the navigation system's
//! belief (idealized gravity and atmosphere, corrupted by sensor models),
//! and the desired track is guidance's unperturbed target. Impact is
//! detected on the true track and all three are interpolated back to the
//! surface-crossing instant.

use std::f64::consts::PI;
use std::fs::File;
use std::path::Path;

use log::warn;
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::Rng;

use crate::atmosphere::{AtmosphereModel, AtmosphereProfile};
use crate::config::{AtmosphereLaw, ManeuverMode, RunConfig, RunType};
use crate::constants::{
    EARTH_SURFACE_ROT_SPEED, EXO_ALTITUDE_M, IMU_COAST_DRAG_THRESHOLD, MAX_STEPS,
};
use crate::error::SimError;
use crate::gravity::GravityModel;
use crate::guidance;
use crate::integrator;
use crate::physics;
use crate::sensors::{Gnss, Imu};
use crate::state::{self, VehicleState};
use crate::vehicle::Vehicle;

/// Number of empirical atmosphere profiles in a profile table; one index is
/// drawn uniformly per flight.
const PROFILE_COUNT: u32 = 100;

/// Run one flight from the configured initial conditions, returning the
/// true impact state.
pub fn fly(
    config: &RunConfig,
    vehicle: &mut Vehicle,
    rng: &mut StdRng,
) -> Result<VehicleState, SimError> {
    let true_state = state::init_true_state(config, rng);
    let est_state = state::init_est_state(config);
    fly_from(config, vehicle, true_state, est_state, rng)
}

/// Run one flight from explicit initial true/estimated states. The desired
/// track starts as a copy of the estimated one.
pub fn fly_from(
    config: &RunConfig,
    vehicle: &mut Vehicle,
    mut true_state: VehicleState,
    mut est_state: VehicleState,
    rng: &mut StdRng,
) -> Result<VehicleState, SimError> {
    let mut des_state = est_state;

    let mut atmosphere = AtmosphereModel::initialize(config, rng);
    if config.atm_law == AtmosphereLaw::Profile {
        let path = config.atm_profile_path.as_ref().ok_or_else(|| {
            SimError::InvalidConfig("profile atmosphere law requires a profile path".to_string())
        })?;
        // one empirical profile drawn per flight, so the ensemble samples
        // profile-to-profile variability
        let profile_index = rng.gen_range(0..PROFILE_COUNT);
        atmosphere =
            atmosphere.with_profile(AtmosphereProfile::parse_profile(path, profile_index)?);
    }

    let true_gravity = GravityModel::initialize(config);
    let mut est_gravity = GravityModel::initialize(config);
    est_gravity.disable_perturbations();

    let mut imu = Imu::initialize(config, rng);
    let gnss = Gnss::initialize(config);

    let mut writer = if config.traj_output {
        Some(TrajectoryWriter::create(&config.trajectory_path)?)
    } else {
        None
    };

    let burn_time = vehicle.booster.total_burn_time;
    let guided = config.rv_maneuv == ManeuverMode::Guided && vehicle.rv.maneuverable;
    let aim = config.aimpoint();
    // elapsed time inside the step-anomaly altitude window
    let mut step_timer = 0.0;

    if let Some(writer) = &mut writer {
        // initial-state row, before any step
        writer.write_row(vehicle.current_mass, &true_state, &est_state, 0.0)?;
    }

    for _ in 0..MAX_STEPS {
        let true_sample = atmosphere.sample(true_state.altitude());
        // the navigation model always assumes the smooth exponential law
        let est_sample = atmosphere.sample_exponential(est_state.altitude());

        let dt = if true_state.t < burn_time || true_state.altitude() > EXO_ALTITUDE_M {
            config.time_step_main
        } else {
            config.time_step_reentry
        };

        vehicle.update_thrust(&mut true_state);
        vehicle.update_thrust(&mut est_state);
        vehicle.update_thrust(&mut des_state);

        true_gravity.update(&mut true_state);
        est_gravity.update(&mut est_state);
        // the desired track flies through the same (possibly perturbed)
        // field as the true one; only navigation assumes the ideal field
        true_gravity.update(&mut des_state);

        physics::update_drag(config, vehicle, &true_sample, &mut true_state, &step_timer);
        physics::update_drag(config, vehicle, &est_sample, &mut est_state, &step_timer);
        physics::update_drag(config, vehicle, &est_sample, &mut des_state, &step_timer);

        let mut command = Vector3::zeros();
        if guided && true_state.t >= burn_time && true_state.altitude() < EXO_ALTITUDE_M {
            command = guidance::prop_nav(&est_state, &aim);
            physics::update_lift(config, &mut true_state, &command, &true_sample, vehicle, dt);
            physics::update_lift(config, &mut est_state, &command, &est_sample, vehicle, dt);
        }

        true_state.sum_accelerations();
        est_state.sum_accelerations();
        des_state.sum_accelerations();

        if config.ins_nav {
            imu.measure(&true_state, &mut est_state);
            if !imu_error_growth_suspended(config, &true_state, burn_time) {
                imu.update(dt, rng);
            }
        }
        if config.gnss_nav {
            gnss.measure(&true_state, &mut est_state, rng);
        }

        // idealized mid-course correction at the exact burnout instant
        if config.run_type == RunType::FullTrajectory && true_state.t == burn_time {
            guidance::perfect_maneuv(&mut true_state, &est_state, &des_state);
            imu.zero_gyro_errors();
        }

        let pre_true = true_state;
        let pre_est = est_state;
        let pre_des = des_state;

        integrator::rk4_step(&mut true_state, dt);
        integrator::rk4_step(&mut est_state, dt);
        integrator::rk4_step(&mut des_state, dt);
        vehicle.update_mass(true_state.t);

        if config.run_type == RunType::ReentryOnly
            && true_state.altitude() < config.step_acc_hgt
        {
            step_timer += dt;
        }

        if true_state.altitude() < 0.0 {
            let mut impact = impact_interpolate(&pre_true, &true_state);
            let est_impact = impact_interpolate(&pre_est, &est_state);
            let _des_impact = impact_interpolate(&pre_des, &des_state);

            apply_coriolis(&mut impact, &est_impact, rng);

            if config.rv_maneuv == ManeuverMode::Perfect {
                // residual miss of a perfectly maneuvering vehicle is
                // exactly the navigation error
                impact.pos -= est_impact.pos;
            }

            if let Some(writer) = &mut writer {
                writer.write_row(vehicle.current_mass, &impact, &est_impact, command.norm())?;
                writer.flush()?;
            }
            return Ok(impact);
        }

        if let Some(writer) = &mut writer {
            writer.write_row(vehicle.current_mass, &true_state, &est_state, command.norm())?;
        }
    }

    warn!(
        "flight exceeded {} steps without impact (t = {:.1} s, altitude = {:.0} m); returning last state",
        MAX_STEPS,
        true_state.t,
        true_state.altitude()
    );
    Ok(true_state)
}

/// IMU error growth is suspended while a maneuvering reentry vehicle coasts
/// after burnout with negligible drag. Any maneuvering mode qualifies, not
/// just active guidance.
fn imu_error_growth_suspended(
    config: &RunConfig,
    true_state: &VehicleState,
    burn_time: f64,
) -> bool {
    config.rv_maneuv != ManeuverMode::Off
        && true_state.t >= burn_time
        && true_state.a_drag.norm() < IMU_COAST_DRAG_THRESHOLD
}

/// Linearly blend every scalar field of the last pre-impact and first
/// post-impact samples to the surface-crossing instant. The blend factor is
/// the fraction of the step at which this track's altitude reaches zero.
pub fn impact_interpolate(pre: &VehicleState, post: &VehicleState) -> VehicleState {
    let alt_0 = pre.altitude();
    let alt_1 = post.altitude();
    let factor = alt_0 / (alt_0 - alt_1);

    let blend_v = |a: &Vector3<f64>, b: &Vector3<f64>| a + (b - a) * factor;
    VehicleState {
        t: pre.t + (post.t - pre.t) * factor,
        pos: blend_v(&pre.pos, &post.pos),
        vel: blend_v(&pre.vel, &post.vel),
        theta_long: pre.theta_long,
        theta_lat: pre.theta_lat,
        initial_theta_long_pert: pre.initial_theta_long_pert,
        initial_theta_lat_pert: pre.initial_theta_lat_pert,
        a_grav: blend_v(&pre.a_grav, &post.a_grav),
        a_drag: blend_v(&pre.a_drag, &post.a_drag),
        a_lift: blend_v(&pre.a_lift, &post.a_lift),
        a_thrust: blend_v(&pre.a_thrust, &post.a_thrust),
        a_total: blend_v(&pre.a_total, &post.a_total),
    }
}

/// Coriolis dispersion at impact: the Earth surface rotation acting over the
/// true-vs-estimated time-of-impact error, evaluated at a freshly drawn
/// random geographic point. The random point intentionally decouples the
/// dispersion statistics from the exact launch/impact geometry.
fn apply_coriolis(impact: &mut VehicleState, est_impact: &VehicleState, rng: &mut StdRng) {
    let lat = rng.gen_range(-PI / 2.0..PI / 2.0);
    let lon = rng.gen_range(-PI..PI);
    let time_error = impact.t - est_impact.t;
    let deflection = EARTH_SURFACE_ROT_SPEED * lat.cos() * time_error;

    impact.pos.x -= deflection * lon.sin() * lat.cos();
    impact.pos.y += deflection * lon.cos() * lat.cos();
    impact.pos.z += deflection * lat.sin();
}

const TRAJECTORY_HEADER: [&str; 31] = [
    "t",
    "mass",
    "x",
    "y",
    "z",
    "vx",
    "vy",
    "vz",
    "ax_grav",
    "ay_grav",
    "az_grav",
    "ax_drag",
    "ay_drag",
    "az_drag",
    "ax_thrust",
    "ay_thrust",
    "az_thrust",
    "ax_total",
    "ay_total",
    "az_total",
    "x_est",
    "y_est",
    "z_est",
    "vx_est",
    "vy_est",
    "vz_est",
    "ax_total_est",
    "ay_total_est",
    "az_total_est",
    "a_command_mag",
    "a_lift_mag",
];

/// Per-step trajectory diagnostic sink: one comma-separated row per step.
pub struct TrajectoryWriter {
    writer: csv::Writer<File>,
}

impl TrajectoryWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let mut writer = csv::Writer::from_writer(File::create(path)?);
        writer.write_record(TRAJECTORY_HEADER)?;
        Ok(TrajectoryWriter { writer })
    }

    pub fn write_row(
        &mut self,
        mass: f64,
        true_state: &VehicleState,
        est_state: &VehicleState,
        command_mag: f64,
    ) -> Result<(), SimError> {
        let fields = [
            true_state.t,
            mass,
            true_state.pos.x,
            true_state.pos.y,
            true_state.pos.z,
            true_state.vel.x,
            true_state.vel.y,
            true_state.vel.z,
            true_state.a_grav.x,
            true_state.a_grav.y,
            true_state.a_grav.z,
            true_state.a_drag.x,
            true_state.a_drag.y,
            true_state.a_drag.z,
            true_state.a_thrust.x,
            true_state.a_thrust.y,
            true_state.a_thrust.z,
            true_state.a_total.x,
            true_state.a_total.y,
            true_state.a_total.z,
            est_state.pos.x,
            est_state.pos.y,
            est_state.pos.z,
            est_state.vel.x,
            est_state.vel.y,
            est_state.vel.z,
            est_state.a_total.x,
            est_state.a_total.y,
            est_state.a_total.z,
            command_mag,
            true_state.a_lift.norm(),
        ];
        let record: Vec<String> = fields.iter().map(|v| v.to_string()).collect();
        self.writer.write_record(&record)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), SimError> {
        self.writer.flush()?;
        Ok(())
    }
}

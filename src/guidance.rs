//! Terminal guidance for maneuvering reentry vehicles.
//!
//! Proportional navigation produces a lateral acceleration command from the
//! estimated state and the aimpoint; the flight driver hands the command to
//! the lift model. Perfect maneuvering bypasses aerodynamics entirely and
//! nulls the residual navigation error at impact.

use nalgebra::Vector3;

use crate::state::VehicleState;

/// Proportional navigation gain.
const PN_GAIN: f64 = 3.0;

/// Proportional-navigation acceleration command toward `aim`.
///
/// The command is proportional to the rotation rate of the line of sight,
/// `a = N * (omega x v)`, with the line-of-sight rate derived from the
/// estimated relative position and velocity.
pub fn prop_nav(est_state: &VehicleState, aim: &Vector3<f64>) -> Vector3<f64> {
    let r = aim - est_state.pos;
    let r2 = r.norm_squared();
    if r2 == 0.0 {
        return Vector3::zeros();
    }
    let omega = r.cross(&est_state.vel) / r2;
    omega.cross(&est_state.vel) * PN_GAIN
}

/// Idealized terminal maneuver: shift the true state by the full remaining
/// deviation of the desired track from the estimated track. With exact
/// navigation this places the true impact on the desired one; with
/// navigation error the residual miss is exactly the navigation error.
pub fn perfect_maneuv(
    true_state: &mut VehicleState,
    est_state: &VehicleState,
    des_state: &VehicleState,
) {
    true_state.pos += des_state.pos - est_state.pos;
    true_state.vel += des_state.vel - est_state.vel;
}

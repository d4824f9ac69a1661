//! Acceleration-frozen 4th-order Runge-Kutta step.
//!
//! Only position and velocity are integrated; the state's total acceleration
//! is held constant over the step. Force collaborators recompute the
//! accelerations once per step before this runs, so the step reduces to an
//! explicit four-stage update on the position/velocity pair.

use crate::state::VehicleState;

/// Advance a state by `dt` with its accelerations frozen.
pub fn rk4_step(state: &mut VehicleState, dt: f64) {
    let a = state.a_total;

    let k1v = a;
    let k1x = state.vel;

    let k2v = a;
    let k2x = state.vel + k1v * (dt / 2.0);

    let k3v = a;
    let k3x = state.vel + k2v * (dt / 2.0);

    let k4v = a;
    let k4x = state.vel + k3v * dt;

    state.pos += (k1x + k2x * 2.0 + k3x * 2.0 + k4x) * (dt / 6.0);
    state.vel += (k1v + k2v * 2.0 + k3v * 2.0 + k4v) * (dt / 6.0);
    state.t += dt;
}

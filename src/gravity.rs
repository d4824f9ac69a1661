//! Gravity model: central inverse-square field with an optional J2 zonal
//! harmonic perturbation.
//!
//! The estimated (navigation) track always flies an idealized point-mass
//! field; its model has perturbations forcibly disabled by the flight
//! driver.

use nalgebra::Vector3;

use crate::config::RunConfig;
use crate::constants::{EARTH_J2, EARTH_MU, EARTH_RADIUS_M};
use crate::state::VehicleState;

#[derive(Debug, Clone)]
pub struct GravityModel {
    pub mu: f64,
    pub earth_radius: f64,
    perturbed: bool,
}

impl GravityModel {
    pub fn initialize(config: &RunConfig) -> Self {
        GravityModel {
            mu: EARTH_MU,
            earth_radius: EARTH_RADIUS_M,
            perturbed: config.grav_error,
        }
    }

    /// Force the idealized point-mass field, regardless of configuration.
    pub fn disable_perturbations(&mut self) {
        self.perturbed = false;
    }

    /// Update the state's gravity acceleration components in place.
    pub fn update(&self, state: &mut VehicleState) {
        let r = state.pos.norm();
        let r2 = r * r;
        state.a_grav = state.pos * (-self.mu / (r2 * r));

        if self.perturbed {
            // J2 oblateness term
            let z2_over_r2 = (state.pos.z * state.pos.z) / r2;
            let k = -1.5 * EARTH_J2 * self.mu * self.earth_radius * self.earth_radius
                / (r2 * r2 * r);
            state.a_grav += Vector3::new(
                k * state.pos.x * (1.0 - 5.0 * z2_over_r2),
                k * state.pos.y * (1.0 - 5.0 * z2_over_r2),
                k * state.pos.z * (3.0 - 5.0 * z2_over_r2),
            );
        }
    }
}

//! # Reentry Engine
//!
//! Monte Carlo flight simulator for ballistic and maneuverable reentry
//! vehicles: stochastic atmosphere/gravity/sensor perturbations, three-track
//! (true/estimated/desired) trajectory propagation, impact dispersion
//! ensembles, and a two-stage aimpoint solver.

// Re-export the main types and functions
pub use aimpoint::{update_aimpoint, AimpointSolution};
pub use atmosphere::{AtmosphereModel, AtmosphereProfile, AtmosphereSample};
pub use config::{AtmosphereLaw, ManeuverMode, RunConfig, RunType, RvType};
pub use error::SimError;
pub use flight::{fly, fly_from, impact_interpolate};
pub use monte_carlo::{circular_error_probable, mc_run, ImpactEnsemble};
pub use state::VehicleState;
pub use vehicle::Vehicle;

// Module declarations
pub mod aimpoint;
pub mod atmosphere;
pub mod config;
pub mod constants;
pub mod coords;
mod error;
pub mod flight;
pub mod gravity;
pub mod guidance;
pub mod integrator;
pub mod monte_carlo;
pub mod optimize;
pub mod physics;
pub mod sensors;
pub mod state;
pub mod vehicle;

//! Physical constants and fixed limits used throughout the engine.

/// Mean Earth radius (m)
pub const EARTH_RADIUS_M: f64 = 6371e3;

/// Earth gravitational parameter GM (m³/s²)
pub const EARTH_MU: f64 = 3.986004418e14;

/// J2 zonal harmonic coefficient (dimensionless)
pub const EARTH_J2: f64 = 1.08263e-3;

/// Earth surface rotation speed at the equator (m/s)
///
/// Used by the impact Coriolis correction: the effective speed at a given
/// latitude is `EARTH_SURFACE_ROT_SPEED * cos(lat)`.
pub const EARTH_SURFACE_ROT_SPEED: f64 = 464.0;

/// Atmospheric scale height (m)
pub const SCALE_HEIGHT_M: f64 = 8000.0;

/// Sea level air density (kg/m³)
pub const SEA_LEVEL_DENSITY: f64 = 1.225;

/// Altitude band edges for the perturbed atmosphere model (m).
///
/// Bands are half-open and tested in ascending order: [0, 5 km),
/// [5 km, 50 km), [50 km, 100 km), [100 km, inf). An altitude exactly on an
/// edge belongs to the upper band.
pub const ATM_BAND_EDGES_M: [f64; 3] = [5_000.0, 50_000.0, 100_000.0];

/// Altitude above which the coarse (exo-atmospheric) time step is used (m)
pub const EXO_ALTITUDE_M: f64 = 1e6;

/// Upper limit on the number of Monte Carlo runs per ensemble
pub const MAX_RUNS: usize = 1000;

/// Upper limit on integration steps in a single flight
pub const MAX_STEPS: usize = 1_000_000;

/// Airspeed below which aerodynamic forces are treated as zero (m/s)
pub const MIN_SPEED_THRESHOLD: f64 = 1e-9;

/// Drag magnitude below which IMU error growth is suspended during a
/// maneuvering-reentry coast phase (m/s²)
pub const IMU_COAST_DRAG_THRESHOLD: f64 = 1e-3;

/// General numerical tolerance for floating point comparisons
pub const NUMERICAL_TOLERANCE: f64 = 1e-9;

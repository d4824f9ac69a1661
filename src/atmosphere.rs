//! Atmospheric density and wind models.
//!
//! Two laws share a single `sample` contract: a smooth exponential decay
//! (always used by the estimated track), and a perturbed variant whose
//! altitude-banded standard deviations emulate empirical atmosphere
//! statistics. Perturbations are "frozen turbulence": one Gaussian draw per
//! band and channel at model construction, held constant for the life of a
//! flight. An empirical profile table can replace the analytic density law
//! entirely.

use std::fs::File;
use std::path::Path;

use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::config::RunConfig;
use crate::constants::{ATM_BAND_EDGES_M, SCALE_HEIGHT_M, SEA_LEVEL_DENSITY};
use crate::error::SimError;

/// Per-band density standard deviations (fractional), from empirical
/// atmosphere statistics.
const STD_DENSITIES: [f64; 4] = [0.00009, 0.00001, 0.00262, 0.00662];

/// Per-band horizontal wind standard deviations (m/s), shared by the
/// meridional and zonal channels.
const STD_WINDS: [f64; 4] = [0.223, 0.098, 1.13, 2.23];

/// Per-band vertical wind standard deviations (m/s).
const STD_VERT_WINDS: [f64; 4] = [0.058, 0.016, 0.070, 0.244];

/// Local atmospheric conditions at one queried altitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtmosphereSample {
    /// Query altitude, clamped to >= 0 (m)
    pub altitude: f64,
    /// Air density (kg/m³)
    pub density: f64,
    /// Northward wind (m/s)
    pub meridional_wind: f64,
    /// Eastward wind (m/s)
    pub zonal_wind: f64,
    /// Upward wind (m/s)
    pub vertical_wind: f64,
}

/// Atmosphere model owned by a single flight.
#[derive(Debug, Clone)]
pub struct AtmosphereModel {
    pub scale_height: f64,
    pub sea_level_density: f64,

    std_densities: [f64; 4],
    std_winds: [f64; 4],
    std_vert_winds: [f64; 4],

    pert_densities: [f64; 4],
    pert_zonal_winds: [f64; 4],
    pert_meridional_winds: [f64; 4],
    pert_vert_winds: [f64; 4],

    perturbed: bool,
    profile: Option<AtmosphereProfile>,
}

impl AtmosphereModel {
    /// Build the atmosphere model for one flight. When atmospheric
    /// perturbations are enabled, one Gaussian draw per band and channel is
    /// sampled here and frozen for the model's lifetime.
    pub fn initialize(config: &RunConfig, rng: &mut StdRng) -> Self {
        let mut model = AtmosphereModel {
            scale_height: SCALE_HEIGHT_M,
            sea_level_density: SEA_LEVEL_DENSITY,
            std_densities: [0.0; 4],
            std_winds: [0.0; 4],
            std_vert_winds: [0.0; 4],
            pert_densities: [0.0; 4],
            pert_zonal_winds: [0.0; 4],
            pert_meridional_winds: [0.0; 4],
            pert_vert_winds: [0.0; 4],
            perturbed: config.atm_error,
            profile: None,
        };

        if config.atm_error {
            model.std_densities = STD_DENSITIES;
            model.std_winds = STD_WINDS;
            model.std_vert_winds = STD_VERT_WINDS;

            for i in 0..4 {
                let d: f64 = rng.sample(StandardNormal);
                model.pert_densities[i] = model.std_densities[i] * d;
                let zw: f64 = rng.sample(StandardNormal);
                model.pert_zonal_winds[i] = model.std_winds[i] * zw;
                let mw: f64 = rng.sample(StandardNormal);
                model.pert_meridional_winds[i] = model.std_winds[i] * mw;
                let vw: f64 = rng.sample(StandardNormal);
                model.pert_vert_winds[i] = model.std_vert_winds[i] * vw;
            }
        }

        model
    }

    /// Attach an empirical profile table, replacing the analytic density law
    /// for perturbed sampling.
    pub fn with_profile(mut self, profile: AtmosphereProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Sample the active law: exponential when perturbations are disabled,
    /// otherwise the perturbed (or profile-backed) law.
    pub fn sample(&self, altitude: f64) -> AtmosphereSample {
        if self.perturbed {
            self.sample_perturbed(altitude)
        } else {
            self.sample_exponential(altitude)
        }
    }

    /// The smooth exponential law: pure density decay, zero wind. This is
    /// what the estimated (navigation) track always assumes.
    pub fn sample_exponential(&self, altitude: f64) -> AtmosphereSample {
        let altitude = altitude.max(0.0);
        AtmosphereSample {
            altitude,
            density: self.sea_level_density * (-altitude / self.scale_height).exp(),
            meridional_wind: 0.0,
            zonal_wind: 0.0,
            vertical_wind: 0.0,
        }
    }

    /// The perturbed law: banded frozen perturbations scale density
    /// multiplicatively and set the winds directly.
    fn sample_perturbed(&self, altitude: f64) -> AtmosphereSample {
        let altitude = altitude.max(0.0);
        let band = Self::band(altitude);

        let base_density = match &self.profile {
            Some(profile) => profile.density_at(altitude),
            None => self.sea_level_density * (-altitude / self.scale_height).exp(),
        };
        let density = base_density * (1.0 + self.pert_densities[band]);

        let (mut meridional, mut zonal, mut vertical) = (
            self.pert_meridional_winds[band],
            self.pert_zonal_winds[band],
            self.pert_vert_winds[band],
        );
        if let Some(profile) = &self.profile {
            let (m, z, v) = profile.winds_at(altitude);
            meridional += m;
            zonal += z;
            vertical += v;
        }

        AtmosphereSample {
            altitude,
            density,
            meridional_wind: meridional,
            zonal_wind: zonal,
            vertical_wind: vertical,
        }
    }

    /// Band index for an altitude. Edges are tested in ascending order with
    /// strict `<`, so an altitude exactly on an edge belongs to the upper
    /// band. This ordering is load-bearing for reproducibility.
    fn band(altitude: f64) -> usize {
        if altitude < ATM_BAND_EDGES_M[0] {
            0
        } else if altitude < ATM_BAND_EDGES_M[1] {
            1
        } else if altitude < ATM_BAND_EDGES_M[2] {
            2
        } else {
            3
        }
    }

    #[cfg(test)]
    fn density_perturbations(&self) -> &[f64; 4] {
        &self.pert_densities
    }
}

/// Altitude-indexed empirical atmosphere table: `(altitude, density, winds)`
/// rows for one profile, linearly interpolated between rows.
#[derive(Debug, Clone)]
pub struct AtmosphereProfile {
    altitudes: Vec<f64>,
    densities: Vec<f64>,
    meridional_winds: Vec<f64>,
    zonal_winds: Vec<f64>,
    vertical_winds: Vec<f64>,
}

impl AtmosphereProfile {
    /// Parse one profile out of a multi-profile CSV table.
    ///
    /// Expected columns: `profile, altitude_m, density, meridional_wind,
    /// zonal_wind, vertical_wind`; rows whose first column equals `index`
    /// form the profile, and must be sorted by altitude.
    pub fn parse_profile<P: AsRef<Path>>(path: P, index: u32) -> Result<Self, SimError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(file);

        let mut profile = AtmosphereProfile {
            altitudes: Vec::new(),
            densities: Vec::new(),
            meridional_winds: Vec::new(),
            zonal_winds: Vec::new(),
            vertical_winds: Vec::new(),
        };

        for record in reader.records() {
            let record = record?;
            let parse = |i: usize| -> Result<f64, SimError> {
                record
                    .get(i)
                    .and_then(|field| field.parse::<f64>().ok())
                    .ok_or_else(|| SimError::Profile {
                        path: path.to_path_buf(),
                        reason: format!("bad field {i} in row {:?}", record.position()),
                    })
            };
            if parse(0)? as u32 != index {
                continue;
            }
            profile.altitudes.push(parse(1)?);
            profile.densities.push(parse(2)?);
            profile.meridional_winds.push(parse(3)?);
            profile.zonal_winds.push(parse(4)?);
            profile.vertical_winds.push(parse(5)?);
        }

        if profile.altitudes.len() < 2 {
            return Err(SimError::Profile {
                path: path.to_path_buf(),
                reason: format!("profile {index} has fewer than 2 rows"),
            });
        }
        Ok(profile)
    }

    /// Density at an altitude by linear interpolation, clamped to the table
    /// ends.
    pub fn density_at(&self, altitude: f64) -> f64 {
        self.interpolate(&self.densities, altitude)
    }

    /// Winds `(meridional, zonal, vertical)` at an altitude.
    pub fn winds_at(&self, altitude: f64) -> (f64, f64, f64) {
        (
            self.interpolate(&self.meridional_winds, altitude),
            self.interpolate(&self.zonal_winds, altitude),
            self.interpolate(&self.vertical_winds, altitude),
        )
    }

    fn interpolate(&self, values: &[f64], altitude: f64) -> f64 {
        let n = self.altitudes.len();
        if altitude <= self.altitudes[0] {
            return values[0];
        }
        if altitude >= self.altitudes[n - 1] {
            return values[n - 1];
        }
        let upper = self
            .altitudes
            .partition_point(|&a| a <= altitude)
            .min(n - 1);
        let lower = upper - 1;
        let span = self.altitudes[upper] - self.altitudes[lower];
        let weight = (altitude - self.altitudes[lower]) / span;
        values[lower] * (1.0 - weight) + values[upper] * weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use std::io::Write;

    fn unperturbed_model() -> AtmosphereModel {
        let config = RunConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        AtmosphereModel::initialize(&config, &mut rng)
    }

    fn perturbed_model(seed: u64) -> AtmosphereModel {
        let config = RunConfig {
            atm_error: true,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(seed);
        AtmosphereModel::initialize(&config, &mut rng)
    }

    #[test]
    fn test_sea_level_density() {
        let model = unperturbed_model();
        let sample = model.sample(0.0);
        assert_relative_eq!(sample.density, SEA_LEVEL_DENSITY, epsilon = 1e-12);
    }

    #[test]
    fn test_density_strictly_decreasing_unperturbed() {
        let model = unperturbed_model();
        let mut previous = f64::INFINITY;
        for altitude in (0..200).map(|i| i as f64 * 1000.0) {
            let sample = model.sample(altitude);
            assert!(sample.density < previous);
            assert_eq!(sample.meridional_wind, 0.0);
            assert_eq!(sample.zonal_wind, 0.0);
            assert_eq!(sample.vertical_wind, 0.0);
            previous = sample.density;
        }
    }

    #[test]
    fn test_negative_altitude_clamped() {
        let model = perturbed_model(3);
        assert_eq!(model.sample(-1000.0), model.sample(0.0));
    }

    #[test]
    fn test_perturbations_nonzero_and_distinct_from_sigma() {
        let model = perturbed_model(5);
        for (i, pert) in model.density_perturbations().iter().enumerate() {
            assert!(*pert != 0.0);
            assert!((pert.abs() - STD_DENSITIES[i]).abs() > 1e-12);
        }
    }

    #[test]
    fn test_perturbations_frozen_across_queries() {
        let model = perturbed_model(9);
        let first = model.sample(10_000.0);
        let second = model.sample(10_000.0);
        assert_eq!(first, second);
    }

    #[test]
    fn test_band_boundaries_belong_to_upper_band() {
        // 5,000 m must pick band 1's perturbation, not band 0's.
        let model = perturbed_model(13);
        let below = model.sample(4_999.999);
        let on_edge = model.sample(5_000.0);
        assert!(below.zonal_wind != on_edge.zonal_wind);

        assert_eq!(AtmosphereModel::band(5_000.0), 1);
        assert_eq!(AtmosphereModel::band(50_000.0), 2);
        assert_eq!(AtmosphereModel::band(100_000.0), 3);
    }

    #[test]
    fn test_perturbed_density_scales_exponential() {
        let model = perturbed_model(17);
        let exponential = model.sample_exponential(20_000.0);
        let perturbed = model.sample(20_000.0);
        let ratio = perturbed.density / exponential.density;
        assert_relative_eq!(
            ratio,
            1.0 + model.density_perturbations()[1],
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_profile_interpolation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "profile,altitude_m,density,meridional_wind,zonal_wind,vertical_wind").unwrap();
        writeln!(file, "0,0.0,1.2,1.0,2.0,0.1").unwrap();
        writeln!(file, "0,10000.0,0.4,3.0,4.0,0.2").unwrap();
        writeln!(file, "1,0.0,9.9,0.0,0.0,0.0").unwrap();
        writeln!(file, "1,10000.0,9.9,0.0,0.0,0.0").unwrap();
        file.flush().unwrap();

        let profile = AtmosphereProfile::parse_profile(file.path(), 0).unwrap();
        assert_relative_eq!(profile.density_at(5_000.0), 0.8, epsilon = 1e-12);
        assert_relative_eq!(profile.density_at(-50.0), 1.2, epsilon = 1e-12);
        assert_relative_eq!(profile.density_at(99_000.0), 0.4, epsilon = 1e-12);
        let (m, z, _) = profile.winds_at(5_000.0);
        assert_relative_eq!(m, 2.0, epsilon = 1e-12);
        assert_relative_eq!(z, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_profile_too_short_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "profile,altitude_m,density,meridional_wind,zonal_wind,vertical_wind").unwrap();
        writeln!(file, "0,0.0,1.2,0.0,0.0,0.0").unwrap();
        file.flush().unwrap();
        assert!(AtmosphereProfile::parse_profile(file.path(), 0).is_err());
    }
}

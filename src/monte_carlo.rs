//! Monte Carlo ensemble driver: N independent flights, one impact state
//! each, collected into a bounded ensemble and optionally persisted.

use std::fs::File;
use std::path::Path;

use log::info;
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::RunConfig;
use crate::constants::MAX_RUNS;
use crate::error::SimError;
use crate::flight;
use crate::state::VehicleState;
use crate::vehicle::Vehicle;

const IMPACT_HEADER: [&str; 7] = ["t", "x", "y", "z", "vx", "vy", "vz"];

/// Bounded, append-only collection of impact states, one per Monte Carlo
/// iteration.
#[derive(Debug, Clone, Default)]
pub struct ImpactEnsemble {
    states: Vec<VehicleState>,
}

impl ImpactEnsemble {
    pub fn new() -> Self {
        ImpactEnsemble {
            states: Vec::with_capacity(MAX_RUNS),
        }
    }

    pub fn push(&mut self, state: VehicleState) -> Result<(), SimError> {
        if self.states.len() >= MAX_RUNS {
            return Err(SimError::EnsembleCapacity {
                requested: self.states.len() + 1,
            });
        }
        self.states.push(state);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> &[VehicleState] {
        &self.states
    }

    /// Serialize the ensemble as comma-separated impact rows.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), SimError> {
        let mut writer = csv::Writer::from_writer(File::create(path)?);
        writer.write_record(IMPACT_HEADER)?;
        for state in &self.states {
            let fields = [
                state.t,
                state.pos.x,
                state.pos.y,
                state.pos.z,
                state.vel.x,
                state.vel.y,
                state.vel.z,
            ];
            let record: Vec<String> = fields.iter().map(|v| v.to_string()).collect();
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Run the configured Monte Carlo ensemble: N sequential flights, each with
/// a fresh vehicle and fresh random draws. The trajectory diagnostic request
/// is honored only for the first iteration so later flights do not overwrite
/// the file.
pub fn mc_run(config: &RunConfig) -> Result<ImpactEnsemble, SimError> {
    config.validate()?;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut ensemble = ImpactEnsemble::new();
    for run in 0..config.num_runs {
        let mut run_config = config.clone();
        run_config.traj_output = config.traj_output && run == 0;

        let mut vehicle = Vehicle::for_config(config);
        let impact = flight::fly(&run_config, &mut vehicle, &mut rng)?;
        ensemble.push(impact)?;
    }

    info!(
        "{}: {} flights complete, CEP = {:.1} m",
        config.run_name,
        ensemble.len(),
        circular_error_probable(&ensemble)
    );

    if config.impact_output {
        ensemble.write_csv(&config.impact_data_path)?;
    }
    Ok(ensemble)
}

/// Circular error probable of the ensemble: the median lateral miss
/// distance from the ensemble centroid, measured in the local tangent plane
/// at the centroid.
pub fn circular_error_probable(ensemble: &ImpactEnsemble) -> f64 {
    let states = ensemble.states();
    if states.is_empty() {
        return 0.0;
    }

    let mut centroid = Vector3::zeros();
    for state in states {
        centroid += state.pos;
    }
    centroid /= states.len() as f64;

    let radial = if centroid.norm() > 1.0 {
        centroid.normalize()
    } else {
        // degenerate centroid (perfect-maneuver residual ensembles): fall
        // back to full 3-D distances
        Vector3::zeros()
    };

    let mut distances: Vec<f64> = states
        .iter()
        .map(|state| {
            let d = state.pos - centroid;
            (d - radial * d.dot(&radial)).norm()
        })
        .collect();
    distances.sort_by(f64::total_cmp);
    percentile(&distances, 50.0)
}

/// Percentile of a sorted sample with linear interpolation between ranks.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

//! Error taxonomy for the engine.
//!
//! Configuration-validation failures are hard errors returned to the caller;
//! the CLI maps them to a diagnostic message and a nonzero exit. Everything
//! else in the simulation degrades gracefully to a best-effort result.

use std::path::PathBuf;

use thiserror::Error;

use crate::constants::MAX_RUNS;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("number of runs ({requested}) exceeds the ensemble capacity ({cap})", cap = MAX_RUNS)]
    EnsembleCapacity { requested: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("atmosphere profile {}: {reason}", .path.display())]
    Profile { path: PathBuf, reason: String },

    #[error("failed to write output: {0}")]
    Output(#[from] csv::Error),
}

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Exploration depth used when none is given.
pub const DEFAULT_DEPTH: u32 = 2;

/// Weight of the 2-path evidence against the 3-path evidence.
pub const DEFAULT_DAMPING: f64 = 0.5;

/// Number of independent reads of the unconstrained sampler.
pub const DEFAULT_READS: usize = 20;

/// Sweeps per read of the unconstrained sampler.
pub const DEFAULT_SWEEPS: usize = 1000;

/// Up to this many variables the QUBO is minimized by enumeration.
pub const EXACT_MAX_VARIABLES: usize = 16;

pub const DEFAULT_ANNEAL_ITERATIONS: usize = 1000;

pub const DEFAULT_TEMPERATURE: f64 = 100.0;

/// Diagonal entry of every QUBO built here.
pub const NODE_BIAS: f64 = -1.0;

/// Coupling of an edge crossing ground-truth communities in the annealing objective.
pub const CROSSING_PENALTY: f64 = 2.0;

/// Coupling of a crossing edge in the reference separator QUBO.
pub const REFERENCE_PENALTY: f64 = 20.0;

/// Exponents below this are treated as a zero acceptance probability.
pub const MIN_METROPOLIS_EXPONENT: f64 = -700.0;

/// Parameters of one run of the driver, loadable from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub depth: u32, // Exploration depth around each edge.
    pub damping: f64, // Damping between 2-path and 3-path evidence.
    pub reads: usize, // Sampler reads.
    pub sweeps: usize, // Sweeps per sampler read.
    pub seed: u64, // Seed of the run's generator.
    pub anneal_iterations: usize, // Budget of the constrained annealer.
    pub temperature: f64, // Initial annealing temperature.
    pub parallel: bool, // Score edges on the rayon pool.
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            depth: DEFAULT_DEPTH,
            damping: DEFAULT_DAMPING,
            reads: DEFAULT_READS,
            sweeps: DEFAULT_SWEEPS,
            seed: 0,
            anneal_iterations: DEFAULT_ANNEAL_ITERATIONS,
            temperature: DEFAULT_TEMPERATURE,
            parallel: false,
        }
    }
}

impl RunConfig {
    /// Load a config from a YAML file. Missing keys keep their defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: RunConfig = serde_yaml::from_str(text).context("Malformed YAML config")?;
        Ok(config)
    }
}

//! Unconstrained minimization of a [`Qubo`].

use log::debug;
use rand::Rng;

use crate::classification::Classification;
use crate::config::{DEFAULT_READS, DEFAULT_SWEEPS, EXACT_MAX_VARIABLES};
use crate::error::{Result, SepNodeError};
use crate::qubo::Qubo;
use crate::solver::{check_budget, metropolis, QuboSolver, Sample};

/// Enumerates every state in Gray-code order.
///
/// Consecutive states differ in one variable, so the energy is updated in
/// `O(degree)` per state. The first state reaching the minimum is kept.
#[derive(Debug, Clone, Copy)]
pub struct ExactSolver {
    pub max_variables: usize,
}

impl Default for ExactSolver {
    fn default() -> Self {
        ExactSolver {
            max_variables: EXACT_MAX_VARIABLES,
        }
    }
}

impl QuboSolver for ExactSolver {
    fn minimize<R: Rng + ?Sized>(&self, qubo: &Qubo, _rng: &mut R) -> Result<Sample> {
        let n = qubo.len();
        if n > self.max_variables || n >= usize::BITS as usize {
            return Err(SepNodeError::InvalidArgument(format!(
                "exact enumeration supports at most {} variables, got {}",
                self.max_variables, n
            )));
        }
        let adjacency = qubo.adjacency();
        let diagonal = qubo.diagonal();
        let mut state = Classification::all_separators(n);
        let mut energy = 0.0;
        let mut best = state.clone();
        let mut best_energy = energy;
        for step in 1usize..(1 << n) {
            let var = step.trailing_zeros() as usize;
            let field = diagonal[var]
                + adjacency[var]
                    .iter()
                    .filter(|(other, _)| !state.is_separator(*other))
                    .map(|(_, value)| value)
                    .sum::<f64>();
            if state.is_separator(var as u32) {
                energy += field;
            } else {
                energy -= field;
            }
            state.flip(var as u32);
            if energy < best_energy {
                best_energy = energy;
                best.clone_from(&state);
            }
        }
        // Recompute to shed the rounding drift of the running sum.
        let energy = qubo.energy(&best);
        Ok(Sample { state: best, energy })
    }
}

/// Single-flip simulated annealing with restarts.
///
/// Each read starts from a uniformly random state and performs `sweeps`
/// sweeps, each visiting every variable once in index order, while the
/// inverse temperature grows geometrically over `beta_range`. The read with
/// the lowest final energy wins, the earliest one on ties.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedAnnealingSampler {
    pub reads: usize,
    pub sweeps: usize,
    /// `(hot, cold)` inverse temperatures, derived from the coefficients when `None`.
    pub beta_range: Option<(f64, f64)>,
}

impl Default for SimulatedAnnealingSampler {
    fn default() -> Self {
        SimulatedAnnealingSampler {
            reads: DEFAULT_READS,
            sweeps: DEFAULT_SWEEPS,
            beta_range: None,
        }
    }
}

/// Inverse temperatures at which the largest possible single-flip change is
/// accepted with probability 1/2 and the smallest one with probability 1/100.
pub fn default_beta_range(qubo: &Qubo) -> (f64, f64) {
    let adjacency = qubo.adjacency();
    let mut max_delta: f64 = 0.0;
    let mut min_delta = f64::INFINITY;
    for (var, partners) in adjacency.iter().enumerate() {
        let diagonal = qubo.diagonal()[var].abs();
        let spread = diagonal + partners.iter().map(|(_, value)| value.abs()).sum::<f64>();
        max_delta = max_delta.max(spread);
        for coefficient in std::iter::once(diagonal).chain(partners.iter().map(|(_, value)| value.abs())) {
            if coefficient > 0.0 {
                min_delta = min_delta.min(coefficient);
            }
        }
    }
    if max_delta == 0.0 || !min_delta.is_finite() {
        return (1.0, 1.0);
    }
    let hot = std::f64::consts::LN_2 / max_delta;
    let cold = (100f64).ln() / min_delta;
    (hot, cold.max(hot))
}

fn beta_schedule((hot, cold): (f64, f64), sweeps: usize) -> Vec<f64> {
    if sweeps <= 1 {
        return vec![cold; sweeps];
    }
    let ratio = cold / hot;
    (0..sweeps)
        .map(|k| hot * ratio.powf(k as f64 / (sweeps - 1) as f64))
        .collect()
}

impl SimulatedAnnealingSampler {
    fn read<R: Rng + ?Sized>(
        &self,
        qubo: &Qubo,
        adjacency: &[Vec<(u32, f64)>],
        schedule: &[f64],
        rng: &mut R,
    ) -> Classification {
        let n = qubo.len();
        let mut state = Classification::from_states((0..n).map(|_| rng.gen::<bool>()));
        // field[i] is the energy change of switching i on, given the others.
        let mut field: Vec<f64> = (0..n)
            .map(|var| {
                qubo.diagonal()[var]
                    + adjacency[var]
                        .iter()
                        .filter(|(other, _)| !state.is_separator(*other))
                        .map(|(_, value)| value)
                        .sum::<f64>()
            })
            .collect();
        for &beta in schedule {
            for var in 0..n {
                let on = !state.is_separator(var as u32);
                let delta = if on { -field[var] } else { field[var] };
                if delta <= 0.0 || rng.gen::<f64>() < metropolis(-beta * delta) {
                    state.flip(var as u32);
                    let sign = if on { -1.0 } else { 1.0 };
                    for &(other, value) in &adjacency[var] {
                        field[other as usize] += sign * value;
                    }
                }
            }
        }
        state
    }
}

impl QuboSolver for SimulatedAnnealingSampler {
    fn minimize<R: Rng + ?Sized>(&self, qubo: &Qubo, rng: &mut R) -> Result<Sample> {
        check_budget(self.reads, self.sweeps)?;
        if qubo.is_empty() {
            return Ok(Sample {
                state: Classification::all_separators(0),
                energy: 0.0,
            });
        }
        let beta_range = self.beta_range.unwrap_or_else(|| default_beta_range(qubo));
        let schedule = beta_schedule(beta_range, self.sweeps);
        let adjacency = qubo.adjacency();

        let mut best: Option<Sample> = None;
        for read in 0..self.reads {
            let state = self.read(qubo, &adjacency, &schedule, rng);
            let energy = qubo.energy(&state);
            debug!("Read {} ended at energy {}", read, energy);
            if best.as_ref().map_or(true, |sample| energy < sample.energy) {
                best = Some(Sample { state, energy });
            }
        }
        best.ok_or_else(|| SepNodeError::InvalidArgument("reads must be positive".to_owned()))
    }
}

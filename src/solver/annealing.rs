//! Simulated annealing with ground truth at hand.
//!
//! The objective rewards every member node by `NODE_BIAS` and charges
//! `CROSSING_PENALTY` for each edge whose member endpoints belong to
//! different ground-truth communities. The validator gates every move: the
//! current state never accumulates more violations, and the best state only
//! moves to candidates that dominate it on every violation counter.

use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info};
use rand::Rng;

use crate::classification::Classification;
use crate::config::CROSSING_PENALTY;
use crate::error::{Result, SepNodeError};
use crate::graph::{Graph, GroundTruth, VInt};
use crate::qubo::{build_from_ground_truth, Qubo};
use crate::solver::metropolis;
use crate::validator::{count_violations, ViolationTriple};

/// A state with its objective and violations.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnealOutcome {
    pub state: Classification,
    pub objective: f64,
    pub violations: ViolationTriple,
}

/// What one iteration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    pub flipped: VInt,
    pub accepted: bool,
    pub improved_best: bool,
}

pub struct Annealer<'g> {
    graph: &'g Graph,
    ground_truth: &'g GroundTruth,
    adjacency: Vec<Vec<(VInt, f64)>>,
    diagonal: Vec<f64>,
    initial_temperature: f64,
    iteration: usize,
    current: AnnealOutcome,
    best: AnnealOutcome,
}

impl<'g> Annealer<'g> {
    /// Start from `warm_start`, or from the all-separator state without one.
    pub fn new(
        graph: &'g Graph,
        warm_start: Option<&Classification>,
        initial_temperature: f64,
    ) -> Result<Annealer<'g>> {
        graph.check_non_empty()?;
        let ground_truth = graph.require_ground_truth()?;
        if !initial_temperature.is_finite() || initial_temperature < 0.0 {
            return Err(SepNodeError::InvalidArgument(format!(
                "initial temperature must be finite and non-negative, got {}",
                initial_temperature
            )));
        }
        let state = match warm_start {
            Some(state) => {
                state.check_domain(graph)?;
                state.clone()
            }
            None => Classification::all_separators(graph.v_size()),
        };

        let qubo: Qubo = build_from_ground_truth(graph, CROSSING_PENALTY)?;
        let objective = qubo.energy(&state);
        let violations = count_violations(graph, ground_truth, &state);
        let current = AnnealOutcome {
            state,
            objective,
            violations,
        };
        debug!("Annealer starts at objective {} with {}", objective, violations);

        Ok(Annealer {
            graph,
            ground_truth,
            adjacency: qubo.adjacency(),
            diagonal: qubo.diagonal().to_vec(),
            initial_temperature,
            iteration: 0,
            best: current.clone(),
            current,
        })
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn current(&self) -> &AnnealOutcome {
        &self.current
    }

    pub fn best(&self) -> &AnnealOutcome {
        &self.best
    }

    /// Temperature of the upcoming iteration, `T0 / i` with `i` counted from 1.
    pub fn temperature(&self) -> f64 {
        self.initial_temperature / (self.iteration + 1) as f64
    }

    // Objective change of flipping `vertex` in the current state.
    fn flip_delta(&self, vertex: VInt) -> f64 {
        let state = &self.current.state;
        let field = self.diagonal[vertex as usize]
            + self.adjacency[vertex as usize]
                .iter()
                .filter(|(other, _)| !state.is_separator(*other))
                .map(|(_, value)| value)
                .sum::<f64>();
        if state.is_separator(vertex) {
            field
        } else {
            -field
        }
    }

    /// Run one proposal and return what happened to it.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> StepReport {
        let temperature = self.temperature();
        self.iteration += 1;

        let flipped = rng.gen_range(0..self.graph.v_size()) as VInt;
        let diff = self.flip_delta(flipped);
        let mut state = self.current.state.clone();
        state.flip(flipped);
        let violations = count_violations(self.graph, self.ground_truth, &state);
        let candidate = AnnealOutcome {
            state,
            objective: self.current.objective + diff,
            violations,
        };

        let improved_best =
            candidate.objective <= self.best.objective && candidate.violations.dominated_by(&self.best.violations);
        if improved_best {
            debug!(
                "Iteration {}: best objective {} with {}",
                self.iteration, candidate.objective, candidate.violations
            );
            self.best = candidate.clone();
        }

        let mut accepted = false;
        if candidate.violations.total() <= self.current.violations.total() {
            accepted = diff <= 0.0 || rng.gen::<f64>() < metropolis(-diff / temperature);
        }
        if accepted {
            self.current = candidate;
        }

        StepReport {
            flipped,
            accepted,
            improved_best,
        }
    }

    /// Run the whole budget and return the best state seen.
    pub fn run<R: Rng + ?Sized>(self, iterations: usize, rng: &mut R) -> AnnealOutcome {
        self.run_until(iterations, rng, &AtomicBool::new(false))
    }

    /// Like [`Annealer::run`], but checks `stop` between iterations.
    pub fn run_until<R: Rng + ?Sized>(mut self, iterations: usize, rng: &mut R, stop: &AtomicBool) -> AnnealOutcome {
        for _ in 0..iterations {
            if stop.load(Ordering::Relaxed) {
                info!("Annealing stopped after {} iterations", self.iteration);
                break;
            }
            self.step(rng);
        }
        info!(
            "Annealing finished: objective {} with {}",
            self.best.objective, self.best.violations
        );
        self.best
    }
}

/// Anneal `graph` for `iterations` steps from `warm_start` or all separators.
pub fn anneal<R: Rng + ?Sized>(
    graph: &Graph,
    warm_start: Option<&Classification>,
    iterations: usize,
    initial_temperature: f64,
    rng: &mut R,
) -> Result<AnnealOutcome> {
    let annealer = Annealer::new(graph, warm_start, initial_temperature)?;
    Ok(annealer.run(iterations, rng))
}

//! Minimizers over binary node states.
//!
//! Two modes share the state formalism of [`Classification`]:
//! [`sampler`] minimizes a [`Qubo`] without knowing anything else, while
//! [`annealing`] searches with ground truth at hand and ratchets towards
//! feasible separator sets.

use rand::Rng;

use crate::classification::Classification;
use crate::config::{DEFAULT_SWEEPS, EXACT_MAX_VARIABLES, MIN_METROPOLIS_EXPONENT};
use crate::error::{Result, SepNodeError};
use crate::qubo::Qubo;

pub mod annealing;
pub mod sampler;

pub use annealing::{anneal, AnnealOutcome, Annealer};
pub use sampler::{ExactSolver, SimulatedAnnealingSampler};

/// A state together with its objective value.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub state: Classification,
    pub energy: f64,
}

/// Anything able to approximately minimize a QUBO.
pub trait QuboSolver {
    fn minimize<R: Rng + ?Sized>(&self, qubo: &Qubo, rng: &mut R) -> Result<Sample>;
}

/// Acceptance probability `exp(exponent)` of a Metropolis move.
///
/// Non-negative exponents accept for sure. Very negative or non-finite ones
/// give 0 instead of reaching the exponential.
#[inline]
pub(crate) fn metropolis(exponent: f64) -> f64 {
    if exponent.is_nan() || exponent < MIN_METROPOLIS_EXPONENT {
        0.0
    } else if exponent >= 0.0 {
        1.0
    } else {
        exponent.exp()
    }
}

pub(crate) fn check_budget(reads: usize, sweeps: usize) -> Result<()> {
    if reads == 0 {
        return Err(SepNodeError::InvalidArgument("reads must be positive".to_owned()));
    }
    if sweeps == 0 {
        return Err(SepNodeError::InvalidArgument("sweeps must be positive".to_owned()));
    }
    Ok(())
}

/// Minimize `qubo` exactly when it is small enough, otherwise sample it
/// `reads` times and keep the best read.
///
/// The budget is checked up front, whichever path ends up running.
pub fn minimize<R: Rng + ?Sized>(qubo: &Qubo, reads: usize, sweeps: usize, rng: &mut R) -> Result<Sample> {
    check_budget(reads, sweeps)?;
    if qubo.len() <= EXACT_MAX_VARIABLES {
        ExactSolver::default().minimize(qubo, rng)
    } else {
        SimulatedAnnealingSampler {
            reads,
            sweeps,
            ..Default::default()
        }
        .minimize(qubo, rng)
    }
}

/// Like [`minimize`] with the default sweep count.
pub fn solve<R: Rng + ?Sized>(qubo: &Qubo, reads: usize, rng: &mut R) -> Result<Sample> {
    minimize(qubo, reads, DEFAULT_SWEEPS, rng)
}

#[cfg(test)]
mod solver_test {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::error::SepNodeError;
    use crate::qubo::Qubo;
    use crate::solver::{metropolis, minimize, solve};

    #[test]
    fn test_metropolis_clamps() {
        assert_eq!(metropolis(0.0), 1.0);
        assert_eq!(metropolis(5.0), 1.0);
        assert_eq!(metropolis(-1e9), 0.0);
        assert_eq!(metropolis(f64::NEG_INFINITY), 0.0);
        assert_eq!(metropolis(f64::NAN), 0.0);
        assert!((metropolis(-1.0) - (-1.0f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_solve_small_path() {
        // Path 0-1-2 with expensive couplings: only the middle node should go.
        let mut qubo = Qubo::with_bias(3, -1.0);
        qubo.set_coupling(0, 1, 2.0).unwrap();
        qubo.set_coupling(1, 2, 2.0).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let sample = solve(&qubo, 4, &mut rng).unwrap();
        assert_eq!(sample.state.separators(), vec![1]);
        assert_eq!(sample.energy, -2.0);
    }

    #[test]
    fn test_empty_budget_rejected_on_both_paths() {
        let small = Qubo::with_bias(3, -1.0);
        let large = Qubo::with_bias(20, -1.0);
        let mut rng = StdRng::seed_from_u64(0);
        for qubo in [&small, &large] {
            assert!(matches!(solve(qubo, 0, &mut rng), Err(SepNodeError::InvalidArgument(_))));
            assert!(matches!(minimize(qubo, 4, 0, &mut rng), Err(SepNodeError::InvalidArgument(_))));
        }
        assert!(minimize(&small, 1, 1, &mut rng).is_ok());
    }
}

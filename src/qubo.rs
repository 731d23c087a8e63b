use std::collections::BTreeMap;

use log::debug;

use crate::classification::Classification;
use crate::config::NODE_BIAS;
use crate::error::{Result, SepNodeError};
use crate::graph::{Graph, VInt};

/// Quadratic objective over one binary variable per node.
///
/// The matrix is upper triangular: each pair `(i, j)` with `i < j` holds at
/// most one entry and the energy `x^T Q x` reads it exactly once. Entries
/// below the diagonal are always zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Qubo {
    diagonal: Vec<f64>,
    couplings: BTreeMap<(VInt, VInt), f64>, // Keyed by (i, j), i < j.
}

impl Qubo {
    /// An `n x n` matrix with `bias` on the diagonal and nothing else.
    pub fn with_bias(node_count: usize, bias: f64) -> Qubo {
        Qubo {
            diagonal: vec![bias; node_count],
            couplings: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.diagonal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagonal.is_empty()
    }

    /// Write the entry of the pair `{i, j}`, replacing any previous value.
    pub fn set_coupling(&mut self, i: VInt, j: VInt, value: f64) -> Result<()> {
        let n = self.len();
        for vertex in [i, j] {
            if vertex as usize >= n {
                return Err(SepNodeError::NodeOutOfBounds {
                    node: vertex,
                    node_count: n,
                });
            }
        }
        if i == j {
            return Err(SepNodeError::InvalidArgument(format!(
                "coupling needs two distinct variables, got {} twice",
                i
            )));
        }
        let key = if i < j { (i, j) } else { (j, i) };
        self.couplings.insert(key, value);
        Ok(())
    }

    /// Matrix entry at row `i`, column `j`.
    pub fn get(&self, i: VInt, j: VInt) -> f64 {
        if i == j {
            self.diagonal.get(i as usize).copied().unwrap_or(0.0)
        } else {
            self.couplings.get(&(i, j)).copied().unwrap_or(0.0)
        }
    }

    pub fn diagonal(&self) -> &[f64] {
        &self.diagonal
    }

    pub fn couplings(&self) -> impl Iterator<Item = (VInt, VInt, f64)> + '_ {
        self.couplings.iter().map(|(&(i, j), &value)| (i, j, value))
    }

    pub fn coupling_count(&self) -> usize {
        self.couplings.len()
    }

    /// Per variable, the partners it is coupled to and the coupling value.
    pub fn adjacency(&self) -> Vec<Vec<(VInt, f64)>> {
        let mut adjacency = vec![vec![]; self.len()];
        for (&(i, j), &value) in &self.couplings {
            adjacency[i as usize].push((j, value));
            adjacency[j as usize].push((i, value));
        }
        adjacency
    }

    /// `x^T Q x`, where `x_i` is 1 for community members and 0 for separators.
    pub fn energy(&self, state: &Classification) -> f64 {
        let linear: f64 = state
            .states()
            .iter_ones()
            .map(|idx| self.diagonal[idx])
            .sum();
        let quadratic: f64 = self
            .couplings
            .iter()
            .filter(|&(&(i, j), _)| !state.is_separator(i) && !state.is_separator(j))
            .map(|(_, &value)| value)
            .sum();
        linear + quadratic
    }
}

/// Build the objective from per-edge connectivity scores: `NODE_BIAS` on the
/// diagonal and `2 * (1 - nc)` on every scored pair.
///
/// Keeping both endpoints of an edge as members costs little when the edge
/// looks intra-community and up to 2 when it looks separating, which outweighs
/// the reward of a single member and pushes one endpoint to be a separator.
pub fn build_from_scores(graph: &Graph, scores: &BTreeMap<(VInt, VInt), f64>) -> Result<Qubo> {
    graph.check_non_empty()?;
    let mut qubo = Qubo::with_bias(graph.v_size(), NODE_BIAS);
    for (&(i, j), &nc) in scores {
        qubo.set_coupling(i, j, 2.0 * (1.0 - nc))?;
    }
    debug!(
        "Built QUBO with {} variables and {} couplings",
        qubo.len(),
        qubo.coupling_count()
    );
    Ok(qubo)
}

/// Build the objective from ground truth: `NODE_BIAS` on the diagonal and
/// `penalty` on every edge whose endpoints sit in different communities.
pub fn build_from_ground_truth(graph: &Graph, penalty: f64) -> Result<Qubo> {
    graph.check_non_empty()?;
    let ground_truth = graph.require_ground_truth()?;
    let mut qubo = Qubo::with_bias(graph.v_size(), NODE_BIAS);
    for (i, j) in graph.edges() {
        if ground_truth.community_of(i) != ground_truth.community_of(j) {
            qubo.set_coupling(i, j, penalty)?;
        }
    }
    Ok(qubo)
}

#[cfg(test)]
mod qubo_test {
    use std::collections::BTreeMap;

    use crate::classification::Classification;
    use crate::error::SepNodeError;
    use crate::graph::{Graph, GroundTruth};
    use crate::qubo::{build_from_ground_truth, build_from_scores, Qubo};

    #[test]
    fn test_upper_triangle_convention() {
        let mut qubo = Qubo::with_bias(3, -1.0);
        qubo.set_coupling(2, 0, 1.5).unwrap();
        assert_eq!(qubo.get(0, 2), 1.5);
        assert_eq!(qubo.get(2, 0), 0.0);
        assert_eq!(qubo.get(1, 1), -1.0);

        let all = Classification::all_members(3);
        assert_eq!(qubo.energy(&all), -3.0 + 1.5);
        assert_eq!(qubo.energy(&Classification::all_separators(3)), 0.0);
        assert_eq!(qubo.energy(&Classification::from_separators(3, &[2])), -2.0);
    }

    #[test]
    fn test_invalid_coupling() {
        let mut qubo = Qubo::with_bias(2, -1.0);
        assert!(matches!(qubo.set_coupling(0, 0, 1.0), Err(SepNodeError::InvalidArgument(_))));
        assert!(matches!(qubo.set_coupling(0, 4, 1.0), Err(SepNodeError::NodeOutOfBounds { .. })));
    }

    #[test]
    fn test_build_from_scores() {
        let graph = Graph::from_edges(3, [(0, 1), (1, 2)]).unwrap();
        let scores: BTreeMap<_, _> = [((0, 1), 0.75), ((1, 2), 0.25)].into_iter().collect();
        let qubo = build_from_scores(&graph, &scores).unwrap();
        assert_eq!(qubo.diagonal(), &[-1.0, -1.0, -1.0]);
        assert_eq!(qubo.get(0, 1), 0.5);
        assert_eq!(qubo.get(1, 2), 1.5);
        assert_eq!(qubo.adjacency()[1], vec![(0, 0.5), (2, 1.5)]);
    }

    #[test]
    fn test_build_from_ground_truth() {
        let graph = Graph::from_edges(4, [(0, 1), (1, 2), (2, 3)])
            .unwrap()
            .with_ground_truth(GroundTruth::from_blocks(&[0, 0, 1, 1]))
            .unwrap();
        let qubo = build_from_ground_truth(&graph, 2.0).unwrap();
        assert_eq!(qubo.coupling_count(), 1);
        assert_eq!(qubo.get(1, 2), 2.0);

        let plain = Graph::from_edges(2, [(0, 1)]).unwrap();
        assert!(matches!(build_from_ground_truth(&plain, 2.0), Err(SepNodeError::MissingGroundTruth)));
    }
}

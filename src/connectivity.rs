//! Neighborhood connectivity of an edge.
//!
//! The layers around `(v, w)` are compared with a configuration-model null:
//! given `x` and `y` free stubs on two sides, about `x * y / 2|E|` edges are
//! expected to join them by chance. Evidence beyond that expectation near the
//! edge means `v` and `w` likely share a community. Scores land in `[0, 1]`,
//! with `0.5` as the neutral value.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, trace};
use rayon::prelude::*;

use crate::error::{Result, SepNodeError};
use crate::graph::{Graph, VInt};
use crate::layering::{explore, HalfDepth, Layering, SubtreeRoot};

/// Score given to an edge with no usable evidence around it.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Unconsumed degree of one node layer, split by subtree root.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FreeStubs {
    pub v: f64,
    pub w: f64,
    pub both: f64,
}

impl FreeStubs {
    pub fn total(&self) -> f64 {
        self.v + self.w + self.both
    }
}

/// Evidence gathered on one half-depth edge layer.
#[derive(Debug, Clone)]
pub struct LayerEvidence {
    pub depth: HalfDepth,
    pub explored: usize, // Edges recorded on this layer.
    pub observed: usize, // Of those, edges linking the two sides.
    pub expected: f64, // Linking edges expected under the null model.
    pub contributing: BTreeSet<(VInt, VInt)>, // The observed edges themselves.
}

impl LayerEvidence {
    /// Excess of linking edges per explored edge, `None` without explored edges.
    pub fn excess(&self) -> Option<f64> {
        if self.explored == 0 {
            None
        } else {
            Some((self.observed as f64 - self.expected) / self.explored as f64)
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConnectivityEstimate {
    pub score: f64,
    pub layers: Vec<LayerEvidence>, // Half depths 0.5, 1, 1.5, ...
}

impl ConnectivityEstimate {
    pub fn layer(&self, depth: HalfDepth) -> Option<&LayerEvidence> {
        self.layers.iter().find(|layer| layer.depth == depth)
    }
}

fn check_damping(damping: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&damping) {
        return Err(SepNodeError::InvalidArgument(format!(
            "damping must lie in [0, 1], got {}",
            damping
        )));
    }
    Ok(())
}

// Does this edge link the two sides of the exploration?
fn links_sides(layering: &Layering, depth: HalfDepth, (a, b): (VInt, VInt)) -> bool {
    let (root_a, root_b) = match (layering.subtree_root(a), layering.subtree_root(b)) {
        (Some(root_a), Some(root_b)) => (root_a, root_b),
        _ => return false,
    };
    if depth.is_integer() {
        root_a != root_b || root_a == SubtreeRoot::Both
    } else {
        root_a == SubtreeRoot::Both || root_b == SubtreeRoot::Both
    }
}

fn free_stubs(graph: &Graph, layering: &Layering) -> Vec<FreeStubs> {
    let mut stubs = Vec::with_capacity(layering.max_depth as usize);
    // The analyzed edge itself is consumed on both roots.
    stubs.push(FreeStubs {
        v: graph.degree(&layering.v) as f64 - 1.0,
        w: graph.degree(&layering.w) as f64 - 1.0,
        both: 0.0,
    });
    for depth in 1..layering.max_depth {
        let mut layer = FreeStubs::default();
        for &node in layering.nodes_at(depth) {
            let consumed = layering.incident_at(node, HalfDepth::between(depth - 1));
            let free = graph.degree(&node) as f64 - consumed as f64;
            match layering.subtree_root(node) {
                Some(SubtreeRoot::V) => layer.v += free,
                Some(SubtreeRoot::W) => layer.w += free,
                Some(SubtreeRoot::Both) => layer.both += free,
                None => {}
            }
        }
        stubs.push(layer);
    }
    stubs
}

/// Turn a layering into a connectivity score.
///
/// Only the layers at depth 0.5 and 1 enter the score, weighted by `damping`
/// and `1 - damping`. A layer without explored edges drops out and the other
/// one takes its full weight; with neither the score is [`NEUTRAL_SCORE`].
pub fn estimate(graph: &Graph, layering: &Layering, damping: f64) -> Result<ConnectivityEstimate> {
    check_damping(damping)?;
    let double_edges = 2.0 * graph.e_size() as f64;
    let null = |x: f64, y: f64| x * y / double_edges;
    let stubs = free_stubs(graph, layering);

    let mut layers = vec![];
    for half in 1..=layering.edge_layer_count() {
        let depth = HalfDepth(half);
        let node_layer = half / 2;
        let expected = if depth.is_integer() {
            let s = stubs[node_layer as usize];
            null(s.v, s.w) + null(s.both, s.total())
        } else {
            let below: usize = layering
                .nodes_at(node_layer + 1)
                .iter()
                .map(|node| graph.degree(node))
                .sum();
            null(stubs[node_layer as usize].total(), below as f64)
        };
        let explored = layering.edges_at(depth);
        let contributing: BTreeSet<(VInt, VInt)> = explored
            .iter()
            .copied()
            .filter(|&edge| links_sides(layering, depth, edge))
            .collect();
        layers.push(LayerEvidence {
            depth,
            explored: explored.len(),
            observed: contributing.len(),
            expected,
            contributing,
        });
    }

    let two_path = layers.first().and_then(LayerEvidence::excess);
    let three_path = layers.get(1).and_then(LayerEvidence::excess);
    let raw = match (two_path, three_path) {
        (Some(near), Some(far)) => damping * near + (1.0 - damping) * far,
        (Some(near), None) => near,
        (None, Some(far)) => far,
        (None, None) => 0.0,
    };
    let score = ((raw.clamp(-1.0, 1.0)) + 1.0) / 2.0;
    trace!("nc({}, {}) = {:.4}", layering.v, layering.w, score);

    Ok(ConnectivityEstimate { score, layers })
}

/// Explore around `(v, w)` and score it.
pub fn score_edge(
    graph: &Graph,
    v: VInt,
    w: VInt,
    depth: u32,
    damping: f64,
) -> Result<ConnectivityEstimate> {
    let layering = explore(graph, v, w, depth)?;
    estimate(graph, &layering, damping)
}

/// Score every edge of the graph, keyed by `(u, v)` with `u < v`.
pub fn score_all_edges(
    graph: &Graph,
    depth: u32,
    damping: f64,
) -> Result<BTreeMap<(VInt, VInt), f64>> {
    graph.check_non_empty()?;
    check_damping(damping)?;
    let scores = graph
        .edges()
        .map(|(v, w)| score_edge(graph, v, w, depth, damping).map(|estimate| ((v, w), estimate.score)))
        .collect::<Result<BTreeMap<_, _>>>()?;
    debug!("Scored {} edges at depth {}", scores.len(), depth);
    Ok(scores)
}

/// [`score_all_edges`] spread over the rayon pool.
///
/// Edges are scored independently on a read-only graph, so the result equals
/// the sequential sweep.
pub fn score_all_edges_parallel(
    graph: &Graph,
    depth: u32,
    damping: f64,
) -> Result<BTreeMap<(VInt, VInt), f64>> {
    graph.check_non_empty()?;
    check_damping(damping)?;
    let edges: Vec<(VInt, VInt)> = graph.edges().collect();
    let scores = edges
        .par_iter()
        .map(|&(v, w)| score_edge(graph, v, w, depth, damping).map(|estimate| ((v, w), estimate.score)))
        .collect::<Result<Vec<_>>>()?;
    debug!("Scored {} edges at depth {} in parallel", scores.len(), depth);
    Ok(scores.into_iter().collect())
}

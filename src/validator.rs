//! Checks a separator set against ground-truth communities.
//!
//! Removing the separators splits the graph into residual components. A
//! perfect separator set makes those components correspond one to one with the
//! communities; the three counters below measure how far a classification is
//! from that.

use derive_more::Display;
use itertools::Itertools;
use serde::Serialize;

use crate::classification::Classification;
use crate::error::Result;
use crate::graph::{Graph, GroundTruth, VInt};

#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[display(fmt = "(sep={}, inj={}, sur={})", separation, injectivity, surjectivity)]
pub struct ViolationTriple {
    /// Nodes that share a residual component with a larger group of another
    /// community.
    pub separation: usize,
    /// Nodes of communities spread over several residual components, outside
    /// the largest of those components.
    pub injectivity: usize,
    /// Communities without any non-separator node.
    pub surjectivity: usize,
}

impl ViolationTriple {
    pub fn total(&self) -> usize {
        self.separation + self.injectivity + self.surjectivity
    }

    pub fn is_zero(&self) -> bool {
        self.total() == 0
    }

    /// No counter exceeds its counterpart in `other`.
    pub fn dominated_by(&self, other: &ViolationTriple) -> bool {
        self.separation <= other.separation
            && self.injectivity <= other.injectivity
            && self.surjectivity <= other.surjectivity
    }
}

/// Size of a group minus its largest part, 0 for a single part.
fn excess_over_largest(parts: &[usize]) -> usize {
    if parts.len() < 2 {
        return 0;
    }
    let largest = parts.iter().copied().max().unwrap_or(0);
    parts.iter().sum::<usize>() - largest
}

pub(crate) fn count_violations(
    graph: &Graph,
    ground_truth: &GroundTruth,
    classification: &Classification,
) -> ViolationTriple {
    let components = graph.components_within(&classification.member_mask());

    let mut separation = 0;
    // Sizes of the residual components touching each community.
    let mut touching: Vec<Vec<usize>> = vec![vec![]; ground_truth.community_count()];
    for component in &components {
        let counts = component
            .iter()
            .map(|&node: &VInt| ground_truth.community_of(node))
            .counts();
        let overlaps: Vec<usize> = counts.values().copied().collect();
        separation += excess_over_largest(&overlaps);
        for community in counts.into_keys().sorted() {
            touching[community].push(component.len());
        }
    }

    let injectivity = touching.iter().map(|sizes| excess_over_largest(sizes)).sum();
    let surjectivity = touching.iter().filter(|sizes| sizes.is_empty()).count();

    ViolationTriple {
        separation,
        injectivity,
        surjectivity,
    }
}

/// Count the violations of `classification` on a graph carrying ground truth.
pub fn validate(graph: &Graph, classification: &Classification) -> Result<ViolationTriple> {
    let ground_truth = graph.require_ground_truth()?;
    classification.check_domain(graph)?;
    Ok(count_violations(graph, ground_truth, classification))
}

//! Separator sets derived from ground truth, as a yardstick for classify.

use log::{info, warn};
use rand::Rng;

use crate::classification::Classification;
use crate::config::REFERENCE_PENALTY;
use crate::error::Result;
use crate::graph::{Graph, VInt};
use crate::qubo::build_from_ground_truth;
use crate::solver::minimize;
use crate::validator::count_violations;

/// Minimize the ground-truth objective and keep the result only when its
/// residual components match the communities one to one.
pub fn reference_separators<R: Rng + ?Sized>(
    graph: &Graph,
    reads: usize,
    sweeps: usize,
    rng: &mut R,
) -> Result<Option<Vec<VInt>>> {
    let ground_truth = graph.require_ground_truth()?;
    let qubo = build_from_ground_truth(graph, REFERENCE_PENALTY)?;
    let sample = minimize(&qubo, reads, sweeps, rng)?;
    let violations = count_violations(graph, ground_truth, &sample.state);
    if !violations.is_zero() {
        warn!("Reference separator set is not a bijective refinement: {}", violations);
        return Ok(None);
    }
    let separators = sample.state.separators();
    let (core, border) = core_border_counts(graph, &sample.state)?;
    info!(
        "Reference separator set holds {} nodes, leaving {} core and {} border nodes",
        separators.len(),
        core,
        border
    );
    Ok(Some(separators))
}

/// Count core and border nodes of the residual graph left once the
/// separators of `classification` are removed.
///
/// A member is core when every member neighbor shares its community, and
/// border otherwise. Separators count as neither.
pub fn core_border_counts(graph: &Graph, classification: &Classification) -> Result<(usize, usize)> {
    let ground_truth = graph.require_ground_truth()?;
    classification.check_domain(graph)?;
    let members: Vec<VInt> = graph.nodes().filter(|&vertex| !classification.is_separator(vertex)).collect();
    let core = members
        .iter()
        .filter(|vertex| {
            let community = ground_truth.community_of(**vertex);
            graph
                .get_neighbor(*vertex)
                .iter()
                .filter(|&&neighbor| !classification.is_separator(neighbor))
                .all(|&neighbor| ground_truth.community_of(neighbor) == community)
        })
        .count();
    Ok((core, members.len() - core))
}

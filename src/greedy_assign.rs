use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use log::debug;
use serde::Serialize;

use crate::classification::Classification;
use crate::error::Result;
use crate::graph::{Graph, VInt};

/// Disjoint communities covering every node of a graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommunityPartition {
    communities: Vec<BTreeSet<VInt>>,
}

impl CommunityPartition {
    pub fn len(&self) -> usize {
        self.communities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.communities.is_empty()
    }

    pub fn communities(&self) -> &[BTreeSet<VInt>] {
        &self.communities
    }

    /// Community index of every node of `0..node_count`.
    ///
    /// Nodes in no community map to `usize::MAX`.
    pub fn membership(&self, node_count: usize) -> Vec<usize> {
        let mut membership = vec![usize::MAX; node_count];
        for (idx, community) in self.communities.iter().enumerate() {
            for &vertex in community {
                if let Some(slot) = membership.get_mut(vertex as usize) {
                    *slot = idx;
                }
            }
        }
        membership
    }

    /// Communities are disjoint and their union is exactly `0..node_count`.
    pub fn is_partition_of(&self, node_count: usize) -> bool {
        let mut seen = vec![false; node_count];
        for vertex in self.communities.iter().flatten() {
            match seen.get_mut(*vertex as usize) {
                Some(flag) if !*flag => *flag = true,
                _ => return false,
            }
        }
        seen.into_iter().all(|flag| flag)
    }
}

// Heap entry: neighbor count, then lowest node, then lowest community first.
type Candidate = (usize, Reverse<VInt>, Reverse<usize>);

struct Assignment<'g> {
    graph: &'g Graph,
    owner: Vec<Option<usize>>,
    communities: Vec<BTreeSet<VInt>>,
    counts: Vec<BTreeMap<usize, usize>>, // Per unassigned node, neighbors per community.
    heap: BinaryHeap<Candidate>,
}

impl<'g> Assignment<'g> {
    fn place(&mut self, vertex: VInt, community: usize) {
        self.owner[vertex as usize] = Some(community);
        self.communities[community].insert(vertex);
        self.counts[vertex as usize].clear();
        let graph = self.graph;
        for &neighbor in graph.get_neighbor(&vertex) {
            if self.owner[neighbor as usize].is_none() {
                let count = self.counts[neighbor as usize].entry(community).or_insert(0);
                *count += 1;
                self.heap.push((*count, Reverse(neighbor), Reverse(community)));
            }
        }
    }

    fn pop_best(&mut self) -> Option<(VInt, usize)> {
        while let Some((count, Reverse(vertex), Reverse(community))) = self.heap.pop() {
            // Counts only grow, so any entry below the live count is stale.
            let live = self.counts[vertex as usize].get(&community).copied();
            if self.owner[vertex as usize].is_none() && live == Some(count) {
                return Some((vertex, community));
            }
        }
        None
    }
}

/// Grow communities from the residual components over the separators.
///
/// Members without a member neighbor become separators first. The remaining
/// members form the initial communities, one per connected component. Then,
/// repeatedly, the unassigned node with the most neighbors inside a single
/// community joins it. Ties prefer the lower node id and then the lower
/// community index. A separator region out of reach of every community seeds
/// a new community at its lowest node id.
pub fn assign_communities(graph: &Graph, classification: &Classification) -> Result<CommunityPartition> {
    classification.check_domain(graph)?;
    let n = graph.v_size();

    let mut members = classification.clone();
    for vertex in graph.nodes() {
        if !members.is_separator(vertex)
            && graph
                .get_neighbor(&vertex)
                .iter()
                .all(|&neighbor| classification.is_separator(neighbor))
        {
            members.set_separator(vertex, true);
        }
    }

    let mut assignment = Assignment {
        graph,
        owner: vec![None; n],
        communities: vec![],
        counts: vec![BTreeMap::new(); n],
        heap: BinaryHeap::new(),
    };
    for component in graph.components_within(&members.member_mask()) {
        let community = assignment.communities.len();
        assignment.communities.push(BTreeSet::new());
        for vertex in component {
            assignment.place(vertex, community);
        }
    }
    debug!(
        "Greedy assignment starts with {} communities and {} separators",
        assignment.communities.len(),
        members.separator_count()
    );

    let mut unassigned = members.separator_count();
    let mut next_seed = 0usize;
    while unassigned > 0 {
        let (vertex, community) = match assignment.pop_best() {
            Some(pick) => pick,
            None => {
                while assignment.owner[next_seed].is_some() {
                    next_seed += 1;
                }
                let community = assignment.communities.len();
                assignment.communities.push(BTreeSet::new());
                (next_seed as VInt, community)
            }
        };
        assignment.place(vertex, community);
        unassigned -= 1;
    }

    Ok(CommunityPartition {
        communities: assignment.communities,
    })
}

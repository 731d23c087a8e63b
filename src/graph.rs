use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use fixedbitset::FixedBitSet;

use crate::error::{Result, SepNodeError};

pub mod loader;

pub type VInt = u32;

/// Ground-truth community of every node, normalized to dense indices.
///
/// Indices are handed out in first-seen node order, so node 0 always sits in
/// community 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundTruth {
    index: Vec<usize>, // Community index per node.
    count: usize, // Number of distinct communities.
}

impl GroundTruth {
    /// Build from a plain block id per node.
    pub fn from_blocks(blocks: &[u32]) -> GroundTruth {
        Self::normalize(blocks.iter().copied())
    }

    /// Build from a set-valued descriptor per node, i.e. the member set of the
    /// community the node belongs to. Equal sets mean the same community.
    pub fn from_member_sets(descriptors: &[BTreeSet<VInt>]) -> GroundTruth {
        Self::normalize(descriptors.iter())
    }

    fn normalize<K: Eq + std::hash::Hash>(labels: impl Iterator<Item = K>) -> GroundTruth {
        let mut seen = HashMap::<K, usize>::new();
        let mut index = vec![];
        for label in labels {
            let next = seen.len();
            index.push(*seen.entry(label).or_insert(next));
        }
        GroundTruth {
            count: seen.len(),
            index,
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[inline]
    pub fn community_of(&self, vertex: VInt) -> usize {
        self.index[vertex as usize]
    }

    pub fn community_count(&self) -> usize {
        self.count
    }

    /// Node to community index, one entry per node.
    pub fn community_index(&self) -> &[usize] {
        &self.index
    }

    /// Member lists of every community, ordered by community index.
    pub fn communities(&self) -> Vec<Vec<VInt>> {
        let mut members = vec![vec![]; self.count];
        for (vertex, &comm) in self.index.iter().enumerate() {
            members[comm].push(vertex as VInt);
        }
        members
    }
}

/// Undirected simple graph over the contiguous node ids `0..v_size`.
#[derive(Debug, Clone)]
pub struct Graph {
    pub(crate) adj_map: BTreeMap<VInt, Vec<VInt>>, // Sorted, deduplicated neighbor lists.
    pub(crate) v_size: u32, // Node count.
    pub(crate) e_size: u32, // Undirected edge count.
    ground_truth: Option<GroundTruth>, // Optional planted communities.
}

impl Graph {
    /// Build a graph from an edge list. Self loops are dropped and parallel
    /// edges collapse into one.
    pub fn from_edges(
        node_count: u32,
        edges: impl IntoIterator<Item = (VInt, VInt)>,
    ) -> Result<Graph> {
        let mut adj_map: BTreeMap<VInt, Vec<VInt>> =
            (0..node_count).map(|v| (v, vec![])).collect();
        for (src, dst) in edges {
            for vertex in [src, dst] {
                if vertex >= node_count {
                    return Err(SepNodeError::NodeOutOfBounds {
                        node: vertex,
                        node_count: node_count as usize,
                    });
                }
            }
            if src == dst {
                continue;
            }
            adj_map.entry(src).or_default().push(dst);
            adj_map.entry(dst).or_default().push(src);
        }

        let mut e_size = 0u32;
        for neighbors in adj_map.values_mut() {
            neighbors.sort_unstable();
            neighbors.dedup();
            e_size += neighbors.len() as u32;
        }

        Ok(Graph {
            adj_map,
            v_size: node_count,
            e_size: e_size / 2,
            ground_truth: None,
        })
    }

    /// Attach ground-truth communities, one entry per node.
    pub fn with_ground_truth(mut self, ground_truth: GroundTruth) -> Result<Graph> {
        if ground_truth.len() != self.v_size as usize {
            return Err(SepNodeError::InvalidArgument(format!(
                "ground truth covers {} nodes, graph has {}",
                ground_truth.len(),
                self.v_size
            )));
        }
        self.ground_truth = Some(ground_truth);
        Ok(self)
    }

    pub fn v_size(&self) -> usize {
        self.v_size as usize
    }

    pub fn e_size(&self) -> usize {
        self.e_size as usize
    }

    pub fn nodes(&self) -> impl Iterator<Item = VInt> {
        0..self.v_size
    }

    /// Every undirected edge once, as `(u, v)` with `u < v`, in ascending order.
    pub fn edges(&self) -> impl Iterator<Item = (VInt, VInt)> + '_ {
        self.adj_map.iter().flat_map(|(&vertex, neighbors)| {
            neighbors
                .iter()
                .filter(move |&&neighbor| vertex < neighbor)
                .map(move |&neighbor| (vertex, neighbor))
        })
    }

    pub fn get_neighbor(&self, vertex: &VInt) -> &[VInt] {
        self.adj_map.get(vertex).map(Vec::as_slice).unwrap_or(&[])
    }

    #[inline]
    pub fn degree(&self, vertex: &VInt) -> usize {
        self.get_neighbor(vertex).len()
    }

    pub fn has_edge(&self, src: &VInt, dst: &VInt) -> bool {
        self.get_neighbor(src).binary_search(dst).is_ok()
    }

    pub fn ground_truth(&self) -> Option<&GroundTruth> {
        self.ground_truth.as_ref()
    }

    pub(crate) fn require_ground_truth(&self) -> Result<&GroundTruth> {
        self.ground_truth.as_ref().ok_or(SepNodeError::MissingGroundTruth)
    }

    pub(crate) fn check_node(&self, vertex: VInt) -> Result<()> {
        if vertex >= self.v_size {
            return Err(SepNodeError::NodeOutOfBounds {
                node: vertex,
                node_count: self.v_size as usize,
            });
        }
        Ok(())
    }

    pub(crate) fn check_non_empty(&self) -> Result<()> {
        if self.v_size == 0 {
            return Err(SepNodeError::EmptyGraph);
        }
        Ok(())
    }

    // Walk through the component of `start_vertex` restricted to `allowed` nodes.
    fn bfs_component(
        &self,
        start_vertex: VInt,
        allowed: &FixedBitSet,
        visited: &mut FixedBitSet,
        result: &mut Vec<VInt>,
    ) {
        let mut queue = VecDeque::new();
        queue.push_back(start_vertex);
        visited.insert(start_vertex as usize);

        while let Some(v) = queue.pop_front() {
            result.push(v);
            for &neighbor in self.get_neighbor(&v) {
                let idx = neighbor as usize;
                if allowed.contains(idx) && !visited.contains(idx) {
                    visited.insert(idx);
                    queue.push_back(neighbor);
                }
            }
        }
    }

    /// Connected components of the subgraph induced by the `allowed` nodes.
    /// Components come out ordered by their smallest node, members sorted.
    pub fn components_within(&self, allowed: &FixedBitSet) -> Vec<Vec<VInt>> {
        let mut visited = FixedBitSet::with_capacity(self.v_size as usize);
        let mut components = vec![];
        for vertex in allowed.ones() {
            if !visited.contains(vertex) {
                let mut component = vec![];
                self.bfs_component(vertex as VInt, allowed, &mut visited, &mut component);
                component.sort_unstable();
                components.push(component);
            }
        }
        components
    }

    /// Connected components of the whole graph.
    pub fn wcc(&self) -> Vec<Vec<VInt>> {
        let mut all = FixedBitSet::with_capacity(self.v_size as usize);
        all.insert_range(..);
        self.components_within(&all)
    }
}

#[cfg(test)]
mod graph_test {
    use std::collections::BTreeSet;

    use fixedbitset::FixedBitSet;

    use crate::error::SepNodeError;
    use crate::graph::{Graph, GroundTruth};

    #[test]
    fn test_from_edges_dedup_and_self_loops() {
        let graph = Graph::from_edges(4, [(0, 1), (1, 0), (1, 2), (2, 2), (2, 3)]).unwrap();
        assert_eq!(graph.v_size(), 4);
        assert_eq!(graph.e_size(), 3);
        assert_eq!(graph.get_neighbor(&1), &[0, 2]);
        assert_eq!(graph.degree(&2), 2);
        assert!(graph.has_edge(&3, &2));
        assert!(!graph.has_edge(&0, &3));
        assert_eq!(graph.edges().collect::<Vec<_>>(), vec![(0, 1), (1, 2), (2, 3)]);
    }

    #[test]
    fn test_out_of_bounds_edge() {
        let err = Graph::from_edges(2, [(0, 5)]).unwrap_err();
        assert!(matches!(err, SepNodeError::NodeOutOfBounds { node: 5, node_count: 2 }));
    }

    #[test]
    fn test_components_within() {
        let graph = Graph::from_edges(6, [(0, 1), (1, 2), (3, 4)]).unwrap();
        assert_eq!(graph.wcc(), vec![vec![0, 1, 2], vec![3, 4], vec![5]]);

        let mut allowed = FixedBitSet::with_capacity(6);
        for v in [0, 2, 3, 4] {
            allowed.insert(v);
        }
        assert_eq!(graph.components_within(&allowed), vec![vec![0], vec![2], vec![3, 4]]);
    }

    #[test]
    fn test_ground_truth_normalization() {
        let blocks = GroundTruth::from_blocks(&[7, 7, 3, 9, 3]);
        assert_eq!(blocks.community_index(), &[0, 0, 1, 2, 1]);
        assert_eq!(blocks.community_count(), 3);
        assert_eq!(blocks.communities(), vec![vec![0, 1], vec![2, 4], vec![3]]);

        let a: BTreeSet<u32> = [0, 1].into_iter().collect();
        let b: BTreeSet<u32> = [2].into_iter().collect();
        let sets = GroundTruth::from_member_sets(&[a.clone(), a, b]);
        assert_eq!(sets.community_index(), &[0, 0, 1]);
    }

    #[test]
    fn test_ground_truth_size_mismatch() {
        let graph = Graph::from_edges(3, [(0, 1)]).unwrap();
        assert!(graph.with_ground_truth(GroundTruth::from_blocks(&[0, 1])).is_err());
    }
}

//! Layered breadth-first exploration around a single edge.
//!
//! Both endpoints of the analyzed edge `(v, w)` form layer 0 and the edge
//! itself is left out of the walk. Layers are expanded one at a time, so a
//! node's depth and subtree root only depend on which nodes sit in the
//! previous layer, never on the order siblings are visited in.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use derive_more::Display;

use crate::error::{Result, SepNodeError};
use crate::graph::{Graph, VInt};

/// Which frontier(s) reached a node first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum SubtreeRoot {
    V,
    W,
    Both,
}

impl SubtreeRoot {
    /// Join of two tags: equal tags stay, different tags become `Both`.
    #[inline]
    pub fn merge(self, other: SubtreeRoot) -> SubtreeRoot {
        if self == other {
            self
        } else {
            SubtreeRoot::Both
        }
    }
}

/// Depth counted in half steps. Node layers sit on even values, edges between
/// two consecutive layers on the odd value in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HalfDepth(pub u32);

impl HalfDepth {
    #[inline]
    pub fn of_layer(depth: u32) -> HalfDepth {
        HalfDepth(2 * depth)
    }

    #[inline]
    pub fn between(depth: u32) -> HalfDepth {
        HalfDepth(2 * depth + 1)
    }

    pub fn is_integer(self) -> bool {
        self.0 % 2 == 0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 2.0
    }
}

impl fmt::Display for HalfDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_integer() {
            write!(f, "{}", self.0 / 2)
        } else {
            write!(f, "{}.5", self.0 / 2)
        }
    }
}

#[inline]
fn edge_key(a: VInt, b: VInt) -> (VInt, VInt) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// The result of exploring around one edge. Created and dropped per edge.
#[derive(Debug, Clone)]
pub struct Layering {
    pub v: VInt,
    pub w: VInt,
    pub max_depth: u32,
    node_depth: HashMap<VInt, u32>, // Depth of every reached node.
    nodes_in_layers: Vec<BTreeSet<VInt>>, // Nodes per depth, 0..=max_depth.
    edges_in_layers: Vec<BTreeSet<(VInt, VInt)>>, // Edges per half depth, 0..2*max_depth.
    edge_depth: HashMap<(VInt, VInt), HalfDepth>, // Keyed by (min, max).
    subtree_root: HashMap<VInt, SubtreeRoot>,
}

impl Layering {
    pub fn node_depth(&self, vertex: VInt) -> Option<u32> {
        self.node_depth.get(&vertex).copied()
    }

    pub fn subtree_root(&self, vertex: VInt) -> Option<SubtreeRoot> {
        self.subtree_root.get(&vertex).copied()
    }

    /// Nodes at `depth`; empty past the explored range.
    pub fn nodes_at(&self, depth: u32) -> &BTreeSet<VInt> {
        static EMPTY: BTreeSet<VInt> = BTreeSet::new();
        self.nodes_in_layers.get(depth as usize).unwrap_or(&EMPTY)
    }

    /// Edges recorded at a half depth. Same-layer edges are stored as
    /// `(min, max)`, edges between layers as `(parent, child)`.
    pub fn edges_at(&self, depth: HalfDepth) -> &BTreeSet<(VInt, VInt)> {
        static EMPTY: BTreeSet<(VInt, VInt)> = BTreeSet::new();
        self.edges_in_layers.get(depth.0 as usize).unwrap_or(&EMPTY)
    }

    pub fn edge_depth(&self, a: VInt, b: VInt) -> Option<HalfDepth> {
        self.edge_depth.get(&edge_key(a, b)).copied()
    }

    /// Number of half-depth edge layers, `0.5` up to `max_depth - 0.5`.
    pub fn edge_layer_count(&self) -> u32 {
        2 * self.max_depth - 1
    }

    /// Edges recorded at `depth` touching `vertex`.
    pub(crate) fn incident_at(&self, vertex: VInt, depth: HalfDepth) -> usize {
        self.edges_at(depth)
            .iter()
            .filter(|&&(a, b)| a == vertex || b == vertex)
            .count()
    }
}

/// Explore the neighborhood of the adjacent pair `(v, w)` up to `max_depth`
/// layers, ignoring the edge between them. The graph itself is never touched.
///
/// No node lies `v_size` or more layers out, so deeper requests are clamped to
/// the node count.
pub fn explore(graph: &Graph, v: VInt, w: VInt, max_depth: u32) -> Result<Layering> {
    graph.check_non_empty()?;
    graph.check_node(v)?;
    graph.check_node(w)?;
    if max_depth < 1 {
        return Err(SepNodeError::InvalidArgument(format!(
            "exploration depth must be at least 1, got {}",
            max_depth
        )));
    }
    if v == w || !graph.has_edge(&v, &w) {
        return Err(SepNodeError::NotAdjacent { v, w });
    }
    let max_depth = max_depth.min(graph.v_size);
    let excluded = edge_key(v, w);

    let mut layering = Layering {
        v,
        w,
        max_depth,
        node_depth: HashMap::new(),
        nodes_in_layers: vec![BTreeSet::new(); max_depth as usize + 1],
        edges_in_layers: vec![BTreeSet::new(); 2 * max_depth as usize],
        edge_depth: HashMap::new(),
        subtree_root: HashMap::new(),
    };
    layering.node_depth.insert(v, 0);
    layering.node_depth.insert(w, 0);
    layering.nodes_in_layers[0].extend([v, w]);
    layering.subtree_root.insert(v, SubtreeRoot::V);
    layering.subtree_root.insert(w, SubtreeRoot::W);
    layering.edge_depth.insert(excluded, HalfDepth(0));

    for depth in 0..max_depth {
        // The whole layer is expanded before the next one is touched.
        let frontier: Vec<VInt> = layering.nodes_in_layers[depth as usize].iter().copied().collect();
        for node in frontier {
            let node_root = layering.subtree_root[&node];
            for &neighbor in graph.get_neighbor(&node) {
                if edge_key(node, neighbor) == excluded {
                    continue;
                }
                match layering.node_depth.get(&neighbor).copied() {
                    None => {
                        // Previously unseen.
                        layering.node_depth.insert(neighbor, depth + 1);
                        layering.nodes_in_layers[depth as usize + 1].insert(neighbor);
                        layering.subtree_root.insert(neighbor, node_root);
                        record_edge(&mut layering, HalfDepth::between(depth), (node, neighbor));
                    }
                    Some(d) if d == depth => {
                        // Same layer, stored once per unordered pair.
                        record_edge(&mut layering, HalfDepth::of_layer(depth), edge_key(node, neighbor));
                    }
                    Some(d) if d == depth + 1 => {
                        // Reached again from this layer, possibly from the other side.
                        record_edge(&mut layering, HalfDepth::between(depth), (node, neighbor));
                        if let Some(root) = layering.subtree_root.get_mut(&neighbor) {
                            *root = root.merge(node_root);
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    Ok(layering)
}

fn record_edge(layering: &mut Layering, depth: HalfDepth, edge: (VInt, VInt)) {
    layering.edges_in_layers[depth.0 as usize].insert(edge);
    layering.edge_depth.insert(edge_key(edge.0, edge.1), depth);
}

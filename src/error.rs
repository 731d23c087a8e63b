use thiserror::Error;

use crate::graph::VInt;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, SepNodeError>;

/// Errors raised on malformed input. The algorithms themselves have no
/// failure modes once their input passes these checks.
#[derive(Error, Debug)]
pub enum SepNodeError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Graph has no nodes")]
    EmptyGraph,

    #[error("Node {node} out of bounds (graph has {node_count} nodes)")]
    NodeOutOfBounds { node: VInt, node_count: usize },

    #[error("Nodes {v} and {w} are not adjacent")]
    NotAdjacent { v: VInt, w: VInt },

    #[error("Graph carries no ground-truth communities")]
    MissingGroundTruth,

    #[error("Classification covers {found} nodes, graph has {expected}")]
    ClassificationSize { expected: usize, found: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
}

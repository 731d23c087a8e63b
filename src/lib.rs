//! Community detection through separation nodes.
//!
//! Each edge is scored by how well its neighborhood connects its endpoints,
//! the scores become a QUBO over one "keep" bit per node, and minimizing it
//! marks the separation nodes. Their removal leaves the community cores, over
//! which the separators are then greedily redistributed.

pub mod classification;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod graph;
pub mod greedy_assign;
pub mod layering;
pub mod logger;
pub mod metrics;
pub mod qubo;
pub mod reference;
pub mod solver;
pub mod validator;

use log::info;
use rand::Rng;

pub use crate::classification::Classification;
pub use crate::config::RunConfig;
pub use crate::error::{Result, SepNodeError};
pub use crate::graph::{Graph, GroundTruth, VInt};
pub use crate::greedy_assign::{assign_communities, CommunityPartition};
pub use crate::solver::{anneal, AnnealOutcome, Annealer};
pub use crate::validator::{validate, ViolationTriple};

use crate::config::DEFAULT_SWEEPS;
use crate::connectivity::{score_all_edges, score_all_edges_parallel};
use crate::qubo::build_from_scores;
use crate::solver::{check_budget, minimize};

/// Classify every node as separator or member.
///
/// Scores all edges at `depth` with `damping`, builds the QUBO and minimizes
/// it over `reads` sampler reads.
pub fn classify<R: Rng + ?Sized>(
    graph: &Graph,
    depth: u32,
    damping: f64,
    reads: usize,
    rng: &mut R,
) -> Result<Classification> {
    classify_with_sweeps(graph, depth, damping, reads, DEFAULT_SWEEPS, false, rng)
}

/// [`classify`] with the parameters of a [`RunConfig`]. The edge sweep runs
/// on the rayon pool when `config.parallel` is set.
pub fn classify_with_config<R: Rng + ?Sized>(graph: &Graph, config: &RunConfig, rng: &mut R) -> Result<Classification> {
    classify_with_sweeps(
        graph,
        config.depth,
        config.damping,
        config.reads,
        config.sweeps,
        config.parallel,
        rng,
    )
}

fn classify_with_sweeps<R: Rng + ?Sized>(
    graph: &Graph,
    depth: u32,
    damping: f64,
    reads: usize,
    sweeps: usize,
    parallel: bool,
    rng: &mut R,
) -> Result<Classification> {
    if depth < 1 {
        return Err(SepNodeError::InvalidArgument(format!(
            "exploration depth must be at least 1, got {}",
            depth
        )));
    }
    check_budget(reads, sweeps)?;
    let scores = if parallel {
        score_all_edges_parallel(graph, depth, damping)?
    } else {
        score_all_edges(graph, depth, damping)?
    };
    let qubo = build_from_scores(graph, &scores)?;
    let sample = minimize(&qubo, reads, sweeps, rng)?;
    info!(
        "Classified {} nodes: {} separators, energy {}",
        graph.v_size(),
        sample.state.separator_count(),
        sample.energy
    );
    Ok(sample.state)
}

#[cfg(test)]
mod lib_test {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::config::DEFAULT_READS;
    use crate::{
        assign_communities, classify, classify_with_config, validate, Graph, GroundTruth, RunConfig, SepNodeError,
    };

    // Two 5-cliques {0..4} and {5..9} joined by the edge 4-5.
    fn two_cliques() -> Graph {
        let mut edges = vec![];
        for base in [0u32, 5] {
            for a in base..base + 5 {
                for b in a + 1..base + 5 {
                    edges.push((a, b));
                }
            }
        }
        edges.push((4, 5));
        Graph::from_edges(10, edges)
            .unwrap()
            .with_ground_truth(GroundTruth::from_blocks(&[0, 0, 0, 0, 0, 1, 1, 1, 1, 1]))
            .unwrap()
    }

    // Two 10-cliques {0..9} and {10..19} joined by the edge 9-10.
    fn two_large_cliques() -> Graph {
        let mut edges = vec![];
        for base in [0u32, 10] {
            for a in base..base + 10 {
                for b in a + 1..base + 10 {
                    edges.push((a, b));
                }
            }
        }
        edges.push((9, 10));
        let blocks: Vec<u32> = (0..20).map(|v| v / 10).collect();
        Graph::from_edges(20, edges)
            .unwrap()
            .with_ground_truth(GroundTruth::from_blocks(&blocks))
            .unwrap()
    }

    #[test]
    fn test_pipeline_end_to_end() {
        let graph = two_cliques();
        let mut rng = StdRng::seed_from_u64(42);
        let classification = classify(&graph, 2, 0.5, 10, &mut rng).unwrap();
        assert_eq!(classification.len(), 10);
        // The bridge endpoints cannot both stay members.
        assert!(classification.is_separator(4) || classification.is_separator(5));

        let partition = assign_communities(&graph, &classification).unwrap();
        assert!(partition.is_partition_of(10));
        // Three members survive on each side, so the cores match the cliques.
        let violations = validate(&graph, &classification).unwrap();
        assert!(violations.is_zero(), "got {}", violations);
        assert_eq!(partition.len(), 2);
    }

    #[test]
    fn test_classify_is_reproducible() {
        let graph = two_cliques();
        let first = classify(&graph, 2, 0.5, 3, &mut StdRng::seed_from_u64(7)).unwrap();
        let second = classify(&graph, 2, 0.5, 3, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_classify_rejects_bad_input() {
        let graph = two_cliques();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(classify(&graph, 0, 0.5, 1, &mut rng), Err(SepNodeError::InvalidArgument(_))));
        let empty = Graph::from_edges(0, Vec::new()).unwrap();
        assert!(matches!(classify(&empty, 2, 0.5, 1, &mut rng), Err(SepNodeError::EmptyGraph)));
    }

    #[test]
    fn test_pipeline_through_sampler() {
        // 20 nodes is past the exact limit, so the sampler does the work.
        let graph = two_large_cliques();
        let mut rng = StdRng::seed_from_u64(0);
        let classification = classify(&graph, 2, 0.5, DEFAULT_READS, &mut rng).unwrap();
        assert_eq!(classification.len(), 20);
        let violations = validate(&graph, &classification).unwrap();
        assert!(violations.is_zero(), "got {}", violations);

        let partition = assign_communities(&graph, &classification).unwrap();
        assert!(partition.is_partition_of(20));
        assert_eq!(partition.len(), 2);
    }

    #[test]
    fn test_parallel_config_gives_same_classification() {
        let graph = two_large_cliques();
        let sequential = RunConfig::default();
        let parallel = RunConfig {
            parallel: true,
            ..RunConfig::default()
        };
        let first = classify_with_config(&graph, &sequential, &mut StdRng::seed_from_u64(3)).unwrap();
        let second = classify_with_config(&graph, &parallel, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_budget_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        // Small graphs take the exact path, which must still refuse zero reads.
        assert!(matches!(
            classify(&two_cliques(), 2, 0.5, 0, &mut rng),
            Err(SepNodeError::InvalidArgument(_))
        ));
        let no_sweeps = RunConfig {
            sweeps: 0,
            ..RunConfig::default()
        };
        for graph in [two_cliques(), two_large_cliques()] {
            assert!(matches!(
                classify_with_config(&graph, &no_sweeps, &mut rng),
                Err(SepNodeError::InvalidArgument(_))
            ));
        }
    }
}

//! Quality measures of a node labeling.

use std::collections::HashMap;

use crate::error::{Result, SepNodeError};
use crate::graph::Graph;

/// Newman modularity of `membership` (community index per node) on `graph`.
///
/// A graph without edges has modularity 0.
pub fn modularity(graph: &Graph, membership: &[usize]) -> Result<f64> {
    if membership.len() != graph.v_size() {
        return Err(SepNodeError::ClassificationSize {
            expected: graph.v_size(),
            found: membership.len(),
        });
    }
    let total_weight = graph.e_size() as f64;
    if total_weight == 0.0 {
        return Ok(0.0);
    }
    let mut internal: HashMap<usize, f64> = HashMap::new();
    let mut degrees: HashMap<usize, f64> = HashMap::new();
    for (vertex, neighbors) in &graph.adj_map {
        let community = membership[*vertex as usize];
        *degrees.entry(community).or_default() += neighbors.len() as f64;
        for neighbor in neighbors {
            if membership[*neighbor as usize] == community {
                *internal.entry(community).or_default() += 1.0;
            }
        }
    }
    let q = degrees
        .iter()
        .map(|(community, degree)| {
            // Every internal edge was counted from both endpoints.
            let inside = internal.get(community).copied().unwrap_or(0.0) / 2.0;
            inside / total_weight - (degree / (2.0 * total_weight)).powi(2)
        })
        .sum();
    Ok(q)
}

fn entropy(counts: impl Iterator<Item = usize>, total: f64) -> f64 {
    counts
        .filter(|&count| count > 0)
        .map(|count| {
            let p = count as f64 / total;
            -p * p.ln()
        })
        .sum()
}

/// Normalized mutual information of two labelings, arithmetic normalization.
///
/// Two labelings that both put everything in one cluster score 1.
pub fn nmi(predicted: &[usize], truth: &[usize]) -> Result<f64> {
    if predicted.len() != truth.len() {
        return Err(SepNodeError::InvalidArgument(format!(
            "labelings differ in length: {} and {}",
            predicted.len(),
            truth.len()
        )));
    }
    if predicted.is_empty() {
        return Ok(1.0);
    }
    let total = predicted.len() as f64;
    let mut joint: HashMap<(usize, usize), usize> = HashMap::new();
    let mut left: HashMap<usize, usize> = HashMap::new();
    let mut right: HashMap<usize, usize> = HashMap::new();
    for (&a, &b) in predicted.iter().zip(truth) {
        *joint.entry((a, b)).or_default() += 1;
        *left.entry(a).or_default() += 1;
        *right.entry(b).or_default() += 1;
    }
    if left.len() == 1 && right.len() == 1 {
        return Ok(1.0);
    }

    let mutual: f64 = joint
        .iter()
        .map(|(&(a, b), &count)| {
            let p = count as f64 / total;
            let independent = left[&a] as f64 * right[&b] as f64 / (total * total);
            p * (p / independent).ln()
        })
        .sum();
    let h_left = entropy(left.values().copied(), total);
    let h_right = entropy(right.values().copied(), total);
    let normalizer = (h_left + h_right) / 2.0;
    if normalizer <= f64::EPSILON {
        return Ok(0.0);
    }
    Ok((mutual / normalizer).clamp(0.0, 1.0))
}

/// Communities found per ground-truth community.
pub fn community_count_ratio(found: usize, truth: usize) -> Result<f64> {
    if truth == 0 {
        return Err(SepNodeError::InvalidArgument(
            "ground truth holds no community".to_owned(),
        ));
    }
    Ok(found as f64 / truth as f64)
}

#[cfg(test)]
mod metrics_test {
    use crate::graph::Graph;
    use crate::metrics::{community_count_ratio, modularity, nmi};

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_modularity_of_two_triangles() {
        // Two triangles joined by the edge 2-3.
        let graph = Graph::from_edges(6, [(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5), (2, 3)]).unwrap();
        let q = modularity(&graph, &[0, 0, 0, 1, 1, 1]).unwrap();
        // Each side: 3 internal edges of 7, degree sum 7 of 14.
        let expected = 2.0 * (3.0 / 7.0 - 0.25);
        assert!((q - expected).abs() < EPSILON);
        assert!(modularity(&graph, &[0; 6]).unwrap().abs() < EPSILON);
        assert!(modularity(&graph, &[0; 5]).is_err());
    }

    #[test]
    fn test_nmi() {
        assert!((nmi(&[0, 0, 1, 1], &[1, 1, 0, 0]).unwrap() - 1.0).abs() < EPSILON);
        assert!(nmi(&[0, 1, 0, 1], &[0, 0, 1, 1]).unwrap().abs() < EPSILON);
        assert_eq!(nmi(&[3, 3, 3], &[0, 0, 0]).unwrap(), 1.0);
        assert_eq!(nmi(&[0, 0, 0], &[0, 1, 2]).unwrap(), 0.0);
        let partial = nmi(&[0, 0, 1, 1, 1, 1], &[0, 0, 0, 1, 1, 1]).unwrap();
        assert!(partial > 0.0 && partial < 1.0);
        assert!(nmi(&[0], &[0, 1]).is_err());
    }

    #[test]
    fn test_community_count_ratio() {
        assert_eq!(community_count_ratio(3, 2).unwrap(), 1.5);
        assert!(community_count_ratio(3, 0).is_err());
    }
}

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Result, SepNodeError};
use crate::graph::{Graph, GroundTruth, VInt};

const READ_BUFFER_SIZE: usize = 1024 * 1024;

fn parse_token<T: std::str::FromStr>(token: Option<&str>, line: usize, what: &str) -> Result<T> {
    let token = token.ok_or_else(|| SepNodeError::Parse {
        line,
        message: format!("missing {}", what),
    })?;
    token.parse().map_err(|_| SepNodeError::Parse {
        line,
        message: format!("invalid {} '{}'", what, token),
    })
}

impl Graph {
    /// Load a graph from a `.graph` file.
    ///
    /// The first line is a header and is skipped. `v <id> <label> [<community>]`
    /// declares a node, `e <src> <dst>` an undirected edge. Node ids must be
    /// contiguous from 0. When every node carries a community the graph gets
    /// ground truth attached.
    pub fn from_graph_file(file_path: &Path) -> Result<Graph> {
        let graph_file = File::open(file_path)?;
        Self::from_graph_reader(BufReader::with_capacity(READ_BUFFER_SIZE, graph_file))
    }

    pub fn from_graph_reader(reader: impl BufRead) -> Result<Graph> {
        let mut vertices = Vec::<(VInt, Option<u32>)>::new();
        let mut edges = Vec::<(VInt, VInt)>::new();

        for (index, line) in reader.lines().enumerate() {
            let line_no = index + 1;
            let line = line?;
            if line_no == 1 {
                // The header line, just skip it.
                continue;
            }
            let mut tokens = line.split_whitespace();
            match tokens.next() {
                None => continue,
                Some(tag) if tag.starts_with('#') => continue,
                Some("v") => {
                    let vertex_id = parse_token(tokens.next(), line_no, "vertex id")?;
                    // The label column is carried by the format but unused here.
                    let _label: u32 = parse_token(tokens.next(), line_no, "vertex label")?;
                    let community = match tokens.next() {
                        Some(token) => Some(parse_token(Some(token), line_no, "community")?),
                        None => None,
                    };
                    vertices.push((vertex_id, community));
                }
                Some("e") => {
                    let src = parse_token(tokens.next(), line_no, "source id")?;
                    let dst = parse_token(tokens.next(), line_no, "target id")?;
                    edges.push((src, dst));
                }
                Some(other) => {
                    return Err(SepNodeError::Parse {
                        line: line_no,
                        message: format!("unknown record '{}'", other),
                    })
                }
            }
        }

        vertices.sort_unstable_by_key(|(vertex_id, _)| *vertex_id);
        for (expected, (vertex_id, _)) in vertices.iter().enumerate() {
            if *vertex_id as usize != expected {
                return Err(SepNodeError::InvalidArgument(format!(
                    "vertex ids must be contiguous from 0, found {} at position {}",
                    vertex_id, expected
                )));
            }
        }

        let graph = Graph::from_edges(vertices.len() as u32, edges)?;
        let communities: Vec<Option<u32>> = vertices.iter().map(|(_, c)| *c).collect();
        if communities.iter().all(Option::is_none) {
            return Ok(graph);
        }
        let blocks: Option<Vec<u32>> = communities.into_iter().collect();
        match blocks {
            Some(blocks) => graph.with_ground_truth(GroundTruth::from_blocks(&blocks)),
            None => Err(SepNodeError::InvalidArgument(
                "either every vertex or none must carry a community".to_owned(),
            )),
        }
    }
}

#[cfg(test)]
mod loader_test {
    use std::io::Cursor;

    use crate::error::SepNodeError;
    use crate::graph::Graph;

    #[test]
    fn test_load_with_communities() {
        let text = "t 1 4\nv 0 0 5\nv 1 0 5\n\n# a comment\nv 3 0 8\nv 2 0 8\ne 0 1\ne 1 2\ne 2 3\n";
        let graph = Graph::from_graph_reader(Cursor::new(text)).unwrap();
        assert_eq!(graph.v_size(), 4);
        assert_eq!(graph.e_size(), 3);
        let gt = graph.ground_truth().unwrap();
        assert_eq!(gt.community_index(), &[0, 0, 1, 1]);
    }

    #[test]
    fn test_load_without_communities() {
        let text = "t 1 2\nv 0 0\nv 1 0\ne 0 1\n";
        let graph = Graph::from_graph_reader(Cursor::new(text)).unwrap();
        assert!(graph.ground_truth().is_none());
    }

    #[test]
    fn test_load_errors() {
        let gap = "t\nv 0 0\nv 2 0\n";
        assert!(matches!(
            Graph::from_graph_reader(Cursor::new(gap)),
            Err(SepNodeError::InvalidArgument(_))
        ));

        let bad = "t\nv 0 0\ne 0 x\n";
        assert!(matches!(
            Graph::from_graph_reader(Cursor::new(bad)),
            Err(SepNodeError::Parse { line: 3, .. })
        ));

        let mixed = "t\nv 0 0 1\nv 1 0\n";
        assert!(Graph::from_graph_reader(Cursor::new(mixed)).is_err());
    }
}

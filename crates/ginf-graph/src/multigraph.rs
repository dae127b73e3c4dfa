use std::collections::BTreeMap;

use ginf_core::errors::{ErrorInfo, GinfError};
use ginf_core::Edge;

/// Undirected multigraph over the vertices `0..size`.
///
/// Edges are stored as a map from canonical vertex pair to multiplicity; a
/// pair is absent exactly when its multiplicity is zero. Whether self-loops or
/// parallel edges are admissible is decided by the model, not by this value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Multigraph {
    size: usize,
    edges: BTreeMap<Edge, usize>,
}

impl Multigraph {
    /// Creates an empty graph with `size` vertices.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            edges: BTreeMap::new(),
        }
    }

    /// Builds a graph from `(i, j, multiplicity)` triples.
    pub fn from_edge_list(size: usize, edges: &[(usize, usize, usize)]) -> Result<Self, GinfError> {
        let mut graph = Self::new(size);
        for &(i, j, multiplicity) in edges {
            graph.add_multiedge(i, j, multiplicity)?;
        }
        Ok(graph)
    }

    /// Number of vertices.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Adds one edge between `i` and `j`.
    pub fn add_edge(&mut self, i: usize, j: usize) -> Result<(), GinfError> {
        self.add_multiedge(i, j, 1)
    }

    /// Adds `multiplicity` parallel edges between `i` and `j`.
    pub fn add_multiedge(&mut self, i: usize, j: usize, multiplicity: usize) -> Result<(), GinfError> {
        self.check_vertex(i)?;
        self.check_vertex(j)?;
        if multiplicity > 0 {
            self.bump(Edge::new(i, j), multiplicity);
        }
        Ok(())
    }

    /// Removes one edge between `i` and `j`. Returns `false` when the pair was absent.
    pub fn remove_edge(&mut self, i: usize, j: usize) -> Result<bool, GinfError> {
        self.check_vertex(i)?;
        self.check_vertex(j)?;
        let edge = Edge::new(i, j);
        match self.edges.get_mut(&edge) {
            Some(count) if *count > 1 => {
                *count -= 1;
                Ok(true)
            }
            Some(_) => {
                self.edges.remove(&edge);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Sets the multiplicity of the pair `{i, j}`, removing it when zero.
    pub fn set_multiplicity(&mut self, i: usize, j: usize, multiplicity: usize) -> Result<(), GinfError> {
        self.check_vertex(i)?;
        self.check_vertex(j)?;
        let edge = Edge::new(i, j);
        if multiplicity == 0 {
            self.edges.remove(&edge);
        } else {
            self.edges.insert(edge, multiplicity);
        }
        Ok(())
    }

    /// Multiplicity of the pair `{i, j}`, zero when absent.
    pub fn multiplicity(&self, i: usize, j: usize) -> usize {
        self.edge_multiplicity(Edge::new(i, j))
    }

    /// Multiplicity of a canonical pair, zero when absent.
    pub fn edge_multiplicity(&self, edge: Edge) -> usize {
        self.edges.get(&edge).copied().unwrap_or(0)
    }

    /// Iterates present edges with their multiplicity in canonical order.
    pub fn edges(&self) -> impl Iterator<Item = (Edge, usize)> + '_ {
        self.edges.iter().map(|(edge, count)| (*edge, *count))
    }

    /// Total number of edges, counting parallel edges separately.
    pub fn edge_count(&self) -> usize {
        self.edges.values().sum()
    }

    /// Number of vertex pairs with at least one edge.
    pub fn distinct_edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns `true` when some vertex carries a self-loop.
    pub fn has_self_loops(&self) -> bool {
        self.edges.keys().any(Edge::is_self_loop)
    }

    /// Returns `true` when some pair has multiplicity greater than one.
    pub fn has_parallel_edges(&self) -> bool {
        self.edges.values().any(|&count| count > 1)
    }

    /// Symmetric adjacency matrix; entries are multiplicities or 0/1 indicators.
    pub fn adjacency_matrix(&self, with_counts: bool) -> Vec<Vec<usize>> {
        let mut matrix = vec![vec![0usize; self.size]; self.size];
        for (edge, count) in self.edges() {
            let value = if with_counts { count } else { 1 };
            let (i, j) = edge.endpoints();
            matrix[i][j] = value;
            matrix[j][i] = value;
        }
        matrix
    }

    pub(crate) fn bump(&mut self, edge: Edge, multiplicity: usize) {
        *self.edges.entry(edge).or_insert(0) += multiplicity;
    }

    fn check_vertex(&self, vertex: usize) -> Result<(), GinfError> {
        if vertex < self.size {
            Ok(())
        } else {
            Err(GinfError::Graph(
                ErrorInfo::new("vertex-out-of-range", "vertex index exceeds graph size")
                    .with_context("vertex", vertex.to_string())
                    .with_context("size", self.size.to_string()),
            ))
        }
    }
}

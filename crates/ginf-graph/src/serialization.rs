use ginf_core::errors::{ErrorInfo, GinfError};
use serde::{Deserialize, Serialize};

use crate::multigraph::Multigraph;

/// Portable encoding of a graph as a node list and an edge list with multiplicity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphRecord {
    /// Every vertex of the graph.
    pub nodelist: Vec<usize>,
    /// Present pairs as `(i, j, multiplicity)` with `i <= j`.
    pub edgelist: Vec<(usize, usize, usize)>,
}

impl GraphRecord {
    /// Encodes the provided graph.
    pub fn from_graph(graph: &Multigraph) -> Self {
        Self {
            nodelist: (0..graph.size()).collect(),
            edgelist: graph
                .edges()
                .map(|(edge, count)| (edge.first(), edge.second(), count))
                .collect(),
        }
    }

    /// Decodes the record; the vertex count is one past the largest listed vertex.
    pub fn into_graph(self) -> Result<Multigraph, GinfError> {
        let size = self.nodelist.iter().max().map_or(0, |max| max + 1);
        Multigraph::from_edge_list(size, &self.edgelist).map_err(|err| {
            GinfError::Serde(
                ErrorInfo::new("graph-record-invalid", err.info().message.clone())
                    .with_context("size", size.to_string()),
            )
        })
    }
}

/// Serializes the graph to a compact binary representation using `bincode`.
pub fn graph_to_bytes(graph: &Multigraph) -> Result<Vec<u8>, GinfError> {
    bincode::serialize(&GraphRecord::from_graph(graph))
        .map_err(|err| GinfError::Serde(ErrorInfo::new("serialize-bytes", err.to_string())))
}

/// Restores a graph from its binary representation.
pub fn graph_from_bytes(bytes: &[u8]) -> Result<Multigraph, GinfError> {
    let record: GraphRecord = bincode::deserialize(bytes)
        .map_err(|err| GinfError::Serde(ErrorInfo::new("deserialize-bytes", err.to_string())))?;
    record.into_graph()
}

/// Serializes the graph to a JSON string.
pub fn graph_to_json(graph: &Multigraph) -> Result<String, GinfError> {
    serde_json::to_string_pretty(&GraphRecord::from_graph(graph))
        .map_err(|err| GinfError::Serde(ErrorInfo::new("serialize-json", err.to_string())))
}

/// Restores a graph from a JSON string.
pub fn graph_from_json(json: &str) -> Result<Multigraph, GinfError> {
    let record: GraphRecord = serde_json::from_str(json)
        .map_err(|err| GinfError::Serde(ErrorInfo::new("deserialize-json", err.to_string())))?;
    record.into_graph()
}

use sha2::{Digest, Sha256};

use crate::multigraph::Multigraph;

/// Computes the canonical structural hash for the provided graph.
///
/// The hash covers the vertex count and every present pair with its
/// multiplicity, visited in canonical pair order.
pub fn canonical_hash(graph: &Multigraph) -> String {
    let mut hasher = Sha256::new();
    hasher.update((graph.size() as u64).to_le_bytes());
    hasher.update((graph.distinct_edge_count() as u64).to_le_bytes());
    for (edge, count) in graph.edges() {
        hasher.update((edge.first() as u64).to_le_bytes());
        hasher.update((edge.second() as u64).to_le_bytes());
        hasher.update((count as u64).to_le_bytes());
    }
    format!("{:x}", hasher.finalize())
}

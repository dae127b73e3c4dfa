#![deny(missing_docs)]

//! Undirected multigraphs, the external generative-model contract, and the
//! exhaustive enumeration of small graph and partition spaces.

mod enumerate;
mod hash;
pub mod model;
mod multigraph;
pub mod partition;
mod serialization;

pub use enumerate::{
    count_all_graphs, enumerate_all_graphs, enumerate_all_partitions, GraphEnumerator,
    PartitionEnumerator,
};
pub use hash::canonical_hash;
pub use model::{GenerativeModel, GibbsSummary, GraphModel, LabelModel, LabelState};
pub use multigraph::Multigraph;
pub use partition::{block_count, canonical_partition, reduce_nested_partition, reduce_partition};

/// Re-export serialization helpers for downstream crates.
pub use serialization::{graph_from_bytes, graph_from_json, graph_to_bytes, graph_to_json, GraphRecord};

#![deny(missing_docs)]

//! Edge-wise sufficient statistics learned from sampled graphs.
//!
//! [`EdgeCollector`] turns a stream of graphs into a factorized per-pair
//! multiplicity distribution that can be queried, scored against, sampled
//! from and persisted.

mod collector;
pub mod persistence;
pub mod scoring;

pub use collector::{CollectedGraph, EdgeCollector};
pub use persistence::{CollectorRecord, ScoreRecord};
pub use scoring::{PairwiseMetric, ScoreMetric};

//! Save/load support for [`EdgeCollector`].
//!
//! The persisted record carries the histograms, counts, totals and the
//! retained graphs. The collector's `epsilon` is a query setting and is
//! supplied again when loading.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use ginf_core::errors::{ErrorInfo, GinfError};
use ginf_core::Edge;
use ginf_graph::GraphRecord;
use serde::{Deserialize, Serialize};

use crate::collector::{CollectedGraph, EdgeCollector};

/// Histogram of one pair: `(i, j, [(multiplicity, observations)...])`.
pub type HistogramEntry = (usize, usize, Vec<(usize, u64)>);

/// Persisted score of a retained graph.
///
/// JSON has no literal for non-finite numbers, so they get their own variants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreRecord {
    /// Any finite score.
    Finite(f64),
    /// Positive infinity.
    PositiveInfinity,
    /// Negative infinity, the score of a graph with an unsupported edge.
    NegativeInfinity,
    /// Not a number.
    NotANumber,
}

impl From<f64> for ScoreRecord {
    fn from(score: f64) -> Self {
        if score.is_nan() {
            Self::NotANumber
        } else if score == f64::INFINITY {
            Self::PositiveInfinity
        } else if score == f64::NEG_INFINITY {
            Self::NegativeInfinity
        } else {
            Self::Finite(score)
        }
    }
}

impl From<ScoreRecord> for f64 {
    fn from(record: ScoreRecord) -> Self {
        match record {
            ScoreRecord::Finite(score) => score,
            ScoreRecord::PositiveInfinity => f64::INFINITY,
            ScoreRecord::NegativeInfinity => f64::NEG_INFINITY,
            ScoreRecord::NotANumber => f64::NAN,
        }
    }
}

/// Retained graph as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetainedGraphRecord {
    /// Node list and edge list with multiplicity.
    pub graph: GraphRecord,
    /// Score attached at collection time.
    pub score: Option<ScoreRecord>,
    /// Metadata encoded as a JSON object.
    pub extra_json: String,
}

/// Serializable form of the whole accumulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectorRecord {
    /// Multiplicity histograms keyed by pair.
    pub multiplicities: Vec<HistogramEntry>,
    /// Presence counts keyed by pair, as `(i, j, count)`.
    pub counts: Vec<(usize, usize, u64)>,
    /// Number of observed graphs.
    pub total_count: u64,
    /// Largest observed vertex count.
    pub node_count: usize,
    /// Retained graphs in collection order.
    pub graph_collection: Vec<RetainedGraphRecord>,
}

impl CollectorRecord {
    /// Captures the state of `collector`.
    pub fn from_collector(collector: &EdgeCollector) -> Result<Self, GinfError> {
        let multiplicities: Vec<HistogramEntry> = collector
            .observed_edges()
            .map(|edge| {
                let histogram = collector
                    .multiplicity_counts(edge)
                    .map(|histogram| histogram.iter().map(|(m, c)| (*m, *c)).collect::<Vec<_>>())
                    .unwrap_or_default();
                (edge.first(), edge.second(), histogram)
            })
            .collect();
        let counts: Vec<(usize, usize, u64)> = collector
            .observed_edges()
            .map(|edge| (edge.first(), edge.second(), collector.count(edge)))
            .collect();
        let graph_collection: Vec<RetainedGraphRecord> = collector
            .graph_collection()
            .iter()
            .map(|entry| -> Result<RetainedGraphRecord, GinfError> {
                let extra_json = serde_json::to_string(&entry.extra)
                    .map_err(|err| GinfError::Serde(ErrorInfo::new("extra-serialize", err.to_string())))?;
                Ok(RetainedGraphRecord {
                    graph: GraphRecord::from_graph(&entry.graph),
                    score: entry.score.map(ScoreRecord::from),
                    extra_json,
                })
            })
            .collect::<Result<_, GinfError>>()?;
        Ok(Self {
            multiplicities,
            counts,
            total_count: collector.total_count(),
            node_count: collector.node_count(),
            graph_collection,
        })
    }

    /// Rebuilds a collector with the given `epsilon`, checking its invariants.
    pub fn into_collector(self, epsilon: f64) -> Result<EdgeCollector, GinfError> {
        let multiplicities: BTreeMap<Edge, BTreeMap<usize, u64>> = self
            .multiplicities
            .into_iter()
            .map(|(i, j, histogram)| (Edge::new(i, j), histogram.into_iter().collect()))
            .collect();
        let counts: BTreeMap<Edge, u64> = self
            .counts
            .into_iter()
            .map(|(i, j, count)| (Edge::new(i, j), count))
            .collect();
        let graph_collection: Vec<CollectedGraph> = self
            .graph_collection
            .into_iter()
            .map(|entry| -> Result<CollectedGraph, GinfError> {
                let extra = serde_json::from_str(&entry.extra_json)
                    .map_err(|err| GinfError::Serde(ErrorInfo::new("extra-parse", err.to_string())))?;
                Ok(CollectedGraph {
                    graph: entry.graph.into_graph()?,
                    score: entry.score.map(f64::from),
                    extra,
                })
            })
            .collect::<Result<_, GinfError>>()?;
        let collector = EdgeCollector::from_parts(
            epsilon,
            multiplicities,
            counts,
            self.total_count,
            self.node_count,
            graph_collection,
        );
        collector.check_invariants().map_err(|err| {
            GinfError::Serde(
                ErrorInfo::new("collector-record-invalid", err.info().message.clone())
                    .with_context("cause", err.info().code.clone()),
            )
        })?;
        Ok(collector)
    }
}

impl EdgeCollector {
    /// Writes the accumulator to `path` as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), GinfError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                GinfError::Serde(
                    ErrorInfo::new("collector-mkdir", err.to_string())
                        .with_context("path", parent.display().to_string()),
                )
            })?;
        }
        let record = CollectorRecord::from_collector(self)?;
        let json = serde_json::to_string_pretty(&record).map_err(|err| {
            GinfError::Serde(
                ErrorInfo::new("collector-serialize", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        fs::write(path, json).map_err(|err| {
            GinfError::Serde(
                ErrorInfo::new("collector-write", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        tracing::debug!(
            path = %path.display(),
            total_count = self.total_count(),
            "saved edge collector"
        );
        Ok(())
    }

    /// Replaces the accumulated state with the one stored at `path`.
    ///
    /// The current `epsilon` is kept.
    pub fn load(&mut self, path: &Path) -> Result<(), GinfError> {
        *self = Self::from_path(path, self.epsilon())?;
        Ok(())
    }

    /// Reads a collector stored with [`EdgeCollector::save`].
    pub fn from_path(path: &Path, epsilon: f64) -> Result<Self, GinfError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            GinfError::Serde(
                ErrorInfo::new("collector-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        let record: CollectorRecord = serde_json::from_str(&contents).map_err(|err| {
            GinfError::Serde(
                ErrorInfo::new("collector-parse", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        record.into_collector(epsilon)
    }

    /// Serializes the accumulator to a compact binary representation using `bincode`.
    pub fn to_bytes(&self) -> Result<Vec<u8>, GinfError> {
        let record = CollectorRecord::from_collector(self)?;
        bincode::serialize(&record)
            .map_err(|err| GinfError::Serde(ErrorInfo::new("collector-serialize-bytes", err.to_string())))
    }

    /// Restores an accumulator from its binary representation.
    pub fn from_bytes(bytes: &[u8], epsilon: f64) -> Result<Self, GinfError> {
        let record: CollectorRecord = bincode::deserialize(bytes).map_err(|err| {
            GinfError::Serde(ErrorInfo::new("collector-deserialize-bytes", err.to_string()))
        })?;
        record.into_collector(epsilon)
    }
}

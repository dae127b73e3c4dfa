use std::collections::BTreeMap;

use ginf_core::errors::{ErrorInfo, GinfError};
use ginf_core::{all_pairs, clip, entropy_term, Edge, RngHandle};
use ginf_graph::{GraphModel, Multigraph};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

/// Graph retained by the collector together with its score and metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedGraph {
    /// The retained graph.
    pub graph: Multigraph,
    /// Optional score attached when the graph was collected.
    pub score: Option<f64>,
    /// Free-form metadata attached when the graph was collected.
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Accumulates per-pair multiplicity histograms over a stream of graphs.
///
/// The collector defines a factorized distribution over graphs in which every
/// unordered vertex pair carries an independent categorical distribution over
/// multiplicities. Probabilities are empirical frequencies clamped to
/// `[epsilon, 1 - epsilon]`.
///
/// Reads of a pair that was never observed default to zero counts. For every
/// observed pair the multiplicity histogram sums to the pair's presence count,
/// which never exceeds [`EdgeCollector::total_count`].
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeCollector {
    epsilon: f64,
    multiplicities: BTreeMap<Edge, BTreeMap<usize, u64>>,
    counts: BTreeMap<Edge, u64>,
    total_count: u64,
    node_count: usize,
    graph_collection: Vec<CollectedGraph>,
}

impl Default for EdgeCollector {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl EdgeCollector {
    /// Creates an empty collector. `epsilon` is clamped into `[0, 0.5]`.
    pub fn new(epsilon: f64) -> Self {
        let epsilon = if epsilon.is_nan() { 0.0 } else { clip(epsilon, 0.0, 0.5) };
        Self {
            epsilon,
            multiplicities: BTreeMap::new(),
            counts: BTreeMap::new(),
            total_count: 0,
            node_count: 0,
            graph_collection: Vec::new(),
        }
    }

    /// Creates a collector that has observed every graph of `graphs`.
    pub fn from_graphs<'a>(graphs: impl IntoIterator<Item = &'a Multigraph>, epsilon: f64) -> Self {
        let mut collector = Self::new(epsilon);
        for graph in graphs {
            collector.update(graph);
        }
        collector
    }

    pub(crate) fn from_parts(
        epsilon: f64,
        multiplicities: BTreeMap<Edge, BTreeMap<usize, u64>>,
        counts: BTreeMap<Edge, u64>,
        total_count: u64,
        node_count: usize,
        graph_collection: Vec<CollectedGraph>,
    ) -> Self {
        let mut collector = Self::new(epsilon);
        collector.multiplicities = multiplicities;
        collector.counts = counts;
        collector.total_count = total_count;
        collector.node_count = node_count;
        collector.graph_collection = graph_collection;
        collector
    }

    /// Forgets every observation and retained graph.
    pub fn clear(&mut self) {
        self.multiplicities.clear();
        self.counts.clear();
        self.total_count = 0;
        self.node_count = 0;
        self.graph_collection.clear();
    }

    /// Records one observed graph.
    pub fn update(&mut self, graph: &Multigraph) {
        self.total_count += 1;
        self.node_count = self.node_count.max(graph.size());
        for (edge, multiplicity) in graph.edges() {
            *self
                .multiplicities
                .entry(edge)
                .or_default()
                .entry(multiplicity)
                .or_insert(0) += 1;
            *self.counts.entry(edge).or_insert(0) += 1;
        }
    }

    /// Records one observed graph and retains it with its score and metadata.
    pub fn update_and_keep(
        &mut self,
        graph: &Multigraph,
        score: Option<f64>,
        extra: BTreeMap<String, serde_json::Value>,
    ) {
        self.update(graph);
        self.graph_collection.push(CollectedGraph {
            graph: graph.clone(),
            score,
            extra,
        });
    }

    /// Records the current graph of `model`.
    pub fn update_from_model<M: GraphModel + ?Sized>(&mut self, model: &M) {
        self.update(&model.graph());
    }

    /// Probability floor and ceiling margin.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Number of observed graphs.
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Largest vertex count observed so far.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Number of observations in which `edge` was present.
    pub fn count(&self, edge: Edge) -> u64 {
        self.counts.get(&edge).copied().unwrap_or(0)
    }

    /// Histogram of the nonzero multiplicities observed on `edge`.
    pub fn multiplicity_counts(&self, edge: Edge) -> Option<&BTreeMap<usize, u64>> {
        self.multiplicities.get(&edge)
    }

    /// Pairs observed with a nonzero multiplicity at least once.
    pub fn observed_edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.counts.keys().copied()
    }

    /// Graphs retained through [`EdgeCollector::update_and_keep`].
    pub fn graph_collection(&self) -> &[CollectedGraph] {
        &self.graph_collection
    }

    /// Maximum-likelihood probability that `edge` carries `multiplicity`.
    ///
    /// `None` asks for the marginal probability that the pair is present at
    /// all. A pair never observed gets `1 - epsilon` for multiplicity zero and
    /// `epsilon` otherwise.
    pub fn mle(&self, edge: Edge, multiplicity: Option<usize>) -> f64 {
        let Some(&count) = self.counts.get(&edge) else {
            return if multiplicity == Some(0) {
                1.0 - self.epsilon
            } else {
                self.epsilon
            };
        };
        let total = self.total_count as f64;
        let upper = 1.0 - self.epsilon;
        let absent = clip(1.0 - count as f64 / total, self.epsilon, upper);
        match multiplicity {
            Some(0) => absent,
            None => 1.0 - absent,
            Some(m) => {
                let observed = self
                    .multiplicities
                    .get(&edge)
                    .and_then(|histogram| histogram.get(&m))
                    .copied()
                    .unwrap_or(0);
                clip(observed as f64 / total, self.epsilon, upper)
            }
        }
    }

    /// Log-probability of `graph` under the factorized per-pair distribution.
    ///
    /// Pairs range over the larger of the collector's and the graph's vertex
    /// counts. With `epsilon == 0` a present pair that was never observed
    /// yields negative infinity, and absent pairs that were never observed
    /// contribute nothing.
    pub fn log_prob_estimate(&self, graph: &Multigraph) -> f64 {
        let size = self.node_count.max(graph.size());
        let mut log_prob = 0.0;
        for edge in all_pairs(size) {
            let multiplicity = graph.edge_multiplicity(edge);
            if self.epsilon <= 0.0 && !self.counts.contains_key(&edge) {
                if multiplicity > 0 {
                    return f64::NEG_INFINITY;
                }
                continue;
            }
            log_prob += self.mle(edge, Some(multiplicity)).ln();
        }
        log_prob
    }

    /// Shannon entropy in nats of the factorized per-pair distribution.
    pub fn entropy(&self) -> f64 {
        let mut entropy = 0.0;
        for edge in all_pairs(self.node_count) {
            if self.count(edge) < self.total_count {
                entropy += entropy_term(self.mle(edge, Some(0)));
            }
            if let Some(histogram) = self.multiplicities.get(&edge) {
                for &multiplicity in histogram.keys() {
                    entropy += entropy_term(self.mle(edge, Some(multiplicity)));
                }
            }
        }
        entropy
    }

    /// Symmetric `node_count x node_count` matrix of presence probabilities.
    pub fn prediction_matrix(&self) -> Vec<Vec<f64>> {
        let mut matrix = vec![vec![0.0; self.node_count]; self.node_count];
        for edge in all_pairs(self.node_count) {
            let (i, j) = edge.endpoints();
            let p = self.mle(edge, None);
            matrix[i][j] = p;
            matrix[j][i] = p;
        }
        matrix
    }

    /// Draws a graph of `node_count` vertices from the fitted distribution.
    ///
    /// With `edge_count`, that many edges are drawn with replacement among the
    /// pairs of positive presence probability, weighted by that probability;
    /// repeated draws accumulate multiplicity. Otherwise every pair is sampled
    /// independently: a pair never observed gets an edge with probability
    /// `epsilon`, an observed pair draws its multiplicity among zero and the
    /// observed values.
    pub fn sample(&self, edge_count: Option<usize>, rng: &mut RngHandle) -> Result<Multigraph, GinfError> {
        if self.total_count == 0 {
            return Err(GinfError::Data(
                ErrorInfo::new("empty-collector", "no data to sample from")
                    .with_hint("update the collector with at least one graph"),
            ));
        }
        let mut graph = Multigraph::new(self.node_count);
        match edge_count {
            Some(edge_count) => {
                let (pairs, weights): (Vec<Edge>, Vec<f64>) = all_pairs(self.node_count)
                    .map(|edge| (edge, self.mle(edge, None)))
                    .filter(|(_, p)| *p > 0.0)
                    .unzip();
                if edge_count == 0 {
                    return Ok(graph);
                }
                let index = WeightedIndex::new(&weights).map_err(|err| {
                    GinfError::Data(
                        ErrorInfo::new("no-admissible-pairs", err.to_string())
                            .with_context("edge_count", edge_count.to_string()),
                    )
                })?;
                for _ in 0..edge_count {
                    let (i, j) = pairs[index.sample(rng.inner_mut())].endpoints();
                    graph.add_edge(i, j)?;
                }
            }
            None => {
                for edge in all_pairs(self.node_count) {
                    let (i, j) = edge.endpoints();
                    let histogram = match self.multiplicities.get(&edge) {
                        Some(histogram) if !histogram.is_empty() => histogram,
                        _ => {
                            if rng.bernoulli(self.epsilon) {
                                graph.add_edge(i, j)?;
                            }
                            continue;
                        }
                    };
                    let values: Vec<usize> = std::iter::once(0).chain(histogram.keys().copied()).collect();
                    let weights: Vec<f64> = values.iter().map(|&m| self.mle(edge, Some(m))).collect();
                    let index = WeightedIndex::new(&weights).map_err(|err| {
                        GinfError::Data(
                            ErrorInfo::new("degenerate-pair-distribution", err.to_string())
                                .with_context("edge", edge.to_string()),
                        )
                    })?;
                    let multiplicity = values[index.sample(rng.inner_mut())];
                    graph.add_multiedge(i, j, multiplicity)?;
                }
            }
        }
        Ok(graph)
    }

    /// Uniformly random retained graph, `None` when nothing was retained.
    pub fn sample_from_collection(&self, rng: &mut RngHandle) -> Option<&CollectedGraph> {
        if self.graph_collection.is_empty() {
            return None;
        }
        let idx = rng.gen_range(0..self.graph_collection.len());
        self.graph_collection.get(idx)
    }

    /// Retained graph with the largest score; unscored graphs rank last.
    pub fn best_scoring(&self) -> Option<&CollectedGraph> {
        self.graph_collection.iter().max_by(|a, b| {
            let a = a.score.unwrap_or(f64::NEG_INFINITY);
            let b = b.score.unwrap_or(f64::NEG_INFINITY);
            a.total_cmp(&b)
        })
    }

    /// Verifies the accumulator invariants.
    pub fn check_invariants(&self) -> Result<(), GinfError> {
        if self.counts.len() != self.multiplicities.len() {
            return Err(GinfError::Data(
                ErrorInfo::new("histogram-mismatch", "counted pairs differ from histogram pairs")
                    .with_context("counts", self.counts.len().to_string())
                    .with_context("histograms", self.multiplicities.len().to_string()),
            ));
        }
        for (edge, &count) in &self.counts {
            let histogram_sum: u64 = self
                .multiplicities
                .get(edge)
                .map(|histogram| histogram.values().sum())
                .unwrap_or(0);
            if histogram_sum != count {
                return Err(GinfError::Data(
                    ErrorInfo::new("histogram-sum", "multiplicity histogram does not sum to the count")
                        .with_context("edge", edge.to_string())
                        .with_context("count", count.to_string())
                        .with_context("sum", histogram_sum.to_string()),
                ));
            }
            if count > self.total_count {
                return Err(GinfError::Data(
                    ErrorInfo::new("count-exceeds-total", "pair observed more often than graphs")
                        .with_context("edge", edge.to_string())
                        .with_context("count", count.to_string())
                        .with_context("total", self.total_count.to_string()),
                ));
            }
            if edge.second() >= self.node_count {
                return Err(GinfError::Data(
                    ErrorInfo::new("edge-out-of-range", "observed pair exceeds node count")
                        .with_context("edge", edge.to_string())
                        .with_context("node_count", self.node_count.to_string()),
                ));
            }
        }
        Ok(())
    }
}

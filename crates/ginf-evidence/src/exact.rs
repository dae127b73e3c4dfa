//! Estimators that visit every admissible graph or partition.

use std::collections::BTreeMap;

use ginf_core::errors::{ErrorInfo, GinfError};
use ginf_core::{all_pairs, entropy_term, log_sum_exp, Edge};
use ginf_graph::{enumerate_all_graphs, enumerate_all_partitions, GraphModel, LabelModel, Multigraph};
use ginf_mcmc::{GraphSnapshot, LabelSnapshot, ModelGuard};

/// Vertex count above which graph enumeration logs a warning.
pub const GRAPH_ENUMERATION_WARN_SIZE: usize = 7;

/// Vertex count above which partition enumeration logs a warning.
pub const PARTITION_ENUMERATION_WARN_SIZE: usize = 6;

/// Result of [`exact_meanfield`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExactMeanfield {
    /// Log-evidence over every admissible graph.
    pub log_evidence: f64,
    /// Exact log-posterior of the target, `-inf` when it is not admissible.
    pub log_posterior: f64,
    /// Log-posterior of the target under the product of exact pair marginals.
    pub meanfield_log_posterior: f64,
    /// Entropy in nats of the product of exact pair marginals.
    pub entropy: f64,
    /// Posterior probability of every multiplicity of every admissible pair,
    /// multiplicity zero included.
    pub marginals: BTreeMap<Edge, BTreeMap<usize, f64>>,
}

fn warn_if_large(size: usize, threshold: usize, space: &'static str) {
    if size > threshold {
        tracing::warn!(size, threshold, space, "exact enumeration on a large state space might not finish");
    }
}

/// Log-evidence of the model's data by summing the joint over every graph.
///
/// Graphs are enumerated with the model's size, edge count and self-loop
/// and parallel-edge policy. The model's graph is restored afterwards.
pub fn log_evidence_exact<M: GraphModel + ?Sized>(model: &mut M) -> Result<f64, GinfError> {
    let mut guard = ModelGuard::<M, GraphSnapshot>::new(model);
    let result = graph_logits(&mut *guard).map(|visited| {
        let logits: Vec<f64> = visited.into_iter().map(|(_, logit)| logit).collect();
        log_sum_exp(&logits)
    });
    guard.finish(result)
}

fn graph_logits<M: GraphModel + ?Sized>(model: &mut M) -> Result<Vec<(Multigraph, f64)>, GinfError> {
    let size = model.size();
    warn_if_large(size, GRAPH_ENUMERATION_WARN_SIZE, "graphs");
    let graphs = enumerate_all_graphs(size, model.edge_count(), model.with_self_loops(), model.with_parallel_edges());
    let mut visited = Vec::new();
    for graph in graphs {
        model.set_graph(&graph)?;
        let logit = model.log_likelihood() + model.log_prior();
        visited.push((graph, logit));
    }
    tracing::debug!(size, graphs = visited.len(), "enumerated graphs");
    Ok(visited)
}

/// Exact posterior pair marginals and the log-posterior of `target`.
///
/// Runs the same enumeration as [`log_evidence_exact`] and keeps every
/// graph's posterior weight, so it is only tractable at the same sizes.
pub fn exact_meanfield<M: GraphModel + ?Sized>(model: &mut M, target: &Multigraph) -> Result<ExactMeanfield, GinfError> {
    let self_loops = model.with_self_loops();
    let mut guard = ModelGuard::<M, GraphSnapshot>::new(model);
    let result = graph_logits(&mut *guard);
    let visited = guard.finish(result)?;

    let logits: Vec<f64> = visited.iter().map(|(_, logit)| *logit).collect();
    let log_evidence = log_sum_exp(&logits);
    let log_posterior = visited
        .iter()
        .find(|(graph, _)| graph == target)
        .map_or(f64::NEG_INFINITY, |(_, logit)| logit - log_evidence);

    let size = visited.first().map_or(target.size(), |(graph, _)| graph.size());
    let mut marginals: BTreeMap<Edge, BTreeMap<usize, f64>> = all_pairs(size)
        .filter(|edge| self_loops || !edge.is_self_loop())
        .map(|edge| (edge, BTreeMap::new()))
        .collect();
    for (graph, logit) in &visited {
        let weight = (logit - log_evidence).exp();
        for (edge, multiplicity) in graph.edges() {
            *marginals.entry(edge).or_default().entry(multiplicity).or_insert(0.0) += weight;
        }
    }
    for histogram in marginals.values_mut() {
        let present: f64 = histogram.values().sum();
        histogram.insert(0, (1.0 - present).max(0.0));
    }

    let mut meanfield_log_posterior = 0.0;
    let mut entropy = 0.0;
    for (edge, histogram) in &marginals {
        let multiplicity = target.edge_multiplicity(*edge);
        meanfield_log_posterior += histogram.get(&multiplicity).copied().unwrap_or(0.0).ln();
        entropy += histogram.values().copied().map(entropy_term).sum::<f64>();
    }

    Ok(ExactMeanfield {
        log_evidence,
        log_posterior,
        meanfield_log_posterior,
        entropy,
        marginals,
    })
}

/// Log-evidence of `graph` under a labeled model, summing the joint over
/// every reduced partition of the vertices.
///
/// Nested label models are rejected before the model is touched. The
/// model's graph and labels are restored afterwards.
pub fn log_evidence_exact_labels<M: LabelModel + ?Sized>(model: &mut M, graph: &Multigraph) -> Result<f64, GinfError> {
    if model.is_nested() {
        return Err(GinfError::Config(
            ErrorInfo::new("nested-exact-unsupported", "exact label enumeration requires flat labels")
                .with_hint("use partition_meanfield or annealed for nested models"),
        ));
    }
    let mut guard = ModelGuard::<M, (GraphSnapshot, LabelSnapshot)>::new(model);
    let result = partition_logits(&mut *guard, graph).map(|logits| log_sum_exp(&logits));
    guard.finish(result)
}

fn partition_logits<M: LabelModel + ?Sized>(model: &mut M, graph: &Multigraph) -> Result<Vec<f64>, GinfError> {
    model.set_graph(graph)?;
    let size = model.size();
    warn_if_large(size, PARTITION_ENUMERATION_WARN_SIZE, "partitions");
    let mut logits = Vec::new();
    for partition in enumerate_all_partitions(size, None, true) {
        model.set_labels(&partition, false)?;
        logits.push(model.log_joint());
    }
    tracing::debug!(size, partitions = logits.len(), "enumerated partitions");
    Ok(logits)
}

use std::collections::BTreeMap;

use ginf_core::errors::{ErrorInfo, GinfError};
use ginf_core::numeric::mean;
use ginf_core::{entropy_term, log_factorial, NestedLabels};
use ginf_graph::{block_count, canonical_partition, reduce_nested_partition, LabelModel, LabelState, Multigraph};
use ginf_mcmc::{
    run_backend_label_mcmc, run_label_mcmc, CommunityBackend, GraphSnapshot, LabelMcmcConfig, LabelSnapshot,
    ModelGuard,
};

use crate::callbacks::CollectPartitionOnSweep;

/// Partition-based mean-field log-evidence of `graph` under a labeled model.
///
/// Labels are sampled with the native label driver, or with `backend` when
/// `use_backend` is set; the starting labels are always the first sample.
/// The estimate is the mean over samples of `log_joint + ln(B!)`, with `B`
/// the block count of the finest level, plus the entropy of the empirical
/// distribution of equivalent partitions.
///
/// Requesting the backend without providing one is a dependency error
/// raised before the model is touched. The model's graph and labels are
/// restored on every exit path.
pub fn log_evidence_partition_meanfield<M: LabelModel + ?Sized>(
    model: &mut M,
    graph: &Multigraph,
    config: &LabelMcmcConfig,
    use_backend: bool,
    backend: Option<&mut dyn CommunityBackend<M>>,
) -> Result<f64, GinfError> {
    config.validate_for(&*model)?;
    let backend = match (use_backend, backend) {
        (true, None) => {
            return Err(GinfError::Dependency(
                ErrorInfo::new("community-backend-missing", "no community detection backend was provided")
                    .with_hint("pass a backend or disable use_backend"),
            ))
        }
        (true, Some(backend)) => Some(backend),
        (false, _) => None,
    };
    let mut guard = ModelGuard::<M, (GraphSnapshot, LabelSnapshot)>::new(model);
    let result = partition_chain(&mut *guard, graph, config, backend);
    guard.finish(result)
}

fn partition_chain<M: LabelModel + ?Sized>(
    model: &mut M,
    graph: &Multigraph,
    config: &LabelMcmcConfig,
    backend: Option<&mut dyn CommunityBackend<M>>,
) -> Result<f64, GinfError> {
    model.set_graph(graph)?;
    let mut observer = CollectPartitionOnSweep::seeded(model.label_state());
    match backend {
        Some(backend) => {
            if !config.base.start_from_original {
                model.sample_only_labels()?;
            }
            run_backend_label_mcmc(model, backend, config, &mut observer)?;
        }
        None => {
            run_label_mcmc(model, config, &mut observer)?;
        }
    }
    let partitions = observer.into_partitions();

    let mut samples = Vec::with_capacity(partitions.len());
    let mut histogram: BTreeMap<NestedLabels, usize> = BTreeMap::new();
    for partition in &partitions {
        model.set_label_state(partition)?;
        let (finest, key) = match partition {
            LabelState::Flat(labels) => (labels.as_slice(), vec![canonical_partition(labels)]),
            LabelState::Nested(levels) => (
                levels.first().map_or(&[][..], |level| level.as_slice()),
                reduce_nested_partition(levels)?,
            ),
        };
        samples.push(model.log_joint() + log_factorial(block_count(finest)));
        *histogram.entry(key).or_insert(0) += 1;
    }

    let total = partitions.len() as f64;
    let entropy: f64 = histogram.values().map(|&count| entropy_term(count as f64 / total)).sum();
    tracing::debug!(
        samples = partitions.len(),
        distinct = histogram.len(),
        entropy,
        "partition mean-field summary"
    );
    Ok(mean(&samples) + entropy)
}

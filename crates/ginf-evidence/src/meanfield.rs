//! Factorized estimates built from an [`EdgeCollector`].
//!
//! [`EdgeCollector`]: ginf_collect::EdgeCollector

use ginf_core::errors::GinfError;
use ginf_graph::{GraphModel, Multigraph};
use ginf_mcmc::{run_graph_mcmc, GraphSnapshot, McmcConfig, ModelGuard, Snapshot, SweepObserver};

use crate::callbacks::CollectGraphOnSweep;

/// Mean-field log-posterior of `target` given the model's data.
///
/// The model is set to `target`, which is also the collector's first
/// observation; every observed sweep adds the sampled graph. The estimate is
/// the collector's log-probability of `target`. The model's graph is
/// restored on every exit path, whatever `config.reset_original` says.
pub fn log_posterior_meanfield<M: GraphModel + ?Sized>(
    model: &mut M,
    target: &Multigraph,
    config: &McmcConfig,
    epsilon: f64,
) -> Result<f64, GinfError> {
    config.validate_for(&*model)?;
    let mut guard = ModelGuard::<M, GraphSnapshot>::new(model);
    let result = posterior_chain(&mut *guard, target, config, epsilon);
    guard.finish(result)
}

fn posterior_chain<M: GraphModel + ?Sized>(
    model: &mut M,
    target: &Multigraph,
    config: &McmcConfig,
    epsilon: f64,
) -> Result<f64, GinfError> {
    model.set_graph(target)?;
    let mut observer = CollectGraphOnSweep::seeded(target, epsilon);
    run_graph_mcmc(model, config, &mut observer)?;
    Ok(observer.collector().log_prob_estimate(target))
}

/// Mean-field log-evidence of `graph` under a random graph model.
///
/// Draws `n_samples` independent graphs with `sample()` and returns the
/// log-probability of `graph` under the collector fitted to `graph` and the
/// draws. The model's graph is restored afterwards.
pub fn log_evidence_iid_meanfield<M: GraphModel + ?Sized>(
    model: &mut M,
    graph: &Multigraph,
    n_samples: usize,
    epsilon: f64,
) -> Result<f64, GinfError> {
    iid_meanfield_with::<M, GraphSnapshot>(model, graph, n_samples, epsilon)
}

/// [`log_evidence_iid_meanfield`] restoring the state captured by `S`.
pub(crate) fn iid_meanfield_with<M, S>(
    model: &mut M,
    graph: &Multigraph,
    n_samples: usize,
    epsilon: f64,
) -> Result<f64, GinfError>
where
    M: GraphModel + ?Sized,
    S: Snapshot<M>,
{
    let mut guard = ModelGuard::<M, S>::new(model);
    let result = iid_draws(&mut *guard, graph, n_samples, epsilon);
    guard.finish(result)
}

fn iid_draws<M: GraphModel + ?Sized>(
    model: &mut M,
    graph: &Multigraph,
    n_samples: usize,
    epsilon: f64,
) -> Result<f64, GinfError> {
    let mut observer = CollectGraphOnSweep::seeded(graph, epsilon);
    for draw in 0..n_samples {
        model.sample()?;
        observer.on_sample(&*model)?;
        tracing::trace!(draw, "collected independent draw");
    }
    Ok(observer.collector().log_prob_estimate(graph))
}

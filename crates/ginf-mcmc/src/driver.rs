//! Burn-in and sampling sweeps against an external model.

use std::time::Instant;

use chrono::Utc;
use ginf_core::errors::GinfError;
use ginf_core::RngHandle;
use ginf_graph::{canonical_hash, GenerativeModel, GraphModel, LabelModel};

use crate::config::{LabelMcmcConfig, McmcConfig, SweepKind, UnfreezeRates};
use crate::guard::{GraphSnapshot, LabelSnapshot, ModelGuard};
use crate::metrics::{label_state_hash, McmcSummary, MetricsRecorder, SweepRecord};
use crate::observer::SweepObserver;

/// Alternative label proposal mechanism, such as a community-detection
/// engine operating on the model's labels.
pub trait CommunityBackend<M: ?Sized> {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Runs one backend sweep on the model's labels and returns the number
    /// of accepted moves. The model must reflect the new labels on return.
    fn sweep(&mut self, model: &mut M) -> Result<usize, GinfError>;
}

#[derive(Debug, Clone, Copy)]
struct SweepOutcome {
    accepted: usize,
    proposed: usize,
}

fn kernel_sweep<M: GenerativeModel + ?Sized>(
    model: &mut M,
    config: &McmcConfig,
    n_steps: usize,
) -> Result<SweepOutcome, GinfError> {
    match config.sweep_kind {
        SweepKind::Metropolis => {
            let accepted = model.metropolis_sweep(n_steps, config.beta_prior, config.beta_likelihood)?;
            Ok(SweepOutcome {
                accepted,
                proposed: n_steps,
            })
        }
        SweepKind::Gibbs => {
            let summary = model.gibbs_sweep(n_steps, config.beta_prior, config.beta_likelihood)?;
            Ok(SweepOutcome {
                accepted: summary.accepted,
                proposed: summary.total,
            })
        }
    }
}

fn apply_unfreeze<M: GraphModel + ?Sized>(model: &mut M, rates: &UnfreezeRates) {
    if let Some(rate) = rates.graph {
        model.unfreeze_graph(rate);
    }
    if let Some(rate) = rates.graph_prior {
        model.unfreeze_graph_prior(rate);
    }
    if let Some(rate) = rates.param {
        model.unfreeze_param(rate);
    }
}

fn record_sweep<M: GenerativeModel + ?Sized>(
    model: &M,
    sweep: usize,
    started: Instant,
    outcome: SweepOutcome,
    verbose: bool,
    state_hash: Option<String>,
) -> SweepRecord {
    let duration_secs = started.elapsed().as_secs_f64();
    let (log_likelihood, log_prior, log_joint) = if verbose {
        let log_likelihood = model.log_likelihood();
        let log_prior = model.log_prior();
        (Some(log_likelihood), Some(log_prior), Some(log_likelihood + log_prior))
    } else {
        (None, None, None)
    };
    let record = SweepRecord {
        sweep,
        duration_secs,
        accepted: outcome.accepted,
        proposed: outcome.proposed,
        log_likelihood,
        log_prior,
        log_joint,
        state_hash,
    };
    record.log(verbose);
    record
}

/// Runs burn-in and `n_sweeps` observed sweeps on the model's graph.
///
/// Configuration errors are reported before the model is touched. Unless
/// `start_from_original` is set, the graph is first redrawn from the prior.
/// With `reset_original`, the starting graph is restored on every exit path,
/// including observer and model errors.
pub fn run_graph_mcmc<M, O>(model: &mut M, config: &McmcConfig, observer: &mut O) -> Result<McmcSummary, GinfError>
where
    M: GraphModel + ?Sized,
    O: SweepObserver<M> + ?Sized,
{
    config.validate_for(&*model)?;
    let started_at = Utc::now().to_rfc3339();
    let mut guard = ModelGuard::<M, GraphSnapshot>::new(model);
    guard.set_armed(config.reset_original);
    let result = graph_chain(&mut *guard, config, observer);
    let (recorder, burn_accepted) = guard.finish(result)?;
    Ok(recorder.into_summary(started_at, config.sweep_kind, burn_accepted))
}

fn graph_chain<M, O>(model: &mut M, config: &McmcConfig, observer: &mut O) -> Result<(MetricsRecorder, usize), GinfError>
where
    M: GraphModel + ?Sized,
    O: SweepObserver<M> + ?Sized,
{
    if !config.start_from_original {
        model.sample_prior()?;
    }
    apply_unfreeze(model, &config.unfreeze);

    let burn_accepted = if config.burn > 0 {
        kernel_sweep(model, config, config.burn)?.accepted
    } else {
        0
    };
    let mut recorder = MetricsRecorder::new();
    for sweep in 0..config.n_sweeps {
        let started = Instant::now();
        let mut outcome = kernel_sweep(model, config, config.n_steps)?;
        if config.n_param_steps > 0 {
            outcome.accepted += model.param_sweep(config.n_param_steps, config.beta_prior, config.beta_likelihood)?;
            outcome.proposed += config.n_param_steps;
        }
        let hash = canonical_hash(&model.graph());
        recorder.push(record_sweep(&*model, sweep, started, outcome, config.verbose, Some(hash)));
        observer.on_sample(model)?;
    }
    Ok((recorder, burn_accepted))
}

/// Runs burn-in and `n_sweeps` observed sweeps on the model's labels.
///
/// Before every sweep the labels are redrawn from their prior with
/// probability `resample_rate`; after it they are reduced. With
/// `reset_original`, the starting labels are restored on every exit path.
pub fn run_label_mcmc<M, O>(
    model: &mut M,
    config: &LabelMcmcConfig,
    observer: &mut O,
) -> Result<McmcSummary, GinfError>
where
    M: LabelModel + ?Sized,
    O: SweepObserver<M> + ?Sized,
{
    config.validate_for(&*model)?;
    let started_at = Utc::now().to_rfc3339();
    let mut guard = ModelGuard::<M, LabelSnapshot>::new(model);
    guard.set_armed(config.base.reset_original);
    let result = label_chain(&mut *guard, config, observer);
    let (recorder, burn_accepted) = guard.finish(result)?;
    Ok(recorder.into_summary(started_at, config.base.sweep_kind, burn_accepted))
}

fn label_chain<M, O>(
    model: &mut M,
    config: &LabelMcmcConfig,
    observer: &mut O,
) -> Result<(MetricsRecorder, usize), GinfError>
where
    M: LabelModel + ?Sized,
    O: SweepObserver<M> + ?Sized,
{
    let base = &config.base;
    let mut rng = RngHandle::from_seed(config.seed);
    if !base.start_from_original {
        model.sample_only_labels()?;
    }
    let burn_accepted = if base.burn > 0 {
        kernel_sweep(model, base, base.burn)?.accepted
    } else {
        0
    };
    let mut recorder = MetricsRecorder::new();
    for sweep in 0..base.n_sweeps {
        let started = Instant::now();
        if rng.bernoulli(config.resample_rate) {
            tracing::debug!(sweep, "resampling labels from the prior");
            model.sample_only_labels()?;
        }
        let outcome = kernel_sweep(model, base, base.n_steps)?;
        model.reduce_labels()?;
        let hash = label_state_hash(&model.label_state());
        recorder.push(record_sweep(&*model, sweep, started, outcome, base.verbose, Some(hash)));
        observer.on_sample(model)?;
    }
    Ok((recorder, burn_accepted))
}

/// Label sampling through a [`CommunityBackend`].
///
/// Every observed sweep runs `n_steps` backend sweeps. Burn-in, prior
/// redraws and temperatures do not apply. With `reset_original`, the starting
/// labels are restored on every exit path.
pub fn run_backend_label_mcmc<M, O>(
    model: &mut M,
    backend: &mut dyn CommunityBackend<M>,
    config: &LabelMcmcConfig,
    observer: &mut O,
) -> Result<McmcSummary, GinfError>
where
    M: LabelModel + ?Sized,
    O: SweepObserver<M> + ?Sized,
{
    config.validate_for(&*model)?;
    let started_at = Utc::now().to_rfc3339();
    tracing::debug!(backend = backend.name(), sweeps = config.base.n_sweeps, "starting backend label mcmc");
    let mut guard = ModelGuard::<M, LabelSnapshot>::new(model);
    guard.set_armed(config.base.reset_original);
    let result = backend_chain(&mut *guard, backend, config, observer);
    let recorder = guard.finish(result)?;
    Ok(recorder.into_summary(started_at, config.base.sweep_kind, 0))
}

fn backend_chain<M, O>(
    model: &mut M,
    backend: &mut dyn CommunityBackend<M>,
    config: &LabelMcmcConfig,
    observer: &mut O,
) -> Result<MetricsRecorder, GinfError>
where
    M: LabelModel + ?Sized,
    O: SweepObserver<M> + ?Sized,
{
    let base = &config.base;
    let mut recorder = MetricsRecorder::new();
    for sweep in 0..base.n_sweeps {
        let started = Instant::now();
        let mut accepted = 0;
        for _ in 0..base.n_steps {
            accepted += backend.sweep(model)?;
        }
        let outcome = SweepOutcome {
            accepted,
            proposed: base.n_steps,
        };
        let hash = label_state_hash(&model.label_state());
        recorder.push(record_sweep(&*model, sweep, started, outcome, base.verbose, Some(hash)));
        observer.on_sample(model)?;
    }
    Ok(recorder)
}

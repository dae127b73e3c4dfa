//! Method selection and the entry points that dispatch on it.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use ginf_core::errors::{ErrorInfo, GinfError};
use ginf_graph::{GraphModel, LabelModel, Multigraph};
use ginf_mcmc::{
    CommunityBackend, GraphSnapshot, LabelMcmcConfig, LabelSnapshot, McmcConfig, ModelGuard, SweepKind,
    UnfreezeRates,
};
use serde::{Deserialize, Serialize};

use crate::annealed::{
    default_ladder, log_evidence_annealed, log_evidence_annealed_labels, validate_ladder, AnnealingRule,
    DEFAULT_LADDER_STEPS,
};
use crate::exact::{exact_meanfield, log_evidence_exact, log_evidence_exact_labels};
use crate::meanfield::{iid_meanfield_with, log_evidence_iid_meanfield, log_posterior_meanfield};
use crate::partition::log_evidence_partition_meanfield;

/// Largest labeled model for which exact enumeration is the default.
pub const EXACT_DEFAULT_MAX_SIZE: usize = 5;

/// Estimation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceMethod {
    /// Enumerate every graph or partition.
    Exact,
    /// Factorized edge distribution fitted to MCMC or independent samples.
    #[serde(alias = "iid_meanfield")]
    Meanfield,
    /// Exact pair marginals from full enumeration.
    ExactMeanfield,
    /// Sampled partitions plus their empirical entropy.
    PartitionMeanfield,
    /// Integration along an inverse-temperature ladder.
    Annealed,
}

impl EvidenceMethod {
    /// Configuration name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceMethod::Exact => "exact",
            EvidenceMethod::Meanfield => "meanfield",
            EvidenceMethod::ExactMeanfield => "exact_meanfield",
            EvidenceMethod::PartitionMeanfield => "partition_meanfield",
            EvidenceMethod::Annealed => "annealed",
        }
    }
}

impl fmt::Display for EvidenceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvidenceMethod {
    type Err = GinfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exact" => Ok(EvidenceMethod::Exact),
            "meanfield" | "iid_meanfield" => Ok(EvidenceMethod::Meanfield),
            "exact_meanfield" => Ok(EvidenceMethod::ExactMeanfield),
            "partition_meanfield" => Ok(EvidenceMethod::PartitionMeanfield),
            "annealed" => Ok(EvidenceMethod::Annealed),
            other => Err(GinfError::Config(
                ErrorInfo::new("unknown-method", format!("unknown estimation method: {other}")).with_hint(
                    "expected one of exact, meanfield, exact_meanfield, partition_meanfield, annealed",
                ),
            )),
        }
    }
}

fn unsupported(method: EvidenceMethod, entry_point: &str) -> GinfError {
    GinfError::Config(
        ErrorInfo::new("unsupported-method", "method is not available for this estimate")
            .with_context("method", method.as_str())
            .with_context("entry_point", entry_point),
    )
}

/// Driver and estimator options shared by the entry points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatorConfig {
    /// Observed sweeps per chain (independent draws for i.i.d. mean-field).
    #[serde(default = "default_n_sweeps")]
    pub n_sweeps: usize,
    /// Kernel moves per sweep, per vertex.
    #[serde(default = "default_n_steps_per_vertex")]
    pub n_steps_per_vertex: usize,
    /// Kernel moves of the burn-in sweep.
    #[serde(default)]
    pub burn: usize,
    /// Kernel used by the sweeps.
    #[serde(default)]
    pub sweep_kind: SweepKind,
    /// Sweep from the model's current state instead of a prior draw.
    #[serde(default)]
    pub start_from_original: bool,
    /// Ask the driver sub-calls to restore their starting state.
    #[serde(default)]
    pub reset_original: bool,
    /// Emit per-sweep densities at `info` level.
    #[serde(default)]
    pub verbose: bool,
    /// Move-class activation rates forwarded to the model.
    #[serde(default)]
    pub unfreeze: UnfreezeRates,
    /// Annealing ladder; [`default_ladder`] when absent.
    #[serde(default)]
    pub betas: Option<Vec<f64>>,
    /// Segment rule of annealed estimates.
    #[serde(default)]
    pub annealing_rule: AnnealingRule,
    /// Probability floor of mean-field collectors.
    #[serde(default)]
    pub epsilon: f64,
    /// Probability of redrawing labels from their prior before a sweep.
    #[serde(default = "default_resample_rate")]
    pub resample_rate: f64,
    /// Sample partitions with a community detection backend.
    #[serde(default)]
    pub use_backend: bool,
    /// Seed of the driver's own random decisions.
    #[serde(default)]
    pub seed: u64,
}

fn default_n_sweeps() -> usize {
    1000
}

fn default_n_steps_per_vertex() -> usize {
    10
}

fn default_resample_rate() -> f64 {
    0.01
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            n_sweeps: default_n_sweeps(),
            n_steps_per_vertex: default_n_steps_per_vertex(),
            burn: 0,
            sweep_kind: SweepKind::default(),
            start_from_original: false,
            reset_original: false,
            verbose: false,
            unfreeze: UnfreezeRates::default(),
            betas: None,
            annealing_rule: AnnealingRule::default(),
            epsilon: 0.0,
            resample_rate: default_resample_rate(),
            use_backend: false,
            seed: 0,
        }
    }
}

impl EstimatorConfig {
    /// Parses a YAML document; absent fields take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, GinfError> {
        serde_yaml::from_str(yaml).map_err(|err| GinfError::Config(ErrorInfo::new("yaml-parse", err.to_string())))
    }

    /// Reads a YAML configuration file.
    pub fn from_path(path: &Path) -> Result<Self, GinfError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            GinfError::Serde(
                ErrorInfo::new("config-read", err.to_string()).with_context("path", path.display().to_string()),
            )
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Checks the options that do not depend on the model.
    pub fn validate(&self) -> Result<(), GinfError> {
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(GinfError::Config(
                ErrorInfo::new("invalid-epsilon", "epsilon must be finite and non-negative")
                    .with_context("epsilon", self.epsilon.to_string()),
            ));
        }
        if let Some(betas) = &self.betas {
            validate_ladder(betas)?;
        }
        Ok(())
    }

    /// Graph driver options for a model with `size` vertices.
    pub fn mcmc_config(&self, size: usize) -> McmcConfig {
        McmcConfig {
            n_sweeps: self.n_sweeps,
            n_steps: self.n_steps_per_vertex * size,
            n_param_steps: 0,
            burn: self.burn,
            beta_prior: 1.0,
            beta_likelihood: 1.0,
            sweep_kind: self.sweep_kind,
            start_from_original: self.start_from_original,
            reset_original: self.reset_original,
            unfreeze: self.unfreeze,
            verbose: self.verbose,
        }
    }

    /// Label driver options for a model with `size` vertices.
    pub fn label_config(&self, size: usize) -> LabelMcmcConfig {
        LabelMcmcConfig {
            base: self.mcmc_config(size),
            resample_rate: self.resample_rate,
            seed: self.seed,
        }
    }

    /// Configured annealing ladder, or the default one.
    pub fn ladder(&self) -> Vec<f64> {
        self.betas
            .clone()
            .unwrap_or_else(|| default_ladder(DEFAULT_LADDER_STEPS))
    }
}

/// Log-posterior of `target` given the model's data.
///
/// `partition_meanfield` has no posterior form and is rejected before the
/// model is touched. The model's graph is restored on every exit path.
pub fn log_posterior<M: GraphModel + ?Sized>(
    model: &mut M,
    target: &Multigraph,
    method: EvidenceMethod,
    config: &EstimatorConfig,
) -> Result<f64, GinfError> {
    if method == EvidenceMethod::PartitionMeanfield {
        return Err(unsupported(method, "log_posterior"));
    }
    config.validate()?;
    let mcmc = config.mcmc_config(model.size());
    mcmc.validate_for(&*model)?;
    match method {
        EvidenceMethod::Meanfield => log_posterior_meanfield(model, target, &mcmc, config.epsilon),
        EvidenceMethod::ExactMeanfield => Ok(exact_meanfield(model, target)?.meanfield_log_posterior),
        _ => {
            let mut guard = ModelGuard::<M, GraphSnapshot>::new(model);
            let result = joint_minus_evidence(&mut *guard, target, method, &mcmc, config);
            guard.finish(result)
        }
    }
}

fn joint_minus_evidence<M: GraphModel + ?Sized>(
    model: &mut M,
    target: &Multigraph,
    method: EvidenceMethod,
    mcmc: &McmcConfig,
    config: &EstimatorConfig,
) -> Result<f64, GinfError> {
    model.set_graph(target)?;
    let joint = model.log_prior() + model.log_likelihood();
    let evidence = match method {
        EvidenceMethod::Exact => log_evidence_exact(model)?,
        EvidenceMethod::Annealed => log_evidence_annealed(model, &config.ladder(), mcmc, config.annealing_rule)?,
        other => return Err(unsupported(other, "log_posterior")),
    };
    Ok(joint - evidence)
}

/// Log-evidence of the model's data.
///
/// Mean-field variants are turned into evidence through the model's current
/// graph: `log_prior + log_likelihood - log_posterior`. `partition_meanfield`
/// is rejected before the model is touched. The model's graph is restored on
/// every exit path.
pub fn log_evidence<M: GraphModel + ?Sized>(
    model: &mut M,
    method: EvidenceMethod,
    config: &EstimatorConfig,
) -> Result<f64, GinfError> {
    if method == EvidenceMethod::PartitionMeanfield {
        return Err(unsupported(method, "log_evidence"));
    }
    config.validate()?;
    let mcmc = config.mcmc_config(model.size());
    mcmc.validate_for(&*model)?;
    let current = model.graph();
    let joint = model.log_prior() + model.log_likelihood();
    match method {
        EvidenceMethod::Exact => log_evidence_exact(model),
        EvidenceMethod::Annealed => log_evidence_annealed(model, &config.ladder(), &mcmc, config.annealing_rule),
        EvidenceMethod::Meanfield => Ok(joint - log_posterior_meanfield(model, &current, &mcmc, config.epsilon)?),
        EvidenceMethod::ExactMeanfield => Ok(joint - exact_meanfield(model, &current)?.meanfield_log_posterior),
        EvidenceMethod::PartitionMeanfield => Err(unsupported(method, "log_evidence")),
    }
}

/// Log-evidence of `graph` under an unlabeled random graph model.
///
/// `exact` is the model's joint at `graph`; `meanfield` draws `n_sweeps`
/// independent graphs. Other methods are rejected before the model is
/// touched. The model's graph is restored on every exit path.
pub fn graph_log_evidence<M: GraphModel + ?Sized>(
    model: &mut M,
    graph: &Multigraph,
    method: EvidenceMethod,
    config: &EstimatorConfig,
) -> Result<f64, GinfError> {
    config.validate()?;
    match method {
        EvidenceMethod::Exact => {
            let mut guard = ModelGuard::<M, GraphSnapshot>::new(model);
            let result = guard.set_graph(graph).map(|()| guard.log_joint());
            guard.finish(result)
        }
        EvidenceMethod::Meanfield => log_evidence_iid_meanfield(model, graph, config.n_sweeps, config.epsilon),
        other => Err(unsupported(other, "graph_log_evidence")),
    }
}

/// Method used by [`labeled_graph_log_evidence`] when none is given:
/// `exact` up to [`EXACT_DEFAULT_MAX_SIZE`] vertices, `meanfield` beyond.
pub fn default_labeled_method(size: usize) -> EvidenceMethod {
    if size <= EXACT_DEFAULT_MAX_SIZE {
        EvidenceMethod::Exact
    } else {
        EvidenceMethod::Meanfield
    }
}

/// Log-evidence of `graph` under a labeled random graph model, marginalizing
/// the labels.
///
/// `backend` is only used by `partition_meanfield` with `use_backend` set.
/// `exact_meanfield` is rejected before the model is touched. The model's
/// graph and labels are restored on every exit path.
pub fn labeled_graph_log_evidence<M: LabelModel + ?Sized>(
    model: &mut M,
    graph: &Multigraph,
    method: Option<EvidenceMethod>,
    config: &EstimatorConfig,
    backend: Option<&mut dyn CommunityBackend<M>>,
) -> Result<f64, GinfError> {
    let method = method.unwrap_or_else(|| default_labeled_method(model.size()));
    if method == EvidenceMethod::ExactMeanfield {
        return Err(unsupported(method, "labeled_graph_log_evidence"));
    }
    config.validate()?;
    let labels = config.label_config(model.size());
    tracing::debug!(method = %method, size = model.size(), "labeled graph evidence");
    match method {
        EvidenceMethod::Exact => log_evidence_exact_labels(model, graph),
        EvidenceMethod::Meanfield => iid_meanfield_with::<M, (GraphSnapshot, LabelSnapshot)>(
            model,
            graph,
            config.n_sweeps,
            config.epsilon,
        ),
        EvidenceMethod::PartitionMeanfield => {
            log_evidence_partition_meanfield(model, graph, &labels, config.use_backend, backend)
        }
        EvidenceMethod::Annealed => {
            log_evidence_annealed_labels(model, graph, &config.ladder(), &labels, config.annealing_rule)
        }
        EvidenceMethod::ExactMeanfield => Err(unsupported(method, "labeled_graph_log_evidence")),
    }
}

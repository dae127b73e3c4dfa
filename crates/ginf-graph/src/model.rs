//! Contract the estimation layer requires from an external generative model.
//!
//! Models are borrowed mutably for the duration of an estimator call; the
//! estimators snapshot the graph and label state on entry and restore it on
//! every exit path.

use ginf_core::errors::{ErrorInfo, GinfError};
use ginf_core::{Labels, NestedLabels};
use serde::{Deserialize, Serialize};

use crate::multigraph::Multigraph;

/// Outcome of a Gibbs sweep reported by the model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct GibbsSummary {
    /// Number of accepted moves.
    pub accepted: usize,
    /// Number of attempted moves.
    pub total: usize,
    /// Accumulated change of the log-joint over the sweep.
    pub log_joint_ratio: f64,
}

/// Densities, samplers and local kernels common to every generative model.
pub trait GenerativeModel {
    /// Number of vertices.
    fn size(&self) -> usize;

    /// Log-likelihood of the current state.
    fn log_likelihood(&self) -> f64;

    /// Log-prior of the current state.
    fn log_prior(&self) -> f64;

    /// Log-joint of the current state.
    fn log_joint(&self) -> f64 {
        self.log_likelihood() + self.log_prior()
    }

    /// Resamples the full state (latent structure and observations).
    fn sample(&mut self) -> Result<(), GinfError>;

    /// Resamples the latent structure from its prior.
    fn sample_prior(&mut self) -> Result<(), GinfError>;

    /// Runs `n_steps` Metropolis moves at the given inverse temperatures and
    /// returns the number of accepted moves.
    fn metropolis_sweep(
        &mut self,
        n_steps: usize,
        beta_prior: f64,
        beta_likelihood: f64,
    ) -> Result<usize, GinfError>;

    /// Whether [`GenerativeModel::gibbs_sweep`] is implemented.
    fn supports_gibbs(&self) -> bool {
        false
    }

    /// Runs `n_steps` Gibbs moves.
    fn gibbs_sweep(
        &mut self,
        _n_steps: usize,
        _beta_prior: f64,
        _beta_likelihood: f64,
    ) -> Result<GibbsSummary, GinfError> {
        Err(GinfError::Model(ErrorInfo::new(
            "gibbs-unsupported",
            "model does not implement gibbs sweeps",
        )))
    }

    /// Whether the model exposes moves on its continuous parameters.
    fn has_param_moves(&self) -> bool {
        false
    }

    /// Runs `n_steps` parameter moves and returns the number accepted.
    fn param_sweep(
        &mut self,
        _n_steps: usize,
        _beta_prior: f64,
        _beta_likelihood: f64,
    ) -> Result<usize, GinfError> {
        Err(GinfError::Model(ErrorInfo::new(
            "param-moves-unsupported",
            "model does not implement parameter moves",
        )))
    }

    /// Named metric evaluated on the current state, `None` when unknown.
    fn metric(&self, _name: &str) -> Option<f64> {
        None
    }
}

/// Model whose latent structure is a graph.
///
/// The freeze controls default to no-ops for models without the matching move
/// class.
pub trait GraphModel: GenerativeModel {
    /// Copy of the current graph.
    fn graph(&self) -> Multigraph;

    /// Replaces the current graph.
    fn set_graph(&mut self, graph: &Multigraph) -> Result<(), GinfError>;

    /// Edge count fixed by the graph prior.
    fn edge_count(&self) -> usize;

    /// Whether self-loops are admissible.
    fn with_self_loops(&self) -> bool;

    /// Whether parallel edges are admissible.
    fn with_parallel_edges(&self) -> bool;

    /// Disables graph moves.
    fn freeze_graph(&mut self) {}

    /// Enables graph moves at the given activation rate.
    fn unfreeze_graph(&mut self, _rate: f64) {}

    /// Disables moves on the graph prior's own latent variables.
    fn freeze_graph_prior(&mut self) {}

    /// Enables graph-prior moves at the given activation rate.
    fn unfreeze_graph_prior(&mut self, _rate: f64) {}

    /// Enables parameter moves at the given activation rate.
    fn unfreeze_param(&mut self, _rate: f64) {}
}

/// Snapshot of a flat or hierarchical label assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelState {
    /// One level of labels.
    Flat(Labels),
    /// Hierarchy of labels, finest level first.
    Nested(NestedLabels),
}

/// Graph model carrying a (possibly nested) vertex label assignment.
pub trait LabelModel: GraphModel {
    /// Current vertex labels (finest level for nested models).
    fn labels(&self) -> Labels;

    /// Replaces the labels, optionally reducing them to canonical form.
    fn set_labels(&mut self, labels: &[usize], reduce: bool) -> Result<(), GinfError>;

    /// Resamples the labels from their prior, keeping the graph.
    fn sample_only_labels(&mut self) -> Result<(), GinfError>;

    /// Compacts the current labels.
    fn reduce_labels(&mut self) -> Result<(), GinfError> {
        let labels = self.labels();
        self.set_labels(&labels, true)
    }

    /// Whether labels form a hierarchy.
    fn is_nested(&self) -> bool {
        false
    }

    /// Current label hierarchy; a single level for flat models.
    fn nested_labels(&self) -> NestedLabels {
        vec![self.labels()]
    }

    /// Replaces the label hierarchy.
    fn set_nested_labels(&mut self, labels: &[Labels], reduce: bool) -> Result<(), GinfError> {
        match labels.first() {
            Some(level) => self.set_labels(level, reduce),
            None => Err(GinfError::Labels(ErrorInfo::new(
                "empty-hierarchy",
                "nested labels must contain at least one level",
            ))),
        }
    }

    /// Snapshot of the labels in the form matching [`LabelModel::is_nested`].
    fn label_state(&self) -> LabelState {
        if self.is_nested() {
            LabelState::Nested(self.nested_labels())
        } else {
            LabelState::Flat(self.labels())
        }
    }

    /// Restores a snapshot taken with [`LabelModel::label_state`] verbatim.
    fn set_label_state(&mut self, state: &LabelState) -> Result<(), GinfError> {
        match state {
            LabelState::Flat(labels) => self.set_labels(labels, false),
            LabelState::Nested(levels) => self.set_nested_labels(levels, false),
        }
    }
}

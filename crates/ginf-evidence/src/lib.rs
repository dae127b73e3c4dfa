#![deny(missing_docs)]

//! Evidence and posterior estimators for graph models.
//!
//! Every estimator borrows an external model, mutates it while it works and
//! writes the graph (and labels, for labeled models) back before returning,
//! including on errors.

/// Annealed estimates along an inverse-temperature ladder.
pub mod annealed;
/// Sweep observers used by the estimators.
pub mod callbacks;
/// Enumeration-based estimates for small state spaces.
pub mod exact;
/// Collector-based mean-field estimates.
pub mod meanfield;
/// Method selection and dispatching entry points.
pub mod method;
/// Partition-sampling mean-field estimate for labeled models.
pub mod partition;

pub use annealed::{
    default_ladder, log_evidence_annealed, log_evidence_annealed_labels, validate_ladder, AnnealingRule,
    DEFAULT_LADDER_STEPS,
};
pub use callbacks::{CollectGraphOnSweep, CollectLikelihoodOnSweep, CollectPartitionOnSweep};
pub use exact::{
    exact_meanfield, log_evidence_exact, log_evidence_exact_labels, ExactMeanfield, GRAPH_ENUMERATION_WARN_SIZE,
    PARTITION_ENUMERATION_WARN_SIZE,
};
pub use meanfield::{log_evidence_iid_meanfield, log_posterior_meanfield};
pub use method::{
    default_labeled_method, graph_log_evidence, labeled_graph_log_evidence, log_evidence, log_posterior,
    EstimatorConfig, EvidenceMethod, EXACT_DEFAULT_MAX_SIZE,
};
pub use partition::log_evidence_partition_meanfield;

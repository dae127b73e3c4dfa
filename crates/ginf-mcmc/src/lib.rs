#![deny(missing_docs)]

//! MCMC driver for external graph and label models.
//!
//! The drivers borrow a model for the duration of a run, sweep it through
//! burn-in and observed sweeps, hand every observed state to a
//! [`SweepObserver`] and optionally restore the starting state.

/// YAML configuration schema and defaults.
pub mod config;
/// Deterministic seed derivation helpers.
pub mod determinism;
/// Graph and label drivers.
pub mod driver;
/// Scoped snapshot and restore of model state.
pub mod guard;
/// Per-sweep records and coverage summaries.
pub mod metrics;
/// Per-sweep observer interface.
pub mod observer;

pub use config::{LabelMcmcConfig, McmcConfig, SweepKind, UnfreezeRates};
pub use driver::{run_backend_label_mcmc, run_graph_mcmc, run_label_mcmc, CommunityBackend};
pub use guard::{GraphSnapshot, LabelSnapshot, ModelGuard, Snapshot};
pub use metrics::{CoverageMetrics, McmcSummary, MetricsRecorder, SweepRecord};
pub use observer::{NoObserver, SweepObserver};

use std::fs::File;
use std::io::Write;
use std::path::Path;

use ginf_graph::LabelState;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::SweepKind;

/// Diagnostics of one observed sweep.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SweepRecord {
    /// Sweep index, burn-in excluded.
    pub sweep: usize,
    /// Wall-clock duration of the kernel moves.
    pub duration_secs: f64,
    /// Accepted moves.
    pub accepted: usize,
    /// Attempted moves.
    pub proposed: usize,
    /// Log-likelihood after the sweep (verbose runs only).
    pub log_likelihood: Option<f64>,
    /// Log-prior after the sweep (verbose runs only).
    pub log_prior: Option<f64>,
    /// Log-joint after the sweep (verbose runs only).
    pub log_joint: Option<f64>,
    /// Canonical hash of the sampled graph or labels.
    pub state_hash: Option<String>,
}

impl SweepRecord {
    /// Emits the record as a tracing event.
    ///
    /// Verbose records go to `info`, the rest to `debug`.
    pub fn log(&self, verbose: bool) {
        if verbose {
            tracing::info!(
                sweep = self.sweep,
                duration = self.duration_secs,
                accepted = self.accepted,
                log_likelihood = self.log_likelihood,
                log_prior = self.log_prior,
                log_joint = self.log_joint,
                "mcmc sweep"
            );
        } else {
            tracing::debug!(
                sweep = self.sweep,
                duration = self.duration_secs,
                accepted = self.accepted,
                "mcmc sweep"
            );
        }
    }
}

/// Exploration summary over the recorded sweeps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoverageMetrics {
    /// Distinct states visited after a sweep.
    pub unique_states: usize,
    /// Fraction of hashed sweeps that revisited an earlier state.
    pub revisit_fraction: f64,
    /// Mean log-joint over the sweeps that recorded it.
    pub mean_log_joint: Option<f64>,
    /// Variance of the log-joint over the sweeps that recorded it.
    pub log_joint_variance: Option<f64>,
}

impl CoverageMetrics {
    /// Returns an empty coverage descriptor.
    pub fn empty() -> Self {
        Self {
            unique_states: 0,
            revisit_fraction: 0.0,
            mean_log_joint: None,
            log_joint_variance: None,
        }
    }
}

/// Collects per-sweep records and computes coverage.
#[derive(Debug, Default)]
pub struct MetricsRecorder {
    records: Vec<SweepRecord>,
    unique_hashes: IndexSet<String>,
    hashed: usize,
}

impl MetricsRecorder {
    /// Creates a new recorder instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one sweep.
    pub fn push(&mut self, record: SweepRecord) {
        if let Some(hash) = &record.state_hash {
            self.unique_hashes.insert(hash.clone());
            self.hashed += 1;
        }
        self.records.push(record);
    }

    /// Recorded sweeps in order.
    pub fn records(&self) -> &[SweepRecord] {
        &self.records
    }

    /// Accepted over attempted moves, zero when nothing was attempted.
    pub fn acceptance_rate(&self) -> f64 {
        let accepted: usize = self.records.iter().map(|record| record.accepted).sum();
        let proposed: usize = self.records.iter().map(|record| record.proposed).sum();
        if proposed == 0 {
            0.0
        } else {
            accepted as f64 / proposed as f64
        }
    }

    /// Computes coverage metrics from the recorded data.
    pub fn coverage(&self) -> CoverageMetrics {
        if self.records.is_empty() {
            return CoverageMetrics::empty();
        }
        let joints: Vec<f64> = self.records.iter().filter_map(|record| record.log_joint).collect();
        let (mean_log_joint, log_joint_variance) = if joints.is_empty() {
            (None, None)
        } else {
            let n = joints.len() as f64;
            let mean = joints.iter().sum::<f64>() / n;
            let variance = joints.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / n;
            (Some(mean), Some(variance))
        };
        let revisit_fraction = if self.hashed == 0 {
            0.0
        } else {
            (self.hashed - self.unique_hashes.len()) as f64 / self.hashed as f64
        };
        CoverageMetrics {
            unique_states: self.unique_hashes.len(),
            revisit_fraction,
            mean_log_joint,
            log_joint_variance,
        }
    }

    /// Writes the recorded sweeps to a CSV file.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        writeln!(
            file,
            "sweep,duration_secs,accepted,proposed,log_likelihood,log_prior,log_joint,state_hash"
        )?;
        for record in &self.records {
            writeln!(
                file,
                "{},{:.6},{},{},{},{},{},{}",
                record.sweep,
                record.duration_secs,
                record.accepted,
                record.proposed,
                optional(record.log_likelihood),
                optional(record.log_prior),
                optional(record.log_joint),
                record.state_hash.as_deref().unwrap_or(""),
            )?;
        }
        Ok(())
    }

    /// Consumes the recorder into a run summary.
    pub fn into_summary(self, started_at: String, sweep_kind: SweepKind, burn_accepted: usize) -> McmcSummary {
        McmcSummary {
            started_at,
            sweep_kind,
            sweeps: self.records.len(),
            burn_accepted,
            acceptance_rate: self.acceptance_rate(),
            coverage: self.coverage(),
            records: self.records,
        }
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.6}")).unwrap_or_default()
}

/// Summary returned by the drivers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct McmcSummary {
    /// RFC 3339 timestamp of the run start.
    pub started_at: String,
    /// Kernel used by the run.
    pub sweep_kind: SweepKind,
    /// Number of observed sweeps.
    pub sweeps: usize,
    /// Moves accepted during burn-in.
    pub burn_accepted: usize,
    /// Accepted over attempted moves across observed sweeps.
    pub acceptance_rate: f64,
    /// Coverage of the visited states.
    pub coverage: CoverageMetrics,
    /// Per-sweep records.
    pub records: Vec<SweepRecord>,
}

/// SHA-256 hex digest of a label assignment.
pub fn label_state_hash(state: &LabelState) -> String {
    let mut hasher = Sha256::new();
    let levels: &[Vec<usize>] = match state {
        LabelState::Flat(labels) => std::slice::from_ref(labels),
        LabelState::Nested(levels) => levels,
    };
    hasher.update((levels.len() as u64).to_le_bytes());
    for level in levels {
        hasher.update((level.len() as u64).to_le_bytes());
        for &label in level {
            hasher.update((label as u64).to_le_bytes());
        }
    }
    format!("{:x}", hasher.finalize())
}

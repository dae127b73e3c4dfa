//! Annealed evidence along an inverse-temperature ladder on the likelihood.

use std::fmt;
use std::str::FromStr;

use ginf_core::errors::{ErrorInfo, GinfError};
use ginf_core::log_mean_exp;
use ginf_graph::{GraphModel, LabelModel, Multigraph};
use ginf_mcmc::determinism::segment_seed;
use ginf_mcmc::{
    run_graph_mcmc, run_label_mcmc, GraphSnapshot, LabelMcmcConfig, LabelSnapshot, McmcConfig, ModelGuard,
};
use serde::{Deserialize, Serialize};

use crate::callbacks::CollectLikelihoodOnSweep;

/// Number of segments of [`default_ladder`] used when no ladder is given.
pub const DEFAULT_LADDER_STEPS: usize = 10;

/// How a segment's likelihood samples become a log-evidence increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnealingRule {
    /// `(β_ub - β_lo) · log_mean_exp(ℓ)`.
    #[default]
    ThermodynamicIntegration,
    /// `log_mean_exp((β_ub - β_lo) · ℓ)`.
    SteppingStone,
}

impl AnnealingRule {
    /// Configuration name of the rule.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnealingRule::ThermodynamicIntegration => "thermodynamic_integration",
            AnnealingRule::SteppingStone => "stepping_stone",
        }
    }

    /// Contribution of the segment `[beta_lo, beta_ub]`.
    pub fn segment(&self, beta_lo: f64, beta_ub: f64, log_likelihoods: &[f64]) -> f64 {
        let width = beta_ub - beta_lo;
        match self {
            AnnealingRule::ThermodynamicIntegration => width * log_mean_exp(log_likelihoods),
            AnnealingRule::SteppingStone => {
                let scaled: Vec<f64> = log_likelihoods.iter().map(|value| width * value).collect();
                log_mean_exp(&scaled)
            }
        }
    }
}

impl fmt::Display for AnnealingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnnealingRule {
    type Err = GinfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "thermodynamic_integration" | "ti" => Ok(AnnealingRule::ThermodynamicIntegration),
            "stepping_stone" | "ss" => Ok(AnnealingRule::SteppingStone),
            other => Err(GinfError::Config(
                ErrorInfo::new("unknown-annealing-rule", format!("unknown annealing rule: {other}"))
                    .with_hint("expected thermodynamic_integration or stepping_stone"),
            )),
        }
    }
}

/// Ladder `β_k = (k / steps)^{1/2}` for `k = 0..=steps`.
///
/// The square root concentrates temperatures near `β = 0`. Zero steps is
/// treated as one.
pub fn default_ladder(steps: usize) -> Vec<f64> {
    let steps = steps.max(1);
    (0..=steps).map(|k| (k as f64 / steps as f64).sqrt()).collect()
}

/// Checks that `betas` is a finite, strictly increasing path from 0 to 1.
pub fn validate_ladder(betas: &[f64]) -> Result<(), GinfError> {
    let invalid = |message: &str| {
        GinfError::Config(
            ErrorInfo::new("invalid-ladder", message.to_string()).with_context("betas", format!("{betas:?}")),
        )
    };
    if betas.len() < 2 {
        return Err(invalid("ladder needs at least two temperatures"));
    }
    if betas.iter().any(|beta| !beta.is_finite()) {
        return Err(invalid("ladder temperatures must be finite"));
    }
    if betas[0] != 0.0 || betas[betas.len() - 1] != 1.0 {
        return Err(invalid("ladder must start at 0 and end at 1"));
    }
    if betas.windows(2).any(|pair| pair[1] <= pair[0]) {
        return Err(invalid("ladder must be strictly increasing"));
    }
    Ok(())
}

fn check_sweeps(n_sweeps: usize) -> Result<(), GinfError> {
    if n_sweeps == 0 {
        return Err(GinfError::Config(
            ErrorInfo::new("empty-segment", "annealing needs at least one sweep per segment")
                .with_context("n_sweeps", "0"),
        ));
    }
    Ok(())
}

/// Annealed log-evidence of the model's data.
///
/// For every adjacent pair of the ladder the graph driver runs at
/// likelihood temperature `β_lo`, recording `log_likelihood()` after each
/// sweep, and `rule` turns the records into the segment's contribution.
/// With `start_from_original` each segment continues from the graph the
/// previous one ended on; otherwise every segment redraws its starting graph
/// from the prior. The model's graph is restored afterwards.
pub fn log_evidence_annealed<M: GraphModel + ?Sized>(
    model: &mut M,
    betas: &[f64],
    config: &McmcConfig,
    rule: AnnealingRule,
) -> Result<f64, GinfError> {
    validate_ladder(betas)?;
    check_sweeps(config.n_sweeps)?;
    config.validate_for(&*model)?;
    let mut guard = ModelGuard::<M, GraphSnapshot>::new(model);
    let result = graph_segments(&mut *guard, betas, config, rule);
    guard.finish(result)
}

fn graph_segments<M: GraphModel + ?Sized>(
    model: &mut M,
    betas: &[f64],
    config: &McmcConfig,
    rule: AnnealingRule,
) -> Result<f64, GinfError> {
    let mut total = 0.0;
    for (segment, pair) in betas.windows(2).enumerate() {
        let (beta_lo, beta_ub) = (pair[0], pair[1]);
        let segment_config = McmcConfig {
            beta_likelihood: beta_lo,
            reset_original: false,
            ..config.clone()
        };
        let mut observer = CollectLikelihoodOnSweep::new();
        run_graph_mcmc(model, &segment_config, &mut observer)?;
        let contribution = rule.segment(beta_lo, beta_ub, observer.samples());
        log_segment(segment, beta_lo, beta_ub, contribution, config.verbose);
        total += contribution;
    }
    Ok(total)
}

/// Annealed log-evidence of `graph` under a labeled model.
///
/// Same ladder walk as [`log_evidence_annealed`] with the label driver. The
/// label resampling stream of segment `k` is seeded from `config.seed` and
/// `k`. The model's graph and labels are restored afterwards.
pub fn log_evidence_annealed_labels<M: LabelModel + ?Sized>(
    model: &mut M,
    graph: &Multigraph,
    betas: &[f64],
    config: &LabelMcmcConfig,
    rule: AnnealingRule,
) -> Result<f64, GinfError> {
    validate_ladder(betas)?;
    check_sweeps(config.base.n_sweeps)?;
    config.validate_for(&*model)?;
    let mut guard = ModelGuard::<M, (GraphSnapshot, LabelSnapshot)>::new(model);
    let result = label_segments(&mut *guard, graph, betas, config, rule);
    guard.finish(result)
}

fn label_segments<M: LabelModel + ?Sized>(
    model: &mut M,
    graph: &Multigraph,
    betas: &[f64],
    config: &LabelMcmcConfig,
    rule: AnnealingRule,
) -> Result<f64, GinfError> {
    model.set_graph(graph)?;
    let mut total = 0.0;
    for (segment, pair) in betas.windows(2).enumerate() {
        let (beta_lo, beta_ub) = (pair[0], pair[1]);
        let segment_config = LabelMcmcConfig {
            base: McmcConfig {
                beta_likelihood: beta_lo,
                reset_original: false,
                ..config.base.clone()
            },
            resample_rate: config.resample_rate,
            seed: segment_seed(config.seed, segment),
        };
        let mut observer = CollectLikelihoodOnSweep::new();
        run_label_mcmc(model, &segment_config, &mut observer)?;
        let contribution = rule.segment(beta_lo, beta_ub, observer.samples());
        log_segment(segment, beta_lo, beta_ub, contribution, config.base.verbose);
        total += contribution;
    }
    Ok(total)
}

fn log_segment(segment: usize, beta_lo: f64, beta_ub: f64, contribution: f64, verbose: bool) {
    if verbose {
        tracing::info!(segment, beta_lo, beta_ub, contribution, "annealing segment");
    } else {
        tracing::debug!(segment, beta_lo, beta_ub, contribution, "annealing segment");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ladder_is_valid_and_concentrated_near_zero() {
        let betas = default_ladder(DEFAULT_LADDER_STEPS);
        assert_eq!(betas.len(), 11);
        validate_ladder(&betas).unwrap();
        assert!((betas[1] - 0.1f64.sqrt()).abs() < 1e-12);
        assert!(betas[1] - betas[0] > betas[10] - betas[9]);
    }

    #[test]
    fn ladder_validation_rejects_malformed_paths() {
        for betas in [
            vec![0.0],
            vec![0.1, 1.0],
            vec![0.0, 0.9],
            vec![0.0, 0.5, 0.5, 1.0],
            vec![0.0, f64::NAN, 1.0],
        ] {
            let err = validate_ladder(&betas).unwrap_err();
            assert_eq!(err.info().code, "invalid-ladder");
        }
    }

    #[test]
    fn rules_agree_on_constant_samples() {
        let samples = [-2.0; 5];
        let ti = AnnealingRule::ThermodynamicIntegration.segment(0.0, 0.5, &samples);
        let ss = AnnealingRule::SteppingStone.segment(0.0, 0.5, &samples);
        assert!((ti + 1.0).abs() < 1e-12);
        assert!((ss + 1.0).abs() < 1e-12);
    }

    #[test]
    fn rule_names_parse() {
        assert_eq!("ti".parse::<AnnealingRule>().unwrap(), AnnealingRule::ThermodynamicIntegration);
        assert_eq!("Stepping_Stone".parse::<AnnealingRule>().unwrap(), AnnealingRule::SteppingStone);
        assert!("simpson".parse::<AnnealingRule>().unwrap_err().is_config());
    }
}

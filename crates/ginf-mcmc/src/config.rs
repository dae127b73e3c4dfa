use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use ginf_core::errors::{ErrorInfo, GinfError};
use ginf_graph::GenerativeModel;
use serde::{Deserialize, Serialize};

/// Kernel used for every sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepKind {
    /// Metropolis-Hastings moves.
    #[default]
    Metropolis,
    /// Gibbs moves.
    Gibbs,
}

impl SweepKind {
    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SweepKind::Metropolis => "metropolis",
            SweepKind::Gibbs => "gibbs",
        }
    }
}

impl fmt::Display for SweepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SweepKind {
    type Err = GinfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "metropolis" => Ok(Self::Metropolis),
            "gibbs" => Ok(Self::Gibbs),
            _ => Err(GinfError::Config(
                ErrorInfo::new("unknown-sweep-kind", format!("unknown sweep kind: {s}"))
                    .with_hint("supported: metropolis, gibbs"),
            )),
        }
    }
}

/// Activation rates forwarded to the model before sweeping. `None` leaves the
/// move class untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct UnfreezeRates {
    /// Rate for graph moves.
    #[serde(default)]
    pub graph: Option<f64>,
    /// Rate for moves on the graph prior's latent variables.
    #[serde(default)]
    pub graph_prior: Option<f64>,
    /// Rate for parameter moves.
    #[serde(default)]
    pub param: Option<f64>,
}

/// Options of a graph MCMC run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McmcConfig {
    /// Number of observed sweeps.
    #[serde(default = "default_n_sweeps")]
    pub n_sweeps: usize,
    /// Kernel moves per sweep.
    #[serde(default = "default_n_steps")]
    pub n_steps: usize,
    /// Parameter moves per sweep (models with parameter moves only).
    #[serde(default)]
    pub n_param_steps: usize,
    /// Kernel moves of the single unobserved burn-in sweep.
    #[serde(default)]
    pub burn: usize,
    /// Inverse temperature of the prior.
    #[serde(default = "default_beta")]
    pub beta_prior: f64,
    /// Inverse temperature of the likelihood.
    #[serde(default = "default_beta")]
    pub beta_likelihood: f64,
    /// Kernel selector.
    #[serde(default)]
    pub sweep_kind: SweepKind,
    /// Start from the model's current state instead of a prior draw.
    #[serde(default)]
    pub start_from_original: bool,
    /// Restore the starting state once the run ends.
    #[serde(default)]
    pub reset_original: bool,
    /// Activation rates forwarded to the model.
    #[serde(default)]
    pub unfreeze: UnfreezeRates,
    /// Emit per-sweep densities at `info` level.
    #[serde(default)]
    pub verbose: bool,
}

fn default_n_sweeps() -> usize {
    1000
}

fn default_n_steps() -> usize {
    1000
}

fn default_beta() -> f64 {
    1.0
}

impl Default for McmcConfig {
    fn default() -> Self {
        Self {
            n_sweeps: default_n_sweeps(),
            n_steps: default_n_steps(),
            n_param_steps: 0,
            burn: 0,
            beta_prior: default_beta(),
            beta_likelihood: default_beta(),
            sweep_kind: SweepKind::default(),
            start_from_original: false,
            reset_original: false,
            unfreeze: UnfreezeRates::default(),
            verbose: false,
        }
    }
}

impl McmcConfig {
    /// Parses a YAML document; absent fields take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, GinfError> {
        serde_yaml::from_str(yaml)
            .map_err(|err| GinfError::Config(ErrorInfo::new("yaml-parse", err.to_string())))
    }

    /// Reads a YAML configuration file.
    pub fn from_path(path: &Path) -> Result<Self, GinfError> {
        let contents = read_config(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Checks the options that do not depend on the model.
    pub fn validate(&self) -> Result<(), GinfError> {
        check_beta("beta_prior", self.beta_prior)?;
        check_beta("beta_likelihood", self.beta_likelihood)?;
        check_rate("unfreeze.graph", self.unfreeze.graph)?;
        check_rate("unfreeze.graph_prior", self.unfreeze.graph_prior)?;
        check_rate("unfreeze.param", self.unfreeze.param)?;
        Ok(())
    }

    /// Checks the options against the capabilities of `model`.
    pub fn validate_for<M: GenerativeModel + ?Sized>(&self, model: &M) -> Result<(), GinfError> {
        self.validate()?;
        if self.sweep_kind == SweepKind::Gibbs && !model.supports_gibbs() {
            return Err(GinfError::Config(
                ErrorInfo::new("gibbs-unsupported", "model does not implement gibbs sweeps")
                    .with_hint("use sweep_kind: metropolis"),
            ));
        }
        if self.n_param_steps > 0 && !model.has_param_moves() {
            return Err(GinfError::Config(
                ErrorInfo::new("param-moves-unsupported", "model has no parameter moves")
                    .with_context("n_param_steps", self.n_param_steps.to_string()),
            ));
        }
        Ok(())
    }
}

/// Options of a label MCMC run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelMcmcConfig {
    /// Sweep options shared with graph runs.
    #[serde(flatten)]
    pub base: McmcConfig,
    /// Probability of redrawing the labels from their prior before a sweep.
    #[serde(default = "default_resample_rate")]
    pub resample_rate: f64,
    /// Seed of the resampling decisions.
    #[serde(default)]
    pub seed: u64,
}

fn default_resample_rate() -> f64 {
    0.01
}

impl Default for LabelMcmcConfig {
    fn default() -> Self {
        Self {
            base: McmcConfig::default(),
            resample_rate: default_resample_rate(),
            seed: 0,
        }
    }
}

impl LabelMcmcConfig {
    /// Parses a YAML document; absent fields take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, GinfError> {
        serde_yaml::from_str(yaml)
            .map_err(|err| GinfError::Config(ErrorInfo::new("yaml-parse", err.to_string())))
    }

    /// Reads a YAML configuration file.
    pub fn from_path(path: &Path) -> Result<Self, GinfError> {
        let contents = read_config(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Checks the options against the capabilities of `model`.
    pub fn validate_for<M: GenerativeModel + ?Sized>(&self, model: &M) -> Result<(), GinfError> {
        self.base.validate_for(model)?;
        check_rate("resample_rate", Some(self.resample_rate))
    }
}

fn read_config(path: &Path) -> Result<String, GinfError> {
    fs::read_to_string(path).map_err(|err| {
        GinfError::Serde(
            ErrorInfo::new("config-read", err.to_string()).with_context("path", path.display().to_string()),
        )
    })
}

fn check_beta(name: &str, value: f64) -> Result<(), GinfError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(GinfError::Config(
            ErrorInfo::new("invalid-temperature", "inverse temperatures must be finite and non-negative")
                .with_context(name, value.to_string()),
        ))
    }
}

fn check_rate(name: &str, rate: Option<f64>) -> Result<(), GinfError> {
    match rate {
        Some(rate) if !(0.0..=1.0).contains(&rate) => Err(GinfError::Config(
            ErrorInfo::new("invalid-rate", "rates must lie in [0, 1]").with_context(name, rate.to_string()),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_fills_defaults() {
        let config = McmcConfig::from_yaml_str("n_sweeps: 5\nsweep_kind: gibbs\n").unwrap();
        assert_eq!(config.n_sweeps, 5);
        assert_eq!(config.n_steps, 1000);
        assert_eq!(config.sweep_kind, SweepKind::Gibbs);
        assert_eq!(config.beta_likelihood, 1.0);
    }

    #[test]
    fn label_config_flattens_base_options() {
        let config = LabelMcmcConfig::from_yaml_str("n_steps: 30\nresample_rate: 0.5\n").unwrap();
        assert_eq!(config.base.n_steps, 30);
        assert_eq!(config.resample_rate, 0.5);
        assert_eq!(config.base.n_sweeps, 1000);
    }

    #[test]
    fn invalid_values_are_config_errors() {
        let mut config = McmcConfig::default();
        config.beta_likelihood = f64::NAN;
        assert!(config.validate().unwrap_err().is_config());
        let mut config = McmcConfig::default();
        config.unfreeze.graph = Some(1.5);
        assert_eq!(config.validate().unwrap_err().info().code, "invalid-rate");
        assert!("hamiltonian".parse::<SweepKind>().unwrap_err().is_config());
        assert!(McmcConfig::from_yaml_str("sweep_kind: hamiltonian").unwrap_err().is_config());
    }
}

//! Scoring a graph against the fitted per-pair distribution.

use std::fmt;
use std::str::FromStr;

use ginf_core::errors::{ErrorInfo, GinfError};
use ginf_core::RngHandle;
use ginf_graph::{GraphModel, Multigraph};
use serde::{Deserialize, Serialize};

use crate::collector::EdgeCollector;

const MEAN_ACCURACY_REALIZATIONS: usize = 100;
const LOG_LOSS_CLIP: f64 = 1e-15;

/// Metric used by [`EdgeCollector::score`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreMetric {
    /// Log-probability of the graph under the collector.
    LogProb,
    /// Accuracy averaged over realizations of the prediction matrix.
    MeanAccuracy,
    /// Accuracy of the prediction matrix thresholded at one half.
    MapAccuracy,
    /// Metric resolved by name: first on the model, then as a pairwise metric.
    Named(String),
}

impl Default for ScoreMetric {
    fn default() -> Self {
        ScoreMetric::Named(PairwiseMetric::RocAuc.name().to_string())
    }
}

impl FromStr for ScoreMetric {
    type Err = GinfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err(GinfError::config("empty-metric", "metric name must not be empty")),
            "log_prob" => Ok(Self::LogProb),
            "mean_accuracy" => Ok(Self::MeanAccuracy),
            "map_accuracy" => Ok(Self::MapAccuracy),
            other => Ok(Self::Named(other.to_string())),
        }
    }
}

/// Binary classification metric comparing the flattened adjacency matrix with
/// the flattened prediction matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairwiseMetric {
    /// Fraction of entries classified correctly at threshold one half.
    Accuracy,
    /// Precision at threshold one half.
    Precision,
    /// Recall at threshold one half.
    Recall,
    /// Harmonic mean of precision and recall at threshold one half.
    F1,
    /// Area under the ROC curve.
    RocAuc,
    /// Step-wise area under the precision/recall curve.
    AveragePrecision,
    /// Mean squared difference between probability and outcome.
    BrierScore,
    /// Mean negative log-likelihood of the outcomes.
    LogLoss,
}

impl PairwiseMetric {
    /// Canonical name of the metric.
    pub fn name(&self) -> &'static str {
        match self {
            PairwiseMetric::Accuracy => "accuracy_score",
            PairwiseMetric::Precision => "precision_score",
            PairwiseMetric::Recall => "recall_score",
            PairwiseMetric::F1 => "f1_score",
            PairwiseMetric::RocAuc => "roc_auc_score",
            PairwiseMetric::AveragePrecision => "average_precision_score",
            PairwiseMetric::BrierScore => "brier_score_loss",
            PairwiseMetric::LogLoss => "log_loss",
        }
    }

    /// Evaluates the metric on binary targets and predicted probabilities.
    pub fn evaluate(&self, truth: &[bool], scores: &[f64]) -> Result<f64, GinfError> {
        if truth.len() != scores.len() {
            return Err(GinfError::Graph(
                ErrorInfo::new("length-mismatch", "targets and scores differ in length")
                    .with_context("targets", truth.len().to_string())
                    .with_context("scores", scores.len().to_string()),
            ));
        }
        if truth.is_empty() {
            return Err(GinfError::Data(ErrorInfo::new(
                "empty-targets",
                "cannot score an empty set of pairs",
            )));
        }
        let n = truth.len() as f64;
        let predicted: Vec<bool> = scores.iter().map(|&p| p > 0.5).collect();
        let confusion = Confusion::tally(truth, &predicted);
        let value = match self {
            PairwiseMetric::Accuracy => (confusion.tp + confusion.tn) as f64 / n,
            PairwiseMetric::Precision => ratio(confusion.tp, confusion.tp + confusion.fp),
            PairwiseMetric::Recall => ratio(confusion.tp, confusion.tp + confusion.fn_),
            PairwiseMetric::F1 => ratio(2 * confusion.tp, 2 * confusion.tp + confusion.fp + confusion.fn_),
            PairwiseMetric::RocAuc => roc_auc(truth, scores)?,
            PairwiseMetric::AveragePrecision => average_precision(truth, scores)?,
            PairwiseMetric::BrierScore => {
                truth
                    .iter()
                    .zip(scores)
                    .map(|(&y, &p)| (p - f64::from(u8::from(y))).powi(2))
                    .sum::<f64>()
                    / n
            }
            PairwiseMetric::LogLoss => {
                -truth
                    .iter()
                    .zip(scores)
                    .map(|(&y, &p)| {
                        let p = ginf_core::clip(p, LOG_LOSS_CLIP, 1.0 - LOG_LOSS_CLIP);
                        if y {
                            p.ln()
                        } else {
                            (1.0 - p).ln()
                        }
                    })
                    .sum::<f64>()
                    / n
            }
        };
        Ok(value)
    }
}

impl fmt::Display for PairwiseMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PairwiseMetric {
    type Err = GinfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "accuracy" | "accuracy_score" => Ok(Self::Accuracy),
            "precision" | "precision_score" => Ok(Self::Precision),
            "recall" | "recall_score" => Ok(Self::Recall),
            "f1" | "f1_score" => Ok(Self::F1),
            "roc_auc" | "roc_auc_score" => Ok(Self::RocAuc),
            "average_precision" | "average_precision_score" => Ok(Self::AveragePrecision),
            "brier_score" | "brier_score_loss" => Ok(Self::BrierScore),
            "log_loss" => Ok(Self::LogLoss),
            _ => Err(GinfError::Config(
                ErrorInfo::new("unknown-metric", format!("unknown metric: {s}")).with_hint(
                    "supported: log_prob, mean_accuracy, map_accuracy, accuracy_score, precision_score, \
                     recall_score, f1_score, roc_auc_score, average_precision_score, brier_score_loss, log_loss",
                ),
            )),
        }
    }
}

#[derive(Debug, Default)]
struct Confusion {
    tp: usize,
    tn: usize,
    fp: usize,
    fn_: usize,
}

impl Confusion {
    fn tally(truth: &[bool], predicted: &[bool]) -> Self {
        let mut confusion = Confusion::default();
        for (&y, &p) in truth.iter().zip(predicted) {
            match (y, p) {
                (true, true) => confusion.tp += 1,
                (false, false) => confusion.tn += 1,
                (false, true) => confusion.fp += 1,
                (true, false) => confusion.fn_ += 1,
            }
        }
        confusion
    }
}

// Zero when the denominator vanishes.
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn class_counts(truth: &[bool]) -> Result<(usize, usize), GinfError> {
    let positives = truth.iter().filter(|&&y| y).count();
    let negatives = truth.len() - positives;
    if positives == 0 || negatives == 0 {
        return Err(GinfError::Data(
            ErrorInfo::new("single-class", "ranking metrics need both present and absent pairs")
                .with_context("positives", positives.to_string())
                .with_context("negatives", negatives.to_string()),
        ));
    }
    Ok((positives, negatives))
}

fn descending_order(scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    order
}

/// Mann-Whitney statistic with tied scores sharing their average rank.
fn roc_auc(truth: &[bool], scores: &[f64]) -> Result<f64, GinfError> {
    let (positives, negatives) = class_counts(truth)?;
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));
    let mut positive_rank_sum = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // Ranks start..end (1-based start+1..=end) share their mean.
        let rank = (start + 1 + end) as f64 / 2.0;
        let tied_positives = order[start..end].iter().filter(|&&idx| truth[idx]).count();
        positive_rank_sum += rank * tied_positives as f64;
        start = end;
    }
    let p = positives as f64;
    Ok((positive_rank_sum - p * (p + 1.0) / 2.0) / (p * negatives as f64))
}

fn average_precision(truth: &[bool], scores: &[f64]) -> Result<f64, GinfError> {
    let (positives, _) = class_counts(truth)?;
    let order = descending_order(scores);
    let (mut tp, mut fp) = (0usize, 0usize);
    let mut previous_recall = 0.0;
    let mut area = 0.0;
    let mut idx = 0;
    while idx < order.len() {
        let threshold = scores[order[idx]];
        while idx < order.len() && scores[order[idx]] == threshold {
            if truth[order[idx]] {
                tp += 1;
            } else {
                fp += 1;
            }
            idx += 1;
        }
        let recall = tp as f64 / positives as f64;
        let precision = tp as f64 / (tp + fp) as f64;
        area += (recall - previous_recall) * precision;
        previous_recall = recall;
    }
    Ok(area)
}

fn indicator_entries(matrix: &[Vec<usize>]) -> Vec<bool> {
    matrix.iter().flatten().map(|&value| value > 0).collect()
}

fn accuracy(truth: &[bool], predicted: &[bool]) -> f64 {
    let correct = truth.iter().zip(predicted).filter(|(y, p)| y == p).count();
    correct as f64 / truth.len().max(1) as f64
}

impl EdgeCollector {
    /// Scores `graph` against the collector.
    pub fn score(&self, graph: &Multigraph, metric: &ScoreMetric, rng: &mut RngHandle) -> Result<f64, GinfError> {
        if let ScoreMetric::LogProb = metric {
            return Ok(self.log_prob_estimate(graph));
        }
        self.check_size(graph)?;
        let truth = indicator_entries(&graph.adjacency_matrix(false));
        let prediction: Vec<f64> = self.prediction_matrix().into_iter().flatten().collect();
        match metric {
            ScoreMetric::LogProb => Ok(self.log_prob_estimate(graph)),
            ScoreMetric::MeanAccuracy => {
                let realizations: Vec<Vec<bool>> = if self.graph_collection().is_empty() {
                    (0..MEAN_ACCURACY_REALIZATIONS)
                        .map(|_| prediction.iter().map(|&p| p > rng.uniform()).collect())
                        .collect()
                } else {
                    self.graph_collection()
                        .iter()
                        .map(|entry| -> Result<Vec<bool>, GinfError> {
                            self.check_size(&entry.graph)?;
                            Ok(indicator_entries(&entry.graph.adjacency_matrix(false)))
                        })
                        .collect::<Result<_, GinfError>>()?
                };
                let total: f64 = realizations.iter().map(|predicted| accuracy(&truth, predicted)).sum();
                Ok(total / realizations.len() as f64)
            }
            ScoreMetric::MapAccuracy => {
                let predicted: Vec<bool> = prediction.iter().map(|&p| p > 0.5).collect();
                Ok(accuracy(&truth, &predicted))
            }
            ScoreMetric::Named(name) => name.parse::<PairwiseMetric>()?.evaluate(&truth, &prediction),
        }
    }

    /// Scores `graph`, offering named metrics to `model` first.
    ///
    /// The model's graph is set to `graph` while the metric is evaluated and
    /// restored afterwards.
    pub fn score_with_model<M: GraphModel + ?Sized>(
        &self,
        graph: &Multigraph,
        metric: &ScoreMetric,
        model: &mut M,
        rng: &mut RngHandle,
    ) -> Result<f64, GinfError> {
        if let ScoreMetric::Named(name) = metric {
            let original = model.graph();
            model.set_graph(graph)?;
            let delegated = model.metric(name);
            model.set_graph(&original)?;
            if let Some(value) = delegated {
                return Ok(value);
            }
        }
        self.score(graph, metric, rng)
    }

    fn check_size(&self, graph: &Multigraph) -> Result<(), GinfError> {
        if graph.size() == self.node_count() {
            Ok(())
        } else {
            Err(GinfError::Graph(
                ErrorInfo::new("size-mismatch", "graph size differs from the collector node count")
                    .with_context("graph_size", graph.size().to_string())
                    .with_context("node_count", self.node_count().to_string()),
            ))
        }
    }
}

#![allow(dead_code)]

use std::collections::BTreeMap;

use ginf_core::{all_pairs, log_factorial, Edge, GinfError, Labels, NestedLabels, RngHandle};
use ginf_graph::{reduce_partition, GenerativeModel, GraphModel, LabelModel, Multigraph};
use ginf_mcmc::CommunityBackend;
use rand::seq::SliceRandom;
use rand::Rng;

pub fn simple_pairs(size: usize) -> Vec<Edge> {
    all_pairs(size).filter(|edge| !edge.is_self_loop()).collect()
}

pub fn random_simple_graph(size: usize, edge_count: usize, rng: &mut RngHandle) -> Multigraph {
    let mut pairs = simple_pairs(size);
    pairs.shuffle(rng.inner_mut());
    let mut graph = Multigraph::new(size);
    for edge in pairs.into_iter().take(edge_count) {
        graph.add_edge(edge.first(), edge.second()).unwrap();
    }
    graph
}

pub fn log_binomial(n: usize, k: usize) -> f64 {
    log_factorial(n) - log_factorial(k) - log_factorial(n - k)
}

pub fn path_graph(size: usize) -> Multigraph {
    let mut graph = Multigraph::new(size);
    for vertex in 1..size {
        graph.add_edge(vertex - 1, vertex).unwrap();
    }
    graph
}

/// Simple graphs with a fixed edge count under a uniform prior. The
/// log-likelihood is `offset` plus the weight of every present pair.
pub struct PairwiseDataModel {
    pub graph: Multigraph,
    pub edge_count: usize,
    pub weights: BTreeMap<Edge, f64>,
    pub offset: f64,
    pub rng: RngHandle,
    pub sweeps: usize,
    pub fail_on_sweep: Option<usize>,
}

impl PairwiseDataModel {
    pub fn new(size: usize, edge_count: usize, offset: f64, seed: u64) -> Self {
        let mut rng = RngHandle::from_seed(seed);
        let graph = random_simple_graph(size, edge_count, &mut rng);
        Self {
            graph,
            edge_count,
            weights: BTreeMap::new(),
            offset,
            rng,
            sweeps: 0,
            fail_on_sweep: None,
        }
    }

    pub fn with_weight(mut self, i: usize, j: usize, weight: f64) -> Self {
        self.weights.insert(Edge::new(i, j), weight);
        self
    }

    fn weight(&self, edge: Edge) -> f64 {
        self.weights.get(&edge).copied().unwrap_or(0.0)
    }
}

impl GenerativeModel for PairwiseDataModel {
    fn size(&self) -> usize {
        self.graph.size()
    }

    fn log_likelihood(&self) -> f64 {
        self.offset + self.graph.edges().map(|(edge, _)| self.weight(edge)).sum::<f64>()
    }

    fn log_prior(&self) -> f64 {
        -log_binomial(simple_pairs(self.graph.size()).len(), self.edge_count)
    }

    fn sample(&mut self) -> Result<(), GinfError> {
        self.sample_prior()
    }

    fn sample_prior(&mut self) -> Result<(), GinfError> {
        self.graph = random_simple_graph(self.graph.size(), self.edge_count, &mut self.rng);
        Ok(())
    }

    fn metropolis_sweep(&mut self, n_steps: usize, _beta_prior: f64, beta_likelihood: f64) -> Result<usize, GinfError> {
        if self.fail_on_sweep == Some(self.sweeps) {
            return Err(GinfError::model("sweep-failed", "injected failure"));
        }
        self.sweeps += 1;
        let mut accepted = 0;
        for _ in 0..n_steps {
            let present: Vec<Edge> = self.graph.edges().map(|(edge, _)| edge).collect();
            let absent: Vec<Edge> = simple_pairs(self.graph.size())
                .into_iter()
                .filter(|edge| self.graph.edge_multiplicity(*edge) == 0)
                .collect();
            let (Some(&out), Some(&into)) = (present.choose(self.rng.inner_mut()), absent.choose(self.rng.inner_mut()))
            else {
                continue;
            };
            let delta = self.weight(into) - self.weight(out);
            if self.rng.uniform() < (beta_likelihood * delta).exp() {
                self.graph.set_multiplicity(out.first(), out.second(), 0)?;
                self.graph.add_edge(into.first(), into.second())?;
                accepted += 1;
            }
        }
        Ok(accepted)
    }
}

impl GraphModel for PairwiseDataModel {
    fn graph(&self) -> Multigraph {
        self.graph.clone()
    }

    fn set_graph(&mut self, graph: &Multigraph) -> Result<(), GinfError> {
        self.graph = graph.clone();
        Ok(())
    }

    fn edge_count(&self) -> usize {
        self.edge_count
    }

    fn with_self_loops(&self) -> bool {
        false
    }

    fn with_parallel_edges(&self) -> bool {
        false
    }
}

/// Labeled simple graphs: uniform label codes, uniform graph given the
/// edge count, and a penalty per edge joining two blocks.
pub struct BlockModel {
    pub graph: Multigraph,
    pub labels: Labels,
    pub edge_count: usize,
    pub penalty: f64,
    pub nested: bool,
    pub rng: RngHandle,
    pub label_sweeps: usize,
}

impl BlockModel {
    pub fn new(graph: Multigraph, penalty: f64, seed: u64) -> Self {
        let size = graph.size();
        let edge_count = graph.edge_count();
        Self {
            graph,
            labels: vec![0; size],
            edge_count,
            penalty,
            nested: false,
            rng: RngHandle::from_seed(seed),
            label_sweeps: 0,
        }
    }

    pub fn cut_edges(&self, labels: &[usize]) -> usize {
        self.graph
            .edges()
            .filter(|(edge, _)| labels[edge.first()] != labels[edge.second()])
            .map(|(_, multiplicity)| multiplicity)
            .sum()
    }

    /// Joint of `graph` with `labels`, computed without touching the model.
    pub fn joint_of(&self, labels: &[usize]) -> f64 {
        let size = self.graph.size() as f64;
        let prior = if size > 0.0 { -size * size.ln() } else { 0.0 };
        let pairs = simple_pairs(self.graph.size()).len();
        prior - self.penalty * self.cut_edges(labels) as f64 - log_binomial(pairs, self.edge_count)
    }

    fn draw_labels(&mut self) {
        let size = self.labels.len();
        self.labels = (0..size).map(|_| self.rng.gen_range(0..size)).collect();
    }
}

impl GenerativeModel for BlockModel {
    fn size(&self) -> usize {
        self.graph.size()
    }

    fn log_likelihood(&self) -> f64 {
        let pairs = simple_pairs(self.graph.size()).len();
        -self.penalty * self.cut_edges(&self.labels) as f64 - log_binomial(pairs, self.edge_count)
    }

    fn log_prior(&self) -> f64 {
        let size = self.graph.size() as f64;
        if size > 0.0 {
            -size * size.ln()
        } else {
            0.0
        }
    }

    fn sample(&mut self) -> Result<(), GinfError> {
        self.draw_labels();
        self.graph = random_simple_graph(self.graph.size(), self.edge_count, &mut self.rng);
        Ok(())
    }

    fn sample_prior(&mut self) -> Result<(), GinfError> {
        self.sample()
    }

    fn metropolis_sweep(&mut self, n_steps: usize, _beta_prior: f64, beta_likelihood: f64) -> Result<usize, GinfError> {
        self.label_sweeps += 1;
        let size = self.labels.len();
        if size == 0 {
            return Ok(0);
        }
        let mut accepted = 0;
        for _ in 0..n_steps {
            let vertex = self.rng.gen_range(0..size);
            let mut proposal = self.labels.clone();
            proposal[vertex] = self.rng.gen_range(0..size);
            let delta = -self.penalty * (self.cut_edges(&proposal) as f64 - self.cut_edges(&self.labels) as f64);
            if self.rng.uniform() < (beta_likelihood * delta).exp() {
                self.labels = proposal;
                accepted += 1;
            }
        }
        Ok(accepted)
    }
}

impl GraphModel for BlockModel {
    fn graph(&self) -> Multigraph {
        self.graph.clone()
    }

    fn set_graph(&mut self, graph: &Multigraph) -> Result<(), GinfError> {
        if graph.size() != self.labels.len() {
            return Err(GinfError::model("size-mismatch", "graph size differs from label count"));
        }
        self.graph = graph.clone();
        Ok(())
    }

    fn edge_count(&self) -> usize {
        self.edge_count
    }

    fn with_self_loops(&self) -> bool {
        false
    }

    fn with_parallel_edges(&self) -> bool {
        false
    }
}

impl LabelModel for BlockModel {
    fn labels(&self) -> Labels {
        self.labels.clone()
    }

    fn set_labels(&mut self, labels: &[usize], reduce: bool) -> Result<(), GinfError> {
        self.labels = if reduce {
            reduce_partition(labels)
        } else {
            labels.to_vec()
        };
        Ok(())
    }

    fn sample_only_labels(&mut self) -> Result<(), GinfError> {
        self.draw_labels();
        Ok(())
    }

    fn is_nested(&self) -> bool {
        self.nested
    }

    fn nested_labels(&self) -> NestedLabels {
        vec![self.labels.clone(), vec![0; self.labels.len()]]
    }
}

/// Backend that moves one vertex per sweep into block zero.
#[derive(Default)]
pub struct MergeBackend {
    pub sweeps: usize,
}

impl CommunityBackend<BlockModel> for MergeBackend {
    fn name(&self) -> &str {
        "merge"
    }

    fn sweep(&mut self, model: &mut BlockModel) -> Result<usize, GinfError> {
        let size = model.labels.len();
        if size > 0 {
            let vertex = self.sweeps % size;
            model.labels[vertex] = 0;
        }
        self.sweeps += 1;
        Ok(1)
    }
}

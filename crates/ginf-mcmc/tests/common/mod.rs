#![allow(dead_code)]

use ginf_core::{all_pairs, Edge, GinfError, Labels, RngHandle};
use ginf_graph::{
    reduce_partition, GenerativeModel, GibbsSummary, GraphModel, LabelModel, Multigraph,
};
use rand::seq::SliceRandom;
use rand::Rng;

/// Simple graphs with a fixed edge count whose moves swap one present edge
/// for one absent pair. Every call into the model is logged.
pub struct RecordingModel {
    pub graph: Multigraph,
    pub labels: Labels,
    pub edge_count: usize,
    pub rng: RngHandle,
    pub gibbs: bool,
    pub sweeps: Vec<usize>,
    pub prior_draws: usize,
    pub label_draws: usize,
    pub reductions: usize,
    pub unfreezes: Vec<(&'static str, f64)>,
    pub fail_on_sweep: Option<usize>,
}

impl RecordingModel {
    pub fn new(size: usize, edge_count: usize, seed: u64) -> Self {
        let mut model = Self {
            graph: Multigraph::new(size),
            labels: vec![0; size],
            edge_count,
            rng: RngHandle::from_seed(seed),
            gibbs: false,
            sweeps: Vec::new(),
            prior_draws: 0,
            label_draws: 0,
            reductions: 0,
            unfreezes: Vec::new(),
            fail_on_sweep: None,
        };
        model.draw_graph();
        model.prior_draws = 0;
        model
    }

    fn draw_graph(&mut self) {
        let mut pairs: Vec<Edge> = all_pairs(self.graph.size()).filter(|e| !e.is_self_loop()).collect();
        pairs.shuffle(self.rng.inner_mut());
        let mut graph = Multigraph::new(self.graph.size());
        for edge in pairs.into_iter().take(self.edge_count) {
            let (i, j) = edge.endpoints();
            graph.add_edge(i, j).unwrap();
        }
        self.graph = graph;
        self.prior_draws += 1;
    }

    fn swap_move(&mut self) -> bool {
        let present: Vec<Edge> = self.graph.edges().map(|(edge, _)| edge).collect();
        let absent: Vec<Edge> = all_pairs(self.graph.size())
            .filter(|e| !e.is_self_loop() && self.graph.edge_multiplicity(*e) == 0)
            .collect();
        let (Some(&out), Some(&into)) = (present.choose(self.rng.inner_mut()), absent.choose(self.rng.inner_mut()))
        else {
            return false;
        };
        self.graph.set_multiplicity(out.first(), out.second(), 0).unwrap();
        self.graph.add_edge(into.first(), into.second()).unwrap();
        true
    }

    fn run_sweep(&mut self, n_steps: usize) -> Result<usize, GinfError> {
        if self.fail_on_sweep == Some(self.sweeps.len()) {
            return Err(GinfError::model("sweep-failed", "injected failure"));
        }
        self.sweeps.push(n_steps);
        let mut accepted = 0;
        for _ in 0..n_steps {
            if self.swap_move() {
                accepted += 1;
            }
            if !self.labels.is_empty() {
                let vertex = self.rng.gen_range(0..self.labels.len());
                self.labels[vertex] = self.rng.gen_range(0..self.labels.len());
            }
        }
        Ok(accepted)
    }
}

impl GenerativeModel for RecordingModel {
    fn size(&self) -> usize {
        self.graph.size()
    }

    fn log_likelihood(&self) -> f64 {
        -(self.graph.multiplicity(0, 1) as f64)
    }

    fn log_prior(&self) -> f64 {
        -1.0
    }

    fn sample(&mut self) -> Result<(), GinfError> {
        self.draw_graph();
        Ok(())
    }

    fn sample_prior(&mut self) -> Result<(), GinfError> {
        self.draw_graph();
        Ok(())
    }

    fn metropolis_sweep(&mut self, n_steps: usize, _beta_prior: f64, _beta_likelihood: f64) -> Result<usize, GinfError> {
        self.run_sweep(n_steps)
    }

    fn supports_gibbs(&self) -> bool {
        self.gibbs
    }

    fn gibbs_sweep(&mut self, n_steps: usize, _beta_prior: f64, _beta_likelihood: f64) -> Result<GibbsSummary, GinfError> {
        let accepted = self.run_sweep(n_steps)?;
        Ok(GibbsSummary {
            accepted,
            total: n_steps,
            log_joint_ratio: 0.0,
        })
    }
}

impl GraphModel for RecordingModel {
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

    fn unfreeze_graph(&mut self, rate: f64) {
        self.unfreezes.push(("graph", rate));
    }

    fn unfreeze_graph_prior(&mut self, rate: f64) {
        self.unfreezes.push(("graph_prior", rate));
    }

    fn unfreeze_param(&mut self, rate: f64) {
        self.unfreezes.push(("param", rate));
    }
}

impl LabelModel for RecordingModel {
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
        let size = self.labels.len();
        self.labels = (0..size).map(|_| self.rng.gen_range(0..size)).collect();
        self.label_draws += 1;
        Ok(())
    }

    fn reduce_labels(&mut self) -> Result<(), GinfError> {
        self.reductions += 1;
        self.labels = reduce_partition(&self.labels);
        Ok(())
    }
}

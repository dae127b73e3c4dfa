//! Observers that accumulate what the estimators need from each sweep.

use ginf_collect::EdgeCollector;
use ginf_core::errors::GinfError;
use ginf_graph::{GenerativeModel, GraphModel, LabelModel, LabelState, Multigraph};
use ginf_mcmc::SweepObserver;

/// Feeds the model's graph into an [`EdgeCollector`] after every sweep.
#[derive(Debug, Clone, Default)]
pub struct CollectGraphOnSweep {
    collector: EdgeCollector,
}

impl CollectGraphOnSweep {
    /// Starts from an empty collector with the given probability floor.
    pub fn new(epsilon: f64) -> Self {
        Self {
            collector: EdgeCollector::new(epsilon),
        }
    }

    /// Starts from a collector that has already observed `graph` once.
    pub fn seeded(graph: &Multigraph, epsilon: f64) -> Self {
        let mut observer = Self::new(epsilon);
        observer.collector.update(graph);
        observer
    }

    /// Accumulated statistics.
    pub fn collector(&self) -> &EdgeCollector {
        &self.collector
    }

    /// Consumes the observer and returns its collector.
    pub fn into_collector(self) -> EdgeCollector {
        self.collector
    }
}

impl<M: GraphModel + ?Sized> SweepObserver<M> for CollectGraphOnSweep {
    fn on_sample(&mut self, model: &M) -> Result<(), GinfError> {
        self.collector.update_from_model(model);
        Ok(())
    }
}

/// Records `log_likelihood()` after every sweep.
#[derive(Debug, Clone, Default)]
pub struct CollectLikelihoodOnSweep {
    samples: Vec<f64>,
}

impl CollectLikelihoodOnSweep {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded values in sweep order.
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Consumes the recorder and returns its values.
    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }
}

impl<M: GenerativeModel + ?Sized> SweepObserver<M> for CollectLikelihoodOnSweep {
    fn on_sample(&mut self, model: &M) -> Result<(), GinfError> {
        self.samples.push(model.log_likelihood());
        Ok(())
    }
}

/// Records the flat or nested label state after every sweep.
#[derive(Debug, Clone, Default)]
pub struct CollectPartitionOnSweep {
    partitions: Vec<LabelState>,
}

impl CollectPartitionOnSweep {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorder whose first entry is `initial`.
    pub fn seeded(initial: LabelState) -> Self {
        Self {
            partitions: vec![initial],
        }
    }

    /// Recorded label states in sweep order.
    pub fn partitions(&self) -> &[LabelState] {
        &self.partitions
    }

    /// Consumes the recorder and returns its label states.
    pub fn into_partitions(self) -> Vec<LabelState> {
        self.partitions
    }
}

impl<M: LabelModel + ?Sized> SweepObserver<M> for CollectPartitionOnSweep {
    fn on_sample(&mut self, model: &M) -> Result<(), GinfError> {
        self.partitions.push(model.label_state());
        Ok(())
    }
}

use ginf_core::errors::GinfError;

/// Receives the model once after every observed sweep.
///
/// Errors abort the run; the driver still honours its restore contract.
pub trait SweepObserver<M: ?Sized> {
    /// Called with the model state reached by the sweep.
    fn on_sample(&mut self, model: &M) -> Result<(), GinfError>;
}

impl<M: ?Sized, F> SweepObserver<M> for F
where
    F: FnMut(&M) -> Result<(), GinfError>,
{
    fn on_sample(&mut self, model: &M) -> Result<(), GinfError> {
        self(model)
    }
}

/// Observer that ignores every sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoObserver;

impl<M: ?Sized> SweepObserver<M> for NoObserver {
    fn on_sample(&mut self, _model: &M) -> Result<(), GinfError> {
        Ok(())
    }
}

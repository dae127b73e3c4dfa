//! Scoped snapshots of externally owned model state.

use std::ops::{Deref, DerefMut};

use ginf_core::errors::GinfError;
use ginf_graph::{GraphModel, LabelModel, LabelState, Multigraph};

/// State captured from a model that can be written back later.
pub trait Snapshot<M: ?Sized>: Sized {
    /// Captures the relevant state of `model`.
    fn capture(model: &M) -> Self;

    /// Writes the captured state back into `model`.
    fn restore(&self, model: &mut M) -> Result<(), GinfError>;
}

/// Copy of the model's graph.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphSnapshot(pub Multigraph);

impl<M: GraphModel + ?Sized> Snapshot<M> for GraphSnapshot {
    fn capture(model: &M) -> Self {
        GraphSnapshot(model.graph())
    }

    fn restore(&self, model: &mut M) -> Result<(), GinfError> {
        model.set_graph(&self.0)
    }
}

/// Copy of the model's flat or nested labels.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSnapshot(pub LabelState);

impl<M: LabelModel + ?Sized> Snapshot<M> for LabelSnapshot {
    fn capture(model: &M) -> Self {
        LabelSnapshot(model.label_state())
    }

    fn restore(&self, model: &mut M) -> Result<(), GinfError> {
        model.set_label_state(&self.0)
    }
}

/// Restores the first component, then the second.
impl<M: ?Sized, A: Snapshot<M>, B: Snapshot<M>> Snapshot<M> for (A, B) {
    fn capture(model: &M) -> Self {
        (A::capture(model), B::capture(model))
    }

    fn restore(&self, model: &mut M) -> Result<(), GinfError> {
        self.0.restore(model)?;
        self.1.restore(model)
    }
}

/// Exclusive borrow of a model that writes a snapshot back when it ends.
///
/// An armed guard restores on [`ModelGuard::release`] and, failing that, on
/// drop. Drop cannot report errors, so a failed restore there is only logged.
pub struct ModelGuard<'a, M: ?Sized, S: Snapshot<M>> {
    model: &'a mut M,
    snapshot: S,
    armed: bool,
}

impl<'a, M: ?Sized, S: Snapshot<M>> ModelGuard<'a, M, S> {
    /// Captures the state of `model` and arms the guard.
    pub fn new(model: &'a mut M) -> Self {
        let snapshot = S::capture(model);
        Self {
            model,
            snapshot,
            armed: true,
        }
    }

    /// Chooses whether the guard restores when it ends.
    pub fn set_armed(&mut self, armed: bool) {
        self.armed = armed;
    }

    /// Ends the guard, restoring the snapshot when armed.
    pub fn release(mut self) -> Result<(), GinfError> {
        let armed = std::mem::replace(&mut self.armed, false);
        if armed {
            self.snapshot.restore(&mut *self.model)
        } else {
            Ok(())
        }
    }

    /// Ends the guard after `result` was computed under it.
    ///
    /// The snapshot is restored when armed on both paths. A restore failure
    /// replaces a successful result and is logged when `result` already failed.
    pub fn finish<T>(self, result: Result<T, GinfError>) -> Result<T, GinfError> {
        match result {
            Ok(value) => {
                self.release()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(restore_err) = self.release() {
                    tracing::warn!(error = %restore_err, "failed to restore model state after error");
                }
                Err(err)
            }
        }
    }
}

impl<M: ?Sized, S: Snapshot<M>> Deref for ModelGuard<'_, M, S> {
    type Target = M;

    fn deref(&self) -> &M {
        &*self.model
    }
}

impl<M: ?Sized, S: Snapshot<M>> DerefMut for ModelGuard<'_, M, S> {
    fn deref_mut(&mut self) -> &mut M {
        &mut *self.model
    }
}

impl<M: ?Sized, S: Snapshot<M>> Drop for ModelGuard<'_, M, S> {
    fn drop(&mut self) {
        if self.armed {
            self.armed = false;
            if let Err(err) = self.snapshot.restore(&mut *self.model) {
                tracing::warn!(error = %err, "failed to restore model state on drop");
            }
        }
    }
}

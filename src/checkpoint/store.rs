use crate::checkpoint::checkpoint::Checkpoint;
use crate::error::{Result, TuneError};
use crate::network::model::Model;
use crate::train::epoch_stats::History;

/// Durable key-value storage of checkpoints keyed by epoch, scoped to one
/// run. One writer at a time per store.
pub trait CheckpointStore {
    /// Writes (or overwrites) the checkpoint for `checkpoint.epoch`.
    fn save(&mut self, checkpoint: &Checkpoint) -> Result<()>;

    /// Reads the checkpoint for `epoch`, `None` if there is none.
    fn load(&self, epoch: usize) -> Result<Option<Checkpoint>>;

    /// Stored epochs in ascending order.
    fn epochs(&self) -> Result<Vec<usize>>;

    /// Removes every checkpoint, returning how many were removed. The
    /// store itself (e.g. its directory) remains usable.
    fn clear(&mut self) -> Result<usize>;

    /// Human-readable location for log lines.
    fn location(&self) -> String;

    fn latest(&self) -> Result<Option<Checkpoint>> {
        match self.epochs()?.last() {
            Some(&epoch) => self.load(epoch),
            None => Ok(None),
        }
    }
}

impl<S: CheckpointStore + ?Sized> CheckpointStore for &mut S {
    fn save(&mut self, checkpoint: &Checkpoint) -> Result<()> {
        (**self).save(checkpoint)
    }

    fn load(&self, epoch: usize) -> Result<Option<Checkpoint>> {
        (**self).load(epoch)
    }

    fn epochs(&self) -> Result<Vec<usize>> {
        (**self).epochs()
    }

    fn clear(&mut self) -> Result<usize> {
        (**self).clear()
    }

    fn location(&self) -> String {
        (**self).location()
    }
}

/// Loads the weights saved for `epoch` into `model` and returns the History
/// stored with them.
///
/// An empty store means there is no prior state: `Ok(None)`, the model is
/// left untouched. A missing epoch among existing checkpoints, or a corrupt
/// or mismatched checkpoint, is an error.
pub fn restore<S, M>(store: &S, model: &mut M, epoch: usize) -> Result<Option<History>>
where
    S: CheckpointStore + ?Sized,
    M: Model + ?Sized,
{
    if store.epochs()?.is_empty() {
        log::info!("no saved model parameters found in {}", store.location());
        return Ok(None);
    }

    log::info!("loading checkpoint for epoch {} from {}", epoch, store.location());
    let loaded = store
        .load(epoch)
        .and_then(|cp| cp.ok_or(TuneError::MissingCheckpoint(epoch)))
        .and_then(|cp| model.load_state(&cp.model_state).map(|_| cp));

    match loaded {
        Ok(cp) => {
            log::info!("restored checkpoint (trained for {} epochs)", cp.epoch);
            Ok(Some(cp.stats))
        }
        Err(e) => {
            log::error!("checkpoint for epoch {} not restored: {}", epoch, e);
            Err(e)
        }
    }
}

/// Restores the most recent checkpoint, for continuing an interrupted
/// session. Returns the History to continue from.
pub fn resume<S, M>(store: &S, model: &mut M) -> Result<Option<History>>
where
    S: CheckpointStore + ?Sized,
    M: Model + ?Sized,
{
    match store.epochs()?.last() {
        Some(&epoch) => restore(store, model, epoch),
        None => {
            log::info!("no checkpoint to resume from in {}", store.location());
            Ok(None)
        }
    }
}

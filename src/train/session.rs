use crate::checkpoint::checkpoint::Checkpoint;
use crate::checkpoint::store::CheckpointStore;
use crate::data::batch::Dataset;
use crate::error::{Result, TuneError};
use crate::loss::criterion::Criterion;
use crate::network::model::Model;
use crate::optim::optimizer::Optimizer;
use crate::search::grid::HyperparamConfig;
use crate::train::early_stopping::EarlyStopping;
use crate::train::epoch_stats::History;
use crate::train::loop_fn::train_epoch;
use crate::train::metrics::evaluate_epoch;
use crate::train::train_config::SessionConfig;

/// Drives one model through train/evaluate/checkpoint cycles until the
/// early-stopping policy halts it.
///
/// The session borrows the model and optimizer exclusively for its whole
/// run; nothing else may touch them until `run` returns.
pub struct Session<'a, M: ?Sized, O: ?Sized, C: ?Sized, S: ?Sized> {
    pub model: &'a mut M,
    pub optimizer: &'a mut O,
    pub criterion: &'a C,
    pub store: &'a mut S,
    pub config: SessionConfig,
    /// Recorded in every checkpoint when set.
    pub params: Option<HyperparamConfig>,
}

impl<'a, M, O, C, S> Session<'a, M, O, C, S>
where
    M: Model + ?Sized,
    O: Optimizer + ?Sized,
    C: Criterion + ?Sized,
    S: CheckpointStore + ?Sized,
{
    pub fn new(
        model: &'a mut M,
        optimizer: &'a mut O,
        criterion: &'a C,
        store: &'a mut S,
        config: SessionConfig,
    ) -> Self {
        Session { model, optimizer, criterion, store, config, params: None }
    }

    pub fn with_params(mut self, params: HyperparamConfig) -> Self {
        self.params = Some(params);
        self
    }

    /// Trains until patience is exhausted and returns the epoch with the
    /// lowest validation loss over the whole history.
    ///
    /// An empty `history` starts with the epoch-0 baseline evaluation; a
    /// non-empty one is continued from its last epoch, with the patience
    /// state rebuilt from the recorded losses.
    ///
    /// A failed checkpoint write aborts the session.
    pub fn run(&mut self, train: &Dataset, val: &Dataset, history: &mut History) -> Result<usize> {
        if self.config.patience == 0 {
            return Err(TuneError::invalid_config("patience must be at least 1"));
        }

        if history.is_empty() {
            let baseline = evaluate_epoch(&mut *self.model, self.criterion, train, val)?;
            log::info!("epoch 0 (baseline): val {} | train {}", baseline.val, baseline.train);
            history.push(baseline);
        }

        let mut stopping = EarlyStopping::new(self.config.patience, history.entries()[0].val_loss());
        for stats in &history.entries()[1..] {
            stopping.update(stats.val_loss());
        }

        let mut epoch = history.completed_epochs();
        while !stopping.should_stop() {
            if self.config.max_epochs.is_some_and(|max| epoch >= max) {
                log::info!("reached max_epochs={}, halting", epoch);
                break;
            }

            train_epoch(&mut *self.model, &mut *self.optimizer, self.criterion, train)?;
            let stats = evaluate_epoch(&mut *self.model, self.criterion, train, val)?;
            history.push(stats);
            epoch += 1;

            self.save_checkpoint(epoch, history)?;

            stopping.update(stats.val_loss());
            log::info!(
                "epoch {}: val {} | train {} | patience {}/{}",
                epoch, stats.val, stats.train, stopping.state.patience_counter, stopping.patience
            );
        }

        let best = history
            .best_epoch()
            .ok_or_else(|| TuneError::invalid_config("session halted before training any epoch"))?;
        log::info!("session halted after {} epochs, best epoch {}", epoch, best);
        Ok(best)
    }

    fn save_checkpoint(&mut self, epoch: usize, history: &History) -> Result<()> {
        let mut checkpoint = Checkpoint::new(epoch, self.model.state(), history.clone());
        checkpoint.params = self.params;
        self.store.save(&checkpoint).map_err(|e| {
            log::error!("checkpoint write to {} failed: {}", self.store.location(), e);
            TuneError::CheckpointWrite { epoch, source: Box::new(e) }
        })
    }
}

use serde::{Serialize, Deserialize};

use crate::checkpoint::checkpoint::Checkpoint;
use crate::checkpoint::store::{restore, CheckpointStore};
use crate::data::batch::Dataset;
use crate::error::{Result, TuneError};
use crate::loss::criterion::Criterion;
use crate::network::model::{Model, ModelState};
use crate::search::factory::TrialFactory;
use crate::search::grid::{HyperparamConfig, HyperparamGrid};
use crate::train::epoch_stats::History;
use crate::train::session::Session;
use crate::train::train_config::SessionConfig;

/// Outcome of one executed trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// Position of the configuration in the full grid enumeration.
    pub index: usize,
    pub config: HyperparamConfig,
    pub best_epoch: usize,
    pub best_val_loss: f64,
}

/// The best trial found so far.
#[derive(Debug, Clone, PartialEq)]
pub struct BestTrial {
    pub config: HyperparamConfig,
    pub epoch: usize,
    /// History snapshot stored with the best epoch's checkpoint.
    pub stats: History,
    pub model_state: ModelState,
}

/// Accumulated result of a sweep. `best` stays `None` when no trial beat
/// the initial bound.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub best_val_loss: f64,
    pub best: Option<BestTrial>,
    pub trials: Vec<TrialRecord>,
}

impl SearchResult {
    fn new(initial_best_loss: f64) -> Self {
        SearchResult { best_val_loss: initial_best_loss, best: None, trials: Vec::new() }
    }
}

/// Clears a trial's checkpoint store when the trial ends, whichever way it
/// ends. `finish` clears and reports errors; dropping an unfinished scope
/// clears on a best-effort basis.
pub struct TrialScope<'s, S: CheckpointStore + ?Sized> {
    store: &'s mut S,
    finished: bool,
}

impl<'s, S: CheckpointStore + ?Sized> TrialScope<'s, S> {
    /// Opens the scope, removing anything a previous run left behind.
    pub fn begin(store: &'s mut S) -> Result<Self> {
        let stale = store.clear()?;
        if stale > 0 {
            log::warn!("removed {} stale checkpoints from {}", stale, store.location());
        }
        Ok(TrialScope { store, finished: false })
    }

    pub fn store(&mut self) -> &mut S {
        self.store
    }

    pub fn finish(mut self) -> Result<usize> {
        self.finished = true;
        self.store.clear()
    }
}

impl<S: CheckpointStore + ?Sized> Drop for TrialScope<'_, S> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.store.clear() {
            log::warn!("failed to clear checkpoints in {}: {}", self.store.location(), e);
        }
    }
}

/// Grid search over learning rate, dropout and weight decay.
///
/// Trials run strictly one after another. Each gets a fresh model and
/// optimizer, trains to early stop against `trial_store`, has its best
/// epoch restored, and its checkpoints cleared. A strictly lower best
/// validation loss replaces the running best, which is persisted to
/// `best_store`. Any error aborts the sweep.
pub struct SearchDriver<F, C, T, B> {
    pub grid: HyperparamGrid,
    /// Leading grid entries to skip, for resuming a partial sweep.
    pub skip: usize,
    pub session: SessionConfig,
    /// Loss a trial must beat to become the best.
    pub initial_best_loss: f64,
    factory: F,
    criterion: C,
    trial_store: T,
    best_store: B,
}

impl<F, C, T, B> SearchDriver<F, C, T, B>
where
    F: TrialFactory,
    C: Criterion,
    T: CheckpointStore,
    B: CheckpointStore,
{
    pub fn new(grid: HyperparamGrid, factory: F, criterion: C, trial_store: T, best_store: B) -> Self {
        SearchDriver {
            grid,
            skip: 0,
            session: SessionConfig::default(),
            initial_best_loss: f64::INFINITY,
            factory,
            criterion,
            trial_store,
            best_store,
        }
    }

    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    pub fn with_initial_best_loss(mut self, loss: f64) -> Self {
        self.initial_best_loss = loss;
        self
    }

    pub fn best_store(&self) -> &B {
        &self.best_store
    }

    pub fn run(&mut self, train: &Dataset, val: &Dataset) -> Result<SearchResult> {
        self.grid.validate()?;
        let configs = self.grid.configs();
        let total = configs.len();
        if self.skip >= total {
            log::warn!("skip={} leaves no configurations out of {}", self.skip, total);
        }

        let mut result = SearchResult::new(self.initial_best_loss);

        for (index, config) in configs.into_iter().enumerate().skip(self.skip) {
            log::info!("trial {}/{}: {}", index + 1, total, config);
            let (record, model_state, stats) = self.run_trial(index, config, train, val)?;
            log::info!(
                "trial {}/{} finished: best epoch {}, val loss {:.6}",
                index + 1, total, record.best_epoch, record.best_val_loss
            );

            if record.best_val_loss < result.best_val_loss {
                log::info!(
                    "new best val loss {:.6} (was {:.6}) with {}",
                    record.best_val_loss, result.best_val_loss, config
                );
                self.persist_best(&record, &model_state, &stats)?;
                result.best_val_loss = record.best_val_loss;
                result.best = Some(BestTrial {
                    config,
                    epoch: record.best_epoch,
                    stats,
                    model_state,
                });
            }
            result.trials.push(record);
        }

        Ok(result)
    }

    fn run_trial(
        &mut self,
        index: usize,
        config: HyperparamConfig,
        train: &Dataset,
        val: &Dataset,
    ) -> Result<(TrialRecord, ModelState, History)> {
        let (mut model, mut optimizer) = self.factory.build(&config)?;
        let mut scope = TrialScope::begin(&mut self.trial_store)?;

        let mut history = History::new();
        let best_epoch = Session::new(&mut model, &mut optimizer, &self.criterion, scope.store(), self.session)
            .with_params(config)
            .run(train, val, &mut history)?;

        let stats = restore(scope.store(), &mut model, best_epoch)?
            .ok_or(TuneError::MissingCheckpoint(best_epoch))?;
        let best_val_loss = stats
            .get(best_epoch)
            .map(|s| s.val_loss())
            .ok_or(TuneError::MissingCheckpoint(best_epoch))?;

        scope.finish()?;

        let record = TrialRecord { index, config, best_epoch, best_val_loss };
        Ok((record, model.state(), stats))
    }

    fn persist_best(&mut self, record: &TrialRecord, model_state: &ModelState, stats: &History) -> Result<()> {
        let checkpoint = Checkpoint::new(record.best_epoch, model_state.clone(), stats.clone())
            .with_params(record.config);
        self.best_store.clear()?;
        self.best_store.save(&checkpoint).map_err(|e| {
            log::error!("failed to persist best model to {}: {}", self.best_store.location(), e);
            TuneError::CheckpointWrite { epoch: record.best_epoch, source: Box::new(e) }
        })
    }
}

use crate::checkpoint::store::{restore, resume, CheckpointStore};
use crate::data::batch::Dataset;
use crate::error::{Result, TuneError};
use crate::loss::criterion::Criterion;
use crate::search::factory::TrialFactory;
use crate::search::grid::HyperparamConfig;
use crate::train::epoch_stats::History;
use crate::train::session::Session;
use crate::train::train_config::SessionConfig;

/// Result of a single-configuration fine-tuning run.
pub struct Finetuned<M> {
    /// Model holding the best epoch's weights.
    pub model: M,
    pub best_epoch: usize,
    /// Full history of the session, including epochs after the best one.
    pub history: History,
}

/// Fine-tunes one configuration to early stop and restores its best epoch.
///
/// Unlike a search trial, the checkpoints are kept. If `store` already holds
/// checkpoints, training resumes from the latest one. Optimizer moments are
/// not checkpointed, so a resumed run restarts them from zero.
pub fn finetune<F, C, S>(
    factory: &mut F,
    criterion: &C,
    store: &mut S,
    session: SessionConfig,
    config: HyperparamConfig,
    train: &Dataset,
    val: &Dataset,
) -> Result<Finetuned<F::Model>>
where
    F: TrialFactory,
    C: Criterion + ?Sized,
    S: CheckpointStore + ?Sized,
{
    let (mut model, mut optimizer) = factory.build(&config)?;

    let mut history = resume(&*store, &mut model)?.unwrap_or_default();
    if !history.is_empty() {
        log::info!("resuming fine-tuning after epoch {}", history.completed_epochs());
    }

    let best_epoch = Session::new(&mut model, &mut optimizer, criterion, &mut *store, session)
        .with_params(config)
        .run(train, val, &mut history)?;

    restore(&*store, &mut model, best_epoch)?.ok_or(TuneError::MissingCheckpoint(best_epoch))?;

    Ok(Finetuned { model, best_epoch, history })
}

mod common;

use ferrite_tune::checkpoint::{CheckpointStore, DirStore};
use ferrite_tune::search::{finetune, HyperparamConfig, HyperparamGrid, SearchDriver};
use ferrite_tune::train::SessionConfig;
use ferrite_tune::TuneError;

use common::{tiny_dataset, v_curve, ScriptedLoss, StubFactory};

fn grid() -> HyperparamGrid {
    HyperparamGrid {
        learning_rates: vec![0.1, 0.2],
        dropout_rates: vec![0.0, 0.5],
        weight_decays: vec![0.0],
    }
}

/// Minimum loss of each grid point, keyed by `lr + 10 * dropout`.
fn base_loss(key: f64) -> f64 {
    match (key * 10.0).round() as i64 {
        1 => 0.0,
        2 => 0.5,
        51 => 0.3,
        52 => 0.1,
        other => panic!("unexpected key {}", other),
    }
}

fn scripted() -> ScriptedLoss<impl Fn(f64, usize) -> f64> {
    ScriptedLoss(|key, epoch| v_curve(base_loss(key), epoch))
}

#[test]
fn skip_runs_remaining_trials_in_order_and_keeps_lowest() {
    let tmp = tempfile::tempdir().unwrap();
    let (train, val) = (tiny_dataset(), tiny_dataset());

    let mut driver = SearchDriver::new(
        grid(),
        StubFactory::default(),
        scripted(),
        DirStore::new(tmp.path().join("trial")),
        DirStore::new(tmp.path().join("best")),
    )
    .with_skip(1)
    .with_session(SessionConfig::new(2));

    let result = driver.run(&train, &val).unwrap();

    let indices: Vec<usize> = result.trials.iter().map(|t| t.index).collect();
    assert_eq!(indices, vec![1, 2, 3]);
    let first = result.trials[0].config;
    assert_eq!((first.dropout_rate, first.learning_rate), (0.0, 0.2));
    assert!(result.trials.iter().all(|t| t.best_epoch == 2));

    let best = result.best.expect("a trial beats +inf");
    assert_eq!(best.config, HyperparamConfig::new(0.2, 0.5, 0.0));
    assert_eq!(best.epoch, 2);
    assert!((result.best_val_loss - 0.1).abs() < 1e-12);
    // baseline, two improving epochs, two more to exhaust patience
    assert_eq!(best.stats.len(), 5);
    assert_eq!(best.model_state.get("w").unwrap().data[0][0], 2.0);

    let best_store = driver.best_store();
    assert_eq!(best_store.epochs().unwrap(), vec![2]);
    let saved = best_store.load(2).unwrap().unwrap();
    assert_eq!(saved.params, Some(best.config));

    let trial_store = DirStore::new(tmp.path().join("trial"));
    assert!(trial_store.epochs().unwrap().is_empty());
    assert!(tmp.path().join("trial").is_dir());
}

#[test]
fn nothing_beats_a_tight_initial_bound() {
    let tmp = tempfile::tempdir().unwrap();
    let (train, val) = (tiny_dataset(), tiny_dataset());

    let mut driver = SearchDriver::new(
        grid(),
        StubFactory::default(),
        scripted(),
        DirStore::new(tmp.path().join("trial")),
        DirStore::new(tmp.path().join("best")),
    )
    .with_skip(1)
    .with_session(SessionConfig::new(2))
    .with_initial_best_loss(0.05);

    let result = driver.run(&train, &val).unwrap();
    assert_eq!(result.trials.len(), 3);
    assert!(result.best.is_none());
    assert_eq!(result.best_val_loss, 0.05);
    assert!(driver.best_store().epochs().unwrap().is_empty());
}

#[test]
fn failed_trial_aborts_and_clears_its_checkpoints() {
    let tmp = tempfile::tempdir().unwrap();
    let (train, val) = (tiny_dataset(), tiny_dataset());

    let factory = StubFactory { fail_at: Some(3.0) };
    let mut driver = SearchDriver::new(
        grid(),
        factory,
        scripted(),
        DirStore::new(tmp.path().join("trial")),
        DirStore::new(tmp.path().join("best")),
    )
    .with_session(SessionConfig::new(2));

    let err = driver.run(&train, &val).unwrap_err();
    assert!(matches!(err, TuneError::MalformedBatch(_)));

    let trial_store = DirStore::new(tmp.path().join("trial"));
    assert!(trial_store.epochs().unwrap().is_empty());
}

#[test]
fn stale_trial_checkpoints_are_removed_before_the_sweep() {
    let tmp = tempfile::tempdir().unwrap();
    let (train, val) = (tiny_dataset(), tiny_dataset());
    std::fs::create_dir_all(tmp.path().join("trial")).unwrap();
    std::fs::write(tmp.path().join("trial").join("epoch=9.checkpoint.json"), "{}").unwrap();

    let single = HyperparamGrid {
        learning_rates: vec![0.1],
        dropout_rates: vec![0.5],
        weight_decays: vec![0.0],
    };
    let mut driver = SearchDriver::new(
        single,
        StubFactory::default(),
        ScriptedLoss(|_, epoch| v_curve(0.2, epoch)),
        DirStore::new(tmp.path().join("trial")),
        DirStore::new(tmp.path().join("best")),
    )
    .with_session(SessionConfig::new(1));

    let result = driver.run(&train, &val).unwrap();
    assert_eq!(result.trials[0].best_epoch, 2);
    assert!(!tmp.path().join("trial").join("epoch=9.checkpoint.json").exists());
}

#[test]
fn finetune_keeps_checkpoints_and_resumes() {
    let tmp = tempfile::tempdir().unwrap();
    let (train, val) = (tiny_dataset(), tiny_dataset());
    let config = HyperparamConfig::new(0.1, 0.0, 0.0);
    let criterion = ScriptedLoss(|_, epoch| v_curve(0.3, epoch));
    let mut store = DirStore::new(tmp.path().join("finetune"));

    let session = SessionConfig::new(2).with_max_epochs(3);
    let first = finetune(&mut StubFactory::default(), &criterion, &mut store, session, config, &train, &val)
        .unwrap();
    assert_eq!(first.best_epoch, 2);
    assert_eq!(first.history.completed_epochs(), 3);
    assert_eq!(store.epochs().unwrap(), vec![1, 2, 3]);
    assert_eq!(first.model.epochs_trained(), 2.0);

    // Resuming continues after epoch 3 until patience runs out at epoch 4.
    let second = finetune(
        &mut StubFactory::default(),
        &criterion,
        &mut store,
        SessionConfig::new(2),
        config,
        &train,
        &val,
    )
    .unwrap();
    assert_eq!(second.history.completed_epochs(), 4);
    assert_eq!(second.best_epoch, 2);
    assert_eq!(store.epochs().unwrap(), vec![1, 2, 3, 4]);
}

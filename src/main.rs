use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use ferrite_tune::checkpoint::{CheckpointStore, DirStore};
use ferrite_tune::data::{load_csv, Dataset};
use ferrite_tune::loss::CrossEntropyLoss;
use ferrite_tune::network::{Classifier, Model};
use ferrite_tune::search::{finetune, ClassifierFactory, SearchDriver, TrialFactory};
use ferrite_tune::train::evaluate;
use ferrite_tune::{Report, RunConfig};

/// Fine-tunes a binary text classifier with early stopping and checkpoints.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    /// Run configuration (YAML); defaults apply when the file is missing.
    #[arg(short, long, global = true, default_value = "configs/tune.yaml")]
    config: PathBuf,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Grid search over learning rate, dropout and weight decay (default).
    Search,
    /// Train the single `finetune` configuration, resuming from its checkpoints.
    Finetune,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Search);
    let config_path = cli.config;

    let config = RunConfig::load_or_default(&config_path)
        .with_context(|| format!("invalid run config {}", config_path.display()))?;

    let (train, val) = load_splits(&config)?;
    println!("train examples: {}, val examples: {}", train.len(), val.len());

    let mut factory = ClassifierFactory::new(config.model.clone(), config.optimizer, config.seed);

    let (mut report, mut model) = match command {
        Command::Search => run_search(&config, &factory, &train, &val)?,
        Command::Finetune => run_finetune(&config, &mut factory, &train, &val)?,
    };

    if let Some(test_path) = &config.data.test_path {
        let test = load_csv(test_path, config.data.max_length, config.data.batch_size)
            .with_context(|| format!("failed to load test data from {}", test_path.display()))?;
        model.eval_mode();
        let metrics = evaluate(&mut model, &CrossEntropyLoss, &test)?;
        report.attach_test(metrics);
    }

    println!("best configuration: {} (epoch {})", report.config, report.best_epoch);
    print!("{}", report.table());
    report.save_json(&config.stats_output)?;
    println!("stats written to {}", config.stats_output.display());

    Ok(())
}

/// Loads the training CSV and holds out a stratified validation split.
fn load_splits(config: &RunConfig) -> Result<(Dataset, Dataset)> {
    let data = &config.data;
    let mut full = load_csv(&data.train_path, data.max_length, data.batch_size)
        .with_context(|| format!("failed to load training data from {}", data.train_path.display()))?;
    full.shuffle(config.seed);
    Ok(full.stratified_split(data.val_fraction))
}

fn run_search(
    config: &RunConfig,
    factory: &ClassifierFactory,
    train: &Dataset,
    val: &Dataset,
) -> Result<(Report, Classifier)> {
    let dirs = &config.checkpoints;
    let mut driver = SearchDriver::new(
        config.grid.clone(),
        factory.clone(),
        CrossEntropyLoss,
        DirStore::new(&dirs.search),
        DirStore::new(&dirs.best),
    )
    .with_skip(config.skip)
    .with_session(config.session)
    .with_initial_best_loss(config.initial_best_loss());

    let result = driver.run(train, val)?;
    println!("ran {} trials", result.trials.len());

    let Some(best) = result.best else {
        bail!("no trial beat the initial best loss of {}", config.initial_best_loss());
    };
    println!("best model saved to {}", driver.best_store().location());

    let (mut model, _) = factory.clone().build(&best.config)?;
    model.load_state(&best.model_state)?;
    let report = Report::new(best.config, best.epoch, best.stats)?.with_trials(result.trials);
    Ok((report, model))
}

fn run_finetune(
    config: &RunConfig,
    factory: &mut ClassifierFactory,
    train: &Dataset,
    val: &Dataset,
) -> Result<(Report, Classifier)> {
    let Some(params) = config.finetune else {
        bail!("`finetune` requires a `finetune` section in the run config");
    };
    let mut store = DirStore::new(&config.checkpoints.finetune);
    let tuned = finetune(factory, &CrossEntropyLoss, &mut store, config.session, params, train, val)?;
    let report = Report::new(params, tuned.best_epoch, tuned.history)?;
    Ok((report, tuned.model))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_invocation_searches_with_default_config() {
        let cli = Cli::try_parse_from(["ferrite-tune"]).unwrap();
        assert_eq!(cli.command, None);
        assert_eq!(cli.config, PathBuf::from("configs/tune.yaml"));
    }

    #[test]
    fn config_flag_follows_the_subcommand() {
        let cli = Cli::try_parse_from(["ferrite-tune", "finetune", "--config", "runs/a.yaml"]).unwrap();
        assert_eq!(cli.command, Some(Command::Finetune));
        assert_eq!(cli.config, PathBuf::from("runs/a.yaml"));
    }

    #[test]
    fn unknown_subcommand_is_a_usage_error() {
        assert!(Cli::try_parse_from(["ferrite-tune", "train"]).is_err());
        let help = Cli::try_parse_from(["ferrite-tune", "--help"]).unwrap_err();
        assert_eq!(help.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}

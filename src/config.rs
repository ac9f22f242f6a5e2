use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};

use crate::error::{Result, TuneError};
use crate::network::spec::ClassifierSpec;
use crate::optim::optimizer::OptimizerKind;
use crate::search::grid::{HyperparamConfig, HyperparamGrid};
use crate::train::train_config::SessionConfig;

/// Where the labelled, pre-tokenized data lives and how it is batched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// CSV split into train and validation sets.
    pub train_path: PathBuf,
    /// Optional held-out CSV, evaluated once on the final best model.
    pub test_path: Option<PathBuf>,
    /// Fraction of `train_path` held out (per class) for validation.
    pub val_fraction: f64,
    pub max_length: usize,
    pub batch_size: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            train_path: PathBuf::from("data/train.csv"),
            test_path: None,
            val_fraction: 0.1,
            max_length: 300,
            batch_size: 64,
        }
    }
}

/// Checkpoint directories. Each must be distinct: a directory has one
/// writer at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckpointDirs {
    /// Per-trial scratch space, emptied after every trial.
    pub search: PathBuf,
    /// Holds the single current-best checkpoint of a sweep.
    pub best: PathBuf,
    /// Kept checkpoints of a single-configuration fine-tune run.
    pub finetune: PathBuf,
}

impl Default for CheckpointDirs {
    fn default() -> Self {
        CheckpointDirs {
            search: PathBuf::from("checkpoints/search"),
            best: PathBuf::from("checkpoints/best"),
            finetune: PathBuf::from("checkpoints/finetune"),
        }
    }
}

/// Top-level configuration of a run, read from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub data: DataConfig,
    pub model: ClassifierSpec,
    pub optimizer: OptimizerKind,
    pub grid: HyperparamGrid,
    /// Leading grid entries to skip when resuming a sweep.
    pub skip: usize,
    pub session: SessionConfig,
    /// Loss a trial must beat to count as the best; unbounded when absent.
    pub initial_best_loss: Option<f64>,
    /// Configuration used by the `finetune` command.
    pub finetune: Option<HyperparamConfig>,
    pub checkpoints: CheckpointDirs,
    pub seed: u64,
    /// JSON file receiving the best model's statistics.
    pub stats_output: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            data: DataConfig::default(),
            model: ClassifierSpec::default(),
            optimizer: OptimizerKind::Adam,
            grid: HyperparamGrid::default(),
            skip: 0,
            session: SessionConfig::default(),
            initial_best_loss: None,
            finetune: None,
            checkpoints: CheckpointDirs::default(),
            seed: 42,
            stats_output: PathBuf::from("best_model_stats.json"),
        }
    }
}

impl RunConfig {
    /// Reads `path` if it exists, otherwise falls back to defaults.
    pub fn load_or_default(path: &Path) -> Result<RunConfig> {
        let config = if path.exists() {
            log::info!("loading run config from {}", path.display());
            let content = std::fs::read_to_string(path)?;
            serde_yaml::from_str(&content)?
        } else {
            log::info!("{} not found, using default run config", path.display());
            RunConfig::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn initial_best_loss(&self) -> f64 {
        self.initial_best_loss.unwrap_or(f64::INFINITY)
    }

    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;
        if let Some(cfg) = &self.finetune {
            cfg.validate()?;
        }
        if self.session.patience == 0 {
            return Err(TuneError::invalid_config("session.patience must be at least 1"));
        }
        if self.session.max_epochs == Some(0) {
            return Err(TuneError::invalid_config("session.max_epochs must be at least 1"));
        }
        if !(self.data.val_fraction > 0.0 && self.data.val_fraction < 1.0) {
            return Err(TuneError::invalid_config("data.val_fraction must be in (0, 1)"));
        }
        if self.data.batch_size == 0 || self.data.max_length == 0 {
            return Err(TuneError::invalid_config("data.batch_size and data.max_length must be positive"));
        }
        if self.model.vocab_size == 0 || self.model.embedding_dim == 0 || self.model.hidden_size == 0 {
            return Err(TuneError::invalid_config("model dimensions must be positive"));
        }
        let dirs = &self.checkpoints;
        if dirs.search == dirs.best || dirs.search == dirs.finetune || dirs.best == dirs.finetune {
            return Err(TuneError::invalid_config("checkpoint directories must be distinct"));
        }
        Ok(())
    }
}

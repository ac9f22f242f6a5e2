use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::error::{Result, TuneError};
use crate::search::driver::TrialRecord;
use crate::search::grid::HyperparamConfig;
use crate::train::epoch_stats::{fmt_optional, EpochStats, History, SplitMetrics};

/// Final summary of the selected model, written to disk after a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub config: HyperparamConfig,
    pub best_epoch: usize,
    /// Stats of `best_epoch`, with test metrics once they are attached.
    pub stats: EpochStats,
    pub history: History,
    /// Trials executed by a sweep; empty for a fine-tune run.
    #[serde(default)]
    pub trials: Vec<TrialRecord>,
}

impl Report {
    pub fn new(config: HyperparamConfig, best_epoch: usize, history: History) -> Result<Report> {
        let stats = *history.get(best_epoch).ok_or(TuneError::MissingCheckpoint(best_epoch))?;
        Ok(Report { config, best_epoch, stats, history, trials: Vec::new() })
    }

    pub fn with_trials(mut self, trials: Vec<TrialRecord>) -> Self {
        self.trials = trials;
        self
    }

    pub fn attach_test(&mut self, test: SplitMetrics) {
        self.stats.test = Some(test);
    }

    /// Splits as rows, metrics as columns. Undefined metrics print as `n/a`
    /// and a missing test split is left out.
    pub fn table(&self) -> String {
        let mut rows = vec![("Train", self.stats.train), ("Val", self.stats.val)];
        if let Some(test) = self.stats.test {
            rows.push(("Test", test));
        }

        let mut out = format!(
            "{:<6} {:>10} {:>10} {:>10} {:>10}\n",
            "", "Accuracy", "Loss", "Recall", "Precision"
        );
        for (name, m) in rows {
            let _ = writeln!(
                out,
                "{:<6} {:>10.4} {:>10.4} {:>10} {:>10}",
                name,
                m.accuracy,
                m.loss,
                fmt_optional(m.recall),
                fmt_optional(m.precision),
            );
        }
        out
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load_json(path: &Path) -> Result<Report> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}

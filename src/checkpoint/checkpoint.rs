use serde::{Serialize, Deserialize};

use crate::error::{Result, TuneError};
use crate::network::model::ModelState;
use crate::search::grid::HyperparamConfig;
use crate::train::epoch_stats::History;

const PREFIX: &str = "epoch=";
const SUFFIX: &str = ".checkpoint.json";

/// Snapshot of a training session after one epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub epoch: usize,
    pub model_state: ModelState,
    /// History as it stood when the snapshot was taken.
    pub stats: History,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<HyperparamConfig>,
}

impl Checkpoint {
    pub fn new(epoch: usize, model_state: ModelState, stats: History) -> Checkpoint {
        Checkpoint { epoch, model_state, stats, params: None }
    }

    pub fn with_params(mut self, params: HyperparamConfig) -> Checkpoint {
        self.params = Some(params);
        self
    }

    /// Rejects weights that JSON cannot represent. Stores call this before
    /// writing anything.
    pub fn ensure_encodable(&self) -> Result<()> {
        for (name, tensor) in &self.model_state.tensors {
            if tensor.data.iter().flatten().any(|v| !v.is_finite()) {
                return Err(TuneError::NonFiniteState(format!(
                    "tensor '{}' at epoch {}",
                    name, self.epoch
                )));
            }
        }
        Ok(())
    }
}

/// File name of the checkpoint for `epoch`, e.g. `epoch=7.checkpoint.json`.
pub fn file_name(epoch: usize) -> String {
    format!("{}{}{}", PREFIX, epoch, SUFFIX)
}

/// Inverse of [`file_name`]. Only canonical names parse, so every epoch maps
/// to exactly one file.
pub fn parse_file_name(name: &str) -> Option<usize> {
    let digits = name.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let epoch: usize = digits.parse().ok()?;
    (file_name(epoch) == name).then_some(epoch)
}

use serde::{Serialize, Deserialize};

use crate::train::early_stopping::EarlyStopping;

/// Configuration of one training session.
///
/// # Fields
/// - `patience`:   consecutive non-improving epochs tolerated before halting
/// - `max_epochs`: optional hard cap on trained epochs; `None` runs until
///                  patience is exhausted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub patience: usize,
    pub max_epochs: Option<usize>,
}

impl SessionConfig {
    pub fn new(patience: usize) -> Self {
        SessionConfig { patience, max_epochs: None }
    }

    pub fn with_max_epochs(mut self, max_epochs: usize) -> Self {
        self.max_epochs = Some(max_epochs);
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig::new(EarlyStopping::DEFAULT_PATIENCE)
    }
}

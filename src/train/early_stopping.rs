use serde::{Serialize, Deserialize};

/// Patience counter and best validation loss seen so far.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatienceState {
    pub patience_counter: usize,
    pub best_loss: f64,
}

impl PatienceState {
    /// Starts from the baseline (epoch 0) validation loss.
    pub fn new(baseline_loss: f64) -> PatienceState {
        PatienceState { patience_counter: 0, best_loss: baseline_loss }
    }

    /// Folds in the latest validation loss.
    ///
    /// Only a strictly lower loss counts as improvement; an equal loss (or a
    /// NaN) increments the counter and keeps the best unchanged.
    pub fn observe(self, latest_val_loss: f64) -> PatienceState {
        if latest_val_loss < self.best_loss {
            PatienceState { patience_counter: 0, best_loss: latest_val_loss }
        } else {
            PatienceState { patience_counter: self.patience_counter + 1, ..self }
        }
    }
}

/// Early-stopping policy: halt once `patience` consecutive epochs fail to
/// improve on the best validation loss.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EarlyStopping {
    pub patience: usize,
    pub state: PatienceState,
}

impl EarlyStopping {
    pub const DEFAULT_PATIENCE: usize = 5;

    pub fn new(patience: usize, baseline_loss: f64) -> EarlyStopping {
        EarlyStopping { patience, state: PatienceState::new(baseline_loss) }
    }

    pub fn update(&mut self, latest_val_loss: f64) {
        self.state = self.state.observe(latest_val_loss);
    }

    pub fn should_stop(&self) -> bool {
        self.state.patience_counter >= self.patience
    }
}

use std::fmt;

use serde::{Serialize, Deserialize};

use crate::error::{Result, TuneError};

/// One point of the search grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HyperparamConfig {
    pub learning_rate: f64,
    pub dropout_rate: f64,
    pub weight_decay: f64,
}

impl HyperparamConfig {
    pub fn new(learning_rate: f64, dropout_rate: f64, weight_decay: f64) -> Self {
        HyperparamConfig { learning_rate, dropout_rate, weight_decay }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0) {
            return Err(TuneError::invalid_config(format!(
                "learning rate must be positive, got {}", self.learning_rate
            )));
        }
        if !(0.0..1.0).contains(&self.dropout_rate) {
            return Err(TuneError::invalid_config(format!(
                "dropout rate must be in [0, 1), got {}", self.dropout_rate
            )));
        }
        if !(self.weight_decay >= 0.0) {
            return Err(TuneError::invalid_config(format!(
                "weight decay must be non-negative, got {}", self.weight_decay
            )));
        }
        Ok(())
    }
}

impl fmt::Display for HyperparamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lr={:e} dropout={} weight_decay={:e}", self.learning_rate, self.dropout_rate, self.weight_decay)
    }
}

/// Candidate values per hyperparameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperparamGrid {
    pub learning_rates: Vec<f64>,
    pub dropout_rates: Vec<f64>,
    pub weight_decays: Vec<f64>,
}

impl HyperparamGrid {
    /// Cartesian product in a fixed order: dropout rate varies slowest,
    /// then learning rate, then weight decay fastest.
    pub fn configs(&self) -> Vec<HyperparamConfig> {
        let mut out = Vec::with_capacity(self.len());
        for &dropout_rate in &self.dropout_rates {
            for &learning_rate in &self.learning_rates {
                for &weight_decay in &self.weight_decays {
                    out.push(HyperparamConfig { learning_rate, dropout_rate, weight_decay });
                }
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.learning_rates.len() * self.dropout_rates.len() * self.weight_decays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(TuneError::invalid_config("every hyperparameter needs at least one candidate"));
        }
        self.configs().iter().try_for_each(HyperparamConfig::validate)
    }
}

impl Default for HyperparamGrid {
    fn default() -> Self {
        HyperparamGrid {
            learning_rates: vec![5e-6, 1e-5, 5e-5, 1e-4, 5e-4, 1e-3],
            dropout_rates: vec![0.1, 0.3, 0.5, 0.75],
            weight_decays: vec![0.0, 1e-6, 1e-4, 1e-2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumeration_order_is_dropout_then_lr_then_decay() {
        let grid = HyperparamGrid {
            learning_rates: vec![1.0, 2.0],
            dropout_rates: vec![0.1, 0.2],
            weight_decays: vec![0.0, 0.5],
        };
        let configs = grid.configs();
        assert_eq!(configs.len(), 8);
        assert_eq!(configs[0], HyperparamConfig::new(1.0, 0.1, 0.0));
        assert_eq!(configs[1], HyperparamConfig::new(1.0, 0.1, 0.5));
        assert_eq!(configs[2], HyperparamConfig::new(2.0, 0.1, 0.0));
        assert_eq!(configs[4], HyperparamConfig::new(1.0, 0.2, 0.0));
    }

    #[test]
    fn default_grid_has_96_points() {
        assert_eq!(HyperparamGrid::default().configs().len(), 96);
        assert!(HyperparamGrid::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        assert!(HyperparamConfig::new(0.0, 0.1, 0.0).validate().is_err());
        assert!(HyperparamConfig::new(1e-3, 1.0, 0.0).validate().is_err());
        assert!(HyperparamConfig::new(1e-3, 0.1, -1.0).validate().is_err());
        assert!(HyperparamConfig::new(1e-3, 0.0, 0.0).validate().is_ok());
    }
}

use serde::{Serialize, Deserialize};

use crate::layers::parameter::Parameter;
use crate::optim::{adam::Adam, sgd::Sgd};

/// Optimizer capability.
///
/// Parameters are passed on every call rather than captured at construction;
/// any per-parameter state is keyed by position, so callers must pass the
/// same parameters in the same order each time.
pub trait Optimizer {
    /// Clears the accumulated gradients.
    fn zero_gradients(&mut self, params: &mut [&mut Parameter]) {
        for p in params.iter_mut() {
            p.zero_grad();
        }
    }

    /// Applies one update from the accumulated gradients.
    fn step(&mut self, params: &mut [&mut Parameter]);

    fn learning_rate(&self) -> f64;

    fn weight_decay(&self) -> f64;
}

/// Which optimizer a sweep instantiates per trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    #[default]
    Adam,
    Sgd,
}

impl OptimizerKind {
    pub fn build(self, learning_rate: f64, weight_decay: f64) -> Box<dyn Optimizer> {
        match self {
            OptimizerKind::Adam => Box::new(Adam::new(learning_rate, weight_decay)),
            OptimizerKind::Sgd => Box::new(Sgd::new(learning_rate, weight_decay)),
        }
    }
}

impl<O: Optimizer + ?Sized> Optimizer for Box<O> {
    fn zero_gradients(&mut self, params: &mut [&mut Parameter]) {
        (**self).zero_gradients(params)
    }

    fn step(&mut self, params: &mut [&mut Parameter]) {
        (**self).step(params)
    }

    fn learning_rate(&self) -> f64 {
        (**self).learning_rate()
    }

    fn weight_decay(&self) -> f64 {
        (**self).weight_decay()
    }
}

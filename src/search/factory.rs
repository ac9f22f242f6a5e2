use crate::error::Result;
use crate::network::classifier::Classifier;
use crate::network::model::Model;
use crate::network::spec::ClassifierSpec;
use crate::optim::optimizer::{Optimizer, OptimizerKind};
use crate::search::grid::HyperparamConfig;

/// Builds a fresh, untrained model and its optimizer for one configuration.
pub trait TrialFactory {
    type Model: Model;
    type Optimizer: Optimizer;

    fn build(&mut self, config: &HyperparamConfig) -> Result<(Self::Model, Self::Optimizer)>;
}

/// Builds [`Classifier`]s from a fixed architecture and seed, so every
/// trial starts from the same initial weights and differs only in its
/// hyperparameters.
#[derive(Debug, Clone)]
pub struct ClassifierFactory {
    pub spec: ClassifierSpec,
    pub optimizer: OptimizerKind,
    pub seed: u64,
}

impl ClassifierFactory {
    pub fn new(spec: ClassifierSpec, optimizer: OptimizerKind, seed: u64) -> Self {
        ClassifierFactory { spec, optimizer, seed }
    }
}

impl TrialFactory for ClassifierFactory {
    type Model = Classifier;
    type Optimizer = Box<dyn Optimizer>;

    fn build(&mut self, config: &HyperparamConfig) -> Result<(Classifier, Box<dyn Optimizer>)> {
        config.validate()?;
        let model = Classifier::new(self.spec.clone(), config.dropout_rate, self.seed);
        let optimizer = self.optimizer.build(config.learning_rate, config.weight_decay);
        Ok((model, optimizer))
    }
}

//! Scripted model, optimizer and criterion for driving the engine with
//! exactly known losses.
//!
//! `StubModel` holds a single counter parameter `w`; `CountingOptimizer`
//! adds 1 to it per step, so with one batch per epoch `w` equals the number
//! of trained epochs. Forward emits `[w, key]` per row and `ScriptedLoss`
//! turns that pair into a loss via its closure.

#![allow(dead_code)]

use std::collections::BTreeMap;

use ferrite_tune::data::{Batch, Dataset, Example};
use ferrite_tune::error::{Result, TuneError};
use ferrite_tune::layers::Parameter;
use ferrite_tune::loss::Criterion;
use ferrite_tune::network::{Model, ModelState};
use ferrite_tune::optim::Optimizer;
use ferrite_tune::search::{HyperparamConfig, TrialFactory};
use ferrite_tune::Matrix;

pub struct StubModel {
    pub w: Parameter,
    pub key: f64,
    pub training: bool,
    pub grad: bool,
    /// Forward fails once `w` reaches this value.
    pub fail_at: Option<f64>,
    /// `(is_training, grad_enabled)` as seen by each forward call.
    pub forwards: Vec<(bool, bool)>,
}

impl StubModel {
    pub fn new(key: f64) -> Self {
        StubModel {
            w: Parameter::new(Matrix::zeros(1, 1)),
            key,
            training: false,
            grad: true,
            fail_at: None,
            forwards: Vec::new(),
        }
    }

    pub fn epochs_trained(&self) -> f64 {
        self.w.value.data[0][0]
    }
}

impl Model for StubModel {
    fn forward(&mut self, batch: &Batch) -> Result<Matrix> {
        self.forwards.push((self.training, self.grad));
        let w = self.epochs_trained();
        if self.fail_at.is_some_and(|at| w >= at) {
            return Err(TuneError::malformed("scripted failure"));
        }
        Ok(Matrix::from_data(vec![vec![w, self.key]; batch.len()]))
    }

    fn backward(&mut self, _grad_output: &Matrix) -> Result<()> {
        Ok(())
    }

    fn train_mode(&mut self) {
        self.training = true;
    }

    fn eval_mode(&mut self) {
        self.training = false;
    }

    fn is_training(&self) -> bool {
        self.training
    }

    fn set_grad_enabled(&mut self, enabled: bool) {
        self.grad = enabled;
    }

    fn grad_enabled(&self) -> bool {
        self.grad
    }

    fn parameters_mut(&mut self) -> Vec<&mut Parameter> {
        vec![&mut self.w]
    }

    fn state(&self) -> ModelState {
        let mut tensors = BTreeMap::new();
        tensors.insert("w".to_string(), self.w.value.clone());
        ModelState { tensors }
    }

    fn load_state(&mut self, state: &ModelState) -> Result<()> {
        state.copy_into("w", &mut self.w.value)
    }
}

#[derive(Default)]
pub struct CountingOptimizer {
    pub steps: usize,
}

impl Optimizer for CountingOptimizer {
    fn step(&mut self, params: &mut [&mut Parameter]) {
        self.steps += 1;
        for p in params.iter_mut() {
            p.value.data[0][0] += 1.0;
        }
    }

    fn learning_rate(&self) -> f64 {
        0.0
    }

    fn weight_decay(&self) -> f64 {
        0.0
    }
}

/// Loss as a function of `(key, epoch)`.
pub struct ScriptedLoss<F: Fn(f64, usize) -> f64>(pub F);

impl<F: Fn(f64, usize) -> f64> Criterion for ScriptedLoss<F> {
    fn compute(&self, predictions: &Matrix, _targets: &Matrix) -> f64 {
        let row = &predictions.data[0];
        (self.0)(row[1], row[0].round() as usize)
    }

    fn gradient(&self, predictions: &Matrix, _targets: &Matrix) -> Matrix {
        Matrix::zeros(predictions.rows, predictions.cols)
    }
}

/// Builds stub models keyed by `learning_rate + 10 * dropout_rate`.
#[derive(Default)]
pub struct StubFactory {
    pub fail_at: Option<f64>,
}

pub fn key_of(config: &HyperparamConfig) -> f64 {
    config.learning_rate + 10.0 * config.dropout_rate
}

impl TrialFactory for StubFactory {
    type Model = StubModel;
    type Optimizer = CountingOptimizer;

    fn build(&mut self, config: &HyperparamConfig) -> Result<(StubModel, CountingOptimizer)> {
        let mut model = StubModel::new(key_of(config));
        model.fail_at = self.fail_at;
        Ok((model, CountingOptimizer::default()))
    }
}

/// Two examples, one per class, served as a single batch.
pub fn tiny_dataset() -> Dataset {
    let examples = (0..2)
        .map(|label| Example { input_ids: vec![1, 2, 3], attention_mask: vec![1, 1, 0], label })
        .collect();
    Dataset::new(examples, 8)
}

/// V-shaped curve with its minimum `base` at epoch 2.
pub fn v_curve(base: f64, epoch: usize) -> f64 {
    base + (epoch as f64 - 2.0).abs() * 0.1
}

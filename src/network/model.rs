use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::data::batch::Batch;
use crate::error::{Result, TuneError};
use crate::layers::parameter::Parameter;
use crate::math::matrix::Matrix;

/// Serialized parameters of a model, keyed by parameter name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelState {
    pub tensors: BTreeMap<String, Matrix>,
}

impl ModelState {
    pub fn get(&self, name: &str) -> Result<&Matrix> {
        self.tensors
            .get(name)
            .ok_or_else(|| TuneError::mismatch(format!("missing tensor '{}'", name)))
    }

    /// Copies the named tensor into `target`, checking its shape first.
    pub fn copy_into(&self, name: &str, target: &mut Matrix) -> Result<()> {
        let source = self.get(name)?;
        if !source.same_shape(target) {
            return Err(TuneError::mismatch(format!(
                "tensor '{}' has shape {}x{}, expected {}x{}",
                name, source.rows, source.cols, target.rows, target.cols
            )));
        }
        *target = source.clone();
        Ok(())
    }
}

/// The classifier capability the training engine drives.
///
/// The engine never inspects the architecture: it only runs forward and
/// backward passes, toggles modes, hands parameters to an optimizer and
/// snapshots state for checkpoints.
pub trait Model {
    /// Class scores for every example in the batch (`batch × classes`).
    fn forward(&mut self, batch: &Batch) -> Result<Matrix>;

    /// Accumulates parameter gradients given ∂L/∂output of the last
    /// gradient-tracked forward pass.
    fn backward(&mut self, grad_output: &Matrix) -> Result<()>;

    /// Enables training-only behaviour such as dropout.
    fn train_mode(&mut self);

    fn eval_mode(&mut self);

    fn is_training(&self) -> bool;

    /// Whether forward passes cache what `backward` needs.
    fn set_grad_enabled(&mut self, enabled: bool);

    fn grad_enabled(&self) -> bool;

    fn parameters_mut(&mut self) -> Vec<&mut Parameter>;

    fn state(&self) -> ModelState;

    /// Replaces all parameters. Fails without modifying the model when names
    /// or shapes do not match.
    fn load_state(&mut self, state: &ModelState) -> Result<()>;
}

/// Runs `f` with gradient tracking disabled, restoring the previous setting
/// afterwards.
pub fn no_grad<M, F, R>(model: &mut M, f: F) -> R
where
    M: Model + ?Sized,
    F: FnOnce(&mut M) -> R,
{
    let previous = model.grad_enabled();
    model.set_grad_enabled(false);
    let out = f(model);
    model.set_grad_enabled(previous);
    out
}

use crate::data::batch::{Dataset, NUM_CLASSES};
use crate::error::Result;
use crate::loss::criterion::Criterion;
use crate::math::matrix::Matrix;
use crate::network::model::Model;
use crate::optim::optimizer::Optimizer;

/// Runs exactly one pass of gradient updates over `train`, one optimizer
/// step per batch.
///
/// Puts the model in training mode and leaves it there; switching to
/// evaluation mode is the caller's job.
pub fn train_epoch<M, O, C>(
    model: &mut M,
    optimizer: &mut O,
    criterion: &C,
    train: &Dataset,
) -> Result<()>
where
    M: Model + ?Sized,
    O: Optimizer + ?Sized,
    C: Criterion + ?Sized,
{
    model.train_mode();
    model.set_grad_enabled(true);

    for batch in train.batches() {
        optimizer.zero_gradients(&mut model.parameters_mut());

        let targets = Matrix::one_hot(&batch.labels, NUM_CLASSES);
        let output = model.forward(&batch)?;
        let grad = criterion.gradient(&output, &targets);
        model.backward(&grad)?;

        optimizer.step(&mut model.parameters_mut());
    }

    Ok(())
}

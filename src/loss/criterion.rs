use crate::math::matrix::Matrix;

/// Loss capability used by both the training loop and the evaluator.
///
/// `predictions` and `targets` are `batch × classes`; targets are one-hot.
pub trait Criterion {
    /// Mean loss over the examples of the batch.
    fn compute(&self, predictions: &Matrix, targets: &Matrix) -> f64;

    /// ∂L/∂output for the same batch, already divided by the batch size.
    fn gradient(&self, predictions: &Matrix, targets: &Matrix) -> Matrix;
}

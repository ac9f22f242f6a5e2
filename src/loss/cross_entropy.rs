use crate::loss::criterion::Criterion;
use crate::math::matrix::Matrix;

/// Categorical cross-entropy loss for use with a Softmax output layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossEntropyLoss;

/// Small epsilon added inside log() to prevent log(0) = -inf.
const EPS: f64 = 1e-12;

impl CrossEntropyLoss {
    /// Cross-entropy of a single example:
    ///   L = -sum(expected[i] * log(predicted[i] + eps))
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        predicted.iter().zip(expected.iter())
            .map(|(p, e)| -e * (p + EPS).ln())
            .sum()
    }
}

impl Criterion for CrossEntropyLoss {
    fn compute(&self, predictions: &Matrix, targets: &Matrix) -> f64 {
        if predictions.rows == 0 {
            return 0.0;
        }
        let total: f64 = predictions.data.iter().zip(targets.data.iter())
            .map(|(p, y)| CrossEntropyLoss::loss(p, y))
            .sum();
        total / predictions.rows as f64
    }

    /// Combined Softmax + cross-entropy gradient with respect to the logits:
    ///   ∂L/∂z_i = (predicted[i] - expected[i]) / batch
    ///
    /// The Softmax activation's own derivative is identity, so this delta is
    /// not double-applied.
    fn gradient(&self, predictions: &Matrix, targets: &Matrix) -> Matrix {
        let inv_batch = 1.0 / predictions.rows.max(1) as f64;
        (predictions.clone() - targets.clone()).map(|x| x * inv_batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_prediction_has_near_zero_loss() {
        let y = Matrix::one_hot(&[0, 1], 2);
        let loss = CrossEntropyLoss.compute(&y, &y);
        assert!(loss.abs() < 1e-9);
    }

    #[test]
    fn uniform_prediction_costs_ln2() {
        let p = Matrix::from_data(vec![vec![0.5, 0.5]]);
        let y = Matrix::one_hot(&[1], 2);
        assert!((CrossEntropyLoss.compute(&p, &y) - 2f64.ln()).abs() < 1e-9);
    }

    #[test]
    fn gradient_is_scaled_by_batch() {
        let p = Matrix::from_data(vec![vec![0.75, 0.25], vec![0.5, 0.5]]);
        let y = Matrix::one_hot(&[0, 1], 2);
        let g = CrossEntropyLoss.gradient(&p, &y);
        assert_eq!(g.data, vec![vec![-0.125, 0.125], vec![0.25, -0.25]]);
    }
}

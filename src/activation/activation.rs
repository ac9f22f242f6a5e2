use serde::{Serialize, Deserialize};
use std::f64::consts::PI;

use crate::math::matrix::Matrix;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationFunction {
    Identity,
    #[serde(rename = "relu")]
    ReLU,
    Sigmoid,
    Tanh,
    Gelu,
    /// Row-wise softmax over the class dimension. Only valid on the output
    /// layer, paired with cross-entropy.
    Softmax,
}

impl ActivationFunction {
    /// Applies the activation to a batch of pre-activations (one example per row).
    pub fn apply(&self, z: &Matrix) -> Matrix {
        match self {
            ActivationFunction::Softmax => Matrix {
                rows: z.rows,
                cols: z.cols,
                data: z.data.iter().map(|row| softmax(row)).collect(),
            },
            other => z.map(|x| other.function(x)),
        }
    }

    /// Element-wise derivative evaluated at the pre-activations.
    ///
    /// Softmax returns ones: the cross-entropy gradient is already expressed
    /// with respect to the logits (`p - y`), so the Jacobian must not be
    /// applied a second time.
    pub fn derivative_at(&self, z: &Matrix) -> Matrix {
        z.map(|x| self.derivative(x))
    }

    fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Identity => x,
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Sigmoid => sigmoid(x),
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::Gelu => {
                let c = (2.0_f64 / PI).sqrt();
                0.5 * x * (1.0 + (c * (x + 0.044715 * x.powi(3))).tanh())
            }
            ActivationFunction::Softmax => x,
        }
    }

    fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Identity | ActivationFunction::Softmax => 1.0,
            ActivationFunction::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::Sigmoid => {
                let fx = sigmoid(x);
                fx * (1.0 - fx)
            }
            ActivationFunction::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
            ActivationFunction::Gelu => {
                let c = (2.0_f64 / PI).sqrt();
                let inner = c * (x + 0.044715 * x.powi(3));
                let tanh_inner = inner.tanh();
                let sech2 = 1.0 - tanh_inner * tanh_inner;
                let d_inner = c * (1.0 + 3.0 * 0.044715 * x.powi(2));
                0.5 * tanh_inner + 0.5 * x * sech2 * d_inner + 0.5
            }
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Numerically stable softmax (max-shifted).
fn softmax(row: &[f64]) -> Vec<f64> {
    let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = row.iter().map(|x| (x - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softmax_rows_sum_to_one() {
        let z = Matrix::from_data(vec![vec![1000.0, 1001.0], vec![-3.0, 2.0]]);
        let p = ActivationFunction::Softmax.apply(&z);
        for row in &p.data {
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }
        assert!(p.data[0][1] > p.data[0][0]);
    }

    #[test]
    fn relu_derivative_is_step() {
        let z = Matrix::from_data(vec![vec![-1.0, 0.0, 2.0]]);
        assert_eq!(ActivationFunction::ReLU.derivative_at(&z).data, vec![vec![0.0, 0.0, 1.0]]);
    }
}

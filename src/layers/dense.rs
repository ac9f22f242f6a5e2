use crate::{math::matrix::Matrix, activation::activation::ActivationFunction};
use crate::layers::parameter::Parameter;

/// Fully connected layer operating on a batch (`batch × input_size`).
#[derive(Debug, Clone)]
pub struct Dense {
    pub weights: Parameter,
    pub biases: Parameter,
    pub activator: ActivationFunction,
    inputs: Option<Matrix>,
    pre_neurons: Option<Matrix>,  // z = xW + b, needed for the activation derivative
}

impl Dense {
    /// Builds a layer with He init for ReLU-family activations and Xavier
    /// otherwise. Biases start at zero.
    pub fn new<R: rand::Rng>(
        input_size: usize,
        size: usize,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> Dense {
        let weights = match activation {
            ActivationFunction::ReLU | ActivationFunction::Gelu => Matrix::he(input_size, size, rng),
            _ => Matrix::xavier(input_size, size, rng),
        };
        Dense {
            weights: Parameter::new(weights),
            biases: Parameter::new(Matrix::zeros(1, size)),
            activator: activation,
            inputs: None,
            pre_neurons: None,
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.value.rows
    }

    pub fn size(&self) -> usize {
        self.weights.value.cols
    }

    /// Forward pass. Caches inputs and pre-activations only when `track` is set.
    pub fn feed_from(&mut self, input: &Matrix, track: bool) -> Matrix {
        let z = (input * &self.weights.value).add_row(&self.biases.value);
        let a = self.activator.apply(&z);
        if track {
            self.inputs = Some(input.clone());
            self.pre_neurons = Some(z);
        } else {
            self.inputs = None;
            self.pre_neurons = None;
        }
        a
    }

    /// Accumulates weight and bias gradients from `delta` (∂L/∂a for this
    /// layer's output) and returns ∂L/∂x for the layer input.
    ///
    /// Returns `None` when the last forward pass was not tracked.
    pub fn backward(&mut self, delta: &Matrix) -> Option<Matrix> {
        let (inputs, z) = match (&self.inputs, &self.pre_neurons) {
            (Some(x), Some(z)) => (x, z),
            _ => return None,
        };
        // δ = error ⊙ σ'(z)
        let layer_delta = delta.hadamard(&self.activator.derivative_at(z));

        self.weights.accumulate(&(&inputs.transpose() * &layer_delta));
        self.biases.accumulate(&layer_delta.column_sums());

        Some(&layer_delta * &self.weights.value.transpose())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn identity_layer_gradient_matches_outer_product() {
        let mut layer = Dense::new(2, 1, ActivationFunction::Identity, &mut StdRng::seed_from_u64(1));
        let x = Matrix::from_data(vec![vec![1.0, 2.0]]);
        layer.feed_from(&x, true);
        let dx = layer.backward(&Matrix::from_data(vec![vec![0.5]])).unwrap();

        assert_eq!(layer.weights.grad.data, vec![vec![0.5], vec![1.0]]);
        assert_eq!(layer.biases.grad.data, vec![vec![0.5]]);
        assert_eq!(dx.cols, 2);
    }

    #[test]
    fn untracked_forward_has_no_backward() {
        let mut layer = Dense::new(2, 2, ActivationFunction::ReLU, &mut StdRng::seed_from_u64(1));
        layer.feed_from(&Matrix::zeros(3, 2), false);
        assert!(layer.backward(&Matrix::zeros(3, 2)).is_none());
    }
}

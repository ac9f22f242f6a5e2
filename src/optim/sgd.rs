use crate::layers::parameter::Parameter;
use crate::optim::optimizer::Optimizer;

/// Plain SGD with L2 weight decay: `w -= lr * (g + weight_decay * w)`.
pub struct Sgd {
    pub learning_rate: f64,
    pub weight_decay: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64, weight_decay: f64) -> Sgd {
        Sgd { learning_rate, weight_decay }
    }
}

impl Optimizer for Sgd {
    fn step(&mut self, params: &mut [&mut Parameter]) {
        let (lr, wd) = (self.learning_rate, self.weight_decay);
        for p in params.iter_mut() {
            let Parameter { value, grad } = &mut **p;
            for (row, grow) in value.data.iter_mut().zip(grad.data.iter()) {
                for (w, g) in row.iter_mut().zip(grow.iter()) {
                    *w -= lr * (g + wd * *w);
                }
            }
        }
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn weight_decay(&self) -> f64 {
        self.weight_decay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::matrix::Matrix;

    #[test]
    fn step_follows_gradient_and_decay() {
        let mut p = Parameter::new(Matrix::from_data(vec![vec![1.0]]));
        p.grad = Matrix::from_data(vec![vec![0.5]]);
        Sgd::new(0.1, 0.5).step(&mut [&mut p]);
        assert!((p.value.data[0][0] - (1.0 - 0.1 * (0.5 + 0.5))).abs() < 1e-12);
    }
}

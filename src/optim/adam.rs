use crate::layers::parameter::Parameter;
use crate::math::matrix::Matrix;
use crate::optim::optimizer::Optimizer;

/// Adam with L2 weight decay folded into the gradient (`g + weight_decay * w`),
/// bias-corrected first and second moments.
pub struct Adam {
    pub learning_rate: f64,
    pub weight_decay: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub eps: f64,
    step: u64,
    // (first moment, second moment) per parameter position.
    moments: Vec<(Matrix, Matrix)>,
}

impl Adam {
    pub fn new(learning_rate: f64, weight_decay: f64) -> Adam {
        Adam {
            learning_rate,
            weight_decay,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            step: 0,
            moments: Vec::new(),
        }
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut [&mut Parameter]) {
        if self.moments.len() != params.len() {
            self.moments = params.iter()
                .map(|p| {
                    let (r, c) = (p.value.rows, p.value.cols);
                    (Matrix::zeros(r, c), Matrix::zeros(r, c))
                })
                .collect();
        }
        self.step += 1;
        let t = self.step as i32;
        let bc1 = 1.0 - self.beta1.powi(t);
        let bc2 = 1.0 - self.beta2.powi(t);
        let (b1, b2, lr, wd, eps) = (self.beta1, self.beta2, self.learning_rate, self.weight_decay, self.eps);

        for (p, (m, v)) in params.iter_mut().zip(self.moments.iter_mut()) {
            let Parameter { value, grad } = &mut **p;
            for i in 0..value.rows {
                for j in 0..value.cols {
                    let w = value.data[i][j];
                    let g = grad.data[i][j] + wd * w;
                    let mij = b1 * m.data[i][j] + (1.0 - b1) * g;
                    let vij = b2 * v.data[i][j] + (1.0 - b2) * g * g;
                    m.data[i][j] = mij;
                    v.data[i][j] = vij;
                    let m_hat = mij / bc1;
                    let v_hat = vij / bc2;
                    value.data[i][j] = w - lr * m_hat / (v_hat.sqrt() + eps);
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

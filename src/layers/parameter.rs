use crate::math::matrix::Matrix;

/// A trainable matrix together with its accumulated gradient.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub value: Matrix,
    pub grad: Matrix,
}

impl Parameter {
    pub fn new(value: Matrix) -> Parameter {
        let grad = Matrix::zeros(value.rows, value.cols);
        Parameter { value, grad }
    }

    /// Adds `grad` into the accumulated gradient.
    pub fn accumulate(&mut self, grad: &Matrix) {
        self.grad.add_assign(grad);
    }

    pub fn zero_grad(&mut self) {
        self.grad.fill(0.0);
    }
}

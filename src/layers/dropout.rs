use rand::Rng;
use rand::rngs::StdRng;

use crate::math::matrix::Matrix;

/// Inverted dropout: in training mode each unit is zeroed with probability
/// `rate` and survivors are scaled by `1 / (1 - rate)`. Identity otherwise.
#[derive(Debug, Clone)]
pub struct Dropout {
    pub rate: f64,
    mask: Option<Matrix>,
}

impl Dropout {
    pub fn new(rate: f64) -> Dropout {
        Dropout { rate, mask: None }
    }

    pub fn feed_from(&mut self, input: &Matrix, training: bool, rng: &mut StdRng) -> Matrix {
        if !training || self.rate <= 0.0 {
            self.mask = None;
            return input.clone();
        }
        let keep = 1.0 - self.rate;
        let mut mask = Matrix::zeros(input.rows, input.cols);
        for x in mask.data.iter_mut().flat_map(|row| row.iter_mut()) {
            if rng.gen::<f64>() < keep {
                *x = 1.0 / keep;
            }
        }
        let out = input.hadamard(&mask);
        self.mask = Some(mask);
        out
    }

    pub fn backward(&self, delta: &Matrix) -> Matrix {
        match &self.mask {
            Some(mask) => delta.hadamard(mask),
            None => delta.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn eval_mode_is_identity() {
        let mut d = Dropout::new(0.5);
        let x = Matrix::from_data(vec![vec![1.0, 2.0, 3.0]]);
        assert_eq!(d.feed_from(&x, false, &mut StdRng::seed_from_u64(0)), x);
    }

    #[test]
    fn training_mode_zeroes_or_scales() {
        let mut d = Dropout::new(0.5);
        let x = Matrix::from_data(vec![vec![1.0; 64]]);
        let y = d.feed_from(&x, true, &mut StdRng::seed_from_u64(0));
        assert!(y.data[0].iter().all(|&v| v == 0.0 || v == 2.0));
        assert!(y.data[0].iter().any(|&v| v == 0.0));
    }
}

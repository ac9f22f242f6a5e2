use crate::error::{Result, TuneError};
use crate::layers::parameter::Parameter;
use crate::math::matrix::Matrix;

/// Token embedding table with attention-mask mean pooling.
///
/// Each example becomes the mean of the embedding rows of its unmasked
/// tokens; an example with no unmasked tokens pools to zeros.
#[derive(Debug, Clone)]
pub struct EmbeddingBag {
    pub table: Parameter,
    // Per example: (token ids that were pooled, 1 / count).
    pooled: Option<Vec<(Vec<usize>, f64)>>,
}

impl EmbeddingBag {
    pub fn new<R: rand::Rng>(vocab_size: usize, dim: usize, rng: &mut R) -> EmbeddingBag {
        EmbeddingBag {
            table: Parameter::new(Matrix::xavier(vocab_size, dim, rng)),
            pooled: None,
        }
    }

    pub fn vocab_size(&self) -> usize {
        self.table.value.rows
    }

    pub fn dim(&self) -> usize {
        self.table.value.cols
    }

    pub fn feed_from(
        &mut self,
        input_ids: &[Vec<u32>],
        attention_mask: &[Vec<u8>],
        track: bool,
    ) -> Result<Matrix> {
        let mut out = Matrix::zeros(input_ids.len(), self.dim());
        let mut pooled = Vec::with_capacity(input_ids.len());

        for (i, (ids, mask)) in input_ids.iter().zip(attention_mask).enumerate() {
            let mut used = Vec::new();
            for (&id, &m) in ids.iter().zip(mask) {
                if m == 0 {
                    continue;
                }
                let id = id as usize;
                if id >= self.vocab_size() {
                    return Err(TuneError::malformed(format!(
                        "token id {} out of vocabulary (size {})",
                        id,
                        self.vocab_size()
                    )));
                }
                used.push(id);
            }

            let scale = if used.is_empty() { 0.0 } else { 1.0 / used.len() as f64 };
            for &id in &used {
                for (o, w) in out.data[i].iter_mut().zip(&self.table.value.data[id]) {
                    *o += w * scale;
                }
            }
            pooled.push((used, scale));
        }

        self.pooled = if track { Some(pooled) } else { None };
        Ok(out)
    }

    /// Scatters ∂L/∂pooled back onto the embedding rows that were averaged.
    pub fn backward(&mut self, delta: &Matrix) -> bool {
        let pooled = match &self.pooled {
            Some(p) => p,
            None => return false,
        };
        for ((ids, scale), grad_row) in pooled.iter().zip(&delta.data) {
            for &id in ids {
                for (g, d) in self.table.grad.data[id].iter_mut().zip(grad_row) {
                    *g += d * scale;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn masked_tokens_are_ignored() {
        let mut emb = EmbeddingBag::new(4, 3, &mut StdRng::seed_from_u64(3));
        let out = emb.feed_from(&[vec![1, 2]], &[vec![1, 0]], false).unwrap();
        assert_eq!(out.data[0], emb.table.value.data[1]);
    }

    #[test]
    fn out_of_vocab_is_malformed() {
        let mut emb = EmbeddingBag::new(4, 3, &mut StdRng::seed_from_u64(3));
        let err = emb.feed_from(&[vec![9]], &[vec![1]], false).unwrap_err();
        assert!(matches!(err, TuneError::MalformedBatch(_)));
    }

    #[test]
    fn gradient_is_split_across_pooled_tokens() {
        let mut emb = EmbeddingBag::new(3, 1, &mut StdRng::seed_from_u64(3));
        emb.feed_from(&[vec![0, 2]], &[vec![1, 1]], true).unwrap();
        assert!(emb.backward(&Matrix::from_data(vec![vec![1.0]])));
        assert_eq!(emb.table.grad.data, vec![vec![0.5], vec![0.0], vec![0.5]]);
    }
}

use rand::{rngs::StdRng, SeedableRng};

use crate::activation::activation::ActivationFunction;
use crate::data::batch::{Batch, NUM_CLASSES};
use crate::error::{Result, TuneError};
use crate::layers::{Dense, Dropout, EmbeddingBag, Parameter};
use crate::math::matrix::Matrix;
use crate::network::model::{Model, ModelState};
use crate::network::spec::ClassifierSpec;

const EMBEDDING: &str = "embedding.table";
const HIDDEN_W: &str = "hidden.weights";
const HIDDEN_B: &str = "hidden.biases";
const HEAD_W: &str = "head.weights";
const HEAD_B: &str = "head.biases";

/// Reference binary text classifier:
/// masked mean-pooled embeddings → dense hidden layer → dropout → softmax head.
///
/// Outputs class probabilities. Weight init and dropout masks are drawn from
/// a generator seeded at construction, so two classifiers built with the same
/// spec, dropout rate and seed behave identically.
pub struct Classifier {
    pub spec: ClassifierSpec,
    embedding: EmbeddingBag,
    hidden: Dense,
    dropout: Dropout,
    head: Dense,
    rng: StdRng,
    training: bool,
    grad_enabled: bool,
}

impl Classifier {
    pub fn new(spec: ClassifierSpec, dropout_rate: f64, seed: u64) -> Classifier {
        let mut rng = StdRng::seed_from_u64(seed);
        let embedding = EmbeddingBag::new(spec.vocab_size, spec.embedding_dim, &mut rng);
        let hidden = Dense::new(spec.embedding_dim, spec.hidden_size, spec.hidden_activation, &mut rng);
        let head = Dense::new(spec.hidden_size, NUM_CLASSES, ActivationFunction::Softmax, &mut rng);
        Classifier {
            spec,
            embedding,
            hidden,
            dropout: Dropout::new(dropout_rate),
            head,
            rng,
            training: false,
            grad_enabled: true,
        }
    }

    pub fn dropout_rate(&self) -> f64 {
        self.dropout.rate
    }

    fn named_parameters_mut(&mut self) -> [(&'static str, &mut Parameter); 5] {
        [
            (EMBEDDING, &mut self.embedding.table),
            (HIDDEN_W, &mut self.hidden.weights),
            (HIDDEN_B, &mut self.hidden.biases),
            (HEAD_W, &mut self.head.weights),
            (HEAD_B, &mut self.head.biases),
        ]
    }
}

impl Model for Classifier {
    fn forward(&mut self, batch: &Batch) -> Result<Matrix> {
        batch.validate()?;
        let track = self.grad_enabled;
        let pooled = self.embedding.feed_from(&batch.input_ids, &batch.attention_mask, track)?;
        let hidden = self.hidden.feed_from(&pooled, track);
        let dropped = self.dropout.feed_from(&hidden, self.training, &mut self.rng);
        Ok(self.head.feed_from(&dropped, track))
    }

    fn backward(&mut self, grad_output: &Matrix) -> Result<()> {
        let untracked = || TuneError::malformed("backward called without a tracked forward pass");
        let d_dropped = self.head.backward(grad_output).ok_or_else(untracked)?;
        let d_hidden = self.dropout.backward(&d_dropped);
        let d_pooled = self.hidden.backward(&d_hidden).ok_or_else(untracked)?;
        if !self.embedding.backward(&d_pooled) {
            return Err(untracked());
        }
        Ok(())
    }

    fn train_mode(&mut self) {
        self.training = true;
    }

    fn eval_mode(&mut self) {
        self.training = false;
    }

    fn is_training(&self) -> bool {
        self.training
    }

    fn set_grad_enabled(&mut self, enabled: bool) {
        self.grad_enabled = enabled;
    }

    fn grad_enabled(&self) -> bool {
        self.grad_enabled
    }

    fn parameters_mut(&mut self) -> Vec<&mut Parameter> {
        self.named_parameters_mut().into_iter().map(|(_, p)| p).collect()
    }

    fn state(&self) -> ModelState {
        let mut state = ModelState::default();
        for (name, param) in [
            (EMBEDDING, &self.embedding.table),
            (HIDDEN_W, &self.hidden.weights),
            (HIDDEN_B, &self.hidden.biases),
            (HEAD_W, &self.head.weights),
            (HEAD_B, &self.head.biases),
        ] {
            state.tensors.insert(name.to_string(), param.value.clone());
        }
        state
    }

    fn load_state(&mut self, state: &ModelState) -> Result<()> {
        let mut params = self.named_parameters_mut();
        // Check every tensor before touching any parameter.
        for (name, param) in params.iter() {
            let source = state.get(name)?;
            if !source.same_shape(&param.value) {
                return Err(TuneError::mismatch(format!(
                    "tensor '{}' has shape {}x{}, expected {}x{}",
                    name, source.rows, source.cols, param.value.rows, param.value.cols
                )));
            }
        }
        if state.tensors.len() != params.len() {
            return Err(TuneError::mismatch(format!(
                "state holds {} tensors, model has {}",
                state.tensors.len(),
                params.len()
            )));
        }
        for (name, param) in params.iter_mut() {
            state.copy_into(name, &mut param.value)?;
            param.zero_grad();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::batch::Example;

    fn tiny_spec() -> ClassifierSpec {
        ClassifierSpec { vocab_size: 10, embedding_dim: 4, hidden_size: 3, ..ClassifierSpec::default() }
    }

    fn batch() -> Batch {
        Batch::from_examples(&[
            Example { input_ids: vec![1, 2, 0], attention_mask: vec![1, 1, 0], label: 1 },
            Example { input_ids: vec![3, 0, 0], attention_mask: vec![1, 0, 0], label: 0 },
        ])
    }

    #[test]
    fn forward_yields_probabilities_per_example() {
        let mut model = Classifier::new(tiny_spec(), 0.1, 42);
        let out = model.forward(&batch()).unwrap();
        assert_eq!((out.rows, out.cols), (2, NUM_CLASSES));
        for row in &out.data {
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn same_seed_same_state() {
        let a = Classifier::new(tiny_spec(), 0.3, 5);
        let b = Classifier::new(tiny_spec(), 0.3, 5);
        assert_eq!(a.state(), b.state());
    }

    #[test]
    fn load_state_roundtrips() {
        let source = Classifier::new(tiny_spec(), 0.0, 1);
        let mut target = Classifier::new(tiny_spec(), 0.0, 2);
        target.load_state(&source.state()).unwrap();
        assert_eq!(target.state(), source.state());
    }

    #[test]
    fn load_state_rejects_other_architecture() {
        let other = Classifier::new(ClassifierSpec { hidden_size: 5, ..tiny_spec() }, 0.0, 1);
        let mut model = Classifier::new(tiny_spec(), 0.0, 1);
        let before = model.state();
        assert!(matches!(model.load_state(&other.state()), Err(TuneError::StateMismatch(_))));
        assert_eq!(model.state(), before);
    }

    #[test]
    fn backward_without_tracking_fails() {
        let mut model = Classifier::new(tiny_spec(), 0.0, 1);
        model.set_grad_enabled(false);
        let out = model.forward(&batch()).unwrap();
        assert!(model.backward(&out).is_err());
    }
}

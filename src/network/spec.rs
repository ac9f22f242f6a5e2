use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;

/// Architecture of the reference classifier.
///
/// The dropout rate is not part of the architecture: it is a searched
/// hyperparameter and is supplied when the classifier is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSpec {
    /// Number of rows in the token embedding table.
    pub vocab_size: usize,
    pub embedding_dim: usize,
    pub hidden_size: usize,
    pub hidden_activation: ActivationFunction,
}

impl Default for ClassifierSpec {
    fn default() -> Self {
        ClassifierSpec {
            vocab_size: 30522,
            embedding_dim: 64,
            hidden_size: 32,
            hidden_activation: ActivationFunction::ReLU,
        }
    }
}

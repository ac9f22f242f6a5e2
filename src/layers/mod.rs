pub mod dense;
pub mod dropout;
pub mod embedding;
pub mod parameter;

pub use dense::Dense;
pub use dropout::Dropout;
pub use embedding::EmbeddingBag;
pub use parameter::Parameter;

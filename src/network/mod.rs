pub mod classifier;
pub mod model;
pub mod spec;

pub use classifier::Classifier;
pub use model::{no_grad, Model, ModelState};
pub use spec::ClassifierSpec;

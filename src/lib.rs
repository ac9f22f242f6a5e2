pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod data;
pub mod train;
pub mod checkpoint;
pub mod search;
pub mod config;
pub mod report;
pub mod error;

// Convenience re-exports for the most commonly used types.
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use data::batch::{Batch, Dataset};
pub use network::classifier::Classifier;
pub use network::model::{Model, ModelState};
pub use loss::cross_entropy::CrossEntropyLoss;
pub use optim::adam::Adam;
pub use train::epoch_stats::{EpochStats, History, SplitMetrics};
pub use train::session::Session;
pub use checkpoint::dir_store::DirStore;
pub use search::driver::SearchDriver;
pub use config::RunConfig;
pub use report::Report;
pub use error::{Result, TuneError};

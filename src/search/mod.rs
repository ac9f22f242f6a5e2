pub mod driver;
pub mod factory;
pub mod finetune;
pub mod grid;

pub use driver::{BestTrial, SearchDriver, SearchResult, TrialRecord, TrialScope};
pub use factory::{ClassifierFactory, TrialFactory};
pub use finetune::{finetune, Finetuned};
pub use grid::{HyperparamConfig, HyperparamGrid};

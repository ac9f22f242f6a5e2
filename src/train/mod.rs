pub mod early_stopping;
pub mod epoch_stats;
pub mod loop_fn;
pub mod metrics;
pub mod session;
pub mod train_config;

pub use early_stopping::{EarlyStopping, PatienceState};
pub use epoch_stats::{EpochStats, History, SplitMetrics};
pub use loop_fn::train_epoch;
pub use metrics::{evaluate, evaluate_epoch, Confusion};
pub use session::Session;
pub use train_config::SessionConfig;

pub mod batch;
pub mod csv;

pub use batch::{Batch, Dataset, Example, NUM_CLASSES};
pub use csv::load_csv;

pub mod checkpoint;
pub mod dir_store;
pub mod memory_store;
pub mod store;

pub use checkpoint::Checkpoint;
pub use dir_store::DirStore;
pub use memory_store::MemoryStore;
pub use store::{restore, resume, CheckpointStore};

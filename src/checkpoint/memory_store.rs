use std::collections::BTreeMap;

use crate::checkpoint::checkpoint::Checkpoint;
use crate::checkpoint::store::CheckpointStore;
use crate::error::Result;

/// In-process checkpoint store. Checkpoints are kept serialized so that
/// save/load goes through the same encoding as on disk.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    name: String,
    entries: BTreeMap<usize, String>,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> MemoryStore {
        MemoryStore { name: name.into(), entries: BTreeMap::new() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CheckpointStore for MemoryStore {
    fn save(&mut self, checkpoint: &Checkpoint) -> Result<()> {
        checkpoint.ensure_encodable()?;
        let encoded = serde_json::to_string(checkpoint)?;
        self.entries.insert(checkpoint.epoch, encoded);
        Ok(())
    }

    fn load(&self, epoch: usize) -> Result<Option<Checkpoint>> {
        match self.entries.get(&epoch) {
            Some(encoded) => Ok(Some(serde_json::from_str(encoded)?)),
            None => Ok(None),
        }
    }

    fn epochs(&self) -> Result<Vec<usize>> {
        Ok(self.entries.keys().copied().collect())
    }

    fn clear(&mut self) -> Result<usize> {
        let removed = self.entries.len();
        self.entries.clear();
        Ok(removed)
    }

    fn location(&self) -> String {
        format!("memory:{}", self.name)
    }
}

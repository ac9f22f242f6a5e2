use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::error::{Result, TuneError};

/// Number of output classes of a binary classifier.
pub const NUM_CLASSES: usize = 2;

/// One tokenized, label-attached example.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub input_ids: Vec<u32>,
    pub attention_mask: Vec<u8>,
    pub label: usize,
}

/// A batch of examples in columnar form, as produced by the upstream
/// tokenization step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Batch {
    pub input_ids: Vec<Vec<u32>>,
    pub attention_mask: Vec<Vec<u8>>,
    pub labels: Vec<usize>,
}

impl Batch {
    pub fn from_examples(examples: &[Example]) -> Batch {
        Batch {
            input_ids: examples.iter().map(|e| e.input_ids.clone()).collect(),
            attention_mask: examples.iter().map(|e| e.attention_mask.clone()).collect(),
            labels: examples.iter().map(|e| e.label).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Checks that ids, masks and labels agree in size and that every label
    /// is a valid class index.
    pub fn validate(&self) -> Result<()> {
        let n = self.labels.len();
        if self.input_ids.len() != n || self.attention_mask.len() != n {
            return Err(TuneError::malformed(format!(
                "{} input rows, {} mask rows, {} labels",
                self.input_ids.len(),
                self.attention_mask.len(),
                n
            )));
        }
        for (i, (ids, mask)) in self.input_ids.iter().zip(&self.attention_mask).enumerate() {
            if ids.len() != mask.len() {
                return Err(TuneError::malformed(format!(
                    "row {}: {} ids but {} mask entries",
                    i,
                    ids.len(),
                    mask.len()
                )));
            }
        }
        if let Some(bad) = self.labels.iter().find(|&&l| l >= NUM_CLASSES) {
            return Err(TuneError::malformed(format!("label {} is not a binary class", bad)));
        }
        Ok(())
    }
}

/// Ordered examples served in fixed-size batches. Iteration order is the
/// storage order, so every pass over the dataset is reproducible.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub examples: Vec<Example>,
    pub batch_size: usize,
}

impl Dataset {
    pub fn new(examples: Vec<Example>, batch_size: usize) -> Dataset {
        Dataset { examples, batch_size: batch_size.max(1) }
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn batches(&self) -> impl Iterator<Item = Batch> + '_ {
        self.examples.chunks(self.batch_size.max(1)).map(Batch::from_examples)
    }

    /// Shuffles example order with a seeded generator.
    pub fn shuffle(&mut self, seed: u64) {
        self.examples.shuffle(&mut StdRng::seed_from_u64(seed));
    }

    /// Splits off the last `fraction` of examples per class into a second
    /// dataset, keeping class ratios of both halves close to the input.
    pub fn stratified_split(self, fraction: f64) -> (Dataset, Dataset) {
        let batch_size = self.batch_size;
        let mut keep = Vec::new();
        let mut held = Vec::new();
        for class in 0..NUM_CLASSES {
            let members: Vec<Example> = self.examples.iter()
                .filter(|e| e.label == class)
                .cloned()
                .collect();
            let n_held = (members.len() as f64 * fraction).round() as usize;
            let cut = members.len() - n_held.min(members.len());
            let (a, b) = members.split_at(cut);
            keep.extend_from_slice(a);
            held.extend_from_slice(b);
        }
        (Dataset::new(keep, batch_size), Dataset::new(held, batch_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example(label: usize) -> Example {
        Example { input_ids: vec![1, 2], attention_mask: vec![1, 1], label }
    }

    #[test]
    fn batches_cover_all_examples_in_order() {
        let ds = Dataset::new((0..5).map(|i| example(i % 2)).collect(), 2);
        let sizes: Vec<usize> = ds.batches().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        let labels: Vec<usize> = ds.batches().flat_map(|b| b.labels).collect();
        assert_eq!(labels, vec![0, 1, 0, 1, 0]);
    }

    #[test]
    fn validate_rejects_ragged_masks() {
        let mut batch = Batch::from_examples(&[example(0)]);
        batch.attention_mask[0].pop();
        assert!(matches!(batch.validate(), Err(TuneError::MalformedBatch(_))));
    }

    #[test]
    fn validate_rejects_non_binary_labels() {
        let batch = Batch::from_examples(&[example(2)]);
        assert!(batch.validate().is_err());
    }

    #[test]
    fn shuffle_is_seeded() {
        let make = || Dataset::new((0..10).map(|i| example(i % 2)).collect(), 2);
        let (mut a, mut b) = (make(), make());
        a.examples.iter_mut().enumerate().for_each(|(i, e)| e.input_ids[0] = i as u32);
        b.examples.iter_mut().enumerate().for_each(|(i, e)| e.input_ids[0] = i as u32);
        a.shuffle(9);
        b.shuffle(9);
        assert_eq!(a.examples, b.examples);
    }

    #[test]
    fn stratified_split_keeps_both_classes() {
        let ds = Dataset::new((0..20).map(|i| example(i % 2)).collect(), 4);
        let (train, val) = ds.stratified_split(0.1);
        assert_eq!((train.len(), val.len()), (18, 2));
        assert_eq!(val.examples.iter().filter(|e| e.label == 1).count(), 1);
    }
}

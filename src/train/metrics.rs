use crate::data::batch::{Dataset, NUM_CLASSES};
use crate::error::{Result, TuneError};
use crate::loss::criterion::Criterion;
use crate::math::matrix::Matrix;
use crate::network::model::{no_grad, Model};
use crate::train::epoch_stats::{EpochStats, SplitMetrics};

/// Binary confusion-matrix counts, class 1 being the positive class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Confusion {
    pub true_pos: usize,
    pub false_pos: usize,
    pub false_neg: usize,
    pub true_neg: usize,
}

impl Confusion {
    pub fn record(&mut self, predicted: usize, actual: usize) {
        match (predicted == 1, actual == 1) {
            (true, true) => self.true_pos += 1,
            (true, false) => self.false_pos += 1,
            (false, true) => self.false_neg += 1,
            (false, false) => self.true_neg += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.true_pos + self.false_pos + self.false_neg + self.true_neg
    }

    pub fn correct(&self) -> usize {
        self.true_pos + self.true_neg
    }

    /// TP / (TP + FN); undefined without actual positives.
    pub fn recall(&self) -> Option<f64> {
        ratio(self.true_pos, self.true_pos + self.false_neg)
    }

    /// TP / (TP + FP); undefined without predicted positives.
    pub fn precision(&self) -> Option<f64> {
        ratio(self.true_pos, self.true_pos + self.false_pos)
    }
}

fn ratio(num: usize, den: usize) -> Option<f64> {
    if den == 0 {
        None
    } else {
        Some(num as f64 / den as f64)
    }
}

/// Runs `model` over `dataset` without gradient tracking and returns
/// accuracy, mean per-batch loss, recall and precision.
///
/// Does not switch the model's mode; callers put it in evaluation mode first.
pub fn evaluate<M, C>(model: &mut M, criterion: &C, dataset: &Dataset) -> Result<SplitMetrics>
where
    M: Model + ?Sized,
    C: Criterion + ?Sized,
{
    if dataset.is_empty() {
        return Err(TuneError::EmptyDataset("cannot evaluate on zero examples".into()));
    }

    no_grad(model, |model| -> Result<SplitMetrics> {
        let mut confusion = Confusion::default();
        let mut batch_losses = Vec::new();

        for batch in dataset.batches() {
            let output = model.forward(&batch)?;
            if output.rows != batch.len() || output.cols != NUM_CLASSES {
                return Err(TuneError::malformed(format!(
                    "model returned {}x{} scores for a batch of {}",
                    output.rows, output.cols, batch.len()
                )));
            }
            for (predicted, &actual) in output.argmax_rows().into_iter().zip(&batch.labels) {
                confusion.record(predicted, actual);
            }
            let targets = Matrix::one_hot(&batch.labels, NUM_CLASSES);
            batch_losses.push(criterion.compute(&output, &targets));
        }

        Ok(SplitMetrics {
            accuracy: confusion.correct() as f64 / confusion.total() as f64,
            loss: batch_losses.iter().sum::<f64>() / batch_losses.len() as f64,
            recall: confusion.recall(),
            precision: confusion.precision(),
        })
    })
}

/// Switches `model` to evaluation mode and measures both splits.
pub fn evaluate_epoch<M, C>(
    model: &mut M,
    criterion: &C,
    train: &Dataset,
    val: &Dataset,
) -> Result<EpochStats>
where
    M: Model + ?Sized,
    C: Criterion + ?Sized,
{
    model.eval_mode();
    let train_metrics = evaluate(model, criterion, train)?;
    let val_metrics = evaluate(model, criterion, val)?;
    Ok(EpochStats::new(val_metrics, train_metrics))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confusion_quadrants() {
        let mut c = Confusion::default();
        for (p, a) in [(1, 1), (1, 0), (0, 1), (0, 0), (1, 1)] {
            c.record(p, a);
        }
        assert_eq!(c, Confusion { true_pos: 2, false_pos: 1, false_neg: 1, true_neg: 1 });
        assert_eq!(c.recall(), Some(2.0 / 3.0));
        assert_eq!(c.precision(), Some(2.0 / 3.0));
    }

    #[test]
    fn no_actual_positives_leaves_recall_undefined() {
        let mut c = Confusion::default();
        c.record(0, 0);
        c.record(1, 0);
        assert_eq!(c.recall(), None);
        assert_eq!(c.precision(), Some(0.0));
    }

    #[test]
    fn no_predicted_positives_leaves_precision_undefined() {
        let mut c = Confusion::default();
        c.record(0, 1);
        assert_eq!(c.precision(), None);
        assert_eq!(c.recall(), Some(0.0));
    }
}

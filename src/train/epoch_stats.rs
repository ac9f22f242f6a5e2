use std::fmt;

use serde::{Serialize, Deserialize};

/// Metrics of one evaluation pass over one split.
///
/// `recall` and `precision` are `None` when undefined (zero denominator);
/// they are never coerced to 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitMetrics {
    #[serde(with = "non_finite")]
    pub accuracy: f64,
    /// May be NaN or infinite when training diverges.
    #[serde(with = "non_finite")]
    pub loss: f64,
    pub recall: Option<f64>,
    pub precision: Option<f64>,
}

impl SplitMetrics {
    /// `[accuracy, loss, recall, precision]`, undefined values as NaN.
    pub fn as_array(&self) -> [f64; 4] {
        [
            self.accuracy,
            self.loss,
            self.recall.unwrap_or(f64::NAN),
            self.precision.unwrap_or(f64::NAN),
        ]
    }
}

impl fmt::Display for SplitMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "acc={:.4} loss={:.4} recall={} precision={}",
            self.accuracy,
            self.loss,
            fmt_optional(self.recall),
            fmt_optional(self.precision),
        )
    }
}

/// JSON has no NaN or infinity, so those are written as the strings
/// `"NaN"`, `"inf"` and `"-inf"`. Finite values stay plain numbers.
mod non_finite {
    use std::fmt;

    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if *value > 0.0 {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        deserializer.deserialize_any(FloatVisitor)
    }

    struct FloatVisitor;

    impl<'de> Visitor<'de> for FloatVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number or one of \"NaN\", \"inf\", \"-inf\"")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            match v {
                "NaN" => Ok(f64::NAN),
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
            }
        }
    }
}

/// Four decimals, or `n/a` for an undefined metric.
pub fn fmt_optional(value: Option<f64>) -> String {
    value.map(|v| format!("{:.4}", v)).unwrap_or_else(|| "n/a".into())
}

/// Statistics recorded after one epoch (or the epoch-0 baseline).
///
/// Immutable once appended to a [`History`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    pub val: SplitMetrics,
    pub train: SplitMetrics,
    /// Held-out test metrics; only attached to a final report entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<SplitMetrics>,
}

impl EpochStats {
    pub fn new(val: SplitMetrics, train: SplitMetrics) -> EpochStats {
        EpochStats { val, train, test: None }
    }

    pub fn val_loss(&self) -> f64 {
        self.val.loss
    }

    /// `[val_acc, val_loss, val_recall, val_precision,
    ///   train_acc, train_loss, train_recall, train_precision]`
    pub fn as_array(&self) -> [f64; 8] {
        let [va, vl, vr, vp] = self.val.as_array();
        let [ta, tl, tr, tp] = self.train.as_array();
        [va, vl, vr, vp, ta, tl, tr, tp]
    }
}

/// Append-only per-epoch statistics. Index 0 is the pre-training baseline,
/// index `i` the state after training epoch `i`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History(Vec<EpochStats>);

impl History {
    pub fn new() -> History {
        History(Vec::new())
    }

    pub fn push(&mut self, stats: EpochStats) {
        self.0.push(stats);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> &[EpochStats] {
        &self.0
    }

    pub fn get(&self, epoch: usize) -> Option<&EpochStats> {
        self.0.get(epoch)
    }

    pub fn last(&self) -> Option<&EpochStats> {
        self.0.last()
    }

    /// Epochs trained so far (the baseline does not count).
    pub fn completed_epochs(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// Epoch with the lowest validation loss among the trained epochs
    /// (entries after the baseline). Ties resolve to the earliest epoch;
    /// NaN losses never win. `None` until at least one epoch has trained.
    pub fn best_epoch(&self) -> Option<usize> {
        let trained = self.0.get(1..)?;
        let mut best: Option<(usize, f64)> = None;
        for (i, stats) in trained.iter().enumerate() {
            let loss = stats.val_loss();
            match best {
                Some((_, b)) if !(loss < b) => {}
                None if loss.is_nan() => {}
                _ => best = Some((i + 1, loss)),
            }
        }
        best.map(|(epoch, _)| epoch).or(if trained.is_empty() { None } else { Some(1) })
    }
}

impl From<Vec<EpochStats>> for History {
    fn from(entries: Vec<EpochStats>) -> Self {
        History(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(val_loss: f64) -> EpochStats {
        let m = SplitMetrics { accuracy: 0.5, loss: val_loss, recall: Some(0.5), precision: None };
        EpochStats::new(m, m)
    }

    fn history(losses: &[f64]) -> History {
        losses.iter().map(|&l| stats(l)).collect::<Vec<_>>().into()
    }

    #[test]
    fn best_epoch_ignores_baseline() {
        assert_eq!(history(&[0.1, 0.9, 0.4, 0.6]).best_epoch(), Some(2));
    }

    #[test]
    fn best_epoch_ties_go_to_earliest() {
        assert_eq!(history(&[1.0, 0.5, 0.3, 0.3, 0.7]).best_epoch(), Some(2));
    }

    #[test]
    fn best_epoch_needs_a_trained_epoch() {
        assert_eq!(history(&[0.2]).best_epoch(), None);
    }

    #[test]
    fn nan_losses_never_win() {
        assert_eq!(history(&[1.0, f64::NAN, 0.8]).best_epoch(), Some(2));
        assert_eq!(history(&[1.0, f64::NAN]).best_epoch(), Some(1));
    }

    #[test]
    fn non_finite_metrics_survive_json() {
        let m = SplitMetrics { accuracy: 0.5, loss: f64::NAN, recall: None, precision: Some(0.25) };
        let encoded = serde_json::to_string(&EpochStats::new(m, SplitMetrics { loss: f64::INFINITY, ..m })).unwrap();
        assert!(encoded.contains("\"loss\":\"NaN\""));
        assert!(!encoded.contains("\"loss\":null"));

        let decoded: EpochStats = serde_json::from_str(&encoded).unwrap();
        assert!(decoded.val.loss.is_nan());
        assert_eq!(decoded.train.loss, f64::INFINITY);
        assert_eq!(decoded.val.accuracy, 0.5);
        assert_eq!(decoded.val.precision, Some(0.25));
    }

    #[test]
    fn unknown_loss_tag_is_rejected() {
        let json = r#"{"accuracy":1,"loss":"huge","recall":null,"precision":null}"#;
        assert!(serde_json::from_str::<SplitMetrics>(json).is_err());
        let json = r#"{"accuracy":1,"loss":"-inf","recall":null,"precision":null}"#;
        assert_eq!(serde_json::from_str::<SplitMetrics>(json).unwrap().loss, f64::NEG_INFINITY);
    }

    #[test]
    fn array_order_and_undefined_values() {
        let a = stats(0.25).as_array();
        assert_eq!(a[1], 0.25);
        assert_eq!(a[2], 0.5);
        assert!(a[3].is_nan());
        assert!(a[7].is_nan());
    }
}

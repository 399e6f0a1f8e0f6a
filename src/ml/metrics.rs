//! Evaluation metrics for classification and regression models.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
/// Confusion matrix for a `K`-class classifier.
pub struct ConfusionMatrix {
    /// Number of classes.
    pub n_classes: usize,
    /// Row-major `KxK` counts (`truth * K + predicted`).
    pub counts: Vec<u32>,
}

impl ConfusionMatrix {
    /// Create an empty `KxK` confusion matrix.
    pub fn new(n_classes: usize) -> Self {
        Self {
            n_classes,
            counts: vec![0; n_classes * n_classes],
        }
    }

    /// Build a matrix from aligned truth/prediction label slices.
    pub fn from_labels(n_classes: usize, truth: &[usize], predicted: &[usize]) -> Self {
        let mut cm = Self::new(n_classes);
        for (&t, &p) in truth.iter().zip(predicted) {
            cm.add(t, p);
        }
        cm
    }

    pub fn add(&mut self, truth: usize, predicted: usize) {
        if truth >= self.n_classes || predicted >= self.n_classes {
            return;
        }
        let idx = truth * self.n_classes + predicted;
        self.counts[idx] = self.counts[idx].saturating_add(1);
    }

    pub fn get(&self, truth: usize, predicted: usize) -> u32 {
        self.counts[truth * self.n_classes + predicted]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&v| v as u64).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Precision/recall statistics for a single class.
pub struct PerClassStats {
    /// `TP / (TP + FP)`.
    pub precision: f64,
    /// `TP / (TP + FN)`.
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
    /// Total number of true examples for the class.
    pub support: u32,
}

/// Compute per-class precision, recall and F1 from a confusion matrix.
///
/// Undefined ratios (no predictions, no support) are reported as `0.0`.
pub fn precision_recall_by_class(cm: &ConfusionMatrix) -> Vec<PerClassStats> {
    let k = cm.n_classes;
    let mut stats = Vec::with_capacity(k);
    for class_idx in 0..k {
        let tp = cm.get(class_idx, class_idx) as f64;
        let mut fp = 0f64;
        let mut fn_ = 0f64;
        let mut support = 0u32;
        for j in 0..k {
            let v = cm.get(class_idx, j);
            support = support.saturating_add(v);
            if j != class_idx {
                fn_ += v as f64;
            }
        }
        for i in 0..k {
            if i != class_idx {
                fp += cm.get(i, class_idx) as f64;
            }
        }
        let precision = if tp + fp == 0.0 { 0.0 } else { tp / (tp + fp) };
        let recall = if tp + fn_ == 0.0 { 0.0 } else { tp / (tp + fn_) };
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        stats.push(PerClassStats {
            precision,
            recall,
            f1,
            support,
        });
    }
    stats
}

/// Compute overall accuracy from a confusion matrix.
pub fn accuracy(cm: &ConfusionMatrix) -> f64 {
    let total = cm.total();
    if total == 0 {
        return 0.0;
    }
    let correct: u64 = (0..cm.n_classes).map(|i| cm.get(i, i) as u64).sum();
    correct as f64 / total as f64
}

/// Scores for one row of a classification report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassScores {
    pub precision: f64,
    pub recall: f64,
    #[serde(rename = "f1-score")]
    pub f1_score: f64,
    pub support: u32,
}

/// Per-class scores plus accuracy and macro/weighted averages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    #[serde(flatten)]
    pub classes: BTreeMap<String, ClassScores>,
    pub accuracy: f64,
    #[serde(rename = "macro avg")]
    pub macro_avg: ClassScores,
    #[serde(rename = "weighted avg")]
    pub weighted_avg: ClassScores,
}

/// Build a report keyed by class name from a confusion matrix.
pub fn classification_report(cm: &ConfusionMatrix, classes: &[String]) -> ClassificationReport {
    let stats = precision_recall_by_class(cm);
    let total_support: u32 = stats.iter().map(|s| s.support).sum();
    let k = stats.len().max(1) as f64;

    let mut per_class = BTreeMap::new();
    let mut macro_sum = (0.0, 0.0, 0.0);
    let mut weighted_sum = (0.0, 0.0, 0.0);
    for (idx, s) in stats.iter().enumerate() {
        let name = classes
            .get(idx)
            .cloned()
            .unwrap_or_else(|| idx.to_string());
        per_class.insert(
            name,
            ClassScores {
                precision: s.precision,
                recall: s.recall,
                f1_score: s.f1,
                support: s.support,
            },
        );
        macro_sum.0 += s.precision;
        macro_sum.1 += s.recall;
        macro_sum.2 += s.f1;
        let w = s.support as f64;
        weighted_sum.0 += s.precision * w;
        weighted_sum.1 += s.recall * w;
        weighted_sum.2 += s.f1 * w;
    }
    let total_w = (total_support as f64).max(1.0);

    ClassificationReport {
        classes: per_class,
        accuracy: accuracy(cm),
        macro_avg: ClassScores {
            precision: macro_sum.0 / k,
            recall: macro_sum.1 / k,
            f1_score: macro_sum.2 / k,
            support: total_support,
        },
        weighted_avg: ClassScores {
            precision: weighted_sum.0 / total_w,
            recall: weighted_sum.1 / total_w,
            f1_score: weighted_sum.2 / total_w,
            support: total_support,
        },
    }
}

/// Error metrics of a regression run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Mean absolute percentage error as a fraction (`0.05` is 5%).
    pub mape: f64,
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
}

impl RegressionMetrics {
    /// Compare predictions against actual values.
    ///
    /// Percentage errors divide by `max(|actual|, f64::EPSILON)`.
    pub fn compute(actual: &[f64], predicted: &[f64]) -> Result<Self, String> {
        if actual.len() != predicted.len() {
            return Err("Mismatched actual/predicted lengths".to_string());
        }
        if actual.is_empty() {
            return Err("No values to score".to_string());
        }
        let n = actual.len() as f64;
        let mut abs_sum = 0.0;
        let mut pct_sum = 0.0;
        let mut sq_sum = 0.0;
        for (&y, &p) in actual.iter().zip(predicted) {
            let err = y - p;
            abs_sum += err.abs();
            pct_sum += err.abs() / y.abs().max(f64::EPSILON);
            sq_sum += err * err;
        }
        let mse = sq_sum / n;
        Ok(Self {
            mape: pct_sum / n,
            mae: abs_sum / n,
            mse,
            rmse: mse.sqrt(),
        })
    }
}

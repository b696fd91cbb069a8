// ============================================================
// Layer 6 — Classification Metrics
// ============================================================
// Per-epoch training metrics and the end-of-training report.
//
// Metrics recorded per epoch:
//   - train_loss:   mean cross-entropy over training batches
//   - val_loss:     mean cross-entropy over validation batches
//   - val_accuracy: fraction of validation samples predicted right
//   - lr:           learning rate used for the epoch's last batch
//
// The report mirrors sklearn's classification_report layout:
//
//                         precision    recall  f1-score   support
//            comp.graphics     0.97      0.98      0.97       389
//   soc.religion.christian     0.98      0.97      0.97       398
//
// How to read the metrics:
//   - Loss should decrease each epoch (model is learning)
//   - If val_loss increases while train_loss decreases → overfitting
//
// Nothing here is written to disk.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Metrics for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Average cross-entropy loss over all training batches
    pub train_loss: f64,

    /// Average cross-entropy loss on the validation set
    pub val_loss: f64,

    /// Range: [0.0, 1.0]
    pub val_accuracy: f64,

    pub lr: f64,
}

impl EpochMetrics {
    /// Returns true if this epoch improved over the previous best val_loss
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

impl fmt::Display for EpochMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "train_loss={:.4} | val_loss={:.4} | val_accuracy={:.2}% | lr={:.2e}",
            self.train_loss, self.val_loss, self.val_accuracy * 100.0, self.lr
        )
    }
}

/// Counts of (true class, predicted class) pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn new(num_classes: usize) -> Self {
        Self { counts: vec![vec![0; num_classes]; num_classes] }
    }

    pub fn num_classes(&self) -> usize {
        self.counts.len()
    }

    /// Out-of-range indices are ignored.
    pub fn record(&mut self, actual: usize, predicted: usize) {
        if let Some(c) = self.counts.get_mut(actual).and_then(|row| row.get_mut(predicted)) {
            *c += 1;
        }
    }

    pub fn record_all(&mut self, actual: &[usize], predicted: &[usize]) {
        for (&a, &p) in actual.iter().zip(predicted) {
            self.record(a, p);
        }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        (0..self.num_classes()).map(|i| self.counts[i][i]).sum()
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.correct(), self.total())
    }

    /// Samples whose true class is `class`
    pub fn support(&self, class: usize) -> usize {
        self.counts[class].iter().sum()
    }

    /// Samples predicted as `class`
    pub fn predicted(&self, class: usize) -> usize {
        self.counts.iter().map(|row| row[class]).sum()
    }

    pub fn precision(&self, class: usize) -> f64 {
        ratio(self.counts[class][class], self.predicted(class))
    }

    pub fn recall(&self, class: usize) -> f64 {
        ratio(self.counts[class][class], self.support(class))
    }

    pub fn f1(&self, class: usize) -> f64 {
        let (p, r) = (self.precision(class), self.recall(class));
        if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) }
    }

    pub fn rows(&self) -> &[Vec<usize>] {
        &self.counts
    }
}

// 0/0 counts as 0, like sklearn's zero_division default
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetrics {
    pub class_name: String,
    pub precision:  f64,
    pub recall:     f64,
    pub f1:         f64,
    pub support:    usize,
}

/// Per-class precision / recall / F1 plus overall accuracy.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub classes:   Vec<ClassMetrics>,
    pub accuracy:  f64,
    pub total:     usize,
    pub confusion: ConfusionMatrix,
}

impl ClassificationReport {
    pub fn new(confusion: ConfusionMatrix, class_names: &[String]) -> Self {
        let classes = class_names
            .iter()
            .enumerate()
            .take(confusion.num_classes())
            .map(|(i, name)| ClassMetrics {
                class_name: name.clone(),
                precision:  confusion.precision(i),
                recall:     confusion.recall(i),
                f1:         confusion.f1(i),
                support:    confusion.support(i),
            })
            .collect();
        Self { classes, accuracy: confusion.accuracy(), total: confusion.total(), confusion }
    }

    pub fn macro_f1(&self) -> f64 {
        if self.classes.is_empty() {
            return 0.0;
        }
        self.classes.iter().map(|c| c.f1).sum::<f64>() / self.classes.len() as f64
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.classes.iter().map(|c| c.class_name.len()).max().unwrap_or(0).max(12);

        writeln!(f, "{:>width$} {:>10} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>width$} {:>10.2} {:>9.2} {:>9.2} {:>9}",
                c.class_name, c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(f, "{:>width$} {:>10} {:>9} {:>9.2} {:>9}", "accuracy", "", "", self.accuracy, self.total)?;
        writeln!(f, "{:>width$} {:>10} {:>9} {:>9.2} {:>9}", "macro avg f1", "", "", self.macro_f1(), self.total)?;

        writeln!(f)?;
        writeln!(f, "confusion matrix (rows = actual, columns = predicted):")?;
        for row in self.confusion.rows() {
            let cells: Vec<String> = row.iter().map(|n| format!("{n:>6}")).collect();
            writeln!(f, "  {}", cells.join(""))?;
        }
        Ok(())
    }
}

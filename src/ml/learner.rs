// ============================================================
// Layer 5 — Learner (training loop)
// ============================================================
// Binds a classifier, the preprocessed train / validation splits
// and a batch size, then fine-tunes with Adam under a one-cycle
// learning-rate schedule.
//
// State machine:
//
//   Idle ──fit_onecycle──▶ Running ──▶ Completed
//                                  └──▶ Failed(error)
//
// Burn notes:
//   - Training runs on B (an AutodiffBackend) for gradients
//   - model.valid() returns the model on B::InnerBackend, with
//     dropout disabled; the validation batcher uses the same
//   - argmax(1) returns [batch,1] so we flatten before comparing
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam,
//            Smith (2018) one-cycle policy

use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::{
    batcher::ClassificationBatcher,
    dataset::{ClassificationDataset, ClassificationSample},
};
use crate::domain::error::PipelineError;
use crate::infra::metrics::{ClassificationReport, ConfusionMatrix, EpochMetrics};
use crate::ml::{
    model::TextClassifier,
    schedule::{LrScheduler, OneCycleSchedule},
};

/// Seed for the training data loader's shuffling.
pub const DEFAULT_LOADER_SEED: u64 = 42;

const ADAM_EPSILON: f32 = 1e-8;

#[derive(Debug, Clone, PartialEq)]
pub enum LearnerState {
    Idle,
    Running,
    Completed,
    Failed(PipelineError),
}

pub struct Learner<B: AutodiffBackend> {
    model:       TextClassifier<B>,
    train:       ClassificationDataset,
    val:         ClassificationDataset,
    class_names: Vec<String>,
    batch_size:  usize,
    seed:        u64,
    device:      B::Device,
    state:       LearnerState,
    history:     Vec<EpochMetrics>,
}

impl<B: AutodiffBackend> Learner<B> {
    pub fn new(
        model:      TextClassifier<B>,
        train:      ClassificationDataset,
        val:        ClassificationDataset,
        batch_size: usize,
        device:     B::Device,
    ) -> Result<Self, PipelineError> {
        if batch_size == 0 {
            return Err(PipelineError::InvalidConfig("batch_size must be positive".into()));
        }
        if train.samples().is_empty() || val.samples().is_empty() {
            return Err(PipelineError::data_unavailable(format!(
                "learner needs non-empty splits (train: {}, val: {})",
                train.samples().len(), val.samples().len()
            )));
        }
        if train.class_names() != val.class_names() {
            return Err(PipelineError::InvalidConfig(format!(
                "train and validation class names differ: {:?} vs {:?}",
                train.class_names(), val.class_names()
            )));
        }

        let class_names = train.class_names().to_vec();
        Ok(Self {
            model, train, val, class_names, batch_size,
            seed:    DEFAULT_LOADER_SEED,
            device,
            state:   LearnerState::Idle,
            history: Vec::new(),
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[cfg(test)]
    pub fn state(&self) -> &LearnerState {
        &self.state
    }

    pub fn history(&self) -> &[EpochMetrics] {
        &self.history
    }

    pub fn into_model(self) -> TextClassifier<B> {
        self.model
    }

    /// Train for `epochs` epochs with a one-cycle schedule peaking at `peak_lr`.
    ///
    /// The model and history are only replaced when every epoch succeeds.
    pub fn fit_onecycle(&mut self, peak_lr: f64, epochs: usize) -> Result<&[EpochMetrics], PipelineError> {
        self.state = LearnerState::Running;
        tracing::info!("begin training using onecycle policy with max lr of {peak_lr}...");

        match self.train_loop(peak_lr, epochs) {
            Ok((model, history)) => {
                self.model   = model;
                self.history = history;
                self.state = LearnerState::Completed;
                tracing::info!("Training complete!");
                Ok(&self.history)
            }
            Err(e) => {
                tracing::error!("Training failed: {e}");
                self.state = LearnerState::Failed(e.clone());
                Err(e)
            }
        }
    }

    /// Confusion matrix and per-class report on the validation split.
    pub fn validate(&self) -> Result<ClassificationReport, PipelineError> {
        let (_, confusion) = self.evaluate(&self.model.valid())?;
        Ok(ClassificationReport::new(confusion, &self.class_names))
    }

    fn train_loop(
        &self,
        peak_lr: f64,
        epochs:  usize,
    ) -> Result<(TextClassifier<B>, Vec<EpochMetrics>), PipelineError> {
        self.check_inputs()?;

        let mut model   = self.model.clone();
        let mut history = Vec::with_capacity(epochs);

        // ── Adam optimiser ────────────────────────────────────────────────────
        // m = β1*m + (1-β1)*g        (mean)
        // v = β2*v + (1-β2)*g²       (variance)
        // θ = θ - lr * m / (√v + ε)  (update)
        let mut optim = AdamConfig::new().with_epsilon(ADAM_EPSILON).init();
        let mut schedule = OneCycleSchedule::for_epochs(peak_lr, epochs, self.train.samples().len(), self.batch_size);
        tracing::info!("{} optimiser steps over {} epoch(s)", schedule.total_steps(), epochs);
        let mut best_val_loss = f64::INFINITY;

        // ── Training data loader (AutodiffBackend) ────────────────────────────
        let train_loader = DataLoaderBuilder::new(ClassificationBatcher::<B>::new(self.device.clone()))
            .batch_size(self.batch_size)
            .shuffle(self.seed)
            .num_workers(1)
            .build(self.train.clone());

        for epoch in 1..=epochs {
            let mut loss_sum = 0.0f64;
            let mut seen     = 0usize;
            let mut batches  = 0usize;
            let mut lr       = schedule.get_lr();

            for batch in train_loader.iter() {
                lr = schedule.get_lr();

                let output = model.forward_classification(batch);
                check_logits(&output.logits, self.class_names.len())?;

                let [batch_len] = output.targets.dims();
                let loss_val: f64 = output.loss.clone().into_scalar().elem::<f64>();
                loss_sum += loss_val * batch_len as f64;
                seen     += batch_len;
                batches  += 1;
                tracing::debug!("epoch {epoch} batch {batches}: loss={loss_val:.4} lr={lr:.3e}");

                // Backward pass + Adam update
                let grads = output.loss.backward();
                let grads = GradientsParams::from_grads(grads, &model);
                model = optim.step(lr, model, grads);
                schedule.step();
            }

            let train_loss = if seen > 0 { loss_sum / seen as f64 } else { f64::NAN };
            let (val_loss, confusion) = self.evaluate(&model.valid())?;

            let metrics = EpochMetrics {
                epoch,
                train_loss,
                val_loss,
                val_accuracy: confusion.accuracy(),
                lr,
            };
            println!("Epoch {:>3}/{} | {}", epoch, epochs, metrics);
            tracing::info!(
                epoch,
                train_loss,
                val_loss,
                val_accuracy = metrics.val_accuracy,
                "epoch finished"
            );
            if metrics.is_improvement(best_val_loss) {
                best_val_loss = metrics.val_loss;
                tracing::info!("val_loss improved to {:.4}", best_val_loss);
            }
            history.push(metrics);
        }

        Ok((model, history))
    }

    /// Per-sample mean validation loss and confusion matrix for `model`.
    fn evaluate(&self, model: &TextClassifier<B::InnerBackend>) -> Result<(f64, ConfusionMatrix), PipelineError> {
        // InnerBackend: no autodiff overhead
        let val_loader = DataLoaderBuilder::new(ClassificationBatcher::<B::InnerBackend>::new(self.device.clone()))
            .batch_size(self.batch_size)
            .num_workers(1)
            .build(self.val.clone());

        let mut loss_sum  = 0.0f64;
        let mut seen      = 0usize;
        let mut confusion = ConfusionMatrix::new(self.class_names.len());

        for batch in val_loader.iter() {
            let output = model.forward_classification(batch);
            check_logits(&output.logits, self.class_names.len())?;

            // Batch losses are means, so weight by batch length
            let [batch_len] = output.targets.dims();
            loss_sum += output.loss.into_scalar().elem::<f64>() * batch_len as f64;
            seen     += batch_len;

            // argmax(1) returns shape [batch, 1]
            let predicted = output.logits.argmax(1).flatten::<1>(0, 1);
            confusion.record_all(&to_indices(output.targets), &to_indices(predicted));
        }

        let val_loss = if seen > 0 { loss_sum / seen as f64 } else { f64::NAN };
        Ok((val_loss, confusion))
    }

    /// Checks that must pass before the first optimiser step.
    fn check_inputs(&self) -> Result<(), PipelineError> {
        let actual = self.model.num_classes();
        if actual != self.class_names.len() {
            return Err(PipelineError::ShapeMismatch { expected: self.class_names.len(), actual });
        }

        // Learner::new guarantees a first sample
        let expected = self.train.samples().first().map(|s| s.seq_len()).unwrap_or_default();
        check_lengths(self.train.samples(), expected)?;
        check_lengths(self.val.samples(), expected)?;

        if expected > self.model.max_positions() {
            return Err(PipelineError::InvalidConfig(format!(
                "sequences of {expected} tokens exceed the model's {} positions",
                self.model.max_positions()
            )));
        }
        Ok(())
    }
}

fn check_lengths(samples: &[ClassificationSample], expected: usize) -> Result<(), PipelineError> {
    for (index, s) in samples.iter().enumerate() {
        for actual in [s.input_ids.len(), s.attention_mask.len()] {
            if actual != expected {
                return Err(PipelineError::SequenceLengthMismatch { index, expected, actual });
            }
        }
    }
    Ok(())
}

/// Logits must be [batch, num_classes].
fn check_logits<B: Backend>(logits: &Tensor<B, 2>, num_classes: usize) -> Result<(), PipelineError> {
    let [_, actual] = logits.dims();
    if actual != num_classes {
        return Err(PipelineError::ShapeMismatch { expected: num_classes, actual });
    }
    Ok(())
}

fn to_indices<B: Backend>(t: Tensor<B, 1, Int>) -> Vec<usize> {
    t.into_data().iter::<i64>().map(|v| v as usize).collect()
}

use burn::{
    nn::{loss::CrossEntropyLossConfig, Dropout, DropoutConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation::{relu, softmax},
};

use crate::data::batcher::ClassificationBatch;
use crate::domain::error::PipelineError;
use crate::infra::hub::HubClient;
use crate::ml::{
    distilbert::{DistilBert, DistilBertConfig},
    weights::PretrainedWeights,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct ClassifierConfig {
    pub body:        DistilBertConfig,
    pub num_classes: usize,
}

impl ClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> TextClassifier<B> {
        let dim = self.body.dim;
        TextClassifier {
            distilbert:     self.body.init(device),
            pre_classifier: LinearConfig::new(dim, dim).init(device),
            classifier:     LinearConfig::new(dim, self.num_classes).init(device),
            dropout:        DropoutConfig::new(self.body.seq_classif_dropout).init(),
        }
    }
}

/// DistilBERT body with a sequence classification head on the [CLS] state.
#[derive(Module, Debug)]
pub struct TextClassifier<B: Backend> {
    pub distilbert:     DistilBert<B>,
    pub pre_classifier: Linear<B>,
    pub classifier:     Linear<B>,
    pub dropout:        Dropout,
}

pub struct ClassificationOutput<B: Backend> {
    pub loss:    Tensor<B, 1>,
    pub logits:  Tensor<B, 2>,
    pub targets: Tensor<B, 1, Int>,
}

impl<B: Backend> TextClassifier<B> {
    /// input_ids, attention_mask: [batch, seq_len] → logits: [batch, num_classes]
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>, attention_mask: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        let hidden = self.distilbert.forward(input_ids, attention_mask);
        let [batch_size, _, dim] = hidden.dims();

        let cls = hidden.slice([0..batch_size, 0..1, 0..dim]).reshape([batch_size, dim]);
        let pooled = self.dropout.forward(relu(self.pre_classifier.forward(cls)));
        self.classifier.forward(pooled)
    }

    /// Forward pass plus mean cross-entropy against the batch labels.
    pub fn forward_classification(&self, batch: ClassificationBatch<B>) -> ClassificationOutput<B> {
        let logits = self.forward(batch.input_ids, batch.attention_mask);
        let loss = CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), batch.labels.clone());
        ClassificationOutput { loss, logits, targets: batch.labels }
    }

    /// Class probabilities: [batch, num_classes], rows sum to 1.
    pub fn predict_proba(&self, input_ids: Tensor<B, 2, Int>, attention_mask: Tensor<B, 2, Int>) -> Tensor<B, 2> {
        softmax(self.forward(input_ids, attention_mask), 1)
    }

    pub fn num_classes(&self) -> usize {
        self.classifier.weight.val().dims()[1]
    }

    pub fn max_positions(&self) -> usize {
        self.distilbert.max_positions()
    }
}

/// Load `pretrained_id` from the Hub and put a fresh `num_classes` head on it.
///
/// The body gets the pretrained weights; the head is randomly initialised.
pub fn build_classifier<B: Backend>(
    hub:           &HubClient,
    pretrained_id: &str,
    num_classes:   usize,
    device:        &B::Device,
) -> Result<TextClassifier<B>, PipelineError> {
    if num_classes == 0 {
        return Err(PipelineError::InvalidConfig("a classifier needs at least one class".into()));
    }

    let files = hub.pretrained_files(pretrained_id)?;
    let raw = std::fs::read_to_string(&files.config).map_err(|e| {
        PipelineError::Weights(format!("cannot read '{}': {e}", files.config.display()))
    })?;
    let body = DistilBertConfig::from_hub_json(&raw)?;
    body.validate()?;

    let mut model = ClassifierConfig::new(body, num_classes).init::<B>(device);
    model.distilbert = PretrainedWeights::from_file(&files.weights)?.load_into(model.distilbert, device)?;

    tracing::info!(
        "Classifier on '{}' ready: {} classes, {} parameters",
        pretrained_id, num_classes, model.num_params()
    );
    Ok(model)
}

/// A classifier with random weights, for runs without a download.
pub fn random_classifier<B: Backend>(
    body:        DistilBertConfig,
    num_classes: usize,
    device:      &B::Device,
) -> Result<TextClassifier<B>, PipelineError> {
    if num_classes == 0 {
        return Err(PipelineError::InvalidConfig("a classifier needs at least one class".into()));
    }
    body.validate()?;
    tracing::warn!("Classifier initialised with random weights, no pretrained body loaded");
    Ok(ClassifierConfig::new(body, num_classes).init(device))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::batcher::ClassificationBatcher;
    use crate::data::dataset::ClassificationSample;
    use crate::ml::distilbert::tiny_config;
    use burn::backend::NdArray;
    use burn::data::dataloader::batcher::Batcher;

    type TestBackend = NdArray;

    fn batch(n: usize) -> ClassificationBatch<TestBackend> {
        let samples = (0..n)
            .map(|i| ClassificationSample {
                input_ids:      vec![2, 5 + i as u32, 6, 3, 0, 0],
                attention_mask: vec![1, 1, 1, 1, 0, 0],
                label:          i % 3,
            })
            .collect();
        ClassificationBatcher::<TestBackend>::new(Default::default()).batch(samples)
    }

    #[test]
    fn test_logits_shape_and_num_classes() {
        let model = ClassifierConfig::new(tiny_config(), 3).init::<TestBackend>(&Default::default());
        let b = batch(4);
        let logits = model.forward(b.input_ids, b.attention_mask);
        assert_eq!(logits.dims(), [4, 3]);
        assert_eq!(model.num_classes(), 3);
        assert_eq!(model.max_positions(), 16);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let model = ClassifierConfig::new(tiny_config(), 3).init::<TestBackend>(&Default::default());
        let b = batch(2);
        let sums: Vec<f32> = model
            .predict_proba(b.input_ids, b.attention_mask)
            .sum_dim(1)
            .into_data()
            .iter::<f32>()
            .collect();
        for s in sums {
            assert!((s - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_loss_is_finite_and_positive() {
        let model = ClassifierConfig::new(tiny_config(), 3).init::<TestBackend>(&Default::default());
        let out = model.forward_classification(batch(3));
        let loss: f64 = out.loss.into_scalar().elem();
        assert!(loss.is_finite() && loss > 0.0);
        assert_eq!(out.targets.dims(), [3]);
    }

    #[test]
    fn test_random_classifier_rejects_zero_classes() {
        let result = random_classifier::<TestBackend>(tiny_config(), 0, &Default::default());
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }
}

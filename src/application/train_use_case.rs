// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full fine-tuning pipeline in order:
//
//   Step 1: Fetch train / test splits     (Layer 4 - data)
//   Step 2: Load pretrained tokenizer     (Layer 6 - infra)
//   Step 3: Preprocess both splits        (Layer 4 - data)
//   Step 4: Build pretrained classifier   (Layer 5 - ml)
//   Step 5: Fine-tune, one-cycle policy   (Layer 5 - ml)
//   Step 6: Validation report             (Layer 5 - ml)
//   Step 7: Classify --predict texts      (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::{Context, Result};
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu},
    module::AutodiffModule,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::application::fetch_use_case::{FetchConfig, FetchUseCase};
use crate::data::preprocessor::Preprocessor;
use crate::domain::error::PipelineError;
use crate::infra::{
    hub::HubClient,
    metrics::{ClassificationReport, EpochMetrics},
    tokenizer_store::TokenizerStore,
};
use crate::ml::{
    learner::Learner,
    distilbert::DistilBertConfig,
    model::{build_classifier, random_classifier, TextClassifier},
    predictor::{Prediction, Predictor},
};

pub const DEFAULT_MODEL: &str = "distilbert-base-uncased";

/// Which burn backend to train on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    #[default]
    Wgpu,
    Cpu,
}

// ─── Training Configuration ──────────────────────────────────────────────────
// Default is the reference run: two classes, max_len 64, batch 8,
// peak lr 8e-5, two epochs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    #[serde(flatten)]
    pub data:       FetchConfig,
    pub model_id:   String,
    pub max_len:    usize,
    pub batch_size: usize,
    pub lr:         f64,
    pub epochs:     usize,
    pub device:     DeviceKind,
    /// Skip the pretrained weights and start from a random body
    #[serde(default)]
    pub random_init: bool,
    /// Texts to classify once training is done
    pub predict:    Vec<String>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data:       FetchConfig::default(),
            model_id:   DEFAULT_MODEL.to_string(),
            max_len:    64,
            batch_size: 8,
            lr:         8e-5,
            epochs:     2,
            device:     DeviceKind::default(),
            random_init: false,
            predict:    Vec::new(),
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.data.categories.is_empty() {
            return Err(PipelineError::InvalidConfig("at least one category is required".into()));
        }
        if self.batch_size == 0 {
            return Err(PipelineError::InvalidConfig("batch_size must be positive".into()));
        }
        if self.epochs == 0 {
            return Err(PipelineError::InvalidConfig("epochs must be positive".into()));
        }
        if !(self.lr.is_finite() && self.lr > 0.0) {
            return Err(PipelineError::InvalidConfig(format!("lr must be a positive number, got {}", self.lr)));
        }
        Ok(())
    }
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub history:     Vec<EpochMetrics>,
    pub report:      ClassificationReport,
    pub predictions: Vec<(String, Prediction)>,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full pipeline on the configured backend
    pub fn execute(&self) -> Result<TrainOutcome> {
        self.config.validate()?;

        match self.config.device {
            DeviceKind::Wgpu => {
                let device = WgpuDevice::default();
                tracing::info!("Using WGPU device: {:?}", device);
                run::<Autodiff<Wgpu>>(&self.config, device)
            }
            DeviceKind::Cpu => {
                tracing::info!("Using NdArray CPU backend");
                run::<Autodiff<NdArray>>(&self.config, NdArrayDevice::Cpu)
            }
        }
    }
}

fn run<B: AutodiffBackend>(cfg: &TrainConfig, device: B::Device) -> Result<TrainOutcome> {
    let hub = HubClient::new(cfg.data.cache_dir.as_deref())?;

    // ── Step 1: Fetch both splits ────────────────────────────────────────────
    let (train, test) = FetchUseCase::new(cfg.data.clone()).fetch(&hub)?;

    // ── Step 2: Tokenizer of the pretrained model ────────────────────────────
    let tokenizer = TokenizerStore::new(&hub)
        .load_pretrained(&cfg.model_id)
        .with_context(|| format!("Failed to load the tokenizer of '{}'", cfg.model_id))?;

    // ── Step 3: Preprocess ────────────────────────────────────────────────────
    // The class-name order of the train split fixes the label mapping
    let vocab_size = tokenizer.get_vocab_size(true);
    let preprocessor = Preprocessor::new(&cfg.model_id, cfg.max_len, train.class_names.clone(), tokenizer)?;
    let train_dataset = preprocessor.preprocess_train(&train.examples)?;
    let val_dataset   = preprocessor.preprocess_test(&test.examples)?;

    // ── Step 4: Pretrained body + fresh head ─────────────────────────────────
    let model = initial_model::<B>(cfg, &hub, vocab_size, preprocessor.num_classes(), &device)?;
    if cfg.max_len > model.max_positions() {
        return Err(PipelineError::InvalidConfig(format!(
            "max_len {} exceeds the {} positions '{}' supports",
            cfg.max_len, model.max_positions(), cfg.model_id
        ))
        .into());
    }

    // ── Step 5: Fine-tune ─────────────────────────────────────────────────────
    let mut learner = Learner::new(model, train_dataset, val_dataset, cfg.batch_size, device.clone())?
        .with_seed(cfg.data.seed);
    learner.fit_onecycle(cfg.lr, cfg.epochs).context("Fine-tuning failed")?;
    let history = learner.history().to_vec();

    // ── Step 6: Validation report ─────────────────────────────────────────────
    let report = learner.validate()?;
    tracing::info!("Validation accuracy {:.4}, macro F1 {:.4}", report.accuracy, report.macro_f1());

    // ── Step 7: Predictions ──────────────────────────────────────────────────
    // valid() drops autodiff so dropout is off at inference
    let predictor = Predictor::new(learner.into_model().valid(), &preprocessor, device)?;
    let predictions = cfg
        .predict
        .iter()
        .map(|text| predictor.predict(text).map(|p| (text.clone(), p)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TrainOutcome { history, report, predictions })
}

fn initial_model<B: AutodiffBackend>(
    cfg:         &TrainConfig,
    hub:         &HubClient,
    vocab_size:  usize,
    num_classes: usize,
    device:      &B::Device,
) -> Result<TextClassifier<B>> {
    if cfg.random_init {
        // Body shape of distilbert-base, sized to the tokenizer's vocabulary
        let body = DistilBertConfig::new().with_vocab_size(vocab_size);
        return Ok(random_classifier::<B>(body, num_classes, device)?);
    }
    build_classifier::<B>(hub, &cfg.model_id, num_classes, device)
        .with_context(|| format!("Failed to build a classifier from '{}'", cfg.model_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_reference_run() {
        let cfg = TrainConfig::default();
        assert_eq!(cfg.data.categories, vec!["comp.graphics", "soc.religion.christian"]);
        assert_eq!(cfg.model_id, "distilbert-base-uncased");
        assert_eq!((cfg.max_len, cfg.batch_size, cfg.epochs), (64, 8, 2));
        assert_eq!(cfg.lr, 8e-5);
        assert_eq!(cfg.data.seed, 42);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_degenerate_values() {
        let zero_batch = TrainConfig { batch_size: 0, ..TrainConfig::default() };
        assert!(matches!(zero_batch.validate(), Err(PipelineError::InvalidConfig(_))));

        let bad_lr = TrainConfig { lr: f64::NAN, ..TrainConfig::default() };
        assert!(bad_lr.validate().is_err());

        let mut no_classes = TrainConfig::default();
        no_classes.data.categories.clear();
        assert!(no_classes.validate().is_err());
    }

    #[test]
    fn test_config_json_is_flat() {
        let json = serde_json::to_value(TrainConfig::default()).unwrap();
        assert_eq!(json["seed"], 42);
        assert_eq!(json["device"], "wgpu");
        assert_eq!(json["model_id"], "distilbert-base-uncased");
        assert_eq!(json["random_init"], false);
    }

    #[test]
    fn test_random_init_builds_without_weights() {
        let cfg = TrainConfig { random_init: true, ..TrainConfig::default() };
        // Never contacted: the random path reads nothing from the Hub
        let hub = HubClient::new(Some(std::env::temp_dir().as_path())).unwrap();
        let model = initial_model::<Autodiff<NdArray>>(&cfg, &hub, 24, 2, &NdArrayDevice::Cpu).unwrap();

        assert_eq!(model.num_classes(), 2);
        assert_eq!(model.max_positions(), 512);
        let [vocab, _] = model.distilbert.embeddings.word_embeddings.weight.val().dims();
        assert_eq!(vocab, 24);
    }

    /// Full reference run: downloads the corpus and distilbert-base-uncased.
    #[test]
    #[ignore = "needs network access to the HuggingFace Hub"]
    fn test_reference_run_beats_chance() {
        let cfg = TrainConfig { device: DeviceKind::Cpu, ..TrainConfig::default() };
        let outcome = TrainUseCase::new(cfg).execute().unwrap();

        assert_eq!(outcome.history.len(), 2);
        assert!(outcome.history[1].val_accuracy > 0.5);
        assert!(outcome.report.accuracy > 0.5);
    }
}

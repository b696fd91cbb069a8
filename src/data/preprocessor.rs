// ============================================================
// Layer 4 — Transformer Preprocessor
// ============================================================
// Turns labelled examples into fixed-length token sequences for a
// named pretrained model:
//
//   text ──▶ WordPiece tokens ──▶ [CLS] … [SEP] ──▶ truncate ──▶ pad
//
// Every output sequence has exactly `max_len` ids. The attention
// mask marks real tokens with 1 and padding with 0.
//
// The class-name list is fixed when the preprocessor is built.
// Train and test data are both checked against it, so label 1
// means the same class in both splits.
//
// Reference: Devlin et al. (2019) BERT input format
//            tokenizers crate documentation

use tokenizers::{Tokenizer, TruncationParams};

use crate::data::dataset::{ClassificationDataset, ClassificationSample};
use crate::domain::error::PipelineError;
use crate::domain::example::Example;

/// Token used to fill sequences up to `max_len`.
pub const PAD_TOKEN: &str = "[PAD]";

pub struct Preprocessor {
    model_id:    String,
    max_len:     usize,
    class_names: Vec<String>,
    tokenizer:   Tokenizer,
    pad_id:      u32,
}

impl Preprocessor {
    /// Build a preprocessor around the pretrained model's tokenizer.
    ///
    /// The tokenizer is reconfigured to truncate at `max_len` (special
    /// tokens included); padding is applied here, not by the tokenizer.
    pub fn new(
        model_id:    impl Into<String>,
        max_len:     usize,
        class_names: Vec<String>,
        mut tokenizer: Tokenizer,
    ) -> Result<Self, PipelineError> {
        if max_len < 2 {
            return Err(PipelineError::InvalidConfig(format!(
                "max_len must leave room for [CLS] and [SEP], got {max_len}"
            )));
        }
        if class_names.is_empty() {
            return Err(PipelineError::InvalidConfig("at least one class name is required".into()));
        }

        let pad_id = tokenizer.token_to_id(PAD_TOKEN).unwrap_or(0);

        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(Some(TruncationParams { max_length: max_len, ..Default::default() }))
            .map_err(|e| PipelineError::Tokenizer(e.to_string()))?;

        Ok(Self { model_id: model_id.into(), max_len, class_names, tokenizer, pad_id })
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    pub fn num_classes(&self) -> usize {
        self.class_names.len()
    }

    /// Preprocess the training split, logging what the data looks like.
    pub fn preprocess_train(&self, examples: &[Example]) -> Result<ClassificationDataset, PipelineError> {
        tracing::info!("Preprocessing {} train examples for '{}'", examples.len(), self.model_id);
        tracing::info!("Is multi-label? false");

        let texts: Vec<&str> = examples.iter().map(|e| e.text.as_str()).collect();
        if let Some(stats) = SequenceStats::from_texts(&texts) {
            tracing::info!(
                "Train sequence lengths (words): mean={:.0}, 95th={:.0}, 99th={:.0}, max={}",
                stats.mean, stats.p95, stats.p99, stats.max
            );
        }
        tracing::info!("Class names: {:?}", self.class_names);

        self.preprocess(examples)
    }

    /// Preprocess the validation split with the class names fixed at construction.
    pub fn preprocess_test(&self, examples: &[Example]) -> Result<ClassificationDataset, PipelineError> {
        tracing::info!("Preprocessing {} test examples for '{}'", examples.len(), self.model_id);
        self.preprocess(examples)
    }

    /// Tokenize, truncate and pad every example. One sample per example,
    /// in the same order.
    pub fn preprocess(&self, examples: &[Example]) -> Result<ClassificationDataset, PipelineError> {
        // Fail on a bad label before spending time tokenizing
        for e in examples {
            self.check_label(e.label)?;
        }

        let samples = examples
            .iter()
            .map(|e| {
                let (input_ids, attention_mask) = self.encode(&e.text)?;
                Ok(ClassificationSample { input_ids, attention_mask, label: e.label })
            })
            .collect::<Result<Vec<_>, PipelineError>>()?;

        Ok(ClassificationDataset::new(samples, self.class_names.clone()))
    }

    /// Encode one text into `(input_ids, attention_mask)`, both `max_len` long.
    pub fn encode(&self, text: &str) -> Result<(Vec<u32>, Vec<u32>), PipelineError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| PipelineError::Tokenizer(e.to_string()))?;

        let mut input_ids = encoding.get_ids().to_vec();
        input_ids.truncate(self.max_len);

        let mut attention_mask = vec![1u32; input_ids.len()];
        input_ids.resize(self.max_len, self.pad_id);
        attention_mask.resize(self.max_len, 0);

        Ok((input_ids, attention_mask))
    }

    fn check_label(&self, label: usize) -> Result<(), PipelineError> {
        if label >= self.class_names.len() {
            return Err(PipelineError::UnknownLabel { label, num_classes: self.class_names.len() });
        }
        Ok(())
    }
}

// ─── Sequence statistics ──────────────────────────────────────────────────────
/// Whitespace word counts of raw texts, before any truncation.
/// Useful for judging whether `max_len` cuts off most documents.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceStats {
    pub mean: f64,
    pub p95:  f64,
    pub p99:  f64,
    pub max:  usize,
}

impl SequenceStats {
    /// `None` for an empty input
    pub fn from_texts(texts: &[&str]) -> Option<Self> {
        let mut lengths: Vec<usize> = texts.iter().map(|t| t.split_whitespace().count()).collect();
        if lengths.is_empty() {
            return None;
        }
        lengths.sort_unstable();

        let mean = lengths.iter().sum::<usize>() as f64 / lengths.len() as f64;
        Some(Self {
            mean,
            p95: percentile(&lengths, 95.0),
            p99: percentile(&lengths, 99.0),
            max: lengths[lengths.len() - 1],
        })
    }
}

/// Linear-interpolated percentile of a sorted, non-empty slice.
fn percentile(sorted: &[usize], pct: f64) -> f64 {
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lo   = rank.floor() as usize;
    let hi   = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] as f64 + (sorted[hi] as f64 - sorted[lo] as f64) * frac
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::tokenizer_store::tiny_wordpiece;
    use burn::data::dataset::Dataset;

    fn classes() -> Vec<String> {
        vec!["comp.graphics".to_string(), "soc.religion.christian".to_string()]
    }

    fn preprocessor(max_len: usize) -> Preprocessor {
        Preprocessor::new("tiny-bert", max_len, classes(), tiny_wordpiece()).unwrap()
    }

    fn examples() -> Vec<Example> {
        vec![
            Example::new("the pixel shader renders polygons", 0),
            Example::new("church prayer", 1),
            Example::new("", 1),
            Example::new("pixel pixel pixel pixel pixel pixel pixel pixel pixel pixel pixel pixel", 0),
        ]
    }

    #[test]
    fn test_no_example_dropped() {
        let p   = preprocessor(8);
        let out = p.preprocess(&examples()).unwrap();
        assert_eq!(out.len(), examples().len());
    }

    #[test]
    fn test_every_sequence_is_max_len() {
        let p   = preprocessor(8);
        let out = p.preprocess(&examples()).unwrap();
        for s in out.samples() {
            assert_eq!(s.input_ids.len(), 8);
            assert_eq!(s.attention_mask.len(), 8);
        }
    }

    #[test]
    fn test_special_tokens_and_padding() {
        let p = preprocessor(8);
        let (ids, mask) = p.encode("church prayer").unwrap();
        let cls = p.tokenizer.token_to_id("[CLS]").unwrap();
        let sep = p.tokenizer.token_to_id("[SEP]").unwrap();
        let pad = p.tokenizer.token_to_id(PAD_TOKEN).unwrap();

        assert_eq!(ids[0], cls);
        assert_eq!(ids[3], sep);
        assert_eq!(&ids[4..], &[pad; 4]);
        assert_eq!(mask, vec![1, 1, 1, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn test_truncation_keeps_sep() {
        let p = preprocessor(6);
        let (ids, mask) = p.encode("pixel pixel pixel pixel pixel pixel pixel pixel").unwrap();
        assert_eq!(ids.len(), 6);
        assert_eq!(ids[5], p.tokenizer.token_to_id("[SEP]").unwrap());
        assert!(mask.iter().all(|&m| m == 1));
    }

    #[test]
    fn test_labels_are_kept() {
        let p   = preprocessor(8);
        let out = p.preprocess(&examples()).unwrap();
        let labels: Vec<usize> = out.samples().iter().map(|s| s.label).collect();
        assert_eq!(labels, vec![0, 1, 1, 0]);
    }

    #[test]
    fn test_train_and_test_share_label_mapping() {
        let p     = preprocessor(8);
        let train = p.preprocess_train(&examples()).unwrap();
        let test  = p.preprocess_test(&[Example::new("prayer", 1)]).unwrap();
        assert_eq!(train.class_names(), test.class_names());
        assert_eq!(test.get(0).unwrap().label, 1);
    }

    #[test]
    fn test_label_out_of_range_is_unknown_label() {
        let p   = preprocessor(8);
        let err = p.preprocess(&[Example::new("pixel", 0), Example::new("pixel", 2)]).unwrap_err();
        assert_eq!(err, PipelineError::UnknownLabel { label: 2, num_classes: 2 });
    }

    #[test]
    fn test_rejects_degenerate_config() {
        assert!(matches!(
            Preprocessor::new("m", 1, classes(), tiny_wordpiece()),
            Err(PipelineError::InvalidConfig(_))
        ));
        assert!(matches!(
            Preprocessor::new("m", 8, Vec::new(), tiny_wordpiece()),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_sequence_stats() {
        let stats = SequenceStats::from_texts(&["a b", "a b c d", "a", "a b c"]).unwrap();
        assert_eq!(stats.mean, 2.5);
        assert_eq!(stats.max, 4);
        // sorted [1,2,3,4]: rank 0.95*3 = 2.85 → 3 + 0.85
        assert!((stats.p95 - 3.85).abs() < 1e-9);
        assert!(SequenceStats::from_texts(&[]).is_none());
    }
}

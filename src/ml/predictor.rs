// ============================================================
// Layer 5 — Predictor
// ============================================================
// Classifies raw texts with a trained model. Texts go through the
// same Preprocessor used for training, so truncation, padding and
// the class-name order are identical.
use burn::prelude::*;

use crate::data::preprocessor::Preprocessor;
use crate::domain::error::PipelineError;
use crate::ml::model::TextClassifier;

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub class_name:  String,
    pub label:       usize,
    pub probability: f32,
}

pub struct Predictor<'a, B: Backend> {
    model:        TextClassifier<B>,
    preprocessor: &'a Preprocessor,
    device:       B::Device,
}

impl<'a, B: Backend> Predictor<'a, B> {
    /// Pass a model without autodiff (e.g. `model.valid()`) so dropout is off.
    pub fn new(model: TextClassifier<B>, preprocessor: &'a Preprocessor, device: B::Device) -> Result<Self, PipelineError> {
        let actual = model.num_classes();
        if actual != preprocessor.num_classes() {
            return Err(PipelineError::ShapeMismatch { expected: preprocessor.num_classes(), actual });
        }
        Ok(Self { model, preprocessor, device })
    }

    /// One probability row per text, columns ordered like the class names.
    pub fn predict_proba(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, PipelineError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let max_len = self.preprocessor.max_len();
        let mut ids  = Vec::with_capacity(texts.len() * max_len);
        let mut mask = Vec::with_capacity(texts.len() * max_len);
        for text in texts {
            let (i, m) = self.preprocessor.encode(text)?;
            ids.extend(i.into_iter().map(|x| x as i64));
            mask.extend(m.into_iter().map(|x| x as i64));
        }

        let shape = [texts.len(), max_len];
        let input_ids      = Tensor::<B, 2, Int>::from_data(TensorData::new(ids, shape), &self.device);
        let attention_mask = Tensor::<B, 2, Int>::from_data(TensorData::new(mask, shape), &self.device);

        let probs: Vec<f32> = self
            .model
            .predict_proba(input_ids, attention_mask)
            .into_data()
            .iter::<f32>()
            .collect();

        Ok(probs.chunks(self.preprocessor.num_classes()).map(<[f32]>::to_vec).collect())
    }

    /// Most likely class of `text` and its probability.
    pub fn predict(&self, text: &str) -> Result<Prediction, PipelineError> {
        let probs = self.predict_proba(&[text])?.into_iter().next().unwrap_or_default();
        let (label, probability) = probs
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .ok_or(PipelineError::ShapeMismatch { expected: self.preprocessor.num_classes(), actual: 0 })?;

        let class_name = self.preprocessor.class_names()[label].clone();
        tracing::debug!("'{}' → {} ({:.3})", text, class_name, probability);
        Ok(Prediction { class_name, label, probability })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::tokenizer_store::tiny_wordpiece;
    use crate::ml::{distilbert::tiny_config, model::ClassifierConfig};
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn preprocessor() -> Preprocessor {
        let classes = vec!["comp.graphics".to_string(), "soc.religion.christian".to_string()];
        Preprocessor::new("tiny-bert", 8, classes, tiny_wordpiece()).unwrap()
    }

    #[test]
    fn test_probabilities_per_text() {
        let pre = preprocessor();
        let model = ClassifierConfig::new(tiny_config(), 2).init::<TestBackend>(&Default::default());
        let predictor = Predictor::new(model, &pre, Default::default()).unwrap();

        let rows = predictor.predict_proba(&["the pixel shader", "church prayer faith", ""]).unwrap();
        assert_eq!(rows.len(), 3);
        for row in rows {
            assert_eq!(row.len(), 2);
            assert!((row.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        }
        assert!(predictor.predict_proba(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_predict_picks_a_known_class() {
        let pre = preprocessor();
        let model = ClassifierConfig::new(tiny_config(), 2).init::<TestBackend>(&Default::default());
        let predictor = Predictor::new(model, &pre, Default::default()).unwrap();

        let p = predictor.predict("render polygons").unwrap();
        assert_eq!(p.class_name, pre.class_names()[p.label]);
        assert!(p.probability >= 0.5);
    }

    #[test]
    fn test_head_width_must_match_classes() {
        let pre = preprocessor();
        let model = ClassifierConfig::new(tiny_config(), 3).init::<TestBackend>(&Default::default());
        let result = Predictor::new(model, &pre, Default::default());
        assert!(matches!(result, Err(PipelineError::ShapeMismatch { expected: 2, actual: 3 })));
    }
}

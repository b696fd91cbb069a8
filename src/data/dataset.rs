use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One tokenised and padded classification sample.
/// Sequence format: [CLS] text [SEP] [PAD]...
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationSample {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub label:          usize,
}

impl ClassificationSample {
    pub fn seq_len(&self) -> usize {
        self.input_ids.len()
    }

    /// Number of non-padding tokens
    #[cfg(test)]
    pub fn real_tokens(&self) -> usize {
        self.attention_mask.iter().filter(|&&m| m == 1).count()
    }
}

/// Preprocessed split: samples plus the class names their labels index.
#[derive(Debug, Clone)]
pub struct ClassificationDataset {
    samples:     Vec<ClassificationSample>,
    class_names: Vec<String>,
}

impl ClassificationDataset {
    pub fn new(samples: Vec<ClassificationSample>, class_names: Vec<String>) -> Self {
        Self { samples, class_names }
    }

    pub fn samples(&self) -> &[ClassificationSample] {
        &self.samples
    }

    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    pub fn num_classes(&self) -> usize {
        self.class_names.len()
    }
}

impl Dataset<ClassificationSample> for ClassificationDataset {
    fn get(&self, index: usize) -> Option<ClassificationSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_access() {
        let sample = ClassificationSample {
            input_ids:      vec![2, 7, 3, 0],
            attention_mask: vec![1, 1, 1, 0],
            label:          1,
        };
        let ds = ClassificationDataset::new(vec![sample.clone()], vec!["a".into(), "b".into()]);
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.get(0), Some(sample));
        assert_eq!(ds.get(1), None);
        assert_eq!(ds.num_classes(), 2);
        assert_eq!(ds.samples()[0].real_tokens(), 3);
        assert_eq!(ds.samples()[0].seq_len(), 4);
    }
}

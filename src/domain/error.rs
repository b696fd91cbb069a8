// ============================================================
// Layer 3 — Pipeline Errors
// ============================================================
// Every stage of the pipeline fails with one of these variants.
// Nothing recovers locally: errors bubble up to the CLI where
// anyhow adds context and the process exits nonzero.
//
// Reference: Rust Book §9 (Error Handling), thiserror docs

use thiserror::Error;

/// Errors raised by data acquisition, preprocessing and training.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// The corpus could not be fetched or a class name is not part of it.
    #[error("Dataset unavailable: {reason}")]
    DataUnavailable {
        reason: String,
    },

    /// An example carries a label outside the configured class names.
    #[error("Unknown label {label}: only {num_classes} class name(s) are configured")]
    UnknownLabel {
        label:       usize,
        num_classes: usize,
    },

    /// The classifier's output width does not match the class count.
    #[error("Model output shape mismatch: expected {expected} classes, got {actual}")]
    ShapeMismatch {
        expected: usize,
        actual:   usize,
    },

    /// A sample's token sequence length differs from its batch mates.
    #[error("Sequence length mismatch at sample {index}: expected {expected}, got {actual}")]
    SequenceLengthMismatch {
        index:    usize,
        expected: usize,
        actual:   usize,
    },

    /// The tokenizer could not be loaded or failed to encode.
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Pretrained weights could not be read or did not fit the model.
    #[error("Weight import error: {0}")]
    Weights(String),

    /// The configuration is internally inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PipelineError {
    pub fn data_unavailable(reason: impl Into<String>) -> Self {
        Self::DataUnavailable { reason: reason.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_values() {
        let e = PipelineError::UnknownLabel { label: 2, num_classes: 2 };
        assert_eq!(e.to_string(), "Unknown label 2: only 2 class name(s) are configured");

        let e = PipelineError::data_unavailable("no such category 'sci.bogus'");
        assert!(e.to_string().contains("sci.bogus"));
    }
}

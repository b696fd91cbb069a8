// ============================================================
// Layer 3 — Example / Split Domain Types
// ============================================================
// An Example is one labelled text: the raw newsgroup post and
// the integer index of its category.
//
// The label is an index into an ordered list of class names.
// That list travels with the examples in a LabeledSplit so the
// meaning of `label = 1` is never ambiguous downstream.
//
// Reference: Rust Book §5 (Structs and Methods)

use serde::{Deserialize, Serialize};
use std::fmt;

/// One labelled text example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    /// The raw document text
    pub text: String,

    /// Index into the class-name list of the split this example came from
    pub label: usize,
}

impl Example {
    pub fn new(text: impl Into<String>, label: usize) -> Self {
        Self { text: text.into(), label }
    }
}

/// Which half of the corpus to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    /// Short name used in file names and log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test  => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered sequence of examples plus the class names their
/// labels index into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSplit {
    pub split:       Split,
    pub examples:    Vec<Example>,
    pub class_names: Vec<String>,
}

impl LabeledSplit {
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Borrow the texts in order
    pub fn texts(&self) -> Vec<&str> {
        self.examples.iter().map(|e| e.text.as_str()).collect()
    }

    /// Labels in order
    #[cfg(test)]
    pub fn labels(&self) -> Vec<usize> {
        self.examples.iter().map(|e| e.label).collect()
    }

    /// Number of examples per class, indexed like `class_names`
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.class_names.len()];
        for e in &self.examples {
            if let Some(c) = counts.get_mut(e.label) {
                *c += 1;
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_counts() {
        let split = LabeledSplit {
            split:       Split::Train,
            examples:    vec![Example::new("a", 0), Example::new("b", 1), Example::new("c", 1)],
            class_names: vec!["x".into(), "y".into()],
        };
        assert_eq!(split.class_counts(), vec![1, 2]);
        assert_eq!(split.labels(), vec![0, 1, 1]);
        assert_eq!(split.texts(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_split_names() {
        assert_eq!(Split::Train.to_string(), "train");
        assert_eq!(Split::Test.as_str(), "test");
    }
}

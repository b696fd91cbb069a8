// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer programs against CorpusSource, not a
// concrete loader. Two implementations exist:
//   - HubCorpus       → JSONL files from the HuggingFace Hub
//   - BydateDirCorpus → an extracted 20news-bydate directory
// Tests provide their own in-memory source.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use crate::domain::error::PipelineError;
use crate::domain::example::Split;

/// One raw corpus record: (category name, document text).
pub type RawRecord = (String, String);

/// Anything that can hand out the raw newsgroup corpus.
pub trait CorpusSource {
    /// Every category the corpus knows about.
    fn category_names(&self) -> Result<Vec<String>, PipelineError>;

    /// All records of one split, in the source's stable order.
    fn records(&self, split: Split) -> Result<Vec<RawRecord>, PipelineError>;
}

// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from the raw corpus to tensor batches:
//
//   CorpusSource (Hub JSONL or local bydate tree)
//       │
//       ▼
//   fetch_subset    → keep two categories, label, clean, shuffle
//       │
//       ▼
//   Preprocessor    → WordPiece ids, truncate / pad to max_len
//       │
//       ▼
//   ClassificationDataset → Burn's Dataset trait
//       │
//       ▼
//   ClassificationBatcher → tensor batches for the DataLoader
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads an extracted 20news-bydate directory tree
pub mod loader;

/// Category filtering, labelling and seeded shuffling; Hub corpus
pub mod newsgroups;

/// Optional header / footer / quote stripping
pub mod cleaner;

/// Tokenisation to fixed-length sequences
pub mod preprocessor;

/// Implements Burn's Dataset trait for classification samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

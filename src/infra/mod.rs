// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns that don't belong in any one business
// layer:
//
//   hub.rs             — HuggingFace Hub downloads
//                        Model files (config, tokenizer, weights)
//                        and the 20 Newsgroups JSONL splits, cached
//                        locally by hf-hub.
//
//   tokenizer_store.rs — Loads the pretrained model's tokenizer
//                        unchanged, so ids line up with the
//                        embedding matrix.
//
//   metrics.rs         — Per-epoch metrics, confusion matrix and
//                        the per-class classification report.
//
// Reference: Rust Book §7 (Modules)
//            hf-hub and tokenizers crate documentation

/// HuggingFace Hub client
pub mod hub;

/// Pretrained tokenizer loading
pub mod tokenizer_store;

/// Epoch metrics and classification report
pub mod metrics;

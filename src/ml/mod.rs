// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Everything that touches burn modules, tensors and optimisers.
//
//   distilbert.rs — The DistilBERT encoder body
//                   • Token + learned position embeddings
//                   • Multi-head self-attention with padding mask
//                   • GELU feed-forward, post-layer-norm residuals
//
//   weights.rs    — Imports a HuggingFace model.safetensors into
//                   the body (transposing Linear weights)
//
//   model.rs      — Classification head on the [CLS] state and
//                   build_classifier (pretrained body + fresh head)
//
//   schedule.rs   — One-cycle learning-rate policy
//
//   learner.rs    — Fine-tuning loop: Adam, per-batch schedule,
//                   per-epoch validation, final report
//
//   predictor.rs  — Classifies raw texts with the trained model
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Sanh et al. (2019) DistilBERT
//            Smith (2018) A disciplined approach to neural
//            network hyper-parameters

/// DistilBERT transformer encoder
pub mod distilbert;

/// Pretrained weight import from safetensors
pub mod weights;

/// Sequence classifier and its constructors
pub mod model;

/// Learning-rate schedules
pub mod schedule;

/// Training loop with validation
pub mod learner;

/// Inference on raw text
pub mod predictor;

// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing the core
// concepts of the pipeline: labelled examples, corpus splits,
// the error taxonomy and the corpus source abstraction.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Labelled examples and corpus splits
pub mod example;

// The pipeline error taxonomy
pub mod error;

// Core abstractions (traits) that other layers implement
pub mod traits;

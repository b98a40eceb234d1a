// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits that define the core
// concepts of the system: labeled lines, scored lines, the
// decision rule, and the seams the other layers implement.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits

// A labeled training line and the merged corpus
pub mod labeled_line;

// A scored line, the fixed decision rule, per-line failures
pub mod verdict;

// Core abstractions that other layers implement
pub mod traits;

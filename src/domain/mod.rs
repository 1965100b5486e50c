// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that name the core concepts of the system:
// a labelled message, its binary label, and the traits other
// layers implement (where data comes from, what classifies it).
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A message text with its spam / not-spam label
pub mod sample;

// Core abstractions (traits) that other layers implement
pub mod traits;

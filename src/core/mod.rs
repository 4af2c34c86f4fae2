//! Core deterministic primitives.
//!
//! Seeded randomness and state fingerprints. Same inputs, same outputs, on
//! every platform.

pub mod rng;
pub mod hash;

// Re-export core types
pub use rng::DeterministicRng;
pub use hash::{compute_state_hash, StateHash};

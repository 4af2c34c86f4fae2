//! # Gem Court Server
//!
//! Rules core, computer opponents and session registry for Gem Court, a
//! four-seat card-and-token trading game.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    GEM COURT SERVER                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── hash.rs     - State fingerprints for snapshots          │
//! │                                                              │
//! │  game/           - Rules (deterministic)                     │
//! │  ├── stones.rs   - Token colors and counts                   │
//! │  ├── card.rs     - Card and noble catalog                    │
//! │  ├── player.rs   - Inventories, purchases, reservations      │
//! │  ├── state.rs    - Board, pool, turn order, win check        │
//! │  ├── moves.rs    - Legal move enumeration                    │
//! │  ├── apply.rs    - Whole-move validation and application     │
//! │  ├── turn.rs     - Step-by-step human turns                  │
//! │  ├── heuristics.rs - Move scoring for the AI tiers           │
//! │  └── ai.rs       - Easy / Medium / Hard decisions            │
//! │                                                              │
//! │  network/        - Sessions (non-deterministic)              │
//! │  ├── session.rs  - Session registry and lifecycle            │
//! │  ├── server.rs   - Message routing and broadcast             │
//! │  ├── protocol.rs - Message types                             │
//! │  ├── directory.rs- User directory and statistics seams       │
//! │  └── client.rs   - Join wait and AI participant loop         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are deterministic:
//! - No floating-point arithmetic in rules or AI scoring
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies outside chat timestamps
//! - All randomness from seeded Xorshift128+
//!
//! Given the same seed and the same moves, every table deals and plays out
//! identically on any platform.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use core::rng::DeterministicRng;
pub use game::{apply_move, decide_move, GameError, GameState, Move, MoveKind, PlayerState, StoneMap, StoneType};
pub use network::{GameServer, SessionRegistry};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Seats at every table.
pub const PLAYER_COUNT: usize = game::state::PLAYER_COUNT;

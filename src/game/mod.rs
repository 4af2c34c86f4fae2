//! Game Logic Module
//!
//! The rules core. Deterministic given a seed.
//!
//! ## Module Structure
//!
//! - `stones`: Token colors and per-color counts
//! - `card`: Development cards, nobles and the fixed catalog
//! - `player`: Inventories, purchases, reservations, noble visits
//! - `state`: Board, pool, turn order and win detection
//! - `moves`: Legal move enumeration including token returns
//! - `apply`: Whole-move validation and application
//! - `turn`: Step-by-step human turns
//! - `ai` / `heuristics`: Tiered computer opponents
//! - `events`: What an applied move did

pub mod stones;
pub mod card;
pub mod chat;
pub mod error;
pub mod player;
pub mod state;
pub mod moves;
pub mod apply;
pub mod turn;
pub mod heuristics;
pub mod ai;
pub mod events;

// Re-export key types
pub use stones::{StoneMap, StoneType};
pub use card::{Card, CardId, Noble, NobleId, Stage};
pub use error::{ErrorKind, GameError};
pub use player::{AiDifficulty, PlayerKind, PlayerState, User};
pub use state::GameState;
pub use moves::{all_moves, Move, MoveKind};
pub use apply::{apply_move, MoveOutcome};
pub use turn::{TurnBuilder, TurnStatus};
pub use ai::decide_move;
pub use events::GameEvent;

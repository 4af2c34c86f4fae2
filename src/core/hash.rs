//! State Hashing
//!
//! Provides deterministic hashing of game state snapshots so that every
//! participant of a session can confirm it is looking at the same board.

use sha2::{Sha256, Digest};

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// Deterministic hasher for game state.
///
/// Wraps SHA-256. Order of updates is critical for determinism.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for a game state snapshot.
    pub fn for_game_state() -> Self {
        Self::new(b"GEM_COURT_STATE_V1")
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u16 value (little-endian).
    #[inline]
    pub fn update_u16(&mut self, value: u16) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Update with a length-prefixed string.
    #[inline]
    pub fn update_str(&mut self, value: &str) {
        self.update_u32(value.len() as u32);
        self.hasher.update(value.as_bytes());
    }

    /// Update with an optional marker, so empty slots hash differently from absent data.
    #[inline]
    pub fn update_slot(&mut self, occupied: Option<u16>) {
        match occupied {
            Some(id) => {
                self.update_u8(1);
                self.update_u16(id);
            }
            None => self.update_u8(0),
        }
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Compute state hash for a game snapshot.
///
/// This function is called by `GameState::compute_hash()`.
/// The closure adds the board-specific data after the turn header.
pub fn compute_state_hash<F>(turn_number: u32, players_turn: u8, add_state: F) -> StateHash
where
    F: FnOnce(&mut StateHasher),
{
    let mut hasher = StateHasher::for_game_state();

    // Always hash the turn header first
    hasher.update_u32(turn_number);
    hasher.update_u8(players_turn);

    add_state(&mut hasher);

    hasher.finalize()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_hasher_determinism() {
        let make_hash = || {
            let mut hasher = StateHasher::for_game_state();
            hasher.update_u32(100);
            hasher.update_str("Elowen (Hard)");
            hasher.update_slot(Some(12));
            hasher.update_bool(true);
            hasher.finalize()
        };

        assert_eq!(make_hash(), make_hash());
    }

    #[test]
    fn test_hash_order_matters() {
        let hash1 = {
            let mut h = StateHasher::new(b"test");
            h.update_u32(1);
            h.update_u32(2);
            h.finalize()
        };

        let hash2 = {
            let mut h = StateHasher::new(b"test");
            h.update_u32(2);
            h.update_u32(1);
            h.finalize()
        };

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_empty_slot_differs_from_card_zero() {
        let empty = {
            let mut h = StateHasher::for_game_state();
            h.update_slot(None);
            h.finalize()
        };
        let card_zero = {
            let mut h = StateHasher::for_game_state();
            h.update_slot(Some(0));
            h.finalize()
        };

        assert_ne!(empty, card_zero);
    }

    #[test]
    fn test_compute_state_hash_header() {
        let hash = compute_state_hash(3, 1, |h| h.update_bool(true));
        assert_eq!(hash, compute_state_hash(3, 1, |h| h.update_bool(true)));
        assert_ne!(hash, compute_state_hash(4, 1, |h| h.update_bool(true)));
        assert_ne!(hash, compute_state_hash(3, 2, |h| h.update_bool(true)));
    }
}

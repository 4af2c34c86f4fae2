//! Rule Errors
//!
//! Every rule violation is detected before mutation, so an `Err` from any
//! rules operation means the state was left untouched.

use super::stones::StoneType;

/// Where a depleted stone was requested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Holder {
    /// The shared pool.
    Pool,
    /// A player's inventory.
    Player,
}

impl std::fmt::Display for Holder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Holder::Pool => f.write_str("pool"),
            Holder::Player => f.write_str("player inventory"),
        }
    }
}

/// Coarse classification of a [`GameError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong turn, illegal combination or limit reached.
    ActionNotPossible,
    /// Pool or inventory cannot supply a token.
    ResourceDepleted,
    /// Tokens and bonuses do not cover a purchase or noble.
    CannotAfford,
    /// A return would push the pool above its initial supply.
    SupplyExceeded,
}

/// Rules violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// Acting player is not the active player.
    #[error("not player {slot}'s turn")]
    NotYourTurn {
        /// Slot that tried to act.
        slot: u8,
    },

    /// The action cannot be combined with what was already done this turn.
    #[error("illegal move combination: {0}")]
    IllegalMove(&'static str),

    /// Player already holds the maximum number of reserved cards.
    #[error("cannot hold more than {limit} reserved cards")]
    ReservationLimit {
        /// The cap.
        limit: usize,
    },

    /// Game has not been started or is already over.
    #[error("game is not running")]
    NotRunning,

    /// Starting requires a full table.
    #[error("need {required} players to start, have {present}")]
    NotEnoughPlayers {
        /// Seats required.
        required: usize,
        /// Seats filled.
        present: usize,
    },

    /// Referenced card is not where the action expects it.
    #[error("card #{0} is not available")]
    CardUnavailable(u16),

    /// Referenced seat does not exist.
    #[error("no player in slot {0}")]
    UnknownSlot(u8),

    /// Active player has no legal move at all.
    #[error("no legal move available")]
    NoLegalMove,

    /// Token requested from an empty holder.
    #[error("no {stone} stones left in the {holder}")]
    ResourceDepleted {
        /// Requested color.
        stone: StoneType,
        /// Where it was requested from.
        holder: Holder,
    },

    /// Purchase or noble visit not covered.
    #[error("cannot afford {0}")]
    CannotAfford(String),

    /// Returning would exceed the color's initial supply.
    #[error("returning {stone} would exceed its supply of {supply}")]
    SupplyExceeded {
        /// Returned color.
        stone: StoneType,
        /// Initial supply of that color.
        supply: u8,
    },
}

impl GameError {
    /// Classify for callers that only report the category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::NotYourTurn { .. }
            | GameError::IllegalMove(_)
            | GameError::ReservationLimit { .. }
            | GameError::NotRunning
            | GameError::NotEnoughPlayers { .. }
            | GameError::CardUnavailable(_)
            | GameError::UnknownSlot(_)
            | GameError::NoLegalMove => ErrorKind::ActionNotPossible,
            GameError::ResourceDepleted { .. } => ErrorKind::ResourceDepleted,
            GameError::CannotAfford(_) => ErrorKind::CannotAfford,
            GameError::SupplyExceeded { .. } => ErrorKind::SupplyExceeded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(GameError::NotYourTurn { slot: 2 }.kind(), ErrorKind::ActionNotPossible);
        assert_eq!(GameError::ReservationLimit { limit: 3 }.kind(), ErrorKind::ActionNotPossible);
        assert_eq!(
            GameError::ResourceDepleted { stone: StoneType::Red, holder: Holder::Pool }.kind(),
            ErrorKind::ResourceDepleted
        );
        assert_eq!(GameError::CannotAfford("x".into()).kind(), ErrorKind::CannotAfford);
    }

    #[test]
    fn test_error_messages() {
        let err = GameError::ResourceDepleted { stone: StoneType::Gold, holder: Holder::Pool };
        assert_eq!(err.to_string(), "no gold stones left in the pool");
        assert_eq!(
            GameError::ReservationLimit { limit: 3 }.to_string(),
            "cannot hold more than 3 reserved cards"
        );
    }
}

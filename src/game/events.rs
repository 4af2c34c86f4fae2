//! Game Events
//!
//! Records of what an applied move did, for logging and for clients that
//! animate changes instead of diffing snapshots.

use serde::{Serialize, Deserialize};

use super::card::{CardId, NobleId};
use super::stones::StoneMap;

/// Game event data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEventData {
    /// Tokens moved from the pool to the player.
    StonesTaken {
        /// Tokens taken.
        tokens: StoneMap,
    },

    /// Card moved into the player's reserve.
    CardReserved {
        /// Reserved card.
        card: CardId,
        /// Drawn blind from a stack.
        from_stack: bool,
        /// A gold token came along.
        took_gold: bool,
    },

    /// Card purchased.
    CardBought {
        /// Purchased card.
        card: CardId,
        /// Tokens paid into the pool.
        payment: StoneMap,
        /// Bought out of the reserve.
        from_reserve: bool,
    },

    /// Tokens shed back into the pool.
    StonesReturned {
        /// Tokens returned.
        tokens: StoneMap,
    },

    /// A noble visited the player.
    NobleVisited {
        /// The noble.
        noble: NobleId,
    },

    /// Play passed to the next seat.
    TurnPassed {
        /// Slot now active.
        next: u8,
        /// Round counter after the pass.
        round: u32,
    },

    /// A player reached the winning prestige.
    PlayerWon {
        /// Prestige at the time of winning.
        prestige: u32,
    },
}

/// A game event with its round and acting seat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Round counter when the event occurred.
    pub round: u32,

    /// Seat that acted.
    pub slot: u8,

    /// Event data.
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(round: u32, slot: u8, data: GameEventData) -> Self {
        Self { round, slot, data }
    }

    /// Create a noble visit event.
    pub fn noble_visited(round: u32, slot: u8, noble: NobleId) -> Self {
        Self::new(round, slot, GameEventData::NobleVisited { noble })
    }

    /// Create a win event.
    pub fn player_won(round: u32, slot: u8, prestige: u32) -> Self {
        Self::new(round, slot, GameEventData::PlayerWon { prestige })
    }
}

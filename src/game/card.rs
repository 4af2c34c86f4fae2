//! Development Cards and Nobles
//!
//! Immutable board pieces and the fixed catalog they are dealt from.
//! Cards and nobles compare by catalog id, never by cost.

use serde::{Serialize, Deserialize};
use std::fmt;

use super::stones::{StoneMap, StoneType};
use super::stones::StoneType::{Black, Blue, Green, Red, White};

/// Prestige granted by every noble in this ruleset.
pub const NOBLE_PRESTIGE: u8 = 3;

/// Number of face-up cards per stage.
pub const VISIBLE_PER_STAGE: usize = 4;

/// Number of nobles dealt per game.
pub const NOBLES_PER_GAME: usize = 5;

// =============================================================================
// STAGE
// =============================================================================

/// Card tier. Higher stages cost more and score more.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Cheap bonus builders.
    One = 1,
    /// Mid-game cards.
    Two = 2,
    /// Expensive prestige cards.
    Three = 3,
}

impl Stage {
    /// All stages in ascending order.
    pub const ALL: [Stage; 3] = [Stage::One, Stage::Two, Stage::Three];

    /// Zero-based index for deck/stack arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize - 1
    }
}

// =============================================================================
// CARD
// =============================================================================

/// Catalog identifier of a card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CardId(pub u16);

/// A development card.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Card {
    /// Catalog identity.
    pub id: CardId,
    /// Tier the card is dealt from.
    pub stage: Stage,
    /// Permanent discount color granted to the owner.
    pub bonus: StoneType,
    /// Prestige points.
    pub prestige: u8,
    /// Purchase price (gold is never part of a price).
    pub cost: StoneMap,
}

impl PartialEq for Card {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Card {}

impl Card {
    /// Total tokens on the price tag.
    pub fn total_cost(&self) -> u32 {
        self.cost.total()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} (stage {}, {} pt, {} bonus, cost {})",
            self.id.0, self.stage as u8, self.prestige, self.bonus, self.cost
        )
    }
}

// =============================================================================
// NOBLE
// =============================================================================

/// Catalog identifier of a noble.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NobleId(pub u8);

/// A noble patron. Visits any player whose card bonuses meet its requirements.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Noble {
    /// Catalog identity.
    pub id: NobleId,
    /// Bonus counts required per color (gold never required).
    pub requirements: StoneMap,
    /// Prestige points.
    pub prestige: u8,
}

impl PartialEq for Noble {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Noble {}

impl fmt::Display for Noble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "noble #{} (requires {})", self.id.0, self.requirements)
    }
}

// =============================================================================
// CATALOG
// =============================================================================

/// `(prestige, bonus, [white, blue, green, red, black])`
type CardRow = (u8, StoneType, [u8; 5]);

const STAGE_ONE: [CardRow; 40] = [
    (0, Black, [0, 0, 1, 3, 1]),
    (0, Black, [0, 0, 2, 1, 0]),
    (0, Black, [0, 0, 3, 0, 0]),
    (0, Black, [1, 1, 1, 1, 0]),
    (0, Black, [1, 2, 1, 1, 0]),
    (0, Black, [2, 2, 0, 1, 0]),
    (0, Black, [2, 0, 2, 0, 0]),
    (0, Blue, [0, 1, 3, 1, 0]),
    (0, Blue, [0, 0, 2, 0, 2]),
    (0, Blue, [1, 0, 0, 0, 2]),
    (0, Blue, [1, 0, 1, 1, 1]),
    (0, Blue, [1, 0, 1, 2, 1]),
    (0, Blue, [1, 0, 2, 2, 0]),
    (0, Green, [0, 1, 0, 2, 2]),
    (0, Green, [0, 2, 0, 2, 0]),
    (0, Green, [0, 0, 0, 3, 0]),
    (0, Green, [1, 1, 0, 1, 1]),
    (0, Green, [1, 1, 0, 1, 2]),
    (0, Green, [1, 3, 1, 0, 0]),
    (0, Green, [2, 1, 0, 0, 0]),
    (0, Red, [0, 2, 1, 0, 0]),
    (0, Red, [1, 1, 1, 0, 1]),
    (0, Red, [1, 0, 0, 1, 3]),
    (0, Red, [2, 1, 1, 0, 1]),
    (0, Red, [2, 0, 1, 0, 2]),
    (0, Red, [2, 0, 0, 2, 0]),
    (0, Red, [3, 0, 0, 0, 0]),
    (0, White, [0, 1, 1, 1, 1]),
    (0, White, [0, 1, 2, 1, 1]),
    (0, White, [0, 2, 0, 0, 2]),
    (0, White, [0, 2, 2, 0, 1]),
    (0, White, [0, 3, 0, 0, 0]),
    (0, White, [0, 0, 0, 2, 1]),
    (0, White, [3, 1, 0, 0, 1]),
    (1, Black, [0, 4, 0, 0, 0]),
    (1, Blue, [0, 0, 0, 0, 3]),
    (1, Blue, [0, 0, 0, 4, 0]),
    (1, Green, [0, 0, 0, 0, 4]),
    (1, Red, [4, 0, 0, 0, 0]),
    (1, White, [0, 0, 4, 0, 0]),
];

const STAGE_TWO: [CardRow; 30] = [
    (1, Black, [3, 2, 2, 0, 0]),
    (1, Black, [3, 0, 3, 0, 2]),
    (1, Blue, [0, 2, 2, 3, 0]),
    (1, Blue, [0, 3, 3, 0, 3]),
    (1, Green, [2, 3, 0, 0, 2]),
    (1, Green, [3, 0, 2, 3, 0]),
    (1, Red, [0, 3, 0, 2, 3]),
    (1, Red, [2, 0, 0, 2, 3]),
    (1, White, [0, 0, 3, 2, 2]),
    (1, White, [2, 3, 0, 3, 0]),
    (2, Black, [0, 1, 4, 2, 0]),
    (2, Black, [0, 0, 5, 3, 0]),
    (2, Black, [5, 0, 0, 0, 0]),
    (2, Blue, [0, 5, 0, 0, 0]),
    (2, Blue, [2, 0, 0, 1, 4]),
    (2, Blue, [5, 3, 0, 0, 0]),
    (2, Green, [0, 5, 3, 0, 0]),
    (2, Green, [0, 0, 5, 0, 0]),
    (2, Green, [4, 2, 0, 0, 1]),
    (2, Red, [0, 0, 0, 0, 5]),
    (2, Red, [1, 4, 2, 0, 0]),
    (2, Red, [3, 0, 0, 0, 5]),
    (2, White, [0, 0, 1, 4, 2]),
    (2, White, [0, 0, 0, 5, 3]),
    (2, White, [0, 0, 0, 5, 0]),
    (3, Black, [0, 0, 0, 0, 6]),
    (3, Blue, [0, 6, 0, 0, 0]),
    (3, Green, [0, 0, 6, 0, 0]),
    (3, Red, [0, 0, 0, 6, 0]),
    (3, White, [6, 0, 0, 0, 0]),
];

const STAGE_THREE: [CardRow; 20] = [
    (3, Black, [3, 3, 5, 3, 0]),
    (3, Blue, [3, 0, 3, 3, 5]),
    (3, Green, [5, 3, 0, 3, 3]),
    (3, Red, [3, 5, 3, 0, 3]),
    (3, White, [0, 3, 3, 5, 3]),
    (4, Black, [0, 0, 3, 6, 3]),
    (4, Black, [0, 0, 0, 7, 0]),
    (4, Blue, [6, 3, 0, 0, 3]),
    (4, Blue, [7, 0, 0, 0, 0]),
    (4, Green, [0, 7, 0, 0, 0]),
    (4, Green, [3, 6, 3, 0, 0]),
    (4, Red, [0, 3, 6, 3, 0]),
    (4, Red, [0, 0, 7, 0, 0]),
    (4, White, [0, 0, 0, 0, 7]),
    (4, White, [3, 0, 0, 0, 7]),
    (4, White, [3, 0, 0, 3, 6]),
    (5, Black, [0, 0, 0, 7, 3]),
    (5, Blue, [7, 3, 0, 0, 0]),
    (5, Green, [0, 7, 3, 0, 0]),
    (5, Red, [0, 0, 7, 3, 0]),
];

/// `[white, blue, green, red, black]` bonus requirements.
const NOBLES: [[u8; 5]; 10] = [
    [3, 3, 0, 0, 3],
    [0, 0, 3, 3, 3],
    [3, 0, 0, 3, 3],
    [0, 0, 0, 4, 4],
    [4, 0, 0, 0, 4],
    [0, 4, 4, 0, 0],
    [4, 4, 0, 0, 0],
    [0, 3, 3, 3, 0],
    [3, 3, 3, 0, 0],
    [0, 0, 4, 4, 0],
];

/// All cards of one stage in catalog order.
///
/// Ids are global: stage one holds 0..40, stage two 40..70, stage three 70..90.
pub fn stage_catalog(stage: Stage) -> Vec<Card> {
    let (rows, first_id): (&[CardRow], u16) = match stage {
        Stage::One => (&STAGE_ONE, 0),
        Stage::Two => (&STAGE_TWO, 40),
        Stage::Three => (&STAGE_THREE, 70),
    };

    rows.iter()
        .enumerate()
        .map(|(i, &(prestige, bonus, gems))| Card {
            id: CardId(first_id + i as u16),
            stage,
            bonus,
            prestige,
            cost: StoneMap::from_gems(gems),
        })
        .collect()
}

/// All ten nobles in catalog order.
pub fn noble_catalog() -> Vec<Noble> {
    NOBLES
        .iter()
        .enumerate()
        .map(|(i, &gems)| Noble {
            id: NobleId(i as u8),
            requirements: StoneMap::from_gems(gems),
            prestige: NOBLE_PRESTIGE,
        })
        .collect()
}

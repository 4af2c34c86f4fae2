//! Player Model
//!
//! One struct carries the shared inventory and ownership rules for both
//! human-backed and AI-backed seats; the seat kind is a payload enum.

use serde::{Serialize, Deserialize};
use std::fmt;

use super::card::{Card, Noble};
use super::error::{GameError, Holder};
use super::stones::{StoneMap, StoneType};

/// Maximum tokens a player may hold at the end of a turn.
pub const MAX_STONES: u32 = 10;

/// Maximum cards a player may hold in reserve.
pub const MAX_RESERVED: usize = 3;

// =============================================================================
// IDENTITY
// =============================================================================

/// An account from the user directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Directory id.
    pub id: u32,
    /// Login and display name.
    pub username: String,
    /// Age in years; the youngest human starts the game.
    pub age: u8,
}

/// Strategy tier of a computer-controlled seat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiDifficulty {
    /// Random buyer.
    Easy,
    /// Buys for points, reserves toward top-stage cards.
    Medium,
    /// Medium plus blocking and composite take scoring.
    Hard,
}

impl fmt::Display for AiDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AiDifficulty::Easy => "Easy",
            AiDifficulty::Medium => "Medium",
            AiDifficulty::Hard => "Hard",
        };
        f.write_str(name)
    }
}

/// Who controls a seat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlayerKind {
    /// A logged-in person.
    Human {
        /// Their account.
        user: User,
    },
    /// A computer opponent.
    Ai {
        /// Strategy tier.
        difficulty: AiDifficulty,
        /// Throwaway account used only for statistics. `None` if registration failed.
        backing_user: Option<User>,
    },
}

// =============================================================================
// PLAYER STATE
// =============================================================================

/// A seat at the table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Session slot (0-3), equal to the index in the player list.
    pub slot: u8,

    /// Display name. Distinct among AI seats.
    pub name: String,

    /// Human or AI payload.
    pub kind: PlayerKind,

    /// Tokens held, all six colors.
    pub stones: StoneMap,

    /// Purchased cards, in order of acquisition.
    pub owned_cards: Vec<Card>,

    /// Reserved cards, at most [`MAX_RESERVED`].
    pub reserved_cards: Vec<Card>,

    /// Nobles that have visited.
    pub nobles: Vec<Noble>,
}

impl PlayerState {
    /// Seat a human.
    pub fn human(slot: u8, user: User) -> Self {
        let name = user.username.clone();
        Self::with_kind(slot, name, PlayerKind::Human { user })
    }

    /// Seat an AI. The backing identity is bound later by the session registry.
    pub fn ai(slot: u8, name: impl Into<String>, difficulty: AiDifficulty) -> Self {
        Self::with_kind(slot, name.into(), PlayerKind::Ai { difficulty, backing_user: None })
    }

    fn with_kind(slot: u8, name: String, kind: PlayerKind) -> Self {
        Self {
            slot,
            name,
            kind,
            stones: StoneMap::EMPTY,
            owned_cards: Vec::new(),
            reserved_cards: Vec::new(),
            nobles: Vec::new(),
        }
    }

    /// Is this seat computer-controlled?
    pub fn is_ai(&self) -> bool {
        matches!(self.kind, PlayerKind::Ai { .. })
    }

    /// Strategy tier for AI seats.
    pub fn difficulty(&self) -> Option<AiDifficulty> {
        match &self.kind {
            PlayerKind::Ai { difficulty, .. } => Some(*difficulty),
            PlayerKind::Human { .. } => None,
        }
    }

    /// Account for humans, backing account for AIs.
    pub fn identity(&self) -> Option<&User> {
        match &self.kind {
            PlayerKind::Human { user } => Some(user),
            PlayerKind::Ai { backing_user, .. } => backing_user.as_ref(),
        }
    }

    /// Age of a human seat.
    pub fn age(&self) -> Option<u8> {
        match &self.kind {
            PlayerKind::Human { user } => Some(user.age),
            PlayerKind::Ai { .. } => None,
        }
    }

    /// Drop all holdings, keeping slot, name and identity bindings.
    pub fn clear_holdings(&mut self) {
        self.stones = StoneMap::EMPTY;
        self.owned_cards.clear();
        self.reserved_cards.clear();
        self.nobles.clear();
    }

    // =========================================================================
    // Tokens
    // =========================================================================

    /// Add one token to the inventory.
    pub fn take_stone(&mut self, stone: StoneType) {
        self.stones[stone] = self.stones[stone].saturating_add(1);
    }

    /// Remove one token from the inventory.
    pub fn return_stone(&mut self, stone: StoneType) -> Result<(), GameError> {
        if self.stones[stone] == 0 {
            return Err(GameError::ResourceDepleted { stone, holder: Holder::Player });
        }
        self.stones[stone] -= 1;
        Ok(())
    }

    /// Tokens held across all colors.
    pub fn total_stones(&self) -> u32 {
        self.stones.total()
    }

    // =========================================================================
    // Scoring and bonuses
    // =========================================================================

    /// Card points plus noble points.
    pub fn prestige(&self) -> u32 {
        let cards: u32 = self.owned_cards.iter().map(|c| c.prestige as u32).sum();
        let nobles: u32 = self.nobles.iter().map(|n| n.prestige as u32).sum();
        cards + nobles
    }

    /// Owned cards granting this color.
    pub fn bonus_for_type(&self, stone: StoneType) -> u8 {
        self.owned_cards.iter().filter(|c| c.bonus == stone).count() as u8
    }

    /// Bonus counts for every color.
    pub fn bonuses(&self) -> StoneMap {
        let mut bonuses = StoneMap::EMPTY;
        for card in &self.owned_cards {
            bonuses[card.bonus] = bonuses[card.bonus].saturating_add(1);
        }
        bonuses
    }

    /// Price after this player's bonus discounts, never below zero per color.
    pub fn cost_after_bonuses(&self, card: &Card) -> StoneMap {
        let bonuses = self.bonuses();
        let mut net = StoneMap::EMPTY;
        for stone in StoneType::GEMS {
            net[stone] = card.cost[stone].saturating_sub(bonuses[stone]);
        }
        net
    }

    // =========================================================================
    // Purchases
    // =========================================================================

    /// Tokens this player would hand over for `card`.
    ///
    /// Each color pays what it can of the discounted price; gold covers the
    /// remaining deficit. The gold entry may exceed held gold, in which case
    /// the card is not affordable.
    pub fn payment_for_card(&self, card: &Card) -> StoneMap {
        let net = self.cost_after_bonuses(card);
        let mut payment = StoneMap::EMPTY;
        let mut deficit: u8 = 0;
        for stone in StoneType::GEMS {
            let paid = net[stone].min(self.stones[stone]);
            payment[stone] = paid;
            deficit = deficit.saturating_add(net[stone] - paid);
        }
        payment[StoneType::Gold] = deficit;
        payment
    }

    /// True when the gold deficit is covered by held gold.
    pub fn can_afford_card(&self, card: &Card) -> bool {
        self.stones.covers(&self.payment_for_card(card))
    }

    /// Pay for `card` and add it to the owned cards. Returns the payment.
    ///
    /// The caller credits the payment to the pool.
    pub fn buy_card(&mut self, card: &Card) -> Result<StoneMap, GameError> {
        let payment = self.payment_for_card(card);
        let remaining = self
            .stones
            .checked_minus(&payment)
            .ok_or_else(|| GameError::CannotAfford(card.to_string()))?;
        self.stones = remaining;
        self.owned_cards.push(card.clone());
        Ok(payment)
    }

    /// Buy a card out of this player's reserve.
    pub fn buy_reserved_card(&mut self, card: &Card) -> Result<StoneMap, GameError> {
        let position = self
            .reserved_cards
            .iter()
            .position(|c| c == card)
            .ok_or(GameError::CardUnavailable(card.id.0))?;
        if self.owned_cards.contains(card) {
            return Err(GameError::CardUnavailable(card.id.0));
        }
        let payment = self.buy_card(card)?;
        self.reserved_cards.remove(position);
        Ok(payment)
    }

    /// Put a card into reserve.
    pub fn reserve_card(&mut self, card: &Card) -> Result<(), GameError> {
        if self.reserved_cards.len() >= MAX_RESERVED {
            return Err(GameError::ReservationLimit { limit: MAX_RESERVED });
        }
        self.reserved_cards.push(card.clone());
        Ok(())
    }

    // =========================================================================
    // Nobles
    // =========================================================================

    /// True when bonuses meet every requirement of `noble`.
    pub fn check_noble_visit(&self, noble: &Noble) -> bool {
        self.bonuses().covers(&noble.requirements)
    }

    /// Per-slot claimability for a noble row. Empty slots are `false`.
    pub fn noble_selection(&self, row: &[Option<Noble>]) -> Vec<bool> {
        row.iter()
            .map(|slot| slot.as_ref().is_some_and(|n| self.check_noble_visit(n)))
            .collect()
    }

    /// Record a noble visit. Returns `false` if this noble already visited.
    pub fn obtain_noble(&mut self, noble: &Noble) -> bool {
        if self.nobles.contains(noble) {
            return false;
        }
        self.nobles.push(noble.clone());
        true
    }
}

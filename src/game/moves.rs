//! Move Generation
//!
//! Enumerates every legal move for the active player: takes, reservations
//! and purchases. Whenever an action leaves the player above the token
//! limit, one variant is produced per way of shedding the excess.

use serde::{Serialize, Deserialize};

use super::card::{Card, Noble, Stage};
use super::player::{PlayerState, MAX_RESERVED, MAX_STONES};
use super::state::GameState;
use super::stones::{StoneMap, StoneType};

// =============================================================================
// MOVE TYPES
// =============================================================================

/// The action half of a move.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MoveKind {
    /// Three distinct gems, or two of one gem.
    Take {
        /// Tokens taken from the pool.
        tokens: StoneMap,
    },
    /// Reserve a face-up card or the top of a stack.
    Reserve {
        /// The reserved card.
        card: Card,
        /// Drawn blind from the stack instead of the face-up row.
        from_stack: bool,
        /// A gold token comes along with the reservation.
        takes_gold: bool,
    },
    /// Buy a face-up or reserved card.
    Buy {
        /// The purchased card.
        card: Card,
        /// Exact tokens handed to the pool, gold included.
        payment: StoneMap,
        /// Bought out of the player's reserve.
        from_reserve: bool,
    },
}

/// A complete turn: the action, the tokens shed afterwards and an optional noble pick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    /// What the player does.
    pub kind: MoveKind,
    /// Tokens that must be shed to get back to the limit.
    pub required_return: u8,
    /// The tokens shed, summing to `required_return`.
    pub returns: StoneMap,
    /// Noble chosen when several become claimable at once.
    pub noble: Option<Noble>,
}

impl Move {
    /// A move with nothing to return.
    pub fn new(kind: MoveKind) -> Self {
        Self { kind, required_return: 0, returns: StoneMap::EMPTY, noble: None }
    }

    /// Pick a specific noble for this move.
    pub fn with_noble(mut self, noble: Noble) -> Self {
        self.noble = Some(noble);
        self
    }

    /// Is this a take?
    pub fn is_take(&self) -> bool {
        matches!(self.kind, MoveKind::Take { .. })
    }

    /// Is this a reservation?
    pub fn is_reserve(&self) -> bool {
        matches!(self.kind, MoveKind::Reserve { .. })
    }

    /// Is this a purchase?
    pub fn is_buy(&self) -> bool {
        matches!(self.kind, MoveKind::Buy { .. })
    }

    /// Card involved, if any.
    pub fn card(&self) -> Option<&Card> {
        match &self.kind {
            MoveKind::Take { .. } => None,
            MoveKind::Reserve { card, .. } | MoveKind::Buy { card, .. } => Some(card),
        }
    }

    /// Tokens gained from the pool by the action itself.
    pub fn tokens_gained(&self) -> StoneMap {
        match &self.kind {
            MoveKind::Take { tokens } => *tokens,
            MoveKind::Reserve { takes_gold: true, .. } => StoneMap::of(&[(StoneType::Gold, 1)]),
            MoveKind::Reserve { .. } | MoveKind::Buy { .. } => StoneMap::EMPTY,
        }
    }
}

// =============================================================================
// GENERATION
// =============================================================================

/// Every legal move for the active player.
pub fn all_moves(state: &GameState) -> Vec<Move> {
    let Some(player) = state.active_player() else {
        return Vec::new();
    };

    let mut moves = take_moves(state, player);
    moves.extend(reserve_moves(state, player));
    moves.extend(buy_moves(state, player));

    #[cfg(feature = "debug-tracing")]
    tracing::debug!(slot = player.slot, count = moves.len(), "enumerated moves");

    moves
}

/// Take moves: every trio of distinct available gems and every pair from a color at 4 or more.
pub fn take_moves(state: &GameState, player: &PlayerState) -> Vec<Move> {
    let available: Vec<StoneType> = StoneType::GEMS
        .into_iter()
        .filter(|&s| state.pool[s] >= 1)
        .collect();

    let mut takes = Vec::new();
    for i in 0..available.len() {
        for j in (i + 1)..available.len() {
            for k in (j + 1)..available.len() {
                takes.push(StoneMap::of(&[(available[i], 1), (available[j], 1), (available[k], 1)]));
            }
        }
    }
    for &stone in &available {
        if state.pool[stone] >= 4 {
            takes.push(StoneMap::of(&[(stone, 2)]));
        }
    }

    takes
        .into_iter()
        .flat_map(|tokens| with_returns(MoveKind::Take { tokens }, player.stones.plus(&tokens)))
        .collect()
}

/// Reservation moves for every face-up card and every stack top.
pub fn reserve_moves(state: &GameState, player: &PlayerState) -> Vec<Move> {
    if player.reserved_cards.len() >= MAX_RESERVED {
        return Vec::new();
    }

    let takes_gold = state.pool[StoneType::Gold] > 0;
    let mut after = player.stones;
    if takes_gold {
        after[StoneType::Gold] += 1;
    }

    let face_up = state.visible_cards().map(|card| (card, false));
    let blind = Stage::ALL
        .into_iter()
        .filter_map(|stage| state.stack_top(stage))
        .map(|card| (card, true));

    face_up
        .chain(blind)
        .flat_map(|(card, from_stack)| {
            with_returns(
                MoveKind::Reserve { card: card.clone(), from_stack, takes_gold },
                after,
            )
        })
        .collect()
}

/// Purchase moves for every affordable face-up or reserved card.
pub fn buy_moves(state: &GameState, player: &PlayerState) -> Vec<Move> {
    let face_up = state.visible_cards().map(|card| (card, false));
    let reserved = player.reserved_cards.iter().map(|card| (card, true));

    face_up
        .chain(reserved)
        .filter(|(card, _)| player.can_afford_card(card))
        .map(|(card, from_reserve)| {
            Move::new(MoveKind::Buy {
                card: card.clone(),
                payment: player.payment_for_card(card),
                from_reserve,
            })
        })
        .collect()
}

/// Tokens to shed when holding `inventory` after an action.
pub fn required_return(inventory: &StoneMap) -> u8 {
    inventory.total().saturating_sub(MAX_STONES) as u8
}

/// One move per way of shedding the excess from `after`.
fn with_returns(kind: MoveKind, after: StoneMap) -> Vec<Move> {
    let required = required_return(&after);
    return_combinations(&after, required)
        .into_iter()
        .map(|returns| Move { kind: kind.clone(), required_return: required, returns, noble: None })
        .collect()
}

/// Every multiset of held tokens with exactly `count` elements.
///
/// Each color is bounded by the holding. A zero count yields the single empty return.
pub fn return_combinations(inventory: &StoneMap, count: u8) -> Vec<StoneMap> {
    let mut found = Vec::new();
    let mut current = StoneMap::EMPTY;
    collect_returns(inventory, 0, count, &mut current, &mut found);
    found
}

fn collect_returns(
    inventory: &StoneMap,
    index: usize,
    left: u8,
    current: &mut StoneMap,
    found: &mut Vec<StoneMap>,
) {
    if left == 0 {
        found.push(*current);
        return;
    }
    let Some(&stone) = StoneType::ALL.get(index) else {
        return;
    };
    for n in 0..=left.min(inventory[stone]) {
        current[stone] = n;
        collect_returns(inventory, index + 1, left - n, current, found);
    }
    current[stone] = 0;
}

// =============================================================================
// TESTS
// =============================================================================

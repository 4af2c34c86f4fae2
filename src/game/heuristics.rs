//! AI Scoring Heuristics
//!
//! Card and token valuations used by the Medium and Hard strategies.
//! Demand is read off the visible stage-three row: the colors those cards
//! cost most are the colors worth collecting.
//!
//! Scores are integers in thousandths of a point so that decisions stay
//! bit-identical across platforms.

use super::card::{Card, Stage};
use super::moves::{Move, MoveKind};
use super::player::PlayerState;
use super::state::GameState;
use super::stones::{StoneMap, StoneType};

/// Heuristic score in thousandths of a point.
pub type Score = i64;

/// One point.
pub const UNIT: Score = 1000;

/// Penalty per token that must be shed after a take.
pub const RETURN_PENALTY: Score = 1500;

/// Bonus per missing token when a color runs low in the pool.
pub const SCARCITY: Score = 2000;

/// Bonus for colors the player holds few of.
pub const URGENCY: Score = 1200;

/// Penalty per token of a color opponents are hoarding.
pub const OPPONENT_PENALTY: Score = 500;

/// Bonus per token still needed for a reserved card.
pub const TARGET_NEED: Score = 3500;

/// Prestige at which an opponent is considered close to winning.
pub const DANGER_PRESTIGE: u32 = 10;

/// Cards above this prestige are worth blocking.
pub const BLOCK_PRESTIGE: u8 = 3;

// =============================================================================
// DEMAND
// =============================================================================

/// Per-color demand of the visible stage-three row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Demand {
    /// Summed cost per color.
    totals: [u32; 6],
    /// Number of cards costing the color at all.
    frequency: [u32; 6],
}

impl Demand {
    /// Read demand off the board.
    pub fn from_state(state: &GameState) -> Self {
        let mut demand = Self::default();
        for card in state.deck(Stage::Three).iter().flatten() {
            for (stone, count) in card.cost.nonzero() {
                demand.totals[stone.index()] += count as u32;
                demand.frequency[stone.index()] += 1;
            }
        }
        demand
    }

    /// Summed stage-three cost of `stone`.
    pub fn importance(&self, stone: StoneType) -> u32 {
        self.totals[stone.index()]
    }

    /// Stage-three cards costing `stone`.
    pub fn frequency(&self, stone: StoneType) -> u32 {
        self.frequency[stone.index()]
    }

    /// Demanded colors, most frequent first. Ties keep color order.
    pub fn hot_colors(&self) -> Vec<StoneType> {
        let mut colors: Vec<StoneType> = StoneType::GEMS
            .into_iter()
            .filter(|&s| self.frequency(s) > 0)
            .collect();
        colors.sort_by_key(|&s| std::cmp::Reverse(self.frequency(s)));
        colors
    }

    /// Importance of a set of tokens. Gold outranks every gem.
    pub fn value_of(&self, tokens: &StoneMap) -> Score {
        let gold_value = self.totals.iter().max().copied().unwrap_or(0) + 1;
        tokens
            .nonzero()
            .map(|(stone, count)| {
                let importance = if stone.is_gold() { gold_value } else { self.importance(stone) };
                importance as Score * count as Score
            })
            .sum()
    }
}

// =============================================================================
// SELECTION
// =============================================================================

/// First item with the strictly greatest score.
pub fn best_by<'a, T>(items: impl IntoIterator<Item = &'a T>, mut score: impl FnMut(&T) -> Score) -> Option<&'a T> {
    let mut best: Option<(&T, Score)> = None;
    for item in items {
        let value = score(item);
        if best.map_or(true, |(_, top)| value > top) {
            best = Some((item, value));
        }
    }
    best.map(|(item, _)| item)
}

// =============================================================================
// CARDS
// =============================================================================

/// Point and bonus weights for a player at `prestige`.
///
/// Early on bonuses matter; close to the finish raw points do.
pub fn buy_weights(prestige: u32) -> (Score, Score) {
    if prestige < 5 {
        (5, 3)
    } else if prestige < 10 {
        (10, 1)
    } else {
        (15, 1)
    }
}

/// Value of owning `card` for a player at `prestige`.
pub fn buy_score(card: &Card, demand: &Demand, prestige: u32) -> Score {
    let (point_weight, bonus_weight) = buy_weights(prestige);
    (card.prestige as Score * point_weight + demand.importance(card.bonus) as Score * bonus_weight) * UNIT
}

/// Value of a buy move; non-buys score nothing.
pub fn buy_move_score(mv: &Move, demand: &Demand, prestige: u32) -> Score {
    match &mv.kind {
        MoveKind::Buy { card, .. } => buy_score(card, demand, prestige),
        _ => Score::MIN,
    }
}

/// Tokens still missing for `card` once bonuses, matching tokens and gold are spent.
pub fn shortfall(player: &PlayerState, card: &Card) -> u32 {
    let net = player.cost_after_bonuses(card);
    let missing: u32 = StoneType::GEMS
        .iter()
        .map(|&s| net[s].saturating_sub(player.stones[s]) as u32)
        .sum();
    missing.saturating_sub(player.stones[StoneType::Gold] as u32)
}

/// A card one token out of reach, with gold left to close the gap by reserving it.
pub fn is_near_miss(state: &GameState, player: &PlayerState, card: &Card) -> bool {
    state.pool[StoneType::Gold] > 0 && shortfall(player, card) == 1
}

/// Visible stage-two cards whose bonus is the most demanded color that has any.
pub fn good_stage_two(state: &GameState, demand: &Demand) -> Vec<Card> {
    let row = state.deck(Stage::Two);
    for color in demand.hot_colors() {
        let matching: Vec<Card> = row.iter().flatten().filter(|c| c.bonus == color).cloned().collect();
        if !matching.is_empty() {
            return matching;
        }
    }
    Vec::new()
}

/// A high-prestige visible card that an opponent close to winning can buy right now.
pub fn blockable_card<'a>(state: &'a GameState, me: u8) -> Option<&'a Card> {
    state
        .players
        .iter()
        .filter(|p| p.slot != me && p.prestige() >= DANGER_PRESTIGE)
        .find_map(|opponent| {
            state
                .visible_cards()
                .find(|c| c.prestige > BLOCK_PRESTIGE && opponent.can_afford_card(c))
        })
}

// =============================================================================
// TOKENS
// =============================================================================

/// Tokens per color still missing for the player's reserved cards.
pub fn target_needs(player: &PlayerState) -> StoneMap {
    let bonuses = player.bonuses();
    let mut needs = StoneMap::EMPTY;
    for card in &player.reserved_cards {
        for (stone, cost) in card.cost.nonzero() {
            let covered = player.stones[stone].saturating_add(bonuses[stone]);
            needs[stone] = needs[stone].saturating_add(cost.saturating_sub(covered));
        }
    }
    needs
}

/// Shared penalty for tokens shed by a move.
fn return_cost(mv: &Move, demand: &Demand) -> Score {
    RETURN_PENALTY * mv.required_return as Score + demand.value_of(&mv.returns) * UNIT
}

fn urgency(count: u8, held: u8) -> Score {
    URGENCY * count as Score / (held as Score + 1)
}

/// Demand-only take score: importance and urgency, minus what must be shed.
pub fn demand_take_score(mv: &Move, demand: &Demand, player: &PlayerState) -> Score {
    let MoveKind::Take { tokens } = &mv.kind else {
        return Score::MIN;
    };
    let gained: Score = tokens
        .nonzero()
        .map(|(stone, n)| {
            demand.importance(stone) as Score * n as Score * UNIT + urgency(n, player.stones[stone])
        })
        .sum();
    gained - return_cost(mv, demand)
}

/// Inputs of the composite take score that depend on the whole table.
#[derive(Clone, Debug)]
pub struct TakeContext {
    demand: Demand,
    held: StoneMap,
    pool: StoneMap,
    opponents: [u32; 6],
    needs: StoneMap,
}

impl TakeContext {
    /// Gather the context for `player` at this table.
    pub fn new(state: &GameState, player: &PlayerState, demand: &Demand) -> Self {
        let mut opponents = [0u32; 6];
        for other in state.players.iter().filter(|p| p.slot != player.slot) {
            for (stone, count) in other.stones.iter() {
                opponents[stone.index()] += count as u32;
            }
        }
        Self {
            demand: demand.clone(),
            held: player.stones,
            pool: state.pool,
            opponents,
            needs: target_needs(player),
        }
    }

    /// Composite take score: importance, urgency, scarcity, opponent hoarding
    /// and reserved-card needs, minus what must be shed.
    pub fn score(&self, mv: &Move) -> Score {
        let MoveKind::Take { tokens } = &mv.kind else {
            return Score::MIN;
        };

        let mut score: Score = 0;
        for (stone, n) in tokens.nonzero() {
            let n = n as Score;
            let pool_left = self.pool[stone] as Score;
            score += self.demand.importance(stone) as Score * n * UNIT;
            score += urgency(n as u8, self.held[stone]);
            if pool_left < 3 {
                score += SCARCITY * (3 - pool_left) * n;
            }
            score -= OPPONENT_PENALTY * self.opponents[stone.index()] as Score * n;
            score += TARGET_NEED * self.needs[stone] as Score * n;
        }
        score - return_cost(mv, &self.demand)
    }
}

// =============================================================================
// TESTS
// =============================================================================

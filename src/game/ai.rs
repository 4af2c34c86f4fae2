//! AI Decision Engine
//!
//! Three strategies over the legal move list:
//!
//! - **Easy**: a random purchase if one exists, otherwise any random move.
//! - **Medium**: the best reserved or stage-three purchase, then the best
//!   purchase overall, a reservation toward a stage-three card one token out
//!   of reach, and finally the take that best matches stage-three demand.
//! - **Hard**: the best purchase, a block against an opponent close to winning,
//!   reservations toward near-miss stage-three and well-placed stage-two cards,
//!   then the composite-scored take, favoring three distinct colors.
//!
//! Every strategy ends on a move whenever one exists. All randomness comes
//! from the caller's [`DeterministicRng`].

use crate::core::rng::DeterministicRng;

use super::card::{Card, Stage};
use super::error::GameError;
use super::heuristics::{
    best_by, blockable_card, buy_move_score, demand_take_score, good_stage_two, is_near_miss, Demand,
    Score, TakeContext,
};
use super::moves::{all_moves, Move, MoveKind};
use super::player::{AiDifficulty, PlayerState};
use super::state::GameState;

/// Pick a move for the active player at the given difficulty.
pub fn decide_move(
    state: &GameState,
    difficulty: AiDifficulty,
    rng: &mut DeterministicRng,
) -> Result<Move, GameError> {
    let player = state.active_player().ok_or(GameError::NoLegalMove)?;
    let moves = all_moves(state);
    if moves.is_empty() {
        return Err(GameError::NoLegalMove);
    }

    let chosen = match difficulty {
        AiDifficulty::Easy => decide_easy(&moves, rng),
        AiDifficulty::Medium => decide_medium(state, player, &moves),
        AiDifficulty::Hard => decide_hard(state, player, &moves),
    };

    chosen.or_else(|| moves.first()).cloned().ok_or(GameError::NoLegalMove)
}

fn decide_easy<'a>(moves: &'a [Move], rng: &mut DeterministicRng) -> Option<&'a Move> {
    let buys: Vec<&Move> = moves.iter().filter(|m| m.is_buy()).collect();
    if buys.is_empty() {
        return rng.choose(moves);
    }
    rng.choose(&buys).copied()
}

fn decide_medium<'a>(state: &GameState, player: &PlayerState, moves: &'a [Move]) -> Option<&'a Move> {
    let demand = Demand::from_state(state);
    let prestige = player.prestige();
    let by_buy_score = |m: &Move| buy_move_score(m, &demand, prestige);

    let preferred = moves.iter().filter(|m| match &m.kind {
        MoveKind::Buy { card, from_reserve, .. } => *from_reserve || card.stage == Stage::Three,
        _ => false,
    });
    if let Some(buy) = best_by(preferred, by_buy_score) {
        return Some(buy);
    }
    if let Some(buy) = best_by(moves.iter().filter(|m| m.is_buy()), by_buy_score) {
        return Some(buy);
    }

    let target = state
        .deck(Stage::Three)
        .iter()
        .flatten()
        .find(|c| is_near_miss(state, player, c));
    if let Some(reserve) = target.and_then(|card| reserve_of(moves, card, &demand)) {
        return Some(reserve);
    }

    best_by(moves.iter().filter(|m| m.is_take()), |m| {
        demand_take_score(m, &demand, player)
    })
}

fn decide_hard<'a>(state: &GameState, player: &PlayerState, moves: &'a [Move]) -> Option<&'a Move> {
    let demand = Demand::from_state(state);
    let prestige = player.prestige();
    let by_buy_score = |m: &Move| buy_move_score(m, &demand, prestige);

    let reserved_buys = moves
        .iter()
        .filter(|m| matches!(m.kind, MoveKind::Buy { from_reserve: true, .. }));
    if let Some(buy) = best_by(reserved_buys, by_buy_score) {
        return Some(buy);
    }
    if let Some(buy) = best_by(moves.iter().filter(|m| m.is_buy()), by_buy_score) {
        return Some(buy);
    }

    if let Some(block) = blockable_card(state, player.slot) {
        if let Some(reserve) = reserve_of(moves, block, &demand) {
            tracing::debug!(slot = player.slot, card = %block, "blocking opponent");
            return Some(reserve);
        }
    }

    let stage_three = state
        .deck(Stage::Three)
        .iter()
        .flatten()
        .find(|c| is_near_miss(state, player, c));
    if let Some(reserve) = stage_three.and_then(|card| reserve_of(moves, card, &demand)) {
        return Some(reserve);
    }
    let stage_two = good_stage_two(state, &demand)
        .into_iter()
        .find(|c| is_near_miss(state, player, c));
    if let Some(reserve) = stage_two.and_then(|card| reserve_of(moves, &card, &demand)) {
        return Some(reserve);
    }

    let context = TakeContext::new(state, player, &demand);
    let three_distinct = moves
        .iter()
        .filter(|m| matches!(&m.kind, MoveKind::Take { tokens } if tokens.distinct() == 3));
    best_by(three_distinct, |m| context.score(m))
        .or_else(|| best_by(moves.iter().filter(|m| m.is_take()), |m| context.score(m)))
}

/// Face-up reservation of `card`, shedding the least valuable tokens.
fn reserve_of<'a>(moves: &'a [Move], card: &Card, demand: &Demand) -> Option<&'a Move> {
    let candidates = moves.iter().filter(|m| match &m.kind {
        MoveKind::Reserve { card: reserved, from_stack, .. } => !from_stack && reserved == card,
        _ => false,
    });
    best_by(candidates, |m| -> Score { -demand.value_of(&m.returns) })
}

// =============================================================================
// TESTS
// =============================================================================

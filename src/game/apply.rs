//! Move Application
//!
//! Applies a complete [`Move`] for one seat: the action, the token returns,
//! a noble visit and the turn pass. All preconditions are checked up front;
//! the work happens on a copy that replaces the state only on success.
//!
//! Cards and nobles named by a move are matched by id only. Their contents
//! always come from the board or the player's reserve, never from the move.

use serde::{Serialize, Deserialize};

use super::card::{Card, Noble, Stage};
use super::error::{GameError, Holder};
use super::events::{GameEvent, GameEventData};
use super::moves::{required_return, Move, MoveKind};
use super::player::{PlayerState, MAX_RESERVED};
use super::state::GameState;
use super::stones::{StoneMap, StoneType};

/// What an applied move produced.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    /// Events in the order they happened.
    pub events: Vec<GameEvent>,
    /// Noble that visited, if any.
    pub noble: Option<Noble>,
    /// Slot of the first winner after this move.
    pub winner: Option<u8>,
}

/// Apply `mv` on behalf of `slot` and pass the turn.
pub fn apply_move(state: &mut GameState, slot: u8, mv: &Move) -> Result<MoveOutcome, GameError> {
    if !state.running {
        return Err(GameError::NotRunning);
    }
    if slot != state.players_turn {
        return Err(GameError::NotYourTurn { slot });
    }
    let player = state.player(slot).ok_or(GameError::UnknownSlot(slot))?;

    let mv = &Move { kind: resolve_kind(state, player, &mv.kind)?, ..mv.clone() };
    let after_action = validate_action(state, player, &mv.kind)?;
    validate_returns(state, mv, &after_action)?;

    let mut next = state.clone();
    let round = next.turn_number;
    let mut outcome = MoveOutcome::default();

    perform_action(&mut next, slot, &mv.kind, round, &mut outcome.events)?;

    for (stone, count) in mv.returns.nonzero() {
        for _ in 0..count {
            player_of(&mut next, slot)?.return_stone(stone)?;
            next.return_stone(stone)?;
        }
    }
    if !mv.returns.is_empty() {
        outcome.events.push(GameEvent::new(
            round,
            slot,
            GameEventData::StonesReturned { tokens: mv.returns },
        ));
    }

    if let Some(noble) = pick_noble(&next, slot, mv.noble.as_ref())? {
        player_of(&mut next, slot)?.obtain_noble(&noble);
        next.remove_noble(&noble);
        outcome.events.push(GameEvent::noble_visited(round, slot, noble.id));
        outcome.noble = Some(noble);
    }

    if let Some(winner) = next.check_win() {
        outcome.events.push(GameEvent::player_won(round, winner.slot, winner.prestige()));
        outcome.winner = Some(winner.slot);
    }

    next.next_turn();
    outcome.events.push(GameEvent::new(
        round,
        slot,
        GameEventData::TurnPassed { next: next.players_turn, round: next.turn_number },
    ));

    *state = next;
    Ok(outcome)
}

fn player_of(state: &mut GameState, slot: u8) -> Result<&mut PlayerState, GameError> {
    state.player_mut(slot).ok_or(GameError::UnknownSlot(slot))
}

/// Swap the submitted card for the copy held by the board or the player's reserve.
fn resolve_kind(state: &GameState, player: &PlayerState, kind: &MoveKind) -> Result<MoveKind, GameError> {
    let by_id = |found: Option<&Card>, card: &Card| found.cloned().ok_or(GameError::CardUnavailable(card.id.0));

    Ok(match kind {
        MoveKind::Take { .. } => kind.clone(),

        MoveKind::Reserve { card, from_stack, takes_gold } => {
            let found = if *from_stack {
                Stage::ALL
                    .iter()
                    .filter_map(|&stage| state.stack_top(stage))
                    .find(|c| c.id == card.id)
            } else {
                state.visible_cards().find(|c| c.id == card.id)
            };
            MoveKind::Reserve { card: by_id(found, card)?, from_stack: *from_stack, takes_gold: *takes_gold }
        }

        MoveKind::Buy { card, payment, from_reserve } => {
            let found = if *from_reserve {
                player.reserved_cards.iter().find(|c| c.id == card.id)
            } else {
                state.visible_cards().find(|c| c.id == card.id)
            };
            MoveKind::Buy { card: by_id(found, card)?, payment: *payment, from_reserve: *from_reserve }
        }
    })
}

/// Check the action against the board and return the player's inventory after it.
fn validate_action(
    state: &GameState,
    player: &PlayerState,
    kind: &MoveKind,
) -> Result<StoneMap, GameError> {
    match kind {
        MoveKind::Take { tokens } => {
            if tokens[StoneType::Gold] > 0 {
                return Err(GameError::IllegalMove("gold cannot be taken directly"));
            }
            let trio = tokens.distinct() == 3 && tokens.total() == 3;
            let pair = tokens.distinct() == 1 && tokens.total() == 2;
            if !trio && !pair {
                return Err(GameError::IllegalMove("take three different stones or two of one"));
            }
            for (stone, count) in tokens.nonzero() {
                if state.pool[stone] < count {
                    return Err(GameError::ResourceDepleted { stone, holder: Holder::Pool });
                }
                if pair && state.pool[stone] < 4 {
                    return Err(GameError::IllegalMove(
                        "at least four stones of a color are needed to take two",
                    ));
                }
            }
            Ok(player.stones.plus(tokens))
        }

        MoveKind::Reserve { card, from_stack, takes_gold } => {
            if player.reserved_cards.len() >= MAX_RESERVED {
                return Err(GameError::ReservationLimit { limit: MAX_RESERVED });
            }
            let present = if *from_stack {
                state.stack_top(card.stage) == Some(card)
            } else {
                state.visible_slot(card).is_some()
            };
            if !present {
                return Err(GameError::CardUnavailable(card.id.0));
            }
            let mut after = player.stones;
            if *takes_gold {
                if state.pool[StoneType::Gold] == 0 {
                    return Err(GameError::ResourceDepleted {
                        stone: StoneType::Gold,
                        holder: Holder::Pool,
                    });
                }
                after[StoneType::Gold] += 1;
            }
            Ok(after)
        }

        MoveKind::Buy { card, payment, from_reserve } => {
            let present = if *from_reserve {
                player.reserved_cards.contains(card)
            } else {
                state.visible_slot(card).is_some()
            };
            if !present {
                return Err(GameError::CardUnavailable(card.id.0));
            }
            if !player.can_afford_card(card) {
                return Err(GameError::CannotAfford(card.to_string()));
            }
            if *payment != player.payment_for_card(card) {
                return Err(GameError::IllegalMove("payment does not match the price"));
            }
            player
                .stones
                .checked_minus(payment)
                .ok_or_else(|| GameError::CannotAfford(card.to_string()))
        }
    }
}

fn validate_returns(state: &GameState, mv: &Move, after_action: &StoneMap) -> Result<(), GameError> {
    let required = required_return(after_action);
    if mv.required_return != required || mv.returns.total() != required as u32 {
        return Err(GameError::IllegalMove("returned stones must bring the total back to ten"));
    }
    if !after_action.covers(&mv.returns) {
        let stone = mv
            .returns
            .nonzero()
            .find(|&(s, c)| after_action[s] < c)
            .map(|(s, _)| s)
            .unwrap_or(StoneType::Gold);
        return Err(GameError::ResourceDepleted { stone, holder: Holder::Player });
    }
    // The pool after the action must still have room for the returns.
    let mut pool = state.pool.checked_minus(&mv.tokens_gained()).unwrap_or(state.pool);
    if let MoveKind::Buy { payment, .. } = &mv.kind {
        pool = pool.plus(payment);
    }
    for (stone, count) in mv.returns.nonzero() {
        let supply = stone.initial_supply();
        if pool[stone] as u32 + count as u32 > supply as u32 {
            return Err(GameError::SupplyExceeded { stone, supply });
        }
    }
    Ok(())
}

fn perform_action(
    state: &mut GameState,
    slot: u8,
    kind: &MoveKind,
    round: u32,
    events: &mut Vec<GameEvent>,
) -> Result<(), GameError> {
    match kind {
        MoveKind::Take { tokens } => {
            for (stone, count) in tokens.nonzero() {
                for _ in 0..count {
                    state.take_stone(stone)?;
                    player_of(state, slot)?.take_stone(stone);
                }
            }
            events.push(GameEvent::new(round, slot, GameEventData::StonesTaken { tokens: *tokens }));
        }

        MoveKind::Reserve { card, from_stack, takes_gold } => {
            player_of(state, slot)?.reserve_card(card)?;
            if *from_stack {
                state.draw_from_stack(card.stage);
            } else {
                state.replace_card(card);
            }
            if *takes_gold {
                state.take_stone(StoneType::Gold)?;
                player_of(state, slot)?.take_stone(StoneType::Gold);
            }
            events.push(GameEvent::new(
                round,
                slot,
                GameEventData::CardReserved {
                    card: card.id,
                    from_stack: *from_stack,
                    took_gold: *takes_gold,
                },
            ));
        }

        MoveKind::Buy { card, from_reserve, .. } => {
            let paid = if *from_reserve {
                player_of(state, slot)?.buy_reserved_card(card)?
            } else {
                let paid = player_of(state, slot)?.buy_card(card)?;
                state.replace_card(card);
                paid
            };
            state.perform_payment(&paid)?;
            events.push(GameEvent::new(
                round,
                slot,
                GameEventData::CardBought { card: card.id, payment: paid, from_reserve: *from_reserve },
            ));
        }
    }
    Ok(())
}

/// The requested noble if claimable, otherwise the first claimable noble in row order.
fn pick_noble(
    state: &GameState,
    slot: u8,
    requested: Option<&Noble>,
) -> Result<Option<Noble>, GameError> {
    let player = state.player(slot).ok_or(GameError::UnknownSlot(slot))?;
    if let Some(requested) = requested {
        return match state.nobles.iter().flatten().find(|n| n.id == requested.id) {
            Some(noble) if player.check_noble_visit(noble) => Ok(Some(noble.clone())),
            Some(noble) => Err(GameError::CannotAfford(noble.to_string())),
            None => Err(GameError::CannotAfford(requested.to_string())),
        };
    }
    Ok(state
        .nobles
        .iter()
        .flatten()
        .find(|n| player.check_noble_visit(n))
        .cloned())
}

// =============================================================================
// TESTS
// =============================================================================

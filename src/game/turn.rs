//! Incremental Turns
//!
//! A human player builds a turn one click at a time: picking stones,
//! buying or reserving a card, shedding excess tokens and choosing a noble.
//! [`TurnBuilder`] validates each step against the rules and applies it
//! immediately, so every intermediate snapshot can be shared with the table.

use super::card::{Card, Noble, Stage};
use super::error::{GameError, Holder};
use super::player::{PlayerState, MAX_RESERVED, MAX_STONES};
use super::state::GameState;
use super::stones::{StoneMap, StoneType};

/// The action chosen so far this turn.
#[derive(Clone, Debug, PartialEq, Eq)]
enum PendingAction {
    Take(StoneMap),
    Reserve,
    Buy,
}

/// What the turn still needs before it can be finished.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnStatus {
    /// No complete action yet.
    InProgress,
    /// This many tokens must be returned first.
    MustReturn(u32),
    /// Several nobles are claimable; one must be chosen. Per-slot claimability.
    MustChooseNoble(Vec<bool>),
    /// The turn can be finished.
    Ready,
}

/// Step-by-step turn of one seat.
#[derive(Clone, Debug)]
pub struct TurnBuilder {
    slot: u8,
    action: Option<PendingAction>,
    noble_claimed: bool,
}

impl TurnBuilder {
    /// Start a turn for `slot`.
    pub fn new(slot: u8) -> Self {
        Self { slot, action: None, noble_claimed: false }
    }

    /// Seat building this turn.
    pub fn slot(&self) -> u8 {
        self.slot
    }

    fn player<'a>(&self, state: &'a GameState) -> Result<&'a PlayerState, GameError> {
        if !state.running {
            return Err(GameError::NotRunning);
        }
        if state.players_turn != self.slot {
            return Err(GameError::NotYourTurn { slot: self.slot });
        }
        state.player(self.slot).ok_or(GameError::UnknownSlot(self.slot))
    }

    fn player_mut<'a>(&self, state: &'a mut GameState) -> Result<&'a mut PlayerState, GameError> {
        state.player_mut(self.slot).ok_or(GameError::UnknownSlot(self.slot))
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Take one stone from the pool.
    pub fn pick_stone(&mut self, state: &mut GameState, stone: StoneType) -> Result<(), GameError> {
        self.player(state)?;
        let taken = match &self.action {
            None => StoneMap::EMPTY,
            Some(PendingAction::Take(tokens)) => *tokens,
            Some(_) => return Err(GameError::IllegalMove("cannot take a stone now")),
        };

        if stone.is_gold() {
            return Err(GameError::IllegalMove("gold only comes with a reservation"));
        }
        if taken[stone] >= 1 && state.pool[stone] <= 2 {
            return Err(GameError::IllegalMove(
                "at least four stones of a color are needed to take two",
            ));
        }
        if taken.nonzero().any(|(_, c)| c >= 2) {
            return Err(GameError::IllegalMove("already took two stones of one color"));
        }
        let distinct = taken.distinct();
        if distinct >= 3 {
            return Err(GameError::IllegalMove("already took three different stones"));
        }
        if distinct >= 2 && taken[stone] >= 1 {
            return Err(GameError::IllegalMove(
                "cannot take two of a color after picking different colors",
            ));
        }

        state.take_stone(stone)?;
        self.player_mut(state)?.take_stone(stone);

        let mut tokens = taken;
        tokens[stone] += 1;
        self.action = Some(PendingAction::Take(tokens));
        Ok(())
    }

    /// Buy a face-up card.
    pub fn buy_card(&mut self, state: &mut GameState, card: &Card) -> Result<StoneMap, GameError> {
        let player = self.player(state)?;
        if self.action.is_some() {
            return Err(GameError::IllegalMove("cannot buy a card now"));
        }
        let card = &board_card(state, card)?;
        if !player.can_afford_card(card) {
            return Err(GameError::CannotAfford(card.to_string()));
        }
        let payment = player.payment_for_card(card);
        check_room_in_pool(state, &payment)?;

        self.player_mut(state)?.buy_card(card)?;
        state.replace_card(card);
        state.perform_payment(&payment)?;
        self.action = Some(PendingAction::Buy);
        Ok(payment)
    }

    /// Buy a card out of the player's reserve.
    pub fn buy_reserved_card(&mut self, state: &mut GameState, card: &Card) -> Result<StoneMap, GameError> {
        let player = self.player(state)?;
        if self.action.is_some() {
            return Err(GameError::IllegalMove("cannot buy a card now"));
        }
        let card = &player
            .reserved_cards
            .iter()
            .find(|c| c.id == card.id)
            .cloned()
            .ok_or(GameError::CardUnavailable(card.id.0))?;
        if !player.can_afford_card(card) {
            return Err(GameError::CannotAfford(card.to_string()));
        }
        check_room_in_pool(state, &player.payment_for_card(card))?;

        let payment = self.player_mut(state)?.buy_reserved_card(card)?;
        state.perform_payment(&payment)?;
        self.action = Some(PendingAction::Buy);
        Ok(payment)
    }

    /// Reserve a face-up card, taking a gold token if any remain.
    pub fn reserve_card(&mut self, state: &mut GameState, card: &Card) -> Result<bool, GameError> {
        self.check_can_reserve(state)?;
        let card = &board_card(state, card)?;
        self.player_mut(state)?.reserve_card(card)?;
        state.replace_card(card);
        self.finish_reservation(state)
    }

    /// Reserve the top card of a stage's stack blind.
    pub fn reserve_from_stack(&mut self, state: &mut GameState, stage: Stage) -> Result<Card, GameError> {
        self.check_can_reserve(state)?;
        let card = state
            .stack_top(stage)
            .cloned()
            .ok_or(GameError::IllegalMove("that stack is empty"))?;
        self.player_mut(state)?.reserve_card(&card)?;
        state.draw_from_stack(stage);
        self.finish_reservation(state)?;
        Ok(card)
    }

    fn check_can_reserve(&self, state: &GameState) -> Result<(), GameError> {
        let player = self.player(state)?;
        if self.action.is_some() {
            return Err(GameError::IllegalMove("cannot reserve a card now"));
        }
        if player.reserved_cards.len() >= MAX_RESERVED {
            return Err(GameError::ReservationLimit { limit: MAX_RESERVED });
        }
        Ok(())
    }

    fn finish_reservation(&mut self, state: &mut GameState) -> Result<bool, GameError> {
        let got_gold = state.pool[StoneType::Gold] >= 1;
        if got_gold {
            state.take_stone(StoneType::Gold)?;
            self.player_mut(state)?.take_stone(StoneType::Gold);
        }
        self.action = Some(PendingAction::Reserve);
        Ok(got_gold)
    }

    /// Shed one token after a complete action left the player above the limit.
    pub fn return_stone(&mut self, state: &mut GameState, stone: StoneType) -> Result<(), GameError> {
        let player = self.player(state)?;
        if !self.is_action_complete(state) {
            return Err(GameError::IllegalMove("finish your action before returning stones"));
        }
        if player.total_stones() <= MAX_STONES {
            return Err(GameError::IllegalMove("no stones need to be returned"));
        }
        if player.stones[stone] == 0 {
            return Err(GameError::ResourceDepleted { stone, holder: Holder::Player });
        }
        check_room_in_pool(state, &StoneMap::of(&[(stone, 1)]))?;

        self.player_mut(state)?.return_stone(stone)?;
        state.return_stone(stone)
    }

    /// Accept a visit from `noble` once the action is complete.
    pub fn claim_noble(&mut self, state: &mut GameState, noble: &Noble) -> Result<(), GameError> {
        let player = self.player(state)?;
        if !self.is_action_complete(state) {
            return Err(GameError::IllegalMove("finish your action before a noble visits"));
        }
        if self.noble_claimed {
            return Err(GameError::IllegalMove("only one noble visits per turn"));
        }
        let noble = &state
            .nobles
            .iter()
            .flatten()
            .find(|n| n.id == noble.id)
            .cloned()
            .ok_or(GameError::IllegalMove("that noble is not on the board"))?;
        if !player.check_noble_visit(noble) {
            return Err(GameError::CannotAfford(noble.to_string()));
        }

        self.player_mut(state)?.obtain_noble(noble);
        state.remove_noble(noble);
        self.noble_claimed = true;
        Ok(())
    }

    // =========================================================================
    // Completion
    // =========================================================================

    /// Has a full action been taken?
    ///
    /// A take is complete once a pair or three colors are held, the pool has
    /// no gems left, or no further pick would be legal.
    pub fn is_action_complete(&self, state: &GameState) -> bool {
        let tokens = match &self.action {
            None => return false,
            Some(PendingAction::Reserve) | Some(PendingAction::Buy) => return true,
            Some(PendingAction::Take(tokens)) => tokens,
        };

        let gems_left: u32 = StoneType::GEMS.iter().map(|&s| state.pool[s] as u32).sum();
        if gems_left == 0 {
            return true;
        }
        if tokens.nonzero().any(|(_, c)| c >= 2) {
            return true;
        }
        let distinct = tokens.distinct();
        if distinct >= 3 {
            return true;
        }
        for stone in StoneType::GEMS {
            if state.pool[stone] == 0 {
                continue;
            }
            if tokens[stone] == 0 {
                return false;
            }
            if distinct == 1 && state.pool[stone] >= 3 {
                return false;
            }
        }
        true
    }

    /// What the turn still needs.
    pub fn status(&self, state: &GameState) -> TurnStatus {
        if !self.is_action_complete(state) {
            return TurnStatus::InProgress;
        }
        let Some(player) = state.player(self.slot) else {
            return TurnStatus::InProgress;
        };
        let excess = player.total_stones().saturating_sub(MAX_STONES);
        if excess > 0 {
            return TurnStatus::MustReturn(excess);
        }
        if !self.noble_claimed {
            let selection = player.noble_selection(&state.nobles);
            if selection.iter().filter(|&&c| c).count() >= 2 {
                return TurnStatus::MustChooseNoble(selection);
            }
        }
        TurnStatus::Ready
    }

    /// Close the turn: claim a lone claimable noble and pass play on.
    pub fn finish(self, state: &mut GameState) -> Result<Option<Noble>, GameError> {
        self.player(state)?;
        if self.status(state) != TurnStatus::Ready {
            return Err(GameError::IllegalMove("the turn is not complete"));
        }

        let mut visited = None;
        if !self.noble_claimed {
            let lone = state
                .player(self.slot)
                .and_then(|p| state.nobles.iter().flatten().find(|n| p.check_noble_visit(n)))
                .cloned();
            if let Some(noble) = lone {
                self.player_mut(state)?.obtain_noble(&noble);
                state.remove_noble(&noble);
                visited = Some(noble);
            }
        }

        state.next_turn();
        Ok(visited)
    }
}

/// Face-up card with the id of `card`, as the board holds it.
fn board_card(state: &GameState, card: &Card) -> Result<Card, GameError> {
    state
        .visible_cards()
        .find(|c| c.id == card.id)
        .cloned()
        .ok_or(GameError::CardUnavailable(card.id.0))
}

fn check_room_in_pool(state: &GameState, incoming: &StoneMap) -> Result<(), GameError> {
    for (stone, count) in incoming.nonzero() {
        let supply = stone.initial_supply();
        if state.pool[stone] as u32 + count as u32 > supply as u32 {
            return Err(GameError::SupplyExceeded { stone, supply });
        }
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::tests::running_table;
    use crate::game::state::TOTAL_STONES;

    #[test]
    fn test_three_distinct_then_finish() {
        let mut state = running_table(1);
        let slot = state.players_turn;
        let mut turn = TurnBuilder::new(slot);

        turn.pick_stone(&mut state, StoneType::Red).unwrap();
        assert_eq!(turn.status(&state), TurnStatus::InProgress);
        turn.pick_stone(&mut state, StoneType::Blue).unwrap();
        turn.pick_stone(&mut state, StoneType::Green).unwrap();
        assert_eq!(turn.status(&state), TurnStatus::Ready);

        assert_eq!(
            turn.pick_stone(&mut state, StoneType::White),
            Err(GameError::IllegalMove("already took three different stones"))
        );

        turn.finish(&mut state).unwrap();
        assert_ne!(state.players_turn, slot);
        assert_eq!(state.total_stones_in_play(), TOTAL_STONES);
    }

    #[test]
    fn test_pair_rules() {
        let mut state = running_table(1);
        let slot = state.players_turn;
        let mut turn = TurnBuilder::new(slot);

        turn.pick_stone(&mut state, StoneType::Red).unwrap();
        turn.pick_stone(&mut state, StoneType::Red).unwrap();
        assert!(turn.is_action_complete(&state));
        assert_eq!(
            turn.pick_stone(&mut state, StoneType::Blue),
            Err(GameError::IllegalMove("already took two stones of one color"))
        );
    }

    #[test]
    fn test_pair_needs_four_in_pool() {
        let mut state = running_table(1);
        let slot = state.players_turn;
        state.pool[StoneType::Black] = 3;
        let mut turn = TurnBuilder::new(slot);

        turn.pick_stone(&mut state, StoneType::Black).unwrap();
        assert!(matches!(
            turn.pick_stone(&mut state, StoneType::Black),
            Err(GameError::IllegalMove(_))
        ));
    }

    #[test]
    fn test_no_pair_after_two_colors() {
        let mut state = running_table(1);
        let mut turn = TurnBuilder::new(state.players_turn);

        turn.pick_stone(&mut state, StoneType::Red).unwrap();
        turn.pick_stone(&mut state, StoneType::Blue).unwrap();
        assert_eq!(
            turn.pick_stone(&mut state, StoneType::Red),
            Err(GameError::IllegalMove(
                "cannot take two of a color after picking different colors"
            ))
        );
    }

    #[test]
    fn test_not_your_turn() {
        let mut state = running_table(1);
        let other = (state.players_turn + 1) % 4;
        let mut turn = TurnBuilder::new(other);
        assert_eq!(
            turn.pick_stone(&mut state, StoneType::Red),
            Err(GameError::NotYourTurn { slot: other })
        );
    }

    #[test]
    fn test_buy_only_as_first_action() {
        let mut state = running_table(1);
        let card = state.deck(Stage::One)[0].clone().unwrap();
        let mut turn = TurnBuilder::new(state.players_turn);

        turn.pick_stone(&mut state, StoneType::Red).unwrap();
        assert_eq!(
            turn.buy_card(&mut state, &card),
            Err(GameError::IllegalMove("cannot buy a card now"))
        );
    }

    #[test]
    fn test_reserve_limit_reported() {
        let mut state = running_table(1);
        let slot = state.players_turn;
        let reserved: Vec<Card> = state.stacks[0].iter().take(3).cloned().collect();
        state.player_mut(slot).unwrap().reserved_cards = reserved;
        let card = state.deck(Stage::One)[0].clone().unwrap();
        let before = state.clone();

        let mut turn = TurnBuilder::new(slot);
        assert_eq!(
            turn.reserve_card(&mut state, &card),
            Err(GameError::ReservationLimit { limit: MAX_RESERVED })
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_reserve_then_return_excess() {
        let mut state = running_table(2);
        let slot = state.players_turn;
        let held = StoneMap::of(&[(StoneType::White, 5), (StoneType::Blue, 5)]);
        state.pool = state.pool.checked_minus(&held).unwrap();
        state.player_mut(slot).unwrap().stones = held;

        let mut turn = TurnBuilder::new(slot);
        let card = state.deck(Stage::Three)[1].clone().unwrap();
        assert!(turn.reserve_card(&mut state, &card).unwrap());
        assert_eq!(turn.status(&state), TurnStatus::MustReturn(1));
        assert!(matches!(turn.clone().finish(&mut state.clone()), Err(GameError::IllegalMove(_))));

        turn.return_stone(&mut state, StoneType::White).unwrap();
        assert_eq!(turn.status(&state), TurnStatus::Ready);
        assert_eq!(
            turn.return_stone(&mut state, StoneType::White),
            Err(GameError::IllegalMove("no stones need to be returned"))
        );
        turn.finish(&mut state).unwrap();
        assert_eq!(state.total_stones_in_play(), TOTAL_STONES);
    }

    #[test]
    fn test_noble_requires_complete_action_and_bonuses() {
        let mut state = running_table(3);
        let slot = state.players_turn;
        let noble = state.nobles[0].clone().unwrap();
        let mut turn = TurnBuilder::new(slot);

        assert!(matches!(turn.claim_noble(&mut state, &noble), Err(GameError::IllegalMove(_))));

        turn.pick_stone(&mut state, StoneType::Red).unwrap();
        turn.pick_stone(&mut state, StoneType::Red).unwrap();
        assert!(matches!(turn.claim_noble(&mut state, &noble), Err(GameError::CannotAfford(_))));
    }

    #[test]
    fn test_take_complete_when_pool_runs_dry() {
        let mut state = running_table(4);
        let slot = state.players_turn;
        for stone in [StoneType::White, StoneType::Blue, StoneType::Green, StoneType::Black] {
            let count = state.pool[stone];
            state.pool[stone] = 0;
            state.player_mut((slot + 1) % 4).unwrap().stones[stone] = count;
        }
        state.pool[StoneType::Red] = 1;
        state.player_mut((slot + 2) % 4).unwrap().stones[StoneType::Red] = 6;

        let mut turn = TurnBuilder::new(slot);
        turn.pick_stone(&mut state, StoneType::Red).unwrap();
        assert!(turn.is_action_complete(&state));
    }

    #[test]
    fn test_forged_card_uses_board_copy() {
        let mut state = running_table(4);
        let slot = state.players_turn;
        let real = state.deck(Stage::Three)[1].clone().unwrap();
        let mut forged = real.clone();
        forged.cost = StoneMap::EMPTY;
        forged.prestige = 20;
        let before = state.clone();

        let mut turn = TurnBuilder::new(slot);
        assert!(matches!(turn.buy_card(&mut state, &forged), Err(GameError::CannotAfford(_))));
        assert_eq!(state, before);

        turn.reserve_card(&mut state, &forged).unwrap();
        let reserved = &state.player(slot).unwrap().reserved_cards[0];
        assert_eq!(reserved.cost, real.cost);
        assert_eq!(reserved.prestige, real.prestige);
    }
}

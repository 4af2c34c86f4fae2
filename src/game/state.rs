//! Game State
//!
//! The board authority: shared pool, visible decks and draw stacks, the
//! noble row, seats, turn order and the win check. Every mutating operation
//! checks its preconditions first and leaves the state untouched on error.

use serde::{Serialize, Deserialize};

use crate::core::hash::{StateHash, compute_state_hash};
use crate::core::rng::DeterministicRng;
use super::card::{stage_catalog, noble_catalog, Card, Noble, Stage, NOBLES_PER_GAME, VISIBLE_PER_STAGE};
use super::chat::Chat;
use super::error::{GameError, Holder};
use super::player::PlayerState;
use super::stones::{StoneMap, StoneType};

/// Seats at a table.
pub const PLAYER_COUNT: usize = 4;

/// Prestige needed to win.
pub const WIN_PRESTIGE: u32 = 15;

/// Total tokens in existence for a session.
pub const TOTAL_STONES: u32 = 40;

/// Face-up row of one stage. `None` marks a slot whose stack ran dry.
pub type CardRow = [Option<Card>; VISIBLE_PER_STAGE];

/// Noble row. Claimed nobles leave a permanent `None` gap.
pub type NobleRow = [Option<Noble>; NOBLES_PER_GAME];

// =============================================================================
// GAME STATE
// =============================================================================

/// Complete state of one game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Seats in slot order (index == slot).
    pub players: Vec<PlayerState>,

    /// Slot of the active player.
    pub players_turn: u8,

    /// Slot that opened the game.
    pub starting_player: u8,

    /// Round counter. Increments when play returns to the starting player.
    pub turn_number: u32,

    /// Has the game been started?
    pub running: bool,

    /// Face-up rows for stages one to three.
    pub decks: [CardRow; 3],

    /// Draw stacks for stages one to three. The top is the last element.
    pub stacks: [Vec<Card>; 3],

    /// Noble row.
    pub nobles: NobleRow,

    /// Shared token supply.
    pub pool: StoneMap,

    /// Session chat.
    pub chat: Chat,

    /// Shuffle source, carried along so a reset deals reproducibly.
    rng: DeterministicRng,
}

impl GameState {
    /// Create an empty table with a freshly dealt board.
    pub fn new(seed: u64) -> Self {
        let mut state = Self {
            players: Vec::with_capacity(PLAYER_COUNT),
            players_turn: 0,
            starting_player: 0,
            turn_number: 0,
            running: false,
            decks: Default::default(),
            stacks: Default::default(),
            nobles: Default::default(),
            pool: StoneMap::initial_pool(),
            chat: Chat::default(),
            rng: DeterministicRng::new(seed),
        };
        state.deal_board();
        state
    }

    /// Shuffle every stage, deal four face up each, and pick five nobles.
    fn deal_board(&mut self) {
        for stage in Stage::ALL {
            let mut stack = stage_catalog(stage);
            self.rng.shuffle(&mut stack);
            self.decks[stage.index()] = std::array::from_fn(|_| stack.pop());
            self.stacks[stage.index()] = stack;
        }

        let mut nobles = noble_catalog();
        self.rng.shuffle(&mut nobles);
        nobles.truncate(NOBLES_PER_GAME);
        let mut dealt = nobles.into_iter();
        self.nobles = std::array::from_fn(|_| dealt.next());

        self.pool = StoneMap::initial_pool();
    }

    // =========================================================================
    // Seats
    // =========================================================================

    /// Seat by slot.
    pub fn player(&self, slot: u8) -> Option<&PlayerState> {
        self.players.get(slot as usize)
    }

    /// Mutable seat by slot.
    pub fn player_mut(&mut self, slot: u8) -> Option<&mut PlayerState> {
        self.players.get_mut(slot as usize)
    }

    /// Seat whose turn it is.
    pub fn active_player(&self) -> Option<&PlayerState> {
        self.player(self.players_turn)
    }

    /// Append a seat, assigning the next slot. Returns that slot.
    pub fn seat_player(&mut self, mut player: PlayerState) -> u8 {
        let slot = self.players.len() as u8;
        player.slot = slot;
        self.players.push(player);
        slot
    }

    /// Remove a seat and shift every later slot down by one.
    pub fn unseat_player(&mut self, slot: u8) -> Option<PlayerState> {
        if slot as usize >= self.players.len() {
            return None;
        }
        let removed = self.players.remove(slot as usize);
        for (index, player) in self.players.iter_mut().enumerate() {
            player.slot = index as u8;
        }
        Some(removed)
    }

    // =========================================================================
    // Pool
    // =========================================================================

    /// Take one token out of the pool.
    pub fn take_stone(&mut self, stone: StoneType) -> Result<(), GameError> {
        if self.pool[stone] == 0 {
            return Err(GameError::ResourceDepleted { stone, holder: Holder::Pool });
        }
        self.pool[stone] -= 1;
        Ok(())
    }

    /// Put one token back into the pool.
    ///
    /// Refuses to exceed the color's initial supply.
    pub fn return_stone(&mut self, stone: StoneType) -> Result<(), GameError> {
        let supply = stone.initial_supply();
        if self.pool[stone] >= supply {
            return Err(GameError::SupplyExceeded { stone, supply });
        }
        self.pool[stone] += 1;
        Ok(())
    }

    /// Credit a purchase payment (gold included) to the pool.
    ///
    /// The payer's holdings are the caller's concern. All-or-nothing.
    pub fn perform_payment(&mut self, payment: &StoneMap) -> Result<(), GameError> {
        for (stone, count) in payment.nonzero() {
            let supply = stone.initial_supply();
            if self.pool[stone] as u32 + count as u32 > supply as u32 {
                return Err(GameError::SupplyExceeded { stone, supply });
            }
        }
        self.pool = self.pool.plus(payment);
        Ok(())
    }

    /// Tokens left in the pool, gold included.
    pub fn total_stones_available(&self) -> u32 {
        self.pool.total()
    }

    /// Pool plus every inventory. Constant at [`TOTAL_STONES`] for valid play.
    pub fn total_stones_in_play(&self) -> u32 {
        self.pool.total() + self.players.iter().map(|p| p.total_stones()).sum::<u32>()
    }

    // =========================================================================
    // Cards and nobles
    // =========================================================================

    /// Face-up row of a stage.
    pub fn deck(&self, stage: Stage) -> &CardRow {
        &self.decks[stage.index()]
    }

    /// Card on top of a stage's draw stack.
    pub fn stack_top(&self, stage: Stage) -> Option<&Card> {
        self.stacks[stage.index()].last()
    }

    /// Remove and return the top of a stage's draw stack.
    pub fn draw_from_stack(&mut self, stage: Stage) -> Option<Card> {
        self.stacks[stage.index()].pop()
    }

    /// Slot index of a face-up card in its stage row.
    pub fn visible_slot(&self, card: &Card) -> Option<usize> {
        self.deck(card.stage)
            .iter()
            .position(|slot| slot.as_ref() == Some(card))
    }

    /// Every face-up card, stage by stage, skipping empty slots.
    pub fn visible_cards(&self) -> impl Iterator<Item = &Card> {
        self.decks.iter().flatten().flatten()
    }

    /// Refill the slot `card` occupied from its stage's stack.
    ///
    /// Leaves `None` when the stack is empty. No-op (returns `false`) if the
    /// card is not face up.
    pub fn replace_card(&mut self, card: &Card) -> bool {
        let Some(index) = self.visible_slot(card) else {
            return false;
        };
        let stage = card.stage.index();
        self.decks[stage][index] = self.stacks[stage].pop();
        true
    }

    /// Clear a noble's slot. The gap is never compacted.
    pub fn remove_noble(&mut self, noble: &Noble) -> bool {
        match self.nobles.iter_mut().find(|slot| slot.as_ref() == Some(noble)) {
            Some(slot) => {
                *slot = None;
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Turn flow
    // =========================================================================

    /// Pass play to the next seat; counts a round when play returns to the starter.
    pub fn next_turn(&mut self) {
        self.players_turn = (self.players_turn + 1) % PLAYER_COUNT as u8;
        if self.players_turn == self.starting_player {
            self.turn_number += 1;
        }
    }

    /// Start play. The youngest human opens; with no humans seated, slot 0.
    pub fn start_game(&mut self) -> Result<(), GameError> {
        if self.players.len() < PLAYER_COUNT {
            return Err(GameError::NotEnoughPlayers {
                required: PLAYER_COUNT,
                present: self.players.len(),
            });
        }

        let starter = self
            .players
            .iter()
            .filter_map(|p| p.age().map(|age| (age, p.slot)))
            .min_by_key(|&(age, _)| age)
            .map(|(_, slot)| slot)
            .unwrap_or(0);

        self.starting_player = starter;
        self.players_turn = starter;
        self.running = true;
        Ok(())
    }

    /// Deal a fresh board for a rematch.
    ///
    /// Seats, names, AI tiers and backing identities survive; holdings do not.
    pub fn reset(&mut self) {
        self.deal_board();
        for player in &mut self.players {
            player.clear_holdings();
        }
        self.running = false;
        self.players_turn = self.starting_player;
        self.turn_number = 0;
    }

    /// First seat (slot order) at or above [`WIN_PRESTIGE`].
    pub fn check_win(&self) -> Option<&PlayerState> {
        self.players.iter().find(|p| p.prestige() >= WIN_PRESTIGE)
    }

    /// Every seat at or above [`WIN_PRESTIGE`].
    pub fn winners(&self) -> Vec<u8> {
        self.players
            .iter()
            .filter(|p| p.prestige() >= WIN_PRESTIGE)
            .map(|p| p.slot)
            .collect()
    }

    /// Compute a fingerprint of the board for cross-checking snapshots.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.turn_number, self.players_turn, |hasher| {
            hasher.update_bool(self.running);
            hasher.update_u8(self.starting_player);

            for (_, count) in self.pool.iter() {
                hasher.update_u8(count);
            }

            for row in &self.decks {
                for slot in row {
                    hasher.update_slot(slot.as_ref().map(|c| c.id.0));
                }
            }
            for stack in &self.stacks {
                hasher.update_u32(stack.len() as u32);
                for card in stack {
                    hasher.update_u16(card.id.0);
                }
            }
            for slot in &self.nobles {
                hasher.update_slot(slot.as_ref().map(|n| n.id.0 as u16));
            }

            for player in &self.players {
                hasher.update_u8(player.slot);
                hasher.update_str(&player.name);
                for (_, count) in player.stones.iter() {
                    hasher.update_u8(count);
                }
                hasher.update_u32(player.owned_cards.len() as u32);
                for card in &player.owned_cards {
                    hasher.update_u16(card.id.0);
                }
                hasher.update_u32(player.reserved_cards.len() as u32);
                for card in &player.reserved_cards {
                    hasher.update_u16(card.id.0);
                }
                hasher.update_u32(player.nobles.len() as u32);
                for noble in &player.nobles {
                    hasher.update_u8(noble.id.0);
                }
            }

            hasher.update_u32(self.chat.len() as u32);
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! Client Side
//!
//! Two pieces a participant needs on its side of the connection:
//!
//! - [`JoinWaiter`]: waits for the server's verdict on a join request, with a
//!   deadline. A verdict arriving after the deadline is dropped.
//! - [`AiClient`]: turns state broadcasts into the messages an AI seat sends
//!   back, pacing itself to one move per round and answering greetings.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::core::rng::DeterministicRng;
use crate::game::ai::decide_move;
use crate::game::chat::ChatMessage;
use crate::game::player::{AiDifficulty, PlayerState};
use crate::network::protocol::{ClientMessage, JoinStatus, ServerMessage, StateUpdate};
use crate::network::server::{ConnectionId, GameServer, ServerError};
use crate::network::session::SessionId;

/// Replies an AI picks from when greeted.
pub const GREETING_REPLIES: [&str; 5] = ["Hello", "Hi", "Hey", "Greetings", "Howdy"];

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// How long to wait for a join verdict.
    pub join_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            join_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Read overrides from `GEM_COURT_JOIN_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            join_timeout: std::env::var("GEM_COURT_JOIN_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.join_timeout),
        }
    }
}

// =============================================================================
// JOIN WAIT
// =============================================================================

/// Join failures on the client side.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    /// No verdict before the deadline.
    #[error("no response from the server within {0:?}")]
    TimedOut(Duration),

    /// The server refused the seat.
    #[error("join rejected: {0:?}")]
    Rejected(JoinStatus),

    /// The connection went away before a verdict.
    #[error("connection closed before the join was answered")]
    Abandoned,

    /// The request could not be delivered.
    #[error("join request failed: {0}")]
    Request(String),
}

/// Server verdict on a join.
pub type JoinVerdict = (JoinStatus, Option<PlayerState>);

/// Sending half: resolved by whoever reads the connection.
#[derive(Debug)]
pub struct JoinResolver {
    tx: oneshot::Sender<JoinVerdict>,
}

impl JoinResolver {
    /// Deliver the verdict. Returns `false` if the waiter already gave up.
    pub fn resolve(self, status: JoinStatus, player: Option<PlayerState>) -> bool {
        self.tx.send((status, player)).is_ok()
    }
}

/// Receiving half.
#[derive(Debug)]
pub struct JoinWaiter {
    rx: oneshot::Receiver<JoinVerdict>,
}

/// Create a linked resolver and waiter.
pub fn join_channel() -> (JoinResolver, JoinWaiter) {
    let (tx, rx) = oneshot::channel();
    (JoinResolver { tx }, JoinWaiter { rx })
}

impl JoinWaiter {
    /// Wait up to `timeout` for the verdict. Returns the seat as placed.
    pub async fn wait(self, timeout: Duration) -> Result<PlayerState, JoinError> {
        match tokio::time::timeout(timeout, self.rx).await {
            Err(_) => Err(JoinError::TimedOut(timeout)),
            Ok(Err(_)) => Err(JoinError::Abandoned),
            Ok(Ok((JoinStatus::Success, Some(player)))) => Ok(player),
            Ok(Ok((JoinStatus::Success, None))) => Err(JoinError::Abandoned),
            Ok(Ok((status, _))) => Err(JoinError::Rejected(status)),
        }
    }
}

// =============================================================================
// AI CLIENT
// =============================================================================

/// Decision loop of one AI seat.
#[derive(Debug, Clone)]
pub struct AiClient {
    session_id: SessionId,
    name: String,
    difficulty: AiDifficulty,
    rng: DeterministicRng,
    /// Round in which the next move is due.
    turn_number: u32,
    /// Armed once a game reached round one; the next round-zero state resets pacing.
    new_game: bool,
    /// Greetings left before this seat replies. Set on the first update.
    greet_back_in: Option<i32>,
    /// Chat messages already looked at.
    seen_messages: usize,
}

impl AiClient {
    /// Drive the AI seated as `seat`. `None` for human seats.
    pub fn new(session_id: SessionId, seat: &PlayerState, seed: u64) -> Option<Self> {
        let difficulty = seat.difficulty()?;
        Some(Self {
            session_id,
            name: seat.name.clone(),
            difficulty,
            rng: DeterministicRng::new(seed),
            turn_number: 0,
            new_game: true,
            greet_back_in: None,
            seen_messages: 0,
        })
    }

    /// Seat name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// React to a broadcast. Returns the messages to send, in order.
    pub fn on_state_update(&mut self, update: &StateUpdate) -> Vec<ClientMessage> {
        let state = &update.state;
        let mut out = Vec::new();

        // Slots shift when someone ahead leaves; AI names are unique.
        let Some(me) = state.players.iter().find(|p| p.name == self.name) else {
            return out;
        };
        let slot = me.slot;

        if self.greet_back_in.is_none() {
            let humans_ahead = state.players.iter().filter(|p| !p.is_ai() && p.slot < slot).count();
            self.greet_back_in = Some(slot as i32 - humans_ahead as i32);
        }

        if self.new_game && state.turn_number == 0 {
            self.turn_number = 0;
            self.new_game = false;
        }
        if state.turn_number == 1 {
            self.new_game = true;
        }

        if let Some(reply) = self.answer_greetings(update) {
            out.push(reply);
        }

        if !state.running {
            return out;
        }
        if let Some(winner) = state.check_win() {
            debug!(ai = %self.name, winner = %winner.name, "game decided");
            self.new_game = true;
            self.turn_number = 0;
            return out;
        }

        if state.players_turn == slot && self.turn_number == state.turn_number {
            self.turn_number += 1;
            match decide_move(state, self.difficulty, &mut self.rng) {
                Ok(mv) => out.push(ClientMessage::PlayMove { session_id: self.session_id, slot, mv }),
                Err(error) => warn!(ai = %self.name, %error, "no move to play"),
            }
        }
        out
    }

    fn answer_greetings(&mut self, update: &StateUpdate) -> Option<ClientMessage> {
        let messages = update.state.chat.messages();
        let fresh = messages.get(self.seen_messages..).unwrap_or_default();
        let greetings = fresh.iter().filter(|m| m.is_greeting()).count();
        self.seen_messages = messages.len();

        let mut reply = None;
        for _ in 0..greetings {
            let queue = self.greet_back_in.get_or_insert(0);
            if *queue == 0 {
                let text = self.rng.choose(&GREETING_REPLIES).copied().unwrap_or("Hello");
                let mut state = update.state.clone();
                state.chat.write_message(ChatMessage::new(self.name.clone(), text));
                reply = Some(ClientMessage::PlayerAction {
                    session_id: self.session_id,
                    slot: state.players.iter().find(|p| p.name == self.name).map_or(0, |p| p.slot),
                    state,
                    base_version: Some(update.version),
                });
            }
            *queue -= 1;
        }
        reply
    }
}

// =============================================================================
// PARTICIPANT
// =============================================================================

/// Seat an AI on its own connection and drive it until the session ends.
///
/// Resolves once the server has answered the join; the returned task keeps
/// playing in the background.
pub async fn spawn_ai_participant(
    server: Arc<GameServer>,
    session_id: SessionId,
    difficulty: AiDifficulty,
    seed: u64,
    config: &ClientConfig,
) -> Result<(PlayerState, JoinHandle<()>), JoinError> {
    let (connection, rx) = server.connect().await;
    let (resolver, waiter) = join_channel();

    let task = tokio::spawn(pump(server.clone(), connection, rx, resolver, session_id, seed));

    let request = ClientMessage::JoinSession { session_id, player: PlayerState::ai(0, "", difficulty) };
    if let Err(error) = server.handle_message(connection, request).await {
        task.abort();
        return Err(JoinError::Request(error.to_string()));
    }

    match waiter.wait(config.join_timeout).await {
        Ok(seat) => {
            info!(session = session_id, ai = %seat.name, slot = seat.slot, "AI seated");
            Ok((seat, task))
        }
        Err(error) => {
            task.abort();
            server.disconnect(connection).await;
            Err(error)
        }
    }
}

async fn pump(
    server: Arc<GameServer>,
    connection: ConnectionId,
    mut rx: mpsc::Receiver<ServerMessage>,
    resolver: JoinResolver,
    session_id: SessionId,
    seed: u64,
) {
    let mut resolver = Some(resolver);
    let mut client: Option<AiClient> = None;

    while let Some(msg) = rx.recv().await {
        match msg {
            ServerMessage::JoinResult { status, player, .. } => {
                if let Some(seat) = &player {
                    client = AiClient::new(session_id, seat, seed);
                }
                if let Some(resolver) = resolver.take() {
                    if !resolver.resolve(status, player) {
                        debug!(session = session_id, "join verdict arrived after the deadline");
                    }
                }
            }
            ServerMessage::StateUpdate(update) => {
                let Some(client) = client.as_mut() else { continue };
                for reply in client.on_state_update(&update) {
                    if let Err(error) = server.handle_message(connection, reply).await {
                        log_rejection(client.name(), &error);
                    }
                }
            }
            ServerMessage::SessionClosed { .. } => break,
            ServerMessage::GameResults { .. } | ServerMessage::SessionCreated { .. } | ServerMessage::Error(_) => {}
        }
    }

    server.disconnect(connection).await;
}

fn log_rejection(name: &str, error: &ServerError) {
    warn!(ai = %name, %error, "AI request rejected");
}

// =============================================================================
// TESTS
// =============================================================================

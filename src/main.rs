//! Gem Court Server
//!
//! Demo table: one scripted human seat against three AI participants, each on
//! its own connection, played to a win through the session server.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gem_court::{
    VERSION,
    core::rng::DeterministicRng,
    game::{chat::ChatMessage, decide_move, AiDifficulty, PlayerState, User},
    network::{
        spawn_ai_participant, ClientConfig, ClientMessage, ConnectionId, GameServer, InMemoryDirectory,
        InMemoryStats, ServerConfig, ServerMessage, SessionConfig, SessionId, SessionRegistry, StateUpdate,
    },
};

/// Silence after which the table is considered stuck.
const IDLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Rounds after which the demo calls the game regardless.
const MAX_ROUNDS: u32 = 120;

const HOST_SLOT: u8 = 0;
const HOST_NAME: &str = "demo";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Gem Court Server v{}", VERSION);
    demo_table().await
}

/// Seat the table, exchange greetings, play to a win and report the results.
async fn demo_table() -> Result<()> {
    let session_config = SessionConfig::from_env();
    let seed = session_config.base_seed;
    let registry = SessionRegistry::new(
        session_config,
        Arc::new(InMemoryDirectory::new()),
        Arc::new(InMemoryStats::new()),
    );
    let server = Arc::new(GameServer::new(ServerConfig::from_env(), Arc::new(registry)));
    let client_config = ClientConfig::from_env();

    let (host, mut rx) = server.connect().await;
    server.handle_message(host, ClientMessage::CreateSession { multiplayer: false }).await?;
    let session_id = match next(&mut rx).await? {
        Some(ServerMessage::SessionCreated { session_id }) => session_id,
        other => bail!("unexpected reply to create_session: {other:?}"),
    };
    info!(session = session_id, seed, "=== Demo table ===");

    let user = User { id: 1, username: HOST_NAME.into(), age: 25 };
    let player = PlayerState::human(0, user);
    server.handle_message(host, ClientMessage::JoinSession { session_id, player }).await?;

    let mut participants = Vec::new();
    let tiers = [AiDifficulty::Easy, AiDifficulty::Medium, AiDifficulty::Hard];
    for (i, difficulty) in tiers.into_iter().enumerate() {
        let (seat, task) = spawn_ai_participant(server.clone(), session_id, difficulty, seed ^ i as u64, &client_config)
            .await
            .with_context(|| format!("seating the {difficulty:?} opponent"))?;
        info!(slot = seat.slot, name = %seat.name, "opponent seated");
        participants.push(task);
    }

    greet(&server, host, session_id).await?;

    let mut rng = DeterministicRng::new(seed);
    let mut started = false;
    let mut finished = false;
    let mut played_round = None;

    loop {
        let msg = match next(&mut rx).await? {
            Some(msg) => msg,
            None if !started => {
                warn!("not every opponent answered the greeting");
                start(&server, host, session_id, &mut started).await?;
                continue;
            }
            None => bail!("table went quiet mid-game"),
        };

        match msg {
            ServerMessage::StateUpdate(update) if !started => {
                if greeting_replies(&update) >= tiers.len() {
                    start(&server, host, session_id, &mut started).await?;
                }
            }
            ServerMessage::StateUpdate(update) => {
                if finished || !update.state.running {
                    continue;
                }
                if let Some(winner) = update.state.check_win() {
                    info!(
                        winner = %winner.name,
                        prestige = winner.prestige(),
                        rounds = update.state.turn_number,
                        "=== Game decided ==="
                    );
                    info!("Final State Hash: {}", update.state_hash);
                    finished = true;
                    server.handle_message(host, ClientMessage::GameOver { session_id }).await?;
                    continue;
                }
                if update.state.turn_number >= MAX_ROUNDS {
                    warn!(rounds = update.state.turn_number, "calling the game without a winner");
                    finished = true;
                    server.handle_message(host, ClientMessage::GameOver { session_id }).await?;
                    continue;
                }
                if update.state.players_turn == HOST_SLOT && played_round != Some(update.state.turn_number) {
                    played_round = Some(update.state.turn_number);
                    let mv = decide_move(&update.state, AiDifficulty::Hard, &mut rng)?;
                    let msg = ClientMessage::PlayMove { session_id, slot: HOST_SLOT, mv };
                    server.handle_message(host, msg).await?;
                }
            }
            ServerMessage::GameResults { records, .. } => {
                info!("=== Results ===");
                for record in &records {
                    info!(
                        "#{}: user {} - {} cards, {} tokens left",
                        record.placement,
                        record.user_id,
                        record.cards_bought,
                        record.tokens.total()
                    );
                }
                server.handle_message(host, ClientMessage::LeaveSession { session_id, slot: HOST_SLOT }).await?;
            }
            ServerMessage::SessionClosed { .. } => break,
            ServerMessage::Error(info) => warn!(code = ?info.code, "{}", info.message),
            ServerMessage::JoinResult { .. } | ServerMessage::SessionCreated { .. } => {}
        }
    }

    for task in participants {
        task.await?;
    }
    info!(sessions = server.session_count().await, "demo finished");
    Ok(())
}

/// Next message, or `None` after [`IDLE_TIMEOUT`] of silence.
async fn next(rx: &mut mpsc::Receiver<ServerMessage>) -> Result<Option<ServerMessage>> {
    match tokio::time::timeout(IDLE_TIMEOUT, rx.recv()).await {
        Ok(Some(msg)) => Ok(Some(msg)),
        Ok(None) => bail!("server dropped the connection"),
        Err(_) => Ok(None),
    }
}

async fn greet(server: &GameServer, host: ConnectionId, session_id: SessionId) -> Result<()> {
    let snapshot = server.registry().session(session_id).await.context("session vanished")?;
    let mut state = snapshot.state;
    state.chat.write_message(ChatMessage::new(HOST_NAME, "Hello"));
    let msg = ClientMessage::PlayerAction {
        session_id,
        slot: HOST_SLOT,
        state,
        base_version: Some(snapshot.version),
    };
    server.handle_message(host, msg).await?;
    Ok(())
}

async fn start(server: &GameServer, host: ConnectionId, session_id: SessionId, started: &mut bool) -> Result<()> {
    *started = true;
    server.handle_message(host, ClientMessage::StartGame { session_id }).await?;
    Ok(())
}

fn greeting_replies(update: &StateUpdate) -> usize {
    update
        .state
        .chat
        .messages()
        .iter()
        .filter(|m| m.sender != HOST_NAME && m.is_greeting())
        .count()
}

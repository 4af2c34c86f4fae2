//! Game Server
//!
//! In-process dispatcher between connections and the session registry.
//! Each connection registers an outbound channel; the server routes decoded
//! [`ClientMessage`]s to the registry and fans results out to every
//! connection seated in the affected session. Sockets and framing belong to
//! whatever transport feeds it.
//!
//! Seat membership is keyed by slot and only changes while the membership
//! lock is held across the matching registry call, so a join can never land
//! in a session that a concurrent leave has already closed.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::game::moves::Move;
use crate::game::player::PlayerState;
use crate::game::state::GameState;
use crate::network::protocol::{ClientMessage, ErrorInfo, JoinStatus, ServerMessage, StateUpdate};
use crate::network::session::{GameSession, LeaveOutcome, SessionError, SessionId, SessionRegistry};

/// Connection identifier.
pub type ConnectionId = Uuid;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Capacity of each connection's outbound queue.
    pub outbound_buffer: usize,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            outbound_buffer: 64,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ServerConfig {
    /// Read overrides from `GEM_COURT_OUTBOUND_BUFFER`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            outbound_buffer: std::env::var("GEM_COURT_OUTBOUND_BUFFER")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(defaults.outbound_buffer),
            ..defaults
        }
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Message from a connection that never registered or already left.
    #[error("unknown connection {0}")]
    UnknownConnection(ConnectionId),

    /// Session error, already reported to the sender.
    #[error("session error: {0}")]
    Session(#[from] SessionError),
}

/// The game server.
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// Session registry.
    registry: Arc<SessionRegistry>,
    /// Outbound queue per connection.
    connections: RwLock<BTreeMap<ConnectionId, mpsc::Sender<ServerMessage>>>,
    /// Slot to connection, per session.
    members: RwLock<BTreeMap<SessionId, BTreeMap<u8, ConnectionId>>>,
}

impl GameServer {
    /// Create a server over `registry`.
    pub fn new(config: ServerConfig, registry: Arc<SessionRegistry>) -> Self {
        Self {
            config,
            registry,
            connections: RwLock::new(BTreeMap::new()),
            members: RwLock::new(BTreeMap::new()),
        }
    }

    /// The registry behind this server.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Register a connection. Returns its id and outbound queue.
    pub async fn connect(&self) -> (ConnectionId, mpsc::Receiver<ServerMessage>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(self.config.outbound_buffer);
        self.connections.write().await.insert(id, tx);
        info!(connection = %id, "connection opened");
        (id, rx)
    }

    /// Forget a connection. Its seats stay until they leave.
    pub async fn disconnect(&self, id: ConnectionId) {
        self.connections.write().await.remove(&id);
        info!(connection = %id, "connection closed");
    }

    /// Route one message.
    ///
    /// Rejections are answered on the sender's queue and also returned.
    #[instrument(skip(self, msg))]
    pub async fn handle_message(&self, connection: ConnectionId, msg: ClientMessage) -> Result<(), ServerError> {
        if !self.connections.read().await.contains_key(&connection) {
            return Err(ServerError::UnknownConnection(connection));
        }

        let result = match msg {
            ClientMessage::CreateSession { multiplayer } => {
                let session = self.registry.create_session(multiplayer).await;
                self.send(connection, ServerMessage::SessionCreated { session_id: session.id }).await;
                Ok(())
            }
            ClientMessage::JoinSession { session_id, player } => {
                self.handle_join(connection, session_id, player).await
            }
            ClientMessage::LeaveSession { session_id, slot } => self.handle_leave(session_id, slot).await,
            ClientMessage::StartGame { session_id } => self.handle_start(session_id).await,
            ClientMessage::PlayerAction { session_id, state, base_version, .. } => {
                self.handle_action(session_id, state, base_version).await
            }
            ClientMessage::PlayMove { session_id, slot, mv } => self.handle_move(session_id, slot, &mv).await,
            ClientMessage::GameOver { session_id } => self.handle_game_over(session_id).await,
        };

        if let Err(error) = &result {
            debug!(connection = %connection, %error, "request rejected");
            self.send(connection, ServerMessage::Error(ErrorInfo::from(error))).await;
        }
        result.map_err(ServerError::from)
    }

    async fn handle_join(
        &self,
        connection: ConnectionId,
        session_id: SessionId,
        player: PlayerState,
    ) -> Result<(), SessionError> {
        let mut members = self.members.write().await;
        let session = match self.registry.join(session_id, player).await {
            Ok(session) => session,
            Err(error) => {
                drop(members);
                let Some(status) = JoinStatus::from_error(&error) else {
                    return Err(error);
                };
                let reply = ServerMessage::JoinResult { session_id, status, player: None };
                self.send(connection, reply).await;
                return Ok(());
            }
        };

        let seated = session.state.players.last().cloned();
        if let Some(seated) = &seated {
            members.entry(session_id).or_default().insert(seated.slot, connection);
        }
        drop(members);

        let reply = ServerMessage::JoinResult { session_id, status: JoinStatus::Success, player: seated };
        self.send(connection, reply).await;
        self.broadcast_state(&session).await;
        Ok(())
    }

    async fn handle_leave(&self, session_id: SessionId, slot: u8) -> Result<(), SessionError> {
        let mut members = self.members.write().await;
        match self.registry.leave(session_id, slot).await? {
            LeaveOutcome::Closed(_) => {
                let seats = members.remove(&session_id).unwrap_or_default();
                drop(members);
                self.deliver(seats.into_values().collect(), ServerMessage::SessionClosed { session_id }).await;
            }
            LeaveOutcome::Continued(session) => {
                if let Some(seats) = members.get_mut(&session_id) {
                    *seats = compact_seats(std::mem::take(seats), slot);
                }
                drop(members);
                self.broadcast_state(&session).await;
            }
        }
        Ok(())
    }

    async fn handle_start(&self, session_id: SessionId) -> Result<(), SessionError> {
        let session = self.registry.start_game(session_id).await?;
        self.broadcast_state(&session).await;
        Ok(())
    }

    async fn handle_action(
        &self,
        session_id: SessionId,
        state: GameState,
        base_version: Option<u64>,
    ) -> Result<(), SessionError> {
        let session = match base_version {
            Some(version) => self.registry.apply_action_at(session_id, version, state).await?,
            None => self.registry.apply_action(session_id, state).await?,
        };
        self.broadcast_state(&session).await;
        Ok(())
    }

    async fn handle_move(&self, session_id: SessionId, slot: u8, mv: &Move) -> Result<(), SessionError> {
        let (session, outcome) = self.registry.play_move(session_id, slot, mv).await?;
        if let Some(winner) = outcome.winner {
            info!(session = session_id, winner, "winning move played");
        }
        self.broadcast_state(&session).await;
        Ok(())
    }

    async fn handle_game_over(&self, session_id: SessionId) -> Result<(), SessionError> {
        let records = self.registry.end_game(session_id).await?;
        self.broadcast(session_id, ServerMessage::GameResults { session_id, records }).await;
        Ok(())
    }

    // =========================================================================
    // Delivery
    // =========================================================================

    async fn broadcast_state(&self, session: &GameSession) {
        let update = ServerMessage::StateUpdate(StateUpdate::from_session(session));
        self.broadcast(session.id, update).await;
    }

    /// Send to every connection seated in the session, once each.
    async fn broadcast(&self, session_id: SessionId, msg: ServerMessage) {
        let targets: Vec<ConnectionId> = match self.members.read().await.get(&session_id) {
            Some(seats) => seats.values().copied().collect(),
            None => return,
        };
        self.deliver(targets, msg).await;
    }

    async fn deliver(&self, mut targets: Vec<ConnectionId>, msg: ServerMessage) {
        targets.sort();
        targets.dedup();

        for connection in targets {
            self.send(connection, msg.clone()).await;
        }
    }

    async fn send(&self, connection: ConnectionId, msg: ServerMessage) {
        let sender = self.connections.read().await.get(&connection).cloned();
        let Some(sender) = sender else {
            debug!(connection = %connection, "dropping message for closed connection");
            return;
        };
        if sender.send(msg).await.is_err() {
            warn!(connection = %connection, "outbound queue closed");
        }
    }

    /// Get active connection count.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Get active session count.
    pub async fn session_count(&self) -> usize {
        self.registry.session_count().await
    }
}

/// Drop `left` and move every later seat down by one, as the registry does.
fn compact_seats(seats: BTreeMap<u8, ConnectionId>, left: u8) -> BTreeMap<u8, ConnectionId> {
    seats
        .into_iter()
        .filter(|&(slot, _)| slot != left)
        .map(|(slot, connection)| if slot > left { (slot - 1, connection) } else { (slot, connection) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::moves::MoveKind;
    use crate::game::player::{AiDifficulty, User};
    use crate::game::stones::{StoneMap, StoneType};
    use crate::network::directory::{InMemoryDirectory, InMemoryStats};
    use crate::network::protocol::ErrorCode;
    use crate::network::session::SessionConfig;

    fn server() -> GameServer {
        let registry = SessionRegistry::new(
            SessionConfig::default(),
            Arc::new(InMemoryDirectory::new()),
            Arc::new(InMemoryStats::new()),
        );
        GameServer::new(ServerConfig::default(), Arc::new(registry))
    }

    fn human(id: u32) -> PlayerState {
        PlayerState::human(0, User { id, username: format!("player{id}"), age: 30 })
    }

    async fn next(rx: &mut mpsc::Receiver<ServerMessage>) -> ServerMessage {
        rx.recv().await.unwrap()
    }

    /// Create a session on `host` and fill it with the host plus three AIs.
    async fn full_table(server: &GameServer, host: ConnectionId, rx: &mut mpsc::Receiver<ServerMessage>) -> SessionId {
        server.handle_message(host, ClientMessage::CreateSession { multiplayer: false }).await.unwrap();
        let ServerMessage::SessionCreated { session_id } = next(rx).await else {
            panic!("expected session_created");
        };

        server.handle_message(host, ClientMessage::JoinSession { session_id, player: human(1) }).await.unwrap();
        for difficulty in [AiDifficulty::Easy, AiDifficulty::Medium, AiDifficulty::Hard] {
            let player = PlayerState::ai(0, "", difficulty);
            server.handle_message(host, ClientMessage::JoinSession { session_id, player }).await.unwrap();
        }
        while rx.try_recv().is_ok() {}
        session_id
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.outbound_buffer, 64);
        assert!(!config.version.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_connection_rejected() {
        let server = server();
        let result = server.handle_message(Uuid::new_v4(), ClientMessage::GameOver { session_id: 1001 }).await;
        assert!(matches!(result, Err(ServerError::UnknownConnection(_))));
    }

    #[tokio::test]
    async fn test_join_broadcasts_state() {
        let server = server();
        let (host, mut host_rx) = server.connect().await;
        let (guest, mut guest_rx) = server.connect().await;

        server.handle_message(host, ClientMessage::CreateSession { multiplayer: true }).await.unwrap();
        let ServerMessage::SessionCreated { session_id } = next(&mut host_rx).await else {
            panic!("expected session_created");
        };
        assert_eq!(session_id, 1001);

        server.handle_message(host, ClientMessage::JoinSession { session_id, player: human(1) }).await.unwrap();
        assert!(matches!(
            next(&mut host_rx).await,
            ServerMessage::JoinResult { status: JoinStatus::Success, .. }
        ));
        assert!(matches!(next(&mut host_rx).await, ServerMessage::StateUpdate(_)));

        server.handle_message(guest, ClientMessage::JoinSession { session_id, player: human(2) }).await.unwrap();
        let ServerMessage::JoinResult { player: Some(seated), .. } = next(&mut guest_rx).await else {
            panic!("expected join_result");
        };
        assert_eq!(seated.slot, 1);

        let ServerMessage::StateUpdate(update) = next(&mut host_rx).await else {
            panic!("host should see the guest arrive");
        };
        assert_eq!(update.state.players.len(), 2);
        assert!(matches!(next(&mut guest_rx).await, ServerMessage::StateUpdate(_)));
    }

    #[tokio::test]
    async fn test_join_missing_session_reports_status() {
        let server = server();
        let (conn, mut rx) = server.connect().await;
        server
            .handle_message(conn, ClientMessage::JoinSession { session_id: 9999, player: human(1) })
            .await
            .unwrap();
        assert!(matches!(
            next(&mut rx).await,
            ServerMessage::JoinResult { status: JoinStatus::SessionNotFound, player: None, .. }
        ));
    }

    #[tokio::test]
    async fn test_host_leave_closes_for_everyone() {
        let server = server();
        let (host, mut host_rx) = server.connect().await;
        let (guest, mut guest_rx) = server.connect().await;
        server.handle_message(host, ClientMessage::CreateSession { multiplayer: true }).await.unwrap();
        let ServerMessage::SessionCreated { session_id } = next(&mut host_rx).await else {
            panic!("expected session_created");
        };
        server.handle_message(host, ClientMessage::JoinSession { session_id, player: human(1) }).await.unwrap();
        server.handle_message(guest, ClientMessage::JoinSession { session_id, player: human(2) }).await.unwrap();
        while host_rx.try_recv().is_ok() {}
        while guest_rx.try_recv().is_ok() {}

        server.handle_message(host, ClientMessage::LeaveSession { session_id, slot: 0 }).await.unwrap();
        assert_eq!(next(&mut host_rx).await, ServerMessage::SessionClosed { session_id });
        assert_eq!(next(&mut guest_rx).await, ServerMessage::SessionClosed { session_id });
        assert_eq!(server.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_stale_action_reported() {
        let server = server();
        let (host, mut rx) = server.connect().await;
        let session_id = full_table(&server, host, &mut rx).await;
        let snapshot = server.registry().session(session_id).await.unwrap();

        let msg = ClientMessage::PlayerAction {
            session_id,
            slot: 0,
            state: snapshot.state.clone(),
            base_version: Some(snapshot.version),
        };
        server.handle_message(host, msg.clone()).await.unwrap();
        assert!(matches!(next(&mut rx).await, ServerMessage::StateUpdate(_)));

        let result = server.handle_message(host, msg).await;
        assert!(matches!(result, Err(ServerError::Session(SessionError::StaleState { .. }))));
        let ServerMessage::Error(info) = next(&mut rx).await else {
            panic!("expected an error reply");
        };
        assert_eq!(info.code, ErrorCode::StaleState);
    }

    #[tokio::test]
    async fn test_play_move_validates() {
        let server = server();
        let (host, mut rx) = server.connect().await;
        let session_id = full_table(&server, host, &mut rx).await;
        server.handle_message(host, ClientMessage::StartGame { session_id }).await.unwrap();
        let ServerMessage::StateUpdate(started) = next(&mut rx).await else {
            panic!("expected a state update");
        };
        assert!(started.state.running);

        let take = Move::new(MoveKind::Take {
            tokens: StoneMap::of(&[(StoneType::Red, 1), (StoneType::Blue, 1), (StoneType::Green, 1)]),
        });
        let result = server
            .handle_message(host, ClientMessage::PlayMove { session_id, slot: 2, mv: take.clone() })
            .await;
        assert!(result.is_err());
        let ServerMessage::Error(info) = next(&mut rx).await else {
            panic!("expected an error reply");
        };
        assert_eq!(info.code, ErrorCode::IllegalAction);

        server.handle_message(host, ClientMessage::PlayMove { session_id, slot: 0, mv: take }).await.unwrap();
        let ServerMessage::StateUpdate(update) = next(&mut rx).await else {
            panic!("expected a state update");
        };
        assert_eq!(update.state.players_turn, 1);
        assert_eq!(update.state.pool[StoneType::Red], 6);
    }

    #[tokio::test]
    async fn test_game_over_sends_results() {
        let server = server();
        let (host, mut rx) = server.connect().await;
        let session_id = full_table(&server, host, &mut rx).await;

        server.handle_message(host, ClientMessage::GameOver { session_id }).await.unwrap();
        let ServerMessage::GameResults { records, .. } = next(&mut rx).await else {
            panic!("expected results");
        };
        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| r.placement == 1));
    }

    #[tokio::test]
    async fn test_start_needs_full_table() {
        let server = server();
        let (host, mut rx) = server.connect().await;
        server.handle_message(host, ClientMessage::CreateSession { multiplayer: false }).await.unwrap();
        next(&mut rx).await;

        let result = server.handle_message(host, ClientMessage::StartGame { session_id: 1001 }).await;
        assert!(result.is_err());
        let ServerMessage::Error(info) = next(&mut rx).await else {
            panic!("expected an error reply");
        };
        assert_eq!(info.code, ErrorCode::IllegalAction);
    }

    #[tokio::test]
    async fn test_same_name_seats_both_receive_updates() {
        let server = server();
        let (host, mut host_rx) = server.connect().await;
        let (guest, mut guest_rx) = server.connect().await;

        server.handle_message(host, ClientMessage::CreateSession { multiplayer: true }).await.unwrap();
        let ServerMessage::SessionCreated { session_id } = next(&mut host_rx).await else {
            panic!("expected session_created");
        };
        let twin = PlayerState::human(0, User { id: 2, username: "player1".into(), age: 30 });
        server.handle_message(host, ClientMessage::JoinSession { session_id, player: human(1) }).await.unwrap();
        server.handle_message(guest, ClientMessage::JoinSession { session_id, player: twin }).await.unwrap();
        while host_rx.try_recv().is_ok() {}
        while guest_rx.try_recv().is_ok() {}

        let state = server.registry().session(session_id).await.unwrap().state;
        let action = ClientMessage::PlayerAction { session_id, slot: 0, state, base_version: None };
        server.handle_message(host, action).await.unwrap();
        assert!(matches!(next(&mut host_rx).await, ServerMessage::StateUpdate(_)));
        assert!(matches!(next(&mut guest_rx).await, ServerMessage::StateUpdate(_)));

        // The guest's seat goes, the host's stays.
        server.handle_message(guest, ClientMessage::LeaveSession { session_id, slot: 1 }).await.unwrap();
        let ServerMessage::StateUpdate(update) = next(&mut host_rx).await else {
            panic!("expected state_update");
        };
        assert_eq!(update.state.players.len(), 1);
        assert!(guest_rx.try_recv().is_err());
        assert_eq!(server.members.read().await[&session_id], BTreeMap::from([(0, host)]));
    }

    #[tokio::test]
    async fn test_leave_compacts_member_slots() {
        let server = server();
        let (host, mut host_rx) = server.connect().await;
        let (second, _second_rx) = server.connect().await;
        let (third, _third_rx) = server.connect().await;

        server.handle_message(host, ClientMessage::CreateSession { multiplayer: true }).await.unwrap();
        let ServerMessage::SessionCreated { session_id } = next(&mut host_rx).await else {
            panic!("expected session_created");
        };
        for (connection, id) in [(host, 1), (second, 2), (third, 3)] {
            server.handle_message(connection, ClientMessage::JoinSession { session_id, player: human(id) }).await.unwrap();
        }

        server.handle_message(second, ClientMessage::LeaveSession { session_id, slot: 1 }).await.unwrap();
        assert_eq!(server.members.read().await[&session_id], BTreeMap::from([(0, host), (1, third)]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_join_racing_close_leaves_no_members() {
        for _ in 0..32 {
            let server = Arc::new(server());
            let (host, mut host_rx) = server.connect().await;
            let (guest, _guest_rx) = server.connect().await;

            server.handle_message(host, ClientMessage::CreateSession { multiplayer: true }).await.unwrap();
            let ServerMessage::SessionCreated { session_id } = next(&mut host_rx).await else {
                panic!("expected session_created");
            };
            server.handle_message(host, ClientMessage::JoinSession { session_id, player: human(1) }).await.unwrap();

            let joining = {
                let server = server.clone();
                tokio::spawn(async move {
                    let msg = ClientMessage::JoinSession { session_id, player: human(2) };
                    let _ = server.handle_message(guest, msg).await;
                })
            };
            let leaving = {
                let server = server.clone();
                tokio::spawn(async move {
                    server.handle_message(host, ClientMessage::LeaveSession { session_id, slot: 0 }).await.unwrap();
                })
            };
            joining.await.unwrap();
            leaving.await.unwrap();

            assert_eq!(server.session_count().await, 0);
            assert!(!server.members.read().await.contains_key(&session_id));
        }
    }

    #[test]
    fn test_compact_seats_shifts_later_slots() {
        let ids: Vec<ConnectionId> = (0..4).map(|_| Uuid::new_v4()).collect();
        let seats: BTreeMap<u8, ConnectionId> = ids.iter().copied().enumerate().map(|(i, c)| (i as u8, c)).collect();
        let compacted = compact_seats(seats, 1);
        assert_eq!(compacted, BTreeMap::from([(0, ids[0]), (1, ids[2]), (2, ids[3])]));
    }
}

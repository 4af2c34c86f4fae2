//! Protocol Messages
//!
//! Typed requests and broadcasts exchanged between clients and the session
//! server. Framing is the transport's business; JSON helpers are provided for
//! transports that want a text encoding.

use serde::{Serialize, Deserialize};

use crate::game::moves::Move;
use crate::game::player::PlayerState;
use crate::game::state::GameState;
use crate::network::directory::PlayerRecord;
use crate::network::session::{GameSession, SessionError, SessionId};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Open a new session.
    CreateSession {
        /// Accept more than one human.
        multiplayer: bool,
    },

    /// Take a seat. The server assigns slot and, for AIs, the name.
    JoinSession {
        /// Target session.
        session_id: SessionId,
        /// The joining seat.
        player: PlayerState,
    },

    /// Give up a seat.
    LeaveSession {
        /// Target session.
        session_id: SessionId,
        /// Seat leaving.
        slot: u8,
    },

    /// Start play once all four seats are taken.
    StartGame {
        /// Target session.
        session_id: SessionId,
    },

    /// Replace the session state with a locally computed one.
    PlayerAction {
        /// Target session.
        session_id: SessionId,
        /// Acting seat.
        slot: u8,
        /// The new state.
        state: GameState,
        /// Version the state was derived from. `None` overwrites unconditionally.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base_version: Option<u64>,
    },

    /// Submit a whole move for the server to validate and apply.
    PlayMove {
        /// Target session.
        session_id: SessionId,
        /// Acting seat.
        slot: u8,
        /// The move.
        #[serde(rename = "move")]
        mv: Move,
    },

    /// The host reports the game finished.
    GameOver {
        /// Target session.
        session_id: SessionId,
    },
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A session was opened for the requester.
    SessionCreated {
        /// The new session.
        session_id: SessionId,
    },

    /// Outcome of a join request.
    JoinResult {
        /// Requested session.
        session_id: SessionId,
        /// Outcome.
        status: JoinStatus,
        /// The seat as placed, on success.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        player: Option<PlayerState>,
    },

    /// Current session state, broadcast after every change.
    StateUpdate(StateUpdate),

    /// The session was torn down.
    SessionClosed {
        /// Closed session.
        session_id: SessionId,
    },

    /// Final statistics of a finished game.
    GameResults {
        /// Finished session.
        session_id: SessionId,
        /// One record per identified player.
        records: Vec<PlayerRecord>,
    },

    /// A request failed.
    Error(ErrorInfo),
}

/// Join outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinStatus {
    /// Seated.
    Success,
    /// Four players already seated.
    SessionFull,
    /// No such session.
    SessionNotFound,
    /// The game is running.
    SessionAlreadyStarted,
    /// A second human tried to join a singleplayer session.
    SinglePlayerSession,
}

impl JoinStatus {
    /// Join status for a registry error, if it is a join rejection.
    pub fn from_error(error: &SessionError) -> Option<Self> {
        match error {
            SessionError::NotFound(_) => Some(JoinStatus::SessionNotFound),
            SessionError::Full(_) => Some(JoinStatus::SessionFull),
            SessionError::AlreadyStarted(_) => Some(JoinStatus::SessionAlreadyStarted),
            SessionError::SinglePlayer(_) => Some(JoinStatus::SinglePlayerSession),
            _ => None,
        }
    }
}

/// Session snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateUpdate {
    /// Session.
    pub session_id: SessionId,
    /// Stored version; echo it back as `base_version`.
    pub version: u64,
    /// Hex-encoded state fingerprint.
    pub state_hash: String,
    /// The state.
    pub state: GameState,
}

impl StateUpdate {
    /// Snapshot a session.
    pub fn from_session(session: &GameSession) -> Self {
        Self {
            session_id: session.id,
            version: session.version,
            state_hash: hex::encode(session.state.compute_hash()),
            state: session.state.clone(),
        }
    }
}

/// Request failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Session not found.
    SessionNotFound,
    /// No seat with that slot.
    PlayerNotFound,
    /// Join rejected.
    JoinRejected,
    /// Submitted state was based on an old version.
    StaleState,
    /// The move broke a rule.
    IllegalAction,
    /// Connection is not registered.
    UnknownConnection,
}

impl From<&SessionError> for ErrorInfo {
    fn from(error: &SessionError) -> Self {
        let code = match error {
            SessionError::NotFound(_) => ErrorCode::SessionNotFound,
            SessionError::PlayerNotFound { .. } => ErrorCode::PlayerNotFound,
            SessionError::Full(_) | SessionError::AlreadyStarted(_) | SessionError::SinglePlayer(_) => {
                ErrorCode::JoinRejected
            }
            SessionError::StaleState { .. } => ErrorCode::StaleState,
            SessionError::Game(_) => ErrorCode::IllegalAction,
        };
        Self { code, message: error.to_string() }
    }
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::error::GameError;
    use crate::game::moves::MoveKind;
    use crate::game::player::AiDifficulty;
    use crate::game::stones::{StoneMap, StoneType};

    #[test]
    fn test_client_message_json_roundtrip() {
        let msg = ClientMessage::JoinSession {
            session_id: 1001,
            player: PlayerState::ai(0, "", AiDifficulty::Hard),
        };

        let json = msg.to_json().unwrap();
        assert!(json.contains("\"type\":\"join_session\""));
        assert_eq!(ClientMessage::from_json(&json).unwrap(), msg);
    }

    #[test]
    fn test_play_move_json_uses_move_key() {
        let mv = Move::new(MoveKind::Take {
            tokens: StoneMap::of(&[(StoneType::Red, 1), (StoneType::Blue, 1), (StoneType::Green, 1)]),
        });
        let msg = ClientMessage::PlayMove { session_id: 1001, slot: 2, mv };

        let json = msg.to_json().unwrap();
        assert!(json.contains("\"move\":"));
        assert_eq!(ClientMessage::from_json(&json).unwrap(), msg);
    }

    #[test]
    fn test_player_action_without_base_version() {
        let msg = ClientMessage::PlayerAction {
            session_id: 1001,
            slot: 0,
            state: GameState::new(1),
            base_version: None,
        };
        let json = msg.to_json().unwrap();
        assert!(!json.contains("base_version"));
        assert_eq!(ClientMessage::from_json(&json).unwrap(), msg);
    }

    #[test]
    fn test_state_update_carries_hash() {
        let session = GameSession { id: 1001, state: GameState::new(5), multiplayer: true, version: 3 };
        let update = StateUpdate::from_session(&session);
        assert_eq!(update.state_hash.len(), 64);
        assert_eq!(update.version, 3);

        let json = ServerMessage::StateUpdate(update.clone()).to_json().unwrap();
        assert_eq!(ServerMessage::from_json(&json).unwrap(), ServerMessage::StateUpdate(update));
    }

    #[test]
    fn test_join_status_mapping() {
        assert_eq!(JoinStatus::from_error(&SessionError::Full(1)), Some(JoinStatus::SessionFull));
        assert_eq!(
            JoinStatus::from_error(&SessionError::SinglePlayer(1)),
            Some(JoinStatus::SinglePlayerSession)
        );
        assert_eq!(JoinStatus::from_error(&SessionError::PlayerNotFound { slot: 1 }), None);

        let json = serde_json::to_string(&JoinStatus::SessionAlreadyStarted).unwrap();
        assert_eq!(json, "\"session_already_started\"");
    }

    #[test]
    fn test_error_codes() {
        let info = ErrorInfo::from(&SessionError::Game(GameError::NotYourTurn { slot: 2 }));
        assert_eq!(info.code, ErrorCode::IllegalAction);

        let json = ServerMessage::Error(info).to_json().unwrap();
        assert!(json.contains("illegal_action"));
    }
}

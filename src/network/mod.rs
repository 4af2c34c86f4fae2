//! Network Layer
//!
//! Session registry, message routing and the AI participant loop.
//! This layer is **non-deterministic** - every rule decision runs through `game/`.

pub mod client;
pub mod directory;
pub mod protocol;
pub mod server;
pub mod session;

pub use client::{spawn_ai_participant, AiClient, ClientConfig, JoinError, JoinWaiter};
pub use directory::{InMemoryDirectory, InMemoryStats, PlayerRecord, StatsRecorder, UserDirectory};
pub use protocol::{ClientMessage, ErrorCode, ErrorInfo, JoinStatus, ServerMessage, StateUpdate};
pub use server::{ConnectionId, GameServer, ServerConfig, ServerError};
pub use session::{GameSession, LeaveOutcome, SessionConfig, SessionError, SessionId, SessionRegistry};

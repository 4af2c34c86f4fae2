//! Game Session Registry
//!
//! Process-wide map of live sessions. Every structural operation (create,
//! join, leave, state replacement, end of game) runs inside one critical
//! section, so concurrent handlers never observe a half-applied change.
//!
//! Stored states are last-writer-wins. Each replacement bumps the session's
//! `version`; callers that want lost-update protection submit through
//! [`SessionRegistry::apply_action_at`].

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Serialize, Deserialize};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::core::rng::DeterministicRng;
use crate::game::apply::{apply_move, MoveOutcome};
use crate::game::error::GameError;
use crate::game::moves::Move;
use crate::game::player::{PlayerKind, PlayerState, User};
use crate::game::state::{GameState, PLAYER_COUNT};
use crate::network::directory::{PlayerRecord, StatsRecorder, UserDirectory};

/// Session identifier. Sequential, at least four digits.
pub type SessionId = u32;

/// Players per session.
pub const MAX_PLAYERS: usize = PLAYER_COUNT;

/// Name pool for AI seats.
pub const AI_NAMES: [&str; 40] = [
    "Elowen", "Seraphina", "Lyra", "Thalira", "Nymeria", "Kaelith", "Isolde", "Vaela", "Zyreth",
    "Aelira", "Mirelle", "Rowan", "Sylvaen", "Ysolde", "Neriah", "Virelle", "Celestine", "Tavira",
    "Amariel", "Elaris", "Theron", "Kaelen", "Dorian", "Rhydan", "Malrik", "Fenric", "Auren",
    "Balen", "Torvak", "Lucan", "Gareth", "Kairon", "Draven", "Eryndor", "Zephriel", "Vaelin",
    "Corwin", "Thorne", "Jarek", "Orien",
];

/// Fallback AI name once the table is crowded.
pub const FALLBACK_AI_NAME: &str = "Bot";

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Registry configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Id handed to the first session.
    pub first_session_id: SessionId,
    /// Base seed; each session's board seed is derived from it and the session id.
    pub base_seed: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            first_session_id: 1001,
            base_seed: 0x5EED_6E75,
        }
    }
}

impl SessionConfig {
    /// Read overrides from `GEM_COURT_FIRST_SESSION_ID` and `GEM_COURT_SEED`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            first_session_id: std::env::var("GEM_COURT_FIRST_SESSION_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&id| id >= 1000)
                .unwrap_or(defaults.first_session_id),
            base_seed: std::env::var("GEM_COURT_SEED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.base_seed),
        }
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// One live session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    /// Session id.
    pub id: SessionId,
    /// Canonical state.
    pub state: GameState,
    /// Multiplayer sessions accept several humans; singleplayer only the creator.
    pub multiplayer: bool,
    /// Bumped on every stored change.
    pub version: u64,
}

impl GameSession {
    /// Seated players.
    pub fn player_count(&self) -> usize {
        self.state.players.len()
    }

    fn touch(&mut self) {
        self.version += 1;
    }
}

/// What a leave did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The session was torn down. Carries its last snapshot.
    Closed(GameSession),
    /// The leaver was removed and later seats moved down.
    Continued(GameSession),
}

/// Session handling errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// No such session.
    #[error("session {0} not found")]
    NotFound(SessionId),

    /// Session already holds four players.
    #[error("session {0} is full")]
    Full(SessionId),

    /// The game already started.
    #[error("session {0} already started")]
    AlreadyStarted(SessionId),

    /// A second human tried to join a singleplayer session.
    #[error("session {0} is a singleplayer session")]
    SinglePlayer(SessionId),

    /// No seat with that slot.
    #[error("no player in slot {slot}")]
    PlayerNotFound {
        /// Requested slot.
        slot: u8,
    },

    /// The caller worked from an outdated snapshot.
    #[error("stale state: based on version {expected}, session is at {actual}")]
    StaleState {
        /// Version the caller read.
        expected: u64,
        /// Current version.
        actual: u64,
    },

    /// A rule was broken.
    #[error(transparent)]
    Game(#[from] GameError),
}

// =============================================================================
// REGISTRY
// =============================================================================

struct RegistryInner {
    sessions: BTreeMap<SessionId, GameSession>,
    next_id: SessionId,
    names: DeterministicRng,
}

/// Owns every live session.
pub struct SessionRegistry {
    inner: Mutex<RegistryInner>,
    config: SessionConfig,
    directory: Arc<dyn UserDirectory>,
    stats: Arc<dyn StatsRecorder>,
}

impl SessionRegistry {
    /// Create a registry backed by the given collaborators.
    pub fn new(
        config: SessionConfig,
        directory: Arc<dyn UserDirectory>,
        stats: Arc<dyn StatsRecorder>,
    ) -> Self {
        let inner = RegistryInner {
            sessions: BTreeMap::new(),
            next_id: config.first_session_id,
            names: DeterministicRng::new(config.base_seed),
        };
        Self { inner: Mutex::new(inner), config, directory, stats }
    }

    /// Open a new session with an empty table.
    #[instrument(skip(self))]
    pub async fn create_session(&self, multiplayer: bool) -> GameSession {
        let mut inner = self.inner.lock().await;
        let id = inner.next_id;
        inner.next_id += 1;

        let seed = crate::core::rng::derive_session_seed(self.config.base_seed, id);
        let session = GameSession { id, state: GameState::new(seed), multiplayer, version: 0 };
        inner.sessions.insert(id, session.clone());

        info!(session = id, multiplayer, "session created");
        session
    }

    /// Seat `player` in the next free slot.
    ///
    /// AI joiners get a fresh name and a throwaway backing identity. Failure to
    /// register the identity only costs that seat its statistics.
    #[instrument(skip(self, player), fields(name = %player.name))]
    pub async fn join(&self, id: SessionId, mut player: PlayerState) -> Result<GameSession, SessionError> {
        let mut inner = self.inner.lock().await;
        let RegistryInner { sessions, names, .. } = &mut *inner;
        let session = sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;

        if session.player_count() >= MAX_PLAYERS {
            return Err(SessionError::Full(id));
        }
        if session.state.running {
            return Err(SessionError::AlreadyStarted(id));
        }
        if !session.multiplayer && !player.is_ai() && session.player_count() > 0 {
            return Err(SessionError::SinglePlayer(id));
        }

        if let PlayerKind::Ai { difficulty, backing_user } = &mut player.kind {
            let taken: Vec<&str> = session.state.players.iter().map(|p| base_name(&p.name)).collect();
            let name = format!("{} ({})", pick_ai_name(names, &taken), difficulty);
            match self.directory.create_or_fetch(&name) {
                Ok(user) => *backing_user = Some(user),
                Err(error) => warn!(session = id, %name, %error, "no backing identity for AI seat"),
            }
            player.name = name;
        }

        let slot = session.state.seat_player(player);
        session.touch();
        info!(session = id, slot, players = session.player_count(), "player joined");
        Ok(session.clone())
    }

    /// Remove the player in `slot`.
    ///
    /// A running game, a departing host or a last player tears the session
    /// down; otherwise the seats behind the leaver move down by one.
    #[instrument(skip(self))]
    pub async fn leave(&self, id: SessionId, slot: u8) -> Result<LeaveOutcome, SessionError> {
        let mut inner = self.inner.lock().await;
        let session = inner.sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        if session.state.player(slot).is_none() {
            return Err(SessionError::PlayerNotFound { slot });
        }

        if session.state.running || slot == 0 || session.player_count() == 1 {
            let mut closed = inner.sessions.remove(&id).ok_or(SessionError::NotFound(id))?;
            for player in &mut closed.state.players {
                self.release_ai_identity(player);
            }
            info!(session = id, slot, "session closed");
            return Ok(LeaveOutcome::Closed(closed));
        }

        if let Some(mut leaver) = session.state.unseat_player(slot) {
            self.release_ai_identity(&mut leaver);
        }
        session.touch();
        info!(session = id, slot, players = session.player_count(), "player left");
        Ok(LeaveOutcome::Continued(session.clone()))
    }

    /// Replace the stored state wholesale. Last writer wins.
    #[instrument(skip(self, state))]
    pub async fn apply_action(&self, id: SessionId, state: GameState) -> Result<GameSession, SessionError> {
        let mut inner = self.inner.lock().await;
        let session = inner.sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        session.state = state;
        session.touch();
        debug!(session = id, version = session.version, "state replaced");
        Ok(session.clone())
    }

    /// Replace the stored state only if nobody wrote since `expected_version`.
    #[instrument(skip(self, state))]
    pub async fn apply_action_at(
        &self,
        id: SessionId,
        expected_version: u64,
        state: GameState,
    ) -> Result<GameSession, SessionError> {
        let mut inner = self.inner.lock().await;
        let session = inner.sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        if session.version != expected_version {
            warn!(session = id, expected_version, actual = session.version, "stale state rejected");
            return Err(SessionError::StaleState { expected: expected_version, actual: session.version });
        }
        session.state = state;
        session.touch();
        Ok(session.clone())
    }

    /// Validate and apply a whole move against the stored state.
    #[instrument(skip(self, mv))]
    pub async fn play_move(
        &self,
        id: SessionId,
        slot: u8,
        mv: &Move,
    ) -> Result<(GameSession, MoveOutcome), SessionError> {
        let mut inner = self.inner.lock().await;
        let session = inner.sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        let outcome = apply_move(&mut session.state, slot, mv)?;
        session.touch();
        Ok((session.clone(), outcome))
    }

    /// Start the game once the table is full.
    #[instrument(skip(self))]
    pub async fn start_game(&self, id: SessionId) -> Result<GameSession, SessionError> {
        let mut inner = self.inner.lock().await;
        let session = inner.sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        if session.state.running {
            return Err(SessionError::AlreadyStarted(id));
        }
        session.state.start_game()?;
        session.touch();
        info!(session = id, starter = session.state.starting_player, "game started");
        Ok(session.clone())
    }

    /// Tally the finished game and hand it to the statistics store.
    ///
    /// Returns the records even when the store refuses them.
    #[instrument(skip(self))]
    pub async fn end_game(&self, id: SessionId) -> Result<Vec<PlayerRecord>, SessionError> {
        let inner = self.inner.lock().await;
        let session = inner.sessions.get(&id).ok_or(SessionError::NotFound(id))?;
        let players = &session.state.players;
        let placements = final_placements(players);

        let records: Vec<PlayerRecord> = players
            .iter()
            .zip(placements)
            .filter_map(|(player, placement)| {
                player.identity().map(|user| PlayerRecord {
                    user_id: user.id,
                    tokens: player.stones,
                    cards_bought: player.owned_cards.len() as u32,
                    placement,
                })
            })
            .collect();

        if let Err(error) = self.stats.record_game(&records) {
            warn!(session = id, %error, "game statistics not recorded");
        }
        info!(session = id, records = records.len(), "game over");
        Ok(records)
    }

    /// Snapshot of a session.
    pub async fn session(&self, id: SessionId) -> Option<GameSession> {
        self.inner.lock().await.sessions.get(&id).cloned()
    }

    /// Live session count.
    pub async fn session_count(&self) -> usize {
        self.inner.lock().await.sessions.len()
    }

    fn release_ai_identity(&self, player: &mut PlayerState) {
        let PlayerKind::Ai { backing_user, .. } = &mut player.kind else {
            return;
        };
        let Some(user) = backing_user.take() else {
            return;
        };
        release_identity(self.directory.as_ref(), self.stats.as_ref(), &user);
    }
}

fn release_identity(directory: &dyn UserDirectory, stats: &dyn StatsRecorder, user: &User) {
    if let Err(error) = stats.delete_entries(user.id) {
        warn!(user = %user.username, %error, "AI statistics not deleted");
    }
    if let Err(error) = directory.release(user) {
        warn!(user = %user.username, %error, "AI identity not released");
    }
}

/// Rank per seat: one plus the number of players with strictly more prestige.
pub fn final_placements(players: &[PlayerState]) -> Vec<u8> {
    players
        .iter()
        .map(|p| {
            let ahead = players.iter().filter(|o| o.prestige() > p.prestige()).count();
            1 + ahead as u8
        })
        .collect()
}

/// Name without the " (Difficulty)" suffix.
fn base_name(name: &str) -> &str {
    name.split(" (").next().unwrap_or(name)
}

/// Random unused name, or the fallback once four names are taken.
fn pick_ai_name(rng: &mut DeterministicRng, taken: &[&str]) -> &'static str {
    if taken.len() >= MAX_PLAYERS {
        return FALLBACK_AI_NAME;
    }
    let free: Vec<&'static str> = AI_NAMES.iter().copied().filter(|n| !taken.contains(n)).collect();
    rng.choose(&free).copied().unwrap_or(FALLBACK_AI_NAME)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::player::AiDifficulty;
    use crate::network::directory::{DirectoryError, InMemoryDirectory, InMemoryStats};

    struct Offline;

    impl UserDirectory for Offline {
        fn create_or_fetch(&self, _name: &str) -> Result<User, DirectoryError> {
            Err(DirectoryError::Unavailable("offline".into()))
        }

        fn release(&self, _user: &User) -> Result<(), DirectoryError> {
            Err(DirectoryError::Unavailable("offline".into()))
        }
    }

    fn registry() -> (SessionRegistry, Arc<InMemoryDirectory>, Arc<InMemoryStats>) {
        let directory = Arc::new(InMemoryDirectory::new());
        let stats = Arc::new(InMemoryStats::new());
        let registry = SessionRegistry::new(SessionConfig::default(), directory.clone(), stats.clone());
        (registry, directory, stats)
    }

    fn human(id: u32, age: u8) -> PlayerState {
        PlayerState::human(0, User { id, username: format!("player{id}"), age })
    }

    fn bot(difficulty: AiDifficulty) -> PlayerState {
        PlayerState::ai(0, "", difficulty)
    }

    #[tokio::test]
    async fn test_session_ids_are_sequential() {
        let (registry, _, _) = registry();
        assert_eq!(registry.create_session(true).await.id, 1001);
        assert_eq!(registry.create_session(false).await.id, 1002);
        assert_eq!(registry.session_count().await, 2);
    }

    #[tokio::test]
    async fn test_join_until_full() {
        let (registry, directory, _) = registry();
        let id = registry.create_session(true).await.id;

        registry.join(id, human(1, 30)).await.unwrap();
        registry.join(id, human(2, 20)).await.unwrap();
        registry.join(id, bot(AiDifficulty::Easy)).await.unwrap();
        let session = registry.join(id, bot(AiDifficulty::Hard)).await.unwrap();

        let slots: Vec<u8> = session.state.players.iter().map(|p| p.slot).collect();
        assert_eq!(slots, vec![0, 1, 2, 3]);
        assert!(session.state.players[3].name.ends_with(" (Hard)"));
        assert_ne!(base_name(&session.state.players[2].name), base_name(&session.state.players[3].name));
        assert!(session.state.players[2].identity().is_some());
        assert_eq!(directory.len(), 2);

        assert_eq!(registry.join(id, human(3, 40)).await, Err(SessionError::Full(id)));
    }

    #[tokio::test]
    async fn test_join_rejections() {
        let (registry, _, _) = registry();
        assert_eq!(registry.join(4242, human(1, 30)).await, Err(SessionError::NotFound(4242)));

        let solo = registry.create_session(false).await.id;
        registry.join(solo, human(1, 30)).await.unwrap();
        assert_eq!(registry.join(solo, human(2, 30)).await, Err(SessionError::SinglePlayer(solo)));
        registry.join(solo, bot(AiDifficulty::Medium)).await.unwrap();
        registry.join(solo, bot(AiDifficulty::Medium)).await.unwrap();
        registry.join(solo, bot(AiDifficulty::Medium)).await.unwrap();

        let started = registry.create_session(true).await.id;
        for player in [human(1, 30), human(2, 30), human(3, 30)] {
            registry.join(started, player).await.unwrap();
        }
        registry.join(started, bot(AiDifficulty::Easy)).await.unwrap();
        registry.start_game(started).await.unwrap();
        registry.leave(started, 3).await.unwrap();
        assert!(registry.session(started).await.is_none());
    }

    #[tokio::test]
    async fn test_already_started_rejected() {
        let (registry, _, _) = registry();
        let id = registry.create_session(true).await.id;
        registry.join(id, human(1, 30)).await.unwrap();
        let mut session = registry.join(id, bot(AiDifficulty::Easy)).await.unwrap();

        session.state.running = true;
        registry.apply_action(id, session.state).await.unwrap();
        assert_eq!(registry.join(id, human(2, 30)).await, Err(SessionError::AlreadyStarted(id)));
    }

    #[tokio::test]
    async fn test_host_leave_tears_down() {
        let (registry, directory, _) = registry();
        let id = registry.create_session(true).await.id;
        registry.join(id, human(1, 30)).await.unwrap();
        registry.join(id, bot(AiDifficulty::Easy)).await.unwrap();
        registry.join(id, bot(AiDifficulty::Hard)).await.unwrap();
        assert_eq!(directory.len(), 2);

        let outcome = registry.leave(id, 0).await.unwrap();
        assert!(matches!(outcome, LeaveOutcome::Closed(_)));
        assert!(registry.session(id).await.is_none());
        assert!(directory.is_empty());
    }

    #[tokio::test]
    async fn test_non_host_leave_compacts_slots() {
        let (registry, directory, _) = registry();
        let id = registry.create_session(true).await.id;
        registry.join(id, human(1, 30)).await.unwrap();
        registry.join(id, bot(AiDifficulty::Easy)).await.unwrap();
        registry.join(id, human(2, 25)).await.unwrap();

        let LeaveOutcome::Continued(session) = registry.leave(id, 1).await.unwrap() else {
            panic!("lobby leave should keep the session");
        };
        assert_eq!(session.player_count(), 2);
        assert_eq!(session.state.players[1].name, "player2");
        assert_eq!(session.state.players[1].slot, 1);
        assert!(directory.is_empty());

        assert_eq!(registry.leave(id, 5).await, Err(SessionError::PlayerNotFound { slot: 5 }));
    }

    #[tokio::test]
    async fn test_running_game_leave_tears_down() {
        let (registry, directory, stats) = registry();
        let id = registry.create_session(true).await.id;
        registry.join(id, human(100, 30)).await.unwrap();
        registry.join(id, human(101, 25)).await.unwrap();
        registry.join(id, bot(AiDifficulty::Easy)).await.unwrap();
        registry.join(id, bot(AiDifficulty::Hard)).await.unwrap();
        registry.start_game(id).await.unwrap();
        let records = registry.end_game(id).await.unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(directory.len(), 2);

        let LeaveOutcome::Closed(closed) = registry.leave(id, 2).await.unwrap() else {
            panic!("leaving a running game should close the session");
        };
        assert_eq!(closed.player_count(), 4);
        assert!(closed.state.players.iter().filter(|p| p.is_ai()).all(|p| p.identity().is_none()));
        assert!(registry.session(id).await.is_none());
        assert!(directory.is_empty());

        // Only the human records survive.
        let kept: Vec<u32> = stats.games().into_iter().flatten().map(|r| r.user_id).collect();
        assert_eq!(kept, vec![100, 101]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_joins_fill_exactly_four_seats() {
        let (registry, _, _) = registry();
        let registry = Arc::new(registry);
        let id = registry.create_session(true).await.id;

        let tasks: Vec<_> = (1..=6)
            .map(|n| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.join(id, human(n, 30)).await })
            })
            .collect();

        let mut seated = Vec::new();
        let mut full = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(session) => seated.push(session.state.players.last().unwrap().slot),
                Err(SessionError::Full(session)) if session == id => full += 1,
                Err(other) => panic!("unexpected join error: {other}"),
            }
        }

        seated.sort_unstable();
        assert_eq!(seated, vec![0, 1, 2, 3]);
        assert_eq!(full, 2);

        let session = registry.session(id).await.unwrap();
        let slots: Vec<u8> = session.state.players.iter().map(|p| p.slot).collect();
        assert_eq!(slots, vec![0, 1, 2, 3]);
        assert_eq!(session.version, 4);
    }

    #[tokio::test]
    async fn test_last_player_leave_closes() {
        let (registry, _, _) = registry();
        let id = registry.create_session(true).await.id;
        registry.join(id, human(1, 30)).await.unwrap();
        assert!(matches!(registry.leave(id, 0).await.unwrap(), LeaveOutcome::Closed(_)));
        assert_eq!(registry.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_offline_directory_still_seats_ai() {
        let registry = SessionRegistry::new(
            SessionConfig::default(),
            Arc::new(Offline),
            Arc::new(InMemoryStats::new()),
        );
        let id = registry.create_session(true).await.id;
        registry.join(id, human(1, 30)).await.unwrap();
        let session = registry.join(id, bot(AiDifficulty::Medium)).await.unwrap();
        assert!(session.state.players[1].identity().is_none());
    }

    #[tokio::test]
    async fn test_versioned_apply_rejects_stale_state() {
        let (registry, _, _) = registry();
        let id = registry.create_session(true).await.id;
        let seen = registry.join(id, human(1, 30)).await.unwrap();

        let mut first = seen.state.clone();
        first.chat.write_message(crate::game::chat::ChatMessage::new("player1", "hi"));
        let stored = registry.apply_action_at(id, seen.version, first).await.unwrap();
        assert_eq!(stored.version, seen.version + 1);

        let result = registry.apply_action_at(id, seen.version, seen.state.clone()).await;
        assert_eq!(
            result,
            Err(SessionError::StaleState { expected: seen.version, actual: seen.version + 1 })
        );

        let overwritten = registry.apply_action(id, seen.state.clone()).await.unwrap();
        assert_eq!(overwritten.state.chat.len(), 0);
    }

    #[tokio::test]
    async fn test_end_game_records_placements() {
        let (registry, _, stats) = registry();
        let id = registry.create_session(true).await.id;
        registry.join(id, human(1, 30)).await.unwrap();
        registry.join(id, human(2, 30)).await.unwrap();
        registry.join(id, bot(AiDifficulty::Easy)).await.unwrap();
        let mut session = registry.join(id, bot(AiDifficulty::Easy)).await.unwrap();

        let points = |id: u16, prestige: u8| crate::game::card::Card {
            id: crate::game::card::CardId(id),
            stage: crate::game::card::Stage::Three,
            bonus: crate::game::stones::StoneType::Red,
            prestige,
            cost: crate::game::stones::StoneMap::EMPTY,
        };
        session.state.players[0].owned_cards.push(points(1, 5));
        session.state.players[1].owned_cards.push(points(2, 5));
        session.state.players[2].owned_cards.push(points(3, 3));
        registry.apply_action(id, session.state).await.unwrap();

        let records = registry.end_game(id).await.unwrap();
        let placements: Vec<u8> = records.iter().map(|r| r.placement).collect();
        assert_eq!(placements, vec![1, 1, 3, 4]);
        assert_eq!(records[0].user_id, 1);
        assert_eq!(records[0].cards_bought, 1);
        assert_eq!(stats.games().len(), 1);
    }

    #[test]
    fn test_pick_ai_name_avoids_taken() {
        let mut rng = DeterministicRng::new(3);
        let taken = ["Lyra", "Orien"];
        for _ in 0..100 {
            let name = pick_ai_name(&mut rng, &taken);
            assert!(!taken.contains(&name));
        }
        assert_eq!(pick_ai_name(&mut rng, &["a", "b", "c", "d"]), FALLBACK_AI_NAME);
    }

    #[test]
    fn test_config_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.first_session_id, 1001);
    }
}

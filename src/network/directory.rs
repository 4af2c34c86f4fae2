//! Identity and Statistics Collaborators
//!
//! The registry binds every AI seat to a throwaway user so its games show up
//! in the statistics, and submits one record per identified player when a
//! game ends. Both services live outside this crate; the traits here are the
//! seam, and the in-memory versions back tests and the demo binary.

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::{Serialize, Deserialize};

use crate::game::player::User;
use crate::game::stones::StoneMap;

/// Age recorded for throwaway AI identities.
pub const AI_USER_AGE: u8 = 99;

/// Directory and statistics failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    /// The backing service could not be reached.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// No user with that name.
    #[error("unknown user: {0}")]
    UnknownUser(String),

    /// Internal lock poisoned by a panicking writer.
    #[error("directory state poisoned")]
    Poisoned,
}

/// End-of-game tally for one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// User id (the backing identity for AI seats).
    pub user_id: u32,
    /// Tokens held at the end, per color.
    pub tokens: StoneMap,
    /// Cards bought over the game.
    pub cards_bought: u32,
    /// Final placement; ties share a rank.
    pub placement: u8,
}

// =============================================================================
// TRAITS
// =============================================================================

/// User-management collaborator.
pub trait UserDirectory: Send + Sync {
    /// Register `name`, or fetch it if it already exists.
    fn create_or_fetch(&self, name: &str) -> Result<User, DirectoryError>;

    /// Delete a throwaway identity.
    fn release(&self, user: &User) -> Result<(), DirectoryError>;
}

/// Historical statistics collaborator.
pub trait StatsRecorder: Send + Sync {
    /// Store the results of one finished game.
    fn record_game(&self, records: &[PlayerRecord]) -> Result<(), DirectoryError>;

    /// Drop every stored entry for a user.
    fn delete_entries(&self, user_id: u32) -> Result<(), DirectoryError>;
}

// =============================================================================
// IN-MEMORY IMPLEMENTATIONS
// =============================================================================

#[derive(Debug, Default)]
struct DirectoryInner {
    users: BTreeMap<String, User>,
    next_id: u32,
}

/// In-process user directory.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    inner: Mutex<DirectoryInner>,
}

impl InMemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look a user up by name.
    pub fn get(&self, name: &str) -> Option<User> {
        self.inner.lock().ok()?.users.get(name).cloned()
    }

    /// Registered user count.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|inner| inner.users.len()).unwrap_or(0)
    }

    /// No users registered?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UserDirectory for InMemoryDirectory {
    fn create_or_fetch(&self, name: &str) -> Result<User, DirectoryError> {
        let mut inner = self.inner.lock().map_err(|_| DirectoryError::Poisoned)?;
        if let Some(user) = inner.users.get(name) {
            return Ok(user.clone());
        }

        inner.next_id += 1;
        let user = User { id: inner.next_id, username: name.to_string(), age: AI_USER_AGE };
        inner.users.insert(name.to_string(), user.clone());
        Ok(user)
    }

    fn release(&self, user: &User) -> Result<(), DirectoryError> {
        let mut inner = self.inner.lock().map_err(|_| DirectoryError::Poisoned)?;
        inner
            .users
            .remove(&user.username)
            .map(|_| ())
            .ok_or_else(|| DirectoryError::UnknownUser(user.username.clone()))
    }
}

/// In-process statistics store.
#[derive(Debug, Default)]
pub struct InMemoryStats {
    games: Mutex<Vec<Vec<PlayerRecord>>>,
}

impl InMemoryStats {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded game, oldest first.
    pub fn games(&self) -> Vec<Vec<PlayerRecord>> {
        self.games.lock().map(|games| games.clone()).unwrap_or_default()
    }

    /// Every record stored for one user.
    pub fn entries_for(&self, user_id: u32) -> Vec<PlayerRecord> {
        self.games()
            .into_iter()
            .flatten()
            .filter(|r| r.user_id == user_id)
            .collect()
    }
}

impl StatsRecorder for InMemoryStats {
    fn record_game(&self, records: &[PlayerRecord]) -> Result<(), DirectoryError> {
        let mut games = self.games.lock().map_err(|_| DirectoryError::Poisoned)?;
        games.push(records.to_vec());
        Ok(())
    }

    fn delete_entries(&self, user_id: u32) -> Result<(), DirectoryError> {
        let mut games = self.games.lock().map_err(|_| DirectoryError::Poisoned)?;
        for game in games.iter_mut() {
            game.retain(|r| r.user_id != user_id);
        }
        games.retain(|game| !game.is_empty());
        Ok(())
    }
}

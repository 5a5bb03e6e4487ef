//! `SQLite`-backed session and preferences store

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use super::Database;
use crate::error::{Error, Result};
use crate::models::{Preferences, Session};
use crate::store::{PreferencesStore, SessionStore};

/// Storage key holding the session collection
pub const SESSIONS_KEY: &str = "sessions";

/// Storage key holding user preferences
pub const SETTINGS_KEY: &str = "settings";

/// Thread-safe local store over a single `SQLite` file.
///
/// The session collection lives under [`SESSIONS_KEY`] as a JSON array and
/// preferences under [`SETTINGS_KEY`]. Clones share the same connection.
/// Every database call runs on tokio's blocking pool.
#[derive(Clone)]
pub struct SqliteSessionStore {
    db: Arc<Mutex<Database>>,
}

async fn run_blocking<T, F>(task: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|error| Error::Database(format!("Storage task failed: {error}")))?
}

impl SqliteSessionStore {
    /// Open (or create) the store at the given filesystem path.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let db = run_blocking(move || Database::open(path)).await?;
        Ok(Self::from_database(db))
    }

    /// Open an in-memory store (primarily for tests).
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_database(Database::open_in_memory()?))
    }

    #[must_use]
    pub fn from_database(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    async fn with_db<T, F>(&self, task: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        run_blocking(move || {
            let db = db.lock().unwrap_or_else(PoisonError::into_inner);
            task(&db)
        })
        .await
    }
}

impl SessionStore for SqliteSessionStore {
    async fn load_sessions(&self) -> Result<Vec<Session>> {
        match self.with_db(|db| db.get_value(SESSIONS_KEY)).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    async fn replace_sessions(&self, sessions: &[Session]) -> Result<()> {
        let raw = serde_json::to_string(sessions)?;
        self.with_db(move |db| db.set_value(SESSIONS_KEY, &raw))
            .await?;
        tracing::debug!("Stored {} sessions locally", sessions.len());
        Ok(())
    }
}

impl PreferencesStore for SqliteSessionStore {
    async fn load_preferences(&self) -> Result<Preferences> {
        let Some(raw) = self.with_db(|db| db.get_value(SETTINGS_KEY)).await? else {
            return Ok(Preferences::default());
        };

        match serde_json::from_str(&raw) {
            Ok(preferences) => Ok(preferences),
            Err(error) => {
                tracing::warn!("Ignoring unreadable stored preferences: {}", error);
                Ok(Preferences::default())
            }
        }
    }

    async fn save_preferences(&self, preferences: &Preferences) -> Result<()> {
        let raw = serde_json::to_string(preferences)?;
        self.with_db(move |db| db.set_value(SETTINGS_KEY, &raw))
            .await
    }
}

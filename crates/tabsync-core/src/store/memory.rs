//! In-memory session store.

use std::sync::Arc;

use tokio::sync::Mutex;

use super::{PreferencesStore, SessionStore};
use crate::error::Result;
use crate::models::{Preferences, Session};

/// Session store kept entirely in memory.
///
/// Clones share state. Useful for tests and for embedding the engine where
/// persistence is handled elsewhere.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<Mutex<Vec<Session>>>,
    preferences: Arc<Mutex<Option<Preferences>>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with sessions.
    #[must_use]
    pub fn with_sessions(sessions: Vec<Session>) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(sessions)),
            preferences: Arc::default(),
        }
    }

    /// Snapshot of the current contents.
    pub async fn snapshot(&self) -> Vec<Session> {
        self.sessions.lock().await.clone()
    }
}

impl SessionStore for MemorySessionStore {
    async fn load_sessions(&self) -> Result<Vec<Session>> {
        Ok(self.sessions.lock().await.clone())
    }

    async fn replace_sessions(&self, sessions: &[Session]) -> Result<()> {
        *self.sessions.lock().await = sessions.to_vec();
        Ok(())
    }
}

impl PreferencesStore for MemorySessionStore {
    async fn load_preferences(&self) -> Result<Preferences> {
        Ok(self.preferences.lock().await.unwrap_or_default())
    }

    async fn save_preferences(&self, preferences: &Preferences) -> Result<()> {
        *self.preferences.lock().await = Some(*preferences);
        Ok(())
    }
}

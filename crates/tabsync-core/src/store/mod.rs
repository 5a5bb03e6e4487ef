//! Local session storage abstraction.
//!
//! The [`SessionStore`] trait is the process-wide session collection: one
//! read-all and one replace-all operation, nothing finer. Sync and the
//! lifecycle manager receive it as an injected dependency so tests can run
//! against [`MemorySessionStore`].

mod memory;

use std::future::Future;

use crate::error::Result;
use crate::models::{Preferences, Session};

pub use memory::MemorySessionStore;

/// Persisted session collection.
///
/// Implementations must be cheap to clone and share the same underlying
/// state between clones, since the sync engine and spawned sync tasks hold
/// their own handle.
pub trait SessionStore: Clone + Send + Sync + 'static {
    /// Load every stored session in insertion order.
    fn load_sessions(&self) -> impl Future<Output = Result<Vec<Session>>> + Send;

    /// Replace the whole stored collection.
    fn replace_sessions(&self, sessions: &[Session]) -> impl Future<Output = Result<()>> + Send;
}

/// Persisted user preferences, kept under their own key.
pub trait PreferencesStore: Send + Sync {
    /// Load preferences, falling back to defaults when none are stored.
    fn load_preferences(&self) -> impl Future<Output = Result<Preferences>> + Send;

    fn save_preferences(&self, preferences: &Preferences)
        -> impl Future<Output = Result<()>> + Send;
}

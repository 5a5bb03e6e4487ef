//! Shared sync state exposed to clients.

/// Current state of a [`SyncEngine`](crate::sync::SyncEngine).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncState {
    /// No sync has run yet in this process.
    #[default]
    Idle,
    Syncing,
    Synced,
    Error,
}

impl SyncState {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Syncing => "syncing",
            Self::Synced => "synced",
            Self::Error => "error",
        }
    }
}

//! Remote sync document model

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::Session;

/// Well-known name of the synced file.
pub const REMOTE_FILE_NAME: &str = "session-sync.json";

/// MIME type of the synced file.
pub const REMOTE_FILE_MIME_TYPE: &str = "application/json";

/// The whole synced payload: every session plus the time it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDocument {
    pub last_synced: DateTime<Utc>,
    pub sessions: Vec<Session>,
    /// Entries of the `sessions` array that don't decode as a [`Session`].
    /// They are written back verbatim after the decoded sessions.
    pub opaque_entries: Vec<Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireDocument<'a> {
    last_synced: &'a DateTime<Utc>,
    sessions: Vec<WireEntry<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum WireEntry<'a> {
    Session(&'a Session),
    Opaque(&'a Value),
}

impl RemoteDocument {
    #[must_use]
    pub fn new(sessions: Vec<Session>) -> Self {
        Self {
            last_synced: Utc::now(),
            sessions,
            opaque_entries: Vec::new(),
        }
    }

    /// Carry the given undecodable entries into the next upload.
    #[must_use]
    pub fn with_opaque_entries(mut self, entries: Vec<Value>) -> Self {
        self.opaque_entries = entries;
        self
    }

    /// Opaque entries that no decoded session supersedes.
    ///
    /// An entry is dropped once a session with the same string `id` exists in
    /// `sessions`, so a newer readable copy replaces the broken one.
    #[must_use]
    pub fn opaque_entries_except(&self, sessions: &[Session]) -> Vec<Value> {
        self.opaque_entries
            .iter()
            .filter(|entry| match entry.get("id").and_then(Value::as_str) {
                Some(id) => !sessions.iter().any(|session| session.id.as_str() == id),
                None => true,
            })
            .cloned()
            .collect()
    }

    /// Pretty-printed UTF-8 JSON, the exact on-drive representation.
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        let wire = WireDocument {
            last_synced: &self.last_synced,
            sessions: self
                .sessions
                .iter()
                .map(WireEntry::Session)
                .chain(self.opaque_entries.iter().map(WireEntry::Opaque))
                .collect(),
        };
        serde_json::to_vec_pretty(&wire)
    }

    /// Decode a remote payload leniently.
    ///
    /// Only invalid JSON is an error. A missing or non-array `sessions` field
    /// becomes an empty collection, entries that don't decode as a session are
    /// kept as [`RemoteDocument::opaque_entries`], and an unreadable
    /// `lastSynced` falls back to the epoch.
    pub fn from_slice_lenient(bytes: &[u8]) -> serde_json::Result<Self> {
        let value: Value = serde_json::from_slice(bytes)?;

        let last_synced = value
            .get("lastSynced")
            .and_then(Value::as_str)
            .and_then(|raw| raw.parse::<DateTime<Utc>>().ok())
            .unwrap_or_default();

        let mut sessions = Vec::new();
        let mut opaque_entries = Vec::new();
        match value.get("sessions") {
            Some(Value::Array(entries)) => {
                for (index, entry) in entries.iter().enumerate() {
                    match serde_json::from_value::<Session>(entry.clone()) {
                        Ok(session) => sessions.push(session),
                        Err(error) => {
                            tracing::warn!(
                                "Keeping undecodable remote session at index {} as is: {}",
                                index,
                                error
                            );
                            opaque_entries.push(entry.clone());
                        }
                    }
                }
            }
            Some(_) => {
                tracing::warn!("Remote document `sessions` is not an array; treating as empty");
            }
            None => {}
        }

        Ok(Self {
            last_synced,
            sessions,
            opaque_entries,
        })
    }
}

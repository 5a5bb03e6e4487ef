//! Local/remote session synchronization.
//!
//! One [`SyncEngine::sync`] call is a strictly sequential round trip: read
//! local, read remote, merge, write local, write remote. There is no lock on
//! the remote file and no mutual exclusion between concurrent calls; two
//! writers racing on the same document resolve as last-writer-wins on the
//! whole file, and the next sync from the losing side re-merges its sessions.

mod merge;
mod scheduler;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::watch;

use crate::auth::AuthError;
use crate::models::{RemoteDocument, Session};
use crate::remote::{RemoteError, RemoteFileApi, RemoteStore, UploadOutcome};
use crate::state::SyncState;
use crate::store::SessionStore;

pub use merge::merge_sessions;
pub use scheduler::{final_sync, spawn_periodic_sync, PeriodicSync};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Sync authorization failed: {0}")]
    Auth(#[from] AuthError),
    #[error("Remote write failed: {0}")]
    RemoteWrite(#[source] RemoteError),
    #[error("Local store error: {0}")]
    LocalStore(#[from] crate::Error),
    #[error("Sync is not configured; sessions are kept locally only")]
    Disabled,
}

impl SyncError {
    fn from_upload(error: RemoteError) -> Self {
        match error {
            RemoteError::Auth(error) => Self::Auth(error),
            other => Self::RemoteWrite(other),
        }
    }
}

/// Which branch of the round trip ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPath {
    /// Remote data was usable and merged into local.
    Merged,
    /// No usable remote data; local was uploaded untouched.
    UploadOnly,
}

impl SyncPath {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Merged => "merged",
            Self::UploadOnly => "upload-only",
        }
    }
}

/// Summary of a completed sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub path: SyncPath,
    pub local_count: usize,
    /// `None` when the remote was absent or unusable.
    pub remote_count: Option<usize>,
    pub merged_count: usize,
    pub last_synced: DateTime<Utc>,
    pub upload: UploadOutcome,
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} sync: {} local, {} remote, {} after merge (last synced {})",
            self.path.label(),
            self.local_count,
            self.remote_count
                .map_or_else(|| "no".to_string(), |count| count.to_string()),
            self.merged_count,
            self.last_synced.to_rfc3339(),
        )
    }
}

struct EngineInner<S, A> {
    store: S,
    remote: RemoteStore<A>,
    state: watch::Sender<SyncState>,
}

/// Coordinates the local store, the remote document and the merge.
///
/// Clones share the same store, remote and state.
pub struct SyncEngine<S, A> {
    inner: Arc<EngineInner<S, A>>,
}

impl<S, A> Clone for SyncEngine<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: SessionStore, A: RemoteFileApi> SyncEngine<S, A> {
    pub fn new(store: S, remote: RemoteStore<A>) -> Self {
        let (state, _) = watch::channel(SyncState::Idle);
        Self {
            inner: Arc::new(EngineInner {
                store,
                remote,
                state,
            }),
        }
    }

    pub fn store(&self) -> &S {
        &self.inner.store
    }

    pub fn remote(&self) -> &RemoteStore<A> {
        &self.inner.remote
    }

    pub fn state(&self) -> SyncState {
        *self.inner.state.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.inner.state.subscribe()
    }

    /// Run one full round trip.
    ///
    /// A missing or unreadable remote document degrades to uploading the
    /// local collection as is. Single remote entries that don't decode are
    /// written back unchanged alongside the merged sessions. Authorization failures, local store
    /// failures and remote write failures are returned. Nothing is rolled
    /// back: a failed remote write after the local replace leaves local
    /// merged and remote stale until the next sync.
    pub async fn sync(&self) -> Result<SyncReport, SyncError> {
        self.inner.state.send_replace(SyncState::Syncing);
        let result = self.round_trip().await;
        match &result {
            Ok(report) => {
                tracing::info!("{}", report);
                self.inner.state.send_replace(SyncState::Synced);
            }
            Err(error) => {
                tracing::warn!("Sync failed: {}", error);
                self.inner.state.send_replace(SyncState::Error);
            }
        }
        result
    }

    async fn round_trip(&self) -> Result<SyncReport, SyncError> {
        let local = self.inner.store.load_sessions().await?;

        let remote = match self.inner.remote.download().await {
            Ok(document) => document,
            Err(RemoteError::Auth(error)) => return Err(SyncError::Auth(error)),
            Err(error) => {
                tracing::warn!("Remote sessions unusable, uploading local only: {}", error);
                None
            }
        };

        let Some(remote) = remote else {
            let (upload, last_synced) = self.upload(local.clone(), Vec::new()).await?;
            return Ok(SyncReport {
                path: SyncPath::UploadOnly,
                local_count: local.len(),
                remote_count: None,
                merged_count: local.len(),
                last_synced,
                upload,
            });
        };

        let merged = merge_sessions(&local, Some(&remote.sessions));
        self.inner.store.replace_sessions(&merged).await?;
        let merged_count = merged.len();
        let opaque_entries = remote.opaque_entries_except(&merged);
        if !opaque_entries.is_empty() {
            tracing::debug!("Carrying {} undecodable remote entries", opaque_entries.len());
        }
        let (upload, last_synced) = self.upload(merged, opaque_entries).await?;

        Ok(SyncReport {
            path: SyncPath::Merged,
            local_count: local.len(),
            remote_count: Some(remote.sessions.len()),
            merged_count,
            last_synced,
            upload,
        })
    }

    async fn upload(
        &self,
        sessions: Vec<Session>,
        opaque_entries: Vec<serde_json::Value>,
    ) -> Result<(UploadOutcome, DateTime<Utc>), SyncError> {
        let document = RemoteDocument::new(sessions).with_opaque_entries(opaque_entries);
        let outcome = self
            .inner
            .remote
            .upload_document(&document)
            .await
            .map_err(SyncError::from_upload)?;
        Ok((outcome, document.last_synced))
    }
}

//! Session lifecycle: save, delete, restore, export and import.
//!
//! Every mutation persists locally first and then starts a background sync.
//! The sync never turns a successful mutation into a failure; callers that
//! care about its outcome await the returned [`SyncHandle`].

use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::export::{parse_sessions_import, render_sessions_export, ExportFormat};
use crate::models::{Session, SessionId};
use crate::remote::RemoteFileApi;
use crate::store::SessionStore;
use crate::sync::{merge_sessions, SyncEngine, SyncError, SyncReport};
use crate::windows::WindowSource;

/// A background sync started by a mutation.
#[derive(Debug)]
pub struct SyncHandle {
    task: JoinHandle<Option<SyncReport>>,
}

impl SyncHandle {
    /// Wait for the sync. `None` when it failed; the failure was already
    /// logged.
    pub async fn wait(self) -> Option<SyncReport> {
        match self.task.await {
            Ok(report) => report,
            Err(error) => {
                tracing::warn!("Background sync task did not complete: {}", error);
                None
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Result of a local mutation plus the sync it triggered, if any.
#[derive(Debug)]
pub struct Mutation<T> {
    pub value: T,
    pub sync: Option<SyncHandle>,
}

impl<T> Mutation<T> {
    /// Wait for the triggered sync to finish and return the value.
    pub async fn settle(self) -> (T, Option<SyncReport>) {
        let report = match self.sync {
            Some(handle) => handle.wait().await,
            None => None,
        };
        (self.value, report)
    }
}

/// Lifecycle operations over a store, a window source and an optional sync
/// engine. Without an engine every operation stays local.
pub struct SessionManager<S, W, A> {
    store: S,
    windows: W,
    sync: Option<SyncEngine<S, A>>,
}

impl<S, W, A> SessionManager<S, W, A>
where
    S: SessionStore,
    W: WindowSource,
    A: RemoteFileApi,
{
    pub fn new(store: S, windows: W, sync: Option<SyncEngine<S, A>>) -> Self {
        if sync.is_none() {
            tracing::info!("Running in local-only mode (no remote configured)");
        }
        Self {
            store,
            windows,
            sync,
        }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn windows(&self) -> &W {
        &self.windows
    }

    pub const fn sync_engine(&self) -> Option<&SyncEngine<S, A>> {
        self.sync.as_ref()
    }

    pub async fn list_sessions(&self) -> Result<Vec<Session>> {
        self.store.load_sessions().await
    }

    pub async fn get_session(&self, id: &SessionId) -> Result<Session> {
        self.store
            .load_sessions()
            .await?
            .into_iter()
            .find(|session| &session.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Capture every open window as a new session named `name`.
    pub async fn save_current_session(&self, name: &str) -> Result<Mutation<Session>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput(
                "session name must not be empty".to_string(),
            ));
        }

        let windows = self.windows.list_windows().await?;
        let session = Session::new(name, windows);

        let mut sessions = self.store.load_sessions().await?;
        sessions.push(session.clone());
        self.store.replace_sessions(&sessions).await?;
        tracing::info!(
            "Saved session {} ({}) with {} tabs",
            session.name,
            session.id,
            session.tab_count()
        );

        Ok(Mutation {
            value: session,
            sync: self.spawn_sync("save"),
        })
    }

    /// Remove every session with `id`. Returns whether anything was removed;
    /// an unknown id is not an error.
    pub async fn delete_session(&self, id: &SessionId) -> Result<Mutation<bool>> {
        let mut sessions = self.store.load_sessions().await?;
        let before = sessions.len();
        sessions.retain(|session| &session.id != id);
        let removed = sessions.len() != before;

        self.store.replace_sessions(&sessions).await?;
        if removed {
            tracing::info!("Deleted session {}", id);
        } else {
            tracing::debug!("No session {} to delete", id);
        }

        Ok(Mutation {
            value: removed,
            sync: self.spawn_sync("delete"),
        })
    }

    /// Replace every open window with the windows stored in session `id`.
    ///
    /// An unknown id fails before any window is closed.
    pub async fn restore_session(&self, id: &SessionId) -> Result<Session> {
        let session = self.get_session(id).await?;

        self.windows.close_all_windows().await?;
        for window in &session.windows {
            self.windows.create_window(&window.tab_urls()).await?;
        }
        tracing::info!(
            "Restored session {} into {} windows",
            session.name,
            session.windows.len()
        );
        Ok(session)
    }

    pub async fn export_sessions(&self, format: ExportFormat) -> Result<String> {
        let sessions = self.store.load_sessions().await?;
        render_sessions_export(&sessions, format)
    }

    /// Parse `data` completely, then fold the sessions into the store.
    ///
    /// A parse failure applies nothing. An imported id that already exists
    /// keeps whichever copy was saved later.
    pub async fn import_sessions(
        &self,
        data: &str,
        format: ExportFormat,
    ) -> Result<Mutation<Vec<Session>>> {
        let imported = parse_sessions_import(data, format)?;

        let existing = self.store.load_sessions().await?;
        let merged = merge_sessions(&existing, Some(&imported));
        self.store.replace_sessions(&merged).await?;
        tracing::info!("Imported {} sessions from {}", imported.len(), format);

        Ok(Mutation {
            value: imported,
            sync: self.spawn_sync("import"),
        })
    }

    /// Sync now and report the outcome.
    pub async fn sync_now(&self) -> std::result::Result<SyncReport, SyncError> {
        match &self.sync {
            Some(engine) => engine.sync().await,
            None => Err(SyncError::Disabled),
        }
    }

    fn spawn_sync(&self, trigger: &'static str) -> Option<SyncHandle> {
        let engine = self.sync.clone()?;
        let task = tokio::spawn(async move {
            match engine.sync().await {
                Ok(report) => Some(report),
                Err(error) => {
                    tracing::warn!("Sync after {} failed: {}", trigger, error);
                    None
                }
            }
        });
        Some(SyncHandle { task })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Tab, Window};
    use crate::remote::{MemoryFileApi, RemoteStore};
    use crate::store::MemorySessionStore;
    use crate::windows::MemoryWindowSource;
    use pretty_assertions::assert_eq;

    type Manager = SessionManager<MemorySessionStore, MemoryWindowSource, MemoryFileApi>;

    fn open_windows() -> MemoryWindowSource {
        MemoryWindowSource::with_windows(vec![
            Window {
                id: Some(1),
                tabs: vec![
                    Tab::new("Rust", "https://www.rust-lang.org/"),
                    Tab::new("Crates", "https://crates.io/"),
                ],
            },
            Window {
                id: Some(2),
                tabs: vec![Tab::new("Tokio", "https://tokio.rs/")],
            },
        ])
    }

    fn synced_manager(api: &MemoryFileApi, store: MemorySessionStore) -> Manager {
        let engine = SyncEngine::new(store.clone(), RemoteStore::new(api.clone()));
        SessionManager::new(store, open_windows(), Some(engine))
    }

    fn local_manager(store: MemorySessionStore) -> Manager {
        SessionManager::new(store, open_windows(), None)
    }

    fn stored(id: &str, saved_at: &str) -> Session {
        Session {
            id: SessionId::from(id),
            name: format!("stored {id}"),
            saved_at: saved_at.parse().unwrap(),
            windows: vec![Window::synthetic(vec![Tab::new("A", "https://a.example/")])],
        }
    }

    #[tokio::test]
    async fn save_captures_windows_and_syncs() {
        let api = MemoryFileApi::new();
        let manager = synced_manager(&api, MemorySessionStore::new());

        let mutation = manager.save_current_session("  Trip ").await.unwrap();
        let (session, report) = mutation.settle().await;

        assert_eq!(session.name, "Trip");
        assert_eq!(session.windows.len(), 2);
        assert_eq!(session.tab_count(), 3);
        assert!(report.is_some());
        assert_eq!(manager.list_sessions().await.unwrap(), vec![session.clone()]);
        assert_eq!(api.document().unwrap().sessions, vec![session]);
    }

    #[tokio::test]
    async fn save_rejects_blank_name() {
        let manager = local_manager(MemorySessionStore::new());
        assert!(matches!(
            manager.save_current_session("   ").await,
            Err(Error::InvalidInput(_))
        ));
        assert!(manager.list_sessions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_succeeds_when_sync_fails() {
        let api = MemoryFileApi::new();
        api.fail_auth(true);
        let manager = synced_manager(&api, MemorySessionStore::new());

        let mutation = manager.save_current_session("Offline").await.unwrap();
        let (session, report) = mutation.settle().await;

        assert!(report.is_none());
        assert_eq!(manager.list_sessions().await.unwrap(), vec![session]);
    }

    #[tokio::test]
    async fn local_only_manager_never_syncs() {
        let manager = local_manager(MemorySessionStore::new());

        let mutation = manager.save_current_session("Local").await.unwrap();
        assert!(mutation.sync.is_none());
        assert!(matches!(
            manager.sync_now().await,
            Err(SyncError::Disabled)
        ));
    }

    #[tokio::test]
    async fn delete_of_absent_id_is_a_noop() {
        let sessions = vec![stored("1", "2024-01-01T00:00:00Z")];
        let manager = local_manager(MemorySessionStore::with_sessions(sessions.clone()));
        let missing = SessionId::from("404");

        for _ in 0..2 {
            let mutation = manager.delete_session(&missing).await.unwrap();
            assert!(!mutation.value);
            assert_eq!(manager.list_sessions().await.unwrap(), sessions);
        }
    }

    #[tokio::test]
    async fn delete_removes_matching_sessions_and_syncs() {
        let api = MemoryFileApi::new();
        let store = MemorySessionStore::with_sessions(vec![
            stored("1", "2024-01-01T00:00:00Z"),
            stored("2", "2024-01-01T00:00:00Z"),
        ]);
        let manager = synced_manager(&api, store);

        let (removed, report) = manager
            .delete_session(&SessionId::from("1"))
            .await
            .unwrap()
            .settle()
            .await;

        assert!(removed);
        assert!(report.is_some());
        let remaining = manager.list_sessions().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id.as_str(), "2");
        assert_eq!(api.document().unwrap().sessions, remaining);
    }

    #[tokio::test]
    async fn restore_of_unknown_id_keeps_windows_open() {
        let manager = local_manager(MemorySessionStore::new());
        let before = manager.windows().windows();

        let error = manager
            .restore_session(&SessionId::from("nonexistent"))
            .await
            .unwrap_err();

        assert!(matches!(error, Error::NotFound(_)));
        assert_eq!(manager.windows().close_calls(), 0);
        assert_eq!(manager.windows().windows(), before);
    }

    #[tokio::test]
    async fn restore_replaces_windows_with_stored_urls() {
        let manager = local_manager(MemorySessionStore::new());
        let (saved, _) = manager
            .save_current_session("Snapshot")
            .await
            .unwrap()
            .settle()
            .await;
        manager
            .windows()
            .create_window(&["https://stray.example/".to_string()])
            .await
            .unwrap();

        manager.restore_session(&saved.id).await.unwrap();

        let windows = manager.windows().windows();
        assert_eq!(manager.windows().close_calls(), 1);
        assert_eq!(windows.len(), 2);
        assert_eq!(
            windows[0].tab_urls(),
            vec!["https://www.rust-lang.org/".to_string(), "https://crates.io/".to_string()]
        );
        assert_eq!(windows[1].tab_urls(), vec!["https://tokio.rs/".to_string()]);
    }

    #[tokio::test]
    async fn json_export_import_into_empty_store_is_identity() {
        let sessions = vec![
            stored("1", "2024-01-01T00:00:00Z"),
            stored("2", "2024-01-02T00:00:00Z"),
        ];
        let source = local_manager(MemorySessionStore::with_sessions(sessions.clone()));
        let data = source.export_sessions(ExportFormat::Json).await.unwrap();

        let target = local_manager(MemorySessionStore::new());
        target.import_sessions(&data, ExportFormat::Json).await.unwrap();

        assert_eq!(target.list_sessions().await.unwrap(), sessions);
    }

    #[tokio::test]
    async fn malformed_import_applies_nothing() {
        let sessions = vec![stored("1", "2024-01-01T00:00:00Z")];
        let manager = local_manager(MemorySessionStore::with_sessions(sessions.clone()));

        let error = manager
            .import_sessions("garbage before header\nSession: X\n", ExportFormat::Txt)
            .await
            .unwrap_err();

        assert!(matches!(error, Error::MalformedImport { .. }));
        assert_eq!(manager.list_sessions().await.unwrap(), sessions);
    }

    #[tokio::test]
    async fn import_keeps_later_copy_of_existing_id() {
        let older = stored("1", "2024-01-01T00:00:00Z");
        let mut newer = stored("1", "2024-02-01T00:00:00Z");
        newer.name = "renamed".to_string();
        let manager = local_manager(MemorySessionStore::with_sessions(vec![older]));

        let data = serde_json::to_string(&vec![newer.clone(), stored("2", "2024-01-01T00:00:00Z")])
            .unwrap();
        manager.import_sessions(&data, ExportFormat::Json).await.unwrap();

        let sessions = manager.list_sessions().await.unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0], newer);
    }

    #[tokio::test]
    async fn saved_session_survives_round_trip_through_remote() {
        let api = MemoryFileApi::new();
        let first_device = synced_manager(&api, MemorySessionStore::new());
        let (trip, _) = first_device
            .save_current_session("Trip")
            .await
            .unwrap()
            .settle()
            .await;
        first_device.sync_now().await.unwrap();

        let second_device = synced_manager(&api, MemorySessionStore::new());
        second_device.sync_now().await.unwrap();

        let restored = second_device.get_session(&trip.id).await.unwrap();
        assert_eq!(restored, trip);
    }
}

use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;
use tabsync_core::db::SqliteSessionStore;
use tabsync_core::remote::{DriveFileApi, FolderFileApi, RemoteStore};
use tabsync_core::services::{SessionManager, SyncHandle};
use tabsync_core::sync::SyncEngine;
use tabsync_core::windows::FileWindowSource;
use tabsync_core::{Session, SessionId};

use crate::auth::ProfileTokenProvider;
use crate::config_profiles::{default_config_path, CliProfile, CliProfilesConfig, RemoteKind};
use crate::error::CliError;
use crate::remote_backend::RemoteBackend;

pub type CliSessionManager = SessionManager<SqliteSessionStore, FileWindowSource, RemoteBackend>;

/// Paths and profile selection shared by every command.
#[derive(Debug, Clone)]
pub struct CliContext {
    pub db_path: PathBuf,
    pub config_path: PathBuf,
    pub profile: Option<String>,
}

impl CliContext {
    pub fn resolve(db_path: Option<PathBuf>, profile: Option<String>) -> Result<Self, CliError> {
        Ok(Self {
            db_path: resolve_db_path(db_path)?,
            config_path: resolve_config_path()?,
            profile,
        })
    }

    pub fn load_config(&self) -> Result<CliProfilesConfig, CliError> {
        CliProfilesConfig::load_from_path(&self.config_path).map_err(CliError::Config)
    }

    pub fn save_config(&self, config: &CliProfilesConfig) -> Result<(), CliError> {
        config
            .save_to_path(&self.config_path)
            .map_err(CliError::Config)
    }

    /// Profile name from a per-command override, the global flag, env, or
    /// the active profile.
    pub fn profile_name(&self, config: &CliProfilesConfig, explicit: Option<&str>) -> String {
        config.resolve_profile_name(explicit.or(self.profile.as_deref()))
    }
}

#[derive(Debug, Serialize)]
pub struct SessionListItem {
    pub id: String,
    pub name: String,
    pub saved_at: String,
    pub relative_time: String,
    pub window_count: usize,
    pub tab_count: usize,
}

pub async fn open_store(context: &CliContext) -> Result<SqliteSessionStore, CliError> {
    Ok(SqliteSessionStore::open(&context.db_path).await?)
}

pub async fn open_manager(context: &CliContext) -> Result<CliSessionManager, CliError> {
    let config = context.load_config()?;
    let profile_name = context.profile_name(&config, None);
    let profile = config.profile(&profile_name).cloned().unwrap_or_default();

    let store = open_store(context).await?;
    let windows = FileWindowSource::new(profile.window_state_path().map_err(CliError::Config)?);
    let engine = build_remote_backend(&profile_name, &profile)?.map(|backend| {
        tracing::debug!("Profile {} syncs through the {} remote", profile_name, backend.label());
        SyncEngine::new(store.clone(), RemoteStore::new(backend))
    });

    Ok(SessionManager::new(store, windows, engine))
}

pub fn build_remote_backend(
    profile_name: &str,
    profile: &CliProfile,
) -> Result<Option<RemoteBackend>, CliError> {
    match profile.remote {
        None => Ok(None),
        Some(RemoteKind::Drive) => {
            let api = DriveFileApi::new(
                &profile.drive_config(),
                ProfileTokenProvider::new(profile_name),
            )?;
            Ok(Some(RemoteBackend::Drive(api)))
        }
        Some(RemoteKind::Folder) => {
            let folder = profile.folder_path.clone().ok_or_else(|| {
                CliError::Config(format!(
                    "Profile '{profile_name}' uses the folder remote but has no folder. Run `tabsync config init --profile {profile_name} --folder <PATH>`."
                ))
            })?;
            Ok(Some(RemoteBackend::Folder(FolderFileApi::new(folder))))
        }
    }
}

/// Wait for the sync a mutation started so the process does not exit
/// under it.
pub async fn finish_background_sync(sync: Option<SyncHandle>) {
    let Some(handle) = sync else {
        return;
    };
    match handle.wait().await {
        Some(report) => tracing::info!("{}", report),
        None => eprintln!("Sync failed; changes are saved locally and will sync later."),
    }
}

pub fn session_to_list_item(session: &Session) -> SessionListItem {
    let now_ms = Utc::now().timestamp_millis();
    SessionListItem {
        id: session.id.to_string(),
        name: session.name.clone(),
        saved_at: session.saved_at.to_rfc3339(),
        relative_time: format_relative_time(session.saved_at.timestamp_millis(), now_ms),
        window_count: session.windows.len(),
        tab_count: session.tab_count(),
    }
}

pub fn format_session_lines(sessions: &[Session]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    sessions
        .iter()
        .map(|session| {
            let id = session.id.to_string();
            let name = truncate_chars(&session.name, 32);
            let tabs = format!("{} tabs", session.tab_count());
            let relative_time = format_relative_time(session.saved_at.timestamp_millis(), now_ms);
            format!("{id:<20}  {name:<32}  {tabs:<9}  {relative_time}")
        })
        .collect()
}

pub fn format_session_detail(session: &Session) -> Vec<String> {
    let mut lines = vec![
        format!("{} ({})", session.name, session.id),
        format!("Saved {}", format_timestamp(session.saved_at.timestamp_millis())),
    ];
    for (index, window) in session.windows.iter().enumerate() {
        lines.push(format!("Window {} ({} tabs)", index + 1, window.tabs.len()));
        for tab in &window.tabs {
            if tab.title == tab.url {
                lines.push(format!("  {}", tab.url));
            } else {
                lines.push(format!("  {}  {}", truncate_chars(&tab.title, 48), tab.url));
            }
        }
    }
    lines
}

pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    let char_count = value.chars().count();
    if char_count <= max_chars {
        return value.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let truncated = value.chars().take(keep).collect::<String>();
    format!("{truncated}...")
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn normalize_session_name(name_parts: &[String]) -> Result<String, CliError> {
    let name = name_parts.join(" ");
    let name = name.trim();
    if name.is_empty() {
        return Err(CliError::EmptySessionName);
    }
    Ok(name.to_string())
}

pub fn parse_session_id(id: &str) -> Result<SessionId, CliError> {
    id.trim()
        .parse::<SessionId>()
        .map_err(|_| CliError::EmptySessionId)
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_db_path.or_else(|| env::var_os("TABSYNC_DB_PATH").map(PathBuf::from))
    {
        return Ok(path);
    }
    default_db_path()
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("tabsync").join("tabsync.db"))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI data directory".to_string()))
}

fn resolve_config_path() -> Result<PathBuf, CliError> {
    if let Some(path) = env::var_os("TABSYNC_CONFIG_PATH") {
        return Ok(PathBuf::from(path));
    }
    default_config_path().map_err(CliError::Config)
}

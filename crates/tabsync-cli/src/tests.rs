use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{CommandFactory, Parser};

use pretty_assertions::assert_eq;
use tabsync_core::export::ExportFormat;
use tabsync_core::models::{RemoteDocument, REMOTE_FILE_NAME};
use tabsync_core::store::{PreferencesStore, SessionStore};
use tabsync_core::{Tab, Window};

use crate::auth::{store_token, AccessToken, DRIVE_TOKEN_ENV};
use crate::cli::{Cli, Commands, CompletionShell, ExportFormatArg};
use crate::commands::auth_cmd::auth_status_line;
use crate::commands::common::{
    build_remote_backend, format_relative_time, format_session_detail, normalize_session_name,
    open_store, parse_session_id, truncate_chars, CliContext,
};
use crate::commands::completions::render_completions;
use crate::commands::config::{apply_profile_update, run_config_init, run_set_interval, ProfileUpdate};
use crate::commands::delete::run_delete;
use crate::commands::export::{resolve_export_format, run_export, run_import};
use crate::commands::restore::run_restore;
use crate::commands::save::run_save;
use crate::commands::sync::{resolve_daemon_interval, run_sync};
use crate::config_profiles::{CliProfile, RemoteKind};
use crate::error::CliError;

struct TestEnv {
    _dir: tempfile::TempDir,
    root: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        Self { _dir: dir, root }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// A device with its own database and window state sharing one config.
    fn device(&self, name: &str) -> CliContext {
        CliContext {
            db_path: self.path(&format!("{name}.db")),
            config_path: self.path("cli-config.json"),
            profile: Some(name.to_string()),
        }
    }

    fn init_folder_profile(&self, context: &CliContext, device: &str) {
        let update = ProfileUpdate {
            folder: Some(self.path("drive")),
            window_state: Some(self.window_state_path(device)),
            ..ProfileUpdate::default()
        };
        run_config_init(None, update, false, context).unwrap();
    }

    fn init_local_profile(&self, context: &CliContext, device: &str) {
        let update = ProfileUpdate {
            window_state: Some(self.window_state_path(device)),
            ..ProfileUpdate::default()
        };
        run_config_init(None, update, false, context).unwrap();
    }

    fn window_state_path(&self, device: &str) -> PathBuf {
        self.path(&format!("{device}-windows.json"))
    }

    fn write_windows(&self, device: &str, windows: &[Window]) {
        std::fs::write(
            self.window_state_path(device),
            serde_json::to_vec(windows).unwrap(),
        )
        .unwrap();
    }

    fn read_windows(&self, device: &str) -> Vec<Window> {
        let raw = std::fs::read(self.window_state_path(device)).unwrap();
        serde_json::from_slice(&raw).unwrap()
    }

    fn remote_document(&self) -> Option<RemoteDocument> {
        let raw = std::fs::read(self.path("drive").join(REMOTE_FILE_NAME)).ok()?;
        RemoteDocument::from_slice_lenient(&raw).ok()
    }
}

fn browsing_windows() -> Vec<Window> {
    vec![
        Window {
            id: Some(7),
            tabs: vec![
                Tab::new("Rust", "https://www.rust-lang.org/"),
                Tab::new("Docs", "https://docs.rs/"),
            ],
        },
        Window {
            id: Some(9),
            tabs: vec![Tab::new("News", "https://news.ycombinator.com/")],
        },
    ]
}

async fn stored_sessions(context: &CliContext) -> Vec<tabsync_core::Session> {
    open_store(context).await.unwrap().load_sessions().await.unwrap()
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(ToString::to_string).collect()
}

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn global_flags_parse_after_subcommand() {
    let cli = Cli::try_parse_from([
        "tabsync",
        "daemon",
        "--interval",
        "5",
        "--profile",
        "laptop",
        "--db-path",
        "/tmp/tabsync.db",
    ])
    .unwrap();
    assert!(matches!(cli.command, Commands::Daemon { interval: Some(5) }));
    assert_eq!(cli.profile.as_deref(), Some("laptop"));
    assert_eq!(cli.db_path, Some(PathBuf::from("/tmp/tabsync.db")));
}

#[test]
fn format_relative_time_units() {
    let now = 10_000_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
    assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
    assert_eq!(format_relative_time(now - 3 * 24 * 60 * 60_000, now), "3d ago");
}

#[test]
fn truncate_chars_adds_ellipsis() {
    assert_eq!(truncate_chars("short", 10), "short");
    assert_eq!(
        truncate_chars("This is a very long session name", 20),
        "This is a very lo..."
    );
}

#[test]
fn session_name_is_joined_and_required() {
    assert_eq!(
        normalize_session_name(&args(&["  morning", "reading "])).unwrap(),
        "morning reading"
    );
    assert!(matches!(
        normalize_session_name(&args(&[" ", ""])),
        Err(CliError::EmptySessionName)
    ));
}

#[test]
fn blank_session_id_is_rejected() {
    assert!(matches!(
        parse_session_id("   "),
        Err(CliError::EmptySessionId)
    ));
    assert_eq!(parse_session_id(" abc123 ").unwrap().as_str(), "abc123");
}

#[test]
fn session_detail_lists_tabs_per_window() {
    let session = tabsync_core::Session::new("Reading", browsing_windows());
    let lines = format_session_detail(&session);
    assert!(lines[0].starts_with("Reading ("));
    assert!(lines.iter().any(|line| line == "Window 1 (2 tabs)"));
    assert!(lines.iter().any(|line| line == "Window 2 (1 tabs)"));
    assert!(lines
        .iter()
        .any(|line| line.contains("https://docs.rs/") && line.contains("Docs")));
}

#[test]
fn export_format_prefers_flag_then_extension() {
    assert_eq!(
        resolve_export_format(Some(ExportFormatArg::Txt), Some(Path::new("out.html"))).unwrap(),
        ExportFormat::Txt
    );
    assert_eq!(
        resolve_export_format(None, Some(Path::new("out.htm"))).unwrap(),
        ExportFormat::Html
    );
    assert_eq!(resolve_export_format(None, None).unwrap(), ExportFormat::Json);
    assert!(resolve_export_format(None, Some(Path::new("out.csv"))).is_err());
}

#[test]
fn folder_update_implies_folder_remote() {
    let profile = apply_profile_update(
        "laptop",
        &CliProfile::default(),
        ProfileUpdate {
            folder: Some(PathBuf::from("/tmp/sync")),
            ..ProfileUpdate::default()
        },
    )
    .unwrap();
    assert_eq!(profile.remote, Some(RemoteKind::Folder));
    assert_eq!(profile.folder_path, Some(PathBuf::from("/tmp/sync")));
}

#[test]
fn folder_remote_requires_folder() {
    let result = apply_profile_update(
        "laptop",
        &CliProfile::default(),
        ProfileUpdate {
            remote: Some(RemoteKind::Folder),
            ..ProfileUpdate::default()
        },
    );
    assert!(matches!(result, Err(CliError::Config(_))));
}

#[test]
fn drive_url_overrides_must_be_http() {
    let result = apply_profile_update(
        "laptop",
        &CliProfile::default(),
        ProfileUpdate {
            remote: Some(RemoteKind::Drive),
            drive_api_base_url: Some("drive.example.com/v3".to_string()),
            ..ProfileUpdate::default()
        },
    );
    assert!(matches!(result, Err(CliError::Config(_))));
}

#[test]
fn remote_backend_follows_profile() {
    assert!(build_remote_backend("local", &CliProfile::default())
        .unwrap()
        .is_none());

    let drive = CliProfile {
        remote: Some(RemoteKind::Drive),
        ..CliProfile::default()
    };
    let backend = build_remote_backend("laptop", &drive).unwrap().unwrap();
    assert_eq!(backend.label(), "drive");

    let folder = CliProfile {
        remote: Some(RemoteKind::Folder),
        folder_path: Some(PathBuf::from("/tmp/sync")),
        ..CliProfile::default()
    };
    let backend = build_remote_backend("laptop", &folder).unwrap().unwrap();
    assert_eq!(backend.label(), "folder");
}

#[test]
fn config_init_activates_profile() {
    let env = TestEnv::new();
    let context = env.device("laptop");
    env.init_folder_profile(&context, "laptop");

    let config = context.load_config().unwrap();
    assert_eq!(config.active_profile.as_deref(), Some("laptop"));
    let profile = config.profile("laptop").unwrap();
    assert_eq!(profile.remote, Some(RemoteKind::Folder));
    assert_eq!(profile.folder_path, Some(env.path("drive")));
}

#[test]
fn completions_reference_binary_name() {
    let script = String::from_utf8(render_completions(CompletionShell::Bash)).unwrap();
    assert!(script.contains("tabsync"));
    let script = String::from_utf8(render_completions(CompletionShell::Fish)).unwrap();
    assert!(script.contains("tabsync"));
}

#[test]
fn auth_status_reports_stored_token() {
    if std::env::var_os(DRIVE_TOKEN_ENV).is_some() {
        return;
    }
    assert_eq!(
        auth_status_line("status-missing").unwrap(),
        "Profile 'status-missing' is not signed in."
    );
    store_token("status-stored", &AccessToken::new("ya29.status").unwrap()).unwrap();
    assert_eq!(
        auth_status_line("status-stored").unwrap(),
        "Profile 'status-stored' has a stored Drive access token"
    );
}

#[tokio::test(flavor = "current_thread")]
async fn save_stores_locally_and_uploads() {
    let env = TestEnv::new();
    let context = env.device("laptop");
    env.init_folder_profile(&context, "laptop");
    env.write_windows("laptop", &browsing_windows());

    run_save(&args(&["Morning", "reading"]), &context)
        .await
        .unwrap();

    let sessions = stored_sessions(&context).await;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].name, "Morning reading");
    assert_eq!(sessions[0].tab_count(), 3);

    let document = env.remote_document().unwrap();
    assert_eq!(document.sessions, sessions);
}

#[tokio::test(flavor = "current_thread")]
async fn sync_converges_two_devices() {
    let env = TestEnv::new();
    let laptop = env.device("laptop");
    let desktop = env.device("desktop");
    env.init_folder_profile(&laptop, "laptop");
    env.init_folder_profile(&desktop, "desktop");
    env.write_windows("laptop", &browsing_windows());
    env.write_windows(
        "desktop",
        &[Window {
            id: Some(1),
            tabs: vec![Tab::new("Mail", "https://mail.example.com/")],
        }],
    );

    run_save(&args(&["Laptop"]), &laptop).await.unwrap();
    run_save(&args(&["Desktop"]), &desktop).await.unwrap();
    run_sync(&laptop).await.unwrap();

    let mut laptop_sessions = stored_sessions(&laptop).await;
    let mut desktop_sessions = stored_sessions(&desktop).await;
    assert_eq!(env.remote_document().unwrap().sessions, laptop_sessions);

    laptop_sessions.sort_by(|left, right| left.id.cmp(&right.id));
    desktop_sessions.sort_by(|left, right| left.id.cmp(&right.id));
    assert_eq!(laptop_sessions.len(), 2);
    assert_eq!(laptop_sessions, desktop_sessions);
}

#[tokio::test(flavor = "current_thread")]
async fn restore_replaces_open_windows() {
    let env = TestEnv::new();
    let context = env.device("laptop");
    env.init_local_profile(&context, "laptop");
    env.write_windows("laptop", &browsing_windows());

    run_save(&args(&["Reading"]), &context).await.unwrap();
    let session = stored_sessions(&context).await.remove(0);

    env.write_windows(
        "laptop",
        &[Window {
            id: Some(40),
            tabs: vec![Tab::new("Other", "https://example.com/")],
        }],
    );
    run_restore(session.id.as_str(), &context).await.unwrap();

    let urls = env
        .read_windows("laptop")
        .iter()
        .map(Window::tab_urls)
        .collect::<Vec<_>>();
    assert_eq!(
        urls,
        vec![
            vec![
                "https://www.rust-lang.org/".to_string(),
                "https://docs.rs/".to_string()
            ],
            vec!["https://news.ycombinator.com/".to_string()],
        ]
    );
}

#[tokio::test(flavor = "current_thread")]
async fn delete_removes_session_and_syncs() {
    let env = TestEnv::new();
    let context = env.device("laptop");
    env.init_folder_profile(&context, "laptop");
    env.write_windows("laptop", &browsing_windows());

    run_save(&args(&["Keep"]), &context).await.unwrap();
    run_save(&args(&["Drop"]), &context).await.unwrap();
    let dropped = stored_sessions(&context)
        .await
        .into_iter()
        .find(|session| session.name == "Drop")
        .unwrap();

    run_delete(dropped.id.as_str(), &context).await.unwrap();

    let names = stored_sessions(&context)
        .await
        .into_iter()
        .map(|session| session.name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Keep".to_string()]);
    assert_eq!(env.remote_document().unwrap().sessions.len(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn export_then_import_into_fresh_device() {
    let env = TestEnv::new();
    let laptop = env.device("laptop");
    let desktop = env.device("desktop");
    env.init_local_profile(&laptop, "laptop");
    env.init_local_profile(&desktop, "desktop");
    env.write_windows("laptop", &browsing_windows());

    run_save(&args(&["Exported"]), &laptop).await.unwrap();
    let export_path = env.path("sessions.json");
    run_export(None, Some(&export_path), &laptop).await.unwrap();
    run_import(&export_path, None, &desktop).await.unwrap();

    assert_eq!(stored_sessions(&desktop).await, stored_sessions(&laptop).await);
}

#[tokio::test(flavor = "current_thread")]
async fn malformed_import_changes_nothing() {
    let env = TestEnv::new();
    let context = env.device("laptop");
    env.init_local_profile(&context, "laptop");
    let import_path = env.path("broken.json");
    std::fs::write(&import_path, "{not json").unwrap();

    let result = run_import(&import_path, None, &context).await;
    assert!(matches!(result, Err(CliError::Core(_))));
    assert!(stored_sessions(&context).await.is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn sync_without_remote_is_not_configured() {
    let env = TestEnv::new();
    let context = env.device("laptop");
    env.init_local_profile(&context, "laptop");

    let result = run_sync(&context).await;
    assert!(matches!(result, Err(CliError::SyncNotConfigured)));
}

#[tokio::test(flavor = "current_thread")]
async fn daemon_interval_follows_saved_preference() {
    let env = TestEnv::new();
    let context = env.device("laptop");

    let store = open_store(&context).await.unwrap();
    assert_eq!(
        resolve_daemon_interval(None, &store).await.unwrap(),
        Duration::from_secs(30 * 60)
    );

    run_set_interval(5, &context).await.unwrap();
    assert_eq!(store.load_preferences().await.unwrap().sync_interval_minutes, 5);
    assert_eq!(
        resolve_daemon_interval(None, &store).await.unwrap(),
        Duration::from_secs(5 * 60)
    );
    assert_eq!(
        resolve_daemon_interval(Some(2), &store).await.unwrap(),
        Duration::from_secs(2 * 60)
    );
    assert!(matches!(
        resolve_daemon_interval(Some(0), &store).await,
        Err(CliError::InvalidInterval)
    ));
    assert!(matches!(
        run_set_interval(0, &context).await,
        Err(CliError::InvalidInterval)
    ));
}

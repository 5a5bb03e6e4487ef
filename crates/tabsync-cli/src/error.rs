use std::io;

use tabsync_core::auth::AuthError;
use tabsync_core::remote::RemoteError;
use tabsync_core::sync::SyncError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] tabsync_core::Error),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Session name cannot be empty")]
    EmptySessionName,
    #[error("Session ID cannot be empty")]
    EmptySessionId,
    #[error("No access token provided")]
    EmptyToken,
    #[error("Sync interval must be at least one minute")]
    InvalidInterval,
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(
        "Sync is not configured. Run `tabsync config init --remote drive` + `tabsync auth login`, or `tabsync config init --remote folder --folder <PATH>`."
    )]
    SyncNotConfigured,
}

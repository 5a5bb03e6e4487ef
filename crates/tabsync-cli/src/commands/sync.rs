use std::time::Duration;

use tabsync_core::store::PreferencesStore;
use tabsync_core::sync::{final_sync, spawn_periodic_sync, SyncError};

use crate::commands::common::{open_manager, CliContext};
use crate::error::CliError;

pub async fn run_sync(context: &CliContext) -> Result<(), CliError> {
    let manager = open_manager(context).await?;
    match manager.sync_now().await {
        Ok(report) => {
            println!("{report}");
            Ok(())
        }
        Err(SyncError::Disabled) => Err(CliError::SyncNotConfigured),
        Err(error) => Err(CliError::Sync(error)),
    }
}

/// Interval from the command line, else from the stored preference.
pub async fn resolve_daemon_interval(
    interval_minutes: Option<u64>,
    store: &impl PreferencesStore,
) -> Result<Duration, CliError> {
    match interval_minutes {
        Some(0) => Err(CliError::InvalidInterval),
        Some(minutes) => Ok(Duration::from_secs(minutes.saturating_mul(60))),
        None => Ok(store.load_preferences().await?.sync_interval()),
    }
}

pub async fn run_daemon(interval_minutes: Option<u64>, context: &CliContext) -> Result<(), CliError> {
    let manager = open_manager(context).await?;
    let engine = manager
        .sync_engine()
        .cloned()
        .ok_or(CliError::SyncNotConfigured)?;
    let interval = resolve_daemon_interval(interval_minutes, manager.store()).await?;

    println!(
        "Syncing every {} minutes; press Ctrl-C to stop.",
        interval.as_secs() / 60
    );
    let periodic = spawn_periodic_sync(engine.clone(), interval);

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down; waiting for any running sync");
    periodic.shutdown().await;

    tracing::info!("Running final sync");
    if let Some(report) = final_sync(&engine).await {
        println!("{report}");
    }
    Ok(())
}

use std::path::PathBuf;

use serde::Serialize;
use tabsync_core::store::PreferencesStore;

use crate::cli::ConfigCommands;
use crate::commands::common::{open_store, CliContext};
use crate::config_profiles::{normalize_text_option, CliProfile, RemoteKind};
use crate::error::CliError;

/// Field overrides accepted by `config init`.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub remote: Option<RemoteKind>,
    pub folder: Option<PathBuf>,
    pub drive_api_base_url: Option<String>,
    pub drive_upload_base_url: Option<String>,
    pub window_state: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ProfileView {
    profile: String,
    active: bool,
    config_path: PathBuf,
    db_path: PathBuf,
    remote: Option<RemoteKind>,
    folder_path: Option<PathBuf>,
    drive_api_base_url: Option<String>,
    drive_upload_base_url: Option<String>,
    window_state_path: Option<PathBuf>,
    sync_interval_minutes: u32,
}

pub async fn run_config(command: ConfigCommands, context: &CliContext) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            profile,
            remote,
            folder,
            drive_api_base_url,
            drive_upload_base_url,
            window_state,
            no_activate,
        } => {
            let update = ProfileUpdate {
                remote,
                folder,
                drive_api_base_url,
                drive_upload_base_url,
                window_state,
            };
            run_config_init(profile.as_deref(), update, no_activate, context)
        }
        ConfigCommands::Show => run_config_show(context).await,
        ConfigCommands::SetInterval { minutes } => run_set_interval(minutes, context).await,
    }
}

pub fn apply_profile_update(
    profile_name: &str,
    existing: &CliProfile,
    update: ProfileUpdate,
) -> Result<CliProfile, CliError> {
    let mut profile = existing.clone();
    if let Some(remote) = update.remote {
        profile.remote = Some(remote);
    }
    if let Some(folder) = update.folder {
        profile.folder_path = Some(folder);
        if profile.remote.is_none() {
            profile.remote = Some(RemoteKind::Folder);
        }
    }
    if let Some(url) = normalize_text_option(update.drive_api_base_url) {
        profile.drive_api_base_url = Some(url);
    }
    if let Some(url) = normalize_text_option(update.drive_upload_base_url) {
        profile.drive_upload_base_url = Some(url);
    }
    if let Some(path) = update.window_state {
        profile.window_state_path = Some(path);
    }

    if profile.remote == Some(RemoteKind::Folder) && profile.folder_path.is_none() {
        return Err(CliError::Config(format!(
            "Profile '{profile_name}' uses the folder remote; pass --folder <PATH>."
        )));
    }
    profile
        .drive_config()
        .resolve()
        .map_err(CliError::Config)?;

    Ok(profile)
}

pub fn run_config_init(
    profile_name: Option<&str>,
    update: ProfileUpdate,
    no_activate: bool,
    context: &CliContext,
) -> Result<(), CliError> {
    let mut config = context.load_config()?;
    let profile_name = context.profile_name(&config, profile_name);
    let existing = config.profile(&profile_name).cloned().unwrap_or_default();
    let profile = apply_profile_update(&profile_name, &existing, update)?;

    *config.profile_mut_or_default(&profile_name) = profile.clone();
    if !no_activate || config.active_profile.is_none() {
        config.active_profile = Some(profile_name.clone());
    }
    context.save_config(&config)?;

    let remote_label = profile.remote.map_or("none (local only)", RemoteKind::label);
    println!("Saved profile '{profile_name}' (remote: {remote_label})");
    if profile.remote == Some(RemoteKind::Drive) {
        println!("Run `tabsync auth login --profile {profile_name}` to store a Drive access token.");
    }
    println!("{}", context.config_path.display());
    Ok(())
}

pub async fn run_config_show(context: &CliContext) -> Result<(), CliError> {
    let config = context.load_config()?;
    let profile_name = context.profile_name(&config, None);
    let profile = config.profile(&profile_name).cloned().unwrap_or_default();
    let preferences = open_store(context).await?.load_preferences().await?;

    let view = ProfileView {
        active: config.active_profile.as_deref() == Some(profile_name.as_str()),
        profile: profile_name,
        config_path: context.config_path.clone(),
        db_path: context.db_path.clone(),
        remote: profile.remote,
        folder_path: profile.folder_path,
        drive_api_base_url: profile.drive_api_base_url,
        drive_upload_base_url: profile.drive_upload_base_url,
        window_state_path: profile.window_state_path,
        sync_interval_minutes: preferences.sync_interval_minutes,
    };
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

pub async fn run_set_interval(minutes: u32, context: &CliContext) -> Result<(), CliError> {
    if minutes == 0 {
        return Err(CliError::InvalidInterval);
    }
    let store = open_store(context).await?;
    let mut preferences = store.load_preferences().await?;
    preferences.sync_interval_minutes = minutes;
    store.save_preferences(&preferences).await?;
    println!("Sync interval set to {minutes} minutes");
    Ok(())
}

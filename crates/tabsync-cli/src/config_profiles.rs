//! Persistent CLI profile configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tabsync_core::config::DriveConfig;
pub use tabsync_core::util::normalize_text_option;

const CONFIG_FILE_NAME: &str = "cli-config.json";
const WINDOW_STATE_FILE_NAME: &str = "windows.json";
const DEFAULT_PROFILE_NAME: &str = "default";
const PROFILE_ENV: &str = "TABSYNC_PROFILE";

/// Where a profile keeps its remote sync document.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RemoteKind {
    /// Google Drive, authorized with a bearer token
    Drive,
    /// A local folder, e.g. one mirrored by a desktop drive client
    Folder,
}

impl RemoteKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Drive => "drive",
            Self::Folder => "folder",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliProfilesConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    #[serde(default)]
    pub active_profile: Option<String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, CliProfile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliProfile {
    /// No remote means local-only mode.
    #[serde(default)]
    pub remote: Option<RemoteKind>,
    #[serde(default)]
    pub drive_api_base_url: Option<String>,
    #[serde(default)]
    pub drive_upload_base_url: Option<String>,
    #[serde(default)]
    pub folder_path: Option<PathBuf>,
    #[serde(default)]
    pub window_state_path: Option<PathBuf>,
}

const fn default_config_version() -> u32 {
    1
}

pub fn default_config_path() -> Result<PathBuf, String> {
    dirs::config_dir()
        .map(|dir| dir.join("tabsync").join(CONFIG_FILE_NAME))
        .ok_or_else(|| "Failed to resolve CLI config directory".to_string())
}

pub fn default_window_state_path() -> Result<PathBuf, String> {
    dirs::data_dir()
        .map(|dir| dir.join("tabsync").join(WINDOW_STATE_FILE_NAME))
        .ok_or_else(|| "Failed to resolve CLI data directory".to_string())
}

pub fn normalize_profile_name(value: Option<&str>) -> Option<String> {
    normalize_text_option(value.map(str::to_string))
}

fn normalize_path_option(value: Option<PathBuf>) -> Option<PathBuf> {
    value.filter(|path| !path.as_os_str().is_empty())
}

impl CliProfilesConfig {
    /// Load the config, treating a missing file as an empty config.
    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(error) => {
                return Err(format!("Cannot read {}: {error}", path.display()));
            }
        };
        let mut config = serde_json::from_str::<Self>(&raw)
            .map_err(|error| format!("Invalid CLI config {}: {error}", path.display()))?;
        config.normalize();
        Ok(config)
    }

    /// Write the normalized config through a temp file and rename.
    pub fn save_to_path(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|error| format!("Cannot create {}: {error}", parent.display()))?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)
            .map_err(|error| format!("Cannot serialize CLI config: {error}"))?;
        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, serialized)
            .and_then(|()| std::fs::rename(&temp_path, path))
            .map_err(|error| format!("Cannot write {}: {error}", path.display()))
    }

    /// Explicit name, then `TABSYNC_PROFILE`, then the active profile.
    pub fn resolve_profile_name(&self, explicit: Option<&str>) -> String {
        normalize_profile_name(explicit)
            .or_else(|| normalize_profile_name(std::env::var(PROFILE_ENV).ok().as_deref()))
            .or_else(|| normalize_profile_name(self.active_profile.as_deref()))
            .unwrap_or_else(|| DEFAULT_PROFILE_NAME.to_string())
    }

    pub fn profile(&self, name: &str) -> Option<&CliProfile> {
        self.profiles.get(name)
    }

    pub fn profile_mut_or_default(&mut self, name: &str) -> &mut CliProfile {
        self.profiles.entry(name.to_string()).or_default()
    }

    fn normalize(&mut self) {
        self.active_profile = normalize_profile_name(self.active_profile.as_deref());
        for profile in self.profiles.values_mut() {
            profile.normalize();
        }
    }
}

impl CliProfile {
    pub fn drive_config(&self) -> DriveConfig {
        DriveConfig {
            api_base_url: normalize_text_option(self.drive_api_base_url.clone()),
            upload_base_url: normalize_text_option(self.drive_upload_base_url.clone()),
        }
    }

    /// Window state file, falling back to the shared default location.
    pub fn window_state_path(&self) -> Result<PathBuf, String> {
        match normalize_path_option(self.window_state_path.clone()) {
            Some(path) => Ok(path),
            None => default_window_state_path(),
        }
    }

    fn normalize(&mut self) {
        self.drive_api_base_url = normalize_text_option(self.drive_api_base_url.clone());
        self.drive_upload_base_url = normalize_text_option(self.drive_upload_base_url.clone());
        self.folder_path = normalize_path_option(self.folder_path.clone());
        self.window_state_path = normalize_path_option(self.window_state_path.clone());
    }
}

//! User preferences model

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Background sync interval used when none is stored.
pub const DEFAULT_SYNC_INTERVAL_MINUTES: u32 = 30;

/// User preferences, persisted separately from the session collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Minutes between background syncs
    #[serde(default = "default_sync_interval_minutes")]
    pub sync_interval_minutes: u32,
}

const fn default_sync_interval_minutes() -> u32 {
    DEFAULT_SYNC_INTERVAL_MINUTES
}

impl Preferences {
    /// Background sync interval, never shorter than one minute.
    #[must_use]
    pub const fn sync_interval(&self) -> Duration {
        let minutes = if self.sync_interval_minutes == 0 {
            1
        } else {
            self.sync_interval_minutes
        };
        Duration::from_secs(minutes as u64 * 60)
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            sync_interval_minutes: DEFAULT_SYNC_INTERVAL_MINUTES,
        }
    }
}

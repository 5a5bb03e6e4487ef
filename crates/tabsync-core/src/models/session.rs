//! Session model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::util::unix_timestamp_millis_now;

/// Last millisecond value handed out by [`SessionId::generate`].
static LAST_ISSUED_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Opaque, time-derived session identifier.
///
/// Generated ids are decimal Unix milliseconds. Ids read from storage or from
/// another device are kept verbatim, whatever their shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new id from the current time.
    ///
    /// Two calls within the same millisecond still yield distinct ids: the
    /// second one is bumped past the last issued value.
    #[must_use]
    pub fn generate() -> Self {
        let now = unix_timestamp_millis_now();
        let mut last = LAST_ISSUED_MILLIS.load(Ordering::Relaxed);
        loop {
            let next = now.max(last + 1);
            match LAST_ISSUED_MILLIS.compare_exchange_weak(
                last,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Self(next.to_string()),
                Err(observed) => last = observed,
            }
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionId {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(crate::Error::InvalidInput(
                "session id must not be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A single captured tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fav_icon_url: Option<String>,
}

impl Tab {
    #[must_use]
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            fav_icon_url: None,
        }
    }
}

/// A captured browser window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    /// Browser-assigned id; not preserved across restore.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub tabs: Vec<Tab>,
}

impl Window {
    /// Window with no browser id, as rebuilt by lossy imports.
    #[must_use]
    pub const fn synthetic(tabs: Vec<Tab>) -> Self {
        Self { id: None, tabs }
    }

    /// URLs of this window's tabs in order.
    pub fn tab_urls(&self) -> Vec<String> {
        self.tabs.iter().map(|tab| tab.url.clone()).collect()
    }
}

/// A named snapshot of windows and their tabs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Identity used by the merge
    pub id: SessionId,
    pub name: String,
    /// Save time; the only ordering signal for conflict resolution
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub windows: Vec<Window>,
}

impl Session {
    /// Create a session saved now with a freshly generated id
    #[must_use]
    pub fn new(name: impl Into<String>, windows: Vec<Window>) -> Self {
        Self {
            id: SessionId::generate(),
            name: name.into(),
            saved_at: Utc::now(),
            windows,
        }
    }

    /// Total number of tabs across all windows
    #[must_use]
    pub fn tab_count(&self) -> usize {
        self.windows.iter().map(|window| window.tabs.len()).sum()
    }

    /// Iterate tabs across all windows in display order
    pub fn tabs(&self) -> impl Iterator<Item = &Tab> {
        self.windows.iter().flat_map(|window| window.tabs.iter())
    }
}

//! Drive endpoint configuration shared by all clients.
//!
//! Endpoints default to the public Google Drive v3 API. Overrides exist so
//! that a compatible proxy or a local test server can stand in for it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::util::{is_http_url, normalize_text_option};

pub const DEFAULT_DRIVE_API_BASE_URL: &str = "https://www.googleapis.com/drive/v3";
pub const DEFAULT_DRIVE_UPLOAD_BASE_URL: &str = "https://www.googleapis.com/upload/drive/v3";
pub const DRIVE_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// User-overridable drive endpoints. Unset fields use the public API.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DriveConfig {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub upload_base_url: Option<String>,
}

/// Validated endpoints with trailing slashes removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveEndpoints {
    pub api_base_url: String,
    pub upload_base_url: String,
}

impl Default for DriveEndpoints {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_DRIVE_API_BASE_URL.to_string(),
            upload_base_url: DEFAULT_DRIVE_UPLOAD_BASE_URL.to_string(),
        }
    }
}

impl DriveConfig {
    /// Apply defaults and validate both endpoints.
    pub fn resolve(&self) -> Result<DriveEndpoints, String> {
        let api_base_url = resolve_url(
            self.api_base_url.clone(),
            DEFAULT_DRIVE_API_BASE_URL,
            "api_base_url",
        )?;
        let upload_base_url = resolve_url(
            self.upload_base_url.clone(),
            DEFAULT_DRIVE_UPLOAD_BASE_URL,
            "upload_base_url",
        )?;
        Ok(DriveEndpoints {
            api_base_url,
            upload_base_url,
        })
    }
}

fn resolve_url(raw: Option<String>, default: &str, field: &str) -> Result<String, String> {
    let Some(value) = normalize_text_option(raw) else {
        return Ok(default.to_string());
    };
    if is_http_url(&value) {
        Ok(value.trim_end_matches('/').to_string())
    } else {
        Err(format!("drive field '{field}' must include http:// or https://"))
    }
}

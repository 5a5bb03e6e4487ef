//! Google Drive v3 file client.

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::{FileId, RemoteError, RemoteFileApi, RemoteResult};
use crate::auth::{AuthError, TokenProvider};
use crate::config::{DriveConfig, DriveEndpoints, DRIVE_HTTP_TIMEOUT};
use crate::util::compact_text;

/// Drive file API authenticated through a [`TokenProvider`].
#[derive(Debug, Clone)]
pub struct DriveFileApi<T> {
    endpoints: DriveEndpoints,
    client: reqwest::Client,
    tokens: T,
}

impl<T: TokenProvider> DriveFileApi<T> {
    /// Build a client against the configured (or public) endpoints.
    pub fn new(config: &DriveConfig, tokens: T) -> RemoteResult<Self> {
        let endpoints = config
            .resolve()
            .map_err(RemoteError::InvalidConfiguration)?;
        let client = reqwest::Client::builder()
            .timeout(DRIVE_HTTP_TIMEOUT)
            .build()?;
        Ok(Self {
            endpoints,
            client,
            tokens,
        })
    }

    pub const fn endpoints(&self) -> &DriveEndpoints {
        &self.endpoints
    }

    async fn send(&self, request: RequestBuilder) -> RemoteResult<Response> {
        let token = self.tokens.access_token().await?;
        let response = request.bearer_auth(token.secret()).send().await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(classify_error(status, &body))
    }
}

impl<T: TokenProvider> RemoteFileApi for DriveFileApi<T> {
    async fn find_file_by_name(&self, name: &str) -> RemoteResult<Option<FileId>> {
        let query = format!("name='{}' and trashed=false", escape_query_literal(name));
        let request = self
            .client
            .get(format!("{}/files", self.endpoints.api_base_url))
            .query(&[
                ("q", query.as_str()),
                ("spaces", "drive"),
                ("fields", "files(id,name,modifiedTime)"),
            ])
            .header(ACCEPT, "application/json");

        let listing = self.send(request).await?.json::<FileList>().await?;
        if listing.files.len() > 1 {
            tracing::warn!(
                "{} files named {} found, using the first",
                listing.files.len(),
                name
            );
        }
        Ok(listing.files.into_iter().next().map(|file| FileId(file.id)))
    }

    async fn create_file(&self, name: &str, mime_type: &str) -> RemoteResult<FileId> {
        let request = self
            .client
            .post(format!("{}/files", self.endpoints.api_base_url))
            .query(&[("fields", "id,name")])
            .header(ACCEPT, "application/json")
            .json(&CreateFileRequest { name, mime_type });

        let created = self.send(request).await?.json::<FileResource>().await?;
        tracing::debug!("Created drive file {} ({})", name, created.id);
        Ok(FileId(created.id))
    }

    async fn write_file_content(
        &self,
        file_id: &FileId,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> RemoteResult<()> {
        let request = self
            .client
            .patch(format!(
                "{}/files/{}",
                self.endpoints.upload_base_url,
                urlencoding::encode(file_id.as_str())
            ))
            .query(&[("uploadType", "media"), ("fields", "id,modifiedTime")])
            .header(CONTENT_TYPE, mime_type)
            .body(bytes);

        self.send(request).await?;
        Ok(())
    }

    async fn read_file_content(&self, file_id: &FileId) -> RemoteResult<Vec<u8>> {
        let request = self
            .client
            .get(format!(
                "{}/files/{}",
                self.endpoints.api_base_url,
                urlencoding::encode(file_id.as_str())
            ))
            .query(&[("alt", "media")]);

        let bytes = self.send(request).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileResource>,
}

#[derive(Debug, Deserialize)]
struct FileResource {
    id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateFileRequest<'a> {
    name: &'a str,
    mime_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct DriveErrorBody {
    error: Option<DriveErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct DriveErrorDetail {
    message: Option<String>,
    #[serde(default)]
    errors: Vec<DriveErrorReason>,
}

#[derive(Debug, Deserialize)]
struct DriveErrorReason {
    reason: Option<String>,
}

/// 403 reasons that mean the request is throttled or over quota, not refused.
const RETRYABLE_FORBIDDEN_REASONS: &[&str] = &[
    "rateLimitExceeded",
    "userRateLimitExceeded",
    "sharingRateLimitExceeded",
    "dailyLimitExceeded",
    "quotaExceeded",
    "storageQuotaExceeded",
];

fn error_reasons(body: &str) -> Vec<String> {
    serde_json::from_str::<DriveErrorBody>(body)
        .ok()
        .and_then(|payload| payload.error)
        .map(|detail| {
            detail
                .errors
                .into_iter()
                .filter_map(|entry| entry.reason)
                .collect()
        })
        .unwrap_or_default()
}

/// Map a failed Drive response to a [`RemoteError`].
///
/// 401 is always an authorization failure. 403 is one too, unless Drive
/// reports a rate limit or quota reason.
fn classify_error(status: StatusCode, body: &str) -> RemoteError {
    let message = parse_api_error(status, body);
    match status {
        StatusCode::UNAUTHORIZED => AuthError::Denied(message).into(),
        StatusCode::FORBIDDEN => {
            let reasons = error_reasons(body);
            if reasons
                .iter()
                .any(|reason| RETRYABLE_FORBIDDEN_REASONS.contains(&reason.as_str()))
            {
                RemoteError::Api(message)
            } else {
                AuthError::Denied(message).into()
            }
        }
        StatusCode::NOT_FOUND => RemoteError::NotFound(message),
        _ => RemoteError::Api(message),
    }
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<DriveErrorBody>(body) {
        if let Some(message) = payload.error.and_then(|detail| detail.message) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

/// Escape a value for use inside a single-quoted Drive query literal.
fn escape_query_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

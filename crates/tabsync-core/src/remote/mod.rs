//! Remote file storage.
//!
//! [`RemoteFileApi`] is the four-primitive contract any cloud drive has to
//! offer. [`RemoteStore`] builds the sync document protocol on top of it:
//! locate the well-known file, read it, and overwrite or create it.

mod drive;
mod folder;
mod memory;
mod store;

use std::fmt;
use std::future::Future;

use thiserror::Error;

use crate::auth::AuthError;

pub use drive::DriveFileApi;
pub use folder::FolderFileApi;
pub use memory::{CallCounts, MemoryFileApi};
pub use store::{RemoteStore, UploadOutcome};

/// Backend-assigned file identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(String);

impl FileId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote API error: {0}")]
    Api(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Remote file not found: {0}")]
    NotFound(String),
    #[error("Invalid remote payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid remote configuration: {0}")]
    InvalidConfiguration(String),
}

impl RemoteError {
    /// Whether the failure came from credential acquisition or rejection.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Primitive operations against a cloud file API.
///
/// Implementations hide transport and credential handling. None of the
/// operations lock the file; concurrent writers race.
pub trait RemoteFileApi: Send + Sync + 'static {
    /// Look a file up by exact name. `Ok(None)` when no file matches.
    fn find_file_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = RemoteResult<Option<FileId>>> + Send;

    /// Create an empty file and return its id.
    fn create_file(
        &self,
        name: &str,
        mime_type: &str,
    ) -> impl Future<Output = RemoteResult<FileId>> + Send;

    /// Replace the full content of an existing file.
    fn write_file_content(
        &self,
        file_id: &FileId,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> impl Future<Output = RemoteResult<()>> + Send;

    /// Read the full content of an existing file.
    fn read_file_content(
        &self,
        file_id: &FileId,
    ) -> impl Future<Output = RemoteResult<Vec<u8>>> + Send;
}

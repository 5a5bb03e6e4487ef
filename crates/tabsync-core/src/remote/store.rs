//! Read/modify/write protocol for the single sync document.

use super::{FileId, RemoteFileApi, RemoteResult};
use crate::models::{RemoteDocument, Session, REMOTE_FILE_MIME_TYPE, REMOTE_FILE_NAME};

/// How an upload reached the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// An existing file was overwritten in one call.
    Updated(FileId),
    /// The file was created, then written: two calls, not atomic.
    Created(FileId),
}

impl UploadOutcome {
    #[must_use]
    pub const fn file_id(&self) -> &FileId {
        match self {
            Self::Updated(file_id) | Self::Created(file_id) => file_id,
        }
    }
}

/// The sync document on top of a [`RemoteFileApi`].
#[derive(Debug, Clone)]
pub struct RemoteStore<A> {
    api: A,
    file_name: String,
}

impl<A: RemoteFileApi> RemoteStore<A> {
    /// Address the default well-known file name.
    pub fn new(api: A) -> Self {
        Self::with_file_name(api, REMOTE_FILE_NAME)
    }

    pub fn with_file_name(api: A, file_name: impl Into<String>) -> Self {
        Self {
            api,
            file_name: file_name.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Fetch and decode the sync document.
    ///
    /// Returns `Ok(None)` when the file does not exist or the lookup itself
    /// failed for a non-auth reason. A failed read of a located file, or a
    /// payload that is not JSON, is returned as an error.
    pub async fn download(&self) -> RemoteResult<Option<RemoteDocument>> {
        let Some(file_id) = self.locate().await? else {
            tracing::info!("No remote file named {}", self.file_name);
            return Ok(None);
        };

        let bytes = self.api.read_file_content(&file_id).await?;
        let document = RemoteDocument::from_slice_lenient(&bytes)?;
        tracing::info!(
            "Downloaded {} ({} sessions, last synced {})",
            self.file_name,
            document.sessions.len(),
            document.last_synced
        );
        Ok(Some(document))
    }

    /// Write `sessions` as a fresh sync document, stamped now.
    pub async fn upload(&self, sessions: &[Session]) -> RemoteResult<UploadOutcome> {
        self.upload_document(&RemoteDocument::new(sessions.to_vec()))
            .await
    }

    /// Write a prepared sync document.
    ///
    /// Overwrites the located file, or creates it when none exists. If the
    /// process dies between create and write, an empty file is left behind;
    /// the next upload finds it and overwrites it.
    pub async fn upload_document(&self, document: &RemoteDocument) -> RemoteResult<UploadOutcome> {
        let bytes = document.to_bytes()?;

        if let Some(file_id) = self.locate().await? {
            tracing::info!("Updating remote file {} ({})", self.file_name, file_id);
            self.api
                .write_file_content(&file_id, bytes, REMOTE_FILE_MIME_TYPE)
                .await?;
            return Ok(UploadOutcome::Updated(file_id));
        }

        tracing::info!("Creating remote file {}", self.file_name);
        let file_id = self
            .api
            .create_file(&self.file_name, REMOTE_FILE_MIME_TYPE)
            .await?;
        self.api
            .write_file_content(&file_id, bytes, REMOTE_FILE_MIME_TYPE)
            .await?;
        Ok(UploadOutcome::Created(file_id))
    }

    async fn locate(&self) -> RemoteResult<Option<FileId>> {
        match self.api.find_file_by_name(&self.file_name).await {
            Ok(found) => Ok(found),
            Err(error) if error.is_auth() => Err(error),
            Err(error) => {
                tracing::warn!(
                    "Lookup of {} failed, treating as missing: {}",
                    self.file_name,
                    error
                );
                Ok(None)
            }
        }
    }
}

//! Remote backend selected by the active profile.

use tabsync_core::remote::{DriveFileApi, FileId, FolderFileApi, RemoteFileApi, RemoteResult};

use crate::auth::ProfileTokenProvider;

#[derive(Debug)]
pub enum RemoteBackend {
    Drive(DriveFileApi<ProfileTokenProvider>),
    Folder(FolderFileApi),
}

impl RemoteBackend {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Drive(_) => "drive",
            Self::Folder(_) => "folder",
        }
    }
}

impl RemoteFileApi for RemoteBackend {
    async fn find_file_by_name(&self, name: &str) -> RemoteResult<Option<FileId>> {
        match self {
            Self::Drive(api) => api.find_file_by_name(name).await,
            Self::Folder(api) => api.find_file_by_name(name).await,
        }
    }

    async fn create_file(&self, name: &str, mime_type: &str) -> RemoteResult<FileId> {
        match self {
            Self::Drive(api) => api.create_file(name, mime_type).await,
            Self::Folder(api) => api.create_file(name, mime_type).await,
        }
    }

    async fn write_file_content(
        &self,
        id: &FileId,
        content: Vec<u8>,
        mime_type: &str,
    ) -> RemoteResult<()> {
        match self {
            Self::Drive(api) => api.write_file_content(id, content, mime_type).await,
            Self::Folder(api) => api.write_file_content(id, content, mime_type).await,
        }
    }

    async fn read_file_content(&self, id: &FileId) -> RemoteResult<Vec<u8>> {
        match self {
            Self::Drive(api) => api.read_file_content(id).await,
            Self::Folder(api) => api.read_file_content(id).await,
        }
    }
}

//! Local directory standing in for a cloud drive.
//!
//! Useful for a folder already synced by a desktop drive client, and for
//! exercising the full sync path without network access. File ids are the
//! file names.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::{FileId, RemoteError, RemoteFileApi, RemoteResult};

#[derive(Debug, Clone)]
pub struct FolderFileApi {
    root: PathBuf,
}

impl FolderFileApi {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> RemoteResult<PathBuf> {
        let name = name.trim();
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains('/')
            || name.contains('\\')
        {
            return Err(RemoteError::InvalidConfiguration(format!(
                "'{name}' is not a valid file name"
            )));
        }
        Ok(self.root.join(name))
    }
}

impl RemoteFileApi for FolderFileApi {
    async fn find_file_by_name(&self, name: &str) -> RemoteResult<Option<FileId>> {
        let path = self.path_for(name)?;
        if fs::try_exists(&path).await? {
            Ok(Some(FileId::new(name.trim())))
        } else {
            Ok(None)
        }
    }

    async fn create_file(&self, name: &str, _mime_type: &str) -> RemoteResult<FileId> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.root).await?;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .await?;
        tracing::debug!("Created folder file {}", path.display());
        Ok(FileId::new(name.trim()))
    }

    async fn write_file_content(
        &self,
        file_id: &FileId,
        bytes: Vec<u8>,
        _mime_type: &str,
    ) -> RemoteResult<()> {
        let path = self.path_for(file_id.as_str())?;
        if !fs::try_exists(&path).await? {
            return Err(RemoteError::NotFound(file_id.to_string()));
        }

        let temp_path = path.with_extension("tmp");
        {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(&bytes).await?;
            file.sync_all().await?;
        }
        fs::rename(&temp_path, &path).await?;
        Ok(())
    }

    async fn read_file_content(&self, file_id: &FileId) -> RemoteResult<Vec<u8>> {
        let path = self.path_for(file_id.as_str())?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                Err(RemoteError::NotFound(file_id.to_string()))
            }
            Err(error) => Err(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[tokio::test]
    async fn create_write_and_read_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let api = FolderFileApi::new(temp_dir.path().join("drive"));

        assert_eq!(api.find_file_by_name("sync.json").await.unwrap(), None);
        let file_id = api.create_file("sync.json", "application/json").await.unwrap();
        assert_eq!(
            api.find_file_by_name("sync.json").await.unwrap(),
            Some(file_id.clone())
        );
        assert!(api.read_file_content(&file_id).await.unwrap().is_empty());

        api.write_file_content(&file_id, b"{}".to_vec(), "application/json")
            .await
            .unwrap();
        assert_eq!(api.read_file_content(&file_id).await.unwrap(), b"{}");
        assert!(!temp_dir.path().join("drive").join("sync.tmp").exists());
    }

    #[tokio::test]
    async fn create_does_not_truncate_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("sync.json"), b"keep").unwrap();
        let api = FolderFileApi::new(temp_dir.path());

        let file_id = api.create_file("sync.json", "application/json").await.unwrap();
        assert_eq!(api.read_file_content(&file_id).await.unwrap(), b"keep");
    }

    #[tokio::test]
    async fn write_and_read_of_missing_file_are_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let api = FolderFileApi::new(temp_dir.path());
        let file_id = FileId::new("missing.json");

        assert!(matches!(
            api.read_file_content(&file_id).await,
            Err(RemoteError::NotFound(_))
        ));
        assert!(matches!(
            api.write_file_content(&file_id, Vec::new(), "application/json")
                .await,
            Err(RemoteError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn path_traversal_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let api = FolderFileApi::new(temp_dir.path());

        for name in ["../escape.json", "a/b.json", "..", "  "] {
            assert!(matches!(
                api.find_file_by_name(name).await,
                Err(RemoteError::InvalidConfiguration(_))
            ));
        }
    }
}

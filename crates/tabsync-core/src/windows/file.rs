//! Window state exchanged with a browser bridge through a JSON file.
//!
//! The bridge keeps the file current with the open windows and applies
//! changes written back to it. The file holds a JSON array of windows; a
//! missing file means no open windows.

use std::path::{Path, PathBuf};

use tokio::fs;

use super::{window_from_urls, WindowSource};
use crate::error::{Error, Result};
use crate::models::Window;

#[derive(Debug, Clone)]
pub struct FileWindowSource {
    path: PathBuf,
}

impl FileWindowSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Vec<Window>> {
        match fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|error| {
                Error::Window(format!(
                    "unreadable window state {}: {error}",
                    self.path.display()
                ))
            }),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(error) => Err(error.into()),
        }
    }

    async fn write(&self, windows: &[Window]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, serde_json::to_vec_pretty(windows)?).await?;
        fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}

impl WindowSource for FileWindowSource {
    async fn list_windows(&self) -> Result<Vec<Window>> {
        self.read().await
    }

    async fn close_all_windows(&self) -> Result<()> {
        tracing::debug!("Closing all windows in {}", self.path.display());
        self.write(&[]).await
    }

    async fn create_window(&self, urls: &[String]) -> Result<()> {
        let mut windows = self.read().await?;
        let next_id = windows
            .iter()
            .filter_map(|window| window.id)
            .max()
            .unwrap_or(0)
            + 1;
        windows.push(window_from_urls(next_id, urls));
        self.write(&windows).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Tab;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_has_no_windows() {
        let temp_dir = TempDir::new().unwrap();
        let source = FileWindowSource::new(temp_dir.path().join("windows.json"));
        assert!(source.list_windows().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reads_bridge_written_state() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("windows.json");
        std::fs::write(
            &path,
            r#"[{"id": 3, "tabs": [{"title": "Docs", "url": "https://docs.rs", "favIconUrl": "https://docs.rs/favicon.ico"}]}]"#,
        )
        .unwrap();

        let windows = FileWindowSource::new(&path).list_windows().await.unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].id, Some(3));
        assert_eq!(
            windows[0].tabs[0].fav_icon_url.as_deref(),
            Some("https://docs.rs/favicon.ico")
        );
    }

    #[tokio::test]
    async fn close_then_create_rewrites_state() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state").join("windows.json");
        let source = FileWindowSource::new(&path);
        source
            .write(&[Window {
                id: Some(9),
                tabs: vec![Tab::new("Old", "https://old.example")],
            }])
            .await
            .unwrap();

        source.close_all_windows().await.unwrap();
        source
            .create_window(&["https://a.example".to_string(), "https://b.example".to_string()])
            .await
            .unwrap();

        let windows = source.list_windows().await.unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].id, Some(1));
        assert_eq!(
            windows[0].tab_urls(),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[tokio::test]
    async fn invalid_state_is_a_window_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("windows.json");
        std::fs::write(&path, "{oops").unwrap();

        let error = FileWindowSource::new(&path).list_windows().await.unwrap_err();
        assert!(matches!(error, Error::Window(_)));
    }
}

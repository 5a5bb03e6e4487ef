//! Browser window access.
//!
//! The lifecycle manager never talks to a browser directly. It captures and
//! restores through [`WindowSource`], which a browser bridge implements.

mod file;

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};
use crate::models::{Tab, Window};

pub use file::FileWindowSource;

/// Enumerate, close and open browser windows.
pub trait WindowSource: Send + Sync + 'static {
    /// Every open window with its tabs, in browser order.
    fn list_windows(&self) -> impl Future<Output = Result<Vec<Window>>> + Send;

    fn close_all_windows(&self) -> impl Future<Output = Result<()>> + Send;

    /// Open one window with a tab per URL, in order.
    fn create_window(&self, urls: &[String]) -> impl Future<Output = Result<()>> + Send;
}

/// Build the window a restored URL list turns into.
pub(crate) fn window_from_urls(id: i64, urls: &[String]) -> Window {
    Window {
        id: Some(id),
        tabs: urls.iter().map(|url| Tab::new(url.clone(), url.clone())).collect(),
    }
}

#[derive(Debug, Default)]
struct MemoryWindows {
    windows: Vec<Window>,
    next_id: i64,
    close_calls: usize,
    fail: bool,
}

/// Window source backed by an in-process list.
#[derive(Debug, Clone, Default)]
pub struct MemoryWindowSource {
    state: Arc<Mutex<MemoryWindows>>,
}

impl MemoryWindowSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_windows(windows: Vec<Window>) -> Self {
        let next_id = windows.iter().filter_map(|window| window.id).max().unwrap_or(0);
        Self {
            state: Arc::new(Mutex::new(MemoryWindows {
                windows,
                next_id,
                ..MemoryWindows::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryWindows> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Currently open windows.
    pub fn windows(&self) -> Vec<Window> {
        self.lock().windows.clone()
    }

    pub fn close_calls(&self) -> usize {
        self.lock().close_calls
    }

    /// Make every operation fail until reset.
    pub fn fail(&self, enabled: bool) {
        self.lock().fail = enabled;
    }
}

impl MemoryWindows {
    fn check(&self) -> Result<()> {
        if self.fail {
            return Err(Error::Window("window source unavailable".to_string()));
        }
        Ok(())
    }
}

impl WindowSource for MemoryWindowSource {
    async fn list_windows(&self) -> Result<Vec<Window>> {
        let state = self.lock();
        state.check()?;
        Ok(state.windows.clone())
    }

    async fn close_all_windows(&self) -> Result<()> {
        let mut state = self.lock();
        state.check()?;
        state.close_calls += 1;
        state.windows.clear();
        Ok(())
    }

    async fn create_window(&self, urls: &[String]) -> Result<()> {
        let mut state = self.lock();
        state.check()?;
        state.next_id += 1;
        let window = window_from_urls(state.next_id, urls);
        state.windows.push(window);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn create_window_assigns_fresh_ids() {
        let source = MemoryWindowSource::with_windows(vec![Window {
            id: Some(4),
            tabs: Vec::new(),
        }]);

        source
            .create_window(&["https://a.example".to_string()])
            .await
            .unwrap();

        let windows = source.list_windows().await.unwrap();
        assert_eq!(windows[1].id, Some(5));
        assert_eq!(windows[1].tab_urls(), vec!["https://a.example".to_string()]);
    }

    #[tokio::test]
    async fn failing_source_reports_window_error() {
        let source = MemoryWindowSource::new();
        source.fail(true);
        assert!(matches!(
            source.list_windows().await,
            Err(Error::Window(_))
        ));
    }
}

//! Data models for tabsync

mod document;
mod session;
mod settings;

pub use document::{RemoteDocument, REMOTE_FILE_MIME_TYPE, REMOTE_FILE_NAME};
pub use session::{Session, SessionId, Tab, Window};
pub use settings::{Preferences, DEFAULT_SYNC_INTERVAL_MINUTES};

//! Database layer for tabsync

mod connection;
mod migrations;
mod session_store;

pub use connection::Database;
pub use session_store::{SqliteSessionStore, SESSIONS_KEY, SETTINGS_KEY};

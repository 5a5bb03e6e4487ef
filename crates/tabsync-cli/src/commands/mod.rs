pub mod auth_cmd;
pub mod common;
pub mod completions;
pub mod config;
pub mod delete;
pub mod export;
pub mod list;
pub mod restore;
pub mod save;
pub mod sync;

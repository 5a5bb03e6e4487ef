//! tabsync-core - Core library for tabsync
//!
//! This crate contains the session models, local stores, the remote drive
//! adapter, the merge and sync engine, and the session lifecycle manager used
//! by every tabsync interface.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod remote;
pub mod services;
pub mod state;
pub mod store;
pub mod sync;
pub mod util;
pub mod windows;

pub use error::{Error, Result};
pub use models::{Session, SessionId, Tab, Window};

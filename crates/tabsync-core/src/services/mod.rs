//! Shared services used across clients.

mod session_manager;

pub use session_manager::{Mutation, SessionManager, SyncHandle};

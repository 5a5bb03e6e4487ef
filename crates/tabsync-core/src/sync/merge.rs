//! Last-write-wins reconciliation of two session collections.

use std::collections::HashMap;

use crate::models::{Session, SessionId};

/// Merge a local and a remote session collection.
///
/// Sessions are keyed by id. Every local session is taken first; a remote
/// session is added when its id is unknown and replaces the local entry only
/// when its `savedAt` is strictly later. Within one side, a repeated id keeps
/// the last occurrence at the position of the first.
///
/// Output order is local-first-seen, then remote-added. `remote = None`
/// stands for an absent or unusable remote collection.
#[must_use]
pub fn merge_sessions(local: &[Session], remote: Option<&[Session]>) -> Vec<Session> {
    let mut index: HashMap<SessionId, usize> = HashMap::with_capacity(local.len());
    let mut merged: Vec<Session> = Vec::with_capacity(local.len());

    for session in local {
        if let Some(&slot) = index.get(&session.id) {
            merged[slot] = session.clone();
        } else {
            index.insert(session.id.clone(), merged.len());
            merged.push(session.clone());
        }
    }

    for session in remote.unwrap_or_default() {
        match index.get(&session.id) {
            Some(&slot) => {
                if session.saved_at > merged[slot].saved_at {
                    merged[slot] = session.clone();
                }
            }
            None => {
                index.insert(session.id.clone(), merged.len());
                merged.push(session.clone());
            }
        }
    }

    merged
}

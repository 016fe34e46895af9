//! The single authenticated-user slot shared by the whole console.
//!
//! Lifecycle is anonymous → authenticated → anonymous: the slot is empty at
//! start-up unless a well-formed copy was persisted, populated only by a
//! successful credential submission, and cleared only by an explicit logout.
//! A malformed persisted copy reads as "no session", never as an error.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, warn};

use crate::auth::types::UserProfile;

const SESSION_FILE: &str = "session.json";
const TOKEN_FILE: &str = "token";

/// The currently authenticated user plus the bearer token for API calls.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub user: UserProfile,
    pub token: Option<String>,
}

#[derive(Debug)]
pub struct SessionStore {
    session_path: PathBuf,
    token_path: PathBuf,
    inner: RwLock<Option<Session>>,
}

impl SessionStore {
    /// Open the store, restoring a previously saved session if one exists
    /// and is well-formed.
    #[must_use]
    pub fn open(dir: &Path) -> Self {
        let session_path = dir.join(SESSION_FILE);
        let token_path = dir.join(TOKEN_FILE);
        let restored = restore(&session_path, &token_path);
        Self {
            session_path,
            token_path,
            inner: RwLock::new(restored),
        }
    }

    /// Populate the session after a verified login and persist both the
    /// session slot and the bearer token slot.
    pub fn set_authenticated_user(&self, user: UserProfile, token: Option<String>) {
        let session = Session { user, token };

        if let Some(dir) = self.session_path.parent() {
            if let Err(err) = fs::create_dir_all(dir) {
                warn!("Failed to create session dir {}: {err}", dir.display());
            }
        }
        match serde_json::to_vec_pretty(&session.user) {
            Ok(bytes) => {
                if let Err(err) = fs::write(&self.session_path, bytes) {
                    warn!("Failed to persist session: {err}");
                }
            }
            Err(err) => warn!("Failed to serialize session: {err}"),
        }
        match &session.token {
            Some(token) => {
                if let Err(err) = fs::write(&self.token_path, token) {
                    warn!("Failed to persist token: {err}");
                }
            }
            None => remove_quietly(&self.token_path),
        }

        *self.write_slot() = Some(session);
    }

    /// Clear the session, in memory and on disk. Cannot fail; storage
    /// errors are logged and the in-memory state is cleared regardless.
    pub fn logout(&self) {
        remove_quietly(&self.session_path);
        remove_quietly(&self.token_path);
        *self.write_slot() = None;
    }

    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.read_slot().clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read_slot().is_some()
    }

    /// Bearer token for subsequent API calls, if the backend issued one.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.read_slot().as_ref().and_then(|s| s.token.clone())
    }

    fn read_slot(&self) -> std::sync::RwLockReadGuard<'_, Option<Session>> {
        self.inner.read().unwrap_or_else(|e| {
            warn!("Session lock was poisoned, recovering the lock");
            e.into_inner()
        })
    }

    fn write_slot(&self) -> std::sync::RwLockWriteGuard<'_, Option<Session>> {
        self.inner.write().unwrap_or_else(|e| {
            warn!("Session lock was poisoned, recovering the lock");
            e.into_inner()
        })
    }
}

fn restore(session_path: &Path, token_path: &Path) -> Option<Session> {
    let bytes = fs::read(session_path).ok()?;
    let user: UserProfile = match serde_json::from_slice(&bytes) {
        Ok(user) => user,
        Err(err) => {
            debug!(
                "Discarding malformed saved session {}: {err}",
                session_path.display()
            );
            return None;
        }
    };
    let token = fs::read_to_string(token_path)
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    Some(Session { user, token })
}

fn remove_quietly(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        if err.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove {}: {err}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::types::Role;
    use anyhow::Result;

    fn user() -> UserProfile {
        UserProfile {
            id: "u-42".to_string(),
            display_name: "Grace".to_string(),
            role: Role::Admin,
            contact_email: Some("grace@example.edu".to_string()),
            contact_phone: None,
        }
    }

    #[test]
    fn starts_anonymous() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = SessionStore::open(dir.path());
        assert!(!store.is_authenticated());
        assert!(store.current().is_none());
        assert!(store.token().is_none());
        Ok(())
    }

    #[test]
    fn login_then_logout_round_trips() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = SessionStore::open(dir.path());

        store.set_authenticated_user(user(), Some("bearer-xyz".to_string()));
        assert!(store.is_authenticated());
        assert_eq!(store.token().as_deref(), Some("bearer-xyz"));

        store.logout();
        assert!(!store.is_authenticated());
        assert!(store.token().is_none());
        assert!(!dir.path().join(SESSION_FILE).exists());
        assert!(!dir.path().join(TOKEN_FILE).exists());
        Ok(())
    }

    #[test]
    fn session_survives_a_reopen() -> Result<()> {
        let dir = tempfile::tempdir()?;
        {
            let store = SessionStore::open(dir.path());
            store.set_authenticated_user(user(), Some("bearer-xyz".to_string()));
        }
        let store = SessionStore::open(dir.path());
        let session = store.current().expect("session restored");
        assert_eq!(session.user, user());
        assert_eq!(session.token.as_deref(), Some("bearer-xyz"));
        Ok(())
    }

    #[test]
    fn malformed_saved_session_reads_as_anonymous() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join(SESSION_FILE), b"]] nope")?;
        let store = SessionStore::open(dir.path());
        assert!(!store.is_authenticated());
        Ok(())
    }

    #[test]
    fn logout_is_idempotent_even_without_a_session() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = SessionStore::open(dir.path());
        store.logout();
        store.logout();
        assert!(!store.is_authenticated());
        Ok(())
    }
}

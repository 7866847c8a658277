use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// The bearer credential and display name returned by login/signup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub auth_token: String,
    pub username: String,
}

/// Holds the single active session, persisted as JSON next to the config.
///
/// The store is passed explicitly into the API gateway rather than living in
/// a global. Written only by login, signup, and the 401 handler; read by
/// every outbound call.
#[derive(Clone)]
pub struct SessionStore {
    path: PathBuf,
    current: Arc<RwLock<Option<Credentials>>>,
}

impl SessionStore {
    /// Open the store, loading a previously saved credential if one exists.
    pub fn open(path: PathBuf) -> Self {
        let current = fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str::<Credentials>(&content).ok());
        Self {
            path,
            current: Arc::new(RwLock::new(current)),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.current
            .read()
            .ok()?
            .as_ref()
            .map(|c| c.auth_token.clone())
    }

    pub fn username(&self) -> Option<String> {
        self.current
            .read()
            .ok()?
            .as_ref()
            .map(|c| c.username.clone())
    }

    pub fn is_active(&self) -> bool {
        self.current
            .read()
            .map(|c| c.is_some())
            .unwrap_or(false)
    }

    /// Install a new credential, overwriting any previous session.
    pub fn replace(&self, creds: Credentials) -> Result<()> {
        if let Ok(mut guard) = self.current.write() {
            *guard = Some(creds.clone());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&creds)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    /// Discard the credential. Returns true only if one was actually held,
    /// so a 401 storm clears it exactly once.
    pub fn clear(&self) -> bool {
        let cleared = self
            .current
            .write()
            .map(|mut guard| guard.take().is_some())
            .unwrap_or(false);
        if cleared {
            let _ = fs::remove_file(&self.path);
        }
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> SessionStore {
        let path = std::env::temp_dir().join(format!(
            "belay_session_test_{}_{}.json",
            std::process::id(),
            name
        ));
        let _ = fs::remove_file(&path);
        SessionStore::open(path)
    }

    #[test]
    fn test_replace_overwrites_previous_session() {
        let store = temp_store("replace");
        store
            .replace(Credentials {
                auth_token: "tok-1".into(),
                username: "alice".into(),
            })
            .unwrap();
        store
            .replace(Credentials {
                auth_token: "tok-2".into(),
                username: "bob".into(),
            })
            .unwrap();
        assert_eq!(store.token().as_deref(), Some("tok-2"));
        assert_eq!(store.username().as_deref(), Some("bob"));
        store.clear();
    }

    #[test]
    fn test_clear_reports_once() {
        let store = temp_store("clear");
        store
            .replace(Credentials {
                auth_token: "tok".into(),
                username: "alice".into(),
            })
            .unwrap();
        assert!(store.clear());
        assert!(!store.clear());
        assert!(!store.is_active());
        assert!(store.token().is_none());
    }

    #[test]
    fn test_persists_across_open() {
        let store = temp_store("persist");
        store
            .replace(Credentials {
                auth_token: "tok".into(),
                username: "alice".into(),
            })
            .unwrap();
        let reopened = SessionStore::open(store.path.clone());
        assert_eq!(reopened.token().as_deref(), Some("tok"));
        store.clear();
    }
}

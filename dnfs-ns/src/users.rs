//! User registry: `<username> <active?>` lines persisted to `users.db`.
//!
//! All entries reload as inactive (§4.2); LOGIN activates exactly one
//! session per username and a second concurrent LOGIN fails.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use crate::error::{Error, Result};

struct Inner {
    /// username -> active flag.
    active: HashMap<String, bool>,
    db_path: PathBuf,
}

/// The NS's user registry, one entry per username ever seen.
pub struct UserRegistry {
    inner: Mutex<Inner>,
}

impl UserRegistry {
    /// Loads `db_path` if it exists; every entry reloads inactive
    /// regardless of what was persisted (a prior session could not have
    /// survived the restart).
    pub async fn load(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        let mut active = HashMap::new();
        if let Ok(contents) = tokio::fs::read_to_string(&db_path).await {
            for line in contents.lines() {
                if let Some((name, _)) = line.split_once(' ') {
                    active.insert(name.to_string(), false);
                }
            }
        }
        Ok(Self { inner: Mutex::new(Inner { active, db_path }) })
    }

    /// Activates `username`, registering it if unseen. Fails if the user
    /// is already active (`LOGIN_FAIL`, §4.2).
    pub async fn login(&self, username: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if matches!(inner.active.get(username), Some(true)) {
            return Err(Error::AlreadyLoggedIn(username.to_string()));
        }
        inner.active.insert(username.to_string(), true);
        inner.persist().await
    }

    /// Clears the active flag for `username` and persists the registry.
    pub async fn logout(&self, username: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.active.insert(username.to_string(), false);
        inner.persist().await
    }

    /// Returns `(username, active)` for every user ever registered, for
    /// `LIST_USERS` (§"Supplemented features": the full registry, not just
    /// the caller).
    pub async fn list_all(&self) -> Vec<(String, bool)> {
        let inner = self.inner.lock().await;
        let mut out: Vec<_> =
            inner.active.iter().map(|(name, active)| (name.clone(), *active)).collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}

impl Inner {
    async fn persist(&self) -> Result<()> {
        let mut out = String::new();
        let mut entries: Vec<_> = self.active.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        for (name, active) in entries {
            out.push_str(name);
            out.push(' ');
            out.push_str(if *active { "1" } else { "0" });
            out.push('\n');
        }
        if let Some(parent) = self.db_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.db_path, out).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn login_twice_fails_then_logout_allows_relogin() {
        let dir = tempfile::tempdir().unwrap();
        let registry = UserRegistry::load(dir.path().join("users.db")).await.unwrap();
        registry.login("alice").await.unwrap();
        assert!(matches!(registry.login("alice").await, Err(Error::AlreadyLoggedIn(_))));
        registry.logout("alice").await.unwrap();
        registry.login("alice").await.unwrap();
    }

    #[tokio::test]
    async fn reload_clears_active_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.db");
        let registry = UserRegistry::load(&path).await.unwrap();
        registry.login("bob").await.unwrap();
        drop(registry);

        let reloaded = UserRegistry::load(&path).await.unwrap();
        let all = reloaded.list_all().await;
        assert_eq!(all, vec![("bob".to_string(), false)]);
        reloaded.login("bob").await.unwrap();
    }
}

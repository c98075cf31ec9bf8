//! Access table: user -> filename -> permission string, persisted as one
//! `filename|perms` file per user (§4.2).
//!
//! The source hand-rolls a double-hashed (FNV-1a / djb2) table with
//! tombstones over this two-level mapping; here the per-user inner map is
//! a plain [`std::collections::HashMap`] behind a [`dashmap::DashMap`]
//! shard keyed by username, which gives the same per-user lock
//! granularity the source's bucket mutexes provide without hand-rolling
//! open addressing. [`AccessTable::CAPACITY`] reproduces the "table too
//! full" failure mode at the documented 0.5 load factor.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::error::{Error, Result};

/// Permission token: any subset of `r`, `w`, `o`. `o` implies `r` and `w`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Perm {
    bits: u8,
}

const READ: u8 = 0b001;
const WRITE: u8 = 0b010;
const OWNER: u8 = 0b100;

impl Perm {
    pub const NONE: Perm = Perm { bits: 0 };
    pub const OWNER_ALL: Perm = Perm { bits: READ | WRITE | OWNER };

    pub fn read_only() -> Self {
        Perm { bits: READ }
    }

    pub fn read_write() -> Self {
        Perm { bits: READ | WRITE }
    }

    pub fn can_read(self) -> bool {
        self.bits & (READ | OWNER) != 0
    }

    pub fn can_write(self) -> bool {
        self.bits & (WRITE | OWNER) != 0
    }

    pub fn is_owner(self) -> bool {
        self.bits & OWNER != 0
    }

    fn parse(s: &str) -> Self {
        let mut bits = 0;
        for ch in s.chars() {
            match ch {
                'r' => bits |= READ,
                'w' => bits |= WRITE,
                'o' => bits |= OWNER,
                _ => {}
            }
        }
        Perm { bits }
    }

    fn as_str(self) -> String {
        let mut out = String::new();
        if self.bits & OWNER != 0 {
            out.push('o');
        }
        if self.bits & READ != 0 {
            out.push('r');
        }
        if self.bits & WRITE != 0 {
            out.push('w');
        }
        out
    }
}

struct Inner {
    /// username -> filename -> permission.
    table: HashMap<String, Perm>,
}

/// Per-user access table, sharded by username.
pub struct AccessTable {
    users: DashMap<String, Mutex<Inner>>,
    dir: PathBuf,
}

impl AccessTable {
    /// Entries allowed before the table reports "table too full", mirroring
    /// the source's load-factor-0.5 bound on a fixed-capacity hash table.
    pub const CAPACITY: usize = 1 << 20;

    /// Loads every `permission_db/<username>` file under `dir`.
    pub async fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let users = DashMap::new();
        if let Ok(mut entries) = tokio::fs::read_dir(&dir).await {
            while let Some(entry) = entries.next_entry().await? {
                let Ok(username) = entry.file_name().into_string() else { continue };
                let contents = tokio::fs::read_to_string(entry.path()).await?;
                let mut table = HashMap::new();
                for line in contents.lines() {
                    if let Some((filename, perms)) = line.split_once('|') {
                        table.insert(filename.to_string(), Perm::parse(perms));
                    }
                }
                users.insert(username, Mutex::new(Inner { table }));
            }
        }
        Ok(Self { users, dir })
    }

    fn total_entries(&self) -> usize {
        // Approximates the source's global entry count; good enough to
        // gate the "table too full" error without a second counter lock.
        self.users.iter().map(|u| futures_len(u.value())).sum()
    }

    /// Grants `perm` to `user` on `filename`, used by CREATE (owner gets
    /// `rwo`) and ADDACCESS/GRANTACCESS (`r` or `rw` for a target user).
    pub async fn grant(&self, user: &str, filename: &str, perm: Perm) -> Result<()> {
        if self.total_entries() >= Self::CAPACITY {
            return Err(Error::TableFull);
        }
        {
            let entry = self.users.entry(user.to_string()).or_insert_with(|| {
                Mutex::new(Inner { table: HashMap::new() })
            });
            let mut inner = entry.lock().await;
            inner.table.insert(filename.to_string(), perm);
        }
        self.persist_user(user).await
    }

    /// Removes `user`'s entry on `filename` (REMACCESS, or DELETE revoking
    /// only the owner's own entry per §9's corrected semantics).
    pub async fn revoke(&self, user: &str, filename: &str) -> Result<()> {
        if let Some(entry) = self.users.get(user) {
            let mut inner = entry.lock().await;
            inner.table.remove(filename);
        }
        self.persist_user(user).await
    }

    /// Every filename `user` holds any permission entry for, used by
    /// `VIEW -a` to list files shared with the caller.
    pub async fn filenames_for(&self, user: &str) -> Vec<String> {
        match self.users.get(user) {
            Some(entry) => {
                let inner = entry.lock().await;
                inner.table.keys().cloned().collect()
            }
            None => Vec::new(),
        }
    }

    /// Looks up `user`'s permission on `filename`; absent means [`Perm::NONE`].
    pub async fn lookup(&self, user: &str, filename: &str) -> Perm {
        match self.users.get(user) {
            Some(entry) => {
                let inner = entry.lock().await;
                inner.table.get(filename).copied().unwrap_or(Perm::NONE)
            }
            None => Perm::NONE,
        }
    }

    async fn persist_user(&self, user: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let Some(entry) = self.users.get(user) else { return Ok(()) };
        let inner = entry.lock().await;
        let mut out = String::new();
        let mut rows: Vec<_> = inner.table.iter().collect();
        rows.sort_by(|a, b| a.0.cmp(b.0));
        for (filename, perm) in rows {
            out.push_str(filename);
            out.push('|');
            out.push_str(&perm.as_str());
            out.push('\n');
        }
        tokio::fs::write(self.dir.join(user), out).await?;
        Ok(())
    }
}

/// Blocking-free entry count helper; `Mutex::blocking_lock` would panic
/// inside the async runtime, so this uses `try_lock` and falls back to 0
/// under contention (acceptable: only used as a soft capacity heuristic).
fn futures_len(lock: &Mutex<Inner>) -> usize {
    lock.try_lock().map(|inner| inner.table.len()).unwrap_or(0)
}

/// Access-request list: `{requester, filename}`, created by REQACCESS,
/// removed by ADDACCESS/GRANTACCESS as a side effect (§4.2).
pub struct AccessRequestList {
    requests: Mutex<Vec<(String, String)>>,
}

impl AccessRequestList {
    pub fn new() -> Self {
        Self { requests: Mutex::new(Vec::new()) }
    }

    pub async fn add(&self, requester: &str, filename: &str) {
        self.requests.lock().await.push((requester.to_string(), filename.to_string()));
    }

    /// Requests whose filename is owned by `owner` (VIEWREQS).
    pub async fn for_owned_files(&self, owned_filenames: &[String]) -> Vec<(String, String)> {
        let requests = self.requests.lock().await;
        requests
            .iter()
            .filter(|(_, filename)| owned_filenames.contains(filename))
            .cloned()
            .collect()
    }

    /// Removes the first matching entry, as ADDACCESS/GRANTACCESS do.
    pub async fn remove(&self, requester: &str, filename: &str) {
        let mut requests = self.requests.lock().await;
        if let Some(pos) =
            requests.iter().position(|(r, f)| r == requester && f == filename)
        {
            requests.remove(pos);
        }
    }
}

impl Default for AccessRequestList {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn owner_grant_implies_read_and_write() {
        let dir = tempfile::tempdir().unwrap();
        let table = AccessTable::load(dir.path()).await.unwrap();
        table.grant("alice", "notes.txt", Perm::OWNER_ALL).await.unwrap();
        let perm = table.lookup("alice", "notes.txt").await;
        assert!(perm.can_read());
        assert!(perm.can_write());
        assert!(perm.is_owner());
    }

    #[tokio::test]
    async fn revoke_removes_entry_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let table = AccessTable::load(dir.path()).await.unwrap();
        table.grant("bob", "a.txt", Perm::read_only()).await.unwrap();
        table.revoke("bob", "a.txt").await.unwrap();
        assert_eq!(table.lookup("bob", "a.txt").await, Perm::NONE);

        let reloaded = AccessTable::load(dir.path()).await.unwrap();
        assert_eq!(reloaded.lookup("bob", "a.txt").await, Perm::NONE);
    }

    #[tokio::test]
    async fn view_reqs_filters_to_owned_files() {
        let list = AccessRequestList::new();
        list.add("carol", "a.txt").await;
        list.add("carol", "b.txt").await;
        let owned = vec!["a.txt".to_string()];
        let filtered = list.for_owned_files(&owned).await;
        assert_eq!(filtered, vec![("carol".to_string(), "a.txt".to_string())]);
    }
}

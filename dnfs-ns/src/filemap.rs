//! File map: (owner, filename) -> {primary_ss_id, backup_ss_id, owner}
//! (§4.2, §4.5).
//!
//! The source shards this table across 256 bucket mutexes plus a count
//! mutex; [`dashmap::DashMap`] gives the same per-bucket locking
//! idiomatically, so the table is a thin wrapper around one rather than a
//! hand-rolled double-hashed bucket array.

use dashmap::DashMap;

use crate::error::{Error, Result};

/// One file map entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub owner: String,
    pub filename: String,
    pub primary_ss_id: i32,
    pub backup_ss_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Key {
    owner: String,
    filename: String,
}

/// The NS's file -> Storage Server mapping.
pub struct FileMap {
    entries: DashMap<Key, FileRecord>,
}

impl FileMap {
    /// Entries allowed before reporting "table too full" (§4.5).
    pub const CAPACITY: usize = 1 << 20;

    pub fn new() -> Self {
        Self { entries: DashMap::new() }
    }

    /// Inserts a new entry on CREATE. Fails if (owner, filename) already
    /// has a record.
    pub fn insert(&self, record: FileRecord) -> Result<()> {
        if self.entries.len() >= Self::CAPACITY {
            return Err(Error::TableFull);
        }
        let key = Key { owner: record.owner.clone(), filename: record.filename.clone() };
        if self.entries.contains_key(&key) {
            return Err(Error::FileAlreadyExists);
        }
        self.entries.insert(key, record);
        Ok(())
    }

    /// Removes the (owner, filename) entry on DELETE.
    pub fn remove(&self, owner: &str, filename: &str) -> Option<FileRecord> {
        let key = Key { owner: owner.to_string(), filename: filename.to_string() };
        self.entries.remove(&key).map(|(_, record)| record)
    }

    /// `search(owner, filename)`: the direct, authenticated-owner lookup.
    pub fn search(&self, owner: &str, filename: &str) -> Option<FileRecord> {
        let key = Key { owner: owner.to_string(), filename: filename.to_string() };
        self.entries.get(&key).map(|entry| entry.value().clone())
    }

    /// `find_owner(filename)`: fallback scan for shared files where the
    /// requester is not the owner.
    pub fn find_owner(&self, filename: &str) -> Option<FileRecord> {
        self.entries
            .iter()
            .find(|entry| entry.key().filename == filename)
            .map(|entry| entry.value().clone())
    }

    /// `search_by_ss_and_filename`: used during SS re-registration, when
    /// owner metadata on the SS side may be unreliable.
    pub fn search_by_ss_and_filename(&self, ss_id: i32, filename: &str) -> Option<FileRecord> {
        self.entries
            .iter()
            .find(|entry| {
                entry.key().filename == filename
                    && (entry.value().primary_ss_id == ss_id
                        || entry.value().backup_ss_id == Some(ss_id))
            })
            .map(|entry| entry.value().clone())
    }

    /// Rewrites `backup_ss_id` for every record whose primary or backup is
    /// `ss_id`, called when ring membership changes.
    pub fn update_backup(&self, ss_id: i32, new_backup: Option<i32>) {
        for mut entry in self.entries.iter_mut() {
            if entry.value().primary_ss_id == ss_id {
                entry.value_mut().backup_ss_id = new_backup;
            }
        }
    }

    /// All filenames owned by `owner`, for VIEW and VIEWREQS.
    pub fn owned_by(&self, owner: &str) -> Vec<FileRecord> {
        self.entries
            .iter()
            .filter(|entry| entry.key().owner == owner)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Every record whose primary lives on `ss_id`, for the replication
    /// catch-up scan on UPDATE_BACKUP/RE_REPLICATE_ALL.
    pub fn primaries_on(&self, ss_id: i32) -> Vec<FileRecord> {
        self.entries
            .iter()
            .filter(|entry| entry.value().primary_ss_id == ss_id)
            .map(|entry| entry.value().clone())
            .collect()
    }
}

impl Default for FileMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(owner: &str, filename: &str, primary: i32, backup: Option<i32>) -> FileRecord {
        FileRecord {
            owner: owner.to_string(),
            filename: filename.to_string(),
            primary_ss_id: primary,
            backup_ss_id: backup,
        }
    }

    #[test]
    fn insert_then_search_round_trips() {
        let map = FileMap::new();
        map.insert(record("alice", "a.txt", 0, Some(1))).unwrap();
        assert_eq!(map.search("alice", "a.txt"), Some(record("alice", "a.txt", 0, Some(1))));
    }

    #[test]
    fn duplicate_insert_fails() {
        let map = FileMap::new();
        map.insert(record("alice", "a.txt", 0, None)).unwrap();
        assert!(matches!(map.insert(record("alice", "a.txt", 1, None)), Err(Error::FileAlreadyExists)));
    }

    #[test]
    fn find_owner_locates_shared_file() {
        let map = FileMap::new();
        map.insert(record("alice", "shared.txt", 0, None)).unwrap();
        let found = map.find_owner("shared.txt").unwrap();
        assert_eq!(found.owner, "alice");
    }

    #[test]
    fn update_backup_rewrites_matching_primary() {
        let map = FileMap::new();
        map.insert(record("alice", "a.txt", 0, Some(1))).unwrap();
        map.update_backup(0, Some(2));
        assert_eq!(map.search("alice", "a.txt").unwrap().backup_ss_id, Some(2));
    }
}

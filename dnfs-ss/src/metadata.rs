//! Metadata table: filename -> [`FileMetadata`], with an atomic
//! snapshot save/load to `metadata.db` (§4.3).
//!
//! The source shards this across outer hash buckets, each behind its own
//! mutex, with a nested inner table and a separate count mutex. `DashMap`
//! gives the same sharded-locking shape idiomatically; `get` already
//! returns an owned copy, matching the source's "copy out to avoid
//! use-after-free with concurrent delete" rule for free.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use dashmap::DashMap;
use tokio::sync::Mutex;

use dnfs_proto::payloads::FileMetadata;

use crate::error::{Error, Result};

/// Outer bucket count mirrors the source's "power-like constant"; with
/// `DashMap` this only bounds the reported capacity error, not the real
/// shard count (which `DashMap` picks itself).
pub const CAPACITY: usize = 1024;

pub struct MetadataTable {
    files: DashMap<String, FileMetadata>,
    dir: PathBuf,
    /// Serializes snapshot saves so a save sees one consistent view; a
    /// stand-in for "acquire every outer bucket lock in order".
    save_lock: Mutex<()>,
}

impl MetadataTable {
    fn db_path(dir: &Path) -> PathBuf {
        dir.join("metadata.db")
    }

    /// Loads `metadata.db` under `dir` if present; a missing or corrupt
    /// file starts with an empty table (load is best-effort per §4.3).
    pub async fn load(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let files = DashMap::new();
        if let Ok(bytes) = tokio::fs::read(Self::db_path(&dir)).await {
            if let Err(err) = decode_snapshot(&bytes, &files) {
                tracing::warn!(%err, "metadata.db did not parse; starting empty");
                files.clear();
            }
        }
        Self { files, dir, save_lock: Mutex::new(()) }
    }

    pub fn get(&self, filename: &str) -> Option<FileMetadata> {
        self.files.get(filename).map(|r| r.clone())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.files.contains_key(filename)
    }

    pub fn insert(&self, meta: FileMetadata) -> Result<()> {
        if self.files.len() >= CAPACITY && !self.files.contains_key(&meta.filename) {
            return Err(Error::TableFull);
        }
        self.files.insert(meta.filename.clone(), meta);
        Ok(())
    }

    pub fn remove(&self, filename: &str) {
        self.files.remove(filename);
    }

    pub fn update_access_time(&self, filename: &str, now: i64) {
        if let Some(mut entry) = self.files.get_mut(filename) {
            entry.last_access = now;
        }
    }

    /// Rewrites size/word/char counts and bumps `last_modified`, used
    /// after WRITE commit, UNDO and REVERT.
    pub fn update_content_counts(
        &self,
        filename: &str,
        size_bytes: u64,
        word_count: u64,
        char_count: u64,
        now: i64,
    ) {
        if let Some(mut entry) = self.files.get_mut(filename) {
            entry.size_bytes = size_bytes;
            entry.word_count = word_count;
            entry.char_count = char_count;
            entry.last_modified = now;
        }
    }

    pub fn set_is_backup(&self, filename: &str, is_backup: bool) {
        if let Some(mut entry) = self.files.get_mut(filename) {
            entry.is_backup = is_backup;
        }
    }

    /// Every file this SS holds as a primary (`is_backup == false`),
    /// used by RE_REPLICATE_ALL's full-scan re-replication.
    pub fn primaries(&self) -> Vec<FileMetadata> {
        self.files.iter().filter(|e| !e.is_backup).map(|e| e.clone()).collect()
    }

    pub fn all(&self) -> Vec<FileMetadata> {
        self.files.iter().map(|e| e.clone()).collect()
    }

    /// Atomic snapshot save: serialized by `save_lock`, written to a temp
    /// file and renamed into place so a crash mid-write never corrupts
    /// `metadata.db`.
    pub async fn save(&self) -> Result<()> {
        let _guard = self.save_lock.lock().await;
        let snapshot = self.all();
        let bytes = encode_snapshot(&snapshot)?;
        let tmp = self.dir.join("metadata.db.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, Self::db_path(&self.dir)).await?;
        Ok(())
    }
}

fn encode_snapshot(entries: &[FileMetadata]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    out.write_u32::<LittleEndian>(entries.len() as u32)?;
    for meta in entries {
        write_len_prefixed(&mut out, &meta.filename)?;
        write_len_prefixed(&mut out, &meta.owner)?;
        out.write_u64::<LittleEndian>(meta.size_bytes)?;
        out.write_u64::<LittleEndian>(meta.word_count)?;
        out.write_u64::<LittleEndian>(meta.char_count)?;
        out.write_i64::<LittleEndian>(meta.last_modified)?;
        out.write_i64::<LittleEndian>(meta.last_access)?;
        out.write_u8(meta.is_backup as u8)?;
    }
    Ok(out)
}

fn decode_snapshot(bytes: &[u8], into: &DashMap<String, FileMetadata>) -> Result<()> {
    let mut cur = std::io::Cursor::new(bytes);
    let count = cur.read_u32::<LittleEndian>()?;
    for _ in 0..count {
        let filename = read_len_prefixed(&mut cur)?;
        let owner = read_len_prefixed(&mut cur)?;
        let size_bytes = cur.read_u64::<LittleEndian>()?;
        let word_count = cur.read_u64::<LittleEndian>()?;
        let char_count = cur.read_u64::<LittleEndian>()?;
        let last_modified = cur.read_i64::<LittleEndian>()?;
        let last_access = cur.read_i64::<LittleEndian>()?;
        let is_backup = cur.read_u8()? != 0;
        into.insert(
            filename.clone(),
            FileMetadata {
                filename,
                owner,
                size_bytes,
                word_count,
                char_count,
                last_modified,
                last_access,
                is_backup,
            },
        );
    }
    Ok(())
}

fn write_len_prefixed(out: &mut Vec<u8>, s: &str) -> Result<()> {
    out.write_u32::<LittleEndian>(s.len() as u32)?;
    out.write_all(s.as_bytes())?;
    Ok(())
}

fn read_len_prefixed(cur: &mut std::io::Cursor<&[u8]>) -> Result<String> {
    let len = cur.read_u32::<LittleEndian>()? as usize;
    let mut buf = vec![0u8; len];
    cur.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|_| Error::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        "metadata.db contained non-UTF8 string",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(filename: &str) -> FileMetadata {
        FileMetadata {
            filename: filename.to_string(),
            owner: "alice".to_string(),
            size_bytes: 10,
            word_count: 2,
            char_count: 10,
            last_modified: 100,
            last_access: 100,
            is_backup: false,
        }
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let table = MetadataTable::load(dir.path()).await;
        table.insert(meta("a.txt")).unwrap();
        table.insert(meta("b.txt")).unwrap();
        table.save().await.unwrap();

        let reloaded = MetadataTable::load(dir.path()).await;
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get("a.txt").unwrap().owner, "alice");
    }

    #[test]
    fn primaries_excludes_backup_copies() {
        let table = DashMap::new();
        table.insert("a.txt".to_string(), meta("a.txt"));
        let mut backup = meta("b.txt");
        backup.is_backup = true;
        table.insert("b.txt".to_string(), backup);
        let meta_table = MetadataTable {
            files: table,
            dir: PathBuf::new(),
            save_lock: Mutex::new(()),
        };
        let primaries = meta_table.primaries();
        assert_eq!(primaries.len(), 1);
        assert_eq!(primaries[0].filename, "a.txt");
    }

    #[test]
    fn table_full_rejects_new_filename_but_allows_update() {
        let table = DashMap::new();
        for i in 0..CAPACITY {
            table.insert(format!("f{i}"), meta(&format!("f{i}")));
        }
        let meta_table = MetadataTable {
            files: table,
            dir: PathBuf::new(),
            save_lock: Mutex::new(()),
        };
        assert!(matches!(meta_table.insert(meta("new.txt")), Err(Error::TableFull)));
        assert!(meta_table.insert(meta("f0")).is_ok());
    }
}

//! File lock map: one coarse read/write lock plus a growable array of
//! per-sentence locks, per filename, lazily constructed (§4.3).
//!
//! Sharded by `DashMap` in place of the source's bucket-mutex array;
//! each entry owns its own `tokio::sync::RwLock` so callers can hold an
//! owned guard across an `.await` without borrowing the map.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard, OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

pub struct FileLock {
    coarse: Arc<RwLock<()>>,
    /// Guards growth of `sentences`; a WRITE's `try_lock` on a specific
    /// index is taken on the per-sentence mutex itself, not this one.
    sentences: Mutex<Vec<Arc<Mutex<()>>>>,
}

impl FileLock {
    fn new() -> Self {
        Self { coarse: Arc::new(RwLock::new(())), sentences: Mutex::new(Vec::new()) }
    }

    async fn sentence_mutex(&self, index: usize) -> Arc<Mutex<()>> {
        let mut sentences = self.sentences.lock().await;
        if sentences.len() <= index {
            sentences.resize_with(index + 1, || Arc::new(Mutex::new(())));
        }
        Arc::clone(&sentences[index])
    }
}

/// Sharded file lock map, keyed by filename.
pub struct FileLockMap {
    files: DashMap<String, Arc<FileLock>>,
}

impl FileLockMap {
    pub fn new() -> Self {
        Self { files: DashMap::new() }
    }

    fn get_or_create(&self, filename: &str) -> Arc<FileLock> {
        Arc::clone(
            &self
                .files
                .entry(filename.to_string())
                .or_insert_with(|| Arc::new(FileLock::new())),
        )
    }

    pub async fn read(&self, filename: &str) -> OwnedRwLockReadGuard<()> {
        let lock = self.get_or_create(filename);
        Arc::clone(&lock.coarse).read_owned().await
    }

    pub async fn write(&self, filename: &str) -> OwnedRwLockWriteGuard<()> {
        let lock = self.get_or_create(filename);
        Arc::clone(&lock.coarse).write_owned().await
    }

    /// Attempts to lock sentence `index` without blocking; `None` means
    /// another writer already holds it (caller replies WRITE_LOCKED).
    pub async fn try_lock_sentence(
        &self,
        filename: &str,
        index: usize,
    ) -> Option<OwnedMutexGuard<()>> {
        let lock = self.get_or_create(filename);
        let mutex = lock.sentence_mutex(index).await;
        mutex.try_lock_owned().ok()
    }

    /// Drops the whole entry, used by DELETE once the coarse write lock
    /// has been taken and the file is gone for good.
    pub fn forget(&self, filename: &str) {
        self.files.remove(filename);
    }
}

impl Default for FileLockMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_try_lock_on_same_sentence_fails_while_first_held() {
        let map = FileLockMap::new();
        let guard = map.try_lock_sentence("f.txt", 0).await;
        assert!(guard.is_some());
        let second = map.try_lock_sentence("f.txt", 0).await;
        assert!(second.is_none());
        drop(guard);
        assert!(map.try_lock_sentence("f.txt", 0).await.is_some());
    }

    #[tokio::test]
    async fn different_sentences_lock_independently() {
        let map = FileLockMap::new();
        let a = map.try_lock_sentence("f.txt", 0).await;
        let b = map.try_lock_sentence("f.txt", 1).await;
        assert!(a.is_some());
        assert!(b.is_some());
    }

    #[tokio::test]
    async fn coarse_write_excludes_concurrent_read() {
        let map = FileLockMap::new();
        let _write = map.write("f.txt").await;
        let read_attempt = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            map.read("f.txt"),
        )
        .await;
        assert!(read_attempt.is_err());
    }
}

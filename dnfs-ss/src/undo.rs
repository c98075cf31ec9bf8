//! UNDO: a single-slot three-way rename swap between `files/F` and
//! `undo/F` (§4.3). No history beyond the one slot; undoing twice
//! restores the pre-undo state (undo is its own inverse).

use crate::error::{Error, Result};
use crate::locks::FileLockMap;
use crate::paths::SsRoot;
use crate::text::split_words;

pub async fn undo(root: &SsRoot, locks: &FileLockMap, filename: &str) -> Result<(u64, u64, u64)> {
    let undo_path = root.undo_path(filename);
    if tokio::fs::metadata(&undo_path).await.is_err() {
        return Err(Error::NoUndoHistory);
    }

    let _guard = locks.write(filename).await;
    let file_path = root.file_path(filename);
    let tmp_path = root.swap_dir().join(format!("{filename}_undo_tmp"));

    tokio::fs::rename(&file_path, &tmp_path).await?;
    tokio::fs::rename(&undo_path, &file_path).await?;
    tokio::fs::rename(&tmp_path, &undo_path).await?;

    let content = tokio::fs::read_to_string(&file_path).await?;
    let word_count: u64 = crate::text::split_sentences(&content)
        .iter()
        .map(|s| split_words(s).len() as u64)
        .sum();
    Ok((content.len() as u64, word_count, content.chars().count() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn undo_without_history_fails() {
        let dir = tempfile::tempdir().unwrap();
        let root = SsRoot::new(dir.path(), 1);
        root.ensure_dirs().await.unwrap();
        tokio::fs::write(root.file_path("a.txt"), "current").await.unwrap();
        let locks = FileLockMap::new();
        let err = undo(&root, &locks, "a.txt").await.unwrap_err();
        assert!(matches!(err, Error::NoUndoHistory));
    }

    #[tokio::test]
    async fn undo_swaps_current_and_undo_slot() {
        let dir = tempfile::tempdir().unwrap();
        let root = SsRoot::new(dir.path(), 1);
        root.ensure_dirs().await.unwrap();
        tokio::fs::write(root.file_path("a.txt"), "current.").await.unwrap();
        tokio::fs::write(root.undo_path("a.txt"), "previous.").await.unwrap();
        let locks = FileLockMap::new();

        undo(&root, &locks, "a.txt").await.unwrap();
        assert_eq!(tokio::fs::read_to_string(root.file_path("a.txt")).await.unwrap(), "previous.");
        assert_eq!(tokio::fs::read_to_string(root.undo_path("a.txt")).await.unwrap(), "current.");

        // undoing again restores the original state (undo is its own inverse).
        undo(&root, &locks, "a.txt").await.unwrap();
        assert_eq!(tokio::fs::read_to_string(root.file_path("a.txt")).await.unwrap(), "current.");
    }
}

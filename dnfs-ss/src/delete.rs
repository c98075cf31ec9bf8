//! Guarded DELETE: refuses to run while a WRITE is in flight, then drops
//! the file, its undo slot and every checkpoint (§4.3).

use crate::error::{Error, Result};
use crate::locks::FileLockMap;
use crate::metadata::MetadataTable;
use crate::paths::SsRoot;

pub async fn delete(
    root: &SsRoot,
    locks: &FileLockMap,
    meta: &MetadataTable,
    filename: &str,
) -> Result<()> {
    if root.has_swapfile(filename).await? {
        return Err(Error::WriteInProgress);
    }

    let _write_guard = locks.write(filename).await;

    let file_path = root.file_path(filename);
    tokio::fs::remove_file(&file_path).await.map_err(|_| Error::FileNotFound)?;
    let _ = tokio::fs::remove_file(root.undo_path(filename)).await;

    let prefix = format!("{filename}_");
    if let Ok(mut entries) = tokio::fs::read_dir(root.checkpoints_dir()).await {
        while let Ok(Some(entry)) = entries.next_entry().await {
            if entry.file_name().to_string_lossy().starts_with(&prefix) {
                let _ = tokio::fs::remove_file(entry.path()).await;
            }
        }
    }

    meta.remove(filename);
    drop(_write_guard);
    locks.forget(filename);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delete_with_in_flight_write_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let root = SsRoot::new(dir.path(), 1);
        root.ensure_dirs().await.unwrap();
        tokio::fs::write(root.file_path("a.txt"), "x.").await.unwrap();
        tokio::fs::write(root.swap_dir().join("a.txt_swap_0"), "x.").await.unwrap();

        let locks = FileLockMap::new();
        let meta = MetadataTable::load(dir.path()).await;
        let err = delete(&root, &locks, &meta, "a.txt").await.unwrap_err();
        assert!(matches!(err, Error::WriteInProgress));
    }

    #[tokio::test]
    async fn delete_removes_file_undo_and_checkpoints() {
        let dir = tempfile::tempdir().unwrap();
        let root = SsRoot::new(dir.path(), 1);
        root.ensure_dirs().await.unwrap();
        tokio::fs::write(root.file_path("a.txt"), "x.").await.unwrap();
        tokio::fs::write(root.undo_path("a.txt"), "y.").await.unwrap();
        tokio::fs::write(root.checkpoint_path("a.txt", "v1"), "z.").await.unwrap();

        let locks = FileLockMap::new();
        let meta = MetadataTable::load(dir.path()).await;
        delete(&root, &locks, &meta, "a.txt").await.unwrap();

        assert!(tokio::fs::metadata(root.file_path("a.txt")).await.is_err());
        assert!(tokio::fs::metadata(root.undo_path("a.txt")).await.is_err());
        assert!(tokio::fs::metadata(root.checkpoint_path("a.txt", "v1")).await.is_err());
    }
}

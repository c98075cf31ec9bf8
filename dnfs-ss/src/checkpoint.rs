//! Tagged checkpoints: create/revert/list against `checkpoints/F_<tag>`
//! (§4.3). VIEWCHECKPOINT streams content through the same chunked
//! framing as READ; see [`crate::readstream::read_chunks`].

use crate::error::{Error, Result};
use crate::locks::FileLockMap;
use crate::paths::SsRoot;
use crate::text::split_sentences;

pub struct CheckpointInfo {
    pub tag: String,
    pub size_bytes: u64,
    pub modified: i64,
}

/// Copies `files/F` to `checkpoints/F_<tag>`; fails if that tag already
/// exists for `F`.
pub async fn create(root: &SsRoot, locks: &FileLockMap, filename: &str, tag: &str) -> Result<()> {
    let _read_guard = locks.read(filename).await;
    let dest = root.checkpoint_path(filename, tag);
    if tokio::fs::metadata(&dest).await.is_ok() {
        return Err(Error::FileAlreadyExists);
    }
    let source = root.file_path(filename);
    tokio::fs::metadata(&source).await.map_err(|_| Error::FileNotFound)?;
    tokio::fs::copy(&source, &dest).await?;
    Ok(())
}

/// Copies `checkpoints/F_<tag>` back onto `files/F`, refreshing the undo
/// slot with the pre-revert content first.
pub async fn revert(
    root: &SsRoot,
    locks: &FileLockMap,
    filename: &str,
    tag: &str,
) -> Result<(u64, u64, u64)> {
    let source = root.checkpoint_path(filename, tag);
    tokio::fs::metadata(&source).await.map_err(|_| Error::FileNotFound)?;

    let _write_guard = locks.write(filename).await;
    let file_path = root.file_path(filename);
    if tokio::fs::metadata(&file_path).await.is_ok() {
        tokio::fs::copy(&file_path, root.undo_path(filename)).await?;
    }
    tokio::fs::copy(&source, &file_path).await?;

    let content = tokio::fs::read_to_string(&file_path).await?;
    let word_count: u64 =
        split_sentences(&content).iter().map(|s| crate::text::split_words(s).len() as u64).sum();
    Ok((content.len() as u64, word_count, content.chars().count() as u64))
}

/// Streams a checkpoint's content for VIEWCHECKPOINT, under a coarse
/// read lock.
pub async fn read_content(
    root: &SsRoot,
    locks: &FileLockMap,
    filename: &str,
    tag: &str,
) -> Result<Vec<u8>> {
    let _read_guard = locks.read(filename).await;
    let path = root.checkpoint_path(filename, tag);
    tokio::fs::read(&path).await.map_err(|_| Error::FileNotFound)
}

/// Lists every checkpoint tag recorded for `filename`.
pub async fn list(root: &SsRoot, filename: &str) -> Result<Vec<CheckpointInfo>> {
    let prefix = format!("{filename}_");
    let mut out = Vec::new();
    let mut entries = match tokio::fs::read_dir(root.checkpoints_dir()).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(out),
        Err(err) => return Err(err.into()),
    };
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(tag) = name.strip_prefix(&prefix) else { continue };
        let meta = entry.metadata().await?;
        let modified = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        out.push(CheckpointInfo { tag: tag.to_string(), size_bytes: meta.len(), modified });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> (tempfile::TempDir, SsRoot) {
        let dir = tempfile::tempdir().unwrap();
        let root = SsRoot::new(dir.path(), 1);
        root.ensure_dirs().await.unwrap();
        tokio::fs::write(root.file_path("a.txt"), "v1.").await.unwrap();
        (dir, root)
    }

    #[tokio::test]
    async fn create_then_duplicate_tag_fails() {
        let (_dir, root) = setup().await;
        let locks = FileLockMap::new();
        create(&root, &locks, "a.txt", "v1").await.unwrap();
        let err = create(&root, &locks, "a.txt", "v1").await.unwrap_err();
        assert!(matches!(err, Error::FileAlreadyExists));
    }

    #[tokio::test]
    async fn revert_restores_checkpoint_and_saves_undo() {
        let (_dir, root) = setup().await;
        let locks = FileLockMap::new();
        create(&root, &locks, "a.txt", "v1").await.unwrap();
        tokio::fs::write(root.file_path("a.txt"), "v2.").await.unwrap();

        revert(&root, &locks, "a.txt", "v1").await.unwrap();
        assert_eq!(tokio::fs::read_to_string(root.file_path("a.txt")).await.unwrap(), "v1.");
        assert_eq!(tokio::fs::read_to_string(root.undo_path("a.txt")).await.unwrap(), "v2.");
    }

    #[tokio::test]
    async fn list_enumerates_tags_for_file_only() {
        let (_dir, root) = setup().await;
        let locks = FileLockMap::new();
        create(&root, &locks, "a.txt", "v1").await.unwrap();
        create(&root, &locks, "a.txt", "v2").await.unwrap();
        tokio::fs::write(root.file_path("b.txt"), "other.").await.unwrap();
        create(&root, &locks, "b.txt", "v1").await.unwrap();

        let tags: Vec<String> = list(&root, "a.txt").await.unwrap().into_iter().map(|c| c.tag).collect();
        assert_eq!(tags.len(), 2);
        assert!(tags.contains(&"v1".to_string()));
        assert!(tags.contains(&"v2".to_string()));
    }
}

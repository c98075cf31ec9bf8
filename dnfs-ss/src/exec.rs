//! EXEC_GET_CONTENT: hands the full file content back to the NS so *it*
//! runs the script with `bash` (§4.3). The SS never executes anything
//! itself; this module only reads the file under a coarse read lock.

use crate::error::{Error, Result};
use crate::locks::FileLockMap;
use crate::paths::SsRoot;

pub async fn get_content(root: &SsRoot, locks: &FileLockMap, filename: &str) -> Result<String> {
    let _read_guard = locks.read(filename).await;
    tokio::fs::read_to_string(root.file_path(filename)).await.map_err(|_| Error::FileNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_full_file_content() {
        let dir = tempfile::tempdir().unwrap();
        let root = SsRoot::new(dir.path(), 1);
        root.ensure_dirs().await.unwrap();
        tokio::fs::write(root.file_path("a.sh"), "echo hi\n").await.unwrap();
        let locks = FileLockMap::new();
        let content = get_content(&root, &locks, "a.sh").await.unwrap();
        assert_eq!(content, "echo hi\n");
    }

    #[tokio::test]
    async fn missing_file_is_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let root = SsRoot::new(dir.path(), 1);
        root.ensure_dirs().await.unwrap();
        let locks = FileLockMap::new();
        let err = get_content(&root, &locks, "missing.sh").await.unwrap_err();
        assert!(matches!(err, Error::FileNotFound));
    }
}

//! Per-SS data root layout: `ss_data_<id>/{files,undo,checkpoints,swap,
//! metadata.db}` (§4.3). The id is the persistent key; a restarted SS
//! reconnecting from the same ip+port is handed the same id by the NS
//! and so reopens the same root.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct SsRoot {
    base: PathBuf,
}

impl SsRoot {
    pub fn new(data_dir: impl AsRef<Path>, ss_id: i32) -> Self {
        Self { base: data_dir.as_ref().join(format!("ss_data_{ss_id}")) }
    }

    pub async fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [self.files_dir(), self.undo_dir(), self.checkpoints_dir(), self.swap_dir()] {
            tokio::fs::create_dir_all(dir).await?;
        }
        Ok(())
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn files_dir(&self) -> PathBuf {
        self.base.join("files")
    }

    pub fn undo_dir(&self) -> PathBuf {
        self.base.join("undo")
    }

    pub fn checkpoints_dir(&self) -> PathBuf {
        self.base.join("checkpoints")
    }

    pub fn swap_dir(&self) -> PathBuf {
        self.base.join("swap")
    }

    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.files_dir().join(filename)
    }

    pub fn undo_path(&self, filename: &str) -> PathBuf {
        self.undo_dir().join(filename)
    }

    pub fn swap_path(&self, filename: &str, sentence_num: i32) -> PathBuf {
        self.swap_dir().join(format!("{filename}_swap_{sentence_num}"))
    }

    pub fn checkpoint_path(&self, filename: &str, tag: &str) -> PathBuf {
        self.checkpoints_dir().join(format!("{filename}_{tag}"))
    }

    /// True if any swapfile for `filename` currently exists, the guard
    /// DELETE consults to refuse deleting a file mid-WRITE.
    pub async fn has_swapfile(&self, filename: &str) -> std::io::Result<bool> {
        let prefix = format!("{filename}_swap_");
        let mut entries = match tokio::fs::read_dir(self.swap_dir()).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(err) => return Err(err),
        };
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_name().to_string_lossy().starts_with(&prefix) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_nest_under_ss_data_dir() {
        let root = SsRoot::new("/srv/dnfs", 3);
        assert_eq!(root.base(), Path::new("/srv/dnfs/ss_data_3"));
        assert_eq!(root.file_path("a.txt"), Path::new("/srv/dnfs/ss_data_3/files/a.txt"));
        assert_eq!(
            root.swap_path("a.txt", 2),
            Path::new("/srv/dnfs/ss_data_3/swap/a.txt_swap_2")
        );
    }

    #[tokio::test]
    async fn has_swapfile_detects_matching_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let root = SsRoot::new(dir.path(), 1);
        root.ensure_dirs().await.unwrap();
        assert!(!root.has_swapfile("a.txt").await.unwrap());
        tokio::fs::write(root.swap_dir().join("a.txt_swap_0"), b"x").await.unwrap();
        assert!(root.has_swapfile("a.txt").await.unwrap());
        assert!(!root.has_swapfile("b.txt").await.unwrap());
    }
}

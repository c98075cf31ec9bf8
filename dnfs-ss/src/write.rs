//! WRITE transaction engine: trylock sentence, swap/undo handoff,
//! word-level splicing, and the re-read-and-merge commit (§4.3).

use tokio::sync::OwnedMutexGuard;

use crate::error::{Error, Result};
use crate::locks::FileLockMap;
use crate::paths::SsRoot;
use crate::text::{join_sentences, join_words, sentence_ends_with_delimiter, split_sentences, split_words};

/// An open WRITE transaction on one sentence of one file. Dropping this
/// without calling [`WriteSession::commit`] leaves the swap file dangling
/// on disk; callers must call [`WriteSession::abort`] on disconnect.
pub struct WriteSession {
    pub filename: String,
    pub sentence_num: i32,
    words: Vec<String>,
    _sentence_guard: OwnedMutexGuard<()>,
}

/// Opens a transaction: trylocks the sentence, snapshots `files/F` into
/// `swap/F_swap_N`, refreshes the undo slot, and validates `sentence_num`
/// against the snapshot.
pub async fn begin(
    root: &SsRoot,
    locks: &FileLockMap,
    filename: &str,
    sentence_num: i32,
) -> Result<WriteSession> {
    if sentence_num < 0 {
        return Err(Error::InvalidIndex);
    }
    let guard = locks
        .try_lock_sentence(filename, sentence_num as usize)
        .await
        .ok_or(Error::WriteLocked)?;

    let file_path = root.file_path(filename);
    let content = match tokio::fs::read_to_string(&file_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(err) => return Err(err.into()),
    };

    let swap_path = root.swap_path(filename, sentence_num);
    tokio::fs::write(&swap_path, &content).await?;
    tokio::fs::copy(&swap_path, root.undo_path(filename)).await?;

    let sentences = split_sentences(&content);
    let num_sentences = sentences.len();
    let words = if (sentence_num as usize) < num_sentences {
        split_words(&sentences[sentence_num as usize])
    } else if sentence_num as usize == num_sentences {
        let appendable = num_sentences == 0
            || sentence_ends_with_delimiter(&sentences[num_sentences - 1]);
        if !appendable {
            let _ = tokio::fs::remove_file(&swap_path).await;
            return Err(Error::InvalidIndex);
        }
        Vec::new()
    } else {
        let _ = tokio::fs::remove_file(&swap_path).await;
        return Err(Error::InvalidIndex);
    };

    Ok(WriteSession { filename: filename.to_string(), sentence_num, words, _sentence_guard: guard })
}

impl WriteSession {
    pub fn num_words(&self) -> usize {
        self.words.len()
    }

    /// Splices `content`'s words into the working sentence at
    /// `word_index`, shifting later words right. Out-of-range indices
    /// fail this call only; the transaction itself survives.
    pub fn splice(&mut self, word_index: i32, content: &str) -> Result<()> {
        if word_index < 0 || word_index as usize > self.words.len() {
            return Err(Error::InvalidIndex);
        }
        let new_words = split_words(content);
        let at = word_index as usize;
        self.words.splice(at..at, new_words);
        Ok(())
    }

    /// Commits the working sentence: re-reads the *current* file (other
    /// writers may have committed other sentences meanwhile), splices
    /// the working sentence in at `sentence_num`, and persists the
    /// result. Returns the new `(size_bytes, word_count, char_count)`.
    pub async fn commit(
        self,
        root: &SsRoot,
        locks: &FileLockMap,
    ) -> Result<(u64, u64, u64)> {
        let working = join_words(&self.words);

        let _write_guard = locks.write(&self.filename).await;

        let file_path = root.file_path(&self.filename);
        let current = match tokio::fs::read_to_string(&file_path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(err) => return Err(err.into()),
        };
        let mut sentences = split_sentences(&current);
        let n = self.sentence_num as usize;
        if n < sentences.len() {
            sentences[n] = working;
        } else if n == sentences.len() {
            sentences.push(working);
        } else {
            return Err(Error::InvalidIndex);
        }

        let merged = join_sentences(&sentences);
        let tmp = root.swap_dir().join(format!("{}_commit_tmp", self.filename));
        tokio::fs::write(&tmp, &merged).await?;
        tokio::fs::rename(&tmp, &file_path).await?;
        let _ = tokio::fs::remove_file(root.swap_path(&self.filename, self.sentence_num)).await;

        let word_count: u64 = sentences.iter().map(|s| split_words(s).len() as u64).sum();
        let char_count = merged.chars().count() as u64;
        Ok((merged.len() as u64, word_count, char_count))
    }

    /// Drops the swap file without touching `files/F`, for a WRITE_ETIRW
    /// that never commits or a client disconnect mid-transaction.
    pub async fn abort(self, root: &SsRoot) {
        let _ = tokio::fs::remove_file(root.swap_path(&self.filename, self.sentence_num)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locks::FileLockMap;

    async fn setup(content: &str) -> (tempfile::TempDir, SsRoot) {
        let dir = tempfile::tempdir().unwrap();
        let root = SsRoot::new(dir.path(), 1);
        root.ensure_dirs().await.unwrap();
        if !content.is_empty() {
            tokio::fs::write(root.file_path("a.txt"), content).await.unwrap();
        }
        (dir, root)
    }

    #[tokio::test]
    async fn begin_on_empty_file_opens_sentence_zero() {
        let (_dir, root) = setup("").await;
        let locks = FileLockMap::new();
        let session = begin(&root, &locks, "a.txt", 0).await.unwrap();
        assert_eq!(session.num_words(), 0);
    }

    #[tokio::test]
    async fn begin_rejects_index_past_appendable_bound() {
        let (_dir, root) = setup("One two").await;
        let locks = FileLockMap::new();
        // no delimiter yet, so sentence 1 is not appendable.
        let err = begin(&root, &locks, "a.txt", 1).await.unwrap_err();
        assert!(matches!(err, Error::InvalidIndex));
    }

    #[tokio::test]
    async fn splice_and_commit_writes_new_sentence() {
        let (_dir, root) = setup("Hello world.").await;
        let locks = FileLockMap::new();
        let mut session = begin(&root, &locks, "a.txt", 1).await.unwrap();
        session.splice(0, "Bye").unwrap();
        session.splice(1, ".").unwrap();
        session.commit(&root, &locks).await.unwrap();

        let result = tokio::fs::read_to_string(root.file_path("a.txt")).await.unwrap();
        assert_eq!(result, "Hello world.Bye.");
    }

    #[tokio::test]
    async fn commit_replaces_existing_sentence() {
        let (_dir, root) = setup("Hello world. Second one.").await;
        let locks = FileLockMap::new();
        let mut session = begin(&root, &locks, "a.txt", 0).await.unwrap();
        assert_eq!(session.num_words(), 3);
        session.splice(1, "there").unwrap();
        session.commit(&root, &locks).await.unwrap();

        let result = tokio::fs::read_to_string(root.file_path("a.txt")).await.unwrap();
        assert_eq!(result, "Hello there world. Second one.");
    }

    #[tokio::test]
    async fn abort_leaves_file_untouched() {
        let (_dir, root) = setup("Hello world.").await;
        let locks = FileLockMap::new();
        let session = begin(&root, &locks, "a.txt", 1).await.unwrap();
        session.abort(&root).await;
        let result = tokio::fs::read_to_string(root.file_path("a.txt")).await.unwrap();
        assert_eq!(result, "Hello world.");
    }

    #[tokio::test]
    async fn second_trylock_on_same_sentence_is_rejected() {
        let (_dir, root) = setup("Hello world.").await;
        let locks = FileLockMap::new();
        let _held = begin(&root, &locks, "a.txt", 1).await.unwrap();
        let err = begin(&root, &locks, "a.txt", 1).await.unwrap_err();
        assert!(matches!(err, Error::WriteLocked));
    }
}

//! File-backed key-value store.

use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;

use super::{KeyValueStore, StorageError};

/// Key-value store keeping one file per key in a directory.
///
/// File names are the percent-encoded key plus a `.json` extension, so keys
/// such as `@floatingCart:products` are safe on every platform. Each write
/// goes to its own uniquely named temporary file in the same directory, which
/// is then renamed into place. A crash mid-write leaves the previous value
/// intact, and concurrent writers to one key never share a temporary file.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory cannot be created.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::io(&dir.display().to_string(), e))?;
        Ok(Self { dir })
    }

    /// The directory holding the stored files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", urlencoding::encode(key)))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(key, e)),
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let dir = self.dir.clone();
        let target = path.clone();
        let bytes = value.as_bytes().to_vec();

        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut tmp = NamedTempFile::new_in(&dir)?;
            tmp.write_all(&bytes)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| StorageError::io(key, std::io::Error::other(e)))?
        .map_err(|e| StorageError::io(key, e))?;

        tracing::trace!(key, path = %path.display(), bytes = value.len(), "Stored item");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();
        assert_eq!(store.get_item("@floatingCart:products").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        store.set_item("@floatingCart:products", "[]").await.unwrap();
        assert_eq!(
            store
                .get_item("@floatingCart:products")
                .await
                .unwrap()
                .as_deref(),
            Some("[]")
        );
        assert!(dir.path().join("%40floatingCart%3Aproducts.json").exists());
    }

    #[tokio::test]
    async fn test_overwrite_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).await.unwrap();

        store.set_item("k", "one").await.unwrap();
        store.set_item("k", "two").await.unwrap();

        assert_eq!(store.get_item("k").await.unwrap().as_deref(), Some("two"));
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_to_one_key() {
        let dir = tempfile::tempdir().unwrap();
        let first = FileStore::open(dir.path()).await.unwrap();
        let second = FileStore::open(dir.path()).await.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = if i % 2 == 0 { first.clone() } else { second.clone() };
                tokio::spawn(async move {
                    let value = format!("[\"writer-{i}\"]");
                    store.set_item("@floatingCart:products", &value).await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = first.get_item("@floatingCart:products").await.unwrap().unwrap();
        let writers: Vec<String> = (0..16).map(|i| format!("[\"writer-{i}\"]")).collect();
        assert!(writers.contains(&stored), "unexpected value {stored}");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_open_creates_nested_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = FileStore::open(&nested).await.unwrap();
        assert!(store.dir().is_dir());
    }
}

//! Local file storage backend

use async_trait::async_trait;
use exitcheck_types::{AddressSet, RefreshTimestamp};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::backend::ListStore;
use crate::error::StorageError;

/// Default location of the address list
pub const DEFAULT_LIST_PATH: &str = "./data/exit-addresses.txt";

/// Default location of the refresh timestamp
pub const DEFAULT_TIMESTAMP_PATH: &str = "./data/exit-addresses.timestamp";

/// File-backed store
///
/// Keeps the record in two sibling text files:
/// - `<list_path>`: one address per line
/// - `<timestamp_path>`: decimal milliseconds since the Unix epoch
pub struct FileStore {
    list_path: PathBuf,
    timestamp_path: PathBuf,
}

impl FileStore {
    /// Create a file store at explicit paths
    ///
    /// Nothing is touched on disk until the first write, which creates
    /// missing parent directories.
    pub fn new(list_path: impl AsRef<Path>, timestamp_path: impl AsRef<Path>) -> Self {
        let list_path = list_path.as_ref().to_path_buf();
        let timestamp_path = timestamp_path.as_ref().to_path_buf();

        info!(
            "Initialized file store (list: {:?}, timestamp: {:?})",
            list_path, timestamp_path
        );

        Self {
            list_path,
            timestamp_path,
        }
    }

    /// Create a file store at the default paths
    pub fn with_default_paths() -> Self {
        Self::new(DEFAULT_LIST_PATH, DEFAULT_TIMESTAMP_PATH)
    }

    pub fn list_path(&self) -> &Path {
        &self.list_path
    }

    pub fn timestamp_path(&self) -> &Path {
        &self.timestamp_path
    }

    /// Read a file, mapping a missing file to `None`
    async fn read_optional(path: &Path) -> Result<Option<String>, std::io::Error> {
        match fs::read_to_string(path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Replace a file's content atomically
    ///
    /// Writes to a temp file in the target directory, syncs it, then
    /// renames it over the target.
    async fn write_atomic(path: &Path, content: String) -> Result<(), StorageError> {
        let path = path.to_path_buf();

        tokio::task::spawn_blocking(move || -> Result<(), StorageError> {
            let parent = match path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                _ => PathBuf::from("."),
            };
            std::fs::create_dir_all(&parent)?;

            let temp_file = tempfile::NamedTempFile::new_in(&parent)?;
            {
                let mut file = temp_file.as_file();
                file.write_all(content.as_bytes())?;
                file.sync_all()?;
            }

            temp_file
                .persist(&path)
                .map_err(|e| StorageError::Io(e.error))?;

            Ok(())
        })
        .await
        .map_err(|e| StorageError::Backend(format!("Task join error: {}", e)))?
    }
}

#[async_trait]
impl ListStore for FileStore {
    async fn read_addresses(&self) -> AddressSet {
        debug!("Reading address list from {:?}", self.list_path);

        let content = match Self::read_optional(&self.list_path).await {
            Ok(Some(content)) => content,
            Ok(None) => {
                debug!("No address list at {:?}", self.list_path);
                return AddressSet::new();
            }
            Err(e) => {
                warn!("Failed to read address list {:?}: {}", self.list_path, e);
                return AddressSet::new();
            }
        };

        let parsed = AddressSet::parse_lines(&content);
        if !parsed.rejected.is_empty() {
            warn!(
                "Ignored {} malformed lines in {:?}",
                parsed.rejected.len(),
                self.list_path
            );
        }

        parsed.addresses
    }

    async fn write_addresses(&self, addresses: &AddressSet) -> Result<(), StorageError> {
        debug!(
            "Writing {} addresses to {:?}",
            addresses.len(),
            self.list_path
        );
        Self::write_atomic(&self.list_path, addresses.to_lines()).await
    }

    async fn read_timestamp(&self) -> RefreshTimestamp {
        match Self::read_optional(&self.timestamp_path).await {
            Ok(Some(content)) => match content.parse::<RefreshTimestamp>() {
                Ok(timestamp) => timestamp,
                Err(e) => {
                    warn!("Malformed timestamp in {:?}: {}", self.timestamp_path, e);
                    RefreshTimestamp::NEVER
                }
            },
            Ok(None) => RefreshTimestamp::NEVER,
            Err(e) => {
                warn!("Failed to read timestamp {:?}: {}", self.timestamp_path, e);
                RefreshTimestamp::NEVER
            }
        }
    }

    async fn write_timestamp(&self, timestamp: RefreshTimestamp) -> Result<(), StorageError> {
        debug!("Writing timestamp {} to {:?}", timestamp, self.timestamp_path);
        Self::write_atomic(&self.timestamp_path, format!("{}\n", timestamp)).await
    }

    fn describe(&self) -> String {
        format!(
            "file store ({}, {})",
            self.list_path.display(),
            self.timestamp_path.display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_in(dir: &Path) -> FileStore {
        FileStore::new(dir.join("exits.txt"), dir.join("exits.timestamp"))
    }

    #[tokio::test]
    async fn test_missing_files_read_empty() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        assert!(store.read_addresses().await.is_empty());
        assert_eq!(store.read_timestamp().await, RefreshTimestamp::NEVER);
    }

    #[tokio::test]
    async fn test_round_trip() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let addresses = AddressSet::try_from_iter(["1.1.1.1", "2.2.2.2", "10.0.0.1"]).unwrap();

        store.write_addresses(&addresses).await.unwrap();
        store
            .write_timestamp(RefreshTimestamp::from_millis(1_700_000_000_000))
            .await
            .unwrap();

        assert_eq!(store.read_addresses().await, addresses);
        assert_eq!(
            store.read_timestamp().await,
            RefreshTimestamp::from_millis(1_700_000_000_000)
        );

        let on_disk = std::fs::read_to_string(dir.path().join("exits.timestamp")).unwrap();
        assert_eq!(on_disk.trim(), "1700000000000");
    }

    #[tokio::test]
    async fn test_read_trims_blank_and_malformed_lines() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("exits.txt"),
            "\n 1.2.3.4 \n\n999.1.1.1\r\n5.6.7.8\n\n",
        )
        .unwrap();
        let store = store_in(dir.path());

        let addresses = store.read_addresses().await;
        assert_eq!(addresses.len(), 2);
        assert!(addresses.contains("1.2.3.4"));
        assert!(addresses.contains("5.6.7.8"));
    }

    #[tokio::test]
    async fn test_malformed_timestamp_reads_never() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("exits.timestamp"), "yesterday").unwrap();
        let store = store_in(dir.path());

        assert_eq!(store.read_timestamp().await, RefreshTimestamp::NEVER);
    }

    #[tokio::test]
    async fn test_write_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = store_in(&nested);
        let addresses = AddressSet::try_from_iter(["4.4.4.4"]).unwrap();

        store.write_addresses(&addresses).await.unwrap();
        assert_eq!(store.read_addresses().await, addresses);
    }

    #[tokio::test]
    async fn test_write_overwrites_previous_record() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        let first = AddressSet::try_from_iter(["1.1.1.1", "2.2.2.2"]).unwrap();
        let second = AddressSet::try_from_iter(["3.3.3.3"]).unwrap();
        store.write_addresses(&first).await.unwrap();
        store.write_addresses(&second).await.unwrap();

        assert_eq!(store.read_addresses().await, second);
    }

    #[tokio::test]
    async fn test_write_failure_is_reported() {
        let dir = tempdir().unwrap();
        // A directory where the list file should be makes the rename fail
        let list_path = dir.path().join("exits.txt");
        std::fs::create_dir(&list_path).unwrap();
        let store = FileStore::new(&list_path, dir.path().join("exits.timestamp"));

        let addresses = AddressSet::try_from_iter(["1.1.1.1"]).unwrap();
        assert!(store.write_addresses(&addresses).await.is_err());
        assert!(store.read_addresses().await.is_empty());
    }
}

//! Key-value storage capability provided by the room host.
//!
//! The session core never touches disks or databases directly. It sees
//! only the [`Storage`] trait: fetch a text blob by key, replace a text
//! blob by key. Two implementations ship here:
//!
//! - [`MemoryStorage`]: a shared in-process map. State lives as long as
//!   the process, which is fine for tests and throwaway sessions.
//! - [`FileStorage`]: one JSON file per key under a directory, replaced
//!   atomically on every write. State survives a restart.

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

/// Persists text blobs by key.
///
/// A `put` must be durable (as far as the backend goes) by the time its
/// future resolves: the room broadcasts only after that.
///
/// # Example
///
/// ```rust
/// use std::io;
/// use wheelspin_session::Storage;
///
/// /// Forgets everything. Handy when persistence is not wanted at all.
/// struct NullStorage;
///
/// impl Storage for NullStorage {
///     async fn get(&self, _key: &str) -> io::Result<Option<String>> {
///         Ok(None)
///     }
///
///     async fn put(&self, _key: &str, _value: String) -> io::Result<()> {
///         Ok(())
///     }
/// }
/// ```
pub trait Storage: Send + Sync + 'static {
    /// Returns the blob stored under `key`, or `None` if there is none.
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = io::Result<Option<String>>> + Send;

    /// Replaces the blob stored under `key`.
    fn put(
        &self,
        key: &str,
        value: String,
    ) -> impl Future<Output = io::Result<()>> + Send;
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// In-process storage. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: String) -> io::Result<()> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileStorage
// ---------------------------------------------------------------------------

/// Directory-backed storage: key `wheel/state` lives in `wheel_state.json`.
///
/// Writes go to a temporary sibling file that is then renamed over the
/// target, so a crash mid-write leaves the previous value intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Opens (creating if needed) a storage directory.
    pub async fn open(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        tracing::info!(root = %root.display(), "file storage opened");
        Ok(Self { root })
    }

    /// The directory holding the blobs.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{file}.json"))
    }
}

impl Storage for FileStorage {
    async fn get(&self, key: &str) -> io::Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn put(&self, key: &str, value: String) -> io::Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");

        let mut file = tokio::fs::File::create(&tmp).await?;
        tokio::io::AsyncWriteExt::write_all(&mut file, value.as_bytes())
            .await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        tracing::trace!(key, path = %path.display(), "blob written");
        Ok(())
    }
}

//! On-disk storage: one file per cache key.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::debug;
use url::Url;

use super::{Storage, StorageError, cache_key};
use crate::cache::CachedResponse;
use crate::transport::BoxFuture;

/// Stores each entry as `<dir>/<hex(sha256(url))>`.
///
/// Writes land in a uniquely named temporary file in the same directory and
/// are then renamed over the target, so a concurrent reader sees either the
/// old entry or the new one, never a partial file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Opens (creating if needed) a storage rooted at `dir`.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    /// Returns the root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file that holds the entry for `url`.
    pub fn path_for(&self, url: &Url) -> PathBuf {
        let digest = Sha256::digest(cache_key(url).as_bytes());
        self.dir.join(hex::encode(digest))
    }
}

impl Storage for FileStorage {
    fn get<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Option<CachedResponse>, StorageError>> {
        Box::pin(async move {
            let path = self.path_for(url);
            let raw = match fs::read(&path).await {
                Ok(raw) => Bytes::from(raw),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(e.into()),
            };
            CachedResponse::decode(&raw).map(Some)
        })
    }

    fn put<'a>(&'a self, url: &'a Url, response: CachedResponse) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            let path = self.path_for(url);
            let tmp = path.with_extension(format!("tmp-{}", unique_suffix()));
            fs::write(&tmp, response.encode()).await?;
            if let Err(e) = fs::rename(&tmp, &path).await {
                let _ = fs::remove_file(&tmp).await;
                return Err(e.into());
            }
            debug!(url = %url, path = ?path, "cache entry written");
            Ok(())
        })
    }
}

fn unique_suffix() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    format!("{}-{}", std::process::id(), COUNTER.fetch_add(1, Ordering::Relaxed))
}

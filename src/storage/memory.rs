//! In-memory storage.

use std::collections::HashMap;

use bytes::Bytes;
use tokio::sync::RwLock;
use url::Url;

use super::{Storage, StorageError, cache_key};
use crate::cache::CachedResponse;
use crate::transport::BoxFuture;

/// Keeps encoded entries in a map guarded by an async `RwLock`.
///
/// Entries are stored in their encoded form, so every `get` hands out an
/// independent copy and a round-trip through this adapter exercises the same
/// framing as the on-disk one.
///
/// # Examples
///
/// ```
/// use etagcache::storage::{MemoryStorage, Storage};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let storage = MemoryStorage::new();
/// let url = "https://api.github.com/users/x".parse().unwrap();
/// assert!(storage.get(&url).await.unwrap().is_none());
/// assert_eq!(storage.len().await, 0);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryStorage {
    map: RwLock<HashMap<String, Bytes>>,
}

impl MemoryStorage {
    /// Returns a new, empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries.
    pub async fn len(&self) -> usize {
        self.map.read().await.len()
    }

    /// Returns `true` when nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.map.read().await.is_empty()
    }

    /// Returns the stored keys, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.map.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Inserts raw encoded bytes under `key`, bypassing encoding.
    pub async fn insert_raw(&self, key: impl Into<String>, raw: Bytes) {
        self.map.write().await.insert(key.into(), raw);
    }
}

impl Storage for MemoryStorage {
    fn get<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Option<CachedResponse>, StorageError>> {
        Box::pin(async move {
            let raw = self.map.read().await.get(cache_key(url)).cloned();
            raw.map(|raw| CachedResponse::decode(&raw)).transpose()
        })
    }

    fn put<'a>(&'a self, url: &'a Url, response: CachedResponse) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            let raw = response.encode();
            self.map.write().await.insert(cache_key(url).to_owned(), raw);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Headers, StatusCode};

    fn url(s: &str) -> Url {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn put_then_get() {
        let storage = MemoryStorage::new();
        let u = url("https://api.github.com/users/x");
        let headers: Headers = [("ETag", "\"v1\"")].into_iter().collect();
        storage
            .put(&u, CachedResponse::new(StatusCode::OK, headers, "one"))
            .await
            .unwrap();

        let hit = storage.get(&u).await.unwrap().unwrap();
        assert_eq!(hit.etag(), Some("\"v1\""));
        assert_eq!(&hit.body[..], b"one");
        assert_eq!(storage.keys().await, vec!["https://api.github.com/users/x"]);
    }

    #[tokio::test]
    async fn put_overwrites() {
        let storage = MemoryStorage::new();
        let u = url("https://api.github.com/users/x");
        for body in ["one", "two"] {
            storage
                .put(&u, CachedResponse::new(StatusCode::OK, Headers::new(), body))
                .await
                .unwrap();
        }
        assert_eq!(storage.len().await, 1);
        assert_eq!(&storage.get(&u).await.unwrap().unwrap().body[..], b"two");
    }

    #[tokio::test]
    async fn keys_distinguish_query_strings() {
        let storage = MemoryStorage::new();
        for u in ["https://h/a?page=1", "https://h/a?page=2"] {
            storage
                .put(&url(u), CachedResponse::new(StatusCode::OK, Headers::new(), ""))
                .await
                .unwrap();
        }
        assert_eq!(storage.len().await, 2);
    }

    #[tokio::test]
    async fn corrupt_entry_is_an_error() {
        let storage = MemoryStorage::new();
        let u = url("https://api.github.com/users/x");
        storage.insert_raw(u.as_str(), Bytes::from_static(b"garbage")).await;
        assert!(storage.get(&u).await.is_err());
    }
}

//! Storage backends for cached responses.
//!
//! The caching transport depends only on the two-operation [`Storage`]
//! contract. Shipped adapters:
//!
//! - [`MemoryStorage`] — process-local map, for tests and short-lived tools.
//! - [`FileStorage`] — one file per URL under a directory.
//!
//! Adapters must be safe for concurrent use; the transport does no locking of
//! its own and two concurrent misses for the same URL both write (last writer
//! wins).

use std::sync::Arc;

use thiserror::Error;
use url::Url;

use crate::cache::CachedResponse;
use crate::http::response::ResponseError;
use crate::transport::BoxFuture;

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Errors produced by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt cache entry: {0}")]
    Corrupt(#[from] ResponseError),

    #[error("truncated cache entry: expected {expected} body bytes, found {actual}")]
    Truncated { expected: u64, actual: u64 },

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// A key/value store of cached responses, keyed by request URL.
///
/// # Contract
///
/// - `get` returns `Ok(None)` for a miss. An `Err` aborts the exchange; it is
///   never treated as a miss.
/// - `put` overwrites any existing entry for the URL. It takes the entry by
///   value; the transport keeps its own copy for the caller.
pub trait Storage: Send + Sync {
    /// Looks up the entry stored for `url`.
    fn get<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Option<CachedResponse>, StorageError>>;

    /// Stores `response` as the entry for `url`.
    fn put<'a>(&'a self, url: &'a Url, response: CachedResponse) -> BoxFuture<'a, Result<(), StorageError>>;
}

impl<S: Storage + ?Sized> Storage for Arc<S> {
    fn get<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<Option<CachedResponse>, StorageError>> {
        (**self).get(url)
    }

    fn put<'a>(&'a self, url: &'a Url, response: CachedResponse) -> BoxFuture<'a, Result<(), StorageError>> {
        (**self).put(url, response)
    }
}

/// Returns the cache key for `url`: its canonical serialization.
pub fn cache_key(url: &Url) -> &str {
    url.as_str()
}

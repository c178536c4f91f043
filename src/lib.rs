//! # etagcache
//!
//! Transparent ETag revalidation for HTTP clients.
//!
//! [`CachingTransport`] sits in front of any [`Transport`]. Cacheable
//! requests (`GET`/`HEAD`, no `Range`, not an excluded path) are sent with
//! `If-None-Match` built from the stored response for their URL; a
//! `304 Not Modified` is answered with the stored body, and fresh `200`s with
//! an ETag are stored for next time.
//!
//! When the current request differs from the stored one in a header the
//! response varied on, the validator is recomputed from the stored body and
//! the current headers, so a `304` is still possible for identical content.
//! Credentials are never written to storage in the clear.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use etagcache::{CachingTransport, FileStorage, Request, TcpTransport, Transport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let storage = FileStorage::open("/tmp/etagcache").await?;
//!     let transport = CachingTransport::new(storage, TcpTransport::new());
//!
//!     let url = "http://127.0.0.1:8080/users/x".parse()?;
//!     let response = transport
//!         .round_trip(Request::get(url).header("Accept", "application/json"))
//!         .await?;
//!     println!("{} {:?}", response.status(), response.headers().get("x-cached-request-id"));
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod http;
pub mod storage;
pub mod transport;

pub use cache::CachedResponse;
pub use config::{CacheConfig, ConfigError};
pub use http::{Body, Headers, Method, Request, Response, StatusCode};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use transport::{
    BoxFuture, CachingTransport, LoggingTransport, TcpTransport, Transport, TransportError,
};

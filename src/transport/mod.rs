//! Transports: anything that turns a [`Request`] into a [`Response`].
//!
//! ## Core types
//!
//! - [`Transport`] — trait implemented by every layer, object-safe.
//! - [`CachingTransport`] — the conditional-request cache, wrapping a parent
//!   transport and a [`Storage`](crate::Storage).
//! - [`TcpTransport`] — minimal HTTP/1.1 client for plain `http://` URLs.
//! - [`LoggingTransport`] — one `tracing` line per exchange.
//!
//! Layers compose by ownership: each wraps the next one down.
//!
//! ```rust,no_run
//! use etagcache::{CachingTransport, LoggingTransport, MemoryStorage, TcpTransport};
//!
//! let transport = LoggingTransport::new(CachingTransport::new(
//!     MemoryStorage::new(),
//!     TcpTransport::new(),
//! ));
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use thiserror::Error;

use crate::http::Response;
use crate::http::request::Request;
use crate::http::response::ResponseError;
use crate::storage::StorageError;

pub mod caching;
pub mod logging;
pub mod tcp;

pub use caching::CachingTransport;
pub use logging::LoggingTransport;
pub use tcp::TcpTransport;

/// A pinned, boxed, `Send` future, as returned by [`Transport`] and
/// [`Storage`](crate::Storage) methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors produced while executing a request.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out connecting to {addr}")]
    ConnectTimeout { addr: String },

    #[error("unsupported URL {url}: {reason}")]
    UnsupportedUrl { url: String, reason: &'static str },

    #[error("malformed response: {0}")]
    MalformedResponse(#[from] ResponseError),

    #[error("response head exceeds {max_bytes} bytes")]
    HeadTooLarge { max_bytes: usize },

    #[error("response body exceeds {max_bytes} bytes")]
    BodyTooLarge { max_bytes: usize },

    /// Storage could not be read; the exchange is aborted rather than
    /// treated as a miss.
    #[error("cache lookup failed: {0}")]
    Lookup(#[source] StorageError),

    /// The parent transport failed after the request passed the cache gate.
    #[error("upstream request failed: {0}")]
    Upstream(#[source] Box<TransportError>),

    /// Draining or buffering a body failed.
    #[error("body I/O failed: {0}")]
    Body(#[source] std::io::Error),

    /// The upstream response was fine but storing it failed. The response is
    /// kept, fully buffered, so the caller can still use it.
    #[error("cache write failed: {source}")]
    CacheWrite {
        #[source]
        source: StorageError,
        response: Box<Response>,
    },

    /// An error from a user-supplied transport.
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl TransportError {
    /// Recovers the response carried by [`TransportError::CacheWrite`].
    ///
    /// Any other variant is handed back unchanged.
    pub fn into_response(self) -> Result<Response, Self> {
        match self {
            Self::CacheWrite { response, .. } => Ok(*response),
            other => Err(other),
        }
    }
}

/// The core trait for every layer that executes requests.
///
/// # Contract
///
/// - Implementations **must** be `Send + Sync`; one transport serves many
///   concurrent exchanges.
/// - `round_trip` returns a pinned, `Send` future. Dropping it cancels the
///   exchange, including any storage call in flight.
/// - No retries: a failed exchange is reported, retry policy belongs to the
///   caller.
pub trait Transport: Send + Sync {
    /// Executes `request` and returns the response.
    fn round_trip(&self, request: Request) -> BoxFuture<'_, Result<Response, TransportError>>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn round_trip(&self, request: Request) -> BoxFuture<'_, Result<Response, TransportError>> {
        (**self).round_trip(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn round_trip(&self, request: Request) -> BoxFuture<'_, Result<Response, TransportError>> {
        (**self).round_trip(request)
    }
}

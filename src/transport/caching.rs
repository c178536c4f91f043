//! The caching transport: gate → lookup → conditional request → forward →
//! splice or write back.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{BoxFuture, Transport, TransportError};
use crate::cache::vary::is_snapshot_header;
use crate::cache::{
    CachedResponse, add_conditional_headers, is_cacheable, normalize_user_agent,
    snapshot_variance,
};
use crate::config::{CacheConfig, ConfigError};
use crate::http::{Body, Method, Request, Response, StatusCode};
use crate::storage::Storage;

/// Adds transparent ETag revalidation in front of a parent transport.
///
/// For each cacheable request the stored response for its URL (if any) is
/// turned into an `If-None-Match` header. A `304 Not Modified` from upstream
/// is answered with the stored body; a fresh `200` with an ETag is stored
/// along with a snapshot of the request headers it varied on.
///
/// The transport holds no mutable state: concurrent exchanges are as safe as
/// the storage and parent they run against.
///
/// # Examples
///
/// ```rust,no_run
/// use etagcache::{CachingTransport, MemoryStorage, Request, TcpTransport, Transport};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = CachingTransport::new(MemoryStorage::new(), TcpTransport::new());
/// let url = "http://127.0.0.1:8080/users/x".parse()?;
/// let response = transport.round_trip(Request::get(url)).await?;
/// println!("{}", response.status());
/// # Ok(())
/// # }
/// ```
pub struct CachingTransport<S, T> {
    storage: S,
    parent: T,
    config: Arc<CacheConfig>,
}

impl<S, T> CachingTransport<S, T>
where
    S: Storage,
    T: Transport,
{
    /// Creates a caching transport with the default configuration.
    pub fn new(storage: S, parent: T) -> Self {
        Self {
            storage,
            parent,
            config: Arc::new(CacheConfig::default()),
        }
    }

    /// Creates a caching transport with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `config` fails validation after
    /// its header list is sorted.
    pub fn with_config(storage: S, parent: T, mut config: CacheConfig) -> Result<Self, ConfigError> {
        config.normalize();
        config.validate()?;
        Ok(Self {
            storage,
            parent,
            config: Arc::new(config),
        })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns the storage backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Returns the parent transport.
    pub fn parent(&self) -> &T {
        &self.parent
    }

    /// Runs one exchange.
    ///
    /// # Errors
    ///
    /// - [`TransportError::Lookup`] — storage could not be read.
    /// - [`TransportError::Upstream`] — the parent transport failed.
    /// - [`TransportError::Body`] — a body could not be drained or buffered.
    /// - [`TransportError::CacheWrite`] — storing failed; the response is
    ///   still recoverable with [`TransportError::into_response`].
    ///
    /// Requests that fail the cache gate are forwarded untouched, and the
    /// parent's result (error included) is returned verbatim.
    pub async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        if !is_cacheable(&request, &self.config) {
            debug!(method = %request.method(), url = %request.url(), "not cacheable, passing through");
            return self.parent.round_trip(request).await;
        }

        let cached = self
            .storage
            .get(request.url())
            .await
            .map_err(TransportError::Lookup)?;

        let mut prepared = request.clone();
        normalize_user_agent(prepared.headers_mut(), &self.config.user_agent_replacements);
        let source = add_conditional_headers(&self.config, &mut prepared, cached.as_ref());
        match source {
            Some(source) => debug!(url = %request.url(), ?source, "revalidating cached response"),
            None => debug!(url = %request.url(), "cache miss"),
        }

        let response = self
            .parent
            .round_trip(prepared)
            .await
            .map_err(|e| TransportError::Upstream(Box::new(e)))?;

        if let Some(cached) = cached {
            if response.status() == StatusCode::NOT_MODIFIED {
                return self.splice(&request, response, cached).await;
            }
            debug!(url = %request.url(), status = %response.status(), "cached response not reused");
        }

        if self.should_store(&request, &response) {
            return self.write_back(&request, response).await;
        }
        Ok(response)
    }

    fn should_store(&self, request: &Request, response: &Response) -> bool {
        response.status() == StatusCode::OK
            && *request.method() != Method::Head
            && response.headers().get("etag").is_some_and(|etag| !etag.is_empty())
    }

    /// Answers a `304` with the cached entry.
    ///
    /// The result keeps the upstream's headers; cached headers only fill in
    /// names the `304` lacks, and snapshot headers never leak.
    async fn splice(
        &self,
        request: &Request,
        mut response: Response,
        cached: CachedResponse,
    ) -> Result<Response, TransportError> {
        response
            .take_body()
            .drain()
            .await
            .map_err(TransportError::Body)?;

        let CachedResponse {
            status,
            reason,
            headers,
            body,
        } = cached;

        for name in headers.names() {
            if is_snapshot_header(&self.config, name) {
                continue;
            }
            if name.eq_ignore_ascii_case(&self.config.request_id_header) {
                let target = response.headers_mut();
                target.remove(&self.config.cached_request_id_header);
                for value in headers.get_all(name) {
                    target.insert(self.config.cached_request_id_header.as_str(), value);
                }
            }
            if !response.headers().contains(name) {
                for value in headers.get_all(name) {
                    response.headers_mut().insert(name, value);
                }
            }
        }

        let length = body.len() as u64;
        let body = if *request.method() == Method::Head {
            Body::empty()
        } else {
            Body::full(body)
        };
        response
            .headers_mut()
            .set("Content-Length", length.to_string());
        response.replace_payload(status, reason, body, Some(length));

        debug!(url = %request.url(), "served from cache");
        Ok(response)
    }

    /// Stores a fresh `200` and returns it with a fully buffered body.
    async fn write_back(
        &self,
        request: &Request,
        mut response: Response,
    ) -> Result<Response, TransportError> {
        let body = response.buffer().await.map_err(TransportError::Body)?;

        let mut headers = response.headers().clone();
        snapshot_variance(&self.config, request.headers(), &mut headers);
        let entry = CachedResponse {
            status: response.status(),
            reason: response.reason_phrase().map(str::to_owned),
            headers,
            body,
        };

        if let Err(source) = self.storage.put(request.url(), entry).await {
            warn!(url = %request.url(), error = %source, "cache write failed");
            return Err(TransportError::CacheWrite {
                source,
                response: Box::new(response),
            });
        }
        debug!(url = %request.url(), "response cached");
        Ok(response)
    }
}

impl<S, T> Transport for CachingTransport<S, T>
where
    S: Storage,
    T: Transport,
{
    fn round_trip(&self, request: Request) -> BoxFuture<'_, Result<Response, TransportError>> {
        Box::pin(self.execute(request))
    }
}

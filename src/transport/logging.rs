//! Exchange logging layer.

use tokio::time::Instant;

use super::{BoxFuture, Transport, TransportError};
use crate::config::CacheConfig;
use crate::http::{Request, Response};

/// Wraps a transport and logs each exchange's method, URL, status, and
/// duration.
///
/// Emits a single `tracing::info!` record after the inner transport returns,
/// or a `tracing::warn!` record when it fails. Responses carrying the
/// cached-request-id header are flagged `cached = true`, so placing this
/// layer above a [`CachingTransport`](super::CachingTransport) shows which
/// exchanges were answered from storage.
///
/// # Examples
///
/// ```rust,no_run
/// use etagcache::{LoggingTransport, TcpTransport};
///
/// let transport = LoggingTransport::new(TcpTransport::new());
/// ```
#[derive(Debug, Clone)]
pub struct LoggingTransport<T> {
    inner: T,
    cached_marker: String,
}

impl<T: Transport> LoggingTransport<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            cached_marker: CacheConfig::default().cached_request_id_header,
        }
    }

    /// Uses `header` instead of the default to recognize cache hits.
    #[must_use]
    pub fn cached_marker(mut self, header: impl Into<String>) -> Self {
        self.cached_marker = header.into();
        self
    }

    /// Returns the wrapped transport.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    async fn log(&self, request: Request) -> Result<Response, TransportError> {
        let start = Instant::now();
        let method = request.method().as_str().to_owned();
        let url = request.url().to_string();

        let result = self.inner.round_trip(request).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(response) => tracing::info!(
                %method,
                %url,
                status = response.status().as_u16(),
                cached = response.headers().contains(&self.cached_marker),
                ?elapsed,
                "exchange completed"
            ),
            Err(e) => tracing::warn!(%method, %url, error = %e, ?elapsed, "exchange failed"),
        }
        result
    }
}

impl<T: Transport> Transport for LoggingTransport<T> {
    fn round_trip(&self, request: Request) -> BoxFuture<'_, Result<Response, TransportError>> {
        Box::pin(self.log(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::StatusCode;

    struct Fixed(fn() -> Result<Response, TransportError>);

    impl Transport for Fixed {
        fn round_trip(&self, _request: Request) -> BoxFuture<'_, Result<Response, TransportError>> {
            let result = (self.0)();
            Box::pin(async move { result })
        }
    }

    fn request() -> Request {
        Request::get("http://localhost/users/x".parse().unwrap())
    }

    #[tokio::test]
    async fn passes_response_through() {
        let transport = LoggingTransport::new(Fixed(|| {
            Ok(Response::new(StatusCode::OK)
                .header("X-Cached-Request-Id", "r1")
                .body("hi"))
        }));
        let resp = transport.round_trip(request()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.bytes().await.unwrap(), "hi");
    }

    #[tokio::test]
    async fn passes_error_through() {
        let transport = LoggingTransport::new(Fixed(|| {
            Err(TransportError::ConnectTimeout {
                addr: "localhost:80".into(),
            })
        }))
        .cached_marker("X-From-Cache");
        let err = transport.round_trip(request()).await.unwrap_err();
        assert!(matches!(err, TransportError::ConnectTimeout { .. }));
    }
}

//! HTTP responses as returned by a transport, plus HTTP/1.1 response-head
//! parsing using the [`httparse`] crate.

use std::io;

use bytes::Bytes;
use thiserror::Error;

use super::{Body, Headers, StatusCode};

/// Errors that can occur while parsing an HTTP/1.1 response head.
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("response is incomplete, more data needed")]
    Incomplete,

    #[error("HTTP parse error: {0}")]
    Parse(#[from] httparse::Error),

    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid status code {0}")]
    InvalidStatus(u16),

    #[error("invalid Content-Length header: {0:?}")]
    InvalidContentLength(String),

    #[error("invalid chunked transfer encoding")]
    InvalidChunk,
}

/// A parsed response status line and header block.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub reason: Option<String>,
    pub headers: Headers,
    /// Byte offset at which the body begins (just past `\r\n\r\n`).
    pub body_offset: usize,
}

impl ResponseHead {
    /// Maximum number of headers we support per response.
    const MAX_HEADERS: usize = 128;

    /// Parses a response head from the start of `buf`.
    ///
    /// # Errors
    ///
    /// - [`ResponseError::Incomplete`] — more data is needed to complete the head.
    /// - [`ResponseError::Parse`] — the data is malformed.
    /// - [`ResponseError::InvalidStatus`] — the status code is out of range.
    pub fn parse(buf: &[u8]) -> Result<Self, ResponseError> {
        let mut headers = [httparse::EMPTY_HEADER; Self::MAX_HEADERS];
        let mut raw = httparse::Response::new(&mut headers);

        let body_offset = match raw.parse(buf)? {
            httparse::Status::Complete(offset) => offset,
            httparse::Status::Partial => return Err(ResponseError::Incomplete),
        };

        let code = raw
            .code
            .ok_or(ResponseError::MissingField { field: "status" })?;
        let status = StatusCode::from_u16(code).ok_or(ResponseError::InvalidStatus(code))?;
        let reason = raw.reason.filter(|r| !r.is_empty()).map(str::to_owned);

        let mut header_map = Headers::with_capacity(raw.headers.len());
        for header in raw.headers.iter() {
            if let Ok(value) = std::str::from_utf8(header.value) {
                header_map.insert(header.name, value);
            }
        }

        Ok(Self {
            status,
            reason,
            headers: header_map,
            body_offset,
        })
    }

    /// Returns the `Content-Length` header parsed as a `u64`, if present.
    pub fn content_length(&self) -> Result<Option<u64>, ResponseError> {
        match self.headers.get("content-length") {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| ResponseError::InvalidContentLength(raw.to_owned())),
        }
    }
}

/// An HTTP response as seen by the caller of a transport.
///
/// # Examples
///
/// ```
/// use etagcache::http::{Response, StatusCode};
///
/// let response = Response::new(StatusCode::OK)
///     .header("ETag", r#""deadbeef""#)
///     .body(r#"{"login":"x"}"#);
///
/// assert_eq!(response.status(), StatusCode::OK);
/// assert_eq!(response.content_length(), Some(13));
/// assert_eq!(response.headers().get("etag"), Some(r#""deadbeef""#));
/// ```
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    reason: Option<String>,
    headers: Headers,
    body: Body,
    content_length: Option<u64>,
}

impl Response {
    /// Creates a new response with the given status and an empty body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            reason: None,
            headers: Headers::new(),
            body: Body::empty(),
            content_length: Some(0),
        }
    }

    /// Builds a response from a parsed head and a body.
    pub fn from_parts(head: ResponseHead, body: Body, content_length: Option<u64>) -> Self {
        Self {
            status: head.status,
            reason: head.reason,
            headers: head.headers,
            body,
            content_length,
        }
    }

    /// Appends a response header. Multiple calls with the same name are additive.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets a buffered body and its length.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        self.content_length = Some(body.len() as u64);
        self.body = Body::full(body);
        self
    }

    /// Sets a streaming body with an optional known length.
    #[must_use]
    pub fn streaming_body(mut self, body: Body, content_length: Option<u64>) -> Self {
        self.body = body;
        self.content_length = content_length;
        self
    }

    /// Overrides the reason phrase.
    #[must_use]
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Returns the status code of this response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the status text: the reason phrase received on the wire, or the
    /// canonical one.
    pub fn status_text(&self) -> &str {
        self.reason
            .as_deref()
            .unwrap_or_else(|| self.status.canonical_reason())
    }

    /// Returns the reason phrase received on the wire, if any.
    pub fn reason_phrase(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Returns the response headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the response headers for in-place modification.
    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Returns the body length, when known.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Returns a reference to the body.
    pub fn body_ref(&self) -> &Body {
        &self.body
    }

    /// Takes the body out, leaving an empty one behind.
    pub fn take_body(&mut self) -> Body {
        std::mem::take(&mut self.body)
    }

    /// Replaces status, reason, body, and length in one step.
    pub(crate) fn replace_payload(
        &mut self,
        status: StatusCode,
        reason: Option<String>,
        body: Body,
        content_length: Option<u64>,
    ) {
        self.status = status;
        self.reason = reason;
        self.body = body;
        self.content_length = content_length;
    }

    /// Materializes the body in memory and returns a handle to it.
    ///
    /// The body is replaced by its buffered bytes, so later readers still see
    /// the full content from the start, and the length is corrected.
    pub async fn buffer(&mut self) -> io::Result<Bytes> {
        let bytes = self.take_body().collect_with_hint(self.content_length).await?;
        self.body = Body::full(bytes.clone());
        self.content_length = Some(bytes.len() as u64);
        Ok(bytes)
    }

    /// Consumes the response and returns its full body.
    pub async fn bytes(self) -> io::Result<Bytes> {
        self.body.collect_with_hint(self.content_length).await
    }

    /// Consumes the response and deserializes its body as JSON.
    pub async fn json<T>(self) -> io::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let bytes = self.bytes().await?;
        serde_json::from_slice(&bytes).map_err(io::Error::from)
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new(StatusCode::OK)
    }
}

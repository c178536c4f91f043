//! The stored form of a cached response.

use bytes::{BufMut, Bytes, BytesMut};

use crate::http::response::{ResponseError, ResponseHead};
use crate::http::{Body, Headers, Response, StatusCode};
use crate::storage::StorageError;

/// A fully buffered response as held by a [`Storage`](crate::Storage).
///
/// The body is [`Bytes`], so an entry can be hashed and then handed to the
/// caller without any stream being read twice. `headers` include the
/// synthetic variance-snapshot entries; they are stripped before anything is
/// returned to a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub status: StatusCode,
    pub reason: Option<String>,
    pub headers: Headers,
    pub body: Bytes,
}

impl CachedResponse {
    /// Creates an entry with the canonical reason phrase.
    pub fn new(status: StatusCode, headers: Headers, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            reason: None,
            headers,
            body: body.into(),
        }
    }

    /// Returns the stored upstream validator, if any.
    pub fn etag(&self) -> Option<&str> {
        self.headers.get("etag")
    }

    /// Returns the body length.
    pub fn content_length(&self) -> u64 {
        self.body.len() as u64
    }

    /// Converts into a caller-facing response with a buffered body.
    pub fn into_response(self) -> Response {
        let mut response = Response::new(self.status);
        *response.headers_mut() = self.headers;
        let length = Some(self.body.len() as u64);
        response.replace_payload(self.status, self.reason, Body::full(self.body), length);
        response
    }

    /// Serializes the entry in HTTP/1.1 response framing.
    ///
    /// Any stored `Content-Length` is dropped and rewritten from the body so
    /// that decoding always reads exactly the stored bytes.
    pub fn encode(&self) -> Bytes {
        let reason = self
            .reason
            .as_deref()
            .unwrap_or_else(|| self.status.canonical_reason());

        let estimated_size = 128 + self.headers.len() * 64 + self.body.len();
        let mut buf = BytesMut::with_capacity(estimated_size);

        buf.put(format!("HTTP/1.1 {} {}\r\n", self.status.as_u16(), reason).as_bytes());
        for (name, value) in self.headers.iter() {
            if name.eq_ignore_ascii_case("content-length")
                || name.eq_ignore_ascii_case("transfer-encoding")
            {
                continue;
            }
            buf.put(format!("{name}: {value}\r\n").as_bytes());
        }
        buf.put(format!("Content-Length: {}\r\n", self.body.len()).as_bytes());
        buf.put(&b"\r\n"[..]);
        buf.put(self.body.as_ref());
        buf.freeze()
    }

    /// Parses an entry written by [`encode`](Self::encode).
    ///
    /// # Errors
    ///
    /// - [`StorageError::Corrupt`] — the framing is malformed.
    /// - [`StorageError::Truncated`] — the body is shorter than its declared
    ///   length.
    pub fn decode(raw: &Bytes) -> Result<Self, StorageError> {
        let head = ResponseHead::parse(raw)?;
        let length = head
            .content_length()?
            .ok_or(ResponseError::MissingField {
                field: "Content-Length",
            })?;
        let available = (raw.len() - head.body_offset) as u64;
        if available < length {
            return Err(StorageError::Truncated {
                expected: length,
                actual: available,
            });
        }
        let end = head.body_offset + length as usize;
        let body = raw.slice(head.body_offset..end);

        let mut headers = head.headers;
        headers.remove("content-length");
        headers.insert("Content-Length", length.to_string());

        Ok(Self {
            status: head.status,
            reason: head.reason,
            headers,
            body,
        })
    }
}

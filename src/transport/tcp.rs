//! Minimal HTTP/1.1 client transport over Tokio TCP streams.
//!
//! One connection per exchange (`Connection: close`). Bodies with a known
//! `Content-Length` are streamed straight off the socket and must deliver
//! every declared byte; chunked and close-delimited bodies are read to EOF
//! first, up to a size limit.

use std::io::Cursor;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use super::{BoxFuture, Transport, TransportError};
use crate::http::response::{ResponseError, ResponseHead};
use crate::http::{Body, Method, Request, Response};

/// Default limit on the size of a response head (64 KiB).
const DEFAULT_MAX_HEAD_SIZE: usize = 64 * 1024;

/// Default limit on a chunked or close-delimited body (64 MiB).
const DEFAULT_MAX_BODY_SIZE: usize = 64 * 1024 * 1024;

/// Default connect timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Initial read buffer capacity per connection.
const INITIAL_BUF_SIZE: usize = 4096;

/// Plain-`http` HTTP/1.1 client.
///
/// TLS is not supported; `https://` URLs fail with
/// [`TransportError::UnsupportedUrl`]. Put a TLS-capable [`Transport`] under
/// the cache for those.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    connect_timeout: Duration,
    max_head_size: usize,
    max_body_size: usize,
}

impl TcpTransport {
    pub fn new() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_head_size: DEFAULT_MAX_HEAD_SIZE,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Sets the connect timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the largest response head accepted before giving up.
    #[must_use]
    pub fn max_head_size(mut self, bytes: usize) -> Self {
        self.max_head_size = bytes;
        self
    }

    /// Sets the largest body read to EOF (chunked or without
    /// `Content-Length`) before giving up.
    #[must_use]
    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    /// Sends `request` on a fresh connection and reads the response head.
    ///
    /// # Errors
    ///
    /// - [`TransportError::UnsupportedUrl`] — not an `http` URL, or no host.
    /// - [`TransportError::Connect`] / [`TransportError::ConnectTimeout`] — the
    ///   peer could not be reached.
    /// - [`TransportError::HeadTooLarge`] / [`TransportError::BodyTooLarge`] —
    ///   the head or a body read to EOF exceeded its limit.
    /// - [`TransportError::MalformedResponse`] — the head or a chunked body
    ///   could not be parsed.
    pub async fn send(&self, request: Request) -> Result<Response, TransportError> {
        let addr = target_addr(&request)?;

        let mut stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| TransportError::ConnectTimeout { addr: addr.clone() })?
            .map_err(|source| TransportError::Connect {
                addr: addr.clone(),
                source,
            })?;

        debug!(addr = %addr, method = %request.method(), url = %request.url(), "sending request");
        stream.write_all(&request.to_http1_bytes()).await?;
        stream.flush().await?;

        let mut buf = BytesMut::with_capacity(INITIAL_BUF_SIZE);
        let head = loop {
            match ResponseHead::parse(&buf) {
                Ok(head) => break head,
                Err(ResponseError::Incomplete) => {}
                Err(e) => return Err(e.into()),
            }
            if buf.len() > self.max_head_size {
                return Err(TransportError::HeadTooLarge {
                    max_bytes: self.max_head_size,
                });
            }
            if stream.read_buf(&mut buf).await? == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "connection closed before response head completed",
                )
                .into());
            }
        };

        if head.body_offset > self.max_head_size {
            return Err(TransportError::HeadTooLarge {
                max_bytes: self.max_head_size,
            });
        }

        let rest = buf.split_off(head.body_offset).freeze();
        debug!(status = %head.status, "response head received");

        if !has_body(request.method(), &head) {
            return Ok(Response::from_parts(head, Body::empty(), Some(0)));
        }

        if is_chunked(&head) {
            let raw = self.read_to_eof(&mut stream, &rest).await?;
            let body = decode_chunked(&raw)?;
            let len = body.len() as u64;
            return Ok(Response::from_parts(head, Body::full(body), Some(len)));
        }

        match head.content_length()? {
            Some(len) => {
                let body = Body::from_reader_exact(Cursor::new(rest).chain(stream), len);
                Ok(Response::from_parts(head, body, Some(len)))
            }
            None => {
                let raw = self.read_to_eof(&mut stream, &rest).await?;
                let len = raw.len() as u64;
                Ok(Response::from_parts(head, Body::full(raw.freeze()), Some(len)))
            }
        }
    }
}

impl TcpTransport {
    /// Reads until the peer closes, starting from the bytes already received.
    async fn read_to_eof(&self, stream: &mut TcpStream, received: &[u8]) -> Result<BytesMut, TransportError> {
        let mut raw = BytesMut::from(received);
        loop {
            if raw.len() > self.max_body_size {
                return Err(TransportError::BodyTooLarge {
                    max_bytes: self.max_body_size,
                });
            }
            if stream.read_buf(&mut raw).await? == 0 {
                return Ok(raw);
            }
        }
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for TcpTransport {
    fn round_trip(&self, request: Request) -> BoxFuture<'_, Result<Response, TransportError>> {
        Box::pin(self.send(request))
    }
}

fn target_addr(request: &Request) -> Result<String, TransportError> {
    let url = request.url();
    if url.scheme() != "http" {
        return Err(TransportError::UnsupportedUrl {
            url: url.to_string(),
            reason: "only http:// is supported",
        });
    }
    let host = url.host_str().ok_or_else(|| TransportError::UnsupportedUrl {
        url: url.to_string(),
        reason: "missing host",
    })?;
    let port = url.port_or_known_default().unwrap_or(80);
    Ok(format!("{host}:{port}"))
}

fn has_body(method: &Method, head: &ResponseHead) -> bool {
    let code = head.status.as_u16();
    *method != Method::Head && !(100..200).contains(&code) && code != 204 && code != 304
}

fn is_chunked(head: &ResponseHead) -> bool {
    head.headers
        .get_all("transfer-encoding")
        .flat_map(|v| v.split(','))
        .any(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
}

/// Decodes a complete `Transfer-Encoding: chunked` payload. Trailers are
/// ignored.
fn decode_chunked(raw: &[u8]) -> Result<Bytes, ResponseError> {
    let mut out = BytesMut::with_capacity(raw.len());
    let mut pos = 0;
    loop {
        let (consumed, size) = match httparse::parse_chunk_size(&raw[pos..]) {
            Ok(httparse::Status::Complete(pair)) => pair,
            Ok(httparse::Status::Partial) => return Err(ResponseError::Incomplete),
            Err(_) => return Err(ResponseError::InvalidChunk),
        };
        pos += consumed;
        if size == 0 {
            return Ok(out.freeze());
        }
        let size = usize::try_from(size).map_err(|_| ResponseError::InvalidChunk)?;
        let end = pos.checked_add(size).ok_or(ResponseError::InvalidChunk)?;
        let next = end.checked_add(2).ok_or(ResponseError::InvalidChunk)?;
        if raw.len() < next {
            return Err(ResponseError::Incomplete);
        }
        if &raw[end..next] != b"\r\n" {
            return Err(ResponseError::InvalidChunk);
        }
        out.extend_from_slice(&raw[pos..end]);
        pos = next;
    }
}

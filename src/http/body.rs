//! Response bodies: either fully buffered bytes or a live byte stream.

use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

/// A response body.
///
/// Bodies coming off a live connection are streams that can be read exactly
/// once. Anything the cache needs to read twice (digest input, then the
/// caller) is materialized first with [`Body::collect`].
///
/// # Examples
///
/// ```
/// use etagcache::http::Body;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> std::io::Result<()> {
/// let body = Body::from_reader(std::io::Cursor::new(b"hello".to_vec()));
/// assert!(!body.is_buffered());
/// let bytes = body.collect().await?;
/// assert_eq!(&bytes[..], b"hello");
/// # Ok(())
/// # }
/// ```
pub struct Body {
    kind: Kind,
}

enum Kind {
    Full(Bytes),
    Stream(Pin<Box<dyn AsyncRead + Send + Sync>>),
}

impl Body {
    /// An empty, buffered body.
    pub fn empty() -> Self {
        Self::full(Bytes::new())
    }

    /// A buffered body.
    pub fn full(bytes: impl Into<Bytes>) -> Self {
        Self {
            kind: Kind::Full(bytes.into()),
        }
    }

    /// A streaming body read from `reader` on demand.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Sync + 'static,
    {
        Self {
            kind: Kind::Stream(Box::pin(reader)),
        }
    }

    /// A streaming body that must yield exactly `length` bytes.
    ///
    /// `reader` is read at most `length` bytes deep. If it reaches EOF
    /// early, reading fails with [`io::ErrorKind::UnexpectedEof`] instead of
    /// ending quietly, so a peer that hangs up mid-body never produces a
    /// short body that looks complete.
    pub fn from_reader_exact<R>(reader: R, length: u64) -> Self
    where
        R: AsyncRead + Send + Sync + Unpin + 'static,
    {
        Self::from_reader(Exact {
            inner: reader.take(length),
            remaining: length,
        })
    }

    /// Returns `true` if the body is already in memory.
    pub fn is_buffered(&self) -> bool {
        matches!(self.kind, Kind::Full(_))
    }

    /// Reads the whole body into memory.
    ///
    /// `size_hint` pre-sizes the buffer for streams with a known length.
    pub async fn collect_with_hint(self, size_hint: Option<u64>) -> io::Result<Bytes> {
        match self.kind {
            Kind::Full(bytes) => Ok(bytes),
            Kind::Stream(mut reader) => {
                let capacity = size_hint
                    .and_then(|n| usize::try_from(n).ok())
                    .unwrap_or(0);
                let mut buf = Vec::with_capacity(capacity);
                reader.read_to_end(&mut buf).await?;
                Ok(Bytes::from(buf))
            }
        }
    }

    /// Reads the whole body into memory.
    pub async fn collect(self) -> io::Result<Bytes> {
        self.collect_with_hint(None).await
    }

    /// Reads the body to EOF and discards it.
    ///
    /// A stream must be drained before being dropped for the underlying
    /// connection to be reusable.
    pub async fn drain(self) -> io::Result<()> {
        if let Kind::Stream(mut reader) = self.kind {
            tokio::io::copy(&mut reader, &mut tokio::io::sink()).await?;
        }
        Ok(())
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::full(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::full(bytes)
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Self::full(Bytes::from_static(s.as_bytes()))
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Self::full(s.into_bytes())
    }
}

/// Reader that treats EOF before `remaining` reaches zero as an error.
struct Exact<R> {
    inner: tokio::io::Take<R>,
    remaining: u64,
}

impl<R: AsyncRead + Unpin> AsyncRead for Exact<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.remaining == 0 || buf.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }
        let before = buf.filled().len();
        ready!(Pin::new(&mut self.inner).poll_read(cx, buf))?;
        let read = (buf.filled().len() - before) as u64;
        if read == 0 {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("body ended {} bytes short of its declared length", self.remaining),
            )));
        }
        self.remaining -= read;
        Poll::Ready(Ok(()))
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Full(bytes) => f.debug_tuple("Body::Full").field(&bytes.len()).finish(),
            Kind::Stream(_) => f.write_str("Body::Stream"),
        }
    }
}

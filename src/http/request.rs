//! Outgoing HTTP requests.

use bytes::{BufMut, Bytes, BytesMut};
use url::Url;

use super::{Headers, Method};

/// An outgoing HTTP request.
///
/// Requests are cheap to clone: the body is reference-counted [`Bytes`]. The
/// caching transport clones the caller's request before decorating it, so the
/// caller's value is never observed in a modified state.
///
/// # Examples
///
/// ```
/// use etagcache::http::{Method, Request};
///
/// let url = "https://api.github.com/users/octocat".parse().unwrap();
/// let request = Request::new(Method::Get, url)
///     .header("Accept", "application/vnd.github+json")
///     .header("Authorization", "Bearer s3cr3t");
///
/// assert_eq!(request.url().path(), "/users/octocat");
/// assert_eq!(request.headers().get("accept"), Some("application/vnd.github+json"));
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: Headers,
    body: Bytes,
}

impl Request {
    /// Creates a request with no headers and an empty body.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    /// Shorthand for a `GET` request.
    pub fn get(url: Url) -> Self {
        Self::new(Method::Get, url)
    }

    /// Appends a request header. Multiple calls with the same name are additive.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the target URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the request headers for in-place modification.
    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Serializes the request head and body in HTTP/1.1 origin-form.
    ///
    /// Adds `Host` when absent, always writes `Connection: close`, and writes
    /// `Content-Length` for non-empty bodies.
    pub fn to_http1_bytes(&self) -> BytesMut {
        let target = match self.url.query() {
            Some(q) => format!("{}?{}", self.url.path(), q),
            None => self.url.path().to_owned(),
        };

        let mut buf = BytesMut::with_capacity(128 + self.headers.len() * 64 + self.body.len());
        buf.put(format!("{} {} HTTP/1.1\r\n", self.method, target).as_bytes());

        if !self.headers.contains("host") {
            let host = self.url.host_str().unwrap_or_default();
            match self.url.port() {
                Some(port) => buf.put(format!("Host: {host}:{port}\r\n").as_bytes()),
                None => buf.put(format!("Host: {host}\r\n").as_bytes()),
            }
        }
        for (name, value) in self.headers.iter() {
            if name.eq_ignore_ascii_case("connection") || name.eq_ignore_ascii_case("content-length") {
                continue;
            }
            buf.put(format!("{name}: {value}\r\n").as_bytes());
        }
        buf.put(&b"Connection: close\r\n"[..]);
        if !self.body.is_empty() {
            buf.put(format!("Content-Length: {}\r\n", self.body.len()).as_bytes());
        }
        buf.put(&b"\r\n"[..]);
        buf.put(self.body.as_ref());
        buf
    }
}

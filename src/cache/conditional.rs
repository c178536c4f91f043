//! Conditional request builder.

use crate::config::CacheConfig;
use crate::http::Request;

use super::entry::CachedResponse;
use super::validator::speculative_etag;
use super::vary::{parse_vary, variances_match};

/// Where the `If-None-Match` value attached to a request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatorSource {
    /// The cached response's own ETag; the variance snapshot matched.
    Stored,
    /// A digest of the cached body under the current request's headers.
    Speculative,
}

/// Attaches `If-None-Match` to `request` when a cached candidate exists.
///
/// With a matching variance snapshot the stored ETag is reused directly.
/// Otherwise the validator is recomputed from the cached body and the
/// current request's headers, restricted to the cached response's `Vary`
/// names: if the upstream would produce identical bytes for this request,
/// the digest equals its real ETag and the upstream answers `304`.
///
/// Returns `None` (and leaves `request` untouched) without a candidate.
pub fn add_conditional_headers(
    config: &CacheConfig,
    request: &mut Request,
    cached: Option<&CachedResponse>,
) -> Option<ValidatorSource> {
    let cached = cached?;

    if variances_match(config, request.headers(), cached) {
        if let Some(etag) = cached.etag() {
            request.headers_mut().set("If-None-Match", etag);
            return Some(ValidatorSource::Stored);
        }
    }

    let vary = parse_vary(&cached.headers);
    let etag = speculative_etag(config, request.headers(), Some(&vary), &cached.body);
    request.headers_mut().set("If-None-Match", etag);
    Some(ValidatorSource::Speculative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Headers, StatusCode};

    fn request(headers: &[(&str, &str)]) -> Request {
        let mut req = Request::get("https://api.github.com/users/x".parse().unwrap());
        for (k, v) in headers {
            req.headers_mut().insert(*k, *v);
        }
        req
    }

    fn cached(headers: &[(&str, &str)], body: &'static str) -> CachedResponse {
        let headers: Headers = headers.iter().copied().collect();
        CachedResponse::new(StatusCode::OK, headers, body)
    }

    #[test]
    fn no_candidate() {
        let mut req = request(&[]);
        assert_eq!(add_conditional_headers(&CacheConfig::default(), &mut req, None), None);
        assert!(!req.headers().contains("if-none-match"));
    }

    #[test]
    fn matching_snapshot_reuses_etag() {
        let mut req = request(&[("Accept", "application/json")]);
        let entry = cached(
            &[
                ("ETag", "\"deadbeef\""),
                ("X-Varied-Accept", "application/json"),
                ("Vary", "Accept"),
            ],
            "hello world",
        );
        let source = add_conditional_headers(&CacheConfig::default(), &mut req, Some(&entry));
        assert_eq!(source, Some(ValidatorSource::Stored));
        assert_eq!(req.headers().get("if-none-match"), Some("\"deadbeef\""));
    }

    #[test]
    fn different_credential_computes_digest() {
        let mut req = request(&[("Accept", "application/json"), ("Authorization", "Bearer hunter1")]);
        let entry = cached(
            &[
                ("ETag", "deadbeef"),
                ("X-Varied-Accept", "application/json"),
                ("X-Varied-Authorization", "Bearer hunter2"),
                ("Vary", "Authorization"),
            ],
            "hello world",
        );
        let source = add_conditional_headers(&CacheConfig::default(), &mut req, Some(&entry));
        assert_eq!(source, Some(ValidatorSource::Speculative));
        assert_eq!(
            req.headers().get("if-none-match"),
            Some("\"ffe6e54ebaaaff92f2feaa4bf3a5fda8ff1d49a6a4f492101039cd7c091b7523\"")
        );
        assert_eq!(&entry.body[..], b"hello world");
    }

    #[test]
    fn replaces_caller_supplied_validator() {
        let mut req = request(&[("If-None-Match", "\"stale\"")]);
        let entry = cached(&[("ETag", "\"fresh\"")], "");
        add_conditional_headers(&CacheConfig::default(), &mut req, Some(&entry));
        assert_eq!(req.headers().get_all("if-none-match").collect::<Vec<_>>(), vec!["\"fresh\""]);
    }
}

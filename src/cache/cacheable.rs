//! Cacheability gate.

use crate::config::CacheConfig;
use crate::http::{Method, Request};

/// Returns `true` if `request` is worth looking up in storage.
///
/// Only `GET` and `HEAD` qualify, byte-range requests never do, and neither
/// do paths on [`CacheConfig::excluded_paths`] (the rate-limit endpoint
/// changes on every call while keeping a stable shape).
pub fn is_cacheable(request: &Request, config: &CacheConfig) -> bool {
    if !matches!(request.method(), Method::Get | Method::Head) {
        return false;
    }
    if request.headers().get("range").is_some_and(|r| !r.is_empty()) {
        return false;
    }
    let path = request.url().path();
    !config.excluded_paths.iter().any(|p| p == path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: Method, url: &str) -> Request {
        Request::new(method, url.parse().unwrap())
    }

    #[test]
    fn gate() {
        let config = CacheConfig::default();
        let cases = [
            (request(Method::Get, "https://api.github.com/users/x"), true),
            (request(Method::Head, "https://api.github.com/users/x"), true),
            (request(Method::Post, "https://api.github.com/users/x"), false),
            (request(Method::Options, "https://api.github.com/users/x"), false),
            (
                request(Method::Get, "https://api.github.com/users/x").header("Range", "bytes=0-1023"),
                false,
            ),
            (request(Method::Get, "https://api.github.com/rate_limit"), false),
            (request(Method::Get, "https://ghe.example.com/api/v3/rate_limit"), false),
            (request(Method::Get, "https://api.github.com/rate_limit/extra"), true),
        ];
        for (req, expected) in cases {
            assert_eq!(
                is_cacheable(&req, &config),
                expected,
                "{} {}",
                req.method(),
                req.url()
            );
        }
    }

    #[test]
    fn excluded_paths_come_from_config() {
        let config = CacheConfig {
            excluded_paths: vec!["/meta".into()],
            ..CacheConfig::default()
        };
        assert!(!is_cacheable(&request(Method::Get, "https://api.github.com/meta"), &config));
        assert!(is_cacheable(&request(Method::Get, "https://api.github.com/rate_limit"), &config));
    }
}

//! Variance tracking.
//!
//! A cached response records, as synthetic `X-Varied-<Name>` headers, the
//! request header values that were in effect when it was stored, one set per
//! name listed in its `Vary` header. A later request whose values all match
//! can reuse the stored ETag as-is.

use crate::config::CacheConfig;
use crate::http::Headers;

use super::entry::CachedResponse;
use super::validator::hash_token;

/// Returns the names listed across every `Vary` header, in order.
///
/// Values are split on commas and whitespace; a name seen twice (in any
/// letter case) is yielded only the first time.
pub fn parse_vary(headers: &Headers) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for value in headers.get_all("vary") {
        for field in value
            .split(|c: char| matches!(c, ',' | ' ' | '\t' | '\n' | '\r'))
            .filter(|f| !f.is_empty())
        {
            if !names.iter().any(|n| n.eq_ignore_ascii_case(field)) {
                names.push(field.to_owned());
            }
        }
    }
    names
}

/// Returns `true` if every dimension `cached` declares in `Vary` has the same
/// value in `request_headers` as in its snapshot.
///
/// The credential header is compared by fingerprint. Other headers compare
/// their first values, an absent header counting as the empty string. An
/// empty `Vary` matches trivially; `Vary: *` never matches.
pub fn variances_match(config: &CacheConfig, request_headers: &Headers, cached: &CachedResponse) -> bool {
    parse_vary(&cached.headers).iter().all(|name| {
        if name == "*" {
            return false;
        }
        let stored = cached
            .headers
            .get(&snapshot_name(config, name))
            .unwrap_or_default();
        let current = request_headers.get(name).unwrap_or_default();
        if name.eq_ignore_ascii_case(&config.credential_header) {
            hash_token(current) == stored
        } else {
            current == stored
        }
    })
}

/// Records the variance snapshot for a response about to be stored.
///
/// For every name in `target`'s own `Vary` header, the request's values are
/// appended to `target` under the snapshot prefix. The credential header is
/// always recorded, as the fingerprint of its first value (the empty secret
/// when absent); other headers are recorded only when present.
pub fn snapshot_variance(config: &CacheConfig, request_headers: &Headers, target: &mut Headers) {
    for name in parse_vary(target) {
        if name == "*" {
            continue;
        }
        let key = snapshot_name(config, &name);
        target.remove(&key);
        if name.eq_ignore_ascii_case(&config.credential_header) {
            let current = request_headers.get(&name).unwrap_or_default();
            target.insert(key, hash_token(current));
            continue;
        }
        let values: Vec<String> = request_headers.get_all(&name).map(str::to_owned).collect();
        for value in values {
            target.insert(key.clone(), value);
        }
    }
}

/// Returns `true` if `name` is a synthetic snapshot header.
pub fn is_snapshot_header(config: &CacheConfig, name: &str) -> bool {
    name.len() >= config.vary_prefix.len()
        && name.as_bytes()[..config.vary_prefix.len()]
            .eq_ignore_ascii_case(config.vary_prefix.as_bytes())
}

fn snapshot_name(config: &CacheConfig, name: &str) -> String {
    format!("{}{}", config.vary_prefix, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::StatusCode;

    fn cached(headers: &[(&str, &str)]) -> CachedResponse {
        CachedResponse::new(StatusCode::OK, headers.iter().copied().collect(), "")
    }

    fn request(headers: &[(&str, &str)]) -> Headers {
        headers.iter().copied().collect()
    }

    #[test]
    fn parse_vary_cases() {
        let cases: Vec<(Headers, Vec<&str>)> = vec![
            (Headers::new(), vec![]),
            (request(&[("Vary", "Accept")]), vec!["Accept"]),
            (
                request(&[("Vary", "Accept, Authorization")]),
                vec!["Accept", "Authorization"],
            ),
            (
                request(&[("Vary", "Accept,\tCookie"), ("vary", "Authorization , accept")]),
                vec!["Accept", "Cookie", "Authorization"],
            ),
            (request(&[("Vary", " , ")]), vec![]),
        ];
        for (headers, expected) in cases {
            assert_eq!(parse_vary(&headers), expected, "{headers:?}");
        }
    }

    #[test]
    fn identical_values_match() {
        let config = CacheConfig::default();
        let entry = cached(&[("X-Varied-Accept", "application/json"), ("Vary", "Accept")]);
        assert!(variances_match(&config, &request(&[("Accept", "application/json")]), &entry));
    }

    #[test]
    fn differing_values_do_not_match() {
        let config = CacheConfig::default();
        let entry = cached(&[("X-Varied-Accept", "application/xml"), ("Vary", "Accept")]);
        assert!(!variances_match(&config, &request(&[("Accept", "application/json")]), &entry));
    }

    #[test]
    fn credential_compared_by_fingerprint() {
        let config = CacheConfig::default();
        let entry = cached(&[
            ("X-Varied-Accept", "application/json"),
            ("X-Varied-Authorization", "9S+9MrKzuG/4jvbEkGKChfSCrxXdyylUH5S89Saj9sc="),
            ("Vary", "Authorization, Accept"),
        ]);
        let same_secret = request(&[("Accept", "application/json"), ("Authorization", "token hunter2")]);
        let other_secret = request(&[("Accept", "application/json"), ("Authorization", "Bearer hunter3")]);
        assert!(variances_match(&config, &same_secret, &entry));
        assert!(!variances_match(&config, &other_secret, &entry));
    }

    #[test]
    fn empty_vary_matches() {
        let config = CacheConfig::default();
        assert!(variances_match(&config, &request(&[("Accept", "x")]), &cached(&[])));
    }

    #[test]
    fn absent_on_both_sides_matches() {
        let config = CacheConfig::default();
        let entry = cached(&[("Vary", "Cookie")]);
        assert!(variances_match(&config, &Headers::new(), &entry));
        assert!(!variances_match(&config, &request(&[("Cookie", "s=1")]), &entry));
    }

    #[test]
    fn vary_star_never_matches() {
        let config = CacheConfig::default();
        assert!(!variances_match(&config, &Headers::new(), &cached(&[("Vary", "*")])));
    }

    #[test]
    fn snapshot_fingerprints_credential() {
        let config = CacheConfig::default();
        let req = request(&[
            ("Accept", "application/json"),
            ("Authorization", "Bearer hunter2"),
            ("Cookie", "a=1"),
        ]);
        let mut target = request(&[("Vary", "Accept, Authorization")]);
        snapshot_variance(&config, &req, &mut target);

        assert_eq!(target.get("X-Varied-Accept"), Some("application/json"));
        assert_eq!(
            target.get("X-Varied-Authorization"),
            Some("9S+9MrKzuG/4jvbEkGKChfSCrxXdyylUH5S89Saj9sc=")
        );
        assert!(!target.contains("X-Varied-Cookie"));
        assert!(target.iter().all(|(_, v)| !v.contains("hunter2")));
    }

    #[test]
    fn snapshot_then_match_round_trip() {
        let config = CacheConfig::default();
        let req = request(&[("Accept", "a"), ("Cookie", "c1"), ("Cookie", "c2")]);
        let mut headers = request(&[("Vary", "Accept, Authorization, Cookie")]);
        snapshot_variance(&config, &req, &mut headers);

        assert_eq!(headers.get_all("x-varied-cookie").collect::<Vec<_>>(), vec!["c1", "c2"]);
        let entry = CachedResponse::new(StatusCode::OK, headers, "");
        assert!(variances_match(&config, &req, &entry));
    }

    #[test]
    fn snapshot_prefix_detection() {
        let config = CacheConfig::default();
        assert!(is_snapshot_header(&config, "X-Varied-Accept"));
        assert!(is_snapshot_header(&config, "x-varied-authorization"));
        assert!(!is_snapshot_header(&config, "X-Vary"));
        assert!(!is_snapshot_header(&config, "ETag"));
    }
}

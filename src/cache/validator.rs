//! Validator hash engine.
//!
//! GitHub derives a strong ETag as SHA-256 over a handful of request headers
//! followed by the response body. Reproducing it lets the transport compute
//! the ETag a response *would* carry for a different credential or `Accept`
//! value, and offer that to the upstream as a speculative `If-None-Match`.
//!
//! The derivation is undocumented. If the upstream changes it, speculative
//! validators simply stop matching and requests fall back to full fetches;
//! nothing here can detect that locally.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};

use crate::config::CacheConfig;
use crate::http::Headers;

/// Starts a validator digest over the cache-relevant request headers.
///
/// Walks [`CacheConfig::vary_headers`] in its fixed sorted order. A name is
/// included when `vary` is `None` or contains it (case-insensitively); each
/// value of an included header is written followed by `:`. Header-map order
/// never matters.
///
/// The caller feeds the response body into the returned hasher and finalizes.
pub fn validator_hasher(config: &CacheConfig, headers: &Headers, vary: Option<&[String]>) -> Sha256 {
    let mut hasher = Sha256::new();
    for name in &config.vary_headers {
        let included = vary.is_none_or(|v| v.iter().any(|n| n.eq_ignore_ascii_case(name)));
        if !included {
            continue;
        }
        for value in headers.get_all(name) {
            hasher.update(value.as_bytes());
            hasher.update(b":");
        }
    }
    hasher
}

/// Computes the quoted, lowercase-hex validator for `body` under `headers`.
pub fn speculative_etag(
    config: &CacheConfig,
    headers: &Headers,
    vary: Option<&[String]>,
    body: &[u8],
) -> String {
    let mut hasher = validator_hasher(config, headers, vary);
    hasher.update(body);
    format!("\"{}\"", hex::encode(hasher.finalize()))
}

/// Fingerprints an `Authorization` value the way GitHub's audit log
/// `hashed_token` field does: base64(SHA-256(secret)).
///
/// The secret is the payload after `Bearer `, `token `, or the password half
/// of a `Basic ` credential. Anything unrecognized hashes as the empty secret.
pub fn hash_token(authorization: &str) -> String {
    let token = extract_secret(authorization).unwrap_or_default();
    STANDARD.encode(Sha256::digest(&token))
}

fn extract_secret(authorization: &str) -> Option<Vec<u8>> {
    if let Some(bearer) = authorization.strip_prefix("Bearer ") {
        return (!bearer.is_empty()).then(|| bearer.as_bytes().to_vec());
    }
    if let Some(basic) = authorization.strip_prefix("Basic ") {
        let decoded = STANDARD.decode(basic).ok()?;
        let colon = decoded.iter().position(|&b| b == b':')?;
        let password = &decoded[colon + 1..];
        return (!password.is_empty()).then(|| password.to_vec());
    }
    if let Some(token) = authorization.strip_prefix("token ") {
        return (!token.is_empty()).then(|| token.as_bytes().to_vec());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_BODY: &str = r#"{"login":"bored-engineer","id":541842,"node_id":"MDQ6VXNlcjU0MTg0Mg==","avatar_url":"https://avatars.githubusercontent.com/u/541842?v=4","gravatar_id":"","url":"https://api.github.com/users/bored-engineer","html_url":"https://github.com/bored-engineer","followers_url":"https://api.github.com/users/bored-engineer/followers","following_url":"https://api.github.com/users/bored-engineer/following{/other_user}","gists_url":"https://api.github.com/users/bored-engineer/gists{/gist_id}","starred_url":"https://api.github.com/users/bored-engineer/starred{/owner}{/repo}","subscriptions_url":"https://api.github.com/users/bored-engineer/subscriptions","organizations_url":"https://api.github.com/users/bored-engineer/orgs","repos_url":"https://api.github.com/users/bored-engineer/repos","events_url":"https://api.github.com/users/bored-engineer/events{/privacy}","received_events_url":"https://api.github.com/users/bored-engineer/received_events","type":"User","user_view_type":"public","site_admin":false,"name":"Luke Young","company":null,"blog":"https://bored.engineer/","location":"San Francisco, CA","email":null,"hireable":true,"bio":"I find bugs and exploit them. Sometimes for money, mainly for free T-Shirts...","twitter_username":null,"public_repos":136,"public_gists":51,"followers":212,"following":13,"created_at":"2010-12-30T17:15:38Z","updated_at":"2025-05-06T02:44:16Z"}"#;

    fn digest(headers: &Headers, vary: Option<&[String]>, body: &str) -> String {
        let mut h = validator_hasher(&CacheConfig::default(), headers, vary);
        h.update(body.as_bytes());
        hex::encode(h.finalize())
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_everything() {
        assert_eq!(
            digest(&Headers::new(), None, ""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn body_only() {
        assert_eq!(
            digest(&Headers::new(), None, TEST_BODY),
            "c5542e3ee32c0adf1128a79d80a296d03412415c924e522d9d1c75b17d7c3ef0"
        );
    }

    #[test]
    fn accept_header() {
        let headers: Headers = [("Accept", "application/vnd.github.v3+json")].into_iter().collect();
        assert_eq!(
            digest(&headers, None, TEST_BODY),
            "125f46f7d22cd8f41ea1534256ba85a45f4a0e3dcf995da9fecfe3361b93407d"
        );
    }

    #[test]
    fn vary_filter_excludes_authorization() {
        let headers: Headers = [
            ("Authorization", "Bearer hunter2"),
            ("Accept", "application/vnd.github.v3+json"),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            digest(&headers, Some(&names(&["Accept"])), TEST_BODY),
            "125f46f7d22cd8f41ea1534256ba85a45f4a0e3dcf995da9fecfe3361b93407d"
        );
    }

    #[test]
    fn vary_filter_includes_authorization() {
        // Insertion order is deliberately reversed: the digest follows the
        // configured order, not the header map's.
        let headers: Headers = [
            ("Authorization", "Bearer hunter2"),
            ("Accept", "application/vnd.github.v3+json"),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            digest(&headers, Some(&names(&["Accept", "Authorization"])), TEST_BODY),
            "2c3b29a72c9c09135a89fe51c46613393b445efabdf6f02105dc1561237093a4"
        );
    }

    #[test]
    fn vary_filter_is_case_insensitive() {
        let headers: Headers = [("Accept", "application/vnd.github.v3+json")].into_iter().collect();
        assert_eq!(
            digest(&headers, Some(&names(&["accept"])), TEST_BODY),
            digest(&headers, None, TEST_BODY)
        );
    }

    #[test]
    fn multi_valued_headers_write_each_value() {
        let headers: Headers = [("Cookie", "a=1"), ("Cookie", "b=2")].into_iter().collect();
        let mut expected = Sha256::new();
        expected.update(b"a=1:b=2:body");
        assert_eq!(digest(&headers, None, "body"), hex::encode(expected.finalize()));
    }

    #[test]
    fn speculative_etag_is_quoted_hex() {
        let headers: Headers = [("Authorization", "Bearer hunter1")].into_iter().collect();
        assert_eq!(
            speculative_etag(
                &CacheConfig::default(),
                &headers,
                Some(&names(&["Authorization"])),
                b"hello world"
            ),
            "\"ffe6e54ebaaaff92f2feaa4bf3a5fda8ff1d49a6a4f492101039cd7c091b7523\""
        );
    }

    #[test]
    fn token_fingerprints() {
        let hunter2 = "9S+9MrKzuG/4jvbEkGKChfSCrxXdyylUH5S89Saj9sc=";
        assert_eq!(hash_token("Bearer hunter2"), hunter2);
        assert_eq!(hash_token("Basic Ym9yZWQtZW5naW5lZXI6aHVudGVyMg=="), hunter2);
        assert_eq!(hash_token("token hunter2"), hunter2);
    }

    #[test]
    fn unrecognized_tokens_hash_as_empty() {
        let empty = "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=";
        assert_eq!(hash_token(""), empty);
        assert_eq!(hash_token("Bearer "), empty);
        assert_eq!(hash_token("Digest abc"), empty);
        assert_eq!(hash_token("Basic !!!not-base64"), empty);
        // "user" with no colon
        assert_eq!(hash_token("Basic dXNlcg=="), empty);
    }
}

//! Transport configuration.
//!
//! Every fixed list the caching transport consults lives here as an immutable
//! value handed to [`CachingTransport::new`](crate::CachingTransport::new), so
//! two transports in one process never share mutable state and tests can
//! override any list locally.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while loading or validating a [`CacheConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Immutable settings for a [`CachingTransport`](crate::CachingTransport).
///
/// The defaults reproduce the upstream's validator derivation for the GitHub
/// REST API. Any field missing from a JSON document takes its default.
///
/// # Examples
///
/// ```
/// use etagcache::CacheConfig;
///
/// let config = CacheConfig::from_json(r#"{ "excluded_paths": ["/meta"] }"#).unwrap();
/// assert_eq!(config.excluded_paths, vec!["/meta"]);
/// assert_eq!(config.vary_headers, vec!["Accept", "Authorization", "Cookie"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Request headers that feed the validator digest, in canonical spelling.
    /// Kept sorted; the digest walks them in this order.
    pub vary_headers: Vec<String>,

    /// The header whose value is fingerprinted instead of stored.
    pub credential_header: String,

    /// `(trigger, replacement)` pairs applied to `User-Agent`.
    pub user_agent_replacements: Vec<(String, String)>,

    /// URL paths that are never cached.
    pub excluded_paths: Vec<String>,

    /// Prefix of the synthetic headers that hold the variance snapshot.
    pub vary_prefix: String,

    /// Upstream header identifying the request that produced a response.
    pub request_id_header: String,

    /// Header set on spliced results, carrying the cached request id.
    pub cached_request_id_header: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            vary_headers: vec![
                "Accept".to_owned(),
                "Authorization".to_owned(),
                "Cookie".to_owned(),
            ],
            credential_header: "Authorization".to_owned(),
            user_agent_replacements: [
                ("curl", "cUrL"),
                ("Wget", "wGeT"),
                ("Safari", "sAfArI"),
                ("Firefox", "fIrEfOx"),
            ]
            .into_iter()
            .map(|(from, to)| (from.to_owned(), to.to_owned()))
            .collect(),
            excluded_paths: vec!["/rate_limit".to_owned(), "/api/v3/rate_limit".to_owned()],
            vary_prefix: "X-Varied-".to_owned(),
            request_id_header: "X-GitHub-Request-Id".to_owned(),
            cached_request_id_header: "X-Cached-Request-Id".to_owned(),
        }
    }
}

impl CacheConfig {
    /// Parses a JSON document, sorts `vary_headers`, and validates the result.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(json)?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Sorts `vary_headers` case-insensitively so the digest order is fixed.
    pub fn normalize(&mut self) {
        self.vary_headers
            .sort_by_key(|name| name.to_ascii_lowercase());
    }

    /// Checks the invariants the transport relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the snapshot prefix or any header
    /// name is empty, when `vary_headers` is empty, unsorted, or holds
    /// duplicates, or when a User-Agent replacement still contains its trigger.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vary_prefix.is_empty() {
            return Err(ConfigError::Invalid("vary_prefix must not be empty".into()));
        }
        if self.vary_headers.is_empty() {
            return Err(ConfigError::Invalid("vary_headers must not be empty".into()));
        }
        for pair in self.vary_headers.windows(2) {
            let (a, b) = (pair[0].to_ascii_lowercase(), pair[1].to_ascii_lowercase());
            if a == b {
                return Err(ConfigError::Invalid(format!(
                    "duplicate vary header {:?}",
                    pair[1]
                )));
            }
            if a > b {
                return Err(ConfigError::Invalid(format!(
                    "vary_headers must be sorted: {:?} before {:?}",
                    pair[0], pair[1]
                )));
            }
        }
        for name in [
            &self.credential_header,
            &self.request_id_header,
            &self.cached_request_id_header,
        ] {
            if name.is_empty() {
                return Err(ConfigError::Invalid("header names must not be empty".into()));
            }
        }
        for (trigger, replacement) in &self.user_agent_replacements {
            if trigger.is_empty() {
                return Err(ConfigError::Invalid("empty User-Agent trigger".into()));
            }
            if replacement.len() != trigger.len() || replacement.contains(trigger.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "replacement {replacement:?} for {trigger:?} must keep its length and drop the trigger"
                )));
            }
        }
        Ok(())
    }
}

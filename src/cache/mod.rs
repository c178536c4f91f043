//! Conditional-request caching: the decision engine behind
//! [`CachingTransport`](crate::CachingTransport).
//!
//! Leaves first:
//!
//! - [`cacheable`] — decides whether a request is a caching candidate.
//! - [`user_agent`] — rewrites User-Agent substrings that make the upstream
//!   pretty-print (and so change body bytes).
//! - [`validator`] — reproduces the upstream's ETag digest and fingerprints
//!   credentials.
//! - [`vary`] — parses `Vary` and compares a request against the variance
//!   snapshot stored alongside a cached response.
//! - [`conditional`] — attaches `If-None-Match` to an outgoing request.
//! - [`entry`] — the stored [`CachedResponse`] and its on-disk framing.

pub mod cacheable;
pub mod conditional;
pub mod entry;
pub mod user_agent;
pub mod validator;
pub mod vary;

pub use cacheable::is_cacheable;
pub use conditional::{ValidatorSource, add_conditional_headers};
pub use entry::CachedResponse;
pub use user_agent::normalize_user_agent;
pub use validator::{hash_token, speculative_etag, validator_hasher};
pub use vary::{parse_vary, snapshot_variance, variances_match};

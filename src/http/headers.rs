//! HTTP header map with case-insensitive name lookup.
//!
//! HTTP headers are order-preserving and case-insensitive per [RFC 9110 §5].
//! Value order within one name is significant to the validator digest, so
//! entries are kept in a flat vector rather than a hash map.

/// A case-insensitive, multi-value HTTP header map.
///
/// # Examples
///
/// ```
/// use etagcache::http::Headers;
///
/// let mut headers = Headers::new();
/// headers.insert("Vary", "Accept");
/// headers.insert("vary", "Authorization");
/// headers.set("ETag", r#""deadbeef""#);
///
/// let all: Vec<_> = headers.get_all("VARY").collect();
/// assert_eq!(all, vec!["Accept", "Authorization"]);
/// assert_eq!(headers.get("etag"), Some(r#""deadbeef""#));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    inner: Vec<(String, String)>,
}

impl Headers {
    /// Creates an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a header map with pre-allocated capacity for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Vec::with_capacity(capacity),
        }
    }

    /// Appends a header entry. Multiple values for the same name are preserved.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Replaces every value of `name` with a single `value`.
    ///
    /// The new entry takes the position of the first removed one, or goes to
    /// the end when the name was absent.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .inner
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(&name))
        {
            Some(pos) => {
                self.inner[pos] = (name.clone(), value);
                let mut idx = 0;
                self.inner.retain(|(k, _)| {
                    let keep = idx <= pos || !k.eq_ignore_ascii_case(&name);
                    idx += 1;
                    keep
                });
            }
            None => self.inner.push((name, value)),
        }
    }

    /// Returns the first value for the given header name (case-insensitive), or `None`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns an iterator over all values for the given header name (case-insensitive).
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.inner
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Removes all entries with the given header name (case-insensitive).
    ///
    /// Returns `true` if any entries were removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.inner.len();
        self.inner.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.inner.len() < before
    }

    /// Returns `true` if the map contains at least one entry with the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// Returns the distinct header names in first-seen order, as first spelled.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for (k, _) in &self.inner {
            if !names.iter().any(|n| n.eq_ignore_ascii_case(k)) {
                names.push(k);
            }
        }
        names
    }

    /// Returns the total number of header entries (not unique names).
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if there are no header entries.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns an iterator over all `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            inner: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive_get() {
        let mut h = Headers::new();
        h.insert("If-None-Match", r#""abc""#);
        assert_eq!(h.get("if-none-match"), Some(r#""abc""#));
        assert_eq!(h.get("IF-NONE-MATCH"), Some(r#""abc""#));
    }

    #[test]
    fn set_replaces_every_value_in_place() {
        let mut h = Headers::new();
        h.insert("Accept", "a");
        h.insert("User-Agent", "one");
        h.insert("user-agent", "two");
        h.insert("Cookie", "c");
        h.set("User-Agent", "three");

        let pairs: Vec<_> = h.iter().collect();
        assert_eq!(
            pairs,
            vec![("Accept", "a"), ("User-Agent", "three"), ("Cookie", "c")]
        );
    }

    #[test]
    fn set_appends_when_absent() {
        let mut h = Headers::new();
        h.set("ETag", "x");
        assert_eq!(h.len(), 1);
        assert_eq!(h.get("etag"), Some("x"));
    }

    #[test]
    fn names_are_distinct_and_ordered() {
        let h: Headers = [("Vary", "a"), ("ETag", "b"), ("vary", "c")]
            .into_iter()
            .collect();
        assert_eq!(h.names(), vec!["Vary", "ETag"]);
    }

    #[test]
    fn remove_every_value() {
        let mut h = Headers::new();
        h.insert("ETag", "x");
        h.insert("etag", "y");
        assert!(h.remove("ETAG"));
        assert!(h.is_empty());
        assert!(!h.remove("etag"));
    }
}

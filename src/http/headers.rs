//! Ordered multi-value HTTP header container.
//!
//! Storage is case-sensitive: the parser canonicalizes incoming wire names
//! (see [`reader`](super::reader)), so exact-name lookups like
//! `get("Content-Length")` work for well-formed traffic. Case-insensitive
//! lookup is deliberately not provided.

use std::fmt;

/// An ordered, multi-value HTTP header map with case-sensitive names.
///
/// Preserves insertion order and allows multiple values per header name.
/// [`get`](Headers::get) returns the first value for a name, matching the
/// add/get-first semantics of HTTP/1.1 field lines.
///
/// # Examples
///
/// ```
/// use wireserv::http::Headers;
///
/// let mut headers = Headers::new();
/// headers.add("Content-Type", "text/html; charset=utf-8");
/// headers.add("X-Custom", "first");
/// headers.add("X-Custom", "second");
///
/// assert_eq!(headers.get("Content-Type"), Some("text/html; charset=utf-8"));
/// let all: Vec<_> = headers.get_all("X-Custom").collect();
/// assert_eq!(all, vec!["first", "second"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Headers {
    inner: Vec<(String, String)>,
}

impl Headers {
    /// Creates an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header entry. Multiple values for the same name are preserved.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the first value for the given header name, or `None`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns an iterator over all values for the given header name.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.inner
            .iter()
            .filter(move |(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns `true` if the map contains at least one entry with the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.iter().any(|(k, _)| k == name)
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

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.inner {
            write!(f, "{name}: {value}\r\n")?;
        }
        Ok(())
    }
}

//! Case-insensitive HTTP header storage.
//!
//! Request and response headers are kept in a `SmallVec` so the handful of
//! headers a JSON response carries (content type, length, the security
//! header table and the mirrored API status) never touch the heap.
//!
//! Lookups are linear but names compare ASCII case-insensitively, which is
//! what HTTP requires and what the renderer relies on when it overwrites a
//! header a handler already set under a different spelling.

use smallvec::SmallVec;
use std::fmt;

/// Number of headers stored inline.
///
/// A rendered JSON response carries up to eleven headers with the default
/// security table, so sixteen leaves room for handler-provided ones.
pub const INLINE_HEADERS: usize = 16;

/// A header name-value pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Header {
    /// Header name as it was first inserted
    pub name: String,
    /// Header value
    pub value: String,
}

impl Header {
    #[inline]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Check if name matches (case-insensitive)
    #[inline]
    pub fn name_eq(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

/// An ordered, case-insensitive header map.
///
/// # Example
///
/// ```rust
/// use armature_core::HeaderMap;
///
/// let mut headers = HeaderMap::new();
/// headers.insert("Content-Type", "application/json");
///
/// assert_eq!(headers.get("content-type").map(String::as_str), Some("application/json"));
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    inner: SmallVec<[Header; INLINE_HEADERS]>,
}

impl HeaderMap {
    #[inline]
    pub const fn new() -> Self {
        Self {
            inner: SmallVec::new_const(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Get header value by name (case-insensitive).
    #[inline]
    pub fn get(&self, name: &str) -> Option<&String> {
        self.inner
            .iter()
            .find(|h| h.name_eq(name))
            .map(|h| &h.value)
    }

    /// Check if header exists (case-insensitive).
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.iter().any(|h| h.name_eq(name))
    }

    /// Insert a header, replacing any existing header with the same name.
    ///
    /// The replaced header keeps its position and original spelling.
    /// Returns the old value if replaced.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();

        if let Some(h) = self.inner.iter_mut().find(|h| h.name_eq(&name)) {
            return Some(std::mem::replace(&mut h.value, value));
        }

        self.inner.push(Header::new(name, value));
        None
    }

    /// Iterate over all headers in insertion order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.inner.iter().map(|h| (&h.name, &h.value))
    }

    /// Get all values for a header name (for multi-value headers).
    pub fn get_all(&self, name: &str) -> Vec<&String> {
        self.inner
            .iter()
            .filter(|h| h.name_eq(name))
            .map(|h| &h.value)
            .collect()
    }

    // ========================================================================
    // Common Header Accessors
    // ========================================================================

    #[inline]
    pub fn content_type(&self) -> Option<&String> {
        self.get("Content-Type")
    }

    /// Get Content-Length header as usize.
    #[inline]
    pub fn content_length(&self) -> Option<usize> {
        self.get("Content-Length")?.parse().ok()
    }

    #[inline]
    pub fn user_agent(&self) -> Option<&String> {
        self.get("User-Agent")
    }

    #[inline]
    pub fn cookie(&self) -> Option<&String> {
        self.get("Cookie")
    }

    /// Get X-Requested-With header (set by XHR libraries).
    #[inline]
    pub fn requested_with(&self) -> Option<&String> {
        self.get("X-Requested-With")
    }

    #[inline]
    pub fn set_content_type(&mut self, value: impl Into<String>) {
        self.insert("Content-Type", value);
    }

    #[inline]
    pub fn set_content_length(&mut self, len: usize) {
        self.insert("Content-Length", len.to_string());
    }
}

impl fmt::Debug for HeaderMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.inner.iter().map(|h| (&h.name, &h.value)))
            .finish()
    }
}

impl<K, V> FromIterator<(K, V)> for HeaderMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = HeaderMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

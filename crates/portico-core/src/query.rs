//! Query string parameters.
//!
//! [`QueryParams`] is an ordered multimap over the decoded query
//! string. Repeated keys are preserved in order, and a key can be
//! asked for its first value or for all values. The `require`
//! accessor fails with [`HttpError::ParameterNotFound`] when the key
//! is absent; `first` returns `None` instead.

use crate::error::{HttpError, HttpResult, ParameterLocation};
use serde::de::DeserializeOwned;

/// Decoded query parameters, preserving order and multiplicity.
///
/// # Example
///
/// ```
/// use portico_core::QueryParams;
///
/// let query = QueryParams::parse("tag=rust&tag=http&limit=10");
///
/// assert_eq!(query.first("limit"), Some("10"));
/// assert_eq!(query.all("tag"), vec!["rust", "http"]);
/// assert_eq!(query.first("missing"), None);
/// assert!(query.require("missing").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryParams {
    /// Decoded (key, value) pairs in query-string order.
    pairs: Vec<(String, String)>,
    /// The raw query string, kept for typed deserialization.
    raw: String,
}

impl QueryParams {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses a query string (without the leading `?`).
    ///
    /// Percent-encoding and `+`-as-space are decoded; pair order and
    /// repeated keys are preserved.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let pairs = form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self {
            pairs,
            raw: query.to_string(),
        }
    }

    /// Returns the raw query string.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the first value for a key, if any.
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns all values for a key, in order.
    #[must_use]
    pub fn all(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Returns the first value for a key or fails.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::ParameterNotFound`] when the key is absent.
    pub fn require(&self, name: &str) -> HttpResult<&str> {
        self.first(name)
            .ok_or_else(|| HttpError::parameter_not_found(name, ParameterLocation::Query))
    }

    /// Returns true if the key is present at least once.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == name)
    }

    /// Returns the number of (key, value) pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterates over the decoded pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Deserializes the whole query string into a typed struct.
    ///
    /// # Errors
    ///
    /// Returns a 400-mapped error when deserialization fails.
    ///
    /// # Example
    ///
    /// ```
    /// use portico_core::QueryParams;
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct ListParams {
    ///     #[serde(default)]
    ///     limit: Option<u32>,
    /// }
    ///
    /// let query = QueryParams::parse("limit=10");
    /// let params: ListParams = query.parse_into().unwrap();
    /// assert_eq!(params.limit, Some(10));
    /// ```
    pub fn parse_into<T: DeserializeOwned>(&self) -> HttpResult<T> {
        serde_urlencoded::from_str(&self.raw)
            .map_err(|e| HttpError::bad_request(format!("invalid query string: {e}")))
    }
}

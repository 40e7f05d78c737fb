//! Registration-ordered route table.
//!
//! The [`RouteTable`] stores (method, pattern, value) triples in
//! registration order and resolves requests with a linear first-match
//! scan. The value type is generic so the table can carry anything
//! from operation names in tests to full endpoint records in the
//! server crate.

use http::Method;

use crate::params::PathParams;
use crate::pattern::{PathPattern, PatternError};

/// A successful route resolution.
#[derive(Debug)]
pub struct RouteMatch<'a, T> {
    /// The value registered for the matched route.
    pub value: &'a T,
    /// The pattern that matched.
    pub pattern: &'a PathPattern,
    /// Parameters extracted from the request path.
    pub params: PathParams,
}

/// A route table resolving in registration order.
///
/// An exact method match is required; the first registered route whose
/// pattern matches the request path wins. There is no specificity
/// ranking, so more specific routes must be registered before the
/// parameter routes that would shadow them.
///
/// # Example
///
/// ```rust
/// use portico_router::RouteTable;
/// use http::Method;
///
/// let mut table = RouteTable::new();
/// table.insert(Method::GET, "/users/me", "getCurrentUser").unwrap();
/// table.insert(Method::GET, "/users/:id", "getUser").unwrap();
///
/// let matched = table.match_route(&Method::GET, "/users/me").unwrap();
/// assert_eq!(*matched.value, "getCurrentUser");
///
/// let matched = table.match_route(&Method::GET, "/users/42").unwrap();
/// assert_eq!(*matched.value, "getUser");
/// assert_eq!(matched.params.get("id"), Some("42"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteTable<T> {
    routes: Vec<(Method, PathPattern, T)>,
}

impl<T> RouteTable<T> {
    /// Creates an empty route table.
    #[must_use]
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registers a route, parsing the pattern text.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] when the pattern does not parse.
    pub fn insert(
        &mut self,
        method: Method,
        pattern: &str,
        value: T,
    ) -> Result<(), PatternError> {
        let pattern = PathPattern::parse(pattern)?;
        self.insert_pattern(method, pattern, value);
        Ok(())
    }

    /// Registers a route with an already-parsed pattern.
    pub fn insert_pattern(&mut self, method: Method, pattern: PathPattern, value: T) {
        self.routes.push((method, pattern, value));
    }

    /// Resolves a request against the table.
    ///
    /// Scans routes in registration order and returns the first one
    /// whose method equals the request method and whose pattern
    /// matches the path.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        self.routes.iter().find_map(|(m, pattern, value)| {
            if m != method {
                return None;
            }
            pattern.matches(path).map(|params| RouteMatch {
                value,
                pattern,
                params,
            })
        })
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Iterates over the registered routes in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&Method, &PathPattern, &T)> {
        self.routes.iter().map(|(m, p, v)| (m, p, v))
    }
}

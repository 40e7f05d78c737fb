//! Path pattern parsing and matching.
//!
//! A [`PathPattern`] is a parsed route path consisting of literal
//! segments and named `:param` segments. Patterns are parsed once at
//! registration time; matching is a straight segment walk.

use crate::params::PathParams;

/// One segment of a parsed path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Static path segment (e.g., "users", "api")
    Literal(String),
    /// Named parameter segment (e.g., ":id", ":userId")
    Param(String),
}

/// Error raised when a route pattern cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternError {
    /// The offending pattern.
    pub pattern: String,
    /// Why it was rejected.
    pub reason: String,
}

impl std::fmt::Display for PatternError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid route pattern '{}': {}", self.pattern, self.reason)
    }
}

impl std::error::Error for PatternError {}

/// A parsed route path pattern.
///
/// Supports literal segments and single named segments introduced by
/// `:`. Wildcards and multi-segment captures are not supported.
/// Trailing slashes are normalized away on both the pattern and the
/// request path, so `/users` and `/users/` are equivalent.
///
/// # Example
///
/// ```rust
/// use portico_router::PathPattern;
///
/// let pattern = PathPattern::parse("/users/:id/posts").unwrap();
/// let params = pattern.matches("/users/42/posts").unwrap();
/// assert_eq!(params.get("id"), Some("42"));
/// assert!(pattern.matches("/users/42").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    /// The original pattern text, kept for display and introspection.
    raw: String,
    /// Parsed segments in order.
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parses a path pattern.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] when a `:` segment has an empty name or
    /// the same parameter name appears twice.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let mut segments = Vec::new();
        let mut seen = Vec::new();

        for part in pattern.split('/').filter(|s| !s.is_empty()) {
            if let Some(name) = part.strip_prefix(':') {
                if name.is_empty() {
                    return Err(PatternError {
                        pattern: pattern.to_string(),
                        reason: "parameter segment has no name".to_string(),
                    });
                }
                if seen.contains(&name) {
                    return Err(PatternError {
                        pattern: pattern.to_string(),
                        reason: format!("duplicate parameter name '{name}'"),
                    });
                }
                seen.push(name);
                segments.push(Segment::Param(name.to_string()));
            } else {
                segments.push(Segment::Literal(part.to_string()));
            }
        }

        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    /// Returns the original pattern text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the parsed segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the names of the parameter segments, in order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Matches a request path against this pattern.
    ///
    /// Returns the extracted parameters on a match, `None` otherwise.
    /// Empty segments in the request path are skipped, normalizing
    /// trailing and duplicate slashes.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let mut params = PathParams::new();
        let mut segments = self.segments.iter();

        for part in path.split('/').filter(|s| !s.is_empty()) {
            match segments.next()? {
                Segment::Literal(expected) => {
                    if expected != part {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    params.push(name.clone(), part.to_string());
                }
            }
        }

        // The pattern must be fully consumed as well.
        if segments.next().is_some() {
            return None;
        }

        Some(params)
    }
}

impl std::fmt::Display for PathPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

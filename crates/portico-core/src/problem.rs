//! RFC 7807 Problem Details bodies.
//!
//! [`ProblemDetails`] is the structured error shape produced by the
//! Problem-Details error handler variant. Extensions are kept in an
//! ordered map so serialized output is stable.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// An RFC 7807 "problem detail" response body.
///
/// # Example
///
/// ```
/// use portico_core::ProblemDetails;
///
/// let problem = ProblemDetails::new(404, "Not Found")
///     .with_detail("no user with id 42")
///     .with_instance("/users/42")
///     .with_extension("resource", serde_json::json!("user"));
///
/// let json = serde_json::to_value(&problem).unwrap();
/// assert_eq!(json["type"], "about:blank");
/// assert_eq!(json["status"], 404);
/// assert_eq!(json["resource"], "user");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// URI reference identifying the problem type.
    #[serde(rename = "type")]
    pub problem_type: String,
    /// Short human-readable summary of the problem type.
    pub title: String,
    /// HTTP status code for this occurrence.
    pub status: u16,
    /// Human-readable explanation specific to this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// URI reference identifying this specific occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    /// Additional members, serialized inline.
    #[serde(flatten)]
    pub extensions: IndexMap<String, serde_json::Value>,
}

impl ProblemDetails {
    /// Creates a problem with the default `about:blank` type.
    #[must_use]
    pub fn new(status: u16, title: impl Into<String>) -> Self {
        Self {
            problem_type: "about:blank".to_string(),
            title: title.into(),
            status,
            detail: None,
            instance: None,
            extensions: IndexMap::new(),
        }
    }

    /// Sets the problem type URI.
    #[must_use]
    pub fn with_type(mut self, problem_type: impl Into<String>) -> Self {
        self.problem_type = problem_type.into();
        self
    }

    /// Sets the occurrence detail.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Sets the occurrence instance (typically the request path).
    #[must_use]
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Adds an extension member.
    #[must_use]
    pub fn with_extension(
        mut self,
        name: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        self.extensions.insert(name.into(), value);
        self
    }
}

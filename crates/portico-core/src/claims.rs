//! Authenticated-user claims.
//!
//! [`UserClaims`] is the caller context an authentication interceptor
//! or guard attaches to the request. The pipeline itself never
//! interprets claims; it only carries them to guards and handlers.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Claims describing the authenticated caller of a request.
///
/// # Example
///
/// ```
/// use portico_core::UserClaims;
///
/// let user = UserClaims::new("user-123")
///     .with_claim("email", serde_json::json!("alice@example.com"))
///     .with_claim("roles", serde_json::json!(["admin", "user"]));
///
/// assert_eq!(user.subject(), "user-123");
/// assert_eq!(user.roles(), vec!["admin", "user"]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserClaims {
    /// The subject identifier (e.g., a user ID or token `sub`).
    subject: String,
    /// All claims, in insertion order.
    claims: IndexMap<String, serde_json::Value>,
}

impl UserClaims {
    /// Creates claims for the given subject.
    #[must_use]
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            claims: IndexMap::new(),
        }
    }

    /// Returns the subject identifier.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Adds a claim, replacing any previous value for the same name.
    #[must_use]
    pub fn with_claim(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.claims.insert(name.into(), value);
        self
    }

    /// Sets a claim on an existing value.
    pub fn set_claim(&mut self, name: impl Into<String>, value: serde_json::Value) {
        self.claims.insert(name.into(), value);
    }

    /// Returns a claim value by name.
    #[must_use]
    pub fn claim(&self, name: &str) -> Option<&serde_json::Value> {
        self.claims.get(name)
    }

    /// Returns a claim as a string, when it is one.
    #[must_use]
    pub fn claim_str(&self, name: &str) -> Option<&str> {
        self.claims.get(name).and_then(serde_json::Value::as_str)
    }

    /// Returns true if the claim is present.
    #[must_use]
    pub fn has_claim(&self, name: &str) -> bool {
        self.claims.contains_key(name)
    }

    /// Returns the caller's roles from the `roles` claim.
    ///
    /// Non-array or missing `roles` claims yield an empty list.
    #[must_use]
    pub fn roles(&self) -> Vec<&str> {
        self.claims
            .get("roles")
            .and_then(serde_json::Value::as_array)
            .map(|values| values.iter().filter_map(serde_json::Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Returns true if the caller carries the given role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles().contains(&role)
    }

    /// Iterates over all claims in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.claims.iter().map(|(k, v)| (k.as_str(), v))
    }
}

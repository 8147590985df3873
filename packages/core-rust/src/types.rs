use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Length of a generated trace identifier in hex characters.
pub const TRACE_ID_LEN: usize = 32;

/// Opaque identifier correlating all output produced while handling one request.
///
/// Values extracted from inbound headers are kept verbatim; generated values
/// are 32 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(String);

impl TraceId {
    /// Wraps an existing identifier (e.g. one propagated by an upstream caller).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random identifier.
    ///
    /// Uses a v4 UUID rendered without hyphens: the requirement is uniqueness,
    /// not unpredictability.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper, returning the inner string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TraceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TraceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Authenticated caller: the decoded claim set of a verified bearer token.
///
/// Owned by a single request. Never persisted or shared across requests.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal {
    claims: Map<String, Value>,
}

impl Principal {
    /// Builds a principal from an already-verified claim set.
    #[must_use]
    pub fn from_claims(claims: Map<String, Value>) -> Self {
        Self { claims }
    }

    /// All decoded claims.
    #[must_use]
    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    /// A single claim by name.
    #[must_use]
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// The `sub` claim, when present and a string.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.claims.get("sub").and_then(Value::as_str)
    }

    /// The raw `exp` claim, if the token carried one.
    #[must_use]
    pub fn expiry(&self) -> Option<&Value> {
        self.claims.get("exp")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn generated_trace_id_is_32_lowercase_hex() {
        let id = TraceId::generate();
        assert_eq!(id.as_str().len(), TRACE_ID_LEN);
        assert!(id
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn generated_trace_ids_differ() {
        let ids: std::collections::HashSet<_> = (0..1000).map(|_| TraceId::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn trace_id_serializes_as_plain_string() {
        let id = TraceId::new("abc123");
        assert_eq!(serde_json::to_value(&id).unwrap(), json!("abc123"));
        assert_eq!(id.to_string(), "abc123");
    }

    #[test]
    fn principal_exposes_standard_claims() {
        let claims = json!({"sub": "user-1", "exp": 1_700_000_000, "role": "admin"});
        let principal = Principal::from_claims(claims.as_object().cloned().unwrap());

        assert_eq!(principal.subject(), Some("user-1"));
        assert_eq!(principal.expiry(), Some(&json!(1_700_000_000)));
        assert_eq!(principal.claim("role"), Some(&json!("admin")));
        assert!(principal.claim("missing").is_none());
    }

    #[test]
    fn principal_serializes_as_claim_object() {
        let claims = json!({"sub": "user-1"});
        let principal = Principal::from_claims(claims.as_object().cloned().unwrap());
        assert_eq!(serde_json::to_value(&principal).unwrap(), claims);
    }
}

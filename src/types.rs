//! Basic type definitions for the chat hub
//!
//! Provides the `ClientId` newtype: the opaque, client-asserted identifier
//! that keys the user registry.

use serde::{Deserialize, Serialize};

/// Opaque client identifier (newtype pattern)
///
/// Clients self-assert their identifier; the hub performs no structural
/// validation, and two clients presenting the same identifier collide on a
/// last-writer-wins basis. Implements Hash and Eq for use as HashMap keys
/// and serializes as a bare string on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub String);

impl ClientId {
    /// True when no identifier was carried on the wire.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ClientId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ClientId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_id_empty() {
        assert!(ClientId::default().is_empty());
        assert!(!ClientId::from("u1").is_empty());
    }

    #[test]
    fn test_client_id_display() {
        let id = ClientId::from("3f2a");
        assert_eq!(id.to_string(), "3f2a");
    }

    #[test]
    fn test_client_id_serializes_as_bare_string() {
        let id = ClientId::from("u1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"u1\"");
    }
}

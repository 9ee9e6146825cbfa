use serde::{Deserialize, Serialize};

use std::fmt;

use crate::error::GatewayError;

/// Identity of the caller that owns conversations.
///
/// Never blank. Verification of the identity happens outside this system;
/// the core only scopes every store call by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerId(String);

impl OwnerId {
    /// Wrap a caller identity, rejecting blank values as `Unauthorized`.
    pub fn new(id: impl Into<String>) -> Result<Self, GatewayError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(GatewayError::Unauthorized);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OwnerId {
    type Error = GatewayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OwnerId> for String {
    fn from(value: OwnerId) -> Self {
        value.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_owner_is_unauthorized() {
        assert!(matches!(OwnerId::new(""), Err(GatewayError::Unauthorized)));
        assert!(matches!(OwnerId::new("   "), Err(GatewayError::Unauthorized)));
    }

    #[test]
    fn test_owner_display() {
        let owner = OwnerId::new("user_42").unwrap();
        assert_eq!(owner.to_string(), "user_42");
        assert_eq!(owner.as_str(), "user_42");
    }

    #[test]
    fn test_owner_deserialize_rejects_blank() {
        assert!(serde_json::from_str::<OwnerId>("\"\"").is_err());
        let owner: OwnerId = serde_json::from_str("\"u1\"").unwrap();
        assert_eq!(owner.as_str(), "u1");
    }
}

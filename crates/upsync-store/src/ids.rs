//! Type-safe identifier newtypes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Surrogate identifier assigned by a record store upon creation.
///
/// The value is opaque to the engine. It is string-backed rather than
/// UUID-backed because remote stores use their own identifier schemes
/// (numeric keys, prefixed ids, DNs); [`RecordId::random`] mints a
/// UUID-backed value for stores that have no native scheme.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Create a RecordId from an existing identifier value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Mint a fresh random (UUID v4) identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the identifier value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_display() {
        let id = RecordId::new("A1");
        assert_eq!(id.as_str(), "A1");
        assert_eq!(id.to_string(), "A1");
    }

    #[test]
    fn test_record_id_random_is_unique() {
        assert_ne!(RecordId::random(), RecordId::random());
    }

    #[test]
    fn test_record_id_parse() {
        let id: RecordId = "003xx000004TmiQ".parse().unwrap();
        assert_eq!(id, RecordId::new("003xx000004TmiQ"));
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifiers used across the caseport pipeline.
///
/// Two kinds of identity meet here:
/// - `SourceId` is whatever key the source system uses for a record.
/// - `CanonicalId` is the UUID the export assigns once and never changes.
///
/// A `CanonicalId` is minted when an object is first created and travels with
/// it through reclassification and merge. Only merge duplicates are remapped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalId(pub Uuid);

impl CanonicalId {
    /// Fresh random (v4) id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Fixed id, mostly useful for fixtures and snapshots.
    pub const fn from_u128(v: u128) -> Self {
        Self(Uuid::from_u128(v))
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for CanonicalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl FromStr for CanonicalId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Opaque key of a record in the source system.
///
/// Numeric keys are stringified at the client boundary so every source
/// system looks the same to the core.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<u64> for SourceId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

/// Label for one export run. Used to name batch directories and log spans.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub String);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl RunId {
    pub fn now(prefix: &str) -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        RunId(format!("{prefix}_{nanos}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_ids_are_unique() {
        let a = CanonicalId::new();
        let b = CanonicalId::new();
        assert_ne!(a, b);
        assert!(!a.is_nil());
    }

    #[test]
    fn canonical_id_serializes_as_plain_string() {
        let id = CanonicalId::from_u128(0x550e8400_e29b_41d4_a716_446655440000);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"550e8400-e29b-41d4-a716-446655440000\"");
        assert_eq!(id.to_string(), "550e8400-e29b-41d4-a716-446655440000");
    }

    #[test]
    fn source_id_from_number() {
        assert_eq!(SourceId::from(99u64), SourceId::new("99"));
        assert_eq!(SourceId::from("C-1").as_str(), "C-1");
    }

    #[test]
    fn run_id_has_prefix() {
        assert!(RunId::now("export").0.starts_with("export_"));
    }
}

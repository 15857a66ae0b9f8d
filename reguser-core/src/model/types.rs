/*
    types.rs - Identity types for users and groups

    Defines:
    - UserId / GroupId (opaque 128-bit identities)
    - Generation of fresh identities
*/

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Create a new random UserId
    pub fn generate() -> Self {
        UserId(Uuid::new_v4())
    }

    /// The all-zero identity, never produced by `generate`
    pub fn nil() -> Self {
        UserId(Uuid::nil())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(UserId)
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        UserId(id)
    }
}

/// Unique identifier for a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub Uuid);

impl GroupId {
    /// Create a new random GroupId
    pub fn generate() -> Self {
        GroupId(Uuid::new_v4())
    }

    pub fn nil() -> Self {
        GroupId(Uuid::nil())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GroupId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(GroupId)
    }
}

impl From<Uuid> for GroupId {
    fn from(id: Uuid) -> Self {
        GroupId(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = UserId::generate();
        let b = UserId::generate();
        assert_ne!(a, b);
        assert!(!a.is_nil());

        let g = GroupId::generate();
        assert!(!g.is_nil());
    }

    #[test]
    fn test_nil_ids() {
        assert!(UserId::nil().is_nil());
        assert!(GroupId::nil().is_nil());
        assert_eq!(
            UserId::nil().to_string(),
            "00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_parse_display() {
        let id = UserId::generate();
        let parsed: UserId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);

        assert!("not-a-uuid".parse::<GroupId>().is_err());
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = GroupId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }
}

//! Stable 64-bit identifiers shared by entities and assets

use serde::{Deserialize, Serialize};
use std::fmt;

/// A random, non-zero 64-bit identifier.
///
/// `Uuid::NIL` (zero) is reserved as the "no entity / no asset" sentinel and is
/// never produced by [`Uuid::new`]. It is also the `Default`, so absent fields
/// in documents read back as "none".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uuid(u64);

impl Uuid {
    pub const NIL: Uuid = Uuid(0);

    /// Generate a fresh identifier from the thread-local random source
    pub fn new() -> Self {
        loop {
            let value = rand::random::<u64>();
            if value != 0 {
                return Self(value);
            }
        }
    }

    /// Wrap an existing raw value, e.g. one read back from a scene document
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    pub const fn is_nil(self) -> bool {
        self.0 == 0
    }
}

impl Default for Uuid {
    fn default() -> Self {
        Self::NIL
    }
}

impl From<u64> for Uuid {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Uuid> for u64 {
    fn from(uuid: Uuid) -> Self {
        uuid.0
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_ids_are_never_nil() {
        for _ in 0..1000 {
            assert!(!Uuid::new().is_nil());
        }
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        let ids: HashSet<Uuid> = (0..1000).map(|_| Uuid::new()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_default_is_nil() {
        assert!(Uuid::default().is_nil());
    }

    #[test]
    fn test_serializes_as_raw_integer() {
        let id = Uuid::from_raw(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        let back: Uuid = serde_json::from_str("42").unwrap();
        assert_eq!(back, id);
    }
}

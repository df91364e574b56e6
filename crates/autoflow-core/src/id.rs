use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a placed entity within one location's arena.
    pub struct EntityId;
}

/// Ticks are the atomic unit of simulated time.
pub type Ticks = u64;

/// Identifies an item type. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemTypeId(pub u32);

/// Identifies one location in the world (a farm, a shed, a cave level).
///
/// Keys are opaque strings supplied by the embedding game; the engine only
/// compares them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LocationKey(String);

impl LocationKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LocationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_type_id_equality() {
        let a = ItemTypeId(0);
        let b = ItemTypeId(0);
        let c = ItemTypeId(1);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn location_keys_are_ordered_and_hashable() {
        use std::collections::BTreeMap;
        let mut map = BTreeMap::new();
        map.insert(LocationKey::new("farm"), 1);
        map.insert(LocationKey::new("shed"), 2);
        assert_eq!(map[&LocationKey::new("farm")], 1);
        assert_eq!(LocationKey::new("farm").to_string(), "farm");
    }
}

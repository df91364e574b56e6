//! Registry of machine kinds, keyed by the world entity name they attach
//! to.
//!
//! The registry is consulted by the built-in machine recognizer: an entity
//! whose name is registered here becomes a machine of that kind. Kinds for
//! one entity name are exclusive; re-registering a name replaces the kind
//! (last registration wins, letting content packs override the catalog).

use crate::machine::MachineKind;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct KindRegistry {
    by_entity_name: HashMap<String, Arc<dyn MachineKind>>,
}

impl KindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a kind for entities with the given world name. Matching is
    /// case-insensitive.
    pub fn register(&mut self, entity_name: &str, kind: Arc<dyn MachineKind>) {
        self.by_entity_name
            .insert(entity_name.to_ascii_lowercase(), kind);
    }

    pub fn lookup(&self, entity_name: &str) -> Option<&Arc<dyn MachineKind>> {
        self.by_entity_name.get(&entity_name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.by_entity_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_entity_name.is_empty()
    }
}

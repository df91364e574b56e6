//! JSON content-pack loader: item and kind definitions resolved by name
//! into a [`KindRegistry`].
//!
//! Gated behind the `data-loader` feature. References are by item name;
//! items get sequential type ids in declaration order.

use crate::{Recipe, RecipeKind, SourceKind};
use autoflow_core::id::ItemTypeId;
use autoflow_core::item::ItemKey;
use autoflow_core::registry::KindRegistry;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

// ===========================================================================
// Errors
// ===========================================================================

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate item '{0}'")]
    DuplicateItem(String),

    #[error("duplicate entity '{0}'")]
    DuplicateEntity(String),

    #[error("unresolved item reference '{name}' in kind '{kind}'")]
    UnresolvedItem { kind: String, name: String },

    #[error("kind '{0}' must define either recipes or a source, not both or neither")]
    AmbiguousKind(String),
}

// ===========================================================================
// Schema
// ===========================================================================

#[derive(Debug, Deserialize)]
struct PackDef {
    #[serde(default)]
    items: Vec<ItemDef>,
    #[serde(default)]
    kinds: Vec<KindDef>,
}

#[derive(Debug, Deserialize)]
struct ItemDef {
    name: String,
    #[serde(default)]
    craftable: bool,
    #[serde(default)]
    variant: u32,
}

#[derive(Debug, Deserialize)]
struct KindDef {
    /// World entity name this kind attaches to.
    entity: String,
    /// Stable kind identifier.
    id: String,
    #[serde(default)]
    priority: i32,
    #[serde(default)]
    recipes: Vec<RecipeDef>,
    #[serde(default)]
    source: Option<SourceDef>,
}

#[derive(Debug, Deserialize)]
struct RecipeDef {
    input: String,
    count: u32,
    output: String,
    produces: u32,
    duration: u64,
}

#[derive(Debug, Deserialize)]
struct SourceDef {
    output: String,
    produces: u32,
    period: u64,
}

// ===========================================================================
// Loading
// ===========================================================================

/// A loaded content pack: the kind registry plus the item keys it defined.
#[derive(Debug)]
pub struct LoadedPack {
    pub registry: KindRegistry,
    pub items: BTreeMap<String, ItemKey>,
}

/// Parse a JSON content pack and build its registry.
pub fn load_registry(json: &str) -> Result<LoadedPack, LoadError> {
    let pack: PackDef = serde_json::from_str(json)?;

    let mut items: BTreeMap<String, ItemKey> = BTreeMap::new();
    for (index, item) in pack.items.iter().enumerate() {
        let key = ItemKey {
            item_type: ItemTypeId(index as u32),
            craftable: item.craftable,
            variant: item.variant,
        };
        if items.insert(item.name.clone(), key).is_some() {
            return Err(LoadError::DuplicateItem(item.name.clone()));
        }
    }

    let resolve = |kind: &str, name: &str| -> Result<ItemKey, LoadError> {
        items.get(name).copied().ok_or_else(|| LoadError::UnresolvedItem {
            kind: kind.to_string(),
            name: name.to_string(),
        })
    };

    let mut registry = KindRegistry::new();
    let mut seen_entities: BTreeMap<String, ()> = BTreeMap::new();
    for def in &pack.kinds {
        let entity = def.entity.to_ascii_lowercase();
        if seen_entities.insert(entity, ()).is_some() {
            return Err(LoadError::DuplicateEntity(def.entity.clone()));
        }

        match (&def.source, def.recipes.is_empty()) {
            (Some(source), true) => {
                registry.register(
                    &def.entity,
                    Arc::new(SourceKind::new(
                        def.id.clone(),
                        resolve(&def.id, &source.output)?,
                        source.produces,
                        source.period,
                    )),
                );
            }
            (None, false) => {
                let mut recipes = Vec::with_capacity(def.recipes.len());
                for r in &def.recipes {
                    recipes.push(Recipe {
                        input: resolve(&def.id, &r.input)?,
                        count: r.count,
                        output: resolve(&def.id, &r.output)?,
                        produces: r.produces,
                        duration: r.duration,
                    });
                }
                registry.register(
                    &def.entity,
                    Arc::new(RecipeKind::new(def.id.clone(), recipes).with_priority(def.priority)),
                );
            }
            _ => return Err(LoadError::AmbiguousKind(def.id.clone())),
        }
    }

    Ok(LoadedPack { registry, items })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACK: &str = r#"{
        "items": [
            { "name": "ore" },
            { "name": "ingot" },
            { "name": "sap" }
        ],
        "kinds": [
            {
                "entity": "kiln",
                "id": "pack/kiln",
                "recipes": [
                    { "input": "ore", "count": 2, "output": "ingot", "produces": 1, "duration": 40 }
                ]
            },
            {
                "entity": "tapper",
                "id": "pack/tapper",
                "source": { "output": "sap", "produces": 1, "period": 120 }
            }
        ]
    }"#;

    #[test]
    fn loads_items_and_kinds() {
        let pack = load_registry(PACK).unwrap();
        assert_eq!(pack.items.len(), 3);
        assert_eq!(pack.items["ingot"].item_type, ItemTypeId(1));
        assert_eq!(pack.registry.len(), 2);
        assert_eq!(pack.registry.lookup("Kiln").unwrap().id(), "pack/kiln");
        assert_eq!(pack.registry.lookup("tapper").unwrap().id(), "pack/tapper");
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let result = load_registry("{ not json");
        assert!(matches!(result, Err(LoadError::Parse(_))));
    }

    #[test]
    fn unresolved_item_reference_fails() {
        let json = r#"{
            "items": [{ "name": "ore" }],
            "kinds": [{
                "entity": "kiln", "id": "pack/kiln",
                "recipes": [{ "input": "ore", "count": 1, "output": "gold", "produces": 1, "duration": 10 }]
            }]
        }"#;
        match load_registry(json) {
            Err(LoadError::UnresolvedItem { kind, name }) => {
                assert_eq!(kind, "pack/kiln");
                assert_eq!(name, "gold");
            }
            other => panic!("expected UnresolvedItem, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_item_fails() {
        let json = r#"{ "items": [{ "name": "ore" }, { "name": "ore" }], "kinds": [] }"#;
        assert!(matches!(load_registry(json), Err(LoadError::DuplicateItem(_))));
    }

    #[test]
    fn duplicate_entity_fails_case_insensitively() {
        let json = r#"{
            "items": [{ "name": "sap" }],
            "kinds": [
                { "entity": "Tapper", "id": "a", "source": { "output": "sap", "produces": 1, "period": 1 } },
                { "entity": "tapper", "id": "b", "source": { "output": "sap", "produces": 1, "period": 1 } }
            ]
        }"#;
        assert!(matches!(load_registry(json), Err(LoadError::DuplicateEntity(_))));
    }

    #[test]
    fn kind_with_both_shapes_fails() {
        let json = r#"{
            "items": [{ "name": "sap" }],
            "kinds": [{
                "entity": "odd", "id": "pack/odd",
                "recipes": [{ "input": "sap", "count": 1, "output": "sap", "produces": 1, "duration": 1 }],
                "source": { "output": "sap", "produces": 1, "period": 1 }
            }]
        }"#;
        assert!(matches!(load_registry(json), Err(LoadError::AmbiguousKind(_))));
    }

    #[test]
    fn kind_with_neither_shape_fails() {
        let json = r#"{ "items": [], "kinds": [{ "entity": "odd", "id": "pack/odd" }] }"#;
        assert!(matches!(load_registry(json), Err(LoadError::AmbiguousKind(_))));
    }

    #[test]
    fn craftable_and_variant_flags_flow_through() {
        let json = r#"{
            "items": [{ "name": "sprinkler", "craftable": true, "variant": 2 }],
            "kinds": []
        }"#;
        let pack = load_registry(json).unwrap();
        let key = pack.items["sprinkler"];
        assert!(key.craftable);
        assert_eq!(key.variant, 2);
    }
}

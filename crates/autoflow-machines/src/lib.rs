//! Autoflow Machines -- the machine-kind catalog on top of
//! `autoflow-core`.
//!
//! The core is kind-agnostic: it discovers groups and moves items, while
//! behavior comes from [`MachineKind`] implementations registered against
//! entity names. This crate provides the two behavior shapes most
//! machines reduce to -- [`RecipeKind`] (consume inputs, yield an output
//! after a fixed duration) and [`SourceKind`] (yield an output from
//! nothing on a cycle timer) -- plus a small standard catalog, and an
//! optional JSON loader for content packs (`data-loader` feature).

use autoflow_core::error::MachineError;
use autoflow_core::id::{ItemTypeId, Ticks};
use autoflow_core::item::{ItemKey, ItemStack};
use autoflow_core::machine::{MachineInstance, MachineKind, MachineState};
use autoflow_core::registry::KindRegistry;
use autoflow_core::storage::StorageAllocator;
use autoflow_core::world::World;
use std::sync::Arc;

#[cfg(feature = "data-loader")]
pub mod loader;

// ===========================================================================
// Catalog items
// ===========================================================================

/// Item keys used by the standard catalog. Content packs define their own.
pub mod items {
    use super::*;

    pub fn ore() -> ItemKey {
        ItemKey::object(ItemTypeId(0))
    }
    pub fn ingot() -> ItemKey {
        ItemKey::object(ItemTypeId(1))
    }
    pub fn wood() -> ItemKey {
        ItemKey::object(ItemTypeId(2))
    }
    pub fn plank() -> ItemKey {
        ItemKey::object(ItemTypeId(3))
    }
    pub fn wheat() -> ItemKey {
        ItemKey::object(ItemTypeId(4))
    }
    pub fn flour() -> ItemKey {
        ItemKey::object(ItemTypeId(5))
    }
    pub fn fruit() -> ItemKey {
        ItemKey::object(ItemTypeId(6))
    }
    /// Jam keeps the fruit's identity in its variant sub-id.
    pub fn jam() -> ItemKey {
        ItemKey::object(ItemTypeId(7)).with_variant(fruit().item_type.0)
    }
    pub fn water() -> ItemKey {
        ItemKey::object(ItemTypeId(8))
    }
}

// ===========================================================================
// RecipeKind
// ===========================================================================

/// One fixed recipe: consume `count` of `input`, yield `produces` of
/// `output` after `duration` ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub input: ItemKey,
    pub count: u32,
    pub output: ItemKey,
    pub produces: u32,
    pub duration: Ticks,
}

/// A machine kind driven by a fixed recipe table. Recipes are tried in
/// order; the first whose input requirement storage can meet starts a
/// cycle. The table is shared by every instance, so the kind keeps the
/// default recipe-sharing declaration.
#[derive(Debug)]
pub struct RecipeKind {
    id: String,
    priority: i32,
    recipes: Vec<Recipe>,
}

impl RecipeKind {
    pub fn new(id: impl Into<String>, recipes: Vec<Recipe>) -> Self {
        Self {
            id: id.into(),
            priority: 0,
            recipes,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }
}

impl MachineKind for RecipeKind {
    fn id(&self) -> &str {
        &self.id
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn set_input(
        &self,
        world: &mut World,
        machine: &MachineInstance,
        storage: &StorageAllocator<'_>,
        now: Ticks,
    ) -> Result<bool, MachineError> {
        let state = machine
            .body(world)
            .map(|body| body.state(now))
            .ok_or(MachineError::MissingEntity)?;
        if state != MachineState::Empty {
            return Ok(false);
        }

        for recipe in &self.recipes {
            let input = recipe.input;
            let plan = storage.try_get_ingredient(world, |s| s.key == input, recipe.count);
            if !plan.is_met() {
                continue;
            }
            if !storage.try_consume(world, |s| s.key == input, recipe.count) {
                continue;
            }
            let body = machine.body_mut(world).ok_or(MachineError::MissingEntity)?;
            body.start(
                ItemStack::new(recipe.output, recipe.produces),
                now + recipe.duration,
            );
            return Ok(true);
        }
        Ok(false)
    }
}

// ===========================================================================
// SourceKind
// ===========================================================================

/// A machine kind that yields items from nothing on a cycle timer (wells,
/// tappers). `set_input` needs no ingredients; it just restarts the
/// cycle.
#[derive(Debug)]
pub struct SourceKind {
    id: String,
    priority: i32,
    output: ItemKey,
    produces: u32,
    period: Ticks,
}

impl SourceKind {
    pub fn new(id: impl Into<String>, output: ItemKey, produces: u32, period: Ticks) -> Self {
        Self {
            id: id.into(),
            priority: 0,
            output,
            produces,
            period,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl MachineKind for SourceKind {
    fn id(&self) -> &str {
        &self.id
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn set_input(
        &self,
        world: &mut World,
        machine: &MachineInstance,
        _storage: &StorageAllocator<'_>,
        now: Ticks,
    ) -> Result<bool, MachineError> {
        let body = machine.body_mut(world).ok_or(MachineError::MissingEntity)?;
        if body.state(now) != MachineState::Empty {
            return Ok(false);
        }
        body.start(ItemStack::new(self.output, self.produces), now + self.period);
        Ok(true)
    }
}

// ===========================================================================
// Standard catalog
// ===========================================================================

/// The standard catalog, keyed by entity name.
pub fn standard_registry() -> KindRegistry {
    let mut registry = KindRegistry::new();
    registry.register(
        "furnace",
        Arc::new(RecipeKind::new(
            "catalog/furnace",
            vec![Recipe {
                input: items::ore(),
                count: 5,
                output: items::ingot(),
                produces: 1,
                duration: 30,
            }],
        )),
    );
    registry.register(
        "sawmill",
        Arc::new(RecipeKind::new(
            "catalog/sawmill",
            vec![Recipe {
                input: items::wood(),
                count: 1,
                output: items::plank(),
                produces: 2,
                duration: 20,
            }],
        )),
    );
    registry.register(
        "mill",
        Arc::new(RecipeKind::new(
            "catalog/mill",
            vec![Recipe {
                input: items::wheat(),
                count: 1,
                output: items::flour(),
                produces: 1,
                duration: 15,
            }],
        )),
    );
    registry.register(
        "preserves jar",
        Arc::new(RecipeKind::new(
            "catalog/preserves-jar",
            vec![Recipe {
                input: items::fruit(),
                count: 1,
                output: items::jam(),
                produces: 1,
                duration: 60,
            }],
        )),
    );
    // Wells sort after recipe machines in the aggregate's merged list so
    // consumers drain shared storage before it refills.
    registry.register(
        "well",
        Arc::new(SourceKind::new("catalog/well", items::water(), 1, 90).with_priority(10)),
    );
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoflow_core::aggregate::AggregateGroup;
    use autoflow_core::config::AutomationConfig;
    use autoflow_core::connectivity::scan_location;
    use autoflow_core::engine::Engine;
    use autoflow_core::id::LocationKey;
    use autoflow_core::test_utils::{chest, link_chest, machine_entity};
    use autoflow_core::tile::{Tile, TileArea};
    use autoflow_core::world::Location;

    fn yard() -> LocationKey {
        LocationKey::new("yard")
    }

    fn setup(machine_name: &str) -> (World, Engine, autoflow_core::id::EntityId) {
        let mut world = World::new();
        let mut loc = Location::new(yard(), 8, 8);
        let store = loc.place(chest("store", 0, 0));
        loc.place(machine_entity(
            machine_name,
            TileArea::single(Tile::new(1, 0)),
        ));
        world.add_location(loc);

        let mut engine = Engine::new(AutomationConfig::default(), standard_registry());
        engine.enqueue_reload(yard());
        (world, engine, store)
    }

    #[test]
    fn furnace_smelts_five_ore_into_one_ingot() {
        let (mut world, mut engine, store) = setup("furnace");
        let inv = world.location_mut(&yard()).unwrap().inventory_mut(store).unwrap();
        assert_eq!(inv.add(items::ore(), 7), 0);

        engine.step(&mut world, 0);
        // 5 ore consumed, 2 left; cycle runs 30 ticks.
        let inv = world.location(&yard()).unwrap().inventory(store).unwrap();
        assert_eq!(inv.quantity(items::ore()), 2);
        assert_eq!(inv.quantity(items::ingot()), 0);

        for now in 1..=30 {
            engine.step(&mut world, now);
        }
        let inv = world.location(&yard()).unwrap().inventory(store).unwrap();
        assert_eq!(inv.quantity(items::ingot()), 1);
        // The leftover 2 ore cannot start another cycle.
        assert_eq!(inv.quantity(items::ore()), 2);
    }

    #[test]
    fn sawmill_multiplies_output() {
        let (mut world, mut engine, store) = setup("sawmill");
        let inv = world.location_mut(&yard()).unwrap().inventory_mut(store).unwrap();
        assert_eq!(inv.add(items::wood(), 1), 0);

        for now in 0..=20 {
            engine.step(&mut world, now);
        }
        let inv = world.location(&yard()).unwrap().inventory(store).unwrap();
        assert_eq!(inv.quantity(items::plank()), 2);
    }

    #[test]
    fn jam_carries_fruit_variant() {
        let (mut world, mut engine, store) = setup("preserves jar");
        let inv = world.location_mut(&yard()).unwrap().inventory_mut(store).unwrap();
        assert_eq!(inv.add(items::fruit(), 1), 0);

        for now in 0..=60 {
            engine.step(&mut world, now);
        }
        let inv = world.location(&yard()).unwrap().inventory(store).unwrap();
        assert_eq!(inv.quantity(items::jam()), 1);
        assert_ne!(items::jam().variant, 0);
    }

    #[test]
    fn well_produces_from_nothing() {
        let (mut world, mut engine, store) = setup("well");
        for now in 0..=180 {
            engine.step(&mut world, now);
        }
        let inv = world.location(&yard()).unwrap().inventory(store).unwrap();
        // Cycles complete at ticks 90 and 180.
        assert_eq!(inv.quantity(items::water()), 2);
    }

    #[test]
    fn recipe_kind_tries_recipes_in_order() {
        let kind = RecipeKind::new(
            "test/dual",
            vec![
                Recipe {
                    input: items::ore(),
                    count: 1,
                    output: items::ingot(),
                    produces: 1,
                    duration: 10,
                },
                Recipe {
                    input: items::wood(),
                    count: 1,
                    output: items::plank(),
                    produces: 1,
                    duration: 10,
                },
            ],
        );
        let mut registry = KindRegistry::new();
        registry.register("dual", Arc::new(kind));

        let mut world = World::new();
        let mut loc = Location::new(yard(), 8, 8);
        let store = loc.place(chest("store", 0, 0));
        loc.place(machine_entity("dual", TileArea::single(Tile::new(1, 0))));
        world.add_location(loc);
        let inv = loc_inv(&mut world, store);
        // Only the second recipe's input is present.
        assert_eq!(inv.add(items::wood(), 1), 0);

        let mut engine = Engine::new(AutomationConfig::default(), registry);
        engine.enqueue_reload(yard());
        let summary = engine.step(&mut world, 0);
        assert_eq!(summary.inputs_loaded, 1);
        assert_eq!(
            world.location(&yard()).unwrap().inventory(store).unwrap().total(),
            0
        );
    }

    fn loc_inv<'w>(
        world: &'w mut World,
        id: autoflow_core::id::EntityId,
    ) -> &'w mut autoflow_core::item::Inventory {
        world.location_mut(&yard()).unwrap().inventory_mut(id).unwrap()
    }

    #[test]
    fn aggregate_orders_well_after_recipe_machines() {
        use autoflow_core::classify::Classifier;

        let classifier = Classifier::standard(
            Arc::new(standard_registry()),
            "link chest",
            Vec::new(),
        );

        // The well's member group is added first, but priority sorting
        // puts the mill ahead of it in the merged machine list.
        let mut wells = Location::new(LocationKey::new("wells"), 8, 8);
        wells.place(machine_entity("well", TileArea::single(Tile::new(0, 0))));
        wells.place(link_chest(1, 0));
        let mut mills = Location::new(LocationKey::new("mills"), 8, 8);
        mills.place(machine_entity("mill", TileArea::single(Tile::new(0, 0))));
        mills.place(link_chest(1, 0));

        let mut aggregate = AggregateGroup::new();
        aggregate.add(scan_location(&classifier, &wells));
        aggregate.add(scan_location(&classifier, &mills));

        let ids: Vec<&str> = aggregate
            .merged()
            .machines()
            .iter()
            .map(|m| m.kind.id())
            .collect();
        assert_eq!(ids, vec!["catalog/mill", "catalog/well"]);
    }
}


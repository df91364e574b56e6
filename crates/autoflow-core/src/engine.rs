//! The automation engine: group lists, reload queue, and the per-tick
//! driver.

use crate::aggregate::AggregateGroup;
use crate::classify::{Classifier, Recognizer};
use crate::config::AutomationConfig;
use crate::connectivity::scan_location;
use crate::event::{Event, EventLog};
use crate::group::MachineGroup;
use crate::id::{LocationKey, Ticks};
use crate::machine::MachineState;
use crate::registry::KindRegistry;
use crate::tick::{PauseTable, TickContext};
use crate::tile::{Tile, TileArea};
use crate::world::World;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Group lists for one location.
#[derive(Debug, Default)]
struct LocationGroups {
    /// Groups with internal automation, ticked every step.
    active: Vec<MachineGroup>,
    /// Discovered but not automatable (no machines, or storage is only the
    /// universal link); kept for diagnostics and the overlay.
    disabled: Vec<MachineGroup>,
}

/// Result of one [`Engine::step`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepSummary {
    /// Locations rescanned this step, in drain order.
    pub reloaded: Vec<LocationKey>,
    /// Groups that ran automation (including the aggregate group).
    pub groups_automated: usize,
    /// Machines whose output was (at least partially) stored.
    pub outputs_stored: u32,
    /// Machines that accepted input and began a cycle.
    pub inputs_loaded: u32,
    /// Machines that faulted and were paused.
    pub faults: u32,
}

/// Owns the per-location group lists, the aggregate group, the pause
/// table, and the reload queue, and drives one automation pass per tick.
///
/// The engine holds no reference into the world: every step borrows it
/// afresh, and every timestamp comes in through the `now` argument.
#[derive(Debug)]
pub struct Engine {
    config: AutomationConfig,
    classifier: Classifier,
    locations: BTreeMap<LocationKey, LocationGroups>,
    aggregate: AggregateGroup,
    pauses: PauseTable,
    events: EventLog,
    /// Pending rescans, deduplicated; drained at one fixed point per step,
    /// before automation, so no group list is observed half-rebuilt.
    reload_queue: BTreeSet<LocationKey>,
}

impl Engine {
    pub fn new(config: AutomationConfig, kinds: KindRegistry) -> Self {
        let classifier = Classifier::standard(
            Arc::new(kinds),
            config.shared_link_name.clone(),
            config.connector_names.iter().cloned(),
        );
        let events = EventLog::new(config.event_capacity);
        let mut aggregate = AggregateGroup::new();
        aggregate.rebuild();
        Self {
            config,
            classifier,
            locations: BTreeMap::new(),
            aggregate,
            pauses: PauseTable::new(),
            events,
            reload_queue: BTreeSet::new(),
        }
    }

    pub fn config(&self) -> &AutomationConfig {
        &self.config
    }

    /// Register an additional entity recognizer. Recognizers run after the
    /// built-in set, in registration order.
    pub fn register_recognizer(&mut self, recognizer: Box<dyn Recognizer>) {
        self.classifier.register(recognizer);
    }

    /// Request a rescan of one location. Requests are deduplicated and
    /// drained at the start of the next step.
    pub fn enqueue_reload(&mut self, key: LocationKey) {
        self.reload_queue.insert(key);
    }

    pub fn pending_reloads(&self) -> usize {
        self.reload_queue.len()
    }

    /// Run one tick: drain queued reloads, expire pauses, then automate
    /// every active group and the aggregate group.
    pub fn step(&mut self, world: &mut World, now: Ticks) -> StepSummary {
        let mut summary = StepSummary::default();

        let queued: Vec<LocationKey> = std::mem::take(&mut self.reload_queue).into_iter().collect();
        for key in &queued {
            self.reload_location(world, key, now);
        }
        summary.reloaded = queued;

        self.pauses.expire(now);

        let Engine {
            config,
            locations,
            aggregate,
            pauses,
            events,
            ..
        } = self;
        let mut ctx = TickContext {
            world,
            pauses,
            events,
            config,
            now,
        };

        for location_groups in locations.values() {
            for group in &location_groups.active {
                let group_summary = group.automate(&mut ctx);
                summary.groups_automated += 1;
                summary.outputs_stored += group_summary.outputs_stored;
                summary.inputs_loaded += group_summary.inputs_loaded;
                summary.faults += group_summary.faults;
            }
        }

        let merged = aggregate.merged();
        if merged.has_internal_automation() {
            let group_summary = merged.automate(&mut ctx);
            summary.groups_automated += 1;
            summary.outputs_stored += group_summary.outputs_stored;
            summary.inputs_loaded += group_summary.inputs_loaded;
            summary.faults += group_summary.faults;
        }

        summary
    }

    /// Rescan one location, replacing its groups wholesale. Groups holding
    /// a universal-link container join the aggregate group instead of the
    /// location's own lists.
    fn reload_location(&mut self, world: &World, key: &LocationKey, now: Ticks) {
        self.locations.remove(key);
        self.aggregate.remove_where(|g| g.location() == Some(key));

        let mut count = 0;
        if let Some(location) = world.location(key) {
            let groups = scan_location(&self.classifier, location);
            count = groups.len();

            let mut lists = LocationGroups::default();
            let mut linked = Vec::new();
            for group in groups {
                if group.containers().iter().any(|c| c.flags.shared_link) {
                    linked.push(group);
                } else if group.has_internal_automation() {
                    lists.active.push(group);
                } else {
                    lists.disabled.push(group);
                }
            }
            self.locations.insert(key.clone(), lists);
            self.aggregate.add(linked);
        }

        self.aggregate.rebuild();
        self.events.push(Event::LocationScanned {
            location: key.clone(),
            groups: count,
            tick: now,
        });
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// All currently automatable groups, including the aggregate group
    /// when it has machines.
    pub fn active_machine_groups(&self) -> impl Iterator<Item = &MachineGroup> {
        let aggregate = self
            .aggregate
            .merged_view()
            .filter(|g| g.has_internal_automation());
        self.locations
            .values()
            .flat_map(|lists| lists.active.iter())
            .chain(aggregate)
    }

    /// Active + disabled + aggregate-member groups for one location, for
    /// reporting and diagnostics.
    pub fn groups_for_location<'a>(
        &'a self,
        key: &'a LocationKey,
    ) -> impl Iterator<Item = &'a MachineGroup> {
        let lists = self.locations.get(key);
        let active = lists.map(|l| l.active.iter()).into_iter().flatten();
        let disabled = lists.map(|l| l.disabled.iter()).into_iter().flatten();
        let members = self
            .aggregate
            .members()
            .iter()
            .filter(move |g| g.location() == Some(key));
        active.chain(disabled).chain(members)
    }

    /// Tile→state mapping for the machines intersecting an area, for an
    /// overlay renderer.
    pub fn machine_states_in(
        &self,
        world: &World,
        key: &LocationKey,
        area: TileArea,
        now: Ticks,
    ) -> BTreeMap<Tile, MachineState> {
        let mut states = BTreeMap::new();
        for group in self.groups_for_location(key) {
            for machine in group.machines() {
                if machine.location != *key || !machine.area.intersects(&area) {
                    continue;
                }
                let state = machine.state(world, now);
                for tile in machine.area.tiles().filter(|t| area.contains(*t)) {
                    states.insert(tile, state);
                }
            }
        }
        states
    }

    pub fn aggregate(&self) -> &AggregateGroup {
        &self.aggregate
    }

    pub fn pauses(&self) -> &PauseTable {
        &self.pauses
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Remove and return all buffered events, oldest first.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    fn engine() -> Engine {
        Engine::new(
            AutomationConfig::default().with_connectors(["fence"]),
            fixture_registry(),
        )
    }

    #[test]
    fn reload_partitions_groups() {
        let mut world = World::new();
        let mut loc = farm(16, 16);
        // Active: press + chest.
        loc.place(press_at(0, 0));
        loc.place(chest("a", 1, 0));
        // Disabled: lone press.
        loc.place(press_at(5, 5));
        // Aggregate: press + link chest.
        loc.place(press_at(10, 10));
        loc.place(link_chest(11, 10));
        world.add_location(loc);

        let mut engine = engine();
        engine.enqueue_reload(farm_key());
        assert_eq!(engine.pending_reloads(), 1);
        let summary = engine.step(&mut world, 0);
        assert_eq!(summary.reloaded, vec![farm_key()]);
        assert_eq!(engine.pending_reloads(), 0);

        // Two automatable groups: the chest group and the aggregate.
        assert_eq!(engine.active_machine_groups().count(), 2);
        // Diagnostics see all three plus the aggregate member.
        assert_eq!(engine.groups_for_location(&farm_key()).count(), 3);
        assert!(!engine.aggregate().is_empty());
    }

    #[test]
    fn reload_of_missing_location_clears_groups() {
        let mut world = World::new();
        let mut loc = farm(8, 8);
        loc.place(press_at(0, 0));
        loc.place(chest("a", 1, 0));
        world.add_location(loc);

        let mut engine = engine();
        engine.enqueue_reload(farm_key());
        engine.step(&mut world, 0);
        assert_eq!(engine.active_machine_groups().count(), 1);

        world.remove_location(&farm_key());
        engine.enqueue_reload(farm_key());
        engine.step(&mut world, 1);
        assert_eq!(engine.active_machine_groups().count(), 0);
    }

    #[test]
    fn overlay_reports_machine_states() {
        let mut world = World::new();
        let mut loc = farm(8, 8);
        loc.place(press_at(0, 0));
        loc.place(chest("a", 1, 0));
        world.add_location(loc);

        let mut engine = engine();
        engine.enqueue_reload(farm_key());
        engine.step(&mut world, 0);

        let states = engine.machine_states_in(
            &world,
            &farm_key(),
            TileArea::new(Tile::new(0, 0), 4, 4),
            0,
        );
        assert_eq!(states.get(&Tile::new(0, 0)), Some(&MachineState::Empty));
        assert_eq!(states.get(&Tile::new(1, 0)), None); // chest, not machine
    }
}

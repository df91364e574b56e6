//! The per-group automation step.
//!
//! Each tick a group's machines are partitioned by state, finished output
//! is pushed into group storage, and idle machines pull new input. A fault
//! in one machine pauses that instance for a cooldown and never aborts the
//! rest of the group's tick.

use crate::config::AutomationConfig;
use crate::error::MachineError;
use crate::event::{Event, EventLog};
use crate::group::MachineGroup;
use crate::id::Ticks;
use crate::machine::{MachineInstance, MachineKey, MachineState};
use crate::storage::TrackedStack;
use crate::world::World;
use std::cell::Cell;
use std::collections::{BTreeMap, HashSet};

// ---------------------------------------------------------------------------
// PauseTable
// ---------------------------------------------------------------------------

/// Pause deadlines keyed by the stable machine key. A paused machine is
/// suppressed from both ready buckets until its deadline passes.
#[derive(Debug, Default)]
pub struct PauseTable {
    entries: BTreeMap<MachineKey, Ticks>,
}

impl PauseTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pause a machine until the given tick. An existing later deadline is
    /// kept.
    pub fn pause(&mut self, key: MachineKey, until: Ticks) {
        let entry = self.entries.entry(key).or_insert(until);
        *entry = (*entry).max(until);
    }

    pub fn is_paused(&self, key: &MachineKey, now: Ticks) -> bool {
        self.entries.get(key).is_some_and(|&until| until > now)
    }

    pub fn until(&self, key: &MachineKey) -> Option<Ticks> {
        self.entries.get(key).copied()
    }

    /// Drop entries whose deadline has passed.
    pub fn expire(&mut self, now: Ticks) {
        self.entries.retain(|_, &mut until| until > now);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// TickContext
// ---------------------------------------------------------------------------

/// Everything one automation tick needs. The clock is passed in
/// explicitly; the engine never reads ambient time.
pub struct TickContext<'a> {
    pub world: &'a mut World,
    pub pauses: &'a mut PauseTable,
    pub events: &'a mut EventLog,
    pub config: &'a AutomationConfig,
    pub now: Ticks,
}

/// Counters from one group's tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupTickSummary {
    /// Machines whose output was (at least partially) stored.
    pub outputs_stored: u32,
    /// Machines that accepted input and began a cycle.
    pub inputs_loaded: u32,
    /// Machines that faulted and were paused.
    pub faults: u32,
}

// ---------------------------------------------------------------------------
// Automation step
// ---------------------------------------------------------------------------

/// Run one automation tick for a group.
pub fn automate_group(group: &MachineGroup, ctx: &mut TickContext<'_>) -> GroupTickSummary {
    let mut summary = GroupTickSummary::default();
    ctx.pauses.expire(ctx.now);

    // Partition non-paused machines by state. Processing machines are
    // skipped entirely this tick.
    let mut output_ready: Vec<&MachineInstance> = Vec::new();
    let mut input_ready: Vec<&MachineInstance> = Vec::new();
    for machine in group.machines() {
        if ctx.pauses.is_paused(&machine.key, ctx.now) {
            continue;
        }
        match machine.state(ctx.world, ctx.now) {
            MachineState::Done => output_ready.push(machine),
            MachineState::Empty => input_ready.push(machine),
            MachineState::Processing => {}
        }
    }

    let storage = group.storage();

    for machine in output_ready {
        match collect_output(machine, group, ctx) {
            Ok(stored) => {
                if stored > 0 {
                    summary.outputs_stored += 1;
                }
                if machine.state(ctx.world, ctx.now) == MachineState::Empty {
                    input_ready.push(machine);
                }
            }
            Err(fault) => {
                summary.faults += 1;
                pause_faulted(machine, fault, ctx);
            }
        }
    }

    // Kinds that share recipes across instances fail identically against
    // the same storage snapshot, so one refusal short-circuits the rest of
    // that kind for this tick.
    let mut exhausted_kinds: HashSet<&str> = HashSet::new();
    for machine in input_ready {
        let kind_id = machine.kind.id();
        let shares = machine.kind.shares_recipes_across_instances();
        if shares && exhausted_kinds.contains(kind_id) {
            continue;
        }
        match machine.kind.set_input(ctx.world, machine, &storage, ctx.now) {
            Ok(true) => {
                summary.inputs_loaded += 1;
                ctx.events.push(Event::InputLoaded {
                    machine: machine.key.clone(),
                    tick: ctx.now,
                });
            }
            Ok(false) => {
                if shares {
                    exhausted_kinds.insert(kind_id);
                }
            }
            Err(fault) => {
                summary.faults += 1;
                pause_faulted(machine, fault, ctx);
            }
        }
    }

    summary
}

/// Fetch a machine's finished output and push it into group storage.
/// Returns the number of units stored. The machine's pending output is
/// reduced only by what storage confirmed.
fn collect_output(
    machine: &MachineInstance,
    group: &MachineGroup,
    ctx: &mut TickContext<'_>,
) -> Result<u32, MachineError> {
    let output = machine.kind.output(ctx.world, machine, ctx.now)?;
    let offered = output.quantity;
    let item = output.key;

    let emptied = Cell::new(false);
    let mut tracked = TrackedStack::new(output).on_empty(|| emptied.set(true));
    group.storage().try_push(ctx.world, &mut tracked);

    let stored = offered - tracked.remaining();
    if stored > 0 {
        machine.kind.output_taken(ctx.world, machine, stored)?;
        ctx.events.push(Event::OutputStored {
            machine: machine.key.clone(),
            item,
            quantity: stored,
            tick: ctx.now,
        });
    }
    debug_assert!(offered == 0 || emptied.get() == (stored == offered));
    Ok(stored)
}

fn pause_faulted(machine: &MachineInstance, fault: MachineError, ctx: &mut TickContext<'_>) {
    let until = ctx.now + ctx.config.fault_cooldown;
    ctx.pauses.pause(machine.key.clone(), until);
    ctx.events.push(Event::MachineFaulted {
        machine: machine.key.clone(),
        message: fault.to_string(),
        tick: ctx.now,
    });
    ctx.events.push(Event::MachinePaused {
        machine: machine.key.clone(),
        until,
        tick: ctx.now,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::LocationKey;
    use crate::tile::Tile;

    fn key(name: &str) -> MachineKey {
        MachineKey {
            location: LocationKey::new("farm"),
            origin: Tile::new(0, 0),
            kind: name.to_string(),
        }
    }

    #[test]
    fn pause_until_deadline_then_eligible() {
        let mut pauses = PauseTable::new();
        pauses.pause(key("a"), 15);
        assert!(pauses.is_paused(&key("a"), 10));
        assert!(pauses.is_paused(&key("a"), 14));
        assert!(!pauses.is_paused(&key("a"), 15));
    }

    #[test]
    fn later_deadline_wins() {
        let mut pauses = PauseTable::new();
        pauses.pause(key("a"), 20);
        pauses.pause(key("a"), 10);
        assert_eq!(pauses.until(&key("a")), Some(20));
    }

    #[test]
    fn expire_drops_passed_deadlines() {
        let mut pauses = PauseTable::new();
        pauses.pause(key("a"), 10);
        pauses.pause(key("b"), 30);
        pauses.expire(10);
        assert_eq!(pauses.len(), 1);
        assert_eq!(pauses.until(&key("a")), None);
        assert_eq!(pauses.until(&key("b")), Some(30));
    }
}

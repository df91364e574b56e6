//! The storage push/pull/consume protocol over one group's container set.
//!
//! The allocator holds the ordered container list and borrows nothing; the
//! world is passed into each operation, so machine kinds can interleave
//! reads of their own entity with storage calls without aliasing.

use crate::container::ContainerRef;
use crate::item::{ItemKey, ItemStack};
use crate::world::World;

// ---------------------------------------------------------------------------
// TrackedStack
// ---------------------------------------------------------------------------

/// A stack being moved into storage. Tracks the remaining units and fires
/// the bound `on_empty` callback exactly once when the whole stack has
/// been accepted — upstream uses it to clear a machine's pending output
/// only once storage is confirmed, never before.
pub struct TrackedStack<'a> {
    stack: ItemStack,
    on_empty: Option<Box<dyn FnMut() + 'a>>,
}

impl<'a> TrackedStack<'a> {
    pub fn new(stack: ItemStack) -> Self {
        Self {
            stack,
            on_empty: None,
        }
    }

    /// Bind the empty-notification callback.
    pub fn on_empty(mut self, callback: impl FnMut() + 'a) -> Self {
        self.on_empty = Some(Box::new(callback));
        self
    }

    pub fn key(&self) -> ItemKey {
        self.stack.key
    }

    pub fn remaining(&self) -> u32 {
        self.stack.quantity
    }

    pub fn is_empty(&self) -> bool {
        self.stack.quantity == 0
    }

    pub(crate) fn reduce(&mut self, stored: u32) {
        debug_assert!(stored <= self.stack.quantity);
        self.stack.quantity = self.stack.quantity.saturating_sub(stored);
        if self.stack.quantity == 0 {
            if let Some(mut callback) = self.on_empty.take() {
                callback();
            }
        }
    }
}

impl std::fmt::Debug for TrackedStack<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedStack")
            .field("stack", &self.stack)
            .field("tracked", &self.on_empty.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Consumable
// ---------------------------------------------------------------------------

/// One stack's contribution to an ingredient request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackTake {
    /// Index into the allocator's container list.
    pub container: usize,
    /// Stack index within that container.
    pub stack: usize,
    /// Units available in that stack.
    pub available: u32,
}

/// A read-only view over the stacks scanned for an ingredient request.
/// Check [`Consumable::is_met`] before committing via
/// [`StorageAllocator::try_consume`].
#[derive(Debug, Clone)]
pub struct Consumable {
    requested: u32,
    found: u32,
    takes: Vec<StackTake>,
}

impl Consumable {
    pub fn requested(&self) -> u32 {
        self.requested
    }

    /// Units found across the scanned stacks; may exceed `requested` (the
    /// last scanned stack is covered whole) or fall short of it.
    pub fn found(&self) -> u32 {
        self.found
    }

    pub fn is_met(&self) -> bool {
        self.found >= self.requested
    }

    pub fn takes(&self) -> &[StackTake] {
        &self.takes
    }
}

// ---------------------------------------------------------------------------
// StorageAllocator
// ---------------------------------------------------------------------------

/// Wraps the ordered container list of one machine group (or the aggregate
/// group's merged list).
#[derive(Debug, Clone, Copy)]
pub struct StorageAllocator<'a> {
    containers: &'a [ContainerRef],
}

impl<'a> StorageAllocator<'a> {
    pub fn new(containers: &'a [ContainerRef]) -> Self {
        Self { containers }
    }

    pub fn containers(&self) -> &'a [ContainerRef] {
        self.containers
    }

    /// Lazy sequence over every stack in every container, container order
    /// preserved.
    pub fn all_items<'w>(&self, world: &'w World) -> impl Iterator<Item = &'w ItemStack> {
        let containers = self.containers;
        containers
            .iter()
            .filter_map(move |c| c.inventory(world))
            .flat_map(|inv| inv.stacks().iter())
    }

    /// Scan matching stacks in container order, accumulating until the
    /// running total meets `count` or items are exhausted. The returned
    /// view covers exactly the stacks scanned — possibly fewer units than
    /// requested — and lets a machine peek before committing.
    pub fn try_get_ingredient(
        &self,
        world: &World,
        predicate: impl Fn(&ItemStack) -> bool,
        count: u32,
    ) -> Consumable {
        let mut takes = Vec::new();
        let mut found = 0u32;

        'scan: for (ci, container) in self.containers.iter().enumerate() {
            let Some(inv) = container.inventory(world) else {
                continue;
            };
            for (si, stack) in inv.stacks().iter().enumerate() {
                if stack.quantity == 0 || !predicate(stack) {
                    continue;
                }
                takes.push(StackTake {
                    container: ci,
                    stack: si,
                    available: stack.quantity,
                });
                found += stack.quantity;
                if found >= count {
                    break 'scan;
                }
            }
        }

        Consumable {
            requested: count,
            found,
            takes,
        }
    }

    /// Consume `count` matching units, reducing each backing stack by its
    /// portion — only if the request can be met in full; otherwise no
    /// change is made.
    pub fn try_consume(
        &self,
        world: &mut World,
        predicate: impl Fn(&ItemStack) -> bool,
        count: u32,
    ) -> bool {
        let plan = self.try_get_ingredient(world, predicate, count);
        if !plan.is_met() {
            return false;
        }

        let mut needed = count;
        for take in plan.takes() {
            if needed == 0 {
                break;
            }
            let container = &self.containers[take.container];
            let Some(inv) = container.inventory_mut(world) else {
                continue;
            };
            let portion = take.available.min(needed);
            needed -= inv.reduce_at(take.stack, portion);
        }
        for take in plan.takes() {
            if let Some(inv) = self.containers[take.container].inventory_mut(world) {
                inv.compact();
            }
        }
        debug_assert_eq!(needed, 0);
        true
    }

    /// Store a stack, container by container, until it drains or every
    /// container has been tried, in strict priority order:
    ///
    /// 1. containers flagged output-preferred;
    /// 2. containers already holding a stack with the same item key
    ///    (consolidation);
    /// 3. every container, in list order, as overflow.
    ///
    /// Returns true if at least one unit was stored; partial success is
    /// not an error.
    pub fn try_push(&self, world: &mut World, stack: &mut TrackedStack<'_>) -> bool {
        let initial = stack.remaining();
        if initial == 0 {
            return false;
        }
        let key = stack.key();

        self.push_phase(world, stack, |c, _| c.flags.output_preferred);
        if !stack.is_empty() {
            self.push_phase(world, stack, |c, w| {
                c.inventory(w).is_some_and(|inv| inv.holds(key))
            });
        }
        if !stack.is_empty() {
            self.push_phase(world, stack, |_, _| true);
        }

        stack.remaining() < initial
    }

    fn push_phase(
        &self,
        world: &mut World,
        stack: &mut TrackedStack<'_>,
        eligible: impl Fn(&ContainerRef, &World) -> bool,
    ) {
        for container in self.containers {
            if stack.is_empty() {
                return;
            }
            if !eligible(container, world) {
                continue;
            }
            let Some(inv) = container.inventory_mut(world) else {
                continue;
            };
            let accepted = stack.remaining().min(inv.room());
            if accepted > 0 {
                let overflow = inv.add(stack.key(), accepted);
                debug_assert_eq!(overflow, 0);
                stack.reduce(accepted);
            }
        }
    }
}

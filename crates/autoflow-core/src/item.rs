use crate::id::ItemTypeId;
use serde::{Deserialize, Serialize};

/// Item identity: two stacks merge iff their keys are equal.
///
/// The key is the item type plus the craftable flag and a variant sub-id
/// (e.g. the preserved-content id on a jarred good). Quantity never takes
/// part in identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemKey {
    pub item_type: ItemTypeId,
    pub craftable: bool,
    pub variant: u32,
}

impl ItemKey {
    /// A plain object item with no variant.
    pub fn object(item_type: ItemTypeId) -> Self {
        Self {
            item_type,
            craftable: false,
            variant: 0,
        }
    }

    /// A craftable item with no variant.
    pub fn craftable(item_type: ItemTypeId) -> Self {
        Self {
            item_type,
            craftable: true,
            variant: 0,
        }
    }

    pub fn with_variant(mut self, variant: u32) -> Self {
        self.variant = variant;
        self
    }
}

/// A stack of identical items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub key: ItemKey,
    pub quantity: u32,
}

impl ItemStack {
    pub fn new(key: ItemKey, quantity: u32) -> Self {
        Self { key, quantity }
    }
}

/// An unordered bag of item stacks with a total unit capacity.
///
/// Adding merges into an existing stack with the same key when one exists;
/// stacks reduced to zero are dropped by [`Inventory::compact`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    stacks: Vec<ItemStack>,
    capacity: u32,
}

impl Inventory {
    pub fn new(capacity: u32) -> Self {
        Self {
            stacks: Vec::new(),
            capacity,
        }
    }

    pub fn stacks(&self) -> &[ItemStack] {
        &self.stacks
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Total items across all stacks.
    pub fn total(&self) -> u32 {
        self.stacks.iter().map(|s| s.quantity).sum()
    }

    /// Units of free space remaining.
    pub fn room(&self) -> u32 {
        self.capacity.saturating_sub(self.total())
    }

    /// Quantity held for a specific key.
    pub fn quantity(&self, key: ItemKey) -> u32 {
        self.stacks
            .iter()
            .filter(|s| s.key == key)
            .map(|s| s.quantity)
            .sum()
    }

    /// Whether at least one stack with this key is present.
    pub fn holds(&self, key: ItemKey) -> bool {
        self.stacks.iter().any(|s| s.key == key && s.quantity > 0)
    }

    /// Add items. Returns the amount that didn't fit.
    #[must_use = "overflow count indicates items that did not fit"]
    pub fn add(&mut self, key: ItemKey, quantity: u32) -> u32 {
        let to_add = quantity.min(self.room());
        let overflow = quantity - to_add;

        if to_add > 0 {
            if let Some(stack) = self.stacks.iter_mut().find(|s| s.key == key) {
                stack.quantity += to_add;
            } else {
                self.stacks.push(ItemStack::new(key, to_add));
            }
        }

        overflow
    }

    /// Reduce the stack at `index` by up to `quantity` units. Returns the
    /// amount actually removed. The stack is left in place even at zero so
    /// indices stay stable during a multi-stack consume; call
    /// [`Inventory::compact`] afterwards.
    #[must_use = "returns the quantity actually removed, which may be less than requested"]
    pub fn reduce_at(&mut self, index: usize, quantity: u32) -> u32 {
        match self.stacks.get_mut(index) {
            Some(stack) => {
                let removed = quantity.min(stack.quantity);
                stack.quantity -= removed;
                removed
            }
            None => 0,
        }
    }

    /// Drop all empty stacks.
    pub fn compact(&mut self) {
        self.stacks.retain(|s| s.quantity > 0);
    }
}

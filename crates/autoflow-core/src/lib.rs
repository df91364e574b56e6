//! Autoflow Core -- connectivity discovery and per-tick item allocation
//! for tile-based automation.
//!
//! Machines convert input items into output items over time; containers
//! store the items machines draw from and deposit into. This crate
//! discovers which machines and containers are connected into single
//! automatable units and runs the per-tick allocation protocol that moves
//! items between them -- deterministically, with per-machine fault
//! isolation.
//!
//! # Per-Tick Pipeline
//!
//! Each call to [`engine::Engine::step`] advances automation by one tick:
//!
//! 1. **Reload** -- Drain queued location reloads; each rescanned location
//!    gets an entirely new set of machine groups (flood fill over its
//!    tiles), and groups holding a universal-link container join the
//!    cross-location aggregate group.
//! 2. **Expire** -- Drop pause entries whose deadline has passed.
//! 3. **Automate** -- Every active group, then the aggregate group,
//!    collects finished output into storage and dispatches ingredients to
//!    idle machines. A fault pauses one machine, never the tick.
//!
//! # Key Types
//!
//! - [`engine::Engine`] -- Group lists, reload queue, and tick driver.
//! - [`connectivity::scan_location`] -- Flood-fill partition of one
//!   location into [`group::MachineGroup`]s.
//! - [`classify::Classifier`] -- Ordered, pluggable entity recognizers.
//! - [`machine::MachineKind`] -- The per-kind behavior capability set
//!   ({state, output, set_input}); implementations are stateless.
//! - [`storage::StorageAllocator`] -- The push/pull/consume protocol over
//!   a group's ordered container list.
//! - [`aggregate::AggregateGroup`] -- The non-spatial union of groups
//!   sharing the universal-link container type.
//! - [`event::EventLog`] -- The reporting sink for faults, pauses, and
//!   reload activity.

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod connectivity;
pub mod container;
pub mod engine;
pub mod error;
pub mod event;
pub mod group;
pub mod id;
pub mod index;
pub mod item;
pub mod machine;
pub mod registry;
pub mod storage;
pub mod tick;
pub mod tile;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

//! Entity classification: which placed entities are machines, containers,
//! or connectors.
//!
//! Classification runs an ordered list of pluggable recognizers; the first
//! non-none answer wins, so ambiguity is resolved by ordering and never
//! surfaced as an error. Third parties extend coverage by registering
//! additional recognizers without touching the grouping logic.

use crate::container::{ContainerFlags, ContainerRef};
use crate::id::EntityId;
use crate::index::WorldIndex;
use crate::machine::MachineInstance;
use crate::registry::KindRegistry;
use crate::tile::Tile;
use crate::world::{Entity, EntityPayload, Location};
use std::collections::BTreeSet;
use std::sync::Arc;

/// A recognized entity role.
#[derive(Debug)]
pub enum Recognized {
    Machine(MachineInstance),
    Container(ContainerRef),
    /// No behavior; bridges adjacency between machines and containers.
    Connector,
}

/// One pluggable recognizer. Return `None` when the entity is not yours;
/// the classifier moves on to the next recognizer.
pub trait Recognizer: std::fmt::Debug {
    fn recognize(&self, location: &Location, id: EntityId, entity: &Entity) -> Option<Recognized>;
}

// ---------------------------------------------------------------------------
// Built-in recognizers
// ---------------------------------------------------------------------------

/// Recognizes machines by looking the entity name up in the kind registry.
#[derive(Debug)]
pub struct MachineRecognizer {
    kinds: Arc<KindRegistry>,
}

impl Recognizer for MachineRecognizer {
    fn recognize(&self, location: &Location, id: EntityId, entity: &Entity) -> Option<Recognized> {
        if !matches!(entity.payload, EntityPayload::Machine(_)) {
            return None;
        }
        let kind = self.kinds.lookup(&entity.name)?;
        Some(Recognized::Machine(MachineInstance::new(
            Arc::clone(kind),
            location.key().clone(),
            id,
            entity.area,
        )))
    }
}

/// Recognizes inventory-bearing entities as containers and derives their
/// name flags.
#[derive(Debug)]
pub struct ContainerRecognizer {
    shared_link_name: String,
}

impl Recognizer for ContainerRecognizer {
    fn recognize(&self, location: &Location, id: EntityId, entity: &Entity) -> Option<Recognized> {
        if !matches!(entity.payload, EntityPayload::Inventory(_)) {
            return None;
        }
        Some(Recognized::Container(ContainerRef {
            entity: id,
            location: location.key().clone(),
            area: entity.area,
            name: entity.name.clone(),
            flags: ContainerFlags::from_name(&entity.name, &self.shared_link_name),
        }))
    }
}

/// Recognizes connectors by a configured name set (fences, paths, ...).
#[derive(Debug)]
pub struct ConnectorRecognizer {
    names: BTreeSet<String>,
}

impl Recognizer for ConnectorRecognizer {
    fn recognize(&self, _location: &Location, _id: EntityId, entity: &Entity) -> Option<Recognized> {
        self.names
            .contains(&entity.name.to_ascii_lowercase())
            .then_some(Recognized::Connector)
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Ordered recognizer list. At most one role per tile: entities at the
/// tile are tried in layer order, recognizers in registration order.
#[derive(Debug, Default)]
pub struct Classifier {
    recognizers: Vec<Box<dyn Recognizer>>,
}

impl Classifier {
    /// An empty classifier that recognizes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard classifier: machines (via the kind registry), then
    /// containers, then connectors.
    pub fn standard(
        kinds: Arc<KindRegistry>,
        shared_link_name: impl Into<String>,
        connector_names: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut classifier = Self::new();
        classifier.register(Box::new(MachineRecognizer { kinds }));
        classifier.register(Box::new(ContainerRecognizer {
            shared_link_name: shared_link_name.into(),
        }));
        classifier.register(Box::new(ConnectorRecognizer {
            names: connector_names
                .into_iter()
                .map(|n| n.to_ascii_lowercase())
                .collect(),
        }));
        classifier
    }

    /// Append a recognizer. Recognizers run in registration order.
    pub fn register(&mut self, recognizer: Box<dyn Recognizer>) {
        self.recognizers.push(recognizer);
    }

    /// Classify one tile. Returns the first recognized entity at the tile,
    /// or `None` when the tile holds nothing automatable — a hard boundary
    /// for flood fill. A container carrying the ignore marker classifies
    /// to nothing.
    pub fn classify(
        &self,
        location: &Location,
        index: &WorldIndex,
        tile: Tile,
    ) -> Option<(EntityId, Recognized)> {
        for &id in index.entities_at(tile) {
            let Some(entity) = location.entity(id) else {
                continue;
            };
            for recognizer in &self.recognizers {
                match recognizer.recognize(location, id, entity) {
                    Some(Recognized::Container(c)) if c.flags.ignored => break,
                    Some(recognized) => return Some((id, recognized)),
                    None => {}
                }
            }
        }
        None
    }
}

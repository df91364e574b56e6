//! Container handles and name-derived flags.

use crate::id::{EntityId, LocationKey};
use crate::item::Inventory;
use crate::tile::TileArea;
use crate::world::World;
use serde::{Deserialize, Serialize};

/// Name marker that excludes a container from automation entirely.
pub const IGNORE_MARKER: &str = "[ignore]";

/// Name marker that makes a container preferred for machine output.
pub const OUTPUT_MARKER: &str = "[output]";

/// Flags derived from a container's name and the engine configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerFlags {
    /// Preferred target for machine output (phase 1 of the push policy).
    pub output_preferred: bool,
    /// Excluded from grouping; invisible to automation.
    pub ignored: bool,
    /// The universal-link container type shared across locations through
    /// the aggregate group.
    pub shared_link: bool,
}

impl ContainerFlags {
    /// Derive flags from an entity name. `shared_link_name` is the
    /// configured universal-link container name, compared
    /// case-insensitively against the name with markers stripped.
    pub fn from_name(name: &str, shared_link_name: &str) -> Self {
        let bare = name
            .replace(IGNORE_MARKER, "")
            .replace(OUTPUT_MARKER, "");
        Self {
            output_preferred: name.contains(OUTPUT_MARKER),
            ignored: name.contains(IGNORE_MARKER),
            shared_link: bare.trim().eq_ignore_ascii_case(shared_link_name),
        }
    }
}

/// One container in one group: an id into the world plus cached metadata.
#[derive(Debug, Clone)]
pub struct ContainerRef {
    pub entity: EntityId,
    pub location: LocationKey,
    pub area: TileArea,
    pub name: String,
    pub flags: ContainerFlags,
}

impl ContainerRef {
    pub fn inventory<'w>(&self, world: &'w World) -> Option<&'w Inventory> {
        world.location(&self.location)?.inventory(self.entity)
    }

    pub fn inventory_mut<'w>(&self, world: &'w mut World) -> Option<&'w mut Inventory> {
        world.location_mut(&self.location)?.inventory_mut(self.entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_name_has_no_flags() {
        let flags = ContainerFlags::from_name("crate", "link chest");
        assert!(!flags.output_preferred);
        assert!(!flags.ignored);
        assert!(!flags.shared_link);
    }

    #[test]
    fn markers_are_parsed() {
        let flags = ContainerFlags::from_name("overflow [output]", "link chest");
        assert!(flags.output_preferred);
        assert!(!flags.ignored);

        let flags = ContainerFlags::from_name("seeds [ignore]", "link chest");
        assert!(flags.ignored);
    }

    #[test]
    fn shared_link_matches_stripped_name() {
        let flags = ContainerFlags::from_name("Link Chest", "link chest");
        assert!(flags.shared_link);

        // Markers don't interfere with link detection.
        let flags = ContainerFlags::from_name("link chest [output]", "link chest");
        assert!(flags.shared_link);
        assert!(flags.output_preferred);

        let flags = ContainerFlags::from_name("linkage chest", "link chest");
        assert!(!flags.shared_link);
    }
}

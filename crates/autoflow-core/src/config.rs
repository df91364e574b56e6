use crate::id::Ticks;
use std::collections::BTreeSet;

/// Simulated ticks per second; used only to express the default cooldown.
pub const TICKS_PER_SECOND: Ticks = 60;

/// Engine configuration, fixed at construction.
#[derive(Debug, Clone)]
pub struct AutomationConfig {
    /// How long a faulted machine is suppressed from automation.
    pub fault_cooldown: Ticks,

    /// Entity names (case-insensitive) treated as connectors.
    pub connector_names: BTreeSet<String>,

    /// Name of the universal-link container type shared across locations
    /// through the aggregate group.
    pub shared_link_name: String,

    /// Bound on the buffered event log.
    pub event_capacity: usize,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            fault_cooldown: 30 * TICKS_PER_SECOND,
            connector_names: BTreeSet::new(),
            shared_link_name: "link chest".to_string(),
            event_capacity: 1024,
        }
    }
}

impl AutomationConfig {
    pub fn with_connectors(mut self, names: impl IntoIterator<Item = &'static str>) -> Self {
        self.connector_names
            .extend(names.into_iter().map(|n| n.to_ascii_lowercase()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cooldown_is_thirty_seconds() {
        let config = AutomationConfig::default();
        assert_eq!(config.fault_cooldown, 1800);
    }

    #[test]
    fn with_connectors_lowercases() {
        let config = AutomationConfig::default().with_connectors(["Fence", "path"]);
        assert!(config.connector_names.contains("fence"));
        assert!(config.connector_names.contains("path"));
    }
}

/// A fault raised by a machine while fetching or storing output, or while
/// loading input. Caught at single-machine granularity: the instance is
/// paused for a cooldown and the rest of its group's tick proceeds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MachineError {
    /// The machine reports `Done` but produced no pending output.
    #[error("no output ready")]
    NoOutput,

    /// The machine's backing entity is gone from the world (stale group).
    #[error("machine entity is missing from the world")]
    MissingEntity,

    /// A kind-specific failure.
    #[error("{0}")]
    Kind(String),
}

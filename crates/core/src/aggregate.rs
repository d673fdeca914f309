//! Aggregate traits shared by the domain crates.

/// Identity and replay position of a domain aggregate.
///
/// Kept small on purpose: each domain crate owns how its state evolves, this
/// trait only pins down that an aggregate can be addressed and counted.
pub trait AggregateRoot {
    /// Strongly-typed identifier (`QuoteId`, `ClientId`, ...).
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    /// Number of events applied so far. An empty aggregate is at 0 and every
    /// applied event advances it by exactly one.
    fn version(&self) -> u64;
}

/// Pure decide/apply execution semantics.
///
/// `handle` inspects state and returns events without mutating anything;
/// `apply` folds one event into state and must stay deterministic. Neither
/// side performs IO.
pub trait Aggregate: AggregateRoot {
    type Command: Clone + core::fmt::Debug;
    type Event: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;

    /// Fold a single event into in-memory state.
    fn apply(&mut self, event: &Self::Event);

    /// Decide which events follow from `command` in the current state.
    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;
}
